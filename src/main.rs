mod cli;

use crate::cli::{Cli, Commands};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use pfvs::SamplingConfig;
use pfvs::application::session_manager::build_measurement;
use pfvs::debug::{DebugConfig, init_logging};
use pfvs::domain::spectrometer::device::SpectrometerDevice;
use pfvs::infrastructure::hardware::detect_device;
use pfvs::interfaces::web::server::create_server;
use pfvs::measure_time;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let debug_config = if cli.dev {
        DebugConfig::development()
    } else {
        DebugConfig::default()
    };
    if let Err(e) = init_logging(&debug_config) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match cli.command {
        Commands::Run {
            port,
            host,
            interval_ms,
            simulate,
        } => {
            info!("Starting service...");
            let config = SamplingConfig {
                interval_ms,
                ..SamplingConfig::default()
            };

            match create_server(host, port, config, simulate).await {
                Ok(_) => {
                    info!("Service terminated normally");
                }
                Err(e) => {
                    error!("Service failed: {}", e);
                    eprintln!("❌ Service failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Scan { count, simulate } => {
            info!("Executing one-shot scan...");
            if let Err(e) = run_scan(count, simulate).await {
                error!("Scan failed: {}", e);
                eprintln!("❌ Scan failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// 分光センサーから指定回数読み取り、分類結果を表示する
async fn run_scan(count: usize, simulate: bool) -> anyhow::Result<()> {
    let device: Arc<dyn SpectrometerDevice> = detect_device(simulate);
    println!("Device: {}", device.label());

    device.acquire().await?;

    let result = measure_time!("scan", { scan_frames(&*device, count.max(1)).await });

    // 結果に関わらずハンドルは返す
    if let Err(e) = device.release().await {
        error!("Device release failed: {e}");
    }

    result
}

async fn scan_frames(device: &dyn SpectrometerDevice, count: usize) -> anyhow::Result<()> {
    for i in 0..count {
        let raw = device.sample().await?;
        let measurement = build_measurement(&raw);

        println!(
            "--- frame {} ({} channels) ---",
            i + 1,
            raw.spectral.channel_count()
        );
        println!(
            "  material: {}",
            measurement
                .predicted_material
                .as_deref()
                .unwrap_or("unknown")
        );
        println!(
            "  color:    {}",
            measurement.predicted_color.as_deref().unwrap_or("unknown")
        );
        if let Some(rgb) = measurement.rgb {
            println!("  rgb:      {}", rgb);
        }
    }
    Ok(())
}
