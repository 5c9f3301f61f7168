use super::error_response::ErrorResponse;
use super::measurement_streamer::stream_measurements;
use super::models::{FilamentGcodeResponse, SpectrometerStatus, StatusResponse, SystemInfo};
use crate::application::broadcaster::MeasurementBroadcaster;
use crate::application::session_manager::{SessionManager, StartStatus, StopStatus};
use crate::domain::classification::{FilamentSettings, MaterialKind};
use axum::{
    Json,
    extract::{Path, State, ws::WebSocketUpgrade},
    http::StatusCode,
    response::Response,
};
use std::sync::Arc;
use tracing::info;

/// Shared state for the web layer: the session manager and the
/// measurement broadcaster it publishes into.
#[derive(Clone)]
pub struct SpectrometerState {
    pub manager: Arc<SessionManager>,
    pub broadcaster: Arc<MeasurementBroadcaster>,
}

impl SpectrometerState {
    pub fn new(manager: Arc<SessionManager>, broadcaster: Arc<MeasurementBroadcaster>) -> Self {
        Self {
            manager,
            broadcaster,
        }
    }
}

/// Start the spectrometer session.
///
/// Idempotent-safe: starting an already-running session re-confirms the
/// current state with a 200 instead of erroring.
pub async fn start_spectrometer(
    State(state): State<Arc<SpectrometerState>>,
) -> Result<Json<StatusResponse>, ErrorResponse> {
    match state.manager.start().await {
        Ok(StartStatus::Started { prior_fault }) => {
            let status = match prior_fault {
                Some(fault) => format!("Spectrometer started (previous session failed: {fault})"),
                None => "Spectrometer started".to_string(),
            };
            Ok(Json(StatusResponse::new(status)))
        }
        Ok(StartStatus::AlreadyRunning) => {
            Ok(Json(StatusResponse::new("Spectrometer already running")))
        }
        Err(e) => Err(ErrorResponse::device_unavailable(format!(
            "Failed to start spectrometer: {e}"
        ))),
    }
}

/// Stop the spectrometer session. Safe no-op when already idle.
pub async fn stop_spectrometer(
    State(state): State<Arc<SpectrometerState>>,
) -> Json<StatusResponse> {
    match state.manager.stop().await {
        Ok(StopStatus::Stopped) => Json(StatusResponse::new("Spectrometer stopped")),
        Ok(StopStatus::WasIdle { prior_fault }) => {
            let status = match prior_fault {
                Some(fault) => {
                    format!("Spectrometer already stopped (previous session failed: {fault})")
                }
                None => "Spectrometer already stopped".to_string(),
            };
            Json(StatusResponse::new(status))
        }
        // stop は失敗しない契約だが、将来の変更に備えて文字列化して返す
        Err(e) => Json(StatusResponse::new(format!("Stop failed: {e}"))),
    }
}

/// Report the current session state, device label and observer count.
///
/// The front end uses this to reconcile its running flag after a reload.
pub async fn spectrometer_status(
    State(state): State<Arc<SpectrometerState>>,
) -> Json<SpectrometerStatus> {
    Json(SpectrometerStatus {
        state: state.manager.state().await,
        device: state.manager.device_label().to_string(),
        observers: state.broadcaster.observer_count().await,
        last_fault: state.manager.last_fault().await,
    })
}

/// Look up filament settings for a material and generate temperature G-code.
pub async fn filament_gcode(
    Path(material): Path<String>,
) -> Result<Json<FilamentGcodeResponse>, ErrorResponse> {
    let Some(kind) = MaterialKind::parse(&material) else {
        return Err(ErrorResponse::new(
            StatusCode::NOT_FOUND,
            format!("Unknown filament material: {material}"),
        ));
    };

    let settings = FilamentSettings::for_material(kind);
    info!(material = kind.as_str(), "Filament G-code requested");
    Ok(Json(FilamentGcodeResponse {
        material: kind.as_str().to_string(),
        print_temp: settings.print_temp,
        bed_temp: settings.bed_temp,
        gcode: settings.generate_gcode(),
    }))
}

/// WebSocket handler for the measurement push channel.
pub async fn measurements_websocket(
    State(state): State<Arc<SpectrometerState>>,
    ws: WebSocketUpgrade,
) -> Response {
    let broadcaster = Arc::clone(&state.broadcaster);
    ws.on_upgrade(move |socket| stream_measurements(socket, broadcaster))
}

/// Get system information
pub async fn get_system_info() -> Json<SystemInfo> {
    Json(SystemInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        uptime_seconds: get_system_uptime(),
    })
}

fn get_system_uptime() -> u64 {
    // Try to read system uptime from /proc/uptime
    if let Ok(contents) = std::fs::read_to_string("/proc/uptime")
        && let Some(uptime_str) = contents.split_whitespace().next()
        && let Ok(uptime) = uptime_str.parse::<f64>()
    {
        return uptime as u64;
    }
    0
}
