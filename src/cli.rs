use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "pfvs",
    author = "Team 25009",
    version,
    about = "Plastic Filament Verification System spectrometer service",
    long_about = "Backend service for the PFVS OctoPrint plugin: controls the \
                  spectrometer, classifies filament material and color, and \
                  streams measurements to connected clients"
)]
pub struct Cli {
    /// Use development logging (debug level, file log in ./logs)
    #[arg(long, global = true)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the spectrometer service and web server
    Run {
        /// Port to bind the web server to
        #[arg(short, long, default_value = "5000")]
        port: u16,
        /// Host to bind the web server to
        #[arg(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
        /// Sampling interval in milliseconds
        #[arg(short, long, default_value = "500")]
        interval_ms: u64,
        /// Force the simulated spectrometer even if hardware is present
        #[arg(long)]
        simulate: bool,
    },
    /// Take one-shot readings and print the classification result
    #[command(name = "scan")]
    Scan {
        /// Number of frames to read
        #[arg(short, long, default_value = "1")]
        count: usize,
        /// Force the simulated spectrometer even if hardware is present
        #[arg(long)]
        simulate: bool,
    },
}
