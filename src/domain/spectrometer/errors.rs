use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SpectrometerError {
    #[error("Spectrometer device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Spectrometer fault while sampling: {0}")]
    DeviceFault(String),

    #[error("Spectrometer device I/O failed: {0}")]
    IoFailed(String),

    #[error("Unexpected channel count: expected {expected}, got {actual}")]
    ChannelCountMismatch { expected: usize, actual: usize },
}

impl SpectrometerError {
    /// セッションを継続できない致命的エラーか
    pub fn is_fatal(&self) -> bool {
        matches!(self, SpectrometerError::DeviceFault(_))
    }
}

impl From<std::io::Error> for SpectrometerError {
    fn from(err: std::io::Error) -> Self {
        SpectrometerError::IoFailed(err.to_string())
    }
}
