//! ドメイン層
//!
//! 分光測定と材質分類のドメインモデルを定義

pub mod spectrometer;
pub mod classification;

pub use spectrometer::errors::SpectrometerError;
pub use spectrometer::value_objects::{Measurement, Rgb, SessionState, SpectralFrame};
