//! 分光センサードメイン
//!
//! セッション状態、測定レコード、デバイス抽象を定義

pub mod device;
pub mod errors;
pub mod value_objects;

pub use device::{RawColorReading, RawSample, SpectrometerDevice};
pub use errors::SpectrometerError;
pub use value_objects::{Measurement, Rgb, SessionState, SpectralFrame};
