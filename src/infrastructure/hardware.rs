//! センサーハードウェア
//!
//! 実機（sysfs IIO 経由の分光センサー）とシミュレーターを提供

pub mod linux_iio_spectrometer;
pub mod simulated_spectrometer;

pub use linux_iio_spectrometer::LinuxIioSpectrometer;
pub use simulated_spectrometer::SimulatedSpectrometer;

use crate::domain::spectrometer::device::SpectrometerDevice;
use std::sync::Arc;

/// 利用可能なデバイスを検出する
///
/// 実機が見つからない場合はシミュレーターへフォールバックする
pub fn detect_device(force_simulator: bool) -> Arc<dyn SpectrometerDevice> {
    if force_simulator {
        tracing::info!("Using simulated spectrometer (requested)");
        return Arc::new(SimulatedSpectrometer::new());
    }

    match LinuxIioSpectrometer::discover() {
        Some(device) => {
            tracing::info!(device = device.label(), "Detected IIO spectrometer");
            Arc::new(device)
        }
        None => {
            tracing::warn!("No IIO spectrometer found, falling back to simulator");
            Arc::new(SimulatedSpectrometer::new())
        }
    }
}
