use crate::domain::classification::material::{MaterialKind, reference_spectrum};
use crate::domain::spectrometer::device::{RawColorReading, RawSample, SpectrometerDevice};
use crate::domain::spectrometer::errors::SpectrometerError;
use crate::domain::spectrometer::value_objects::SpectralFrame;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, info};

/// シミュレーター上のスペクトル強度スケール
const INTENSITY_SCALE: f32 = 1000.0;

/// 分光センサーのシミュレーター
///
/// 指定材質の基準スペクトルに決定的なゆらぎを加えたフレームを返す。
/// 実機同様にハンドルの二重取得を拒否する。
pub struct SimulatedSpectrometer {
    material: MaterialKind,
    fail_after: Option<usize>,
    acquired: AtomicBool,
    acquire_count: AtomicUsize,
    sample_count: AtomicUsize,
}

impl Default for SimulatedSpectrometer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSpectrometer {
    pub fn new() -> Self {
        Self {
            material: MaterialKind::Pla,
            fail_after: None,
            acquired: AtomicBool::new(false),
            acquire_count: AtomicUsize::new(0),
            sample_count: AtomicUsize::new(0),
        }
    }

    /// シミュレートする材質を指定
    pub fn with_material(mut self, material: MaterialKind) -> Self {
        self.material = material;
        self
    }

    /// n 回目以降のサンプリングで致命的エラーを発生させる
    pub fn failing_after(mut self, samples: usize) -> Self {
        self.fail_after = Some(samples);
        self
    }

    /// これまでのハンドル取得回数
    pub fn acquire_count(&self) -> usize {
        self.acquire_count.load(Ordering::SeqCst)
    }

    /// 材質に応じた代表色のセンサー周波数
    fn color_frequencies(&self) -> RawColorReading {
        match self.material {
            // 赤フィラメント相当
            MaterialKind::Pla => RawColorReading {
                red_hz: 95.0,
                green_hz: 55.0,
                blue_hz: 60.0,
            },
            // 青フィラメント相当
            MaterialKind::Petg => RawColorReading {
                red_hz: 55.0,
                green_hz: 60.0,
                blue_hz: 110.0,
            },
            // 緑フィラメント相当
            MaterialKind::Asa => RawColorReading {
                red_hz: 50.0,
                green_hz: 100.0,
                blue_hz: 65.0,
            },
        }
    }
}

#[async_trait::async_trait]
impl SpectrometerDevice for SimulatedSpectrometer {
    fn label(&self) -> &str {
        "simulated-as7265x"
    }

    async fn acquire(&self) -> Result<(), SpectrometerError> {
        if self
            .acquired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SpectrometerError::DeviceUnavailable(
                "simulated device handle already acquired".to_string(),
            ));
        }
        self.acquire_count.fetch_add(1, Ordering::SeqCst);
        info!("Simulated spectrometer acquired");
        Ok(())
    }

    async fn sample(&self) -> Result<RawSample, SpectrometerError> {
        if !self.acquired.load(Ordering::SeqCst) {
            return Err(SpectrometerError::IoFailed(
                "sampled without an acquired handle".to_string(),
            ));
        }

        let n = self.sample_count.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = self.fail_after
            && n >= limit
        {
            return Err(SpectrometerError::DeviceFault(
                "simulated sensor fault".to_string(),
            ));
        }

        // 基準スペクトルに ±1% の決定的なゆらぎを加える
        let base = reference_spectrum(self.material);
        let channels: Vec<f32> = base
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let ripple = 0.01 * ((n + i) as f32).sin();
                c * INTENSITY_SCALE * (1.0 + ripple)
            })
            .collect();

        debug!(sample = n, "Simulated frame generated");
        Ok(RawSample {
            spectral: SpectralFrame::new(channels),
            color: Some(self.color_frequencies()),
        })
    }

    async fn release(&self) -> Result<(), SpectrometerError> {
        self.acquired.store(false, Ordering::SeqCst);
        info!("Simulated spectrometer released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::classification::material::CHANNEL_COUNT;

    #[tokio::test]
    async fn test_double_acquire_is_rejected() {
        let device = SimulatedSpectrometer::new();
        device.acquire().await.unwrap();
        assert!(matches!(
            device.acquire().await,
            Err(SpectrometerError::DeviceUnavailable(_))
        ));

        device.release().await.unwrap();
        device.acquire().await.unwrap();
        assert_eq!(device.acquire_count(), 2);
    }

    #[tokio::test]
    async fn test_sample_returns_full_frame() {
        let device = SimulatedSpectrometer::new().with_material(MaterialKind::Petg);
        device.acquire().await.unwrap();

        let raw = device.sample().await.unwrap();
        assert_eq!(raw.spectral.channel_count(), CHANNEL_COUNT);
        assert!(raw.color.is_some());
    }

    #[tokio::test]
    async fn test_sample_without_acquire_fails() {
        let device = SimulatedSpectrometer::new();
        assert!(device.sample().await.is_err());
    }

    #[tokio::test]
    async fn test_failing_after_threshold() {
        let device = SimulatedSpectrometer::new().failing_after(2);
        device.acquire().await.unwrap();

        assert!(device.sample().await.is_ok());
        assert!(device.sample().await.is_ok());
        assert!(matches!(
            device.sample().await,
            Err(SpectrometerError::DeviceFault(_))
        ));
    }
}
