use crate::domain::spectrometer::device::{RawSample, SpectrometerDevice};
use crate::domain::spectrometer::errors::SpectrometerError;
use crate::domain::spectrometer::value_objects::SpectralFrame;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

const IIO_DEVICES_DIR: &str = "/sys/bus/iio/devices";

/// name ファイルがこのいずれかを含むデバイスを分光センサーとして扱う
const SENSOR_NAMES: [&str; 2] = ["as7265x", "as72651"];

/// sysfs IIO 経由の分光センサー
///
/// `in_intensity<N>_raw` のチャンネルファイル群を読み取る。
/// カラーセンサーは IIO に現れないため、色情報は提供しない。
pub struct LinuxIioSpectrometer {
    device_dir: PathBuf,
    name: String,
    acquired: AtomicBool,
}

impl LinuxIioSpectrometer {
    pub fn new(device_dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            device_dir: device_dir.into(),
            name: name.into(),
            acquired: AtomicBool::new(false),
        }
    }

    /// /sys/bus/iio/devices から分光センサーを探す
    pub fn discover() -> Option<Self> {
        Self::discover_in(Path::new(IIO_DEVICES_DIR))
    }

    fn discover_in(devices_dir: &Path) -> Option<Self> {
        let entries = std::fs::read_dir(devices_dir).ok()?;

        for entry in entries.flatten() {
            let device_dir = entry.path();
            let Ok(name) = std::fs::read_to_string(device_dir.join("name")) else {
                continue;
            };
            let name = name.trim().to_string();

            if SENSOR_NAMES.iter().any(|s| name.contains(s)) {
                debug!(device = %device_dir.display(), name = %name, "Found IIO spectrometer");
                return Some(Self::new(device_dir, name));
            }
        }

        None
    }

    /// チャンネルファイルを番号順に列挙
    fn channel_files(&self) -> Result<Vec<PathBuf>, SpectrometerError> {
        let mut indexed: Vec<(usize, PathBuf)> = Vec::new();

        for entry in std::fs::read_dir(&self.device_dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };

            if let Some(rest) = file_name.strip_prefix("in_intensity")
                && let Some(index_str) = rest.strip_suffix("_raw")
                && let Ok(index) = index_str.parse::<usize>()
            {
                indexed.push((index, entry.path()));
            }
        }

        indexed.sort_by_key(|(index, _)| *index);
        Ok(indexed.into_iter().map(|(_, path)| path).collect())
    }
}

#[async_trait::async_trait]
impl SpectrometerDevice for LinuxIioSpectrometer {
    fn label(&self) -> &str {
        &self.name
    }

    async fn acquire(&self) -> Result<(), SpectrometerError> {
        if !self.device_dir.exists() {
            return Err(SpectrometerError::DeviceUnavailable(format!(
                "IIO device directory missing: {}",
                self.device_dir.display()
            )));
        }

        if self
            .acquired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SpectrometerError::DeviceUnavailable(
                "IIO device handle already acquired".to_string(),
            ));
        }

        Ok(())
    }

    async fn sample(&self) -> Result<RawSample, SpectrometerError> {
        let files = self.channel_files()?;
        if files.is_empty() {
            return Err(SpectrometerError::DeviceFault(
                "no intensity channels exposed by IIO device".to_string(),
            ));
        }

        let mut channels = Vec::with_capacity(files.len());
        for file in files {
            let raw = std::fs::read_to_string(&file)?;
            let value: f32 = raw.trim().parse().map_err(|_| {
                SpectrometerError::DeviceFault(format!(
                    "unparsable intensity value in {}",
                    file.display()
                ))
            })?;
            channels.push(value);
        }

        Ok(RawSample {
            spectral: SpectralFrame::new(channels),
            color: None,
        })
    }

    async fn release(&self) -> Result<(), SpectrometerError> {
        if !self.acquired.swap(false, Ordering::SeqCst) {
            warn!("Release called without an acquired IIO handle");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_device(dir: &Path, name: &str, channels: &[(usize, &str)]) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join("name"), format!("{name}\n")).unwrap();
        for (index, value) in channels {
            std::fs::write(dir.join(format!("in_intensity{index}_raw")), value).unwrap();
        }
    }

    #[tokio::test]
    async fn test_discover_and_sample_from_sysfs_layout() {
        let root = std::env::temp_dir().join(format!("pfvs-iio-{}", uuid::Uuid::new_v4()));
        let device_dir = root.join("iio:device0");
        write_device(
            &device_dir,
            "as7265x",
            &[(2, "30\n"), (0, "10\n"), (1, "20\n")],
        );

        let device = LinuxIioSpectrometer::discover_in(&root).expect("device should be found");
        assert_eq!(device.label(), "as7265x");

        device.acquire().await.unwrap();
        let raw = device.sample().await.unwrap();
        // チャンネルは番号順に並ぶ
        assert_eq!(raw.spectral.channels(), &[10.0, 20.0, 30.0]);
        assert!(raw.color.is_none());
        device.release().await.unwrap();

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_discover_ignores_other_sensors() {
        let root = std::env::temp_dir().join(format!("pfvs-iio-{}", uuid::Uuid::new_v4()));
        write_device(&root.join("iio:device0"), "bme280", &[(0, "1\n")]);

        assert!(LinuxIioSpectrometer::discover_in(&root).is_none());
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_acquire_fails_when_directory_missing() {
        let device = LinuxIioSpectrometer::new("/nonexistent/iio:device9", "as7265x");
        assert!(matches!(
            device.acquire().await,
            Err(SpectrometerError::DeviceUnavailable(_))
        ));
    }
}
