//! 分光センサーの値オブジェクト

use serde::{Deserialize, Serialize};
use std::fmt;

/// セッション状態
///
/// 物理デバイスは1台のみのため、Running のセッションは常に高々1つ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    Stopping,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Running => write!(f, "running"),
            SessionState::Stopping => write!(f, "stopping"),
        }
    }
}

/// 1回の読み取りで得られる分光強度の列
///
/// チャンネル数はデバイス依存（AS7265x 系センサーでは18）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralFrame {
    channels: Vec<f32>,
}

impl SpectralFrame {
    pub fn new(channels: Vec<f32>) -> Self {
        Self { channels }
    }

    pub fn channels(&self) -> &[f32] {
        &self.channels
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// 全チャンネル強度の合計
    pub fn total_intensity(&self) -> f32 {
        self.channels.iter().sum()
    }
}

// TCS3200 カラーセンサーの周波数キャリブレーション範囲
// （白基準 / 黒基準の実測値）
const RED_RANGE: (f32, f32) = (40.0, 106.0);
const GREEN_RANGE: (f32, f32) = (40.0, 108.0);
const BLUE_RANGE: (f32, f32) = (48.0, 123.0);

/// RGB 値オブジェクト
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// カラーセンサーの生周波数からキャリブレーション済み RGB を作成
    pub fn from_frequencies(red_hz: f32, green_hz: f32, blue_hz: f32) -> Self {
        Self {
            r: scale_channel(red_hz, RED_RANGE),
            g: scale_channel(green_hz, GREEN_RANGE),
            b: scale_channel(blue_hz, BLUE_RANGE),
        }
    }

    pub fn as_array(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

fn scale_channel(raw_hz: f32, (black, white): (f32, f32)) -> u8 {
    let scaled = 255.0 * ((raw_hz - black) / (white - black));
    scaled.round().clamp(0.0, 255.0) as u8
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// 測定レコード
///
/// セッション実行中にのみ生成される不変オブジェクト。
/// 分類フィールドはそれぞれ独立に欠落しうる。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub spectral_samples: Vec<f32>,
    pub predicted_material: Option<String>,
    pub predicted_color: Option<String>,
    pub rgb: Option<Rgb>,
}

impl Measurement {
    pub fn from_frame(frame: &SpectralFrame) -> Self {
        Self {
            spectral_samples: frame.channels().to_vec(),
            predicted_material: None,
            predicted_color: None,
            rgb: None,
        }
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.predicted_material = Some(material.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.predicted_color = Some(color.into());
        self
    }

    pub fn with_rgb(mut self, rgb: Rgb) -> Self {
        self.rgb = Some(rgb);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_display() {
        assert_eq!(SessionState::Idle.to_string(), "idle");
        assert_eq!(SessionState::Running.to_string(), "running");
        assert_eq!(SessionState::Stopping.to_string(), "stopping");
    }

    #[test]
    fn test_rgb_calibration() {
        // 白基準値は 255 に写像される
        let white = Rgb::from_frequencies(106.0, 108.0, 123.0);
        assert_eq!(white.as_array(), [255, 255, 255]);

        // 黒基準値は 0 に写像される
        let black = Rgb::from_frequencies(40.0, 40.0, 48.0);
        assert_eq!(black.as_array(), [0, 0, 0]);
    }

    #[test]
    fn test_rgb_calibration_clamps_out_of_range() {
        let over = Rgb::from_frequencies(200.0, 200.0, 200.0);
        assert_eq!(over.as_array(), [255, 255, 255]);

        let under = Rgb::from_frequencies(0.0, 0.0, 0.0);
        assert_eq!(under.as_array(), [0, 0, 0]);
    }

    #[test]
    fn test_measurement_builder() {
        let frame = SpectralFrame::new(vec![1.0, 2.0, 3.0]);
        let measurement = Measurement::from_frame(&frame)
            .with_material("PLA")
            .with_rgb(Rgb::new(255, 0, 0));

        assert_eq!(measurement.spectral_samples, vec![1.0, 2.0, 3.0]);
        assert_eq!(measurement.predicted_material.as_deref(), Some("PLA"));
        assert_eq!(measurement.predicted_color, None);
        assert_eq!(measurement.rgb, Some(Rgb::new(255, 0, 0)));
    }

    #[test]
    fn test_spectral_frame_total_intensity() {
        let frame = SpectralFrame::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(frame.total_intensity(), 6.0);
        assert_eq!(frame.channel_count(), 3);
    }
}
