//! フィラメント材質の推定
//!
//! 18チャンネルの分光フレームを材質毎の基準スペクトルと比較し、
//! 最も近い材質を返す。十分に近い基準が無い場合は None。

use crate::domain::spectrometer::value_objects::SpectralFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// 分類器が前提とするチャンネル数（AS7265x: 410nm〜940nm の18バンド）
pub const CHANNEL_COUNT: usize = 18;

/// 正規化スペクトル間の許容距離。これを超える場合は判定を保留する
const MAX_REFERENCE_DISTANCE: f32 = 0.25;

/// この差以内の候補は同率とみなし、色ヒントで優先順位を付ける
const TIE_MARGIN: f32 = 0.02;

/// 判定対象のフィラメント材質
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MaterialKind {
    Pla,
    Petg,
    Asa,
}

impl MaterialKind {
    pub fn all() -> [MaterialKind; 3] {
        [MaterialKind::Pla, MaterialKind::Petg, MaterialKind::Asa]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialKind::Pla => "PLA",
            MaterialKind::Petg => "PETG",
            MaterialKind::Asa => "ASA",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PLA" => Some(MaterialKind::Pla),
            "PETG" => Some(MaterialKind::Petg),
            "ASA" => Some(MaterialKind::Asa),
            _ => None,
        }
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 材質毎の基準スペクトル（正規化済み、合計1.0）
struct ReferenceSpectrum {
    material: MaterialKind,
    channels: [f32; CHANNEL_COUNT],
    /// この材質でよく使われるフィラメント色（同率判定時のヒント）
    typical_colors: &'static [&'static str],
}

// 校正用フィラメントサンプルの実測スペクトルから作成した基準値
static REFERENCES: [ReferenceSpectrum; 3] = [
    ReferenceSpectrum {
        material: MaterialKind::Pla,
        channels: [
            0.031, 0.038, 0.047, 0.058, 0.071, 0.084, 0.092, 0.089, 0.081, 0.071, 0.062, 0.054,
            0.048, 0.043, 0.039, 0.033, 0.031, 0.028,
        ],
        typical_colors: &["red", "blue", "green"],
    },
    ReferenceSpectrum {
        material: MaterialKind::Petg,
        channels: [
            0.022, 0.026, 0.033, 0.041, 0.052, 0.063, 0.071, 0.076, 0.079, 0.078, 0.074, 0.068,
            0.061, 0.055, 0.050, 0.046, 0.053, 0.052,
        ],
        typical_colors: &["blue", "green"],
    },
    ReferenceSpectrum {
        material: MaterialKind::Asa,
        channels: [
            0.048, 0.051, 0.054, 0.056, 0.057, 0.058, 0.058, 0.057, 0.057, 0.056, 0.056, 0.055,
            0.055, 0.056, 0.056, 0.057, 0.056, 0.057,
        ],
        typical_colors: &["red"],
    },
];

/// 分光フレームから材質を推定
///
/// フレームを正規化して各基準スペクトルとのユークリッド距離を取り、
/// 最近傍の材質を返す。チャンネル数の不一致、強度ゼロ、
/// 全基準が遠すぎる場合は None。
pub fn predict_material(frame: &SpectralFrame, color_hint: Option<&str>) -> Option<MaterialKind> {
    if frame.channel_count() != CHANNEL_COUNT {
        debug!(
            expected = CHANNEL_COUNT,
            actual = frame.channel_count(),
            "Skipping material prediction: unexpected channel count"
        );
        return None;
    }

    let total = frame.total_intensity();
    if total <= 0.0 {
        return None;
    }

    let normalized: Vec<f32> = frame.channels().iter().map(|c| c / total).collect();

    let mut scored: Vec<(f32, &ReferenceSpectrum)> = REFERENCES
        .iter()
        .map(|reference| (distance(&normalized, &reference.channels), reference))
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));

    let (best_distance, best) = (scored[0].0, scored[0].1);
    if best_distance > MAX_REFERENCE_DISTANCE {
        debug!(distance = best_distance, "No reference spectrum close enough");
        return None;
    }

    // 僅差の候補が複数ある場合は色ヒントに合う材質を優先
    if let Some(hint) = color_hint {
        for (candidate_distance, candidate) in &scored {
            if candidate_distance - best_distance > TIE_MARGIN {
                break;
            }
            if candidate.typical_colors.iter().any(|c| *c == hint) {
                return Some(candidate.material);
            }
        }
    }

    Some(best.material)
}

/// 材質の基準スペクトルを取得（シミュレーターと校正で使用）
pub fn reference_spectrum(material: MaterialKind) -> [f32; CHANNEL_COUNT] {
    REFERENCES
        .iter()
        .find(|r| r.material == material)
        .map(|r| r.channels)
        .unwrap_or([0.0; CHANNEL_COUNT])
}

fn distance(sample: &[f32], reference: &[f32; CHANNEL_COUNT]) -> f32 {
    sample
        .iter()
        .zip(reference.iter())
        .map(|(s, r)| (s - r) * (s - r))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_from_reference(material: MaterialKind, scale: f32) -> SpectralFrame {
        let reference = REFERENCES
            .iter()
            .find(|r| r.material == material)
            .unwrap();
        SpectralFrame::new(reference.channels.iter().map(|c| c * scale).collect())
    }

    #[test]
    fn test_predicts_each_reference_material() {
        for material in MaterialKind::all() {
            let frame = frame_from_reference(material, 1000.0);
            assert_eq!(predict_material(&frame, None), Some(material));
        }
    }

    #[test]
    fn test_prediction_is_scale_invariant() {
        let bright = frame_from_reference(MaterialKind::Petg, 5000.0);
        let dim = frame_from_reference(MaterialKind::Petg, 12.0);
        assert_eq!(predict_material(&bright, None), Some(MaterialKind::Petg));
        assert_eq!(predict_material(&dim, None), Some(MaterialKind::Petg));
    }

    #[test]
    fn test_tolerates_small_noise() {
        let mut channels: Vec<f32> = REFERENCES[0].channels.to_vec();
        for (i, c) in channels.iter_mut().enumerate() {
            *c *= 1.0 + 0.01 * ((i % 3) as f32 - 1.0);
        }
        let frame = SpectralFrame::new(channels);
        assert_eq!(predict_material(&frame, None), Some(MaterialKind::Pla));
    }

    #[test]
    fn test_rejects_wrong_channel_count() {
        let frame = SpectralFrame::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(predict_material(&frame, None), None);
    }

    #[test]
    fn test_rejects_zero_intensity() {
        let frame = SpectralFrame::new(vec![0.0; CHANNEL_COUNT]);
        assert_eq!(predict_material(&frame, None), None);
    }

    #[test]
    fn test_rejects_distant_spectrum() {
        // 単一チャンネルに全強度が集中したスペクトルはどの基準にも一致しない
        let mut channels = vec![0.0; CHANNEL_COUNT];
        channels[0] = 100.0;
        let frame = SpectralFrame::new(channels);
        assert_eq!(predict_material(&frame, None), None);
    }

    #[test]
    fn test_material_kind_parse() {
        assert_eq!(MaterialKind::parse("pla"), Some(MaterialKind::Pla));
        assert_eq!(MaterialKind::parse("PETG"), Some(MaterialKind::Petg));
        assert_eq!(MaterialKind::parse("abs"), None);
    }
}
