//! RGB 値からの色名判定

use crate::domain::spectrometer::value_objects::Rgb;

/// 最も支配的なチャンネルから色名を決定
///
/// 赤が両チャンネルを上回れば赤、そうでなければ青と緑の比較で決める。
/// 判定不能（青と緑が同値）の場合は None。
pub fn name_color(rgb: Rgb) -> Option<&'static str> {
    if rgb.r > rgb.g && rgb.r > rgb.b {
        Some("red")
    } else if rgb.b > rgb.g {
        Some("blue")
    } else if rgb.g > rgb.b {
        Some("green")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_red() {
        assert_eq!(name_color(Rgb::new(200, 40, 30)), Some("red"));
    }

    #[test]
    fn test_blue_beats_green() {
        assert_eq!(name_color(Rgb::new(10, 50, 60)), Some("blue"));
        // 赤が最大でなければ青/緑比較にフォールバック
        assert_eq!(name_color(Rgb::new(55, 50, 60)), Some("blue"));
    }

    #[test]
    fn test_green() {
        assert_eq!(name_color(Rgb::new(10, 90, 60)), Some("green"));
    }

    #[test]
    fn test_ambiguous_is_none() {
        assert_eq!(name_color(Rgb::new(10, 50, 50)), None);
        assert_eq!(name_color(Rgb::new(0, 0, 0)), None);
    }
}
