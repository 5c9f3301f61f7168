//! 材質毎のフィラメント設定と G-code 生成

use super::material::MaterialKind;
use serde::{Deserialize, Serialize};

/// 材質毎の印刷設定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilamentSettings {
    /// ノズル温度（℃）
    pub print_temp: u16,
    /// ベッド温度（℃）
    pub bed_temp: u16,
}

impl FilamentSettings {
    /// 材質に対応する設定を取得
    pub fn for_material(material: MaterialKind) -> Self {
        match material {
            MaterialKind::Pla => Self {
                print_temp: 210,
                bed_temp: 60,
            },
            MaterialKind::Petg => Self {
                print_temp: 240,
                bed_temp: 85,
            },
            MaterialKind::Asa => Self {
                print_temp: 260,
                bed_temp: 100,
            },
        }
    }

    /// プリンターへ送る温度設定 G-code を生成
    pub fn generate_gcode(&self) -> Vec<String> {
        vec![
            format!("M104 S{}", self.print_temp),
            format!("M140 S{}", self.bed_temp),
        ]
    }
}
