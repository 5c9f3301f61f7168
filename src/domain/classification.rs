//! 材質・色分類ドメイン
//!
//! 分光フレームからのフィラメント材質推定、RGB からの色名判定、
//! および材質毎のフィラメント設定を定義

pub mod color;
pub mod filament;
pub mod material;

pub use color::name_color;
pub use filament::FilamentSettings;
pub use material::{MaterialKind, predict_material};
