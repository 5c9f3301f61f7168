//! # PFVS Spectrometer Service
//!
//! Plastic Filament Verification System のバックエンドサービス。
//! 分光センサーを制御してフィラメントの材質と色を判定し、
//! 測定結果を接続中のクライアントへリアルタイム配信する。
//!
//! 以下の層に分かれています：
//!
//! - **Domain Layer**: 測定・分類のドメインモデル
//! - **Application Layer**: セッション管理と測定配信
//! - **Infrastructure Layer**: センサーハードウェアとの統合
//! - **Interface Layer**: HTTP / WebSocket インターフェース

pub mod domain;
pub mod debug;
pub mod application;
pub mod infrastructure;
pub mod interfaces;

// 公開API
pub use domain::*;

// エラー型の定義
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// サンプリング設定
#[derive(Debug, Clone, Copy)]
pub struct SamplingConfig {
    /// 測定周期（ミリ秒）
    pub interval_ms: u64,
    /// オブザーバー毎の配信キューの深さ
    pub observer_queue_depth: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            observer_queue_depth: 32,
        }
    }
}
