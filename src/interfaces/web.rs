//! Web インターフェース
//!
//! 分光セッションの制御エンドポイント（start/stop/status）、
//! フィラメント設定の照会、測定プッシュチャンネル（WebSocket）、
//! および埋め込み静的ページを提供します。

mod embedded_assets;
mod error_response;
mod handlers;
mod measurement_streamer;
mod models;

pub mod server;

// 内部使用のため、必要な型のみを再エクスポート
pub(crate) use handlers::{
    SpectrometerState, filament_gcode, get_system_info, measurements_websocket,
    spectrometer_status, start_spectrometer, stop_spectrometer,
};
pub use models::PushMessage;
