//! アプリケーション層
//!
//! セッション管理と測定配信のユースケースを定義

pub mod broadcaster;
pub mod session_manager;

pub use broadcaster::{MeasurementBroadcaster, ObserverId, Subscription};
pub use session_manager::{SessionManager, StartStatus, StopStatus};
