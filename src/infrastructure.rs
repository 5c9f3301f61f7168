//! インフラストラクチャ層
//!
//! センサーハードウェアとの統合を提供

pub mod hardware;
