//! インターフェース層
//!
//! HTTP / WebSocket によるサービスへの入口を提供

pub mod web;
