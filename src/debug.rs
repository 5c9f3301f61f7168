//! デバッグとログ機能
//!
//! サービス全体のログ設定を提供

use std::fs;
use tracing::{Level, debug, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// デバッグ設定
#[derive(Debug, Clone)]
pub struct DebugConfig {
    /// ログレベル
    pub log_level: Level,
    /// ファイルログを有効にするか
    pub enable_file_logging: bool,
    /// ログファイルのディレクトリ
    pub log_directory: String,
    /// JSONフォーマットを使用するか
    pub use_json_format: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            enable_file_logging: false,
            log_directory: "logs".to_string(),
            use_json_format: false,
        }
    }
}

impl DebugConfig {
    /// 開発環境用の設定
    pub fn development() -> Self {
        Self {
            log_level: Level::DEBUG,
            enable_file_logging: true,
            log_directory: "logs".to_string(),
            use_json_format: false,
        }
    }

    /// 本番環境用の設定
    pub fn production() -> Self {
        Self {
            log_level: Level::INFO,
            enable_file_logging: true,
            log_directory: "/var/log/pfvs".to_string(),
            use_json_format: true,
        }
    }

    /// テスト環境用の設定
    pub fn test() -> Self {
        Self {
            log_level: Level::WARN,
            enable_file_logging: false,
            log_directory: "test_logs".to_string(),
            use_json_format: false,
        }
    }
}

/// ログシステムを初期化
pub fn init_logging(config: &DebugConfig) -> Result<(), Box<dyn std::error::Error>> {
    // ログディレクトリを作成
    if config.enable_file_logging {
        fs::create_dir_all(&config.log_directory)?;
    }

    // 環境変数からのフィルター設定
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("pfvs={}", config.log_level)))?;

    if config.enable_file_logging {
        let file_appender =
            RollingFileAppender::new(Rotation::DAILY, &config.log_directory, "pfvs.log");

        if config.use_json_format {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(file_appender)
                .json()
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(file_appender)
                .init();
        }
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }

    info!("ログシステムが初期化されました");
    debug!("デバッグ設定: {:?}", config);

    Ok(())
}

/// 処理時間測定用のマクロ
#[macro_export]
macro_rules! measure_time {
    ($name:expr, $block:block) => {{
        let start = std::time::Instant::now();
        let result = $block;
        let duration = start.elapsed();
        tracing::info!(
            operation = $name,
            duration_ms = duration.as_millis(),
            "操作完了"
        );
        result
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_config_profiles() {
        assert_eq!(DebugConfig::development().log_level, Level::DEBUG);
        assert!(DebugConfig::production().use_json_format);
        assert!(!DebugConfig::test().enable_file_logging);
    }

    #[traced_test]
    #[test]
    fn test_measure_time_macro() {
        let result = measure_time!("test_operation", { 40 + 2 });
        assert_eq!(result, 42);
    }
}
