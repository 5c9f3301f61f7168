use super::errors::SpectrometerError;
use super::value_objects::SpectralFrame;

/// カラーセンサーの生読み取り値（チャンネル毎の平均周波数）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawColorReading {
    pub red_hz: f32,
    pub green_hz: f32,
    pub blue_hz: f32,
}

/// 1回のサンプリングで得られる生データ
///
/// カラーセンサーを持たないデバイスでは `color` は None
#[derive(Debug, Clone)]
pub struct RawSample {
    pub spectral: SpectralFrame,
    pub color: Option<RawColorReading>,
}

/// 分光センサーデバイスのトレイト
///
/// Running セッションがハンドルを排他的に所有する。
/// `acquire` が成功したら、対応する `release` まで再取得は失敗する。
#[async_trait::async_trait]
pub trait SpectrometerDevice: Send + Sync {
    /// デバイスの識別ラベル
    fn label(&self) -> &str;

    /// デバイスハンドルを排他取得
    async fn acquire(&self) -> Result<(), SpectrometerError>;

    /// 1サンプルを読み取り
    async fn sample(&self) -> Result<RawSample, SpectrometerError>;

    /// デバイスハンドルを解放
    async fn release(&self) -> Result<(), SpectrometerError>;
}
