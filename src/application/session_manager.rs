//! 分光セッション管理
//!
//! start/stop 操作とサンプリングループを所有する。
//! 物理デバイスは1台のみのため、Running セッションは常に高々1つで、
//! 状態遷移は単一の非同期ミューテックスで直列化する。

use crate::SamplingConfig;
use crate::application::broadcaster::MeasurementBroadcaster;
use crate::domain::classification::{name_color, predict_material};
use crate::domain::spectrometer::device::{RawSample, SpectrometerDevice};
use crate::domain::spectrometer::errors::SpectrometerError;
use crate::domain::spectrometer::value_objects::{Measurement, Rgb, SessionState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// `start` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartStatus {
    /// 新しいセッションを開始した。直前のセッションが障害で終了していた
    /// 場合はその内容を持つ
    Started { prior_fault: Option<String> },
    /// 既に実行中（冪等応答、再取得は行わない）
    AlreadyRunning,
}

/// `stop` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopStatus {
    /// 実行中のセッションを停止した
    Stopped,
    /// 既に Idle（no-op）。障害で終了していた場合はその内容を持つ
    WasIdle { prior_fault: Option<String> },
}

/// 実行中セッションのハンドル
struct RunningSession {
    session_id: Uuid,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// 分光セッションマネージャー
pub struct SessionManager {
    device: Arc<dyn SpectrometerDevice>,
    broadcaster: Arc<MeasurementBroadcaster>,
    config: SamplingConfig,
    /// start/stop の直列化ポイント
    slot: Mutex<Option<RunningSession>>,
    state: Arc<RwLock<SessionState>>,
    last_fault: Arc<Mutex<Option<SpectrometerError>>>,
}

impl SessionManager {
    pub fn new(
        device: Arc<dyn SpectrometerDevice>,
        broadcaster: Arc<MeasurementBroadcaster>,
        config: SamplingConfig,
    ) -> Self {
        Self {
            device,
            broadcaster,
            config,
            slot: Mutex::new(None),
            state: Arc::new(RwLock::new(SessionState::Idle)),
            last_fault: Arc::new(Mutex::new(None)),
        }
    }

    /// 現在のセッション状態
    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    /// デバイスラベル
    pub fn device_label(&self) -> &str {
        self.device.label()
    }

    /// 直前のセッション障害（あれば）。取得はせず参照のみ
    pub async fn last_fault(&self) -> Option<String> {
        self.last_fault.lock().await.as_ref().map(|e| e.to_string())
    }

    /// セッションを開始
    ///
    /// 実行中に呼ばれた場合は冪等に `AlreadyRunning` を返し、
    /// ハンドルの再取得は行わない。デバイス取得失敗はそのまま返す。
    pub async fn start(&self) -> Result<StartStatus, SpectrometerError> {
        let mut slot = self.slot.lock().await;

        if let Some(running) = slot.as_ref() {
            if !running.task.is_finished() {
                info!(session = %running.session_id, "Start requested while already running");
                return Ok(StartStatus::AlreadyRunning);
            }
            // 障害で終了したタスクを回収してから開始する
            if let Some(dead) = slot.take() {
                if let Err(e) = dead.task.await {
                    error!("Sampling task terminated abnormally: {e}");
                }
            }
        }

        let prior_fault = self.last_fault.lock().await.take().map(|e| e.to_string());

        self.device.acquire().await?;
        *self.state.write().await = SessionState::Running;

        let session_id = Uuid::new_v4();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(sampling_loop(
            session_id,
            Arc::clone(&self.device),
            Arc::clone(&self.broadcaster),
            Arc::clone(&self.state),
            Arc::clone(&self.last_fault),
            shutdown_rx,
            Duration::from_millis(self.config.interval_ms),
        ));

        *slot = Some(RunningSession {
            session_id,
            shutdown: shutdown_tx,
            task,
        });

        info!(session = %session_id, device = self.device.label(), "Spectrometer session started");
        Ok(StartStatus::Started { prior_fault })
    }

    /// セッションを停止
    ///
    /// Idle のときは no-op。Running のときはサンプリングループへ停止を
    /// 通知し、ループがハンドル解放と Idle 遷移を終えるまで待つ。
    pub async fn stop(&self) -> Result<StopStatus, SpectrometerError> {
        let mut slot = self.slot.lock().await;

        let Some(running) = slot.take() else {
            debug!("Stop requested while idle");
            let prior_fault = self.last_fault.lock().await.take().map(|e| e.to_string());
            return Ok(StopStatus::WasIdle { prior_fault });
        };

        if running.task.is_finished() {
            // セッションは障害で既に終了している
            if let Err(e) = running.task.await {
                error!("Sampling task terminated abnormally: {e}");
            }
            let prior_fault = self.last_fault.lock().await.take().map(|e| e.to_string());
            return Ok(StopStatus::WasIdle { prior_fault });
        }

        *self.state.write().await = SessionState::Stopping;
        let _ = running.shutdown.send(true);

        if let Err(e) = running.task.await {
            error!("Sampling task terminated abnormally: {e}");
            // ループが後始末できなかった場合に備えて解放を試みる
            if let Err(release_err) = self.device.release().await {
                warn!("Device release after abnormal termination failed: {release_err}");
            }
        }
        *self.state.write().await = SessionState::Idle;

        info!(session = %running.session_id, "Spectrometer session stopped");
        Ok(StopStatus::Stopped)
    }
}

/// サンプリングループ
///
/// 周期毎に1フレームを読み取り、分類して Broadcaster へ渡す。
/// 停止通知か致命的なデバイスエラーで終了し、終了時に必ず
/// ハンドル解放と Idle 遷移を行う。
async fn sampling_loop(
    session_id: Uuid,
    device: Arc<dyn SpectrometerDevice>,
    broadcaster: Arc<MeasurementBroadcaster>,
    state: Arc<RwLock<SessionState>>,
    last_fault: Arc<Mutex<Option<SpectrometerError>>>,
    mut shutdown: watch::Receiver<bool>,
    period: Duration,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(session = %session_id, "Sampling loop started");

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                match device.sample().await {
                    Ok(raw) => {
                        // 停止通知後は Running でないため発行しない
                        if *shutdown.borrow() {
                            break;
                        }
                        let measurement = build_measurement(&raw);
                        let delivered = broadcaster.publish(measurement).await;
                        debug!(session = %session_id, delivered, "Measurement published");
                    }
                    Err(e) => {
                        error!(session = %session_id, "Fatal device error while sampling: {e}");
                        *last_fault.lock().await =
                            Some(SpectrometerError::DeviceFault(e.to_string()));
                        break;
                    }
                }
            }
        }
    }

    if let Err(e) = device.release().await {
        warn!(session = %session_id, "Device release failed: {e}");
    }
    *state.write().await = SessionState::Idle;
    info!(session = %session_id, "Sampling loop ended");
}

/// 生サンプルを分類済み測定へ変換
///
/// 得られた情報のみを載せる（部分更新のセマンティクス）
pub fn build_measurement(raw: &RawSample) -> Measurement {
    let rgb = raw
        .color
        .map(|c| Rgb::from_frequencies(c.red_hz, c.green_hz, c.blue_hz));
    let color_name = rgb.and_then(name_color);
    let material = predict_material(&raw.spectral, color_name);

    let mut measurement = Measurement::from_frame(&raw.spectral);
    if let Some(rgb) = rgb {
        measurement = measurement.with_rgb(rgb);
    }
    if let Some(color) = color_name {
        measurement = measurement.with_color(color);
    }
    if let Some(material) = material {
        measurement = measurement.with_material(material.as_str());
    }
    measurement
}
