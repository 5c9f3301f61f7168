//! 測定配信
//!
//! 各測定を登録済みオブザーバー全員へベストエフォートで配る。
//! オブザーバー毎に有界 FIFO キューを持ち、発行順は各キュー内で保たれる。
//! 遅いオブザーバーや切断済みオブザーバーがサンプリングを
//! 停滞させることはない。

use crate::domain::spectrometer::value_objects::Measurement;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info};
use uuid::Uuid;

/// オブザーバーID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(Uuid);

impl ObserverId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 購読ハンドル
///
/// ドロップしても配信登録は残るため、明示的に `unsubscribe` するか
/// 受信側クローズで刈り取られるのを待つ
pub struct Subscription {
    pub id: ObserverId,
    pub receiver: mpsc::Receiver<Arc<Measurement>>,
}

/// 測定ブロードキャスター
#[derive(Debug)]
pub struct MeasurementBroadcaster {
    observers: RwLock<HashMap<ObserverId, mpsc::Sender<Arc<Measurement>>>>,
    queue_depth: usize,
}

impl MeasurementBroadcaster {
    pub fn new(queue_depth: usize) -> Self {
        Self {
            observers: RwLock::new(HashMap::new()),
            queue_depth: queue_depth.max(1),
        }
    }

    /// オブザーバーを登録
    ///
    /// 購読以降に発行された測定のみ受信する（過去分の再送は無い）
    pub async fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.queue_depth);
        let id = ObserverId::generate();
        self.observers.write().await.insert(id, sender);
        info!(observer = %id, "Observer subscribed");
        Subscription { id, receiver }
    }

    /// オブザーバーの登録を解除
    pub async fn unsubscribe(&self, id: ObserverId) {
        if self.observers.write().await.remove(&id).is_some() {
            info!(observer = %id, "Observer unsubscribed");
        }
    }

    /// 登録中のオブザーバー数
    pub async fn observer_count(&self) -> usize {
        self.observers.read().await.len()
    }

    /// 測定を全オブザーバーへ配信
    ///
    /// キューが一杯のオブザーバーへはその測定を落とし、
    /// クローズ済みのオブザーバーは登録から刈り取る。
    /// オブザーバーが居なければ測定は破棄される。
    /// 戻り値は配信に成功したオブザーバー数。
    pub async fn publish(&self, measurement: Measurement) -> usize {
        let measurement = Arc::new(measurement);
        let mut closed: Vec<ObserverId> = Vec::new();
        let mut delivered = 0;

        {
            let observers = self.observers.read().await;
            for (id, sender) in observers.iter() {
                match sender.try_send(Arc::clone(&measurement)) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        // 配信失敗はこのオブザーバー限りで、セッションには伝播しない
                        debug!(observer = %id, "Observer queue full, dropping measurement");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        closed.push(*id);
                    }
                }
            }
        }

        if !closed.is_empty() {
            let mut observers = self.observers.write().await;
            for id in closed {
                observers.remove(&id);
                debug!(observer = %id, "Pruned closed observer");
            }
        }

        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::spectrometer::value_objects::{Rgb, SpectralFrame};

    fn measurement(samples: Vec<f32>) -> Measurement {
        Measurement::from_frame(&SpectralFrame::new(samples))
    }

    #[tokio::test]
    async fn test_publish_without_observers_discards() {
        let broadcaster = MeasurementBroadcaster::new(4);
        let delivered = broadcaster.publish(measurement(vec![1.0])).await;
        assert_eq!(delivered, 0);
        assert_eq!(broadcaster.observer_count().await, 0);
    }

    #[tokio::test]
    async fn test_delivery_preserves_emission_order() {
        let broadcaster = MeasurementBroadcaster::new(8);
        let mut subscription = broadcaster.subscribe().await;

        for i in 0..5 {
            broadcaster.publish(measurement(vec![i as f32])).await;
        }

        for i in 0..5 {
            let received = subscription.receiver.recv().await.unwrap();
            assert_eq!(received.spectral_samples, vec![i as f32]);
        }
    }

    #[tokio::test]
    async fn test_late_subscriber_never_sees_prior_measurement() {
        let broadcaster = MeasurementBroadcaster::new(4);
        broadcaster.publish(measurement(vec![1.0, 2.0, 3.0])).await;

        let mut subscription = broadcaster.subscribe().await;
        broadcaster.publish(measurement(vec![4.0])).await;

        let first = subscription.receiver.recv().await.unwrap();
        assert_eq!(first.spectral_samples, vec![4.0]);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let broadcaster = MeasurementBroadcaster::new(4);
        let subscription = broadcaster.subscribe().await;
        assert_eq!(broadcaster.observer_count().await, 1);

        broadcaster.unsubscribe(subscription.id).await;
        assert_eq!(broadcaster.observer_count().await, 0);
        assert_eq!(broadcaster.publish(measurement(vec![1.0])).await, 0);
    }

    #[tokio::test]
    async fn test_full_queue_drops_for_that_observer_only() {
        let broadcaster = MeasurementBroadcaster::new(1);
        let mut slow = broadcaster.subscribe().await;
        let mut fast = broadcaster.subscribe().await;

        // slow のキュー(深さ1)を先に埋める
        assert_eq!(broadcaster.publish(measurement(vec![1.0])).await, 2);
        // slow へは落ち、fast へは届く
        assert_eq!(broadcaster.publish(measurement(vec![2.0])).await, 1);

        assert_eq!(
            fast.receiver.recv().await.unwrap().spectral_samples,
            vec![1.0]
        );
        assert_eq!(
            fast.receiver.recv().await.unwrap().spectral_samples,
            vec![2.0]
        );
        assert_eq!(
            slow.receiver.recv().await.unwrap().spectral_samples,
            vec![1.0]
        );

        // 登録は維持されるため、次の測定からは再び届く
        broadcaster.publish(measurement(vec![3.0])).await;
        assert_eq!(
            slow.receiver.recv().await.unwrap().spectral_samples,
            vec![3.0]
        );
    }

    #[tokio::test]
    async fn test_closed_observer_is_pruned() {
        let broadcaster = MeasurementBroadcaster::new(4);
        let subscription = broadcaster.subscribe().await;
        drop(subscription);

        broadcaster.publish(measurement(vec![1.0])).await;
        assert_eq!(broadcaster.observer_count().await, 0);
    }

    #[tokio::test]
    async fn test_partial_fields_pass_through_unchanged() {
        let broadcaster = MeasurementBroadcaster::new(4);
        let mut subscription = broadcaster.subscribe().await;

        let published = measurement(vec![1.0, 2.0, 3.0])
            .with_material("PLA")
            .with_rgb(Rgb::new(255, 0, 0));
        broadcaster.publish(published.clone()).await;

        let received = subscription.receiver.recv().await.unwrap();
        assert_eq!(*received, published);
        assert_eq!(received.predicted_color, None);
    }
}
