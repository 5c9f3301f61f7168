use super::models::PushMessage;
use crate::application::broadcaster::MeasurementBroadcaster;
use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// Stream measurements to a WebSocket connection.
///
/// One observer registration per connection; the registration is removed
/// when the socket closes, so late subscribers never see earlier
/// measurements and a slow client only loses its own messages.
pub async fn stream_measurements(mut socket: WebSocket, broadcaster: Arc<MeasurementBroadcaster>) {
    let mut subscription = broadcaster.subscribe().await;
    info!(observer = %subscription.id, "Measurement streaming connected");

    // Send connection established message
    let connect_msg = json!({
        "timestamp": Utc::now().to_rfc3339(),
        "connected": true,
    })
    .to_string();

    if socket.send(Message::Text(connect_msg.into())).await.is_err() {
        broadcaster.unsubscribe(subscription.id).await;
        return;
    }

    loop {
        tokio::select! {
            measurement = subscription.receiver.recv() => {
                let Some(measurement) = measurement else {
                    break;
                };

                let message = PushMessage::from(measurement.as_ref());
                let Ok(payload) = serde_json::to_string(&message) else {
                    continue;
                };

                if socket.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        debug!("Received client message: {}", text);

                        if text.trim() == "ping"
                            && socket
                                .send(Message::Text("pong".to_string().into()))
                                .await
                                .is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!(observer = %subscription.id, "Client closed connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }

    broadcaster.unsubscribe(subscription.id).await;
    info!(observer = %subscription.id, "Measurement streaming ended");
}
