use super::{
    SpectrometerState, embedded_assets::WebAssets, filament_gcode, get_system_info,
    measurements_websocket, spectrometer_status, start_spectrometer, stop_spectrometer,
};
use crate::SamplingConfig;
use crate::application::broadcaster::MeasurementBroadcaster;
use crate::application::session_manager::SessionManager;
use crate::infrastructure::hardware::detect_device;
use axum::{
    Router,
    body::Body,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::info;

pub async fn create_server(
    host: String,
    port: u16,
    config: SamplingConfig,
    force_simulator: bool,
) -> anyhow::Result<()> {
    info!("Starting PFVS spectrometer service...");

    // Parse socket address
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    // Create shared application state; fall back to the simulator when no
    // physical spectrometer is present.
    let device = detect_device(force_simulator);
    let broadcaster = Arc::new(MeasurementBroadcaster::new(config.observer_queue_depth));
    let manager = Arc::new(SessionManager::new(
        device,
        Arc::clone(&broadcaster),
        config,
    ));
    let app_state = Arc::new(SpectrometerState::new(manager, broadcaster));

    // Create the application router with all endpoints
    let app = Router::new()
        // Control endpoints consumed by the OctoPrint front end
        .route("/plugin/pfvs/start_spectrometer", post(start_spectrometer))
        .route("/plugin/pfvs/stop_spectrometer", post(stop_spectrometer))
        .route("/plugin/pfvs/status", get(spectrometer_status))
        // Filament settings
        .route("/api/filament/{material}/gcode", get(filament_gcode))
        // Operational endpoints
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/system/info", get(get_system_info))
        // WebSocket push channel
        .route("/ws/measurements", get(measurements_websocket))
        // Add state
        .with_state(app_state)
        // Add CORS support
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        // Serve embedded static files as fallback
        .fallback(static_handler);

    // Create TCP listener
    let listener = TcpListener::bind(&addr).await?;

    println!("🌐 PFVS service started successfully!");
    println!("   URL: http://{addr}");
    println!("   Press Ctrl+C to stop");

    // Run the server
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

/// 埋め込まれた静的ファイルを提供するハンドラ
async fn static_handler(uri: Uri) -> impl IntoResponse {
    let path = uri.path().trim_start_matches('/');

    // ルートパスの場合はindex.htmlを提供
    let path = if path.is_empty() || path == "/" {
        "index.html"
    } else {
        path
    };

    // ファイルを取得
    match WebAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, mime.as_ref())
                .body(Body::from(content.data.to_vec()))
                .unwrap()
        }
        None => {
            // ファイルが見つからない場合もプラグインページへ戻す
            if let Some(content) = WebAssets::get("index.html") {
                Response::builder()
                    .status(StatusCode::OK)
                    .header(header::CONTENT_TYPE, "text/html")
                    .body(Body::from(content.data.to_vec()))
                    .unwrap()
            } else {
                Response::builder()
                    .status(StatusCode::NOT_FOUND)
                    .body(Body::from("404 Not Found"))
                    .unwrap()
            }
        }
    }
}
