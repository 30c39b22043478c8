// File: services/meetsync_backend/src/main.rs
use axum::{routing::get, Router};
use meetsync_config::load_config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

mod app_state;
use app_state::build_state;

#[tokio::main]
async fn main() {
    let config = Arc::new(load_config().expect("Failed to load config"));
    meetsync_common::logging::init();

    let state = build_state(config.clone())
        .await
        .expect("Failed to initialize services");

    // pick up any jobs left over from a previous run
    state.webhook.queue.trigger_drain();

    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to Meetsync API!" }))
        .merge(meetsync_booking::routes::routes(state.booking.clone()))
        .merge(meetsync_webhook::routes::routes(state.webhook.clone()));

    #[allow(unused_mut)] // with the openapi feature it needs to be mutable
    let mut app = Router::new()
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http());

    // Conditionally expose the merged OpenAPI document if the feature is on
    #[cfg(feature = "openapi")]
    {
        use meetsync_booking::doc::BookingApiDoc;
        use meetsync_webhook::doc::WebhookApiDoc;
        use utoipa::OpenApi;

        let mut openapi_doc = BookingApiDoc::openapi();
        openapi_doc.merge(WebhookApiDoc::openapi());
        println!("📖 Serving OpenAPI document at /api/docs/openapi.json");

        app = app.route(
            "/api/docs/openapi.json",
            get(move || async move { axum::Json(openapi_doc) }),
        );
    }

    // Bind and serve
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await.unwrap();
    println!("Starting server at http://{}", addr);
    println!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .unwrap();
}
