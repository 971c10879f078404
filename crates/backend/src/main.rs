pub mod api;
pub mod domain;
pub mod shared;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use axum::middleware::{self, Next};
    use axum::response::Response;
    use axum::{
        routing::{get, post},
        Router,
    };
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tower_http::cors::{Any, CorsLayer};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                // Отключаем логи SQL запросов, но оставляем логи приложения
                "info,sqlx=warn,sea_orm=warn".into()
            }),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Простой middleware для логирования запросов
    async fn request_logger(req: Request<Body>, next: Next) -> Response {
        let start = std::time::Instant::now();
        let method = req.method().clone();
        let uri = req.uri().clone();

        let response = next.run(req).await;

        tracing::info!(
            "{} {} -> {} in {}ms",
            method,
            uri.path(),
            response.status().as_u16(),
            start.elapsed().as_millis()
        );
        response
    }

    let config = shared::config::load_config()?;

    // Initialize database (loads config from config.toml)
    shared::data::db::initialize_database()
        .await
        .map_err(|e| anyhow::anyhow!("db init failed: {e}"))?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        // Customer group handlers
        .route(
            "/api/customer_group",
            get(api::handlers::a001_customer_group::list_all)
                .post(api::handlers::a001_customer_group::create),
        )
        .route(
            "/api/customer_group/:id",
            get(api::handlers::a001_customer_group::get_by_id),
        )
        // Price list handlers
        .route(
            "/api/price_list",
            get(api::handlers::a002_price_list::list).post(api::handlers::a002_price_list::create),
        )
        .route(
            "/api/price_list/list",
            get(api::handlers::a002_price_list::list_paginated),
        )
        .route(
            "/api/price_list/:id",
            get(api::handlers::a002_price_list::get_by_id)
                .put(api::handlers::a002_price_list::update)
                .delete(api::handlers::a002_price_list::delete),
        )
        .route(
            "/api/price_list/:id/prices",
            post(api::handlers::a002_price_list::add_prices)
                .delete(api::handlers::a002_price_list::delete_prices),
        )
        .route(
            "/api/price_list/:id/customer_groups",
            post(api::handlers::a002_price_list::upsert_customer_groups),
        )
        .layer(middleware::from_fn(request_logger))
        .layer(cors);

    let addr: SocketAddr = ([0, 0, 0, 0], config.server.port).into();

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: Port {} is already in use. Please ensure no other process is using this port.",
                    config.server.port
                );
            } else {
                tracing::error!("Failed to bind to port {}. Error: {}", config.server.port, e);
            }
            // Propagate the error to stop the application
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;

    Ok(())
}
