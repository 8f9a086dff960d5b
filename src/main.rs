// Service entrypoint: config, pools, migrations, router, serve

use axum::{middleware as axum_middleware, routing::get, Router};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kino_auth_core::{
    app_config, handlers, health_check, initialize_app_state, middleware::auth_middleware,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle version flag for container health checks - must be FIRST
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--version" {
        println!("kino-auth-core v{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    dotenv::dotenv().ok();

    let config = app_config::config();

    // Initialize tracing with the configured level and format
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "kino_auth_core={},axum=info,tower_http=info",
            config.log_level
        ))
    });

    if config.log_json_format {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("=== STARTING AUTH SERVICE ===");
    info!("Binding on {}", config.bind_address);

    let app_state = match initialize_app_state().await {
        Ok(state) => state,
        Err(e) => {
            error!("Service initialization failed: {}", e);
            return Err(e);
        }
    };

    // CORS: reflect configured origins; wildcard stays permissive
    let cors = if config.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<axum::http::HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(tower_http::cors::AllowOrigin::list(origins))
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .nest(
            "/api/v1/auth",
            handlers::auth_public_routes().merge(
                handlers::auth_session_routes().route_layer(
                    axum_middleware::from_fn_with_state(app_state.clone(), auth_middleware),
                ),
            ),
        )
        .nest(
            "/api/v1/roles",
            handlers::role_routes().route_layer(axum_middleware::from_fn_with_state(
                app_state.clone(),
                auth_middleware,
            )),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(app_state);

    let addr: SocketAddr = config.bind_address.parse()?;
    info!("Starting HTTP server on {}...", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
