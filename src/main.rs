mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::middleware;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::features::auth::{AuthGatewayClient, SessionService};
use crate::features::dashboard::{routes as dashboard_routes, DashboardService};
use crate::features::reports::clients::PublicizeClient;
use crate::features::reports::models::ReportTable;
use crate::features::reports::{
    routes as reports_routes, ExportService, FeedWorker, GeocodingService, LifecycleService,
    RenderService,
};
use crate::features::users::models::UserTable;
use crate::features::users::{routes as users_routes, services::UserService};
use crate::modules::notify::PushRelayClient;
use crate::modules::store::{LiveTable, RestStoreClient};
use axum::extract::DefaultBodyLimit;
use axum::{middleware::from_fn, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Log system info
    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );

    tracing::info!("Configuration loaded successfully");

    // Realtime store client and the live caches it feeds
    let store = Arc::new(RestStoreClient::new(&config.store));
    let reports_table = Arc::new(LiveTable::<ReportTable>::default());
    let users_table = Arc::new(LiveTable::<UserTable>::default());
    tracing::info!("Realtime store client initialized for {}", config.store.base_url);

    // Auth gateway and per-token session resolution
    let gateway = Arc::new(AuthGatewayClient::new(&config.auth));
    let sessions = Arc::new(SessionService::new(
        gateway.clone(),
        store.clone(),
        config.auth.session_cache_ttl,
    ));
    tracing::info!("Session service initialized");

    // Outbound collaborators
    let notifier = Arc::new(PushRelayClient::new(&config.notify));
    let geocoding_service = Arc::new(GeocodingService::new(&config.geocode));
    let publicizer = Arc::new(PublicizeClient::new(&config.publicize));
    tracing::info!("Notification relay, geocoder, and publicize clients initialized");

    // Report services
    let render_service = Arc::new(RenderService::new(geocoding_service));
    let lifecycle_service = Arc::new(LifecycleService::new(
        store.clone(),
        notifier,
        users_table.clone(),
    ));
    let export_service = Arc::new(ExportService::new());
    tracing::info!("Report services initialized");

    // User directory service
    let user_service = Arc::new(UserService::new(
        store.clone(),
        gateway.clone(),
        users_table.clone(),
    ));
    tracing::info!("User service initialized");

    // Dashboard service
    let dashboard_service = Arc::new(DashboardService::new(reports_table.clone()));
    tracing::info!("Dashboard service initialized");

    // Spawn the live table feed worker
    let feed_worker = FeedWorker::new(
        store.clone(),
        reports_table.clone(),
        users_table.clone(),
        config.store.reconnect_backoff,
    );
    tokio::spawn(async move {
        feed_worker.run().await;
    });
    tracing::info!("Live table feed worker spawned");

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    // Build swagger router
    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Protected routes (require a resolved session)
    let protected_routes = Router::new()
        .merge(reports_routes::routes(
            reports_table.clone(),
            users_table.clone(),
            render_service,
            lifecycle_service,
            export_service,
            publicizer,
        ))
        .merge(users_routes::routes(user_service))
        .merge(dashboard_routes::routes(dashboard_service))
        .route_layer(axum::middleware::from_fn_with_state(
            sessions.clone(),
            middleware::auth_middleware,
        ));

    // Simple health check endpoint (no auth required)
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let app = Router::new()
        .merge(swagger)
        .merge(protected_routes)
        .merge(health_route)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        .layer(DefaultBodyLimit::max(config.app.max_request_body_size))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    socket.set_recv_buffer_size(256 * 1024)?;
    socket.set_send_buffer_size(256 * 1024)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(65535)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    axum::serve(listener, app).await?;

    Ok(())
}
