use std::net::SocketAddr;
use std::sync::Arc;

use auth::Authenticator;
use auth::CredentialHasher;
use auth::TokenCodec;
use sqlx::postgres::PgPoolOptions;
use tonic::transport::Server;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use user_service::config::Config;
use user_service::domain::user::ports::ProfileServicePort;
use user_service::domain::user::ports::SessionServicePort;
use user_service::domain::user::service::ProfileService;
use user_service::domain::user::service::SessionService;
use user_service::inbound::grpc::AuthGrpcService;
use user_service::inbound::http::router::create_router;
use user_service::outbound::logs::MongoLogSink;
use user_service::outbound::repositories::PostgresUserRepository;
use user_service::outbound::revocations::RedisRevocationStore;
use user_service::proto::auth_service_server::AuthServiceServer;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::load()?;

    let mongo_sink = match &config.logging.mongo {
        Some(mongo) => Some(MongoLogSink::connect(mongo).await?),
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(mongo_sink.map(|sink| tracing_subscriber::fmt::layer().json().with_writer(sink)))
        .init();

    tracing::info!(
        service = "user-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    tracing::info!(
        http_port = config.server.http_port,
        grpc_port = config.server.grpc_port,
        access_token_ttl_minutes = config.jwt.access_token_ttl_minutes,
        refresh_token_ttl_days = config.jwt.refresh_token_ttl_days,
        digest_algorithm = %config.credentials.algorithm,
        mongo_logging = config.logging.mongo.is_some(),
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let revocations = Arc::new(RedisRevocationStore::connect(&config.redis).await?);
    tracing::info!(store = "redis", "Revocation store connected");

    let authenticator = Arc::new(Authenticator::new(
        CredentialHasher::new(config.credentials.salt.as_bytes(), config.credentials.algorithm)?,
        TokenCodec::new(
            config.jwt.secret.as_bytes(),
            config.jwt.access_token_ttl(),
            config.jwt.refresh_token_ttl(),
        ),
    ));
    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool));

    let session_service: Arc<dyn SessionServicePort> = Arc::new(SessionService::new(
        Arc::clone(&user_repository),
        revocations,
        Arc::clone(&authenticator),
    ));
    let profile_service: Arc<dyn ProfileServicePort> =
        Arc::new(ProfileService::new(user_repository));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        Arc::clone(&session_service),
        profile_service,
        authenticator,
    );
    let http_server = tokio::spawn(async move {
        axum::serve(http_listener, http_application)
            .with_graceful_shutdown(shutdown_signal("http"))
            .await
    });

    let grpc_address: SocketAddr = format!("0.0.0.0:{}", config.server.grpc_port).parse()?;
    let grpc_service = AuthGrpcService::new(session_service);
    tracing::info!(
        address = %grpc_address,
        port = config.server.grpc_port,
        protocol = "grpc",
        "gRpc server listening"
    );

    let grpc_server = tokio::spawn(async move {
        Server::builder()
            .add_service(AuthServiceServer::new(grpc_service))
            .serve_with_shutdown(grpc_address, shutdown_signal("grpc"))
            .await
    });

    match tokio::try_join!(http_server, grpc_server) {
        Ok((http_result, grpc_result)) => {
            if let Err(e) = http_result {
                tracing::error!(error = %e, protocol = "http", "Server error");
            }
            if let Err(e) = grpc_result {
                tracing::error!(error = %e, protocol = "grpc", "Server error");
            }
            tracing::info!("Servers exited");
        }
        Err(e) => tracing::error!(error = %e, "Server task failed"),
    };

    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal(protocol: &'static str) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!(protocol, "Shutting down");
}
