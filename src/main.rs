use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use checkin_rewards::{
    AppState, build_router,
    catalog::{MemoryCatalog, PgRestaurantCatalog, RestaurantCatalog},
    config::Config,
    session::SessionRegistry,
    storage::RedisStorage,
    utils::SystemClock,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
#[cfg(debug_assertions)]
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 餐厅目录：优先 Postgres，其次 JSON 文件
async fn build_catalog(config: &Config) -> Result<Arc<dyn RestaurantCatalog>, BoxError> {
    if let Some(database_url) = &config.database_url {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute("SET application_name = 'checkin_rewards';")
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;

        let catalog = PgRestaurantCatalog::new(pool);
        catalog.init().await?;
        tracing::info!("Using Postgres restaurant catalog");
        return Ok(Arc::new(catalog));
    }

    if let Some(path) = &config.restaurant_catalog_path {
        let catalog = MemoryCatalog::from_json_file(path)?;
        tracing::info!(path = %path, restaurants = catalog.len(), "Loaded restaurant catalog");
        return Ok(Arc::new(catalog));
    }

    tracing::warn!("No DATABASE_URL or RESTAURANT_CATALOG_PATH set, every scan will be an invalid code");
    Ok(Arc::new(MemoryCatalog::default()))
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    // 设置 Redis 客户端
    let redis_client = redis::Client::open(config.redis_url.clone())?;
    let storage = Arc::new(RedisStorage::new(Arc::new(redis_client)));

    let catalog = build_catalog(&config).await?;
    let policy = config.checkin_policy();
    tracing::info!(
        radius_meters = policy.radius_meters,
        expiry_secs = policy.expiry.as_secs(),
        reward_points = policy.reward_points,
        "Check-in policy"
    );

    // 设置应用状态
    let sessions = Arc::new(
        SessionRegistry::new(storage, catalog.clone(), Arc::new(SystemClock), policy)
            .with_idle_ttl(config.session_idle_ttl()),
    );
    // 定期回收闲置的设备会话
    let _sweeper = sessions.spawn_sweeper(config.session_idle_ttl() / 2);
    let state = AppState {
        config: config.clone(),
        catalog,
        sessions,
    };

    let app = build_router(state);

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let app = {
        tracing::debug!("Adding CORS layer for development mode");
        app.layer(CorsLayer::permissive())
    };

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
