use std::net::TcpListener;
use std::sync::Arc;

use chirpy::configuration::get_configuration;
use chirpy::startup::run;
use chirpy::storage::{PgRefreshTokenRepository, PgUserRepository};
use chirpy::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // 구조화된 로깅 초기화
    init_telemetry("info");

    tracing::info!("Starting application");

    // 설정 로드
    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    // 인증 설정 검증 (서명 키가 없으면 시작하지 않음)
    if let Err(e) = configuration.auth.validate() {
        tracing::error!("Invalid auth configuration: {}", e);
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Configuration error",
        ));
    }
    tracing::info!(auth = ?configuration.auth, "Auth settings loaded");

    // 데이터베이스 연결 풀 생성
    let connection_string = configuration.database.connection_string();
    tracing::info!(database = ?configuration.database, "Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(configuration.auth.store_timeout())
        .connect(&connection_string)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    // 마이그레이션 적용
    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run migrations: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Migration error")
    })?;

    tracing::info!("Database connection pool created successfully");

    // 서버 주소 설정
    let address = configuration.application.address();
    tracing::info!("Binding server to address: {}", address);

    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    // 서버 실행
    let server = run(
        listener,
        Arc::new(PgUserRepository::new(pool.clone())),
        Arc::new(PgRefreshTokenRepository::new(pool)),
        configuration.auth,
    )?;
    tracing::info!("Server started successfully");

    server.await
}
