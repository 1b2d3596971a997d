use library_catalog::adapter::driven::{
    Argon2PasswordHasher, ConsoleLogger, InMemoryLibraryStore, MySqlBookRepository,
    MySqlBorrowingRepository, MySqlLibraryStore, MySqlMemberRepository, SystemClock,
};
use library_catalog::adapter::driver::rest_api::{create_router, AppState};
use library_catalog::adapter::{AppConfig, DatabaseConfig, DatabaseMigration, StorageKind};
use library_catalog::domain::model::Email;
use library_catalog::domain::port::Logger;

use sqlx::mysql::MySqlPoolOptions;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

const COMPONENT: &str = "main";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let logger: Arc<dyn Logger> = Arc::new(ConsoleLogger::with_min_level(config.log_level));
    logger.info(COMPONENT, "図書館蔵書管理システム REST API を起動します", None, None);

    let clock = Arc::new(SystemClock);
    let password_hasher = Arc::new(Argon2PasswordHasher::new());

    let app_state = match config.storage {
        StorageKind::MySql => {
            let db_config = DatabaseConfig::from_env()?;
            logger.info(
                COMPONENT,
                &format!(
                    "データベース設定を読み込みました: {}:{}",
                    db_config.host, db_config.port
                ),
                None,
                None,
            );

            // 接続プールを作成
            let pool = MySqlPoolOptions::new()
                .max_connections(db_config.max_connections)
                .connect(&db_config.connection_string())
                .await?;

            // マイグレーションを実行
            DatabaseMigration::new(pool.clone(), logger.clone())
                .run()
                .await?;
            logger.info(COMPONENT, "データベースマイグレーションを実行しました", None, None);

            AppState::new(
                Arc::new(MySqlLibraryStore::new(pool.clone())),
                Arc::new(MySqlBookRepository::new(pool.clone())),
                Arc::new(MySqlMemberRepository::new(pool.clone())),
                Arc::new(MySqlBorrowingRepository::new(pool)),
                clock,
                password_hasher,
                logger.clone(),
            )
        }
        StorageKind::Memory => {
            logger.warn(
                COMPONENT,
                "インメモリストアを使用します（再起動するとデータは失われます）",
                None,
                None,
            );
            let store = Arc::new(InMemoryLibraryStore::new());
            AppState::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store,
                clock,
                password_hasher,
                logger.clone(),
            )
        }
    };

    // 管理者アカウントを用意する
    let admin = &config.admin;
    if admin.uses_default_password() {
        logger.warn(
            COMPONENT,
            "ADMIN_PASSWORD が未設定のため既定のパスワードを使用します",
            None,
            None,
        );
    }
    let created = app_state
        .member_service
        .ensure_admin_account(
            admin.name.clone(),
            Email::new(admin.email.clone())?,
            &admin.password,
        )
        .await?;
    if let Some(member) = created {
        let mut context = HashMap::new();
        context.insert("member_id".to_string(), member.id().to_string());
        logger.info(COMPONENT, "管理者アカウントを作成しました", None, Some(context));
    }

    // REST APIルーターを作成
    let app = create_router()
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(app_state);

    // サーバーを起動
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    logger.info(
        COMPONENT,
        &format!("REST APIサーバーが起動しました: http://{}", address),
        None,
        None,
    );

    axum::serve(listener, app).await?;

    Ok(())
}
