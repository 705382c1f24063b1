//! PostgreSQL test database
//!
//! Uses `TEST_DATABASE_URL` when set (CI), otherwise starts a disposable
//! PostgreSQL container that lives as long as the returned [`TestDatabase`].

use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::postgres::Postgres as PostgresImage;
use volunteer_hub::config::DatabaseConfig;
use volunteer_hub::database::{create_pool, run_migrations, DatabaseService};

pub struct TestDatabase {
    pub database: DatabaseService,
    pub database_url: String,
    _container: Option<ContainerAsync<PostgresImage>>,
}

impl TestDatabase {
    /// Connect and run migrations
    pub async fn start() -> Self {
        let (database_url, container) = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => (url, None),
            Err(_) => {
                let container = PostgresImage::default()
                    .with_db_name("volunteerhub_test")
                    .with_user("test_user")
                    .with_password("test_password")
                    .start()
                    .await
                    .expect("Failed to start postgres container");
                let host = container.get_host().await.expect("Failed to get container host");
                let port = container.get_host_port_ipv4(5432).await.expect("Failed to get port");
                let url = format!("postgresql://test_user:test_password@{}:{}/volunteerhub_test", host, port);
                (url, Some(container))
            }
        };

        let config = DatabaseConfig {
            url: database_url.clone(),
            max_connections: 10,
            min_connections: 1,
        };
        let pool = create_pool(&config).await.expect("Failed to connect to test database");
        run_migrations(&pool).await.expect("Failed to run migrations");

        Self {
            database: DatabaseService::new(pool),
            database_url,
            _container: container,
        }
    }
}
