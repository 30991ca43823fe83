use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use tokio::fs;

use crate::config::AppConfig;
use crate::error::Result;

pub type DbPool = PgPool;
pub type OrmConn = DatabaseConnection;

/// Two handles into the same database: a sqlx pool for native SQL queries and
/// a SeaORM connection for entity-based access.
#[derive(Clone)]
pub struct Db {
    pub pool: DbPool,
    pub orm: OrmConn,
}

impl Db {
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let pool = create_pool(&config.database_url, config.max_connections).await?;
        let orm = create_orm_conn(&config.database_url).await?;
        Ok(Self { pool, orm })
    }
}

/// Create a sqlx connection pool.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Create a SeaORM connection.
pub async fn create_orm_conn(database_url: &str) -> Result<OrmConn> {
    let conn = Database::connect(database_url).await?;
    Ok(conn)
}

/// Minimal migration runner that executes SQL files in `migrations/` in filename order.
pub async fn run_migrations(conn: &OrmConn) -> Result<()> {
    let mut entries = fs::read_dir("migrations").await?;
    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let backend = conn.get_database_backend();
    for file in files {
        let sql = fs::read_to_string(&file).await?;
        // Postgres prepared statements cannot contain multiple commands,
        // so split the migration file and run each statement individually.
        for stmt in sql.split(';') {
            let stmt = stmt.trim();
            if stmt.is_empty() {
                continue;
            }
            let statement = format!("{stmt};");
            conn.execute(Statement::from_string(backend, statement))
                .await?;
        }
    }

    Ok(())
}
