use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;

use crate::shared::config;

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

fn build_sqlite_url(path: &Path) -> String {
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    format!("sqlite://{}{}?mode=rwc", prefix, normalized)
}

/// Открыть соединение (путь из config.toml), развернуть схему и
/// сохранить соединение в глобальной ячейке для HTTP-слоя.
pub async fn initialize_database() -> anyhow::Result<()> {
    let cfg = config::load_config()?;
    let db_path = config::get_database_path(&cfg)?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = build_sqlite_url(&db_path);
    let conn = Database::connect(&db_url).await?;

    ensure_schema(&conn).await?;

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}

async fn has_table(db: &DatabaseConnection, table_name: &str) -> anyhow::Result<bool> {
    let row = db
        .query_one(Statement::from_sql_and_values(
            db.get_database_backend(),
            "SELECT COUNT(1) AS cnt FROM sqlite_master WHERE type='table' AND name = ?",
            [table_name.into()],
        ))
        .await?;
    let count: i64 = row
        .and_then(|r| r.try_get("", "cnt").ok())
        .unwrap_or_default();
    Ok(count > 0)
}

/// Ensure required tables exist (minimal schema bootstrap).
///
/// Вынесено из initialize_database, чтобы тесты могли развернуть ту же
/// схему поверх `sqlite::memory:`.
pub async fn ensure_schema(db: &DatabaseConnection) -> anyhow::Result<()> {
    if !has_table(db, "a001_customer_group").await? {
        tracing::info!("Creating a001_customer_group table");
        let sql = r#"
            CREATE TABLE a001_customer_group (
                id TEXT PRIMARY KEY NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                created_at TEXT,
                updated_at TEXT,
                version INTEGER NOT NULL DEFAULT 0
            );
        "#;
        db.execute(Statement::from_string(
            db.get_database_backend(),
            sql.to_string(),
        ))
        .await?;
    }

    if !has_table(db, "a002_price_list").await? {
        tracing::info!("Creating a002_price_list table");
        let sql = r#"
            CREATE TABLE a002_price_list (
                id TEXT PRIMARY KEY NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'draft',
                starts_at TEXT,
                ends_at TEXT,
                deleted_at TEXT,
                custom_fields TEXT,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                created_at TEXT,
                updated_at TEXT,
                version INTEGER NOT NULL DEFAULT 0
            );
        "#;
        db.execute(Statement::from_string(
            db.get_database_backend(),
            sql.to_string(),
        ))
        .await?;
    }

    if !has_table(db, "a003_price_record").await? {
        tracing::info!("Creating a003_price_record table");
        let sql = r#"
            CREATE TABLE a003_price_record (
                id TEXT PRIMARY KEY NOT NULL,
                price_list_id TEXT NOT NULL,
                currency_code TEXT NOT NULL,
                amount REAL NOT NULL,
                customer_group_id TEXT,
                min_quantity INTEGER,
                max_quantity INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#;
        db.execute(Statement::from_string(
            db.get_database_backend(),
            sql.to_string(),
        ))
        .await?;
    }

    if !has_table(db, "a002_price_list_customer_group").await? {
        tracing::info!("Creating a002_price_list_customer_group table");
        let sql = r#"
            CREATE TABLE a002_price_list_customer_group (
                price_list_id TEXT NOT NULL,
                customer_group_id TEXT NOT NULL,
                PRIMARY KEY (price_list_id, customer_group_id)
            );
        "#;
        db.execute(Statement::from_string(
            db.get_database_backend(),
            sql.to_string(),
        ))
        .await?;
    }

    Ok(())
}
