// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

use llm_sql_writer::schema::{Databases, Schema, collect_schema};
use sqlx::{ConnectOptions, Connection, sqlite::SqliteConnectOptions};
use tempfile::TempDir;

async fn create_fixture(path: &Path) {
    let mut conn = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .connect()
        .await
        .unwrap();
    for statement in [
        "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT, price REAL)",
        "CREATE TABLE orders (id INTEGER, item_id INTEGER)",
        "CREATE INDEX idx_orders_item ON orders (item_id)",
        "INSERT INTO items (name, price) VALUES ('pen', 1.5)",
    ] {
        sqlx::query(statement).execute(&mut conn).await.unwrap();
    }
    conn.close().await.unwrap();
}

#[test]
fn test_databases_from_paths_uses_file_stem() {
    let databases =
        Databases::from_paths([PathBuf::from("/data/shop.db"), PathBuf::from("logs.sqlite")])
            .unwrap();
    assert_eq!(databases.names().collect::<Vec<_>>(), vec!["logs", "shop"]);
    assert_eq!(databases.path("shop"), Some(Path::new("/data/shop.db")));
    assert!(!databases.contains("items"));
}

#[test]
fn test_databases_rejects_nameless_path() {
    assert!(Databases::from_paths([PathBuf::from("/")]).is_err());
}

#[tokio::test]
async fn test_introspect_lists_tables_and_columns() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.db");
    create_fixture(&path).await;

    let databases = Databases::from_paths([&path]).unwrap();
    let schema = Schema::introspect(&databases, "shop").await.unwrap();

    assert_eq!(schema.database, "shop");
    let names: Vec<_> = schema.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["items", "orders"]);
    let items = &schema.tables[0];
    assert_eq!(items.columns.len(), 3);
    assert_eq!(items.columns[2].name, "price");
    assert_eq!(items.columns[2].data_type, "REAL");
}

#[tokio::test]
async fn test_collect_schema_summary() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.db");
    create_fixture(&path).await;

    let databases = Databases::from_paths([&path]).unwrap();
    assert_eq!(
        collect_schema(&databases, "shop").await,
        "Database: shop\nTables:\n\
         - items: id INTEGER, name TEXT, price REAL\n\
         - orders: id INTEGER, item_id INTEGER"
    );
}

#[tokio::test]
async fn test_collect_schema_does_not_modify_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.db");
    create_fixture(&path).await;
    let before = std::fs::read(&path).unwrap();

    let databases = Databases::from_paths([&path]).unwrap();
    collect_schema(&databases, "shop").await;

    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[tokio::test]
async fn test_collect_schema_unknown_database_is_empty() {
    let databases = Databases::new();
    assert_eq!(collect_schema(&databases, "missing").await, "");
}

#[tokio::test]
async fn test_collect_schema_missing_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let mut databases = Databases::new();
    databases.insert("ghost", dir.path().join("ghost.db"));

    assert_eq!(collect_schema(&databases, "ghost").await, "");
    assert!(!dir.path().join("ghost.db").exists());
}
