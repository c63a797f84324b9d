mod unit_sqlite_pages_database;
mod unit_upload;

use crate::database::sqlite::SqliteRepository;
use sqlx::sqlite::SqlitePoolOptions;

// a fresh in-memory sqlite with the pages schema applied
pub(crate) async fn setup_test_db() -> SqliteRepository {
    let pool = SqlitePoolOptions::new()
        // one connection, otherwise every connection gets its own empty memory db
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    SqliteRepository::new(pool)
}
