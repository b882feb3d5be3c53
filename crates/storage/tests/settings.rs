use storage::settings::MemorySettings;
use storage::{connect, migrate, SettingsStore, SqliteSettings, DEFAULT_DIR_ID};

#[tokio::test]
async fn default_dir_round_trips_through_sqlite() {
    let db = "sqlite://file:settings_round_trip?mode=memory&cache=shared";
    let pool = connect(db).await.unwrap();
    migrate(&pool).await.unwrap();
    let settings = SqliteSettings::new(pool);

    assert_eq!(settings.default_dir().await.unwrap(), None);
    settings.set_default_dir("/tmp/hs").await.unwrap();
    assert_eq!(
        settings.get(DEFAULT_DIR_ID).await.unwrap().as_deref(),
        Some("/tmp/hs")
    );
}

#[tokio::test]
async fn set_overwrites_existing_row() {
    let db = "sqlite://file:settings_overwrite?mode=memory&cache=shared";
    let pool = connect(db).await.unwrap();
    migrate(&pool).await.unwrap();
    let settings = SqliteSettings::new(pool.clone());

    settings.set_default_dir("/first").await.unwrap();
    settings.set_default_dir("/second").await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings WHERE id = ?1")
        .bind(DEFAULT_DIR_ID)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(
        settings.default_dir().await.unwrap().as_deref(),
        Some("/second")
    );
}

#[tokio::test]
async fn connect_creates_missing_database_file() {
    let temp = tempfile::tempdir().unwrap();
    let db_path = temp.path().join("nested").join("homespace.db");

    let settings = storage::open_settings(&db_path.to_string_lossy())
        .await
        .unwrap();
    settings.set("theme", "dark").await.unwrap();

    assert!(db_path.exists());
    assert_eq!(settings.get("theme").await.unwrap().as_deref(), Some("dark"));
}

#[tokio::test]
async fn memory_settings_behave_like_sqlite() {
    let settings = MemorySettings::new();
    assert!(settings.default_dir().await.unwrap().is_none());
    settings.set_default_dir("/tmp/hs").await.unwrap();
    assert_eq!(
        settings.default_dir().await.unwrap().as_deref(),
        Some("/tmp/hs")
    );
}

#[tokio::test]
async fn migrate_repairs_a_keyless_settings_table() {
    let db = "sqlite://file:settings_keyless?mode=memory&cache=shared";
    let pool = connect(db).await.unwrap();
    sqlx::query("CREATE TABLE settings (id TEXT, value TEXT)")
        .execute(&pool)
        .await
        .unwrap();
    for dir in ["/first", "/second"] {
        sqlx::query("INSERT INTO settings (id, value) VALUES (?1, ?2)")
            .bind(DEFAULT_DIR_ID)
            .bind(dir)
            .execute(&pool)
            .await
            .unwrap();
    }

    migrate(&pool).await.unwrap();
    let settings = SqliteSettings::new(pool.clone());
    assert_eq!(
        settings.default_dir().await.unwrap().as_deref(),
        Some("/first")
    );

    settings.set_default_dir("/third").await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings WHERE id = ?1")
        .bind(DEFAULT_DIR_ID)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(
        settings.default_dir().await.unwrap().as_deref(),
        Some("/third")
    );
}
