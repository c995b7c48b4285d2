use sqlx::Row;

fn database_url() -> Option<String> {
    dotenvy::dotenv().ok();

    std::env::var("PORTAL_TEST_DATABASE_URL").ok().filter(|url| !url.trim().is_empty())
}

#[tokio::test]
async fn migrations_apply_and_tables_exist() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        eprintln!("PORTAL_TEST_DATABASE_URL not set; skipping migrations smoke test");
        return Ok(());
    };

    let pool =
        sqlx::postgres::PgPoolOptions::new().max_connections(1).connect(&database_url).await?;

    let migrations_dir =
        std::env::var("PORTAL_MIGRATIONS_DIR").unwrap_or_else(|_| "migrations".to_string());
    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(&migrations_dir)).await?;
    migrator.run(&pool).await?;

    let tables = [
        "users",
        "exams",
        "extras",
        "subjects",
        "sections",
        "questions",
        "answers",
        "exam_settings",
        "results",
        "responses",
    ];

    for table in tables {
        let row = sqlx::query("SELECT to_regclass($1)::text").bind(table).fetch_one(&pool).await?;
        let regclass: Option<String> = row.try_get(0)?;
        assert!(regclass.is_some(), "expected table {table} to exist after migrations");
    }

    let status_type: Option<String> =
        sqlx::query_scalar("SELECT typname::text FROM pg_type WHERE typname = 'resultstatus'")
            .fetch_optional(&pool)
            .await?;
    assert_eq!(status_type.as_deref(), Some("resultstatus"));

    Ok(())
}
