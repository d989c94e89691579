use sqlx::PgPool;

/// All `id` columns must be bigint (entity tables) or smallint (lookup tables).
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_all_pks_are_correct_type(pool: PgPool) {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT table_name, data_type
         FROM information_schema.columns
         WHERE column_name = 'id'
           AND table_schema = 'public'
           AND table_name != '_sqlx_migrations'
         ORDER BY table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(!rows.is_empty());
    for (table, data_type) in &rows {
        assert!(
            data_type == "bigint" || data_type == "smallint",
            "Table {table}.id should be bigint or smallint, got {data_type}"
        );
    }
}

/// Every table must carry timestamptz `created_at` and `updated_at` columns.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_all_tables_have_timestamps(pool: PgPool) {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT t.table_name, COUNT(c.column_name)
         FROM information_schema.tables t
         LEFT JOIN information_schema.columns c
           ON c.table_schema = t.table_schema
          AND c.table_name = t.table_name
          AND c.column_name IN ('created_at', 'updated_at')
          AND c.data_type = 'timestamp with time zone'
         WHERE t.table_schema = 'public'
           AND t.table_type = 'BASE TABLE'
           AND t.table_name != '_sqlx_migrations'
         GROUP BY t.table_name
         ORDER BY t.table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for (table, count) in &rows {
        assert_eq!(*count, 2, "Table {table} is missing timestamptz timestamps");
    }
}

/// Status lookup rows must match the ids used by `ProjectStatus`.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_project_status_seed_matches_enum(pool: PgPool) {
    use pitchcraft_core::project::ProjectStatus;

    let rows: Vec<(i16, String)> =
        sqlx::query_as("SELECT id, name FROM project_statuses ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();

    let expected: Vec<(i16, String)> = ProjectStatus::ALL
        .iter()
        .map(|s| (s.id(), s.as_str().to_string()))
        .collect();
    assert_eq!(rows, expected);
}
