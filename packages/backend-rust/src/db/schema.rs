use sqlx::SqlitePool;

pub const SCHEMA_VERSION: &str = "1.0.0";

pub const INIT_SCHEMA_SQL: &str = include_str!("../../sql/001_init_schema.sql");

pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut prev = '\0';

    for ch in sql.chars() {
        match ch {
            '\'' if !in_double_quote && prev != '\\' => {
                in_single_quote = !in_single_quote;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
            }
            ';' if !in_single_quote && !in_double_quote => {
                let stmt = current.trim();
                if !stmt.is_empty() {
                    statements.push(stmt.to_string());
                }
                current.clear();
                prev = ch;
                continue;
            }
            _ => {}
        }

        current.push(ch);
        prev = ch;
    }

    let tail = current.trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }

    statements
}

/// Applies the bundled schema once; later starts see the version marker and skip.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    if let Some(version) = applied_version(pool).await? {
        tracing::debug!(%version, "schema already applied");
        return Ok(());
    }

    tracing::info!(version = SCHEMA_VERSION, "applying database schema");

    let mut tx = pool.begin().await?;
    for stmt in split_sql_statements(INIT_SCHEMA_SQL) {
        let sql: String = stmt
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = sql.trim();
        if trimmed.is_empty() {
            continue;
        }
        sqlx::query(trimmed).execute(&mut *tx).await?;
    }

    sqlx::query(r#"INSERT OR REPLACE INTO "_db_metadata" ("key", "value") VALUES ('schema_version', ?)"#)
        .bind(SCHEMA_VERSION)
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}

async fn applied_version(pool: &SqlitePool) -> Result<Option<String>, sqlx::Error> {
    let has_metadata: Option<i64> = sqlx::query_scalar(
        r#"SELECT 1 FROM "sqlite_master" WHERE "type" = 'table' AND "name" = '_db_metadata'"#,
    )
    .fetch_optional(pool)
    .await?;
    if has_metadata.is_none() {
        return Ok(None);
    }

    sqlx::query_scalar(r#"SELECT "value" FROM "_db_metadata" WHERE "key" = 'schema_version'"#)
        .fetch_optional(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_top_level_semicolons_only() {
        let sql = r#"CREATE TABLE "a;b" ("x" TEXT DEFAULT 'p;q'); INSERT INTO t VALUES (1);"#;
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("'p;q'"));
        assert!(statements[1].starts_with("INSERT"));
    }

    async fn memory_pool() -> SqlitePool {
        sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn fresh_database_has_no_version() {
        let pool = memory_pool().await;
        assert_eq!(applied_version(&pool).await.unwrap(), None);

        run_migrations(&pool).await.unwrap();
        assert_eq!(
            applied_version(&pool).await.unwrap().as_deref(),
            Some(SCHEMA_VERSION)
        );
        run_migrations(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn query_failure_is_not_mistaken_for_a_fresh_database() {
        let pool = memory_pool().await;
        run_migrations(&pool).await.unwrap();
        pool.close().await;

        assert!(applied_version(&pool).await.is_err());
        assert!(run_migrations(&pool).await.is_err());
    }

    #[test]
    fn bundled_schema_defines_all_tables() {
        let statements = split_sql_statements(INIT_SCHEMA_SQL);
        for table in ["\"users\"", "\"wordbooks\"", "\"words\"", "\"_db_metadata\""] {
            assert!(
                statements.iter().any(|s| s.contains("CREATE TABLE") && s.contains(table)),
                "missing table {table}"
            );
        }
    }
}
