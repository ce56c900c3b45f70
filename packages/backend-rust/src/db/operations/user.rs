use chrono::{NaiveDateTime, Utc};
use sqlx::Row;

use crate::db::DatabaseProxy;

const SYSTEM_ID_PREFIX: &str = "USR";

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub system_id: String,
    pub user_id: String,
    pub hashed_password: String,
    pub nickname: String,
    pub created_at: NaiveDateTime,
}

/// Daily prefix of generated system ids, e.g. `USR20240501`.
pub fn system_id_prefix(now: NaiveDateTime) -> String {
    format!("{SYSTEM_ID_PREFIX}{}", now.format("%Y%m%d"))
}

pub async fn find_by_user_id(
    proxy: &DatabaseProxy,
    user_id: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT "system_id", "user_id", "hashed_password", "nickname", "created_at"
        FROM "users"
        WHERE "user_id" = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(proxy.pool())
    .await?;

    row.map(|row| map_user_row(&row)).transpose()
}

pub async fn find_by_system_id(
    proxy: &DatabaseProxy,
    system_id: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT "system_id", "user_id", "hashed_password", "nickname", "created_at"
        FROM "users"
        WHERE "system_id" = ?
        "#,
    )
    .bind(system_id)
    .fetch_optional(proxy.pool())
    .await?;

    row.map(|row| map_user_row(&row)).transpose()
}

pub async fn user_id_exists(proxy: &DatabaseProxy, user_id: &str) -> Result<bool, sqlx::Error> {
    let exists: Option<i64> = sqlx::query_scalar(r#"SELECT 1 FROM "users" WHERE "user_id" = ? LIMIT 1"#)
        .bind(user_id)
        .fetch_optional(proxy.pool())
        .await?;
    Ok(exists.is_some())
}

/// Inserts a user under the next free daily system id.
///
/// The sequence number is computed inside the INSERT itself, so two
/// concurrent signups cannot both observe the same maximum. A duplicate
/// `user_id` surfaces as a unique violation.
pub async fn create_user(
    proxy: &DatabaseProxy,
    user_id: &str,
    hashed_password: &str,
    nickname: &str,
) -> Result<UserRecord, sqlx::Error> {
    let now = Utc::now().naive_utc();
    let prefix = system_id_prefix(now);
    let sequence_start = prefix.len() as i64 + 1;

    let system_id: String = sqlx::query_scalar(
        r#"
        INSERT INTO "users" ("system_id", "user_id", "hashed_password", "nickname", "created_at")
        SELECT
          ?1 || printf('%03d', COALESCE(MAX(CAST(substr("system_id", ?2) AS INTEGER)), 0) + 1),
          ?3, ?4, ?5, ?6
        FROM "users"
        WHERE "system_id" LIKE ?1 || '%'
        RETURNING "system_id"
        "#,
    )
    .bind(&prefix)
    .bind(sequence_start)
    .bind(user_id)
    .bind(hashed_password)
    .bind(nickname)
    .bind(now)
    .fetch_one(proxy.pool())
    .await?;

    tracing::info!(system_id = %system_id, user_id = %user_id, "user created");

    Ok(UserRecord {
        system_id,
        user_id: user_id.to_string(),
        hashed_password: hashed_password.to_string(),
        nickname: nickname.to_string(),
        created_at: now,
    })
}

fn map_user_row(row: &sqlx::sqlite::SqliteRow) -> Result<UserRecord, sqlx::Error> {
    Ok(UserRecord {
        system_id: row.try_get("system_id")?,
        user_id: row.try_get("user_id")?,
        hashed_password: row.try_get("hashed_password")?,
        nickname: row.try_get("nickname")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn prefix_uses_utc_calendar_date() {
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        assert_eq!(system_id_prefix(at), "USR20240501");
    }
}
