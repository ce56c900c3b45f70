use chrono::NaiveDateTime;
use sqlx::{Row, SqliteConnection};

use crate::db::DatabaseProxy;

#[derive(Debug, Clone)]
pub struct WordbookRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub created_at: NaiveDateTime,
    pub word_count: i64,
}

pub async fn insert_wordbook(
    conn: &mut SqliteConnection,
    owner_id: &str,
    title: &str,
    description: Option<&str>,
    now: NaiveDateTime,
) -> Result<WordbookRecord, sqlx::Error> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO "wordbooks" ("title", "description", "owner_id", "created_at")
        VALUES (?, ?, ?, ?)
        RETURNING "id"
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(owner_id)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(WordbookRecord {
        id,
        title: title.to_string(),
        description: description.map(str::to_string),
        owner_id: owner_id.to_string(),
        created_at: now,
        word_count: 0,
    })
}

pub async fn find_by_owner_and_title(
    conn: &mut SqliteConnection,
    owner_id: &str,
    title: &str,
) -> Result<Option<WordbookRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT b."id", b."title", b."description", b."owner_id", b."created_at",
               (SELECT COUNT(*) FROM "words" w WHERE w."wordbook_id" = b."id") AS "word_count"
        FROM "wordbooks" b
        WHERE b."owner_id" = ? AND b."title" = ?
        "#,
    )
    .bind(owner_id)
    .bind(title)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|row| map_wordbook_row(&row)).transpose()
}

pub async fn find_owned(
    conn: &mut SqliteConnection,
    owner_id: &str,
    wordbook_id: i64,
) -> Result<Option<WordbookRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT b."id", b."title", b."description", b."owner_id", b."created_at",
               (SELECT COUNT(*) FROM "words" w WHERE w."wordbook_id" = b."id") AS "word_count"
        FROM "wordbooks" b
        WHERE b."owner_id" = ? AND b."id" = ?
        "#,
    )
    .bind(owner_id)
    .bind(wordbook_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|row| map_wordbook_row(&row)).transpose()
}

pub async fn list_by_owner(
    proxy: &DatabaseProxy,
    owner_id: &str,
) -> Result<Vec<WordbookRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT b."id", b."title", b."description", b."owner_id", b."created_at",
               COUNT(w."id") AS "word_count"
        FROM "wordbooks" b
        LEFT JOIN "words" w ON w."wordbook_id" = b."id"
        WHERE b."owner_id" = ?
        GROUP BY b."id"
        ORDER BY b."created_at" DESC, b."id" DESC
        "#,
    )
    .bind(owner_id)
    .fetch_all(proxy.pool())
    .await?;

    rows.iter().map(map_wordbook_row).collect()
}

/// Renames or re-describes an owned wordbook. `None` when it is not the
/// owner's.
pub async fn update_wordbook(
    conn: &mut SqliteConnection,
    owner_id: &str,
    wordbook_id: i64,
    title: &str,
    description: Option<&str>,
) -> Result<Option<WordbookRecord>, sqlx::Error> {
    let updated = sqlx::query(
        r#"
        UPDATE "wordbooks" SET "title" = ?, "description" = ?
        WHERE "owner_id" = ? AND "id" = ?
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(owner_id)
    .bind(wordbook_id)
    .execute(&mut *conn)
    .await?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }
    find_owned(conn, owner_id, wordbook_id).await
}

/// Deletes an owned wordbook; its words go with it through the foreign key.
pub async fn delete_wordbook(
    conn: &mut SqliteConnection,
    owner_id: &str,
    wordbook_id: i64,
) -> Result<bool, sqlx::Error> {
    let deleted = sqlx::query(r#"DELETE FROM "wordbooks" WHERE "owner_id" = ? AND "id" = ?"#)
        .bind(owner_id)
        .bind(wordbook_id)
        .execute(&mut *conn)
        .await?;
    Ok(deleted.rows_affected() > 0)
}

fn map_wordbook_row(row: &sqlx::sqlite::SqliteRow) -> Result<WordbookRecord, sqlx::Error> {
    Ok(WordbookRecord {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        owner_id: row.try_get("owner_id")?,
        created_at: row.try_get("created_at")?,
        word_count: row.try_get("word_count")?,
    })
}
