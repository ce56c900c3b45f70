use chrono::NaiveDateTime;
use sqlx::{Row, SqliteConnection};

pub const DEFAULT_IMPORTANCE: i64 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWord {
    pub word: String,
    pub meaning: String,
    pub note: Option<String>,
    pub importance: i64,
}

impl NewWord {
    /// A word found by extraction: empty note, default importance.
    pub fn extracted(word: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            meaning: meaning.into(),
            note: Some(String::new()),
            importance: DEFAULT_IMPORTANCE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WordRecord {
    pub id: i64,
    pub word: String,
    pub meaning: String,
    pub note: Option<String>,
    pub importance: i64,
    pub wordbook_id: i64,
    pub created_at: NaiveDateTime,
}

/// Inserts all words into `wordbook_id`. Run inside the transaction that
/// checked the wordbook so the rows never outlive their parent.
pub async fn insert_words(
    conn: &mut SqliteConnection,
    wordbook_id: i64,
    words: &[NewWord],
    now: NaiveDateTime,
) -> Result<Vec<WordRecord>, sqlx::Error> {
    let mut inserted = Vec::with_capacity(words.len());

    for word in words {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO "words" ("word", "meaning", "note", "importance", "wordbook_id", "created_at")
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING "id"
            "#,
        )
        .bind(&word.word)
        .bind(&word.meaning)
        .bind(&word.note)
        .bind(word.importance)
        .bind(wordbook_id)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        inserted.push(WordRecord {
            id,
            word: word.word.clone(),
            meaning: word.meaning.clone(),
            note: word.note.clone(),
            importance: word.importance,
            wordbook_id,
            created_at: now,
        });
    }

    Ok(inserted)
}

pub async fn list_by_wordbook(
    conn: &mut SqliteConnection,
    wordbook_id: i64,
) -> Result<Vec<WordRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT "id", "word", "meaning", "note", "importance", "wordbook_id", "created_at"
        FROM "words"
        WHERE "wordbook_id" = ?
        ORDER BY "id"
        "#,
    )
    .bind(wordbook_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(map_word_row).collect()
}

pub async fn find_in_wordbook(
    conn: &mut SqliteConnection,
    wordbook_id: i64,
    word_id: i64,
) -> Result<Option<WordRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT "id", "word", "meaning", "note", "importance", "wordbook_id", "created_at"
        FROM "words"
        WHERE "wordbook_id" = ? AND "id" = ?
        "#,
    )
    .bind(wordbook_id)
    .bind(word_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|row| map_word_row(&row)).transpose()
}

pub async fn update_word(
    conn: &mut SqliteConnection,
    wordbook_id: i64,
    word_id: i64,
    word: &NewWord,
) -> Result<Option<WordRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        UPDATE "words" SET "word" = ?, "meaning" = ?, "note" = ?, "importance" = ?
        WHERE "wordbook_id" = ? AND "id" = ?
        RETURNING "id", "word", "meaning", "note", "importance", "wordbook_id", "created_at"
        "#,
    )
    .bind(&word.word)
    .bind(&word.meaning)
    .bind(&word.note)
    .bind(word.importance)
    .bind(wordbook_id)
    .bind(word_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|row| map_word_row(&row)).transpose()
}

pub async fn delete_word(
    conn: &mut SqliteConnection,
    wordbook_id: i64,
    word_id: i64,
) -> Result<bool, sqlx::Error> {
    let deleted = sqlx::query(r#"DELETE FROM "words" WHERE "wordbook_id" = ? AND "id" = ?"#)
        .bind(wordbook_id)
        .bind(word_id)
        .execute(&mut *conn)
        .await?;
    Ok(deleted.rows_affected() > 0)
}

/// Moves the listed words from `source_id` to `destination_id`. Ids that are
/// not in the source wordbook are skipped. Returns how many moved.
pub async fn move_words(
    conn: &mut SqliteConnection,
    source_id: i64,
    destination_id: i64,
    word_ids: &[i64],
) -> Result<u64, sqlx::Error> {
    let mut moved = 0;
    for word_id in word_ids {
        let result = sqlx::query(
            r#"UPDATE "words" SET "wordbook_id" = ? WHERE "wordbook_id" = ? AND "id" = ?"#,
        )
        .bind(destination_id)
        .bind(source_id)
        .bind(word_id)
        .execute(&mut *conn)
        .await?;
        moved += result.rows_affected();
    }
    Ok(moved)
}

fn map_word_row(row: &sqlx::sqlite::SqliteRow) -> Result<WordRecord, sqlx::Error> {
    Ok(WordRecord {
        id: row.try_get("id")?,
        word: row.try_get("word")?,
        meaning: row.try_get("meaning")?,
        note: row.try_get("note")?,
        importance: row.try_get("importance")?,
        wordbook_id: row.try_get("wordbook_id")?,
        created_at: row.try_get("created_at")?,
    })
}
