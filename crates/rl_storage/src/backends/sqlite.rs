use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rl_core::query::DateRange;
use rl_core::storage::ReadingStorage;
use rl_core::types::{Article, ArticleUpdate, NewArticle, Todo};
use rl_core::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        url TEXT,
        source TEXT,
        read_at TEXT NOT NULL,
        notes TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS todos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    // Add future migrations here
];

pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
            .map_err(|e| Error::Storage(format!("invalid database path: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Storage(format!("failed to connect to database: {e}")))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("failed to run migration {i}: {e}")))?;
        }
        debug!("sqlite ready at {}", db_path.display());

        Ok(Self { pool })
    }
}

// Timestamps are stored as fixed-width RFC 3339 text so that SQL string
// comparison agrees with chronological order.
fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_stored_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Database(format!("corrupt timestamp in store: {e}")))
}

fn row_to_article(row: &SqliteRow) -> Result<Article> {
    Ok(Article {
        id: row.get("id"),
        title: row.get("title"),
        url: row.get("url"),
        source: row.get("source"),
        read_at: parse_stored_timestamp(&row.get::<String, _>("read_at"))?,
        notes: row.get("notes"),
        created_at: parse_stored_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_stored_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

#[async_trait]
impl ReadingStorage for SqliteStorage {
    async fn list_articles(&self, range: &DateRange) -> Result<Vec<Article>> {
        let query = match (range.start, range.end) {
            (Some(start), Some(end)) => sqlx::query(
                "SELECT * FROM articles WHERE read_at >= ? AND read_at <= ? ORDER BY read_at DESC",
            )
            .bind(encode_timestamp(start))
            .bind(encode_timestamp(end)),
            (Some(start), None) => {
                sqlx::query("SELECT * FROM articles WHERE read_at >= ? ORDER BY read_at DESC")
                    .bind(encode_timestamp(start))
            }
            (None, Some(end)) => {
                sqlx::query("SELECT * FROM articles WHERE read_at <= ? ORDER BY read_at DESC")
                    .bind(encode_timestamp(end))
            }
            (None, None) => sqlx::query("SELECT * FROM articles ORDER BY read_at DESC"),
        };

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("failed to list articles: {e}")))?;

        rows.iter().map(row_to_article).collect()
    }

    async fn create_article(&self, draft: NewArticle) -> Result<Article> {
        let now = Utc::now();
        let read_at = draft.read_at.unwrap_or(now);

        let result = sqlx::query(
            r#"
            INSERT INTO articles (title, url, source, read_at, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&draft.title)
        .bind(draft.url.as_deref())
        .bind(draft.source.as_deref())
        .bind(encode_timestamp(read_at))
        .bind(draft.notes.as_deref())
        .bind(encode_timestamp(now))
        .bind(encode_timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("failed to store article: {e}")))?;

        Ok(Article {
            id: result.last_insert_rowid(),
            title: draft.title,
            url: draft.url,
            source: draft.source,
            read_at,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_article(&self, id: i64, update: ArticleUpdate) -> Result<Article> {
        let row = sqlx::query("SELECT * FROM articles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("failed to load article: {e}")))?;

        let mut article = match row {
            Some(row) => row_to_article(&row)?,
            None => return Err(Error::NotFound(format!("article {id}"))),
        };

        update.apply(&mut article, Utc::now());

        sqlx::query(
            r#"
            UPDATE articles
            SET title = ?, url = ?, source = ?, read_at = ?, notes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&article.title)
        .bind(article.url.as_deref())
        .bind(article.source.as_deref())
        .bind(encode_timestamp(article.read_at))
        .bind(article.notes.as_deref())
        .bind(encode_timestamp(article.updated_at))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("failed to update article: {e}")))?;

        Ok(article)
    }

    async fn delete_article(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("failed to delete article: {e}")))?;
        Ok(())
    }

    async fn list_todos(&self) -> Result<Vec<Todo>> {
        let rows = sqlx::query("SELECT * FROM todos ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("failed to list todos: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(Todo {
                    id: row.get("id"),
                    title: row.get("title"),
                    created_at: parse_stored_timestamp(&row.get::<String, _>("created_at"))?,
                })
            })
            .collect()
    }

    async fn add_todo(&self, title: String) -> Result<Todo> {
        let now = Utc::now();
        let result = sqlx::query("INSERT INTO todos (title, created_at) VALUES (?, ?)")
            .bind(&title)
            .bind(encode_timestamp(now))
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("failed to store todo: {e}")))?;

        Ok(Todo {
            id: result.last_insert_rowid(),
            title,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rl_core::types::FieldUpdate;
    use tempfile::tempdir;

    async fn test_storage(dir: &tempfile::TempDir) -> SqliteStorage {
        SqliteStorage::new_with_path(&dir.path().join("test.db"))
            .await
            .unwrap()
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn create_and_list_round_trip() {
        let dir = tempdir().unwrap();
        let storage = test_storage(&dir).await;

        let created = storage
            .create_article(NewArticle {
                title: "Foo".to_string(),
                url: Some("https://example.com".to_string()),
                source: None,
                read_at: Some(at(1)),
                notes: Some("note".to_string()),
            })
            .await
            .unwrap();

        let listed = storage.list_articles(&DateRange::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(listed[0].title, "Foo");
        assert_eq!(listed[0].url.as_deref(), Some("https://example.com"));
        assert_eq!(listed[0].source, None);
        assert_eq!(listed[0].read_at, at(1));
        assert_eq!(listed[0].notes.as_deref(), Some("note"));
    }

    #[tokio::test]
    async fn range_filter_is_inclusive_and_descending() {
        let dir = tempdir().unwrap();
        let storage = test_storage(&dir).await;
        for day in 1..=3 {
            storage
                .create_article(NewArticle {
                    title: format!("day {day}"),
                    url: None,
                    source: None,
                    read_at: Some(at(day)),
                    notes: None,
                })
                .await
                .unwrap();
        }

        let range = DateRange {
            start: Some(at(1)),
            end: Some(at(2)),
        };
        let filtered = storage.list_articles(&range).await.unwrap();
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].title, "day 2");
        assert_eq!(filtered[1].title, "day 1");
    }

    #[tokio::test]
    async fn update_applies_partial_fields_and_clears() {
        let dir = tempdir().unwrap();
        let storage = test_storage(&dir).await;
        let created = storage
            .create_article(NewArticle {
                title: "Foo".to_string(),
                url: Some("https://example.com".to_string()),
                source: Some("example".to_string()),
                read_at: Some(at(1)),
                notes: None,
            })
            .await
            .unwrap();

        let updated = storage
            .update_article(
                created.id,
                ArticleUpdate {
                    title: Some("Bar".to_string()),
                    url: FieldUpdate::Clear,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Bar");
        assert_eq!(updated.url, None);
        assert_eq!(updated.source.as_deref(), Some("example"));

        // The change survives a re-read.
        let listed = storage.list_articles(&DateRange::default()).await.unwrap();
        assert_eq!(listed[0].title, "Bar");
        assert_eq!(listed[0].url, None);

        let err = storage
            .update_article(999, ArticleUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = test_storage(&dir).await;
        let created = storage
            .create_article(NewArticle {
                title: "Foo".to_string(),
                url: None,
                source: None,
                read_at: None,
                notes: None,
            })
            .await
            .unwrap();

        storage.delete_article(created.id).await.unwrap();
        storage.delete_article(created.id).await.unwrap();

        let listed = storage.list_articles(&DateRange::default()).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn todos_round_trip() {
        let dir = tempdir().unwrap();
        let storage = test_storage(&dir).await;
        storage.add_todo("buy milk".to_string()).await.unwrap();
        storage.add_todo("read more".to_string()).await.unwrap();

        let todos = storage.list_todos().await.unwrap();
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0].title, "buy milk");
        assert_eq!(todos[1].title, "read more");
    }
}
