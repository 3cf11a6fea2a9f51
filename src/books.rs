//! Book records, validation rules, and the SQLite-backed store.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_rusqlite::{params, Connection as AsyncConn};

pub const TITLE_MAX_LEN: usize = 200;
const EARLIEST_PUBLISHED_YEAR: i32 = 1000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),
}

/// A persisted book. Ids are assigned by SQLite on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub published_year: Option<i32>,
}

/// Unvalidated input for a new book, as submitted by the create form.
#[derive(Debug, Clone, Default)]
pub struct BookDraft {
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub published_year: Option<i32>,
}

impl BookDraft {
    /// Apply the validation rules and trim/normalize the optional fields.
    fn validated(&self) -> Result<BookDraft, StoreError> {
        Ok(BookDraft {
            title: validate_title(&self.title)?,
            author: normalize_optional(self.author.clone()),
            description: normalize_optional(self.description.clone()),
            published_year: self
                .published_year
                .map(|year| validate_published_year(year).map(|()| year))
                .transpose()?,
        })
    }
}

/// Partial update: `None` means "leave the field unchanged". For `author`
/// and `description`, an empty (or all-whitespace) string clears the field.
#[derive(Debug, Clone, Default)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub published_year: Option<i32>,
}

impl BookPatch {
    fn apply(&self, book: &mut Book) -> Result<(), StoreError> {
        if let Some(title) = &self.title {
            book.title = validate_title(title)?;
        }
        if let Some(author) = &self.author {
            book.author = normalize_optional(Some(author.clone()));
        }
        if let Some(description) = &self.description {
            book.description = normalize_optional(Some(description.clone()));
        }
        if let Some(year) = self.published_year {
            validate_published_year(year)?;
            book.published_year = Some(year);
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<String, StoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation("Title cannot be empty".into()));
    }
    if trimmed.chars().count() > TITLE_MAX_LEN {
        return Err(StoreError::Validation(format!(
            "Title must be {TITLE_MAX_LEN} characters or less"
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_published_year(year: i32) -> Result<(), StoreError> {
    // Allow next year for forthcoming titles.
    let max_year = Utc::now().year() + 1;
    if year < EARLIEST_PUBLISHED_YEAR || year > max_year {
        return Err(StoreError::Validation(format!(
            "Published year must be between {EARLIEST_PUBLISHED_YEAR} and {max_year}"
        )));
    }
    Ok(())
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// CRUD over the `book` table, using one read-only and one writer
/// connection. All calls hop onto the connection's worker thread; nothing
/// here blocks the caller.
pub struct BookStore {
    db_ro: AsyncConn,
    db_rw: AsyncConn,
}

impl BookStore {
    pub fn new(db_ro: AsyncConn, db_rw: AsyncConn) -> Self {
        Self { db_ro, db_rw }
    }

    /// Cheap connectivity probe backing the `get_db_status` command.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.db_ro
            .call(|conn| {
                conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                    .map_err(tokio_rusqlite::Error::from)
            })
            .await?;
        Ok(())
    }

    pub async fn insert(&self, draft: &BookDraft) -> Result<Book, StoreError> {
        let draft = draft.validated()?;
        let book = self
            .db_rw
            .call(move |conn| -> tokio_rusqlite::Result<Book> {
                let now = Utc::now().timestamp();
                conn.execute(
                    "INSERT INTO book (title, author, description, published_year, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    params![
                        draft.title,
                        draft.author,
                        draft.description,
                        draft.published_year,
                        now
                    ],
                )?;
                let id = i32::try_from(conn.last_insert_rowid()).unwrap_or(i32::MAX);
                Ok(Book {
                    id,
                    title: draft.title,
                    author: draft.author,
                    description: draft.description,
                    published_year: draft.published_year,
                })
            })
            .await?;
        tracing::debug!(target: "libretto", id = book.id, "book created");
        Ok(book)
    }

    pub async fn list(&self) -> Result<Vec<Book>, StoreError> {
        let books = self
            .db_ro
            .call(|conn| -> tokio_rusqlite::Result<Vec<Book>> {
                let mut stmt = conn.prepare(
                    "SELECT id, title, author, description, published_year
                     FROM book ORDER BY id ASC",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok(Book {
                            id: row.get(0)?,
                            title: row.get(1)?,
                            author: row.get(2)?,
                            description: row.get(3)?,
                            published_year: row.get(4)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        Ok(books)
    }

    pub async fn get(&self, id: i32) -> Result<Option<Book>, StoreError> {
        let book = self
            .db_ro
            .call(move |conn| -> tokio_rusqlite::Result<Option<Book>> {
                use rusqlite::OptionalExtension;
                let book = conn
                    .query_row(
                        "SELECT id, title, author, description, published_year
                         FROM book WHERE id = ?1",
                        params![id],
                        |row| {
                            Ok(Book {
                                id: row.get(0)?,
                                title: row.get(1)?,
                                author: row.get(2)?,
                                description: row.get(3)?,
                                published_year: row.get(4)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(book)
            })
            .await?;
        Ok(book)
    }

    /// Partial update: fields absent from the patch are left unchanged.
    pub async fn update(&self, id: i32, patch: &BookPatch) -> Result<Book, StoreError> {
        let mut book = self
            .get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Book with id {id} not found")))?;
        patch.apply(&mut book)?;

        let updated = book.clone();
        self.db_rw
            .call(move |conn| -> tokio_rusqlite::Result<()> {
                let now = Utc::now().timestamp();
                conn.execute(
                    "UPDATE book
                     SET title = ?1, author = ?2, description = ?3, published_year = ?4, updated_at = ?5
                     WHERE id = ?6",
                    params![
                        book.title,
                        book.author,
                        book.description,
                        book.published_year,
                        now,
                        book.id
                    ],
                )?;
                Ok(())
            })
            .await?;
        tracing::debug!(target: "libretto", id, "book updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> Result<(), StoreError> {
        let deleted = self
            .db_rw
            .call(move |conn| -> tokio_rusqlite::Result<usize> {
                conn.execute("DELETE FROM book WHERE id = ?1", params![id])
                    .map_err(tokio_rusqlite::Error::from)
            })
            .await?;
        if deleted == 0 {
            return Err(StoreError::NotFound(format!("Book with id {id} not found")));
        }
        tracing::debug!(target: "libretto", id, "book deleted");
        Ok(())
    }
}
