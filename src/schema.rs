//! GraphQL schema: `library` and `settings` namespaces over the stores.

use std::sync::Arc;

use async_graphql::{
    Context, EmptySubscription, Error, ErrorExtensions, Object, Result, Schema, SimpleObject,
};

use crate::books::{Book, BookDraft, BookPatch, BookStore, StoreError};
use crate::settings::{SettingsError, SettingsStore};

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(books: Arc<BookStore>, settings: Arc<SettingsStore>) -> AppSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(books)
        .data(settings)
        .finish()
}

#[derive(SimpleObject)]
pub struct BookDto {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub published_year: Option<i32>,
}

impl From<Book> for BookDto {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            description: book.description,
            published_year: book.published_year,
        }
    }
}

#[derive(SimpleObject)]
pub struct GeneralSettingsDto {
    pub language: String,
}

#[derive(SimpleObject)]
pub struct AppearanceSettingsDto {
    pub theme: String,
}

#[derive(SimpleObject)]
pub struct DatabaseSettingsDto {
    pub database_directory: String,
}

/// Store errors become GraphQL errors with a stable `code` extension so the
/// front-end can branch without string-matching messages.
fn store_error(err: StoreError) -> Error {
    let (message, code) = match err {
        StoreError::Validation(msg) => (msg, "VALIDATION_ERROR"),
        StoreError::NotFound(msg) => (msg, "NOT_FOUND"),
        StoreError::Database(db) => (format!("Database error: {db}"), "INVALID_STATE"),
    };
    Error::new(message).extend_with(|_, ext| ext.set("code", code))
}

fn settings_error(err: SettingsError) -> Error {
    let (message, code) = match err {
        SettingsError::Validation(msg) => (msg, "VALIDATION_ERROR"),
        SettingsError::Io(io) => (format!("I/O error: {io}"), "IO_ERROR"),
        SettingsError::Corrupt(parse) => {
            (format!("Settings file is corrupt: {parse}"), "INVALID_STATE")
        }
    };
    Error::new(message).extend_with(|_, ext| ext.set("code", code))
}

fn books_from_ctx<'a>(ctx: &Context<'a>) -> Result<&'a Arc<BookStore>> {
    ctx.data::<Arc<BookStore>>()
        .map_err(|_| Error::new("Book store not configured"))
}

fn settings_from_ctx<'a>(ctx: &Context<'a>) -> Result<&'a Arc<SettingsStore>> {
    ctx.data::<Arc<SettingsStore>>()
        .map_err(|_| Error::new("Settings store not configured"))
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn library(&self) -> LibraryQuery {
        LibraryQuery
    }

    async fn settings(&self) -> SettingsQuery {
        SettingsQuery
    }
}

pub struct LibraryQuery;

#[Object]
impl LibraryQuery {
    /// All books, ordered by id.
    async fn books(&self, ctx: &Context<'_>) -> Result<Vec<BookDto>> {
        let store = books_from_ctx(ctx)?;
        let books = store.list().await.map_err(store_error)?;
        Ok(books.into_iter().map(BookDto::from).collect())
    }

    async fn book(&self, ctx: &Context<'_>, id: i32) -> Result<Option<BookDto>> {
        let store = books_from_ctx(ctx)?;
        let book = store.get(id).await.map_err(store_error)?;
        Ok(book.map(BookDto::from))
    }
}

pub struct SettingsQuery;

#[Object]
impl SettingsQuery {
    async fn general_settings(&self, ctx: &Context<'_>) -> Result<GeneralSettingsDto> {
        let store = settings_from_ctx(ctx)?;
        let general = store.general().await.map_err(settings_error)?;
        Ok(GeneralSettingsDto {
            language: general.language.as_str().to_string(),
        })
    }

    async fn appearance_settings(&self, ctx: &Context<'_>) -> Result<AppearanceSettingsDto> {
        let store = settings_from_ctx(ctx)?;
        let appearance = store.appearance().await.map_err(settings_error)?;
        Ok(AppearanceSettingsDto {
            theme: appearance.theme.as_str().to_string(),
        })
    }

    async fn database_settings(&self, ctx: &Context<'_>) -> Result<DatabaseSettingsDto> {
        let store = settings_from_ctx(ctx)?;
        let database = store.database().await.map_err(settings_error)?;
        Ok(DatabaseSettingsDto {
            database_directory: database.database_directory,
        })
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn library(&self) -> LibraryMutation {
        LibraryMutation
    }

    async fn settings(&self) -> SettingsMutation {
        SettingsMutation
    }
}

pub struct LibraryMutation;

#[Object]
impl LibraryMutation {
    async fn create_book(
        &self,
        ctx: &Context<'_>,
        title: String,
        author: Option<String>,
        description: Option<String>,
        published_year: Option<i32>,
    ) -> Result<BookDto> {
        let store = books_from_ctx(ctx)?;
        let draft = BookDraft {
            title,
            author,
            description,
            published_year,
        };
        let book = store.insert(&draft).await.map_err(store_error)?;
        Ok(book.into())
    }

    /// Partial update: omitted arguments leave the field unchanged.
    async fn update_book(
        &self,
        ctx: &Context<'_>,
        id: i32,
        title: Option<String>,
        author: Option<String>,
        description: Option<String>,
        published_year: Option<i32>,
    ) -> Result<BookDto> {
        let store = books_from_ctx(ctx)?;
        let patch = BookPatch {
            title,
            author,
            description,
            published_year,
        };
        let book = store.update(id, &patch).await.map_err(store_error)?;
        Ok(book.into())
    }

    async fn delete_book(&self, ctx: &Context<'_>, id: i32) -> Result<bool> {
        let store = books_from_ctx(ctx)?;
        store.delete(id).await.map_err(store_error)?;
        Ok(true)
    }
}

pub struct SettingsMutation;

#[Object]
impl SettingsMutation {
    async fn update_general_settings(
        &self,
        ctx: &Context<'_>,
        language: Option<String>,
    ) -> Result<GeneralSettingsDto> {
        let store = settings_from_ctx(ctx)?;
        let general = store
            .update_general(language)
            .await
            .map_err(settings_error)?;
        Ok(GeneralSettingsDto {
            language: general.language.as_str().to_string(),
        })
    }

    async fn update_appearance_settings(
        &self,
        ctx: &Context<'_>,
        theme: Option<String>,
    ) -> Result<AppearanceSettingsDto> {
        let store = settings_from_ctx(ctx)?;
        let appearance = store.update_appearance(theme).await.map_err(settings_error)?;
        Ok(AppearanceSettingsDto {
            theme: appearance.theme.as_str().to_string(),
        })
    }

    async fn update_database_settings(
        &self,
        ctx: &Context<'_>,
        database_directory: Option<String>,
    ) -> Result<DatabaseSettingsDto> {
        let store = settings_from_ctx(ctx)?;
        let database = store
            .update_database(database_directory)
            .await
            .map_err(settings_error)?;
        Ok(DatabaseSettingsDto {
            database_directory: database.database_directory,
        })
    }

    async fn reset_settings(&self, ctx: &Context<'_>) -> Result<bool> {
        let store = settings_from_ctx(ctx)?;
        store.reset().await.map_err(settings_error)?;
        Ok(true)
    }
}
