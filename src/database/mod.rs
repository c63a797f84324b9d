use crate::domain::Page;
use anyhow::Result;
use async_trait::async_trait;
use derive_more::Display;

pub mod sqlite;

/// Sort applied by [`PageRepository::list_pages`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListOrder {
    /// newest `created` first
    #[default]
    Created,
    /// rows with a non-empty `order`, ascending
    Order,
    /// rows with a `publish_date`, newest first
    PublishDate,
}

/// Filters for a listing. `group_id: None` selects site pages only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub group_id: Option<String>,
    pub page_type: Option<String>,
    pub private: Option<bool>,
    pub order: ListOrder,
}

/// Raised by `save_page` when another row already holds the same (scope, name, lang).
#[derive(Debug, Display)]
#[display("page {} already exists for language {}", name, lang)]
pub struct DuplicatePage {
    pub name: String,
    pub lang: String,
}

impl std::error::Error for DuplicatePage {}

// a PageRepository is shared behind an Arc between requests
// sqlx::Pool is thread safe
#[async_trait]
pub trait PageRepository: Send + Sync {
    /// Row for (scope, name, lang); with `lang: None` the first row for (scope, name) in any language.
    async fn get_page(
        &self,
        group_id: Option<&str>,
        name: &str,
        lang: Option<&str>,
    ) -> Result<Option<Page>>;

    /// Whether any language variant of `name` exists in the scope.
    async fn page_name_exists(&self, group_id: Option<&str>, name: &str) -> Result<bool>;

    async fn list_pages(&self, query: &PageQuery) -> Result<Vec<Page>>;

    // write operations
    /// Inserts or overwrites by `id`. Fails with [`DuplicatePage`] on a (scope, name, lang) clash.
    async fn save_page(&self, page: &Page) -> Result<()>;
    async fn delete_page(&self, id: &str) -> Result<()>;
}
