use async_trait::async_trait;

use crate::query::DateRange;
use crate::types::{Article, ArticleUpdate, NewArticle, Todo};
use crate::Result;

#[async_trait]
pub trait ReadingStorage: Send + Sync {
    /// All articles within the range, newest read first.
    async fn list_articles(&self, range: &DateRange) -> Result<Vec<Article>>;

    /// Persist a validated draft, assigning the id and bookkeeping
    /// timestamps.
    async fn create_article(&self, draft: NewArticle) -> Result<Article>;

    /// Apply a partial update to an existing article.
    async fn update_article(&self, id: i64, update: ArticleUpdate) -> Result<Article>;

    /// Remove an article. Removing an id that is already gone is not an
    /// error.
    async fn delete_article(&self, id: i64) -> Result<()>;

    async fn list_todos(&self) -> Result<Vec<Todo>>;

    async fn add_todo(&self, title: String) -> Result<Todo>;
}
