use async_trait::async_trait;
use chrono::Utc;
use rl_core::query::DateRange;
use rl_core::storage::ReadingStorage;
use rl_core::types::{Article, ArticleUpdate, NewArticle, Todo};
use rl_core::{Error, Result};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryStore {
    articles: Vec<Article>,
    todos: Vec<Todo>,
    next_article_id: i64,
    next_todo_id: i64,
}

impl MemoryStore {
    fn list_articles(&self, range: &DateRange) -> Vec<Article> {
        let mut articles: Vec<Article> = self
            .articles
            .iter()
            .filter(|article| range.contains(article.read_at))
            .cloned()
            .collect();
        articles.sort_by(|a, b| b.read_at.cmp(&a.read_at));
        articles
    }
}

/// Process-memory storage, mainly for tests and demos. All state is lost
/// on restart.
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::default())),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadingStorage for MemoryStorage {
    async fn list_articles(&self, range: &DateRange) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.list_articles(range))
    }

    async fn create_article(&self, draft: NewArticle) -> Result<Article> {
        let mut store = self.store.write().await;
        let now = Utc::now();
        store.next_article_id += 1;
        let article = Article {
            id: store.next_article_id,
            title: draft.title,
            url: draft.url,
            source: draft.source,
            read_at: draft.read_at.unwrap_or(now),
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        };
        store.articles.push(article.clone());
        Ok(article)
    }

    async fn update_article(&self, id: i64, update: ArticleUpdate) -> Result<Article> {
        let mut store = self.store.write().await;
        let article = store
            .articles
            .iter_mut()
            .find(|article| article.id == id)
            .ok_or_else(|| Error::NotFound(format!("article {id}")))?;
        update.apply(article, Utc::now());
        Ok(article.clone())
    }

    async fn delete_article(&self, id: i64) -> Result<()> {
        let mut store = self.store.write().await;
        store.articles.retain(|article| article.id != id);
        Ok(())
    }

    async fn list_todos(&self) -> Result<Vec<Todo>> {
        let store = self.store.read().await;
        Ok(store.todos.clone())
    }

    async fn add_todo(&self, title: String) -> Result<Todo> {
        let mut store = self.store.write().await;
        store.next_todo_id += 1;
        let todo = Todo {
            id: store.next_todo_id,
            title,
            created_at: Utc::now(),
        };
        store.todos.push(todo.clone());
        Ok(todo)
    }
}
