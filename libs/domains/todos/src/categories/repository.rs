use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::{Category, NewCategory, UpdateCategory};
use crate::error::{TodoError, TodoResult};
use crate::models::Todo;
use crate::repository::Store;

/// Repository trait for Category persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, input: NewCategory) -> TodoResult<Category>;

    /// Newest first
    async fn list(&self, user_id: i32) -> TodoResult<Vec<Category>>;

    async fn find(&self, id: i32) -> TodoResult<Option<Category>>;

    /// Todos filed under the category, hydrated and newest first
    async fn todos_of(&self, category_id: i32) -> TodoResult<Vec<Todo>>;

    async fn update(&self, id: i32, changes: UpdateCategory) -> TodoResult<Category>;

    /// Delete the category; its todos stay and lose the link
    async fn delete(&self, id: i32) -> TodoResult<()>;
}

/// In-memory implementation of CategoryRepository (for development/testing)
///
/// Use [`InMemoryTodoRepository::categories`](crate::InMemoryTodoRepository::categories)
/// to share tables with a todo repository.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCategoryRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_store(store: Arc<RwLock<Store>>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn create(&self, input: NewCategory) -> TodoResult<Category> {
        let mut store = self.store.write().await;

        let category = Category {
            id: store.next_category_id(),
            name: input.name,
            color: input.color,
            icon: input.icon,
            user_id: input.user_id,
            created_at: Utc::now(),
        };
        store.categories.insert(category.id, category.clone());

        tracing::info!(category_id = category.id, user_id = category.user_id, "Created category");
        Ok(category)
    }

    async fn list(&self, user_id: i32) -> TodoResult<Vec<Category>> {
        let store = self.store.read().await;

        let mut categories: Vec<Category> = store
            .categories
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(categories)
    }

    async fn find(&self, id: i32) -> TodoResult<Option<Category>> {
        let store = self.store.read().await;
        Ok(store.categories.get(&id).cloned())
    }

    async fn todos_of(&self, category_id: i32) -> TodoResult<Vec<Todo>> {
        let store = self.store.read().await;
        Ok(store.select(|t| t.category_id == Some(category_id)))
    }

    async fn update(&self, id: i32, changes: UpdateCategory) -> TodoResult<Category> {
        let mut store = self.store.write().await;

        let category = store
            .categories
            .get_mut(&id)
            .ok_or(TodoError::CategoryNotFound(id))?;
        if let Some(name) = changes.name {
            category.name = name;
        }
        if let Some(color) = changes.color {
            category.color = color;
        }
        if let Some(icon) = changes.icon {
            category.icon = icon;
        }

        Ok(category.clone())
    }

    async fn delete(&self, id: i32) -> TodoResult<()> {
        let mut store = self.store.write().await;

        if store.categories.remove(&id).is_none() {
            return Err(TodoError::CategoryNotFound(id));
        }
        store.detach_category(id);

        tracing::info!(category_id = id, "Deleted category");
        Ok(())
    }
}
