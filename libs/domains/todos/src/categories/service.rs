use std::sync::Arc;
use tracing::instrument;

use super::models::{Category, CategoryWithTodos, CreateCategory, NewCategory, UpdateCategory};
use super::repository::CategoryRepository;
use crate::error::{TodoError, TodoResult};

/// Category logic, scoped to the acting user
#[derive(Clone)]
pub struct CategoryService<R: CategoryRepository> {
    repository: Arc<R>,
}

impl<R: CategoryRepository> CategoryService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    async fn owned(&self, user_id: i32, id: i32) -> TodoResult<Category> {
        self.repository
            .find(id)
            .await?
            .filter(|category| category.user_id == user_id)
            .ok_or(TodoError::CategoryNotFound(id))
    }

    /// Create a category, filling in the default color and icon
    #[instrument(skip(self, input))]
    pub async fn create(&self, user_id: i32, input: CreateCategory) -> TodoResult<Category> {
        self.repository.create(NewCategory::new(user_id, input)).await
    }

    #[instrument(skip(self))]
    pub async fn list(&self, user_id: i32) -> TodoResult<Vec<Category>> {
        self.repository.list(user_id).await
    }

    /// A category with its todos
    #[instrument(skip(self))]
    pub async fn get(&self, user_id: i32, id: i32) -> TodoResult<CategoryWithTodos> {
        let category = self.owned(user_id, id).await?;
        let todos = self.repository.todos_of(id).await?;
        Ok(CategoryWithTodos { category, todos })
    }

    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        user_id: i32,
        id: i32,
        changes: UpdateCategory,
    ) -> TodoResult<Category> {
        self.owned(user_id, id).await?;
        self.repository.update(id, changes).await
    }

    /// Delete a category; its todos are kept without a category
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: i32, id: i32) -> TodoResult<()> {
        self.owned(user_id, id).await?;
        self.repository.delete(id).await
    }
}
