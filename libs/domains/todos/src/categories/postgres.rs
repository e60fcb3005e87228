use async_trait::async_trait;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

use super::models::{Category, NewCategory, UpdateCategory};
use super::repository::CategoryRepository;
use crate::entity::{category, todo};
use crate::error::{TodoError, TodoResult};
use crate::models::Todo;
use crate::postgres::hydrate;

/// PostgreSQL implementation of CategoryRepository using SeaORM
///
/// Detaching todos on delete is left to the `ON DELETE SET NULL` foreign key.
#[derive(Clone)]
pub struct PgCategoryRepository {
    db: DatabaseConnection,
}

impl PgCategoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn create(&self, input: NewCategory) -> TodoResult<Category> {
        let active_model: category::ActiveModel = input.into();
        let model = active_model.insert(&self.db).await?;

        tracing::info!(category_id = model.id, user_id = model.user_id, "Created category");
        Ok(model.into())
    }

    async fn list(&self, user_id: i32) -> TodoResult<Vec<Category>> {
        let models = category::Entity::find()
            .filter(category::Column::UserId.eq(user_id))
            .order_by_desc(category::Column::CreatedAt)
            .order_by_desc(category::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find(&self, id: i32) -> TodoResult<Option<Category>> {
        let model = category::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn todos_of(&self, category_id: i32) -> TodoResult<Vec<Todo>> {
        let models = todo::Entity::find()
            .filter(todo::Column::CategoryId.eq(category_id))
            .order_by_desc(todo::Column::CreatedAt)
            .order_by_desc(todo::Column::Id)
            .all(&self.db)
            .await?;
        hydrate(&self.db, models).await.map_err(Into::into)
    }

    async fn update(&self, id: i32, changes: UpdateCategory) -> TodoResult<Category> {
        let model = category::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(TodoError::CategoryNotFound(id))?;

        let mut active_model: category::ActiveModel = model.clone().into();
        if let Some(name) = changes.name {
            active_model.name = Set(name);
        }
        if let Some(color) = changes.color {
            active_model.color = Set(color);
        }
        if let Some(icon) = changes.icon {
            active_model.icon = Set(icon);
        }

        if !active_model.is_changed() {
            return Ok(model.into());
        }
        let updated = active_model.update(&self.db).await?;

        tracing::info!(category_id = id, "Updated category");
        Ok(updated.into())
    }

    async fn delete(&self, id: i32) -> TodoResult<()> {
        let result = category::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(TodoError::CategoryNotFound(id));
        }

        tracing::info!(category_id = id, "Deleted category");
        Ok(())
    }
}
