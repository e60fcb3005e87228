use async_trait::async_trait;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use std::collections::HashMap;

use crate::{
    entity::{category, subtask, todo},
    error::{TodoError, TodoResult},
    models::{
        CreateSubTask, CreateTodo, SubTask, Todo, TodoFilter, UpdateSubTask, UpdateTodo,
        percentage,
    },
    repository::TodoRepository,
};

/// PostgreSQL implementation of TodoRepository using SeaORM
///
/// Subtask mutations and todo toggles lock the todo row (`SELECT ... FOR UPDATE`) inside
/// a transaction, so concurrent changes to one todo are applied one at a time and the
/// stored progress always matches the committed subtasks.
#[derive(Clone)]
pub struct PgTodoRepository {
    db: DatabaseConnection,
}

impl PgTodoRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// `%term%` for ILIKE with the pattern characters escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Attach categories and subtasks, keeping the order of `models`.
pub(crate) async fn hydrate<C: ConnectionTrait>(
    db: &C,
    models: Vec<todo::Model>,
) -> Result<Vec<Todo>, DbErr> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let todo_ids: Vec<i32> = models.iter().map(|m| m.id).collect();
    let category_ids: Vec<i32> = models.iter().filter_map(|m| m.category_id).collect();

    let mut subtasks: HashMap<i32, Vec<SubTask>> = HashMap::new();
    for model in subtask::Entity::find()
        .filter(subtask::Column::TodoId.is_in(todo_ids))
        .order_by_asc(subtask::Column::CreatedAt)
        .order_by_asc(subtask::Column::Id)
        .all(db)
        .await?
    {
        subtasks.entry(model.todo_id).or_default().push(model.into());
    }

    let categories: HashMap<i32, category::Model> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        category::Entity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect()
    };

    Ok(models
        .into_iter()
        .map(|model| {
            let mut todo = Todo::from(model);
            todo.category = todo
                .category_id
                .and_then(|id| categories.get(&id).cloned().map(Into::into));
            todo.subtasks = subtasks.remove(&todo.id).unwrap_or_default();
            todo
        })
        .collect())
}

/// Lock the todo row for the rest of the transaction
async fn lock_todo<C: ConnectionTrait>(db: &C, id: i32) -> TodoResult<todo::Model> {
    todo::Entity::find_by_id(id)
        .lock_exclusive()
        .one(db)
        .await?
        .ok_or(TodoError::NotFound(id))
}

/// Lock the parent of a subtask, then read the subtask under that lock
async fn lock_subtask<C: ConnectionTrait>(db: &C, id: i32) -> TodoResult<subtask::Model> {
    let todo_id = subtask::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(TodoError::SubTaskNotFound(id))?
        .todo_id;

    lock_todo(db, todo_id).await?;

    subtask::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(TodoError::SubTaskNotFound(id))
}

/// Recount the subtasks of a todo and store the resulting progress
async fn refresh_progress<C: ConnectionTrait>(db: &C, todo_id: i32) -> Result<i32, DbErr> {
    let of_todo = || subtask::Entity::find().filter(subtask::Column::TodoId.eq(todo_id));
    let total = of_todo().count(db).await?;
    let completed = of_todo()
        .filter(subtask::Column::IsCompleted.eq(true))
        .count(db)
        .await?;

    let progress = percentage(completed as usize, total as usize);
    todo::Entity::update_many()
        .col_expr(todo::Column::Progress, Expr::value(progress))
        .filter(todo::Column::Id.eq(todo_id))
        .exec(db)
        .await?;

    tracing::debug!(todo_id, progress, "Recomputed progress");
    Ok(progress)
}

/// Active model with only the changed columns set
fn changes_model(changes: UpdateTodo) -> todo::ActiveModel {
    let mut model = <todo::ActiveModel as ActiveModelTrait>::default();
    if let Some(title) = changes.title {
        model.title = Set(title);
    }
    if let Some(description) = changes.description {
        model.description = Set(description);
    }
    if let Some(is_completed) = changes.is_completed {
        model.is_completed = Set(is_completed);
    }
    if let Some(priority) = changes.priority {
        model.priority = Set(priority);
    }
    if let Some(due_date) = changes.due_date {
        model.due_date = Set(due_date);
    }
    if let Some(has_reminder) = changes.has_reminder {
        model.has_reminder = Set(has_reminder);
    }
    if let Some(category_id) = changes.category_id {
        model.category_id = Set(category_id);
    }
    if let Some(parent_id) = changes.parent_id {
        model.parent_id = Set(parent_id);
    }
    model
}

impl PgTodoRepository {
    async fn hydrate_one(&self, id: i32) -> TodoResult<Todo> {
        self.find(id).await?.ok_or(TodoError::NotFound(id))
    }
}

#[async_trait]
impl TodoRepository for PgTodoRepository {
    async fn create(&self, user_id: i32, input: CreateTodo) -> TodoResult<Todo> {
        let txn = self.db.begin().await?;

        let model = todo::ActiveModel {
            title: Set(input.title),
            description: Set(input.description),
            priority: Set(input.priority),
            due_date: Set(input.due_date),
            has_reminder: Set(input.has_reminder),
            user_id: Set(user_id),
            category_id: Set(input.category_id),
            parent_id: Set(input.parent_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        if !input.subtasks.is_empty() {
            let rows = input.subtasks.into_iter().map(|s| subtask::ActiveModel {
                title: Set(s.title),
                todo_id: Set(model.id),
                ..Default::default()
            });
            subtask::Entity::insert_many(rows).exec(&txn).await?;
        }
        refresh_progress(&txn, model.id).await?;

        txn.commit().await?;

        tracing::info!(todo_id = model.id, user_id, "Created todo");
        self.hydrate_one(model.id).await
    }

    async fn find(&self, id: i32) -> TodoResult<Option<Todo>> {
        let Some(model) = todo::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        Ok(hydrate(&self.db, vec![model]).await?.pop())
    }

    async fn owner(&self, id: i32) -> TodoResult<Option<i32>> {
        let model = todo::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(|m| m.user_id))
    }

    async fn list(&self, user_id: i32, filter: TodoFilter) -> TodoResult<Vec<Todo>> {
        let mut query = todo::Entity::find().filter(todo::Column::UserId.eq(user_id));

        if let Some(search) = filter.search {
            query = query.filter(Expr::cust_with_values(
                r#"("todos"."title" ILIKE $1 OR "todos"."description" ILIKE $1)"#,
                [like_pattern(&search)],
            ));
        }
        if let Some(priority) = filter.priority {
            query = query.filter(todo::Column::Priority.eq(priority));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(todo::Column::CategoryId.eq(category_id));
        }
        if let Some(is_completed) = filter.is_completed {
            query = query.filter(todo::Column::IsCompleted.eq(is_completed));
        }
        if let Some(due_date) = filter.due_date {
            query = query.filter(todo::Column::DueDate.eq(due_date));
        }

        let models = query
            .order_by_desc(todo::Column::CreatedAt)
            .order_by_desc(todo::Column::Id)
            .all(&self.db)
            .await?;

        hydrate(&self.db, models).await.map_err(Into::into)
    }

    async fn update(&self, id: i32, changes: UpdateTodo) -> TodoResult<Todo> {
        if !changes.is_empty() {
            let result = todo::Entity::update_many()
                .set(changes_model(changes))
                .filter(todo::Column::Id.eq(id))
                .exec(&self.db)
                .await?;
            if result.rows_affected == 0 {
                return Err(TodoError::NotFound(id));
            }
            tracing::info!(todo_id = id, "Updated todo");
        }

        self.hydrate_one(id).await
    }

    async fn toggle(&self, id: i32) -> TodoResult<Todo> {
        let txn = self.db.begin().await?;

        let current = lock_todo(&txn, id).await?;
        let completed = !current.is_completed;
        let mut model: todo::ActiveModel = current.into();
        model.is_completed = Set(completed);
        model.update(&txn).await?;

        txn.commit().await?;
        self.hydrate_one(id).await
    }

    async fn delete(&self, id: i32) -> TodoResult<()> {
        let result = todo::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(TodoError::NotFound(id));
        }

        tracing::info!(todo_id = id, "Deleted todo");
        Ok(())
    }

    async fn batch_delete(&self, user_id: i32, ids: Vec<i32>) -> TodoResult<u64> {
        let result = todo::Entity::delete_many()
            .filter(todo::Column::Id.is_in(ids))
            .filter(todo::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        tracing::info!(user_id, affected = result.rows_affected, "Batch deleted todos");
        Ok(result.rows_affected)
    }

    async fn batch_update(
        &self,
        user_id: i32,
        ids: Vec<i32>,
        changes: UpdateTodo,
    ) -> TodoResult<u64> {
        if changes.is_empty() {
            return Ok(0);
        }

        let result = todo::Entity::update_many()
            .set(changes_model(changes))
            .filter(todo::Column::Id.is_in(ids))
            .filter(todo::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        tracing::info!(user_id, affected = result.rows_affected, "Batch updated todos");
        Ok(result.rows_affected)
    }

    async fn owns_category(&self, user_id: i32, category_id: i32) -> TodoResult<bool> {
        let count = category::Entity::find()
            .filter(category::Column::Id.eq(category_id))
            .filter(category::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn find_subtask(&self, id: i32) -> TodoResult<Option<(SubTask, i32)>> {
        let Some(model) = subtask::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        let owner = self.owner(model.todo_id).await?;
        Ok(owner.map(|user_id| (model.into(), user_id)))
    }

    async fn create_subtask(&self, todo_id: i32, input: CreateSubTask) -> TodoResult<SubTask> {
        let txn = self.db.begin().await?;

        lock_todo(&txn, todo_id).await?;
        let model = subtask::ActiveModel {
            title: Set(input.title),
            todo_id: Set(todo_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        refresh_progress(&txn, todo_id).await?;

        txn.commit().await?;

        tracing::info!(subtask_id = model.id, todo_id, "Created subtask");
        Ok(model.into())
    }

    async fn update_subtask(&self, id: i32, changes: UpdateSubTask) -> TodoResult<SubTask> {
        let txn = self.db.begin().await?;

        let current = lock_subtask(&txn, id).await?;
        let todo_id = current.todo_id;
        let mut model: subtask::ActiveModel = current.clone().into();
        if let Some(title) = changes.title {
            model.title = Set(title);
        }
        if let Some(is_completed) = changes.is_completed {
            model.is_completed = Set(is_completed);
        }
        let updated = if model.is_changed() {
            model.update(&txn).await?
        } else {
            current
        };
        refresh_progress(&txn, todo_id).await?;

        txn.commit().await?;
        Ok(updated.into())
    }

    async fn toggle_subtask(&self, id: i32) -> TodoResult<SubTask> {
        let txn = self.db.begin().await?;

        let current = lock_subtask(&txn, id).await?;
        let todo_id = current.todo_id;
        let completed = !current.is_completed;
        let mut model: subtask::ActiveModel = current.into();
        model.is_completed = Set(completed);
        let updated = model.update(&txn).await?;
        refresh_progress(&txn, todo_id).await?;

        txn.commit().await?;
        Ok(updated.into())
    }

    async fn delete_subtask(&self, id: i32) -> TodoResult<()> {
        let txn = self.db.begin().await?;

        let current = lock_subtask(&txn, id).await?;
        subtask::Entity::delete_by_id(id).exec(&txn).await?;
        refresh_progress(&txn, current.todo_id).await?;

        txn.commit().await?;

        tracing::info!(subtask_id = id, todo_id = current.todo_id, "Deleted subtask");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use sea_orm::prelude::DateTimeWithTimeZone;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn now() -> DateTimeWithTimeZone {
        chrono::Utc::now().fixed_offset()
    }

    fn todo_model(id: i32, category_id: Option<i32>) -> todo::Model {
        todo::Model {
            id,
            title: format!("Todo {}", id),
            description: None,
            is_completed: false,
            priority: Priority::Medium,
            due_date: None,
            has_reminder: false,
            progress: 0,
            user_id: 1,
            category_id,
            parent_id: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn subtask_model(id: i32, todo_id: i32, completed: bool) -> subtask::Model {
        subtask::Model {
            id,
            title: format!("Step {}", id),
            is_completed: completed,
            todo_id,
            created_at: now(),
        }
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("report"), "%report%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_changes_model_sets_only_given_columns() {
        let model = changes_model(UpdateTodo {
            category_id: Some(None),
            is_completed: Some(true),
            ..UpdateTodo::default()
        });
        assert_eq!(model.category_id, Set(None));
        assert_eq!(model.is_completed, Set(true));
        assert!(model.title.is_not_set());
        assert!(model.progress.is_not_set());
    }

    #[tokio::test]
    async fn test_find_hydrates_category_and_subtasks() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![todo_model(1, Some(5))]])
            .append_query_results([vec![subtask_model(10, 1, true), subtask_model(11, 1, false)]])
            .append_query_results([vec![category::Model {
                id: 5,
                name: "Work".into(),
                color: "#3B82F6".into(),
                icon: String::new(),
                user_id: 1,
                created_at: now(),
            }]])
            .into_connection();
        let repo = PgTodoRepository::new(db);

        let todo = repo.find(1).await.unwrap().unwrap();
        assert_eq!(todo.subtasks.len(), 2);
        assert_eq!(todo.subtasks[0].id, 10);
        assert_eq!(todo.category.unwrap().name, "Work");
    }

    #[tokio::test]
    async fn test_find_missing_is_none() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<todo::Model>::new()])
            .into_connection();
        let repo = PgTodoRepository::new(db);

        assert!(repo.find(9).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let repo = PgTodoRepository::new(db);

        assert!(matches!(repo.delete(9).await, Err(TodoError::NotFound(9))));
    }

    #[tokio::test]
    async fn test_batch_delete_reports_affected_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .into_connection();
        let repo = PgTodoRepository::new(db);

        assert_eq!(repo.batch_delete(1, vec![1, 2, 3]).await.unwrap(), 2);
    }
}
