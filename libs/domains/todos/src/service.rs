use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{TodoError, TodoResult};
use crate::models::{
    BatchResult, CreateSubTask, CreateTodo, Statistics, SubTask, Todo, TodoFilter, UpdateSubTask,
    UpdateTodo,
};
use crate::repository::TodoRepository;

/// Todo, subtask, batch and statistics logic
///
/// Every method takes the acting user's id. Todos of other users look exactly like
/// missing ones; subtasks of other users' todos are reported as forbidden.
#[derive(Clone)]
pub struct TodoService<R: TodoRepository> {
    repository: Arc<R>,
}

impl<R: TodoRepository> TodoService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    async fn ensure_owner(&self, user_id: i32, id: i32) -> TodoResult<()> {
        match self.repository.owner(id).await? {
            Some(owner) if owner == user_id => Ok(()),
            _ => Err(TodoError::NotFound(id)),
        }
    }

    async fn ensure_category(&self, user_id: i32, category_id: i32) -> TodoResult<()> {
        if self.repository.owns_category(user_id, category_id).await? {
            Ok(())
        } else {
            Err(TodoError::CategoryNotFound(category_id))
        }
    }

    /// Category and parent references must point at the caller's own rows
    async fn ensure_references(
        &self,
        user_id: i32,
        category_id: Option<i32>,
        parent_id: Option<i32>,
    ) -> TodoResult<()> {
        if let Some(category_id) = category_id {
            self.ensure_category(user_id, category_id).await?;
        }
        if let Some(parent_id) = parent_id {
            self.ensure_owner(user_id, parent_id).await?;
        }
        Ok(())
    }

    async fn ensure_subtask_owner(&self, user_id: i32, id: i32, action: &str) -> TodoResult<()> {
        let (_, owner) = self
            .repository
            .find_subtask(id)
            .await?
            .ok_or(TodoError::SubTaskNotFound(id))?;

        if owner != user_id {
            tracing::warn!(subtask_id = id, user_id, "Subtask belongs to another user");
            return Err(TodoError::Forbidden(format!(
                "You do not have permission to {} this subtask",
                action
            )));
        }
        Ok(())
    }

    /// Create a todo with its nested subtasks
    #[instrument(skip(self, input))]
    pub async fn create(&self, user_id: i32, input: CreateTodo) -> TodoResult<Todo> {
        self.ensure_references(user_id, input.category_id, input.parent_id)
            .await?;
        self.repository.create(user_id, input).await
    }

    #[instrument(skip(self))]
    pub async fn list(&self, user_id: i32, filter: TodoFilter) -> TodoResult<Vec<Todo>> {
        self.repository.list(user_id, filter).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, user_id: i32, id: i32) -> TodoResult<Todo> {
        self.repository
            .find(id)
            .await?
            .filter(|todo| todo.user_id == user_id)
            .ok_or(TodoError::NotFound(id))
    }

    #[instrument(skip(self, changes))]
    pub async fn update(&self, user_id: i32, id: i32, changes: UpdateTodo) -> TodoResult<Todo> {
        self.ensure_owner(user_id, id).await?;

        if changes.parent_id == Some(Some(id)) {
            return Err(TodoError::Validation(
                "A todo cannot be its own parent".to_string(),
            ));
        }
        self.ensure_references(user_id, changes.category_id.flatten(), changes.parent_id.flatten())
            .await?;

        self.repository.update(id, changes).await
    }

    #[instrument(skip(self))]
    pub async fn toggle(&self, user_id: i32, id: i32) -> TodoResult<Todo> {
        self.ensure_owner(user_id, id).await?;
        self.repository.toggle(id).await
    }

    /// Delete a todo together with its subtasks and child todos
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: i32, id: i32) -> TodoResult<()> {
        self.ensure_owner(user_id, id).await?;
        self.repository.delete(id).await
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn batch_delete(&self, user_id: i32, ids: Vec<i32>) -> TodoResult<BatchResult> {
        if ids.is_empty() {
            return Err(TodoError::Validation("ids must not be empty".to_string()));
        }

        let affected = self.repository.batch_delete(user_id, ids).await?;
        if affected == 0 {
            return Err(TodoError::NothingAffected(
                "No todos found to delete".to_string(),
            ));
        }
        Ok(BatchResult { affected })
    }

    #[instrument(skip(self, ids, changes), fields(count = ids.len()))]
    pub async fn batch_update(
        &self,
        user_id: i32,
        ids: Vec<i32>,
        changes: UpdateTodo,
    ) -> TodoResult<BatchResult> {
        if ids.is_empty() {
            return Err(TodoError::Validation("ids must not be empty".to_string()));
        }
        if changes.is_empty() {
            return Err(TodoError::Validation("No fields to update".to_string()));
        }
        if let Some(Some(parent_id)) = changes.parent_id {
            if ids.contains(&parent_id) {
                return Err(TodoError::Validation(
                    "A todo cannot be its own parent".to_string(),
                ));
            }
        }
        self.ensure_references(user_id, changes.category_id.flatten(), changes.parent_id.flatten())
            .await?;

        let affected = self.repository.batch_update(user_id, ids, changes).await?;
        if affected == 0 {
            return Err(TodoError::NothingAffected(
                "No todos found to update".to_string(),
            ));
        }
        Ok(BatchResult { affected })
    }

    #[instrument(skip(self))]
    pub async fn statistics(&self, user_id: i32) -> TodoResult<Statistics> {
        let todos = self.repository.list(user_id, TodoFilter::default()).await?;
        Ok(Statistics::from_todos(&todos, Utc::now()))
    }

    /// Add a subtask to one of the caller's todos
    #[instrument(skip(self, input))]
    pub async fn create_subtask(
        &self,
        user_id: i32,
        todo_id: i32,
        input: CreateSubTask,
    ) -> TodoResult<SubTask> {
        match self.repository.owner(todo_id).await? {
            None => Err(TodoError::NotFound(todo_id)),
            Some(owner) if owner != user_id => Err(TodoError::Forbidden(
                "You do not have permission to modify this todo".to_string(),
            )),
            Some(_) => self.repository.create_subtask(todo_id, input).await,
        }
    }

    #[instrument(skip(self, changes))]
    pub async fn update_subtask(
        &self,
        user_id: i32,
        id: i32,
        changes: UpdateSubTask,
    ) -> TodoResult<SubTask> {
        self.ensure_subtask_owner(user_id, id, "modify").await?;
        self.repository.update_subtask(id, changes).await
    }

    #[instrument(skip(self))]
    pub async fn toggle_subtask(&self, user_id: i32, id: i32) -> TodoResult<SubTask> {
        self.ensure_subtask_owner(user_id, id, "modify").await?;
        self.repository.toggle_subtask(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_subtask(&self, user_id: i32, id: i32) -> TodoResult<()> {
        self.ensure_subtask_owner(user_id, id, "delete").await?;
        self.repository.delete_subtask(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use crate::repository::{InMemoryTodoRepository, MockTodoRepository};
    use mockall::predicate::eq;

    fn subtask(id: i32, todo_id: i32) -> SubTask {
        SubTask {
            id,
            title: "Draft".to_string(),
            is_completed: false,
            todo_id,
            created_at: Utc::now(),
        }
    }

    fn create_input(title: &str) -> CreateTodo {
        CreateTodo {
            title: title.to_string(),
            description: None,
            priority: Priority::Medium,
            due_date: None,
            category_id: None,
            parent_id: None,
            has_reminder: false,
            subtasks: vec![],
        }
    }

    #[tokio::test]
    async fn test_get_hides_foreign_todo() {
        let service = TodoService::new(InMemoryTodoRepository::new());
        let todo = service.create(1, create_input("Mine")).await.unwrap();

        assert!(service.get(1, todo.id).await.is_ok());
        assert!(matches!(
            service.get(2, todo.id).await,
            Err(TodoError::NotFound(id)) if id == todo.id
        ));
        assert!(matches!(
            service.delete(2, todo.id).await,
            Err(TodoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_rejects_foreign_todo_without_writing() {
        let mut mock = MockTodoRepository::new();
        mock.expect_owner().with(eq(5)).returning(|_| Ok(Some(2)));
        mock.expect_update().never();

        let service = TodoService::new(mock);
        let result = service.update(1, 5, UpdateTodo::default()).await;
        assert!(matches!(result, Err(TodoError::NotFound(5))));
    }

    #[tokio::test]
    async fn test_update_rejects_self_parent() {
        let mut mock = MockTodoRepository::new();
        mock.expect_owner().with(eq(5)).returning(|_| Ok(Some(1)));

        let service = TodoService::new(mock);
        let changes = UpdateTodo {
            parent_id: Some(Some(5)),
            ..UpdateTodo::default()
        };
        let result = service.update(1, 5, changes).await;
        assert!(matches!(result, Err(TodoError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_foreign_category() {
        let mut mock = MockTodoRepository::new();
        mock.expect_owns_category()
            .with(eq(1), eq(9))
            .returning(|_, _| Ok(false));
        mock.expect_create().never();

        let service = TodoService::new(mock);
        let mut input = create_input("Report");
        input.category_id = Some(9);

        let result = service.create(1, input).await;
        assert!(matches!(result, Err(TodoError::CategoryNotFound(9))));
    }

    #[tokio::test]
    async fn test_create_subtask_missing_vs_foreign_todo() {
        let mut mock = MockTodoRepository::new();
        mock.expect_owner().with(eq(3)).returning(|_| Ok(None));
        mock.expect_owner().with(eq(4)).returning(|_| Ok(Some(2)));
        mock.expect_create_subtask().never();

        let service = TodoService::new(mock);
        let input = CreateSubTask {
            title: "Draft".into(),
        };

        assert!(matches!(
            service.create_subtask(1, 3, input.clone()).await,
            Err(TodoError::NotFound(3))
        ));
        assert!(matches!(
            service.create_subtask(1, 4, input).await,
            Err(TodoError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_subtask_of_foreign_todo_is_forbidden() {
        let mut mock = MockTodoRepository::new();
        mock.expect_find_subtask()
            .with(eq(10))
            .returning(|id| Ok(Some((subtask(id, 4), 2))));
        mock.expect_find_subtask().with(eq(11)).returning(|_| Ok(None));
        mock.expect_toggle_subtask().never();
        mock.expect_delete_subtask().never();

        let service = TodoService::new(mock);

        assert!(matches!(
            service.toggle_subtask(1, 10).await,
            Err(TodoError::Forbidden(_))
        ));
        assert!(matches!(
            service.delete_subtask(1, 10).await,
            Err(TodoError::Forbidden(msg)) if msg.contains("delete")
        ));
        assert!(matches!(
            service.toggle_subtask(1, 11).await,
            Err(TodoError::SubTaskNotFound(11))
        ));
    }

    #[tokio::test]
    async fn test_batch_validation_and_nothing_affected() {
        let mut mock = MockTodoRepository::new();
        mock.expect_batch_delete()
            .with(eq(1), eq(vec![7, 8]))
            .returning(|_, _| Ok(0));

        let service = TodoService::new(mock);

        assert!(matches!(
            service.batch_delete(1, vec![]).await,
            Err(TodoError::Validation(_))
        ));
        assert!(matches!(
            service.batch_delete(1, vec![7, 8]).await,
            Err(TodoError::NothingAffected(_))
        ));
        assert!(matches!(
            service.batch_update(1, vec![7], UpdateTodo::default()).await,
            Err(TodoError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_update_reports_affected() {
        let service = TodoService::new(InMemoryTodoRepository::new());
        let a = service.create(1, create_input("A")).await.unwrap();
        let b = service.create(1, create_input("B")).await.unwrap();
        let foreign = service.create(2, create_input("C")).await.unwrap();

        let changes = UpdateTodo {
            priority: Some(Priority::High),
            ..UpdateTodo::default()
        };
        let result = service
            .batch_update(1, vec![a.id, b.id, foreign.id], changes)
            .await
            .unwrap();
        assert_eq!(result.affected, 2);
        assert_eq!(service.get(2, foreign.id).await.unwrap().priority, Priority::Medium);
    }

    #[tokio::test]
    async fn test_report_scenario_progress() {
        let service = TodoService::new(InMemoryTodoRepository::new());
        let mut input = create_input("Report");
        input.subtasks = vec![
            CreateSubTask {
                title: "Draft".into(),
            },
            CreateSubTask {
                title: "Review".into(),
            },
        ];
        let todo = service.create(1, input).await.unwrap();
        assert_eq!(todo.progress, 0);

        let draft = todo.subtasks[0].id;
        let review = todo.subtasks[1].id;

        service.toggle_subtask(1, draft).await.unwrap();
        assert_eq!(service.get(1, todo.id).await.unwrap().progress, 50);

        service.toggle_subtask(1, review).await.unwrap();
        assert_eq!(service.get(1, todo.id).await.unwrap().progress, 100);

        service.delete_subtask(1, draft).await.unwrap();
        assert_eq!(service.get(1, todo.id).await.unwrap().progress, 100);
    }

    #[tokio::test]
    async fn test_statistics_counts_only_own_todos() {
        let service = TodoService::new(InMemoryTodoRepository::new());
        let done = service.create(1, create_input("Done")).await.unwrap();
        service.create(1, create_input("Open")).await.unwrap();
        service.create(2, create_input("Foreign")).await.unwrap();
        service.toggle(1, done.id).await.unwrap();

        let stats = service.statistics(1).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.completion_rate, 50);
        assert_eq!(stats.priority_stats.medium, 2);
    }
}
