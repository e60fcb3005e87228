use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::categories::{Category, InMemoryCategoryRepository};
use crate::error::{TodoError, TodoResult};
use crate::models::{
    CreateSubTask, CreateTodo, SubTask, Todo, TodoFilter, UpdateSubTask, UpdateTodo, percentage,
};

/// Repository trait for todos and their subtasks
///
/// Ownership is not checked here; callers pass ids they already verified. Every subtask
/// mutation recomputes the parent's `progress` atomically with the change itself.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Insert a todo and its subtasks in one unit
    async fn create(&self, user_id: i32, input: CreateTodo) -> TodoResult<Todo>;

    async fn find(&self, id: i32) -> TodoResult<Option<Todo>>;

    /// Owner of a todo, if it exists
    async fn owner(&self, id: i32) -> TodoResult<Option<i32>>;

    /// Newest first
    async fn list(&self, user_id: i32, filter: TodoFilter) -> TodoResult<Vec<Todo>>;

    async fn update(&self, id: i32, changes: UpdateTodo) -> TodoResult<Todo>;

    /// Flip `is_completed`
    async fn toggle(&self, id: i32) -> TodoResult<Todo>;

    /// Delete a todo with its subtasks and child todos
    async fn delete(&self, id: i32) -> TodoResult<()>;

    /// Delete the todos among `ids` owned by `user_id`, returning how many were removed
    async fn batch_delete(&self, user_id: i32, ids: Vec<i32>) -> TodoResult<u64>;

    /// Apply `changes` to the todos among `ids` owned by `user_id`
    async fn batch_update(&self, user_id: i32, ids: Vec<i32>, changes: UpdateTodo)
    -> TodoResult<u64>;

    async fn owns_category(&self, user_id: i32, category_id: i32) -> TodoResult<bool>;

    /// A subtask together with the owner of its todo
    async fn find_subtask(&self, id: i32) -> TodoResult<Option<(SubTask, i32)>>;

    async fn create_subtask(&self, todo_id: i32, input: CreateSubTask) -> TodoResult<SubTask>;

    async fn update_subtask(&self, id: i32, changes: UpdateSubTask) -> TodoResult<SubTask>;

    async fn toggle_subtask(&self, id: i32) -> TodoResult<SubTask>;

    async fn delete_subtask(&self, id: i32) -> TodoResult<()>;
}

/// Tables shared by the in-memory todo and category repositories.
///
/// Stored todos carry no category or subtasks; [`Store::hydrate`] attaches them on read.
#[derive(Debug, Default)]
pub(crate) struct Store {
    pub(crate) todos: HashMap<i32, Todo>,
    pub(crate) subtasks: HashMap<i32, SubTask>,
    pub(crate) categories: HashMap<i32, Category>,
    last_todo_id: i32,
    last_subtask_id: i32,
    last_category_id: i32,
}

impl Store {
    pub(crate) fn next_category_id(&mut self) -> i32 {
        self.last_category_id += 1;
        self.last_category_id
    }

    pub(crate) fn hydrate(&self, todo: &Todo) -> Todo {
        let mut subtasks: Vec<SubTask> = self
            .subtasks
            .values()
            .filter(|s| s.todo_id == todo.id)
            .cloned()
            .collect();
        subtasks.sort_by_key(|s| (s.created_at, s.id));

        Todo {
            category: todo
                .category_id
                .and_then(|id| self.categories.get(&id).cloned()),
            subtasks,
            ..todo.clone()
        }
    }

    /// Hydrated todos matching `keep`, newest first
    pub(crate) fn select(&self, keep: impl Fn(&Todo) -> bool) -> Vec<Todo> {
        let mut todos: Vec<Todo> = self
            .todos
            .values()
            .filter(|t| keep(t))
            .map(|t| self.hydrate(t))
            .collect();
        todos.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        todos
    }

    fn refresh_progress(&mut self, todo_id: i32) {
        let (total, completed) = self
            .subtasks
            .values()
            .filter(|s| s.todo_id == todo_id)
            .fold((0, 0), |(total, done), s| {
                (total + 1, done + usize::from(s.is_completed))
            });

        if let Some(todo) = self.todos.get_mut(&todo_id) {
            todo.progress = percentage(completed, total);
            todo.updated_at = Utc::now();
        }
    }

    /// Remove a todo, its descendants and all their subtasks
    fn remove_todo(&mut self, id: i32) -> bool {
        if !self.todos.contains_key(&id) {
            return false;
        }

        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            self.todos.remove(&current);
            self.subtasks.retain(|_, s| s.todo_id != current);
            pending.extend(
                self.todos
                    .values()
                    .filter(|t| t.parent_id == Some(current))
                    .map(|t| t.id),
            );
        }
        true
    }

    /// Null out `category_id` on every todo filed under `category_id`
    pub(crate) fn detach_category(&mut self, category_id: i32) {
        for todo in self.todos.values_mut() {
            if todo.category_id == Some(category_id) {
                todo.category_id = None;
            }
        }
    }

    fn insert_subtask(&mut self, todo_id: i32, title: String) -> SubTask {
        self.last_subtask_id += 1;
        let subtask = SubTask {
            id: self.last_subtask_id,
            title,
            is_completed: false,
            todo_id,
            created_at: Utc::now(),
        };
        self.subtasks.insert(subtask.id, subtask.clone());
        subtask
    }
}

fn apply_changes(todo: &mut Todo, changes: UpdateTodo) {
    if let Some(title) = changes.title {
        todo.title = title;
    }
    if let Some(description) = changes.description {
        todo.description = description;
    }
    if let Some(is_completed) = changes.is_completed {
        todo.is_completed = is_completed;
    }
    if let Some(priority) = changes.priority {
        todo.priority = priority;
    }
    if let Some(due_date) = changes.due_date {
        todo.due_date = due_date;
    }
    if let Some(has_reminder) = changes.has_reminder {
        todo.has_reminder = has_reminder;
    }
    if let Some(category_id) = changes.category_id {
        todo.category_id = category_id;
    }
    if let Some(parent_id) = changes.parent_id {
        todo.parent_id = parent_id;
    }
    todo.updated_at = Utc::now();
}

/// In-memory implementation of TodoRepository (for development/testing)
///
/// Each mutation runs under a single write lock, which also covers the progress
/// recount after subtask changes.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTodoRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Category repository backed by the same tables
    pub fn categories(&self) -> InMemoryCategoryRepository {
        InMemoryCategoryRepository::with_store(self.store.clone())
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn create(&self, user_id: i32, input: CreateTodo) -> TodoResult<Todo> {
        let mut store = self.store.write().await;

        store.last_todo_id += 1;
        let now = Utc::now();
        let todo = Todo {
            id: store.last_todo_id,
            title: input.title,
            description: input.description,
            is_completed: false,
            priority: input.priority,
            due_date: input.due_date,
            has_reminder: input.has_reminder,
            progress: 0,
            user_id,
            category_id: input.category_id,
            parent_id: input.parent_id,
            created_at: now,
            updated_at: now,
            category: None,
            subtasks: Vec::new(),
        };
        let id = todo.id;
        store.todos.insert(id, todo);

        for subtask in input.subtasks {
            store.insert_subtask(id, subtask.title);
        }
        store.refresh_progress(id);

        tracing::info!(todo_id = id, user_id, "Created todo");
        Ok(store.hydrate(&store.todos[&id]))
    }

    async fn find(&self, id: i32) -> TodoResult<Option<Todo>> {
        let store = self.store.read().await;
        Ok(store.todos.get(&id).map(|t| store.hydrate(t)))
    }

    async fn owner(&self, id: i32) -> TodoResult<Option<i32>> {
        let store = self.store.read().await;
        Ok(store.todos.get(&id).map(|t| t.user_id))
    }

    async fn list(&self, user_id: i32, filter: TodoFilter) -> TodoResult<Vec<Todo>> {
        let store = self.store.read().await;
        Ok(store.select(|t| t.user_id == user_id && filter.matches(t)))
    }

    async fn update(&self, id: i32, changes: UpdateTodo) -> TodoResult<Todo> {
        let mut store = self.store.write().await;

        let todo = store.todos.get_mut(&id).ok_or(TodoError::NotFound(id))?;
        if !changes.is_empty() {
            apply_changes(todo, changes);
            tracing::info!(todo_id = id, "Updated todo");
        }

        Ok(store.hydrate(&store.todos[&id]))
    }

    async fn toggle(&self, id: i32) -> TodoResult<Todo> {
        let mut store = self.store.write().await;

        let todo = store.todos.get_mut(&id).ok_or(TodoError::NotFound(id))?;
        todo.is_completed = !todo.is_completed;
        todo.updated_at = Utc::now();

        Ok(store.hydrate(&store.todos[&id]))
    }

    async fn delete(&self, id: i32) -> TodoResult<()> {
        let mut store = self.store.write().await;

        if !store.remove_todo(id) {
            return Err(TodoError::NotFound(id));
        }
        tracing::info!(todo_id = id, "Deleted todo");
        Ok(())
    }

    async fn batch_delete(&self, user_id: i32, ids: Vec<i32>) -> TodoResult<u64> {
        let mut store = self.store.write().await;

        // Counted up front: a parent's cascade may remove children named in the batch
        let owned: HashSet<i32> = ids
            .into_iter()
            .filter(|id| store.todos.get(id).is_some_and(|t| t.user_id == user_id))
            .collect();
        for id in &owned {
            store.remove_todo(*id);
        }
        Ok(owned.len() as u64)
    }

    async fn batch_update(
        &self,
        user_id: i32,
        ids: Vec<i32>,
        changes: UpdateTodo,
    ) -> TodoResult<u64> {
        let mut store = self.store.write().await;

        let mut affected = 0;
        for todo in store.todos.values_mut() {
            if todo.user_id == user_id && ids.contains(&todo.id) {
                apply_changes(todo, changes.clone());
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn owns_category(&self, user_id: i32, category_id: i32) -> TodoResult<bool> {
        let store = self.store.read().await;
        Ok(store
            .categories
            .get(&category_id)
            .is_some_and(|c| c.user_id == user_id))
    }

    async fn find_subtask(&self, id: i32) -> TodoResult<Option<(SubTask, i32)>> {
        let store = self.store.read().await;
        Ok(store.subtasks.get(&id).and_then(|s| {
            store
                .todos
                .get(&s.todo_id)
                .map(|t| (s.clone(), t.user_id))
        }))
    }

    async fn create_subtask(&self, todo_id: i32, input: CreateSubTask) -> TodoResult<SubTask> {
        let mut store = self.store.write().await;

        if !store.todos.contains_key(&todo_id) {
            return Err(TodoError::NotFound(todo_id));
        }
        let subtask = store.insert_subtask(todo_id, input.title);
        store.refresh_progress(todo_id);

        tracing::info!(subtask_id = subtask.id, todo_id, "Created subtask");
        Ok(subtask)
    }

    async fn update_subtask(&self, id: i32, changes: UpdateSubTask) -> TodoResult<SubTask> {
        let mut store = self.store.write().await;

        let subtask = store
            .subtasks
            .get_mut(&id)
            .ok_or(TodoError::SubTaskNotFound(id))?;
        if let Some(title) = changes.title {
            subtask.title = title;
        }
        if let Some(is_completed) = changes.is_completed {
            subtask.is_completed = is_completed;
        }
        let updated = subtask.clone();
        store.refresh_progress(updated.todo_id);

        Ok(updated)
    }

    async fn toggle_subtask(&self, id: i32) -> TodoResult<SubTask> {
        let mut store = self.store.write().await;

        let subtask = store
            .subtasks
            .get_mut(&id)
            .ok_or(TodoError::SubTaskNotFound(id))?;
        subtask.is_completed = !subtask.is_completed;
        let updated = subtask.clone();
        store.refresh_progress(updated.todo_id);

        Ok(updated)
    }

    async fn delete_subtask(&self, id: i32) -> TodoResult<()> {
        let mut store = self.store.write().await;

        let removed = store
            .subtasks
            .remove(&id)
            .ok_or(TodoError::SubTaskNotFound(id))?;
        store.refresh_progress(removed.todo_id);

        tracing::info!(subtask_id = id, todo_id = removed.todo_id, "Deleted subtask");
        Ok(())
    }
}
