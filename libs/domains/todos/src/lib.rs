//! Todos Domain
//!
//! Todos with nested subtasks, batch operations and per-user statistics, plus the
//! [`categories`] that todos are filed under. A todo's `progress` is derived from its
//! subtasks and recomputed on every subtask change.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← /todos, /todos/subtasks, /categories
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Ownership checks, batch rules, statistics
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access, progress recount (trait + in-memory and PostgreSQL)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_todos::{handlers, categories, InMemoryTodoRepository, TodoService};
//!
//! let todos = InMemoryTodoRepository::new();
//! let category_service = categories::CategoryService::new(todos.categories());
//! let todo_service = TodoService::new(todos);
//!
//! let todo_router = handlers::router(todo_service);
//! let category_router = categories::handlers::router(category_service);
//! ```

pub mod categories;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{TodoError, TodoResult};
pub use models::{
    BatchDelete, BatchResult, BatchUpdate, CreateSubTask, CreateTodo, Priority, PriorityStats,
    Statistics, SubTask, Todo, TodoFilter, UpdateSubTask, UpdateTodo, percentage,
};
pub use postgres::PgTodoRepository;
pub use repository::{InMemoryTodoRepository, TodoRepository};
pub use service::TodoService;
