//! Categories: user-defined groupings of todos.
//!
//! Shares [`TodoError`](crate::TodoError) and the todo tables with the parent module;
//! the in-memory repository can share its store with
//! [`InMemoryTodoRepository`](crate::InMemoryTodoRepository).

pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use models::{
    Category, CategoryWithTodos, CreateCategory, DEFAULT_COLOR, NewCategory, UpdateCategory,
};
pub use postgres::PgCategoryRepository;
pub use repository::{CategoryRepository, InMemoryCategoryRepository};
pub use service::CategoryService;
