//! Sea-ORM entities for the todo tables

pub mod category;
pub mod subtask;
pub mod todo;
