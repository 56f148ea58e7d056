//! Repository implementations for database access
//!
//! Each repository borrows the pool and runs every operation as one
//! atomic unit (a single statement or a transaction).

pub mod groups;
pub mod todos;

pub use groups::{GroupChanges, GroupRepo, GroupWithTodos, NewGroup, TodoGroup};
pub use todos::{NewTodo, Todo, TodoChanges, TodoRepo};
