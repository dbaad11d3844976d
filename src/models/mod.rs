pub mod todo;
pub mod user;

pub use todo::{
    CreateTodoRequest, SortKey, SortOrder, Todo, TodoListQuery, TodoPriority, UpdateTodoRequest,
};
pub use user::User;
