pub mod task;
pub mod user;

pub use task::{Task, TaskInput, TaskPriority, TaskStatus, TaskUpdate, TaskWithCreator};
pub use user::{PublicUser, Role, User};
