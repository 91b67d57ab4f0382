pub mod attendance;
pub mod role;
pub mod setting;
pub mod task;
pub mod user;
