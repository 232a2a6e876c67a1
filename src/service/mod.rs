pub mod attendance;
pub mod summary;
