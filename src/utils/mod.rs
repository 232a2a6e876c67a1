pub mod attendance_cache;
pub mod change_feed;
