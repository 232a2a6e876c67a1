pub mod access_control;
pub mod attendance_window;
pub mod clock;
