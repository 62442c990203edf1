//! Character LCD controllers.
pub mod hd44780;
