pub mod format;
pub mod popup;

pub use format::{format_date, format_time};
pub use popup::{PopupLayout, adjust_position, adjust_position_with};
