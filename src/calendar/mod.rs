pub mod event;
pub mod position;

pub use event::{CalendarEvent, EventPatch, generate_id};
pub use position::{PopupElement, Position, Size, Viewport};
