//! Calendar event model

mod types;

pub use types::{Event, EventStatus};
