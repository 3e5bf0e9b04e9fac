//! SQLite persistence for families, calendars, events and notifications

mod calendar_store;

pub use calendar_store::CalendarStore;
