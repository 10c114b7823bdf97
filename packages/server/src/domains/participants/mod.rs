//! Participant datasets (read-only boundary).
//!
//! Seasons are maintained as CSV files by hand; the router only needs the
//! display names and team members to seed its name index.

pub mod loader;

pub use loader::{load_season, DatasetError, ParticipantRow};
