//! Local store repositories.

pub mod attendance;
pub mod connection;
pub mod exams;
pub mod messages;
pub mod performance;
pub mod schedule;
pub mod schools;
pub mod snapshot;
pub mod students;
pub mod terms;
pub mod users;

pub use connection::{TableCounts, connect, create_schema, get_table_counts, test_connection};
