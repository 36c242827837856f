pub mod access;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod events;
pub mod export;
pub mod messaging;
pub mod models;
pub mod remote;
pub mod stats;
pub mod store;
pub mod sync;
pub mod timetable;

pub use error::{AppError, Result};
