// src/lib.rs
pub mod config;
pub mod duplicate_resolver;
pub mod error;
pub mod group_assigner;
pub mod month_calendar;
pub mod schedule_parser;
pub mod schedule_state;
pub mod server;
pub mod shift_classifier;
pub mod storage;
pub mod views;
pub mod work_stats;


pub use error::{AppError, Result};
