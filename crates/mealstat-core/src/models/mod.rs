//! Data models for messages, order records and configuration.

pub mod config;
pub mod message;
pub mod order;
