//! TechMatch - A marketplace backend for university patents
//!
//! This library provides the core functionality for the TechMatch platform:
//! patent listings with admin moderation, purchase interests, direct
//! messages, and an editorial content gateway.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
