//! storymap: local requirements management for user stories and MVPs.
//!
//! Both collections live in one versioned [`models::Document`] persisted
//! under a single key of an injected [`store::RecordStore`]. [`db::Database`]
//! is the typed accessor over that record. Ideas and the profile are side
//! records under their own keys.

pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod planning;
pub mod sample;
pub mod store;
