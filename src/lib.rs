// Ladder backend library: ranking core, persistence, and the HTTP surface.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod ladder;
pub mod metrics;
pub mod sets;
pub mod store;
