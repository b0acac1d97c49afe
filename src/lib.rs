//! Document analysis API.
//!
//! Layers, from the bottom up:
//! - `models`, `schema` and `repository`: domain types and their SQLite storage
//! - `auth`, `storage` and `cognitive`: tokens and passwords, object storage,
//!   and the cloud document analyzer
//! - `validation`: CSV content checks
//! - `services`: use cases combining the above
//! - `server` and `cli`: the HTTP API and command line

pub mod auth;
pub mod cli;
pub mod cognitive;
pub mod config;
pub mod models;
pub mod repository;
pub mod schema;
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;
pub mod validation;
