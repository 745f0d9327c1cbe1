//! Communication coaching service.
//!
//! Turns a hosted video (or a pasted transcript) into a structured coaching
//! report. The API server records and queues requests; the worker binary runs
//! the extraction fallback chain and the Gemini analysis for each queued job.

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;
