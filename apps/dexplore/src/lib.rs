//! # dexplore
//!
//! Async orchestration around `dexplore-core`: the exploration service
//! boundary, the client-side `Explorer`, the reference HTTP service and the
//! CLI that drives them.

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod explorer;
pub mod service;

pub use client::{ClientError, HttpService};
pub use config::{Config, LogFormat};
pub use explorer::Explorer;
pub use service::{ConvertedGraphs, ExplorationService, LocalService};
