//! Green Grids host: simulated soil telemetry, a mocked soil-image analysis
//! workflow and report export, served to the dashboard over http.

pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod domain;
pub mod dropzone;
pub mod error;
pub mod report;
pub mod sampler;
pub mod server;
pub mod service;
pub mod telemetry;
