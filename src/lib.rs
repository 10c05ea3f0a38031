pub mod catalog;
pub mod config;
mod engine;
pub mod http;
pub mod sku;
pub mod telemetry;

pub use engine::{SkuEngine, SkuEngineBuilder};
