pub mod analyzers;
pub mod charts;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod sample;
pub mod stats;
