pub mod aggregate;
pub mod cli;
pub mod config;
pub mod engine;
pub mod extract;
pub mod folder;
pub mod pipeline;
pub mod postprocess;
pub mod record;
pub mod render;
pub mod report;
pub mod util;
