pub mod config;
pub mod context;
pub mod environment;
pub mod input;
