pub mod compute;
pub mod config;
pub mod engine;
pub mod errors;
pub mod generate;
pub mod io;
pub mod observability;
pub mod runner;
pub mod timing;
