pub mod assistant;
pub mod config;
pub mod controller;
pub mod errors;
pub mod export;
pub mod interview;
pub mod logging;
pub mod message;
pub mod orchestrator;
pub mod parser;
pub mod phase;
pub mod report;
pub mod retry;
pub mod store;
pub mod tracker;
pub mod ui;
