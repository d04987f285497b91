pub mod config;
pub mod logging;

pub mod bench;
pub mod control;
pub mod download;
pub mod extract;
pub mod fetch;
pub mod listing;
pub mod pipeline;
pub mod session;
pub mod workpool;
