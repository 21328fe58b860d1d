#[macro_use]
extern crate lazy_static;
extern crate tracing;

pub mod cli;
pub mod dump;
pub mod logger;
pub mod report;
pub mod settings;
pub mod stats;
