pub mod classifier;
pub mod config;
pub mod counter;
pub mod error;
pub mod pose;
pub mod session;
