pub mod config;
pub mod manager;
pub mod process;
pub mod scheduler;
