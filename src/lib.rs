pub mod components;
pub mod config;
pub mod error;
pub mod server;
pub mod shutdown;
pub mod startup;
