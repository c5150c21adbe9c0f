// Domain layer
pub mod collection;
pub mod template;

// Application layer
pub mod api;
pub mod server;

// Supporting modules
pub mod config;
