pub mod auth;
pub mod classifier;
pub mod core;
pub mod directory;
pub mod main_module;
pub mod security;
pub mod tickets;
