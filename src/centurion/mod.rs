pub mod api;
pub mod command;
pub mod coordinator;
pub mod error;
pub mod status;
