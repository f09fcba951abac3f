pub mod discovery;
pub mod events;
pub mod topics;
