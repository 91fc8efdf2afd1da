//! Listening socket and the sequential accept loop.

pub mod identity;
pub mod listener;

pub use identity::ServerIdentity;
pub use listener::Listener;
