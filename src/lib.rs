//! Minigate - single-connection gateway server
//!
//! Core library: accepts one TCP connection at a time, turns the request
//! line into a gateway environment, hands it to an application and writes
//! back whatever the application declared.

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod server;
