//! # Adapters
//!
//! Client-side implementation of the coordinator's transport port.

pub mod tcp_transport;

pub use tcp_transport::TcpTransport;
