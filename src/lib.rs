pub mod config;
pub mod error;
pub mod mcp;
pub mod observability;
pub mod session;
pub mod tools;
pub mod transport;
pub mod xml;
