//! API Module
//!
//! This module handles the JSON-RPC front door for submitting transactions.
//! It turns each request into a single transaction on the dispatcher.

mod server;
pub use server::Server;
