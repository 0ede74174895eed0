//! # Cuckoo server
//!
//! The WebSocket game server for Cuckoo ("lowest card loses a life").
//! This crate ties the layers together: transport → protocol → rooms →
//! engine. Each accepted connection gets a handler task that decodes
//! [`cuckoo_protocol::ClientEvent`]s and routes them to room sessions;
//! everything a room broadcasts flows back out through a per-connection
//! writer task.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use cuckoo_server::CuckooServerBuilder;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let server = CuckooServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::ServerError;
pub use server::{CuckooServer, CuckooServerBuilder};
