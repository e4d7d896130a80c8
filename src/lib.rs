//! Unified client for Seldon-style model-serving deployments.
//!
//! One client reaches a deployment over two transports (REST, gRPC)
//! and two gateway topologies (ambassador-style direct ingress, and an
//! OAuth-secured broker), and can also address individual pipeline
//! stages directly for component-level testing.
//!
//! ```no_run
//! use seldon_client::{CallOptions, ClientConfig, SeldonClient};
//!
//! # async fn run() -> Result<(), seldon_client::ClientError> {
//! let client = SeldonClient::new(
//!     ClientConfig::builder()
//!         .deployment_name("mymodel")
//!         .namespace("prod")
//!         .build(),
//! );
//! let result = client.predict(None, None, CallOptions::default()).await?;
//! if !result.success {
//!     eprintln!("deployment unavailable: {}", result.msg);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Network and protocol failures never panic or error out of a call:
//! they come back inside the result envelope. Only call-site mistakes
//! (missing deployment name, malformed payloads, combinations outside
//! the routing table) return [`ClientError`].

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod proto;
pub mod response;
pub mod routing;
pub mod transport;

pub use client::SeldonClient;
pub use config::{CallOptions, ClientConfig, ClientConfigBuilder, Gateway, Transport};
pub use error::{ClientError, ClientResult};
pub use payload::{Payload, PayloadError};
pub use response::{CombineRequest, SeldonClientCombine, SeldonClientPrediction};
pub use routing::Operation;
