//! # servicenow
//!
//! A client for the ServiceNow JSONv2 web service, covering the ITSM tables
//! most integrations need: incidents, change requests and standard change
//! templates.
//!
//! ## Features
//!
//! - **Record operations**: List, get, create, update and delete on every table
//! - **Filters**: Typed `sysparm_query` clauses joined in caller order
//! - **Cancellation**: Every call takes a [`Context`] carrying a cancel signal
//!   and an optional deadline
//! - **Pluggable transport**: Anything implementing [`Transport`] can send
//!   requests; HTTP Basic auth is a decorator over it
//! - **Security**: Passwords are never logged, and `client_secret` is redacted
//!   from URLs that surface in errors
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`config`] - Configuration loading from environment variables
//! - [`context`] - Cancellation and deadlines for in-flight calls
//! - [`error`] - Error types with credential-safe messages
//! - [`transport`] - The request sender trait and the Basic auth decorator
//! - [`options`] - Query options and the filter expression encoder
//! - [`client`] - Request construction and execution
//! - [`services`] - Record operations shared by every table
//! - [`models`] - Record types for each table
//!
//! ## Configuration
//!
//! [`Config::from_env`] reads:
//!
//! - `SERVICENOW_BASE_URL`: Base URL of your instance
//! - `SERVICENOW_USERNAME`: User for HTTP Basic authentication
//! - `SERVICENOW_PASSWORD`: Password for HTTP Basic authentication
//!
//! Optional:
//! - `SERVICENOW_TIMEOUT_SECS`: Request timeout (default 30)
//! - `SERVICENOW_USER_AGENT`: User-Agent header value
//! - `RUST_LOG`: Log level (e.g., `servicenow=debug`)
//!
//! ## Example
//!
//! ```ignore
//! use std::time::Duration;
//!
//! use servicenow::options::{Filter, ListOptions};
//! use servicenow::{Config, Context, ServiceNowClient};
//!
//! async fn example() -> Result<(), servicenow::NowError> {
//!     let config = Config::from_env()?;
//!     let client = ServiceNowClient::from_config(&config)?;
//!     let ctx = Context::background().with_timeout(Duration::from_secs(10));
//!
//!     // Open high-priority incidents
//!     let opts = ListOptions::new()
//!         .with_filter(Filter::eq("active", "true"))
//!         .with_filter(Filter::eq("priority", "1"))
//!         .with_limit(10);
//!
//!     for incident in client.incidents().list(&ctx, opts).await? {
//!         println!("{:?}: {:?}", incident.number, incident.short_description);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod options;
pub mod services;
pub mod transport;

pub use client::{ResponseTarget, ServiceNowClient, Sink};
pub use config::Config;
pub use context::{Canceller, Context};
pub use error::{ContextError, NowError};
pub use transport::{BasicAuthTransport, Transport};
