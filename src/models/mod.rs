//! Data models for the ServiceNow JSONv2 API.
//!
//! This module contains the record types (incidents, change requests and
//! standard change templates), the [`Record`] trait tying each one to its
//! endpoint, and the `{"records": [...]}` response envelope.

mod change_request;
mod incident;
pub(crate) mod record;
mod standard_change_template;

pub use change_request::*;
pub use incident::*;
pub use record::{Record, Records};
pub use standard_change_template::*;
