//! HTTP evidence collection against the broker management API.

mod client;
mod endpoint;
mod evidence;

pub use client::ManagementApiClient;
pub use endpoint::ManagementEndpoint;
pub use evidence::{HttpBody, HttpEvidence};
