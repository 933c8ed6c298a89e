//! Shared building blocks for the RabbitMQ deployment conformance harness.
//!
//! Holds the error taxonomy, the manifest tree with its job property
//! accessor, and the management credentials read from a manifest.

pub mod credentials;
pub mod error;
pub mod manifest;
pub mod mapping_ext;

pub use credentials::{
    admin_credentials, management_route_uri, Credentials, RABBITMQ_SERVER_NAMESPACE,
    ROUTE_REGISTRAR_NAMESPACE,
};
pub use error::{truncate_for_display, HarnessError, HarnessResult};
pub use manifest::{get_properties, get_properties_mut, Manifest, PropertySelector};
pub use mapping_ext::{value_kind, MappingExt};
pub use serde_yaml::{Mapping, Sequence, Value};
