use std::fmt;

use serde_yaml::Value;

use crate::manifest::{Manifest, PropertySelector};
use crate::mapping_ext::MappingExt;
use crate::{HarnessError, HarnessResult};

/// Property namespace the broker job nests its settings under.
pub const RABBITMQ_SERVER_NAMESPACE: &str = "rabbitmq-server";
/// Property namespace of the route registrar job fronting the management API.
pub const ROUTE_REGISTRAR_NAMESPACE: &str = "route_registrar";

const MANAGEMENT_ADMIN_PATH: [&str; 3] =
    [RABBITMQ_SERVER_NAMESPACE, "administrators", "management"];

#[derive(Clone, PartialEq, Eq)]
/// Basic-auth pair for the management API.
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Reads `rabbitmq-server.administrators.management.{username,password}`.
pub fn admin_credentials(
    manifest: &Manifest,
    selector: &PropertySelector,
) -> HarnessResult<Credentials> {
    let management = manifest
        .properties(selector)?
        .require_mapping_path(&MANAGEMENT_ADMIN_PATH)?;
    Ok(Credentials::new(
        management.require_str("username")?,
        management.require_str("password")?,
    ))
}

/// First URI of the first registered route, e.g. `pivotal-rabbitmq.example.com`.
pub fn management_route_uri(
    manifest: &Manifest,
    selector: &PropertySelector,
) -> HarnessResult<String> {
    let registrar = manifest
        .properties(selector)?
        .require_mapping(ROUTE_REGISTRAR_NAMESPACE)?;
    let route = registrar
        .require_sequence("routes")?
        .first()
        .and_then(Value::as_mapping)
        .ok_or_else(|| HarnessError::not_found(format!("routes of {selector}")))?;
    route
        .require_sequence("uris")?
        .first()
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| HarnessError::not_found(format!("route uris of {selector}")))
}
