use std::fmt;

use rmq_core::{
    admin_credentials, Credentials, HarnessError, HarnessResult, Manifest, PropertySelector,
};
use rmq_deploy::DeploymentCheckout;
use rmq_http::{ManagementApiClient, ManagementEndpoint};
use rmq_remote::{InstanceSelector, RemoteEvidenceCollector};

use crate::expectation::Evidence;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Which management credentials an HTTP probe authenticates with.
pub enum CredentialSource {
    /// Admin pair from the manifest currently deployed.
    CurrentAdmin,
    /// Admin pair from the baseline captured before the scenario mutated anything.
    BaselineAdmin,
    Explicit(Credentials),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// How the management API base URL is found.
pub enum EndpointSource {
    Fixed(ManagementEndpoint),
    /// Read from the route registrar job of the current manifest.
    RouteRegistrar(PropertySelector),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where a check's evidence comes from.
pub enum Probe {
    RemoteStdout {
        instance: InstanceSelector,
        command: String,
    },
    /// `GET <endpoint>/api/<segments...>`.
    HttpGet {
        segments: Vec<String>,
        credentials: CredentialSource,
    },
}

impl Probe {
    pub fn remote_stdout(instance: InstanceSelector, command: impl Into<String>) -> Self {
        Self::RemoteStdout {
            instance,
            command: command.into(),
        }
    }

    pub fn http_get(segments: &[&str], credentials: CredentialSource) -> Self {
        Self::HttpGet {
            segments: segments.iter().map(|segment| segment.to_string()).collect(),
            credentials,
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Probe::RemoteStdout { instance, command } => write!(f, "ssh {instance}: {command}"),
            Probe::HttpGet {
                segments,
                credentials,
            } => {
                let auth = match credentials {
                    CredentialSource::CurrentAdmin => "current admin".to_string(),
                    CredentialSource::BaselineAdmin => "baseline admin".to_string(),
                    CredentialSource::Explicit(pair) => format!("user {}", pair.username),
                };
                write!(f, "GET /api/{} as {auth}", segments.join("/"))
            }
        }
    }
}

#[derive(Clone)]
/// Collaborators a probe needs to turn into evidence.
pub struct ProbeEnvironment {
    remote: RemoteEvidenceCollector,
    http: ManagementApiClient,
    endpoint: EndpointSource,
    admin: PropertySelector,
}

impl ProbeEnvironment {
    /// `admin` selects the job whose properties hold the management admin pair.
    pub fn new(
        remote: RemoteEvidenceCollector,
        http: ManagementApiClient,
        endpoint: EndpointSource,
        admin: PropertySelector,
    ) -> Self {
        Self {
            remote,
            http,
            endpoint,
            admin,
        }
    }

    pub async fn collect(
        &self,
        probe: &Probe,
        checkout: &DeploymentCheckout,
    ) -> HarnessResult<Evidence> {
        match probe {
            Probe::RemoteStdout { instance, command } => self
                .remote
                .collect_stdout(instance, command)
                .await
                .map(Evidence::Text),
            Probe::HttpGet {
                segments,
                credentials,
            } => {
                let mut current: Option<Manifest> = None;
                let endpoint = match &self.endpoint {
                    EndpointSource::Fixed(endpoint) => endpoint.clone(),
                    EndpointSource::RouteRegistrar(selector) => {
                        let manifest = load_current(&mut current, checkout).await?;
                        ManagementEndpoint::from_manifest(manifest, selector)?
                    }
                };
                let credentials = match credentials {
                    CredentialSource::CurrentAdmin => {
                        let manifest = load_current(&mut current, checkout).await?;
                        admin_credentials(manifest, &self.admin)?
                    }
                    CredentialSource::BaselineAdmin => {
                        admin_credentials(checkout.baseline(), &self.admin)?
                    }
                    CredentialSource::Explicit(pair) => pair.clone(),
                };
                let segments = segments.iter().map(String::as_str).collect::<Vec<_>>();
                let url = endpoint.api_url(&segments);
                self.http
                    .get_with(&url, &credentials)
                    .await
                    .map(Evidence::Http)
            }
        }
    }
}

async fn load_current<'a>(
    slot: &'a mut Option<Manifest>,
    checkout: &DeploymentCheckout,
) -> HarnessResult<&'a Manifest> {
    if slot.is_none() {
        *slot = Some(checkout.current_manifest().await?);
    }
    slot.as_ref()
        .ok_or_else(|| HarnessError::not_found("current manifest"))
}
