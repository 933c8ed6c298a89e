use reqwest::Url;
use rmq_core::{management_route_uri, HarnessError, HarnessResult, Manifest, PropertySelector};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Base URL of the management API, e.g. `http://pivotal-rabbitmq.example.com`.
pub struct ManagementEndpoint {
    base: Url,
}

impl ManagementEndpoint {
    pub fn from_url(raw: &str) -> HarnessResult<Self> {
        let base = Url::parse(raw.trim()).map_err(|error| {
            HarnessError::InvalidInput(format!("invalid management url '{raw}': {error}"))
        })?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(HarnessError::InvalidInput(format!(
                "invalid management url '{raw}': expected an http(s) base url"
            )));
        }
        Ok(Self { base })
    }

    /// Discovers the endpoint from the route registrar job of `selector`.
    pub fn from_manifest(manifest: &Manifest, selector: &PropertySelector) -> HarnessResult<Self> {
        let uri = management_route_uri(manifest, selector)?;
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return Self::from_url(&uri);
        }
        Self::from_url(&format!("http://{uri}"))
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// `<base>/api/<segments...>`, each segment percent-encoded.
    pub fn api_url(&self, segments: &[&str]) -> String {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url.to_string()
    }
}
