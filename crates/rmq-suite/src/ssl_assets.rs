use std::path::Path;

use anyhow::{Context, Result};

pub const SERVER_KEY_FILE: &str = "server_key.pem";
pub const SERVER_CERTIFICATE_FILE: &str = "server_certificate.pem";
pub const CA_CERTIFICATE_FILE: &str = "ca_certificate.pem";

#[derive(Clone, PartialEq, Eq)]
/// PEM material deployed into `rabbitmq-server.ssl`.
pub struct SslAssets {
    pub key: String,
    pub cert: String,
    pub cacert: String,
}

impl std::fmt::Debug for SslAssets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SslAssets")
            .field("key", &"<redacted>")
            .field("cert_bytes", &self.cert.len())
            .field("cacert_bytes", &self.cacert.len())
            .finish()
    }
}

impl SslAssets {
    pub fn load(dir: &Path) -> Result<Self> {
        Ok(Self {
            key: read_pem(dir, SERVER_KEY_FILE)?,
            cert: read_pem(dir, SERVER_CERTIFICATE_FILE)?,
            cacert: read_pem(dir, CA_CERTIFICATE_FILE)?,
        })
    }
}

fn read_pem(dir: &Path, file: &str) -> Result<String> {
    let path = dir.join(file);
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read ssl asset {}", path.display()))?;
    if !raw.contains("-----BEGIN ") {
        anyhow::bail!("ssl asset {} is not PEM encoded", path.display());
    }
    Ok(raw)
}
