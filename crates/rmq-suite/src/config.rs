use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rmq_bosh::{BoshCli, BoshCliConfig};
use rmq_core::{Manifest, PropertySelector};
use rmq_deploy::{BaselineSource, Deployment};
use rmq_http::{ManagementApiClient, ManagementEndpoint};
use rmq_remote::{InstanceSelector, RemoteEvidenceCollector};
use rmq_verify::{EndpointSource, ProbeEnvironment, ScenarioRunner};

use crate::cli::Cli;
use crate::output::OutputConfig;
use crate::scenarios::SuiteTargets;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Validated settings for one suite run.
pub struct SuiteConfig {
    pub bosh: BoshCliConfig,
    pub targets: SuiteTargets,
    pub route_registrar: PropertySelector,
    pub management_url: Option<String>,
    pub baseline_manifest: Option<PathBuf>,
    pub ssl_assets_dir: PathBuf,
    pub http_timeout_ms: u64,
    pub scenario_filter: Vec<String>,
    pub output: OutputConfig,
}

impl SuiteConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let Some(deployment) = cli
            .deployment
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        else {
            bail!("--deployment (or BOSH_DEPLOYMENT) is required");
        };
        let extra_args = shell_words::split(&cli.bosh_args)
            .with_context(|| format!("failed to parse --bosh-args '{}'", cli.bosh_args))?;
        let rmq_instance = cli
            .rmq_instance
            .parse::<InstanceSelector>()
            .context("invalid --rmq-instance")?;
        let management_url = cli
            .management_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        Ok(Self {
            bosh: BoshCliConfig {
                executable: cli.bosh_cli.clone(),
                deployment: deployment.to_string(),
                extra_args,
                deploy_timeout_ms: cli.deploy_timeout_ms,
                command_timeout_ms: cli.command_timeout_ms,
            },
            targets: SuiteTargets {
                rmq_instance,
                server: PropertySelector::new(cli.rmq_group.trim(), cli.rmq_job.trim()),
            },
            route_registrar: PropertySelector::new(
                cli.haproxy_group.trim(),
                cli.route_registrar_job.trim(),
            ),
            management_url,
            baseline_manifest: cli.baseline_manifest.clone(),
            ssl_assets_dir: cli.ssl_assets_dir.clone(),
            http_timeout_ms: cli.http_timeout_ms,
            scenario_filter: cli.scenario.clone(),
            output: OutputConfig {
                json: cli.json,
                report_path: cli.report_path.clone(),
            },
        })
    }

    pub fn endpoint_source(&self) -> Result<EndpointSource> {
        match &self.management_url {
            Some(url) => Ok(EndpointSource::Fixed(
                ManagementEndpoint::from_url(url).context("invalid --management-url")?,
            )),
            None => Ok(EndpointSource::RouteRegistrar(self.route_registrar.clone())),
        }
    }

    pub fn baseline_source(&self) -> Result<BaselineSource> {
        match &self.baseline_manifest {
            Some(path) => {
                let manifest = Manifest::load(path).with_context(|| {
                    format!("failed to load baseline manifest {}", path.display())
                })?;
                Ok(BaselineSource::Pinned(manifest))
            }
            None => Ok(BaselineSource::Current),
        }
    }

    /// Wires the bosh CLI in as both orchestrator and remote transport.
    pub fn build_runner(&self) -> Result<ScenarioRunner> {
        let bosh = Arc::new(BoshCli::new(self.bosh.clone()).context("invalid bosh settings")?);
        let deployment = Deployment::new(bosh.clone()).with_baseline(self.baseline_source()?);
        let http = ManagementApiClient::new(self.http_timeout_ms)
            .context("failed to create management api client")?;
        let environment = ProbeEnvironment::new(
            RemoteEvidenceCollector::new(bosh),
            http,
            self.endpoint_source()?,
            self.targets.server.clone(),
        );
        Ok(ScenarioRunner::new(deployment, environment))
    }
}
