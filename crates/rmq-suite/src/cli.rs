use std::path::PathBuf;

use clap::Parser;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "rmq-suite",
    about = "Mutates a BOSH-deployed RabbitMQ cluster, checks the resulting broker configuration and restores the baseline manifest",
    version
)]
/// Command line surface of the RabbitMQ server configuration suite.
pub struct Cli {
    #[arg(
        long = "bosh-cli",
        env = "RMQ_SUITE_BOSH_CLI",
        default_value = "bosh",
        help = "bosh executable used for manifest, deploy and ssh"
    )]
    pub bosh_cli: String,

    #[arg(
        long,
        env = "BOSH_DEPLOYMENT",
        help = "Name of the RabbitMQ deployment under test"
    )]
    pub deployment: Option<String>,

    #[arg(
        long = "bosh-args",
        env = "RMQ_SUITE_BOSH_ARGS",
        default_value = "",
        allow_hyphen_values = true,
        help = "Extra global bosh flags, shell-quoted, e.g. \"--environment vbox --client admin\""
    )]
    pub bosh_args: String,

    #[arg(
        long = "rmq-instance",
        env = "RMQ_SUITE_RMQ_INSTANCE",
        default_value = "rmq/0",
        help = "Instance that remote diagnostics run on, as <group>/<index-or-id>"
    )]
    pub rmq_instance: String,

    #[arg(
        long = "rmq-group",
        env = "RMQ_SUITE_RMQ_GROUP",
        default_value = "rmq",
        help = "Instance group running the rabbitmq-server job"
    )]
    pub rmq_group: String,

    #[arg(
        long = "rmq-job",
        env = "RMQ_SUITE_RMQ_JOB",
        default_value = "rabbitmq-server",
        help = "Job whose properties hold the broker settings"
    )]
    pub rmq_job: String,

    #[arg(
        long = "haproxy-group",
        env = "RMQ_SUITE_HAPROXY_GROUP",
        default_value = "haproxy",
        help = "Instance group running the route registrar for the management API"
    )]
    pub haproxy_group: String,

    #[arg(
        long = "route-registrar-job",
        env = "RMQ_SUITE_ROUTE_REGISTRAR_JOB",
        default_value = "route_registrar",
        help = "Job whose properties list the management API routes"
    )]
    pub route_registrar_job: String,

    #[arg(
        long = "management-url",
        env = "RMQ_SUITE_MANAGEMENT_URL",
        help = "Management API base URL; discovered from the route registrar when unset"
    )]
    pub management_url: Option<String>,

    #[arg(
        long = "baseline-manifest",
        env = "RMQ_SUITE_BASELINE_MANIFEST",
        help = "Manifest restored after every scenario; defaults to the manifest deployed at checkout"
    )]
    pub baseline_manifest: Option<PathBuf>,

    #[arg(
        long = "ssl-assets-dir",
        env = "RMQ_SUITE_SSL_ASSETS_DIR",
        default_value = "assets",
        help = "Directory holding server_key.pem, server_certificate.pem and ca_certificate.pem"
    )]
    pub ssl_assets_dir: PathBuf,

    #[arg(
        long = "deploy-timeout-ms",
        env = "RMQ_SUITE_DEPLOY_TIMEOUT_MS",
        default_value_t = 1_800_000,
        value_parser = parse_positive_u64,
        help = "Timeout for one bosh deploy"
    )]
    pub deploy_timeout_ms: u64,

    #[arg(
        long = "command-timeout-ms",
        env = "RMQ_SUITE_COMMAND_TIMEOUT_MS",
        default_value_t = 300_000,
        value_parser = parse_positive_u64,
        help = "Timeout for bosh manifest and bosh ssh"
    )]
    pub command_timeout_ms: u64,

    #[arg(
        long = "http-timeout-ms",
        env = "RMQ_SUITE_HTTP_TIMEOUT_MS",
        default_value_t = 30_000,
        value_parser = parse_positive_u64,
        help = "Timeout for one management API request"
    )]
    pub http_timeout_ms: u64,

    #[arg(
        long = "scenario",
        env = "RMQ_SUITE_SCENARIOS",
        value_delimiter = ',',
        help = "Run only these scenarios (comma separated); all scenarios when unset"
    )]
    pub scenario: Vec<String>,

    #[arg(long, help = "Print the scenario catalog and exit")]
    pub list: bool,

    #[arg(long, help = "Print the suite report as JSON instead of text")]
    pub json: bool,

    #[arg(
        long = "report-path",
        env = "RMQ_SUITE_REPORT_PATH",
        help = "Also write the JSON suite report to this file"
    )]
    pub report_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{parse_positive_u64, Cli};

    #[test]
    fn unit_parse_positive_u64_rejects_zero_and_garbage() {
        assert_eq!(parse_positive_u64("30000"), Ok(30_000));
        assert!(parse_positive_u64("0").is_err());
        assert!(parse_positive_u64("-5").is_err());
        assert!(parse_positive_u64("soon").is_err());
    }

    #[test]
    fn unit_defaults_match_standard_deployment_layout() {
        let cli = Cli::try_parse_from(["rmq-suite", "--deployment", "cf-rabbitmq"]).expect("cli");
        assert_eq!(cli.deployment.as_deref(), Some("cf-rabbitmq"));
        assert_eq!(cli.bosh_cli, "bosh");
        assert_eq!(cli.rmq_instance, "rmq/0");
        assert_eq!(cli.rmq_group, "rmq");
        assert_eq!(cli.rmq_job, "rabbitmq-server");
        assert_eq!(cli.haproxy_group, "haproxy");
        assert_eq!(cli.route_registrar_job, "route_registrar");
        assert!(cli.scenario.is_empty());
        assert!(!cli.list);
        assert!(!cli.json);
    }

    #[test]
    fn functional_scenario_filter_and_timeouts_parse() {
        let cli = Cli::try_parse_from([
            "rmq-suite",
            "--deployment",
            "cf-rabbitmq",
            "--scenario",
            "ssl,cookie",
            "--deploy-timeout-ms",
            "600000",
            "--bosh-args",
            "--environment vbox",
            "--json",
        ])
        .expect("cli");
        assert_eq!(cli.scenario, vec!["ssl".to_string(), "cookie".to_string()]);
        assert_eq!(cli.deploy_timeout_ms, 600_000);
        assert_eq!(cli.bosh_args, "--environment vbox");
        assert!(cli.json);
    }

    #[test]
    fn regression_zero_timeout_is_rejected_at_parse_time() {
        let error = Cli::try_parse_from(["rmq-suite", "--http-timeout-ms", "0"])
            .expect_err("zero timeout");
        assert!(error.to_string().contains("greater than 0"));
    }
}
