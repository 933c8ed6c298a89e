//! RabbitMQ server configuration scenarios.
//!
//! Each scenario edits the `rabbitmq-server` property namespace of the broker
//! job, redeploys, and checks what the broker reports through
//! `rabbitmqctl`, `openssl s_client` or the management API.

use std::path::Path;

use anyhow::{bail, Result};
use rmq_core::{
    Credentials, HarnessResult, Manifest, Mapping, MappingExt, PropertySelector, Value,
    RABBITMQ_SERVER_NAMESPACE,
};
use rmq_remote::InstanceSelector;
use rmq_verify::{Check, CredentialSource, Expectation, Mutation, Probe, Scenario, Stage};

use crate::ssl_assets::SslAssets;

pub const ENVIRONMENT_COMMAND: &str = "sudo ERL_DIR=/var/vcap/packages/erlang/bin/ /var/vcap/packages/rabbitmq-server/bin/rabbitmqctl environment";
pub const SSL_OPTIONS_COMMAND: &str = "sudo ERL_DIR=/var/vcap/packages/erlang/bin/ /var/vcap/packages/rabbitmq-server/bin/rabbitmqctl eval 'application:get_env(rabbit, ssl_options).'";
pub const TLS_LISTENER: &str = "127.0.0.1:5671";
pub const TLS_VERSIONS: [&str; 3] = ["tlsv1.2", "tlsv1.1", "tlsv1"];

pub const NEW_ADMIN_USERNAME: &str = "newusername";
pub const NEW_ADMIN_PASSWORD: &str = "newpassword";
pub const DEFINED_VHOST: &str = "foobar";
pub const CHANGED_COOKIE: &str = "change-the-cookie";
pub const EXPECTED_NODE_COUNT: usize = 3;

/// `(name, summary)` of every scenario, in run order.
pub const SCENARIO_CATALOG: [(&str, &str); 5] = [
    (
        "defaults",
        "unset properties fall back to pause_minority, a relative disk limit and no ssl",
    ),
    (
        "properties",
        "disk threshold, partition handling, fd limit and management credentials are applied",
    ),
    (
        "ssl",
        "TLS listener serves certificates, then enforces peer verification",
    ),
    (
        "load_definitions",
        "vhosts listed in load_definitions exist after deploy",
    ),
    (
        "cookie",
        "every node rejoins the cluster after the erlang cookie changes",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where scenarios send remote diagnostics and which job they mutate.
pub struct SuiteTargets {
    pub rmq_instance: InstanceSelector,
    pub server: PropertySelector,
}

/// Resolves a name filter against the catalog; empty selects everything.
pub fn select_scenarios(filter: &[String]) -> Result<Vec<&'static str>> {
    if filter.is_empty() {
        return Ok(SCENARIO_CATALOG.iter().map(|(name, _)| *name).collect());
    }
    let mut selected = Vec::new();
    for wanted in filter {
        let wanted = wanted.trim();
        let Some((name, _)) = SCENARIO_CATALOG.iter().find(|(name, _)| *name == wanted) else {
            let known = SCENARIO_CATALOG
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", ");
            bail!("unknown scenario '{wanted}'; known scenarios: {known}");
        };
        if !selected.contains(name) {
            selected.push(*name);
        }
    }
    Ok(selected)
}

pub fn build_scenario(
    name: &str,
    targets: &SuiteTargets,
    ssl_assets_dir: &Path,
) -> Result<Scenario> {
    let scenario = match name {
        "defaults" => defaults_scenario(targets),
        "properties" => properties_scenario(targets),
        "ssl" => ssl_scenario(targets, &SslAssets::load(ssl_assets_dir)?),
        "load_definitions" => load_definitions_scenario(targets),
        "cookie" => cookie_scenario(targets),
        other => bail!("unknown scenario '{other}'"),
    };
    Ok(scenario)
}

fn server_namespace_mut<'a>(
    manifest: &'a mut Manifest,
    server: &PropertySelector,
) -> HarnessResult<&'a mut Mapping> {
    manifest
        .properties_mut(server)?
        .require_mapping_mut(RABBITMQ_SERVER_NAMESPACE)
}

/// Mutation of the broker's `rabbitmq-server` property namespace.
fn server_mutation<F>(description: &str, server: &PropertySelector, edit: F) -> Mutation
where
    F: Fn(&mut Mapping) -> HarnessResult<()> + Send + Sync + 'static,
{
    let server = server.clone();
    Mutation::new(description, move |manifest: &mut Manifest| {
        edit(server_namespace_mut(manifest, &server)?)
    })
}

fn environment_check(name: &str, targets: &SuiteTargets) -> Check {
    Check::new(
        name,
        Probe::remote_stdout(targets.rmq_instance.clone(), ENVIRONMENT_COMMAND),
    )
}

fn ssl_options_check(name: &str, targets: &SuiteTargets) -> Check {
    Check::new(
        name,
        Probe::remote_stdout(targets.rmq_instance.clone(), SSL_OPTIONS_COMMAND),
    )
}

pub fn tls_handshake_command(openssl_flag: &str) -> String {
    format!("openssl s_client -{openssl_flag} -connect {TLS_LISTENER}")
}

pub fn defaults_scenario(targets: &SuiteTargets) -> Scenario {
    let mutation = server_mutation(
        "remove partition handling, native clustering, disk threshold and ssl",
        &targets.server,
        |properties| {
            for key in [
                "cluster_partition_handling",
                "use_native_clustering_formation",
                "disk_alarm_threshold",
                "ssl",
            ] {
                properties.remove_value(key);
            }
            Ok(())
        },
    );
    Scenario::new("defaults").stage(
        Stage::new("unset properties")
            .mutate(mutation)
            .check(
                environment_check("partition handling defaults to pause_minority", targets)
                    .expect(Expectation::contains("{cluster_partition_handling,pause_minority}")),
            )
            .check(
                environment_check("disk free limit defaults to 40% of memory", targets)
                    .expect(Expectation::contains("{disk_free_limit,{mem_relative,0.4}}")),
            )
            .check(
                ssl_options_check("ssl options are unset", targets)
                    .expect(Expectation::contains("{ok,[]}")),
            ),
    )
}

pub fn properties_scenario(targets: &SuiteTargets) -> Scenario {
    let mutation = server_mutation(
        "set disk threshold, partition handling, fd limit and management credentials",
        &targets.server,
        |properties| {
            properties.set_value("disk_alarm_threshold", "20000000");
            properties.set_value("cluster_partition_handling", "pause_minority");
            properties.set_value("fd_limit", 350_000_u64);
            let management =
                properties.require_mapping_path_mut(&["administrators", "management"])?;
            management.set_value("username", NEW_ADMIN_USERNAME);
            management.set_value("password", NEW_ADMIN_PASSWORD);
            Ok(())
        },
    );
    Scenario::new("properties").stage(
        Stage::new("properties set")
            .mutate(mutation)
            .check(
                environment_check("disk free limit follows disk_alarm_threshold", targets)
                    .expect(Expectation::contains("{disk_free_limit,20000000}")),
            )
            .check(
                environment_check("partition handling is pause_minority", targets)
                    .expect(Expectation::contains("{cluster_partition_handling,pause_minority}")),
            )
            .check(
                Check::new(
                    "new management credentials are accepted",
                    Probe::http_get(
                        &["whoami"],
                        CredentialSource::Explicit(Credentials::new(
                            NEW_ADMIN_USERNAME,
                            NEW_ADMIN_PASSWORD,
                        )),
                    ),
                )
                .expect(Expectation::status(200)),
            )
            .check(
                Check::new(
                    "previous management credentials are rejected",
                    Probe::http_get(&["whoami"], CredentialSource::BaselineAdmin),
                )
                .expect(Expectation::status(401)),
            ),
    )
}

pub fn ssl_scenario(targets: &SuiteTargets, assets: &SslAssets) -> Scenario {
    let mut ssl = Mapping::new();
    ssl.set_value("key", assets.key.clone());
    ssl.set_value("cert", assets.cert.clone());
    ssl.set_value("cacert", assets.cacert.clone());
    ssl.set_value(
        "versions",
        TLS_VERSIONS
            .iter()
            .map(|version| Value::from(*version))
            .collect::<Vec<_>>(),
    );
    let configure = server_mutation(
        "configure ssl key, certificates and tls versions",
        &targets.server,
        move |properties| {
            properties.set_value("ssl", ssl.clone());
            Ok(())
        },
    );
    let verify = server_mutation(
        "enable peer verification with depth 10",
        &targets.server,
        |properties| {
            let ssl = properties.require_mapping_mut("ssl")?;
            ssl.set_value("verify", true);
            ssl.set_value("verification_depth", 10_u64);
            ssl.set_value("fail_if_no_peer_cert", true);
            Ok(())
        },
    );

    let mut configured = Stage::new("ssl configured").mutate(configure).check(
        ssl_options_check("verification and peer validation are off", targets)
            .expect(Expectation::contains("{verify,verify_none}"))
            .expect(Expectation::contains("{fail_if_no_peer_cert,false}"))
            .expect(Expectation::contains("{depth,5}")),
    );
    for (label, flag) in [("1.0", "tls1"), ("1.1", "tls1_1"), ("1.2", "tls1_2")] {
        configured = configured.check(
            Check::new(
                format!("TLS {label} handshake presents a certificate"),
                Probe::remote_stdout(targets.rmq_instance.clone(), tls_handshake_command(flag)),
            )
            .expect(Expectation::contains("BEGIN CERTIFICATE"))
            .expect(Expectation::contains("END CERTIFICATE")),
        );
    }

    Scenario::new("ssl").stage(configured).stage(
        Stage::new("verification and validation enabled")
            .mutate(verify)
            .check(
                ssl_options_check("peer verification is enforced", targets)
                    .expect(Expectation::contains("{verify,verify_peer}"))
                    .expect(Expectation::contains("{depth,10}"))
                    .expect(Expectation::contains("{fail_if_no_peer_cert,true}")),
            ),
    )
}

pub fn load_definitions_scenario(targets: &SuiteTargets) -> Scenario {
    let mut vhost = Mapping::new();
    vhost.set_value("name", DEFINED_VHOST);
    let mut definitions = Mapping::new();
    definitions.set_value("vhosts", vec![Value::Mapping(vhost)]);
    let mutation = server_mutation(
        "define vhost foobar",
        &targets.server,
        move |properties| {
            properties.set_value("load_definitions", definitions.clone());
            Ok(())
        },
    );
    Scenario::new("load_definitions").stage(
        Stage::new("vhost defined").mutate(mutation).check(
            Check::new(
                "defined vhost exists",
                Probe::http_get(&["vhosts", DEFINED_VHOST], CredentialSource::CurrentAdmin),
            )
            .expect(Expectation::status(200))
            .expect(Expectation::json_equals("/name", DEFINED_VHOST)),
        ),
    )
}

pub fn cookie_scenario(targets: &SuiteTargets) -> Scenario {
    let mutation = server_mutation("change the erlang cookie", &targets.server, |properties| {
        properties.set_value("cookie", CHANGED_COOKIE);
        Ok(())
    });
    Scenario::new("cookie").stage(
        Stage::new("cookie changed").mutate(mutation).check(
            Check::new(
                "all nodes come back",
                Probe::http_get(&["nodes"], CredentialSource::CurrentAdmin),
            )
            .expect(Expectation::status(200))
            .expect(Expectation::json_length("", EXPECTED_NODE_COUNT))
            .expect(Expectation::json_each(
                "",
                vec![
                    Expectation::json_equals("/running", true),
                    Expectation::json_names_include("/applications", "name", "rabbit"),
                    Expectation::json_names_include(
                        "/applications",
                        "name",
                        "rabbitmq_management",
                    ),
                ],
            )),
        ),
    )
}
