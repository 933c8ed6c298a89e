//! `bosh` CLI adapter: fetches and deploys manifests and runs `bosh ssh`
//! diagnostics for the conformance harness.

mod bosh_cli;
mod process;

pub use bosh_cli::{BoshCli, BoshCliConfig};
