//! Redeploy transactions against a single shared deployment target.
//!
//! A scenario checks the deployment out, applies manifest mutations through
//! `redeploy`, and hands the checkout back through `restore`, which
//! redeploys the baseline captured at checkout time.

mod deployment;
mod orchestrator;

pub use deployment::{BaselineSource, Deployment, DeploymentCheckout};
pub use orchestrator::Orchestrator;
