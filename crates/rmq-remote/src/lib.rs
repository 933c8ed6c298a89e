//! Remote evidence collection: run diagnostics on deployed instances and pull
//! stdout out of the structured per-instance result tables.

mod collector;
mod result;
mod selector;

pub use collector::{RemoteEvidenceCollector, RemoteTransport};
pub use result::{extract_stdout, RemoteResult, RemoteRow, RemoteTable};
pub use selector::InstanceSelector;
