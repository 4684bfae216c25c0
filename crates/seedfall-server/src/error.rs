//! Exit-code mapping for the host shell. The core engine's error taxonomy
//! lives in the library crates; this just decides what process exit code
//! each failure maps to at the binary boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to bind listener on port {port}: {source}")]
    Bind { port: u16, #[source] source: std::io::Error },
    #[error("failed to read save file from disk: {0}")]
    ReadSave(#[source] std::io::Error),
    #[error("save envelope rejected: {0}")]
    MalformedSave(#[from] seedfall_sim::save::SaveError),
    #[error("terrain generation failed: {0}")]
    Generation(String),
}

impl HostError {
    pub fn exit_code(&self) -> i32 {
        match self {
            HostError::Bind { .. } => 1,
            HostError::ReadSave(_) => 2,
            HostError::MalformedSave(seedfall_sim::save::SaveError::IncompatibleVersion { .. }) => 3,
            HostError::MalformedSave(_) => 2,
            HostError::Generation(_) => 4,
        }
    }
}
