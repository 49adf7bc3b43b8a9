use std::io;
use std::path::PathBuf;
use std::result;

use bulk_load_core::lookup::LookupError;
use bulk_load_core::settings::ConfigError;
use bulk_load_core::simulation::SimulationError;
use thiserror::Error;

pub type Result<T> = result::Result<T, RunnerError>;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error("{operation} failed: {message}")]
    Service {
        operation: &'static str,
        message: String,
    },
    #[error("{kind} '{name}' entered state FAILED")]
    ResourceFailed { kind: &'static str, name: String },
    #[error("{kind} '{name}' not ACTIVE after {attempts} checks (last state {last_state})")]
    PollExhausted {
        kind: &'static str,
        name: String,
        attempts: u32,
        last_state: String,
    },
    #[error("filesystem error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Attaches the remote operation name to the plain-string errors returned by
/// the service ports.
pub trait ServiceResultExt<T> {
    fn during(self, operation: &'static str) -> Result<T>;
}

impl<T> ServiceResultExt<T> for result::Result<T, String> {
    fn during(self, operation: &'static str) -> Result<T> {
        self.map_err(|message| RunnerError::Service { operation, message })
    }
}
