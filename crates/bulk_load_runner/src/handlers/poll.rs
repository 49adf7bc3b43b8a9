use std::time::Duration;

use bulk_load_core::status::ResourceState;
use tracing::{debug, warn};

use crate::adapters::pacing::Pause;
use crate::error::{Result, RunnerError, ServiceResultExt};

/// Delays between remote calls. Tests run with [`Pacing::immediate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    pub settle_delay: Duration,
    pub job_submit_gap: Duration,
    pub job_poll_interval: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_poll_attempts: 600,
            settle_delay: Duration::from_secs(5),
            job_submit_gap: Duration::from_secs(1),
            job_poll_interval: Duration::from_secs(5),
        }
    }
}

impl Pacing {
    pub fn immediate() -> Self {
        Self {
            poll_interval: Duration::ZERO,
            settle_delay: Duration::ZERO,
            job_submit_gap: Duration::ZERO,
            job_poll_interval: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Checks `probe` until it reports ACTIVE, pausing `poll_interval` between
/// checks. FAILED aborts immediately; so does running out of attempts.
pub fn wait_until_active(
    kind: &'static str,
    name: &str,
    operation: &'static str,
    pacing: &Pacing,
    pause: &dyn Pause,
    mut probe: impl FnMut() -> std::result::Result<ResourceState, String>,
) -> Result<()> {
    let mut last_state = String::from("UNKNOWN");
    for attempt in 1..=pacing.max_poll_attempts {
        let state = probe().during(operation)?;
        if state.is_active() {
            debug!(
                component = "poll",
                event = "resource_active",
                kind,
                name,
                attempts = attempt,
            );
            return Ok(());
        }
        if state.is_failed() {
            warn!(component = "poll", event = "resource_failed", kind, name);
            return Err(RunnerError::ResourceFailed {
                kind,
                name: name.to_string(),
            });
        }
        last_state = state.to_string();
        pause.pause(pacing.poll_interval);
    }

    Err(RunnerError::PollExhausted {
        kind,
        name: name.to_string(),
        attempts: pacing.max_poll_attempts,
        last_state,
    })
}
