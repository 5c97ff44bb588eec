//! Import progress polling.
//!
//! The portal exposes a JSON progress resource for a running import. The
//! harness polls it with a fixed short sleep until a terminal state shows up
//! or the attempt bound runs out.

use serde::Deserialize;
use tokio::time::sleep;

use crate::config::Timeouts;
use crate::error::{HarnessError, HarnessResult};
use crate::portal::session::PortalSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressState {
    Pending,
    Running,
    Complete,
    Incomplete,
    Failed,
    #[serde(other)]
    Unknown,
}

impl ProgressState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProgressState::Complete | ProgressState::Failed)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressReport {
    pub state: ProgressState,
    #[serde(default)]
    pub progress: f64,
}

/// Poll the progress endpoint until the import reports `COMPLETE`.
///
/// A `FAILED` state is an upload error; exhausting the attempt bound while
/// the import still reports `RUNNING` is a timeout.
pub async fn wait_for_completion(
    session: &PortalSession,
    progress_url: &str,
    timeouts: &Timeouts,
) -> HarnessResult<ProgressReport> {
    let attempts = timeouts.progress_attempts;
    for attempt in 0..attempts {
        let report: ProgressReport = session.get_json(progress_url).await?;
        tracing::debug!(
            "progress poll {}: {:?} ({}%)",
            attempt + 1,
            report.state,
            report.progress
        );

        match report.state {
            ProgressState::Complete => return Ok(report),
            ProgressState::Failed => {
                return Err(HarnessError::Upload(format!(
                    "import failed at {}% while polling {}",
                    report.progress, progress_url
                )));
            }
            _ => sleep(timeouts.progress_interval()).await,
        }
    }

    Err(HarnessError::Timeout {
        what: format!("import progress at {}", progress_url),
        attempts,
    })
}
