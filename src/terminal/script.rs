//! Sequential command-list executor.
//!
//! Each step sends one stdin line, reads one response frame, and moves on.
//! By default the response is only logged; a step may opt into an output
//! pattern check, in which case a non-matching (or missing) response fails
//! the run. The stock retrain script sets no patterns, preserving the
//! terminal's fire-and-forget behavior: remote command failures are
//! invisible to the driver.

use std::time::Duration;

use regex::Regex;
use serde::Serialize;

use crate::config::RetrainConfig;
use crate::error::TerminalError;
use crate::terminal::session::TerminalSession;

/// One scripted terminal input.
#[derive(Debug, Clone)]
pub struct CommandStep {
    pub input: String,
    /// How long to wait for the response frame before moving on.
    pub read_timeout: Duration,
    /// Optional output verification; `None` means send-and-forget.
    pub expect: Option<Regex>,
}

impl CommandStep {
    pub fn new(input: impl Into<String>, read_timeout: Duration) -> Self {
        Self {
            input: input.into(),
            read_timeout,
            expect: None,
        }
    }

    pub fn with_expect(mut self, pattern: Regex) -> Self {
        self.expect = Some(pattern);
        self
    }
}

/// What one step sent and saw back.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub input: String,
    /// The single response frame read after the send, if any arrived
    /// within the timeout.
    pub response: Option<String>,
    /// `None` when the step had no expectation; otherwise whether the
    /// response matched.
    pub verified: Option<bool>,
}

/// Check a step's expectation against the frame it read.
pub(crate) fn check_expect(step: &CommandStep, response: Option<&str>) -> Option<bool> {
    step.expect
        .as_ref()
        .map(|pattern| response.is_some_and(|frame| pattern.is_match(frame)))
}

/// Drive the session through the steps in order. Terminal state (current
/// directory, active environment) is implicit in the step order.
pub async fn run_script(
    session: &mut TerminalSession,
    steps: &[CommandStep],
) -> Result<Vec<StepReport>, TerminalError> {
    let mut reports = Vec::with_capacity(steps.len());

    for (index, step) in steps.iter().enumerate() {
        tracing::info!(step = index, input = %step.input, "Sending terminal input");
        session.send_stdin(&step.input).await?;

        let response = session.read_frame(step.read_timeout).await?;
        match &response {
            Some(frame) => tracing::debug!(step = index, %frame, "Terminal responded"),
            None => tracing::debug!(step = index, "No response within timeout"),
        }

        let verified = check_expect(step, response.as_deref());
        if verified == Some(false) {
            return Err(TerminalError::ExpectFailed {
                step: index,
                pattern: step
                    .expect
                    .as_ref()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default(),
            });
        }

        reports.push(StepReport {
            input: step.input.clone(),
            response,
            verified,
        });
    }

    Ok(reports)
}

/// The fixed retrain sequence: switch into the environment, reinstall the
/// pinned package, re-execute the training notebook in place with an
/// unbounded execution timeout.
pub fn retrain_script(config: &RetrainConfig) -> Vec<CommandStep> {
    let timeout = config.read_timeout;
    vec![
        CommandStep::new(format!("cd {}", config.envs_dir), timeout),
        CommandStep::new(format!("source activate {}", config.environment), timeout),
        CommandStep::new(format!("pip uninstall {}", config.package), timeout),
        // Confirm the uninstall prompt.
        CommandStep::new("y", timeout),
        CommandStep::new(
            format!("pip install {}==={}", config.package, config.package_version),
            timeout,
        ),
        CommandStep::new(
            format!(
                "jupyter nbconvert --execute --to notebook --inplace {} \
                 --ExecutePreprocessor.kernel_name=python3 --ExecutePreprocessor.timeout=-1",
                config.notebook_path
            ),
            timeout,
        ),
    ]
}
