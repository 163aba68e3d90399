use std::future::Future;
use std::time::Duration;

use log::debug;

use crate::consts::DEFAULT_POLL_ATTEMPTS;
use crate::prelude::Result;
use crate::Error;

/// Attempt budget and spacing for remote status polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    /// Delay before the second status read
    pub interval: Duration,
    /// Each further delay is the previous one times this factor
    pub backoff_factor: u32,
    pub max_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_POLL_ATTEMPTS,
            interval: Duration::from_secs(3),
            backoff_factor: 1,
            max_interval: Duration::from_secs(30),
        }
    }
}

impl PollPolicy {
    /// No waiting between reads.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            interval: Duration::ZERO,
            backoff_factor: 1,
            max_interval: Duration::ZERO,
        }
    }

    /// Delay before read number `attempt` (1-based). The first read is not
    /// delayed.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = self.backoff_factor.max(1).saturating_pow(attempt - 2);
        self.interval
            .checked_mul(factor)
            .unwrap_or(self.max_interval)
            .min(self.max_interval.max(self.interval))
    }
}

/// What one status read reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation<T> {
    Pending { status: String },
    Ready(T),
    Failed { status: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState<T> {
    Submitted,
    Confirming { status: String, attempts: u32 },
    Confirmed(T),
    Failed { status: String, reason: String },
    AttemptsExhausted { attempts: u32 },
}

impl<T> PollState<T> {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollState::Confirmed(_) | PollState::Failed { .. } | PollState::AttemptsExhausted { .. }
        )
    }

    /// Fold the observation from read number `attempt` into the state.
    pub fn advance(self, observation: Observation<T>, attempt: u32, max_attempts: u32) -> Self {
        if self.is_terminal() {
            return self;
        }
        match observation {
            Observation::Ready(value) => PollState::Confirmed(value),
            Observation::Failed { status, reason } => PollState::Failed { status, reason },
            Observation::Pending { .. } if attempt >= max_attempts => {
                PollState::AttemptsExhausted { attempts: attempt }
            }
            Observation::Pending { status } => PollState::Confirming {
                status,
                attempts: attempt,
            },
        }
    }
}

/// Drive [`PollState`] with `observe` until it is terminal.
///
/// A transport error from `observe` ends the poll immediately.
pub async fn poll_until<T, F, Fut>(policy: &PollPolicy, id: &str, mut observe: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Observation<T>>>,
{
    let mut state = PollState::Submitted;
    let mut attempt = 0u32;
    loop {
        match state {
            PollState::Confirmed(value) => return Ok(value),
            PollState::Failed { status, reason } => {
                return Err(Error::RemoteTransactionFailed {
                    id: id.to_string(),
                    status,
                    reason,
                })
            }
            PollState::AttemptsExhausted { attempts } => {
                return Err(Error::ConfirmationTimeout {
                    id: id.to_string(),
                    attempts,
                })
            }
            PollState::Submitted | PollState::Confirming { .. } => {}
        }

        attempt += 1;
        let delay = policy.delay_before(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let observation = observe().await?;
        if let Observation::Pending { status } = &observation {
            debug!("remote {id}: attempt {attempt}/{} status {status}", policy.max_attempts);
        }
        state = state.advance(observation, attempt, policy.max_attempts);
    }
}
