use std::time::Duration;

/// Everything the host hands over once it answers the handshake.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HostContext {
    pub environment_id: String,
    pub disabled: bool,
    /// Raw element configuration, validated later by the shell.
    pub config: Option<serde_json::Value>,
    /// Raw serialized value, parsed leniently by the shell.
    pub raw_value: Option<String>,
}

/// One attempt to reach the host. `None` means the host API has not appeared
/// yet.
pub trait HostProbe {
    fn probe(&mut self) -> Option<HostContext>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum HandshakePhase {
    AwaitingHost,
    Ready(HostContext),
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Ready(HostContext),
    /// Host not there yet; poll again after waiting `delay`.
    Retry { delay: Duration },
    GaveUp,
}

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(200);

/// Bounded host discovery.
///
/// A fixed number of probe attempts with a doubling delay between them,
/// never an open-ended loop. The caller owns the clock: on `Retry` it waits
/// the returned delay before polling again. Terminal phases are sticky;
/// further polls neither probe nor change state.
#[derive(Debug)]
pub struct HostHandshake {
    max_attempts: u32,
    initial_delay: Duration,
    attempts: u32,
    phase: HandshakePhase,
}

impl Default for HostHandshake {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_INITIAL_DELAY)
    }
}

impl HostHandshake {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self { max_attempts, initial_delay, attempts: 0, phase: HandshakePhase::AwaitingHost }
    }

    pub fn phase(&self) -> &HandshakePhase {
        &self.phase
    }

    pub fn poll<P: HostProbe>(&mut self, probe: &mut P) -> PollOutcome {
        match &self.phase {
            HandshakePhase::Ready(context) => return PollOutcome::Ready(context.clone()),
            HandshakePhase::Failed => return PollOutcome::GaveUp,
            HandshakePhase::AwaitingHost => {}
        }

        if let Some(context) = probe.probe() {
            self.phase = HandshakePhase::Ready(context.clone());
            return PollOutcome::Ready(context);
        }

        self.attempts += 1;
        if self.attempts >= self.max_attempts {
            log::warn!("host did not answer after {} attempts", self.attempts);
            self.phase = HandshakePhase::Failed;
            return PollOutcome::GaveUp;
        }

        // d, 2d, 4d, ... capped so the shift cannot overflow.
        let doubling = 1u32 << (self.attempts - 1).min(16);
        PollOutcome::Retry { delay: self.initial_delay.saturating_mul(doubling) }
    }
}
