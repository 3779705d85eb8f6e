//! Condition scanner: the decoder's only suspension point
//!
//! [`Scanner::await_next`] pulls samples one at a time from a
//! [`SampleStream`] and discards them until one satisfies any of the given
//! [`Condition`]s. Edge terms compare against the immediately preceding
//! sample, which is the only history kept. Work per sample is constant.

use crate::runtime::{LogicSample, Receiver, WorkError, WorkResult};
use tracing::warn;

/// Capture channel the decoder looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// ZDA
    Data,
    /// ZCL
    Clock,
}

impl Channel {
    #[inline]
    fn level(self, sample: &LogicSample) -> bool {
        match self {
            Self::Data => sample.data,
            Self::Clock => sample.clock,
        }
    }
}

/// Per-channel edge or level constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinState {
    Rising,
    Falling,
    High,
    Low,
}

impl PinState {
    #[inline]
    fn holds(self, previous: Option<bool>, current: bool) -> bool {
        match self {
            Self::Rising => previous == Some(false) && current,
            Self::Falling => previous == Some(true) && !current,
            Self::High => current,
            Self::Low => !current,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinTerm {
    pub channel: Channel,
    pub state: PinState,
}

/// One alternative of a wait query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Every term must hold on the same sample
    Pins(&'static [PinTerm]),
    /// Satisfied by the n-th sample consumed by the wait
    Skip(u64),
}

impl Condition {
    /// Data line falls while the clock is high
    pub const START: Condition = Condition::Pins(&[
        PinTerm {
            channel: Channel::Data,
            state: PinState::Falling,
        },
        PinTerm {
            channel: Channel::Clock,
            state: PinState::High,
        },
    ]);

    pub const CLOCK_RISING: Condition = Condition::Pins(&[PinTerm {
        channel: Channel::Clock,
        state: PinState::Rising,
    }]);

    pub const CLOCK_FALLING: Condition = Condition::Pins(&[PinTerm {
        channel: Channel::Clock,
        state: PinState::Falling,
    }]);

    pub const SKIP_ONE: Condition = Condition::Skip(1);

    /// Non-empty, each channel constrained at most once, skip count >= 1
    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::Pins(terms) => {
                !terms.is_empty()
                    && terms.iter().enumerate().all(|(i, term)| {
                        terms[i + 1..].iter().all(|other| other.channel != term.channel)
                    })
            }
            Self::Skip(n) => *n >= 1,
        }
    }

    fn matches(&self, previous: Option<&LogicSample>, current: &LogicSample, consumed: u64) -> bool {
        match self {
            Self::Pins(terms) => terms.iter().all(|term| {
                term.state.holds(
                    previous.map(|p| term.channel.level(p)),
                    term.channel.level(current),
                )
            }),
            Self::Skip(n) => consumed == *n,
        }
    }
}

/// Pull-based source of capture samples
///
/// `Err(WorkError::Shutdown)` marks the end of the capture.
pub trait SampleStream {
    fn pull(&mut self) -> WorkResult<LogicSample>;
}

impl SampleStream for Receiver<'_, LogicSample> {
    fn pull(&mut self) -> WorkResult<LogicSample> {
        self.recv()
    }
}

/// Adapts any sample iterator (an in-memory capture) to [`SampleStream`]
pub struct IterStream<I> {
    iter: I,
}

impl<I: Iterator<Item = LogicSample>> IterStream<I> {
    pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            iter: iter.into_iter(),
        }
    }
}

impl<I: Iterator<Item = LogicSample>> SampleStream for IterStream<I> {
    fn pull(&mut self) -> WorkResult<LogicSample> {
        self.iter.next().ok_or(WorkError::Shutdown)
    }
}

/// Result of a wait: the qualifying sample and which alternative it met
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matched {
    pub sample: LogicSample,
    pub condition: usize,
}

/// Scanner state carried between waits
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    previous: Option<LogicSample>,
    consumed: u64,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume samples until one satisfies a condition; the first
    /// satisfied alternative in list order wins.
    ///
    /// # Panics
    /// Panics on an empty list or a malformed condition. Conditions are
    /// decoder constants, so this is a programming error.
    pub fn await_next<S: SampleStream + ?Sized>(
        &mut self,
        stream: &mut S,
        conditions: &[Condition],
    ) -> WorkResult<Matched> {
        assert!(!conditions.is_empty(), "wait needs at least one condition");
        for condition in conditions {
            assert!(condition.is_well_formed(), "malformed condition {:?}", condition);
        }

        let mut consumed_here = 0u64;
        loop {
            let sample = stream.pull()?;
            consumed_here += 1;
            self.consumed += 1;

            if let Some(previous) = self.previous
                && sample.index <= previous.index
            {
                warn!(
                    "Sample index not increasing: {} after {}",
                    sample.index, previous.index
                );
            }

            let matched = conditions
                .iter()
                .position(|c| c.matches(self.previous.as_ref(), &sample, consumed_here));
            self.previous = Some(sample);

            if let Some(condition) = matched {
                return Ok(Matched { sample, condition });
            }
        }
    }

    /// Forget history, as at the start of a new capture
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Total samples pulled since creation or the last reset
    pub fn samples_consumed(&self) -> u64 {
        self.consumed
    }
}
