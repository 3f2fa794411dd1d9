//! Periodic CPU sampling.
//!
//! A [`Sampler`] runs on its own thread. It reads the aggregate CPU counters
//! once to establish a baseline, then on every tick reads them again and
//! publishes the difference to the previous reading. The consumer side is a
//! [`CpuStream`] (a plain iterator); the producer side is controlled through
//! a [`SamplerHandle`].
//!
//! ```text
//!   start()            tick              tick              cancel()
//!     │                 │                 │                   │
//!  baseline ──────► read, delta ────► read, delta ────►    Stopped
//!                       │                 │
//!                   CpuStream         CpuStream
//! ```
//!
//! Ticks are scheduled against absolute deadlines, so a slow read does not
//! push every later tick back. If the loop falls more than one interval
//! behind, the missed ticks are skipped rather than fired back to back.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, trace, warn};

use crate::collector::procfs::{CollectError, SystemCollector};
use crate::collector::traits::FileSystem;
use crate::model::Cpu;
use crate::rates::Delta;

/// How often a waiting sampler thread checks for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Source of aggregate CPU counters.
pub trait CpuSource: Send + 'static {
    fn read_cpu(&mut self) -> Result<Cpu, CollectError>;
}

impl<F: FileSystem + 'static> CpuSource for SystemCollector<F> {
    fn read_cpu(&mut self) -> Result<Cpu, CollectError> {
        self.collect_cpu()
    }
}

/// What the sampler does when the consumer has not taken the previous delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backpressure {
    /// Wait for the consumer. Cancellation is still honored while waiting.
    #[default]
    Block,
    /// Discard the new delta.
    Drop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    pub interval: Duration,
    pub backpressure: Backpressure,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl SamplerConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            backpressure: Backpressure::default(),
        }
    }

    pub fn with_backpressure(mut self, backpressure: Backpressure) -> Self {
        self.backpressure = backpressure;
        self
    }

    /// Rejects settings the sampling loop cannot run with.
    pub fn validate(&self) -> Result<(), CollectError> {
        if self.interval.is_zero() {
            return Err(CollectError::Config(
                "sampling interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lifecycle of a sampler thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    /// Started but the thread has not run yet.
    Idle,
    Sampling,
    Stopped,
}

impl SamplerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SamplerState::Idle,
            1 => SamplerState::Sampling,
            _ => SamplerState::Stopped,
        }
    }
}

/// State shared between the sampler thread, its handle and its stream.
#[derive(Debug)]
struct Shared {
    cancelled: AtomicBool,
    state: AtomicU8,
}

impl Shared {
    fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            state: AtomicU8::new(SamplerState::Idle as u8),
        }
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: SamplerState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    fn state(&self) -> SamplerState {
        SamplerState::from_u8(self.state.load(Ordering::SeqCst))
    }
}

/// A CPU sampler that has not been started yet.
pub struct Sampler<S: CpuSource> {
    source: S,
    config: SamplerConfig,
}

impl<S: CpuSource> Sampler<S> {
    pub fn new(source: S, config: SamplerConfig) -> Self {
        Self { source, config }
    }

    /// Spawns the sampling thread.
    ///
    /// Each sampler owns its source and baseline, so any number of samplers
    /// can run side by side.
    pub fn start(self) -> Result<(CpuStream, SamplerHandle), CollectError> {
        self.config.validate()?;

        let (tx, rx) = mpsc::sync_channel(1);
        let shared = Arc::new(Shared::new());

        let thread_shared = Arc::clone(&shared);
        let Sampler { source, config } = self;
        let thread = thread::Builder::new()
            .name("cpu-sampler".to_string())
            .spawn(move || run(source, config, tx, &thread_shared))?;

        debug!(
            "CPU sampler started: interval={:?}, backpressure={:?}",
            config.interval, config.backpressure
        );

        let stream = CpuStream {
            rx,
            shared: Arc::clone(&shared),
        };
        let handle = SamplerHandle {
            shared,
            thread: Some(thread),
        };
        Ok((stream, handle))
    }
}

fn run<S: CpuSource>(mut source: S, config: SamplerConfig, tx: SyncSender<Cpu>, shared: &Shared) {
    shared.set_state(SamplerState::Sampling);

    let mut baseline = match source.read_cpu() {
        Ok(cpu) => Some(cpu),
        Err(e) => {
            warn!("Initial CPU sample failed, waiting for next tick: {}", e);
            None
        }
    };

    let mut deadline = Instant::now().checked_add(config.interval);
    while sleep_until(deadline, shared) {
        deadline = deadline.and_then(|d| next_deadline(d, config.interval, Instant::now()));

        let cpu = match source.read_cpu() {
            Ok(cpu) => cpu,
            Err(e) => {
                warn!("CPU sample failed, skipping tick: {}", e);
                continue;
            }
        };

        let Some(previous) = baseline.replace(cpu) else {
            debug!("CPU sampler baseline established");
            continue;
        };

        if shared.is_cancelled() || !publish(&tx, cpu.delta(&previous), config.backpressure, shared)
        {
            break;
        }
    }

    shared.set_state(SamplerState::Stopped);
    debug!("CPU sampler stopped");
}

/// First tick after `now` on the grid `deadline + k * interval`.
///
/// `None` when the tick is not representable as an `Instant`. `interval`
/// must be non-zero.
fn next_deadline(deadline: Instant, interval: Duration, now: Instant) -> Option<Instant> {
    let mut next = deadline.checked_add(interval)?;
    while next <= now {
        trace!("CPU sampler behind schedule, skipping a tick");
        next = next.checked_add(interval)?;
    }
    Some(next)
}

/// Sleeps until `deadline` in short chunks. Returns false once cancelled.
///
/// A `None` deadline never arrives: only cancellation ends the wait.
fn sleep_until(deadline: Option<Instant>, shared: &Shared) -> bool {
    loop {
        if shared.is_cancelled() {
            return false;
        }
        let Some(deadline) = deadline else {
            thread::sleep(POLL_INTERVAL);
            continue;
        };
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining == Duration::ZERO {
            return true;
        }
        thread::sleep(remaining.min(POLL_INTERVAL));
    }
}

/// Hands a delta to the consumer. Returns false when the loop should stop.
fn publish(tx: &SyncSender<Cpu>, delta: Cpu, policy: Backpressure, shared: &Shared) -> bool {
    let mut pending = delta;
    loop {
        match tx.try_send(pending) {
            Ok(()) => return true,
            Err(TrySendError::Disconnected(_)) => {
                debug!("CPU stream dropped by consumer");
                return false;
            }
            Err(TrySendError::Full(cpu)) => match policy {
                Backpressure::Drop => {
                    trace!("Consumer busy, dropping CPU delta");
                    return true;
                }
                Backpressure::Block => {
                    if shared.is_cancelled() {
                        return false;
                    }
                    pending = cpu;
                    thread::sleep(POLL_INTERVAL);
                }
            },
        }
    }
}

/// Consumer side of a sampler: yields one CPU delta per tick.
///
/// Iteration ends once the sampler stops. Dropping the stream stops the
/// sampler.
#[derive(Debug)]
pub struct CpuStream {
    rx: Receiver<Cpu>,
    shared: Arc<Shared>,
}

impl CpuStream {
    /// Waits up to `timeout` for the next delta.
    ///
    /// Returns `Err(RecvTimeoutError::Disconnected)` once the sampler has
    /// stopped and every published delta has been taken.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Cpu, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Returns the next delta if one is already waiting.
    pub fn try_next(&self) -> Option<Cpu> {
        self.rx.try_recv().ok()
    }
}

impl Iterator for CpuStream {
    type Item = Cpu;

    fn next(&mut self) -> Option<Cpu> {
        self.rx.recv().ok()
    }
}

impl Drop for CpuStream {
    fn drop(&mut self) {
        self.shared.cancel();
    }
}

/// Producer-side control of a running sampler.
#[derive(Debug)]
pub struct SamplerHandle {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl SamplerHandle {
    /// Requests the sampler to stop. No reading is taken after the request
    /// is observed.
    pub fn cancel(&self) {
        self.shared.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.is_cancelled()
    }

    pub fn state(&self) -> SamplerState {
        self.shared.state()
    }

    /// Cancels the sampler and waits for its thread to exit.
    pub fn stop(mut self) {
        self.cancel();
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            error!("CPU sampler thread panicked");
            self.shared.set_state(SamplerState::Stopped);
        }
    }
}
