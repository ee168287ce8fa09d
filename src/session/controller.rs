//! Session controller: one simulation round-trip at a time.
//!
//! The controller owns the frame store and the metrics aggregator and is
//! the only thing that changes them. It can be shared by reference; a
//! `submit` or `clear` that arrives while a request is in flight is
//! rejected with [`SubmitError::Busy`], never queued.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::store::SessionStore;
use crate::analysis::{MetricsAggregator, SessionStats};
use crate::client::{ClientError, SimulationClient};
use crate::models::{BerPoint, Frame, FrameId, SimulationConfig, SimulationResult};

/// Errors returned by [`SessionController::submit`] and
/// [`SessionController::clear`]. Both leave the session untouched.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("A simulation is already running")]
    Busy,

    #[error(transparent)]
    Simulation(#[from] ClientError),
}

/// Whether a request is in flight.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running {
        config: SimulationConfig,
        started_at: DateTime<Utc>,
    },
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running { .. })
    }
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub frames: Arc<Vec<Frame>>,
    pub ber_history: Vec<BerPoint>,
    pub stats: SessionStats,
    pub is_running: bool,
    /// Store version this view was taken from.
    pub version: u64,
}

struct Inner {
    state: RunState,
    store: SessionStore,
    metrics: MetricsAggregator,
    next_id: u64,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Puts the controller back to `Idle` if a submit is abandoned mid-flight.
struct RunningGuard<'a> {
    inner: &'a Mutex<Inner>,
    armed: bool,
}

impl<'a> RunningGuard<'a> {
    /// Return to `Idle` and keep the lock for recording the outcome.
    fn finish(mut self) -> MutexGuard<'a, Inner> {
        self.armed = false;
        let mut inner = lock(self.inner);
        inner.state = RunState::Idle;
        inner
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!("Submit dropped before completion; returning to idle");
            lock(self.inner).state = RunState::Idle;
        }
    }
}

/// Drives simulation round-trips and owns the session they build up.
pub struct SessionController<C> {
    client: C,
    inner: Mutex<Inner>,
}

impl<C: SimulationClient> SessionController<C> {
    pub fn new(client: C) -> Self {
        info!("Session controller using {}", client.endpoint());

        Self {
            client,
            inner: Mutex::new(Inner {
                state: RunState::Idle,
                store: SessionStore::new(),
                metrics: MetricsAggregator::new(),
                next_id: 1,
            }),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run one simulation and record it as the next frame.
    ///
    /// On failure nothing is recorded and the client error is returned.
    /// Either way the controller is `Idle` again once this resolves.
    pub async fn submit(&self, config: SimulationConfig) -> Result<SimulationResult, SubmitError> {
        {
            let mut inner = lock(&self.inner);
            if let RunState::Running {
                config: running,
                started_at,
            } = &inner.state
            {
                warn!(
                    "Rejecting submit: a simulation started at {} is still running ({} bytes @ {:.1} dB)",
                    started_at.format("%H:%M:%S"),
                    running.payload_size,
                    running.snr_db
                );
                return Err(SubmitError::Busy);
            }
            inner.state = RunState::Running {
                config,
                started_at: Utc::now(),
            };
        }

        let guard = RunningGuard {
            inner: &self.inner,
            armed: true,
        };

        let response = self.client.transmit(&config).await;
        let mut inner = guard.finish();

        let result = match response {
            Ok(result) => result,
            Err(e) => {
                warn!("Simulation failed: {}", e);
                return Err(e.into());
            }
        };

        let id = FrameId(inner.next_id);
        inner.next_id += 1;

        let outcome = inner.metrics.record(&result);
        let frame = Frame {
            id,
            config,
            result: result.clone(),
        };
        inner.store = std::mem::take(&mut inner.store).append(frame);

        info!(
            "Frame {} recorded as run {} ({}, BER {:.3e} -> {:.3e})",
            id,
            inner.store.len(),
            outcome,
            result.ber_before,
            result.ber_after
        );

        Ok(result)
    }

    /// Drop every frame and reset the statistics.
    ///
    /// Rejected while a request is in flight. Frame ids keep counting up;
    /// run numbers start again at 1.
    pub fn clear(&self) -> Result<(), SubmitError> {
        let mut inner = lock(&self.inner);
        if inner.state.is_running() {
            warn!("Rejecting clear: a simulation is still running");
            return Err(SubmitError::Busy);
        }

        let dropped = inner.store.len();
        inner.store = std::mem::take(&mut inner.store).clear();
        inner.metrics.reset();

        info!("Session cleared ({} frames dropped)", dropped);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        lock(&self.inner).state.is_running()
    }

    #[cfg(test)]
    pub fn state(&self) -> RunState {
        lock(&self.inner).state.clone()
    }

    /// Frames recorded since the last clear, which is also the run
    /// number of the newest frame.
    pub fn frame_count(&self) -> usize {
        lock(&self.inner).store.len()
    }

    pub fn stats(&self) -> SessionStats {
        lock(&self.inner).metrics.stats()
    }

    /// Consistent view of frames, history and statistics.
    pub fn snapshot(&self) -> SessionView {
        let inner = lock(&self.inner);
        SessionView {
            frames: inner.store.shared_frames(),
            ber_history: inner.store.ber_history(),
            stats: inner.metrics.stats(),
            is_running: inner.state.is_running(),
            version: inner.store.version(),
        }
    }
}
