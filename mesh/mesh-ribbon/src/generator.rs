//! Background ribbon generation with request coalescing.
//!
//! A [`RibbonGenerator`] runs at most one generation at a time on a worker
//! thread and keeps at most one pending job. Requests arriving while a
//! generation is in flight replace the pending job, so a burst of edits
//! costs at most two generations. Every request gets a generation number;
//! a result is published only if no newer request has been made since, so
//! callers never observe a stale mesh. Tessellations never overlap: a
//! blocking [`RibbonGenerator::generate_now`] first waits for the worker.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use bezier_spline::Spline;
use tracing::{debug, info, warn};

use crate::config::RibbonConfig;
use crate::error::RibbonResult;
use crate::profile::WidthProfile;
use crate::ribbon::{RibbonMesh, generate_ribbon};

/// Snapshot of everything needed to build one ribbon.
///
/// The spline is cloned without its observer, so the caller can keep
/// editing the original while the job runs.
#[derive(Debug, Clone)]
pub struct RibbonJob {
    /// Spline to sweep.
    pub spline: Spline,
    /// Width profile.
    pub profile: WidthProfile,
    /// Generation settings.
    pub config: RibbonConfig,
}

impl RibbonJob {
    /// Snapshot `spline`, `profile` and `config`.
    #[must_use]
    pub fn new(spline: &Spline, profile: &WidthProfile, config: &RibbonConfig) -> Self {
        Self {
            spline: spline.detached(),
            profile: profile.clone(),
            config: config.clone(),
        }
    }

    /// Build the ribbon on the current thread.
    ///
    /// # Errors
    ///
    /// See [`generate_ribbon`].
    pub fn run(&self) -> RibbonResult<RibbonMesh> {
        generate_ribbon(&self.spline, &self.profile, &self.config)
    }
}

/// Outcome of one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedRibbon {
    /// Generation number returned by the request that produced this result.
    pub generation: u64,
    /// The mesh, or why it could not be built.
    pub mesh: RibbonResult<RibbonMesh>,
}

/// Whether [`RibbonGenerator::generate`] blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GenerationMode {
    /// Build on the calling thread and return the result.
    Immediate,
    /// Queue on the worker and return at once.
    #[default]
    Deferred,
}

#[derive(Debug, Default)]
struct GeneratorState {
    /// Newest generation number handed out.
    latest: u64,
    /// A tessellation is in progress, on the worker or inline.
    running: bool,
    pending: Option<(u64, RibbonJob)>,
    result: Option<GeneratedRibbon>,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<GeneratorState>,
    idle: Condvar,
    #[cfg(test)]
    runs: RunLog,
}

/// Counts tessellations and lets tests hold them at the start line.
#[cfg(test)]
#[derive(Debug, Default)]
struct RunLog {
    gate: Mutex<()>,
    started: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
}

#[cfg(test)]
impl RunLog {
    fn enter(&self) -> RunGuard<'_> {
        drop(self.gate.lock().unwrap_or_else(PoisonError::into_inner));
        self.started.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);
        RunGuard(self)
    }
}

#[cfg(test)]
struct RunGuard<'a>(&'a RunLog);

#[cfg(test)]
impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, GeneratorState> {
        // a panicking job cannot leave the state half-written
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `mesh` unless a newer generation has been requested.
    fn publish(state: &mut GeneratorState, generation: u64, mesh: RibbonResult<RibbonMesh>) -> bool {
        if generation != state.latest {
            debug!(generation, latest = state.latest, "dropping stale ribbon");
            return false;
        }
        state.result = Some(GeneratedRibbon { generation, mesh });
        true
    }

    fn tessellate(&self, job: &RibbonJob) -> RibbonResult<RibbonMesh> {
        #[cfg(test)]
        let _run = self.runs.enter();
        job.run()
    }

    /// Drain pending jobs until none remain.
    fn work(&self, mut generation: u64, mut job: RibbonJob) {
        loop {
            debug!(generation, "generating ribbon");
            let mesh = self.tessellate(&job);

            let mut state = self.lock();
            if Self::publish(&mut state, generation, mesh) {
                info!(generation, "ribbon ready");
            }
            match state.pending.take() {
                Some((next_generation, next_job)) => {
                    generation = next_generation;
                    job = next_job;
                }
                None => {
                    state.running = false;
                    self.idle.notify_all();
                    return;
                }
            }
        }
    }
}

/// Coalescing background ribbon generator.
///
/// # Example
///
/// ```
/// use bezier_spline::Spline;
/// use mesh_ribbon::{RibbonConfig, RibbonGenerator, RibbonJob, WidthProfile};
///
/// let spline = Spline::default();
/// let generator = RibbonGenerator::new();
/// let job = RibbonJob::new(&spline, &WidthProfile::default(), &RibbonConfig::default());
///
/// let generation = generator.request(job);
/// let result = generator.wait().unwrap();
/// assert_eq!(result.generation, generation);
/// assert!(result.mesh.is_ok());
/// ```
#[derive(Debug, Default)]
pub struct RibbonGenerator {
    shared: Arc<Shared>,
}

impl RibbonGenerator {
    /// Create an idle generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `job` and return its generation number.
    ///
    /// Starts a worker if none is running; otherwise `job` replaces any
    /// pending job.
    pub fn request(&self, job: RibbonJob) -> u64 {
        let mut state = self.shared.lock();
        state.latest += 1;
        let generation = state.latest;

        if state.running {
            if let Some((replaced, _)) = state.pending.replace((generation, job)) {
                debug!(replaced, generation, "coalesced ribbon request");
            }
            return generation;
        }

        state.running = true;
        drop(state);

        self.start_worker(generation, job);
        generation
    }

    /// Run `job` and anything queued behind it on a new worker thread.
    ///
    /// The caller must have set `running`.
    fn start_worker(&self, generation: u64, job: RibbonJob) {
        let shared = Arc::clone(&self.shared);
        let inline_job = job.clone();
        let spawned = thread::Builder::new()
            .name("ribbon-generator".into())
            .spawn(move || shared.work(generation, job));
        if let Err(err) = spawned {
            warn!(%err, "could not spawn ribbon worker, generating inline");
            self.shared.work(generation, inline_job);
        }
    }

    /// Build `job` on the calling thread, superseding in-flight and pending
    /// work.
    ///
    /// Blocks until the worker has finished its current tessellation, whose
    /// result is then stale and dropped. Requests made meanwhile are queued
    /// and picked up by a worker afterwards.
    pub fn generate_now(&self, job: RibbonJob) -> GeneratedRibbon {
        let generation = {
            let mut state = self.shared.lock();
            state.latest += 1;
            state.pending = None;
            let generation = state.latest;
            while state.running {
                state = self
                    .shared
                    .idle
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            state.running = true;
            generation
        };

        let mesh = self.shared.tessellate(&job);
        let result = GeneratedRibbon { generation, mesh };

        let mut state = self.shared.lock();
        if Shared::publish(&mut state, generation, result.mesh.clone()) {
            debug!(generation, "ribbon generated synchronously");
        }
        match state.pending.take() {
            Some((next_generation, next_job)) => {
                drop(state);
                self.start_worker(next_generation, next_job);
            }
            None => {
                state.running = false;
                self.shared.idle.notify_all();
            }
        }
        result
    }

    /// Build `job` now or in the background.
    ///
    /// Returns the result for [`GenerationMode::Immediate`] and `None` for
    /// [`GenerationMode::Deferred`].
    pub fn generate(&self, job: RibbonJob, mode: GenerationMode) -> Option<GeneratedRibbon> {
        match mode {
            GenerationMode::Immediate => Some(self.generate_now(job)),
            GenerationMode::Deferred => {
                self.request(job);
                None
            }
        }
    }

    /// Discard pending work and the stored result, and make any in-flight
    /// result stale.
    pub fn cancel(&self) {
        let mut state = self.shared.lock();
        state.latest += 1;
        state.result = None;
        if state.pending.take().is_some() || state.running {
            debug!(generation = state.latest, "cancelled ribbon generation");
        }
    }

    /// Whether a tessellation is in progress.
    pub fn is_busy(&self) -> bool {
        self.shared.lock().running
    }

    /// Generation number of the newest request.
    pub fn latest_generation(&self) -> u64 {
        self.shared.lock().latest
    }

    /// Block until no generation is running, then return the latest result
    /// without consuming it.
    pub fn wait(&self) -> Option<GeneratedRibbon> {
        let mut state = self.shared.lock();
        while state.running {
            state = self
                .shared
                .idle
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.result.clone()
    }

    /// Take the latest published result, if any.
    pub fn take_result(&self) -> Option<GeneratedRibbon> {
        self.shared.lock().result.take()
    }
}

impl Drop for RibbonGenerator {
    fn drop(&mut self) {
        self.cancel();
    }
}
