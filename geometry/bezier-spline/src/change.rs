//! Change notification for spline edits.
//!
//! A [`Spline`](crate::Spline) may carry one observer; it is called after
//! every successful mutation so a host can regenerate dependent meshes.

use std::fmt;
use std::sync::Arc;

/// What kind of change a mutation made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplineChange {
    /// Positions, modes, scales or angles changed; curve count did not.
    Geometry,
    /// Curves were added, removed or the loop was opened/closed.
    Topology,
}

/// Thread-safe change callback that implements Debug.
///
/// Wraps `Arc<dyn Fn(SplineChange) + Send + Sync>` so splines stay `Clone`
/// and can be snapshotted into background jobs.
pub struct ChangeObserver(Arc<dyn Fn(SplineChange) + Send + Sync>);

impl ChangeObserver {
    /// Wrap a callback.
    pub fn new(callback: impl Fn(SplineChange) + Send + Sync + 'static) -> Self {
        Self(Arc::new(callback))
    }

    pub(crate) fn notify(&self, change: SplineChange) {
        (self.0)(change);
    }
}

impl Clone for ChangeObserver {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl fmt::Debug for ChangeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChangeObserver(<fn>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_observer_forwards_changes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer = ChangeObserver::new(move |change| {
            if let Ok(mut log) = sink.lock() {
                log.push(change);
            }
        });

        observer.notify(SplineChange::Geometry);
        observer.clone().notify(SplineChange::Topology);

        let log = seen.lock().map(|l| l.clone()).unwrap_or_default();
        assert_eq!(log, vec![SplineChange::Geometry, SplineChange::Topology]);
        assert_eq!(format!("{observer:?}"), "ChangeObserver(<fn>)");
    }
}
