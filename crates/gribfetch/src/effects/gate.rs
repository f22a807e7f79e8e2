use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use gribfetch_fs::LockedFile;
use tracing::{debug, warn};

use crate::core::{format_instant, next_stamp, pacing_wait, parse_instant};
use crate::data::GateConfig;
use crate::error::{Error, Result};

/// Paces gated operations across every process sharing one state file.
///
/// A pass locks the state file, waits out whatever remains of the interval
/// since the last recorded request, stamps the current time, and unlocks.
/// The gated operation itself runs after the lock is released, so a long
/// transfer never blocks other processes from taking their turn.
#[derive(Debug, Clone)]
pub struct RateGate {
    min_interval: Duration,
    state_path: PathBuf,
    lock_timeout: Duration,
    poll_interval: Duration,
}

impl RateGate {
    pub fn new(config: &GateConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            min_interval: config.min_interval(),
            state_path: config.state_path.clone(),
            lock_timeout: config.lock_timeout_duration(),
            poll_interval: config.poll_interval_duration(),
        })
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Run `operation` once this process's turn comes up.
    pub async fn gate<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.pass().await?;
        Ok(operation().await)
    }

    /// Take a turn without running anything; returns the time spent pacing.
    pub async fn pass(&self) -> Result<Duration> {
        let mut state = self.acquire().await?;

        let raw = state.read().map_err(|source| self.state_error(source))?;
        let last = parse_instant(&raw);
        if last.is_none() && !raw.is_empty() {
            warn!(path = %self.state_path.display(), "unreadable pacing state, treating as never pinged");
        }

        let wait = pacing_wait(self.min_interval, SystemTime::now(), last);
        if !wait.is_zero() {
            debug!(?wait, "rate limiting");
            tokio::time::sleep(wait).await;
        }

        let stamp = next_stamp(SystemTime::now(), last);
        state
            .overwrite(format_instant(stamp).as_bytes())
            .map_err(|source| self.state_error(source))?;
        drop(state);

        Ok(wait)
    }

    async fn acquire(&self) -> Result<LockedFile> {
        let started = Instant::now();
        loop {
            match LockedFile::try_open_locked(&self.state_path) {
                Ok(state) => return Ok(state),
                Err(gribfetch_fs::Error::Locked { .. }) => {
                    let waited = started.elapsed();
                    if waited >= self.lock_timeout {
                        return Err(Error::LockTimeout {
                            path: self.state_path.clone(),
                            waited,
                        });
                    }
                    let remaining = self.lock_timeout - waited;
                    tokio::time::sleep(self.poll_interval.min(remaining)).await;
                }
                Err(source) => return Err(self.state_error(source)),
            }
        }
    }

    fn state_error(&self, source: gribfetch_fs::Error) -> Error {
        Error::Pacing {
            path: self.state_path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TimeUnit;
    use tempfile::tempdir;

    fn config(dir: &Path, per_second: u32) -> GateConfig {
        GateConfig::default()
            .pings(per_second)
            .unit(TimeUnit::Seconds)
            .state_path(dir.join("pacing.lock"))
            .lock_timeout(Duration::from_millis(300))
            .poll_interval(Duration::from_millis(10))
    }

    #[test]
    fn rejects_zero_pings() {
        let dir = tempdir().unwrap();
        assert!(RateGate::new(&config(dir.path(), 0)).is_err());
    }

    #[tokio::test]
    async fn first_pass_does_not_wait() {
        let dir = tempdir().unwrap();
        let gate = RateGate::new(&config(dir.path(), 5)).unwrap();
        assert_eq!(gate.pass().await.unwrap(), Duration::ZERO);
        assert!(parse_instant(&std::fs::read(gate.state_path()).unwrap()).is_some());
    }

    #[tokio::test]
    async fn second_pass_waits_for_interval() {
        let dir = tempdir().unwrap();
        let gate = RateGate::new(&config(dir.path(), 5)).unwrap();
        gate.pass().await.unwrap();

        let started = Instant::now();
        let waited = gate.pass().await.unwrap();
        assert!(waited > Duration::from_millis(100));
        assert!(started.elapsed() >= Duration::from_millis(180));
    }

    #[tokio::test]
    async fn corrupt_state_treated_as_never_pinged() {
        let dir = tempdir().unwrap();
        let gate = RateGate::new(&config(dir.path(), 1)).unwrap();
        std::fs::write(gate.state_path(), "definitely not a timestamp").unwrap();

        assert_eq!(gate.pass().await.unwrap(), Duration::ZERO);
    }

    #[tokio::test]
    async fn lock_timeout_when_held_elsewhere() {
        let dir = tempdir().unwrap();
        let gate = RateGate::new(&config(dir.path(), 5)).unwrap();
        let _held = LockedFile::open_locked(gate.state_path()).unwrap();

        let ran = std::sync::atomic::AtomicBool::new(false);
        let err = gate
            .gate(|| async { ran.store(true, std::sync::atomic::Ordering::SeqCst) })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::LockTimeout { .. }));
        assert!(err.is_gate_failure());
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn operation_runs_after_lock_released() {
        let dir = tempdir().unwrap();
        let gate = RateGate::new(&config(dir.path(), 1000)).unwrap();

        let unlocked = gate
            .gate(|| async { LockedFile::try_open_locked(gate.state_path()).is_ok() })
            .await
            .unwrap();
        assert!(unlocked);
    }
}
