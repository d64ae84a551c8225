use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{ReportError, Result};

const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Shared flag checked at every suspension point of a run (before requests, during cooldowns).
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
  flag: Arc<AtomicBool>,
}

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.flag.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.flag.load(Ordering::SeqCst)
  }

  pub fn check(&self) -> Result<()> {
    if self.is_cancelled() {
      Err(ReportError::Cancelled)
    } else {
      Ok(())
    }
  }

  /// Sleep for `dur`, waking early with `Cancelled` if the token trips.
  pub fn sleep(&self, dur: Duration) -> Result<()> {
    let deadline = Instant::now() + dur;

    loop {
      self.check()?;
      let now = Instant::now();
      if now >= deadline {
        return Ok(());
      }
      std::thread::sleep(SLEEP_SLICE.min(deadline - now));
    }
  }

  /// Trip the token from a background thread once `after` elapses.
  pub fn cancel_after(&self, after: Duration) -> std::thread::JoinHandle<()> {
    let token = self.clone();
    std::thread::spawn(move || {
      std::thread::sleep(after);
      token.cancel();
    })
  }
}
