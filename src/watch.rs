//! Run-once-then-tick driver with signal-based cancellation (spec §4.7).

use std::time::Duration;

use crate::error::CoreError;
use crate::runner::CancelToken;

/// Granularity of the sleep-and-check loop between ticks; keeps shutdown
/// latency bounded without busy-waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub struct WatchDriver<F>
where
    F: Fn() -> Result<(), CoreError>,
{
    interval: Duration,
    executor: F,
    cancel: CancelToken,
}

impl<F> WatchDriver<F>
where
    F: Fn() -> Result<(), CoreError>,
{
    pub fn new(interval: Duration, executor: F, cancel: CancelToken) -> Result<Self, CoreError> {
        if interval.is_zero() {
            return Err(CoreError::ConfigInvalid("watch interval must be > 0".into()));
        }
        Ok(Self { interval, executor, cancel })
    }

    /// Install SIGINT/SIGTERM handlers that set `cancel`, then run the
    /// executor once immediately and again on every subsequent tick until
    /// canceled. Executor errors are logged and never stop the loop.
    pub fn run(&self) {
        #[cfg(unix)]
        let _guard = install_signal_handlers(self.cancel.clone());

        self.invoke();
        let mut elapsed = Duration::ZERO;
        while !self.cancel.is_canceled() {
            std::thread::sleep(POLL_INTERVAL);
            elapsed += POLL_INTERVAL;
            if self.cancel.is_canceled() {
                break;
            }
            if elapsed >= self.interval {
                elapsed = Duration::ZERO;
                self.invoke();
            }
        }
        log::info!("watch loop shut down");
    }

    fn invoke(&self) {
        if let Err(e) = (self.executor)() {
            log::warn!("watch executor failed: {e}");
        }
    }
}

#[cfg(unix)]
fn install_signal_handlers(cancel: CancelToken) -> Result<(), std::io::Error> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let flag = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGINT, flag.clone())?;
    signal_hook::flag::register(SIGTERM, flag.clone())?;

    std::thread::spawn(move || loop {
        if flag.load(Ordering::SeqCst) {
            cancel.cancel();
            return;
        }
        std::thread::sleep(POLL_INTERVAL);
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn zero_interval_is_rejected() {
        let cancel = CancelToken::new();
        let result = WatchDriver::new(Duration::ZERO, || Ok(()), cancel);
        assert!(result.is_err());
    }

    #[test]
    fn runs_once_immediately_then_stops_when_canceled_before_first_tick() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let cancel = CancelToken::new();
        let cancel_clone = cancel.clone();

        let driver = WatchDriver::new(
            Duration::from_secs(60),
            move || {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                cancel_clone.cancel();
                Ok(())
            },
            cancel,
        )
        .unwrap();
        driver.run();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn executor_errors_do_not_stop_the_loop_from_completing_a_single_tick() {
        let cancel = CancelToken::new();
        let cancel_clone = cancel.clone();
        let driver = WatchDriver::new(
            Duration::from_secs(60),
            move || {
                cancel_clone.cancel();
                Err(CoreError::Canceled)
            },
            cancel,
        )
        .unwrap();
        driver.run();
    }
}
