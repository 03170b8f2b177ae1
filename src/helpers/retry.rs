use std::time::Duration;
use std::thread;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use log::{debug, warn, info};

/// Granularity at which a waiting retry notices cancellation
const CANCEL_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Retry mechanism with a bounded number of attempts and a fixed delay between them
pub struct RetryHandler {
    /// Current attempt number (0-based)
    attempt: usize,
    /// Total number of attempts, including the first one
    max_attempts: usize,
    /// Delay before each retry
    delay: Duration,
}

impl RetryHandler {
    /// Create a handler that makes `max_attempts` attempts with the same delay between them
    pub fn fixed(max_attempts: usize, delay: Duration) -> Self {
        Self {
            attempt: 0,
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Get the current attempt number (0-based)
    pub fn attempt(&self) -> usize {
        self.attempt
    }

    /// Check if another attempt is allowed after the current one
    pub fn should_retry(&self) -> bool {
        self.attempt + 1 < self.max_attempts
    }

    /// Wait for the current retry interval and advance to the next attempt
    ///
    /// Returns false if `cancel` was raised while waiting
    pub fn wait(&mut self, cancel: Option<&Arc<AtomicBool>>) -> bool {
        let delay = self.delay;
        debug!("Retry attempt {}: waiting {:?} before next attempt", self.attempt + 2, delay);

        if let Some(cancel_flag) = cancel {
            let mut remaining = delay;
            loop {
                if cancel_flag.load(Ordering::SeqCst) {
                    debug!("Retry interrupted by cancellation");
                    return false;
                }
                if remaining.is_zero() {
                    break;
                }
                let sleep_time = std::cmp::min(CANCEL_CHECK_INTERVAL, remaining);
                thread::sleep(sleep_time);
                remaining = remaining.saturating_sub(sleep_time);
            }
        } else if !delay.is_zero() {
            thread::sleep(delay);
        }

        self.attempt += 1;
        true
    }

    /// Execute a closure with retry logic
    ///
    /// The closure receives the 0-based attempt index.
    ///
    /// # Returns
    /// * `Some(T)` if the operation succeeded
    /// * `None` if all attempts failed or the operation was cancelled
    pub fn execute_with_retry<T, F>(
        &mut self,
        mut operation: F,
        cancel: Option<&Arc<AtomicBool>>,
        operation_name: &str,
    ) -> Option<T>
    where
        F: FnMut(usize) -> Option<T>,
    {
        debug!("Starting {} with up to {} attempts", operation_name, self.max_attempts);

        loop {
            if let Some(cancel_flag) = cancel {
                if cancel_flag.load(Ordering::SeqCst) {
                    debug!("{} cancelled", operation_name);
                    return None;
                }
            }

            if let Some(result) = operation(self.attempt) {
                info!("{} succeeded on attempt {}/{}", operation_name, self.attempt + 1, self.max_attempts);
                return Some(result);
            }

            if !self.should_retry() {
                warn!("{} failed after {} attempts, giving up", operation_name, self.attempt + 1);
                return None;
            }

            if !self.wait(cancel) {
                return None;
            }
        }
    }
}
