//! Bulkhead pattern for limiting concurrent operations
//!
//! The bulkhead bounds the number of operations in flight at once. A slot is
//! represented by a [`BulkheadPermit`]; dropping the permit returns the slot,
//! so every exit path of the holder (success, error, cancellation, panic
//! unwind) releases it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::ResilienceError;

/// Configuration for bulkhead behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkheadConfig {
    /// Maximum number of concurrent operations allowed
    pub max_concurrent: usize,
}

impl Default for BulkheadConfig {
    fn default() -> Self {
        Self { max_concurrent: 10 }
    }
}

impl BulkheadConfig {
    /// Create a new configuration builder
    pub fn builder() -> BulkheadConfigBuilder {
        BulkheadConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent == 0 {
            return Err("max_concurrent must be greater than 0".to_string());
        }
        if self.max_concurrent > Semaphore::MAX_PERMITS {
            return Err(format!("max_concurrent must not exceed {}", Semaphore::MAX_PERMITS));
        }
        Ok(())
    }
}

/// Builder for BulkheadConfig
#[derive(Debug)]
pub struct BulkheadConfigBuilder {
    config: BulkheadConfig,
}

impl Default for BulkheadConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BulkheadConfigBuilder {
    pub fn new() -> Self {
        Self { config: BulkheadConfig::default() }
    }

    pub fn max_concurrent(mut self, max: usize) -> Self {
        self.config.max_concurrent = max;
        self
    }

    pub fn build(self) -> Result<BulkheadConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Metrics for bulkhead monitoring
#[derive(Debug, Clone)]
pub struct BulkheadMetrics {
    /// Total number of permits handed out
    pub total_acquired: u64,
    /// Total number of non-waiting acquisitions rejected at capacity
    pub rejected_operations: u64,
    /// Current number of concurrent operations
    pub current_concurrent: usize,
    /// Maximum concurrent operations allowed
    pub max_concurrent: usize,
}

impl BulkheadMetrics {
    /// Calculate the current utilization as a percentage (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        self.current_concurrent as f64 / self.max_concurrent as f64
    }

    /// Calculate the rejection rate as a percentage (0.0 to 1.0)
    pub fn rejection_rate(&self) -> f64 {
        let total = self.total_acquired + self.rejected_operations;
        if total == 0 {
            return 0.0;
        }
        self.rejected_operations as f64 / total as f64
    }

    /// Check if the bulkhead is at capacity
    pub fn is_at_capacity(&self) -> bool {
        self.current_concurrent >= self.max_concurrent
    }

    /// Get a human-readable status message
    pub fn status_message(&self) -> String {
        format!(
            "Bulkhead: {}/{} concurrent ({:.1}% utilized), {} rejected",
            self.current_concurrent,
            self.max_concurrent,
            self.utilization() * 100.0,
            self.rejected_operations,
        )
    }
}

/// A held bulkhead slot, released on drop.
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct BulkheadPermit {
    _permit: OwnedSemaphorePermit,
}

impl fmt::Debug for BulkheadPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkheadPermit").finish_non_exhaustive()
    }
}

/// Bulkhead for limiting concurrent operations
///
/// Clones share the same slots and counters.
///
/// # Examples
///
/// ```rust
/// use tallyline_common::resilience::{Bulkhead, BulkheadConfig};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bulkhead = Bulkhead::new(BulkheadConfig::builder().max_concurrent(2).build()?)?;
///
/// let first = bulkhead.try_acquire();
/// let second = bulkhead.try_acquire();
/// assert!(first.is_some() && second.is_some());
/// assert!(bulkhead.try_acquire().is_none());
///
/// drop(first);
/// assert!(bulkhead.try_acquire().is_some());
/// # Ok(())
/// # }
/// ```
pub struct Bulkhead {
    config: BulkheadConfig,
    semaphore: Arc<Semaphore>,
    total_acquired: Arc<AtomicU64>,
    rejected_operations: Arc<AtomicU64>,
}

impl Bulkhead {
    /// Create a new bulkhead with the given configuration
    pub fn new(config: BulkheadConfig) -> Result<Self, String> {
        config.validate()?;

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            total_acquired: Arc::new(AtomicU64::new(0)),
            rejected_operations: Arc::new(AtomicU64::new(0)),
            config,
        })
    }

    /// Create a bulkhead with `max_concurrent` slots
    pub fn with_capacity(max_concurrent: usize) -> Result<Self, String> {
        Self::new(BulkheadConfig { max_concurrent })
    }

    /// Try to acquire a permit without waiting
    ///
    /// Returns `Some(permit)` if available, `None` if at capacity.
    pub fn try_acquire(&self) -> Option<BulkheadPermit> {
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => {
                self.total_acquired.fetch_add(1, Ordering::Relaxed);
                Some(BulkheadPermit { _permit: permit })
            }
            Err(_) => {
                self.rejected_operations.fetch_add(1, Ordering::Relaxed);
                debug!(max_concurrent = self.config.max_concurrent, "bulkhead at capacity");
                None
            }
        }
    }

    /// Wait for a permit, giving up when `cancel` fires
    ///
    /// A permit obtained in the same instant the signal fires is released
    /// before returning the cancellation.
    pub async fn acquire(
        &self,
        cancel: &CancellationToken,
    ) -> Result<BulkheadPermit, ResilienceError> {
        if cancel.is_cancelled() {
            return Err(ResilienceError::Cancelled);
        }

        let semaphore = Arc::clone(&self.semaphore);
        let permit = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ResilienceError::Cancelled),
            permit = semaphore.acquire_owned() => permit.map_err(|_| ResilienceError::Closed)?,
        };

        self.total_acquired.fetch_add(1, Ordering::Relaxed);
        Ok(BulkheadPermit { _permit: permit })
    }

    /// Number of slots currently free
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Get the current number of concurrent operations
    pub fn current_concurrent(&self) -> usize {
        self.config.max_concurrent.saturating_sub(self.semaphore.available_permits())
    }

    /// Get bulkhead metrics
    pub fn metrics(&self) -> BulkheadMetrics {
        BulkheadMetrics {
            total_acquired: self.total_acquired.load(Ordering::Acquire),
            rejected_operations: self.rejected_operations.load(Ordering::Acquire),
            current_concurrent: self.current_concurrent(),
            max_concurrent: self.config.max_concurrent,
        }
    }
}

impl Clone for Bulkhead {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            semaphore: Arc::clone(&self.semaphore),
            total_acquired: Arc::clone(&self.total_acquired),
            rejected_operations: Arc::clone(&self.rejected_operations),
        }
    }
}

impl fmt::Debug for Bulkhead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bulkhead")
            .field("max_concurrent", &self.config.max_concurrent)
            .field("current_concurrent", &self.current_concurrent())
            .finish()
    }
}
