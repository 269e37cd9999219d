//! Pipeline configuration
//!
//! Two behaviours of [`Middleware::compose`](crate::Middleware::compose) are
//! policy rather than mechanism, and are exposed here:
//!
//! - what happens when stages are added or removed while a run is in flight
//! - which payload a cancelled run resolves to
//!
//! The defaults give deterministic runs and leave a vetoed action with the
//! payload it was invoked with.

use serde::{Deserialize, Serialize};

/// How a run sees the stage list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StageListPolicy {
    /// Clone the stage list when the run starts; later `add`/`remove` calls
    /// only affect subsequent runs
    #[default]
    Snapshot,
    /// Re-read the list by position before every step; stages added or removed
    /// mid-run may or may not be observed
    Live,
}

/// Payload a cancelled run resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CancelRestore {
    /// The payload the run started with
    #[default]
    Initial,
    /// The payload that entered the cancelling stage
    Previous,
}

/// Configuration for a [`Middleware`](crate::Middleware) instance
///
/// # Example
///
/// ```
/// use roof_core::{CancelRestore, MiddlewareConfig, StageListPolicy};
///
/// let config = MiddlewareConfig::default().with_cancel(CancelRestore::Previous);
/// assert_eq!(config.stage_list, StageListPolicy::Snapshot);
/// assert_eq!(config.cancel, CancelRestore::Previous);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MiddlewareConfig {
    pub stage_list: StageListPolicy,
    pub cancel: CancelRestore,
}

impl MiddlewareConfig {
    pub fn with_stage_list(mut self, policy: StageListPolicy) -> Self {
        self.stage_list = policy;
        self
    }

    pub fn with_cancel(mut self, restore: CancelRestore) -> Self {
        self.cancel = restore;
        self
    }
}
