//! First-run completion flag

use super::kv::KvStore;
use crate::error::Result;
use std::sync::Arc;

/// Storage key of the completion flag.
pub const ONBOARDING_KEY: &str = "@GetGoing:onboarding_complete";

const COMPLETE: &str = "true";

/// Persisted "has the user finished onboarding" flag.
///
/// There is no way back: once marked complete the store only ever reports
/// `true`. Clearing the flag is an out-of-band operation on the backend.
#[derive(Clone)]
pub struct OnboardingStore {
    kv: Arc<dyn KvStore>,
}

impl OnboardingStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// True only if the stored value is exactly `"true"`. Read failures count as
    /// not complete.
    pub fn is_complete(&self) -> bool {
        match self.kv.get(ONBOARDING_KEY) {
            Ok(value) => value.as_deref() == Some(COMPLETE),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read onboarding flag, assuming first run");
                false
            }
        }
    }

    pub fn mark_complete(&self) -> Result<()> {
        self.kv.set(ONBOARDING_KEY, COMPLETE)?;
        tracing::info!("Onboarding marked complete");
        Ok(())
    }
}
