//! # Pricing State
//!
//! The subscription screen's selection: one tier and at most one applied
//! coupon. Same locking discipline as [`CartState`](super::CartState).

use std::sync::{Arc, Mutex, PoisonError};

use dukan_core::pricing::PricingSession;
use dukan_core::SubscriptionTier;

#[derive(Debug, Clone)]
pub struct PricingState {
    session: Arc<Mutex<PricingSession>>,
}

impl PricingState {
    pub fn new(tier: SubscriptionTier) -> Self {
        PricingState {
            session: Arc::new(Mutex::new(PricingSession::new(tier))),
        }
    }

    pub fn with_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&PricingSession) -> R,
    {
        let session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&session)
    }

    pub fn with_session_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut PricingSession) -> R,
    {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut session)
    }
}

impl Default for PricingState {
    fn default() -> Self {
        PricingState::new(SubscriptionTier::Standard)
    }
}
