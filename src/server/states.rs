use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

/// How long an issued OAuth `state` stays redeemable
pub const STATE_TTL: Duration = Duration::from_secs(10 * 60);

/// Most `state` values kept at once; the oldest is evicted beyond this
pub const MAX_PENDING_STATES: usize = 1024;

/// OAuth `state` values issued by `/login` and not yet redeemed
#[derive(Debug, Default)]
pub struct LoginStates {
    issued: HashMap<String, Instant>,
}

impl LoginStates {
    /// Issue a fresh state value, dropping expired ones first
    pub fn issue(&mut self, now: Instant) -> String {
        self.prune(now);

        if self.issued.len() >= MAX_PENDING_STATES {
            let oldest = self
                .issued
                .iter()
                .min_by_key(|(_, issued_at)| **issued_at)
                .map(|(value, _)| value.clone());
            if let Some(oldest) = oldest {
                warn!("Too many pending login states, evicting the oldest");
                self.issued.remove(&oldest);
            }
        }

        let value = Uuid::new_v4().to_string();
        self.issued.insert(value.clone(), now);
        value
    }

    /// Redeem a state value; each value works once and only within the TTL
    pub fn consume(&mut self, value: &str, now: Instant) -> bool {
        match self.issued.remove(value) {
            Some(issued_at) => now.saturating_duration_since(issued_at) < STATE_TTL,
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }

    fn prune(&mut self, now: Instant) {
        let before = self.issued.len();
        self.issued
            .retain(|_, issued_at| now.saturating_duration_since(*issued_at) < STATE_TTL);

        let dropped = before - self.issued.len();
        if dropped > 0 {
            debug!("Dropped {} expired login states", dropped);
        }
    }
}
