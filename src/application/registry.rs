use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use crate::domain::request::Purpose;

#[derive(Default)]
struct RegistryState {
    /// test-request id -> trading partner, empty until the processor
    /// resolves which side of the transmission is remote.
    active: HashMap<String, String>,
    cancelled: HashSet<String>,
    global_cancel: bool,
}

/// Tracks which test requests are in flight and which have been
/// cancelled. One instance is owned by the engine and shared with the
/// poller and every processor task. All state sits behind a single lock,
/// so moving an id between the active and cancelled sets is one atomic
/// operation and readers never observe a half-updated registry.
#[derive(Default)]
pub struct Registry {
    state: RwLock<RegistryState>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_active(&self, id: &str) -> bool {
        self.state.read().await.active.contains_key(id)
    }

    pub async fn has_active(&self) -> bool {
        !self.state.read().await.active.is_empty()
    }

    /// No-op when the id is already active.
    pub async fn add_active(&self, id: &str) {
        self.state
            .write()
            .await
            .active
            .entry(id.to_string())
            .or_default();
    }

    pub async fn remove_active(&self, id: &str) -> bool {
        self.state.write().await.active.remove(id).is_some()
    }

    /// Records the trading partner for an active test; no-op otherwise.
    pub async fn set_partner(&self, id: &str, partner: &str) {
        if let Some(entry) = self.state.write().await.active.get_mut(id) {
            *entry = partner.to_string();
        }
    }

    /// Returns the id of a *different* active test already talking to
    /// this partner. Prefix match, because the stored partner value
    /// carries a role suffix. Cancellations share the id of the test
    /// they cancel, so only `TestRequest` purposes conflict.
    pub async fn find_conflicting_active(
        &self,
        purpose: Purpose,
        id: &str,
        partner: &str,
    ) -> Option<String> {
        if purpose != Purpose::TestRequest {
            return None;
        }
        let state = self.state.read().await;
        state
            .active
            .iter()
            .find(|(other, value)| other.as_str() != id && value.starts_with(partner))
            .map(|(other, _)| other.clone())
    }

    pub async fn is_cancelled(&self, id: &str) -> bool {
        self.state.read().await.cancelled.contains(id)
    }

    /// Marks an active test cancelled. The id moves from active to
    /// cancelled in one step; ids that are not active are only removed
    /// from the active set (a no-op), never inserted into cancelled.
    pub async fn add_cancelled(&self, id: &str) {
        let mut state = self.state.write().await;
        if state.active.remove(id).is_some() {
            state.cancelled.insert(id.to_string());
        }
    }

    /// Clears a cancellation once it has been acted on, so the id can be
    /// reused by a later test.
    pub async fn remove_cancelled(&self, id: &str) {
        self.state.write().await.cancelled.remove(id);
    }

    /// Moves every active test into the cancelled set.
    pub async fn cancel_all(&self) {
        let mut state = self.state.write().await;
        let ids: Vec<String> = state.active.drain().map(|(id, _)| id).collect();
        state.cancelled.extend(ids);
    }

    pub async fn set_global_cancel(&self, on: bool) {
        self.state.write().await.global_cancel = on;
    }

    pub async fn global_cancel(&self) -> bool {
        self.state.read().await.global_cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_active_is_idempotent() {
        let registry = Registry::new();
        registry.add_active("T1").await;
        registry.set_partner("T1", "OldPayer/A").await;
        registry.add_active("T1").await;

        // The second add must not wipe the recorded partner.
        assert_eq!(
            registry
                .find_conflicting_active(Purpose::TestRequest, "T2", "OldPayer")
                .await,
            Some("T1".to_string())
        );
    }

    #[tokio::test]
    async fn test_cancel_then_remove_in_either_order_leaves_inactive() {
        let registry = Registry::new();
        registry.add_active("T1").await;
        registry.add_cancelled("T1").await;
        registry.remove_active("T1").await;
        assert!(!registry.is_active("T1").await);

        registry.add_active("T2").await;
        registry.remove_active("T2").await;
        registry.add_cancelled("T2").await;
        assert!(!registry.is_active("T2").await);
        // T2 was no longer active, so it never became cancelled.
        assert!(!registry.is_cancelled("T2").await);
    }

    #[tokio::test]
    async fn test_conflict_requires_other_id_and_partner_prefix() {
        let registry = Registry::new();
        registry.add_active("T1").await;
        registry.set_partner("T1", "PartnerA/B").await;

        assert_eq!(
            registry
                .find_conflicting_active(Purpose::TestRequest, "T2", "PartnerA")
                .await,
            Some("T1".to_string())
        );
        // The same id never conflicts with itself.
        assert_eq!(
            registry
                .find_conflicting_active(Purpose::TestRequest, "T1", "PartnerA")
                .await,
            None
        );
        // Other partners do not conflict.
        assert_eq!(
            registry
                .find_conflicting_active(Purpose::TestRequest, "T2", "PartnerB")
                .await,
            None
        );
        // Cancellations never conflict.
        assert_eq!(
            registry
                .find_conflicting_active(Purpose::CancelRequest, "T2", "PartnerA")
                .await,
            None
        );
    }

    #[tokio::test]
    async fn test_cancel_all_moves_every_active_id() {
        let registry = Registry::new();
        registry.add_active("T1").await;
        registry.add_active("T2").await;
        registry.cancel_all().await;

        assert!(!registry.has_active().await);
        assert!(registry.is_cancelled("T1").await);
        assert!(registry.is_cancelled("T2").await);
    }

    #[tokio::test]
    async fn test_remove_cancelled_frees_the_id() {
        let registry = Registry::new();
        registry.add_active("T1").await;
        registry.add_cancelled("T1").await;
        registry.remove_cancelled("T1").await;
        assert!(!registry.is_cancelled("T1").await);
    }
}
