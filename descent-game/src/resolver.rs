//! Lifecycle of basic encounters: start, progress, complete.
//!
//! One encounter may be active per resolver. The active encounter is mirrored
//! into a single storage slot so a restarted resolver can pick it back up;
//! storage trouble is logged and otherwise ignored.
use chrono::Utc;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde_json::Value;
use thiserror::Error;

use crate::config::{ResolverConfig, ResolverConfigError};
use crate::encounter::{
    EncounterOutcome, EncounterRequest, EncounterState, EncounterStatus, EncounterType,
    OutcomeKind,
};
use crate::storage::{PersistenceAdapter, StoragePort};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ResolverError {
    #[error("Encounter is already active")]
    AlreadyActive,
    #[error("No active encounter")]
    NoActiveEncounter,
}

pub struct EncounterResolver<S: StoragePort> {
    config: ResolverConfig,
    persistence: PersistenceAdapter<S>,
    rng: ChaCha20Rng,
    current: Option<EncounterState>,
    history: Vec<EncounterState>,
}

impl<S: StoragePort> EncounterResolver<S> {
    /// Build a resolver with the default config and restore any persisted encounter.
    pub fn new(storage: S) -> Self {
        Self::build(storage, ResolverConfig::default_config())
    }

    /// # Errors
    ///
    /// Returns `ResolverConfigError` if the config fails validation.
    pub fn with_config(storage: S, config: ResolverConfig) -> Result<Self, ResolverConfigError> {
        config.validate()?;
        Ok(Self::build(storage, config))
    }

    fn build(storage: S, config: ResolverConfig) -> Self {
        let persistence = PersistenceAdapter::new(storage, config.storage_key.clone());
        let rng = ChaCha20Rng::seed_from_u64(config.seed);
        let mut resolver = Self {
            config,
            persistence,
            rng,
            current: None,
            history: Vec::new(),
        };
        resolver.load_persisted_state();
        resolver
    }

    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        self.persistence.storage()
    }

    /// Open a new encounter.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::AlreadyActive`] while another encounter is active.
    pub fn start_encounter(
        &mut self,
        request: EncounterRequest,
    ) -> Result<&EncounterState, ResolverError> {
        if self.is_encounter_active() {
            return Err(ResolverError::AlreadyActive);
        }
        let start_time = now_millis();
        let id = format!("encounter_{start_time}_{:08x}", self.rng.next_u32());
        log::debug!(
            "starting {} encounter {id} at node {} (depth {})",
            request.encounter_type.key(),
            request.node_id,
            request.depth
        );
        let state = EncounterState {
            id,
            encounter_type: request.encounter_type,
            node_id: request.node_id,
            depth: request.depth,
            energy_cost: request.energy_cost,
            status: EncounterStatus::Active,
            progress: None,
            outcome: None,
            start_time,
            end_time: None,
        };
        self.persistence.write(Some(&state));
        Ok(&*self.current.insert(state))
    }

    /// Replace the progress payload of the active encounter and persist it.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::NoActiveEncounter`] if nothing is active.
    pub fn update_encounter_progress(&mut self, progress: Value) -> Result<(), ResolverError> {
        let state = self
            .current
            .as_mut()
            .ok_or(ResolverError::NoActiveEncounter)?;
        state.progress = Some(progress);
        self.persistence.write(Some(&*state));
        Ok(())
    }

    /// Finalize the active encounter, move it into history, and clear the slot.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::NoActiveEncounter`] if nothing is active.
    pub fn complete_encounter(
        &mut self,
        result: OutcomeKind,
        outcome: EncounterOutcome,
    ) -> Result<EncounterState, ResolverError> {
        let mut state = self
            .current
            .take()
            .ok_or(ResolverError::NoActiveEncounter)?;
        state.status = if result.is_success() {
            EncounterStatus::Completed
        } else {
            EncounterStatus::Failed
        };
        state.outcome = Some(outcome);
        state.end_time = Some(now_millis());
        log::debug!("encounter {} finished as {:?}", state.id, state.status);

        self.history.push(state.clone());
        self.persistence.clear();
        Ok(state)
    }

    #[must_use]
    pub const fn current_state(&self) -> Option<&EncounterState> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn is_encounter_active(&self) -> bool {
        self.current.as_ref().is_some_and(EncounterState::is_active)
    }

    /// Finished encounters in completion order.
    #[must_use]
    pub fn encounter_history(&self) -> &[EncounterState] {
        &self.history
    }

    /// Drop the active encounter without recording it.
    pub fn clear_encounter_state(&mut self) {
        if let Some(state) = self.current.take() {
            log::debug!("abandoning encounter {}", state.id);
        }
        self.persistence.clear();
    }

    #[must_use]
    pub fn encounter_type(&self) -> Option<EncounterType> {
        self.current.as_ref().map(|state| state.encounter_type)
    }

    #[must_use]
    pub fn encounter_handler(&self) -> Option<&'static str> {
        self.encounter_type().and_then(EncounterType::handler_name)
    }

    /// Only the basic types are handled here.
    #[must_use]
    pub const fn is_valid_encounter_type(encounter_type: EncounterType) -> bool {
        encounter_type.is_basic()
    }

    #[must_use]
    pub fn is_valid_encounter_type_key(key: &str) -> bool {
        EncounterType::from_key(key).is_some_and(Self::is_valid_encounter_type)
    }

    /// Mirror the active encounter into storage, if there is one.
    pub fn save_encounter_state(&self) {
        if let Some(state) = &self.current {
            self.persistence.write(Some(state));
        }
    }

    /// Adopt a well-formed active encounter from storage; anything else is discarded.
    ///
    /// Returns whether a persisted encounter was adopted.
    pub fn load_persisted_state(&mut self) -> bool {
        let Some(state) = self.persistence.restore(is_restorable) else {
            return false;
        };
        log::debug!("restored encounter {}", state.id);
        self.current = Some(state);
        true
    }
}

fn is_restorable(state: &EncounterState) -> bool {
    state.is_active() && !state.id.is_empty() && !state.node_id.is_empty()
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::FailureKind;
    use crate::storage::{MemoryStorage, StoragePort};
    use serde_json::json;

    const SLOT: &str = "descent.active_encounter";

    fn request(encounter_type: EncounterType) -> EncounterRequest {
        EncounterRequest {
            encounter_type,
            node_id: "node-7".into(),
            depth: 2,
            energy_cost: 12,
        }
    }

    #[test]
    fn start_persists_and_rejects_second_start() {
        let storage = MemoryStorage::new();
        let mut resolver = EncounterResolver::new(storage.clone());
        let id = resolver
            .start_encounter(request(EncounterType::TradeOpportunity))
            .unwrap()
            .id
            .clone();
        assert!(id.starts_with("encounter_"));
        assert!(resolver.is_encounter_active());
        assert!(storage.peek(SLOT).is_some());

        let err = resolver
            .start_encounter(request(EncounterType::PuzzleChamber))
            .unwrap_err();
        assert_eq!(err.to_string(), "Encounter is already active");
        assert_eq!(resolver.current_state().map(|s| s.id.as_str()), Some(id.as_str()));
    }

    #[test]
    fn progress_requires_active_encounter() {
        let storage = MemoryStorage::new();
        let mut resolver = EncounterResolver::new(storage.clone());
        assert_eq!(
            resolver.update_encounter_progress(json!({ "step": 1 })),
            Err(ResolverError::NoActiveEncounter)
        );
        resolver
            .start_encounter(request(EncounterType::DiscoverySite))
            .unwrap();
        resolver
            .update_encounter_progress(json!({ "step": 2 }))
            .unwrap();
        let stored = storage.peek(SLOT).unwrap();
        assert_eq!(stored["progress"]["step"], 2);
    }

    #[test]
    fn failure_moves_to_history_as_failed() {
        let storage = MemoryStorage::new();
        let mut resolver = EncounterResolver::new(storage.clone());
        resolver
            .start_encounter(request(EncounterType::PuzzleChamber))
            .unwrap();
        let outcome = EncounterOutcome::failure(FailureKind::EnergyExhausted, 12);
        let finished = resolver
            .complete_encounter(OutcomeKind::Failure, outcome.clone())
            .unwrap();
        assert_eq!(finished.status, EncounterStatus::Failed);
        assert!(finished.end_time.is_some());
        assert_eq!(resolver.encounter_history().len(), 1);
        assert_eq!(resolver.encounter_history()[0].outcome, Some(outcome));
        assert!(resolver.current_state().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn handler_lookup_follows_current_type() {
        let storage = MemoryStorage::new();
        let mut resolver = EncounterResolver::new(storage.clone());
        assert_eq!(resolver.encounter_handler(), None);
        resolver
            .start_encounter(request(EncounterType::TradeOpportunity))
            .unwrap();
        assert_eq!(
            resolver.encounter_type(),
            Some(EncounterType::TradeOpportunity)
        );
        assert_eq!(
            resolver.encounter_handler(),
            Some("TradeOpportunityHandler")
        );
        assert!(storage.peek(SLOT).is_some());
        resolver.clear_encounter_state();
        assert!(!resolver.is_encounter_active());
        assert!(resolver.encounter_history().is_empty());
        assert!(storage.peek(SLOT).is_none());
    }

    #[test]
    fn save_rewrites_a_wiped_slot() {
        let storage = MemoryStorage::new();
        let mut resolver = EncounterResolver::new(storage.clone());
        resolver.save_encounter_state();
        assert!(storage.is_empty());

        let id = resolver
            .start_encounter(request(EncounterType::DiscoverySite))
            .unwrap()
            .id
            .clone();
        storage.set_item(SLOT, None).unwrap();
        assert!(storage.peek(SLOT).is_none());

        resolver.save_encounter_state();
        let stored = storage.peek(SLOT).unwrap();
        assert_eq!(stored["id"], id.as_str());
        assert_eq!(stored["status"], "active");
        assert_eq!(stored["type"], "discovery_site");
    }

    #[test]
    fn only_basic_types_are_valid() {
        type Resolver = EncounterResolver<MemoryStorage>;
        assert!(Resolver::is_valid_encounter_type(EncounterType::PuzzleChamber));
        assert!(!Resolver::is_valid_encounter_type(EncounterType::Hazard));
        assert!(Resolver::is_valid_encounter_type_key("discovery_site"));
        assert!(!Resolver::is_valid_encounter_type_key("rest_site"));
        assert!(!Resolver::is_valid_encounter_type_key("dragon_lair"));
    }

    #[test]
    fn seeded_ids_differ_between_starts() {
        let mut resolver = EncounterResolver::new(MemoryStorage::new());
        let first = resolver
            .start_encounter(request(EncounterType::PuzzleChamber))
            .unwrap()
            .id
            .clone();
        resolver.clear_encounter_state();
        let second = resolver
            .start_encounter(request(EncounterType::PuzzleChamber))
            .unwrap()
            .id
            .clone();
        assert_ne!(first, second);
    }

    #[test]
    fn blank_storage_key_is_rejected() {
        let config = ResolverConfig {
            storage_key: String::new(),
            ..ResolverConfig::default_config()
        };
        assert!(matches!(
            EncounterResolver::with_config(MemoryStorage::new(), config),
            Err(ResolverConfigError::EmptyStorageKey)
        ));
    }
}
