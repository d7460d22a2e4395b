use descent_game::{
    CollectionType, EncounterOutcome, EncounterRequest, EncounterResolver, EncounterStatus,
    EncounterType, FailureConsequenceManager, FailureKind, MemoryStorage, OutcomeKind,
    ResolverConfig, ResolverError, StoragePort, generate_collection_reward,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde_json::json;

const SLOT: &str = "descent.active_encounter";

fn puzzle_request() -> EncounterRequest {
    EncounterRequest {
        encounter_type: EncounterType::PuzzleChamber,
        node_id: "node-1".into(),
        depth: 1,
        energy_cost: 15,
    }
}

#[test]
fn puzzle_chamber_runs_start_to_finish() {
    let storage = MemoryStorage::new();
    let mut resolver = EncounterResolver::new(storage.clone());

    let started = resolver.start_encounter(puzzle_request()).unwrap();
    assert_eq!(started.status, EncounterStatus::Active);
    assert_eq!(started.encounter_type, EncounterType::PuzzleChamber);
    assert_eq!(started.depth, 1);
    assert_eq!(started.energy_cost, 15);
    assert_eq!(resolver.encounter_handler(), Some("PuzzleChamberHandler"));

    let mut rng = SmallRng::seed_from_u64(0x00D1_CE00);
    let relic = generate_collection_reward(CollectionType::Discovery, 1, &mut rng);
    let outcome = EncounterOutcome::success(vec![relic.clone()], 15);
    assert_eq!(outcome.items_gained, vec![relic.id.clone()]);

    resolver
        .complete_encounter(OutcomeKind::Success, outcome.clone())
        .unwrap();
    assert!(resolver.current_state().is_none());
    assert!(!resolver.is_encounter_active());
    let history = resolver.encounter_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, EncounterStatus::Completed);
    assert_eq!(history[0].outcome.as_ref(), Some(&outcome));
    assert!(storage.peek(SLOT).is_none());
}

#[test]
fn protocol_violations_are_errors() {
    let mut resolver = EncounterResolver::new(MemoryStorage::new());
    let err = resolver
        .complete_encounter(OutcomeKind::Success, EncounterOutcome::default())
        .unwrap_err();
    assert_eq!(err, ResolverError::NoActiveEncounter);
    assert_eq!(err.to_string(), "No active encounter");

    resolver.start_encounter(puzzle_request()).unwrap();
    let err = resolver.start_encounter(puzzle_request()).unwrap_err();
    assert_eq!(err.to_string(), "Encounter is already active");
    assert!(resolver.encounter_history().is_empty());
}

#[test]
fn restarted_resolver_restores_active_encounter() {
    let storage = MemoryStorage::new();
    let id = {
        let mut resolver = EncounterResolver::new(storage.clone());
        let id = resolver.start_encounter(puzzle_request()).unwrap().id.clone();
        resolver
            .update_encounter_progress(json!({ "tiles_solved": 3 }))
            .unwrap();
        id
    };

    let mut restored = EncounterResolver::new(storage.clone());
    let state = restored.current_state().unwrap();
    assert_eq!(state.id, id);
    assert_eq!(state.progress, Some(json!({ "tiles_solved": 3 })));
    assert!(restored.is_encounter_active());

    restored
        .complete_encounter(OutcomeKind::Success, EncounterOutcome::default())
        .unwrap();
    assert!(EncounterResolver::new(storage).current_state().is_none());
}

#[test]
fn invalid_persisted_state_is_discarded() {
    let storage = MemoryStorage::new();
    storage
        .set_item(SLOT, Some(json!({ "id": "encounter_1", "type": "puzzle_chamber" })))
        .unwrap();
    let resolver = EncounterResolver::new(storage.clone());
    assert!(resolver.current_state().is_none());
    assert!(storage.peek(SLOT).is_none());

    let finished = json!({
        "id": "encounter_2",
        "type": "trade_opportunity",
        "node_id": "node-9",
        "depth": 4,
        "energy_cost": 20,
        "status": "completed",
        "start_time": 1_700_000_000_000_i64,
    });
    storage.set_item(SLOT, Some(finished)).unwrap();
    let resolver = EncounterResolver::new(storage.clone());
    assert!(resolver.current_state().is_none());
    assert!(storage.is_empty());
}

#[test]
fn custom_storage_key_is_honoured() {
    let storage = MemoryStorage::new();
    let config = ResolverConfig {
        storage_key: "slot.b".into(),
        ..ResolverConfig::default_config()
    };
    let mut resolver = EncounterResolver::with_config(storage.clone(), config).unwrap();
    resolver.start_encounter(puzzle_request()).unwrap();
    assert!(storage.peek("slot.b").is_some());
    assert!(storage.peek(SLOT).is_none());
}

#[test]
fn failed_encounter_feeds_consequence_manager() {
    let mut resolver = EncounterResolver::new(MemoryStorage::new());
    let mut manager = FailureConsequenceManager::new();
    let request = EncounterRequest {
        encounter_type: EncounterType::TradeOpportunity,
        node_id: "market".into(),
        depth: 4,
        energy_cost: 10,
    };
    let id = resolver.start_encounter(request).unwrap().id.clone();

    let consequences =
        manager.process_failure_consequences(FailureKind::EncounterLockout, 4, &id);
    assert_eq!(consequences.energy_loss, 28);
    assert!(consequences.encounter_lockout);
    assert!(consequences.description.contains("depth 4"));
    assert!(manager.is_encounter_locked_out(&id));
    assert!(!manager.is_encounter_locked_out("market"));

    let outcome = EncounterOutcome::failure(FailureKind::EncounterLockout, 10)
        .with_items_lost(vec!["trade_ledger".into()]);
    let finished = resolver
        .complete_encounter(OutcomeKind::Failure, outcome)
        .unwrap();
    assert_eq!(finished.status, EncounterStatus::Failed);
    let recorded = finished.outcome.as_ref().unwrap();
    assert_eq!(recorded.items_lost, vec!["trade_ledger"]);
    assert_eq!(manager.consecutive_failures(&id), 1);
    assert_eq!(manager.failure_statistics().total_failures, 1);
}
