//! Descent Game Engine
//!
//! Encounter resolution, reward scaling and failure consequences for the
//! dungeon descent. The crate is synchronous and platform-agnostic: storage
//! and randomness are injected by the caller.

pub mod advanced;
pub mod config;
pub mod constants;
pub mod encounter;
pub mod failure;
pub mod numbers;
pub mod resolver;
pub mod rewards;
pub mod rng;
pub mod storage;

// Re-export commonly used types
pub use advanced::hazard::{
    HazardConfig, HazardEncounter, ObstacleType, SolutionPath, create_hazard_config,
};
pub use advanced::rest_site::{
    EnergyReserve, RestAction, RestSiteConfig, RestSiteEncounter, RestSiteType, StrategicIntel,
    create_rest_site_config,
};
pub use advanced::risk_event::{
    RiskChoice, RiskEventEncounter, RiskLevel, RiskLevelConfig, create_risk_level_config,
};
pub use advanced::{
    AdvancedEncounterError, AdvancedEncounterState, AdvancedOutcome, EncounterOption,
    SelectableOption,
};
pub use config::{ResolverConfig, ResolverConfigError};
pub use encounter::{
    CollectedItem, CollectionType, EncounterOutcome, EncounterRequest, EncounterReward,
    EncounterState, EncounterStatus, EncounterType, OutcomeKind, Rarity, RewardItem,
};
pub use failure::{
    FailureConsequenceManager, FailureConsequences, FailureHistory, FailureKind,
    FailureStatistics,
};
pub use resolver::{EncounterResolver, ResolverError};
pub use rewards::{
    CollectionCatalog, calculate_depth_scaling, calculate_final_reward,
    generate_collection_reward, process_encounter_rewards, scale_reward_by_depth,
};
pub use rng::{CountingRng, encounter_stream};
pub use storage::{MemoryStorage, PersistenceAdapter, StoragePort};
