//! Shared encounter data model.
use serde::{Deserialize, Serialize};

use crate::failure::FailureKind;

/// Every kind of encounter the descent can place on a node.
///
/// The first three are basic encounters driven through
/// [`EncounterResolver`](crate::resolver::EncounterResolver); the rest have
/// dedicated option-driven state machines under [`crate::advanced`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterType {
    PuzzleChamber,
    TradeOpportunity,
    DiscoverySite,
    Hazard,
    RestSite,
    RiskEvent,
}

pub const BASIC_ENCOUNTER_TYPES: [EncounterType; 3] = [
    EncounterType::PuzzleChamber,
    EncounterType::TradeOpportunity,
    EncounterType::DiscoverySite,
];

pub const ALL_ENCOUNTER_TYPES: [EncounterType; 6] = [
    EncounterType::PuzzleChamber,
    EncounterType::TradeOpportunity,
    EncounterType::DiscoverySite,
    EncounterType::Hazard,
    EncounterType::RestSite,
    EncounterType::RiskEvent,
];

impl EncounterType {
    /// Snake-case wire key, matching the serde tag.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::PuzzleChamber => "puzzle_chamber",
            Self::TradeOpportunity => "trade_opportunity",
            Self::DiscoverySite => "discovery_site",
            Self::Hazard => "hazard",
            Self::RestSite => "rest_site",
            Self::RiskEvent => "risk_event",
        }
    }

    /// Parse a wire key, returning `None` for anything outside the taxonomy.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        ALL_ENCOUNTER_TYPES
            .iter()
            .copied()
            .find(|kind| kind.key() == key)
    }

    /// Whether the resolver drives this type directly.
    #[must_use]
    pub const fn is_basic(self) -> bool {
        matches!(
            self,
            Self::PuzzleChamber | Self::TradeOpportunity | Self::DiscoverySite
        )
    }

    /// Logical handler name for basic encounters.
    #[must_use]
    pub const fn handler_name(self) -> Option<&'static str> {
        match self {
            Self::PuzzleChamber => Some("PuzzleChamberHandler"),
            Self::TradeOpportunity => Some("TradeOpportunityHandler"),
            Self::DiscoverySite => Some("DiscoverySiteHandler"),
            Self::Hazard | Self::RestSite | Self::RiskEvent => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterStatus {
    Active,
    Completed,
    Failed,
}

/// Binary result of resolving an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Failure,
}

impl OutcomeKind {
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionType {
    TradeGood,
    Discovery,
    Legendary,
}

impl CollectionType {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::TradeGood => "trade_good",
            Self::Discovery => "discovery",
            Self::Legendary => "legendary",
        }
    }
}

/// A collectible granted by an encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedItem {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: CollectionType,
    pub set_id: String,
    pub name: String,
    pub description: String,
    pub value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
}

/// A stackable reward line, such as scouting intel from a rest site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardItem {
    pub id: String,
    pub name: String,
    pub rarity: Rarity,
    pub quantity: u32,
    /// Experience granted per unit.
    pub xp_value: u32,
}

impl RewardItem {
    #[must_use]
    pub const fn total_xp(&self) -> u32 {
        self.xp_value.saturating_mul(self.quantity)
    }
}

/// Reward bundle carried by advanced encounter configs and outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncounterReward {
    pub energy: u32,
    pub xp: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<RewardItem>,
}

/// Result attached to a completed basic encounter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncounterOutcome {
    pub success: bool,
    #[serde(default)]
    pub rewards: Vec<CollectedItem>,
    pub energy_consumed: u32,
    #[serde(default)]
    pub items_gained: Vec<String>,
    #[serde(default)]
    pub items_lost: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_value: Option<u32>,
}

impl EncounterOutcome {
    /// Successful outcome; the aggregate value sums the granted rewards.
    #[must_use]
    pub fn success(rewards: Vec<CollectedItem>, energy_consumed: u32) -> Self {
        let reward_value = rewards
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.value));
        let items_gained = rewards.iter().map(|item| item.id.clone()).collect();
        Self {
            success: true,
            rewards,
            energy_consumed,
            items_gained,
            items_lost: Vec::new(),
            failure_kind: None,
            reward_value: Some(reward_value),
        }
    }

    #[must_use]
    pub fn failure(kind: FailureKind, energy_consumed: u32) -> Self {
        Self {
            success: false,
            energy_consumed,
            failure_kind: Some(kind),
            ..Self::default()
        }
    }

    /// Attach the ids of items forfeited by a failure.
    #[must_use]
    pub fn with_items_lost(mut self, items_lost: Vec<String>) -> Self {
        self.items_lost = items_lost;
        self
    }
}

/// Parameters for starting a basic encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterRequest {
    #[serde(rename = "type")]
    pub encounter_type: EncounterType,
    pub node_id: String,
    pub depth: i32,
    pub energy_cost: u32,
}

/// Lifecycle record for a basic encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterState {
    pub id: String,
    #[serde(rename = "type")]
    pub encounter_type: EncounterType,
    pub node_id: String,
    pub depth: i32,
    pub energy_cost: u32,
    pub status: EncounterStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<EncounterOutcome>,
    /// Unix epoch milliseconds.
    pub start_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
}

impl EncounterState {
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, EncounterStatus::Active)
    }
}
