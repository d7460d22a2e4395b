//! Reward scaling by depth, encounter type, and variance.
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::constants::{
    DEFAULT_TYPE_MULTIPLIER, DEPTH_SCALING_PER_LEVEL, DISCOVERY_SITE_MULTIPLIER,
    PUZZLE_CHAMBER_MULTIPLIER, TRADE_OPPORTUNITY_MULTIPLIER, VARIANCE_BASE_SPREAD,
    VARIANCE_MAX_SPREAD, VARIANCE_SPREAD_PER_DEPTH,
};
use crate::encounter::{
    BASIC_ENCOUNTER_TYPES, CollectedItem, CollectionType, EncounterReward, EncounterType,
};
use crate::numbers::{clamp_scalar, depth_contribution, round_f64_to_u32};
use crate::rng::{pick_index, uniform_between};

const DEFAULT_COLLECTION_DATA: &str = include_str!("../data/collections.json");

/// Reward multiplier at `depth`: +20% per level, negative depths count as 0.
#[must_use]
pub fn calculate_depth_scaling(depth: i32) -> f64 {
    depth_contribution(depth).mul_add(DEPTH_SCALING_PER_LEVEL, 1.0)
}

/// Apply [`calculate_depth_scaling`] to `base`, rounded to the nearest unit.
#[must_use]
pub fn scale_reward_by_depth(base: u32, depth: i32) -> u32 {
    round_f64_to_u32(f64::from(base) * calculate_depth_scaling(depth))
}

/// Multiplier for a basic encounter type; advanced types take the default.
#[must_use]
pub const fn type_multiplier(encounter_type: EncounterType) -> f64 {
    match encounter_type {
        EncounterType::PuzzleChamber => PUZZLE_CHAMBER_MULTIPLIER,
        EncounterType::TradeOpportunity => TRADE_OPPORTUNITY_MULTIPLIER,
        EncounterType::DiscoverySite => DISCOVERY_SITE_MULTIPLIER,
        EncounterType::Hazard | EncounterType::RestSite | EncounterType::RiskEvent => {
            DEFAULT_TYPE_MULTIPLIER
        }
    }
}

/// String-keyed lookup that never fails.
#[must_use]
pub fn type_multiplier_for_key(key: &str) -> f64 {
    EncounterType::from_key(key).map_or(DEFAULT_TYPE_MULTIPLIER, type_multiplier)
}

/// Multiplier table keyed by the basic encounter types.
#[must_use]
pub fn encounter_type_multipliers() -> HashMap<EncounterType, f64> {
    BASIC_ENCOUNTER_TYPES
        .iter()
        .map(|kind| (*kind, type_multiplier(*kind)))
        .collect()
}

/// Half-width of the random factor band around 1.0 at a given depth.
#[must_use]
pub fn variance_spread(depth: i32) -> f64 {
    let extra = depth_contribution(depth.saturating_sub(1));
    extra
        .mul_add(VARIANCE_SPREAD_PER_DEPTH, VARIANCE_BASE_SPREAD)
        .min(VARIANCE_MAX_SPREAD)
}

/// `base * type * depth * random`, never zero for a positive base.
pub fn calculate_final_reward<R: RngCore + ?Sized>(
    base: u32,
    encounter_type: EncounterType,
    depth: i32,
    rng: &mut R,
) -> u32 {
    if base == 0 {
        return 0;
    }
    let spread = variance_spread(depth);
    let random_factor = uniform_between(rng, 1.0 - spread, 1.0 + spread);
    let scaled = f64::from(base)
        * type_multiplier(encounter_type)
        * calculate_depth_scaling(depth)
        * random_factor;
    round_f64_to_u32(scaled).max(1)
}

/// `round(coefficient * scalar^exponent)` with the scalar held to 1..=10.
#[must_use]
pub fn scaled_coefficient(coefficient: f64, scalar: f64, exponent: f64) -> u32 {
    round_f64_to_u32(coefficient * clamp_scalar(scalar).powf(exponent))
}

/// Apply a depth adjustment of `depth^exponent` and clamp back into 1..=10.
#[must_use]
pub fn depth_adjusted_scalar(scalar: f64, depth: i32, exponent: f64) -> f64 {
    let depth = f64::from(depth.max(1));
    clamp_scalar(clamp_scalar(scalar) * depth.powf(exponent))
}

/// Multiply each reward field independently by `modifier`.
#[must_use]
pub fn scale_reward(reward: &EncounterReward, modifier: f64) -> EncounterReward {
    let modifier = modifier.max(0.0);
    EncounterReward {
        energy: round_f64_to_u32(f64::from(reward.energy) * modifier),
        xp: round_f64_to_u32(f64::from(reward.xp) * modifier),
        items: reward.items.clone(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSet {
    pub label: String,
    pub base_value: u32,
    pub set_ids: Vec<String>,
}

/// Per-collection-type set catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionCatalog {
    pub trade_good: CollectionSet,
    pub discovery: CollectionSet,
    pub legendary: CollectionSet,
}

impl Default for CollectionCatalog {
    fn default() -> Self {
        serde_json::from_str(DEFAULT_COLLECTION_DATA).unwrap_or_else(|err| {
            log::warn!("bundled collection catalog unreadable, using fallback: {err}");
            Self::fallback()
        })
    }
}

impl CollectionCatalog {
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::default()
    }

    /// Parse a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe all three collection sets.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn fallback() -> Self {
        let set = |label: &str, base_value: u32, ids: &[&str]| CollectionSet {
            label: label.to_string(),
            base_value,
            set_ids: ids.iter().map(ToString::to_string).collect(),
        };
        Self {
            trade_good: set("Trade Good", 10, &["merchant_wares"]),
            discovery: set("Discovery", 25, &["ancient_relics"]),
            legendary: set("Legendary Relic", 100, &["dragon_hoard"]),
        }
    }

    #[must_use]
    pub const fn set_for(&self, collection_type: CollectionType) -> &CollectionSet {
        match collection_type {
            CollectionType::TradeGood => &self.trade_good,
            CollectionType::Discovery => &self.discovery,
            CollectionType::Legendary => &self.legendary,
        }
    }

    /// Deterministically build one item from the `set_index`-th set.
    #[must_use]
    pub fn build_item(
        &self,
        collection_type: CollectionType,
        depth: i32,
        set_index: usize,
        serial: u32,
    ) -> CollectedItem {
        let set = self.set_for(collection_type);
        let set_id = if set.set_ids.is_empty() {
            String::from("uncatalogued")
        } else {
            set.set_ids[set_index % set.set_ids.len()].clone()
        };
        let value = scale_reward_by_depth(set.base_value, depth);
        CollectedItem {
            id: format!("{}_{set_id}_d{depth}_{serial:08x}", collection_type.key()),
            item_type: collection_type,
            name: format!("{} ({})", set.label, title_case(&set_id)),
            description: format!("{} recovered at depth {depth}", set.label),
            set_id,
            value,
        }
    }
}

/// Process-wide catalog, loaded from the bundled JSON on first use.
#[must_use]
pub fn catalog() -> &'static CollectionCatalog {
    static CATALOG: OnceLock<CollectionCatalog> = OnceLock::new();
    CATALOG.get_or_init(CollectionCatalog::load_from_static)
}

/// Build one collectible whose value grows with depth.
pub fn generate_collection_reward<R: RngCore + ?Sized>(
    collection_type: CollectionType,
    depth: i32,
    rng: &mut R,
) -> CollectedItem {
    let catalog = catalog();
    let set_count = catalog.set_for(collection_type).set_ids.len();
    let set_index = pick_index(rng, set_count);
    catalog.build_item(collection_type, depth, set_index, rng.next_u32())
}

/// Rescale each item's value, keeping every other field.
pub fn process_encounter_rewards<R: RngCore + ?Sized>(
    items: &[CollectedItem],
    encounter_type: EncounterType,
    depth: i32,
    rng: &mut R,
) -> Vec<CollectedItem> {
    items
        .iter()
        .map(|item| CollectedItem {
            value: calculate_final_reward(item.value, encounter_type, depth, rng),
            ..item.clone()
        })
        .collect()
}

fn title_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
