//! Rest sites: safe stops that trade a little energy for recovery and intel.
use serde::{Deserialize, Serialize};

use super::{
    AdvancedEncounterError, AdvancedEncounterState, AdvancedOutcome, Curve, EncounterOption,
    OptionList, OptionMenu,
};
use crate::constants::{
    HAZARD_WARNING_XP, MAP_REVEAL_XP, REST_SITE_DEPTH_EXPONENT, SHORTCUT_HINT_XP,
};
use crate::encounter::{EncounterReward, OutcomeKind, Rarity, RewardItem};
use crate::numbers::{clamp_scalar, round_f64_to_u32};
use crate::rewards::{calculate_depth_scaling, depth_adjusted_scalar, scale_reward};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestSiteType {
    Campfire,
    HealingSpring,
    AbandonedOutpost,
    AncientShrine,
}

struct SiteWeights {
    energy: f64,
    xp: f64,
    reserve: f64,
    /// map reveals, shortcuts, hazard warnings
    intel: (f64, f64, f64),
}

impl RestSiteType {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Campfire => "campfire",
            Self::HealingSpring => "healing_spring",
            Self::AbandonedOutpost => "abandoned_outpost",
            Self::AncientShrine => "ancient_shrine",
        }
    }

    const fn weights(self) -> SiteWeights {
        match self {
            Self::Campfire => SiteWeights {
                energy: 1.0,
                xp: 0.8,
                reserve: 1.0,
                intel: (0.5, 0.0, 0.3),
            },
            Self::HealingSpring => SiteWeights {
                energy: 1.4,
                xp: 0.6,
                reserve: 1.5,
                intel: (0.0, 0.0, 0.4),
            },
            Self::AbandonedOutpost => SiteWeights {
                energy: 0.7,
                xp: 1.2,
                reserve: 0.8,
                intel: (1.0, 0.6, 0.8),
            },
            Self::AncientShrine => SiteWeights {
                energy: 0.9,
                xp: 1.5,
                reserve: 0.9,
                intel: (0.6, 0.8, 0.5),
            },
        }
    }

    const fn specific_actions(self) -> &'static [RestBlueprint] {
        match self {
            Self::Campfire => &CAMPFIRE_ACTIONS,
            Self::HealingSpring => &HEALING_SPRING_ACTIONS,
            Self::AbandonedOutpost => &ABANDONED_OUTPOST_ACTIONS,
            Self::AncientShrine => &ANCIENT_SHRINE_ACTIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyReserve {
    pub max_capacity: u32,
    pub current_capacity: u32,
    pub regeneration_rate: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StrategicIntel {
    pub map_reveals: u32,
    pub shortcuts: u32,
    pub hazard_warnings: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestSiteConfig {
    pub site_type: RestSiteType,
    pub quality: f64,
    pub base_reward: EncounterReward,
    pub energy_reserve: EnergyReserve,
    pub strategic_intel: StrategicIntel,
}

/// Build a rest-site config; deeper sites are richer and hold more energy.
#[must_use]
pub fn create_rest_site_config(
    site_type: RestSiteType,
    base_quality: f64,
    depth: i32,
) -> RestSiteConfig {
    let quality = depth_adjusted_scalar(base_quality, depth, REST_SITE_DEPTH_EXPONENT);
    let depth_scaling = calculate_depth_scaling(depth);
    let weights = site_type.weights();

    let base_reward = EncounterReward {
        energy: round_f64_to_u32(10.0 * quality.powf(0.5) * depth_scaling * weights.energy),
        xp: round_f64_to_u32(5.0 * quality.powf(0.5) * depth_scaling * weights.xp),
        items: Vec::new(),
    };
    let max_capacity =
        round_f64_to_u32(30.0 * quality.powf(0.6) * depth_scaling * weights.reserve);
    let energy_reserve = EnergyReserve {
        max_capacity,
        current_capacity: max_capacity,
        regeneration_rate: round_f64_to_u32(2.0 * quality.powf(0.4) * depth_scaling),
    };
    let intel_scale = quality.powf(0.5);
    let (maps, shortcuts, warnings) = weights.intel;
    let strategic_intel = StrategicIntel {
        map_reveals: round_f64_to_u32(maps * intel_scale),
        shortcuts: round_f64_to_u32(shortcuts * intel_scale),
        hazard_warnings: round_f64_to_u32(warnings * intel_scale),
    };

    RestSiteConfig {
        site_type,
        quality,
        base_reward,
        energy_reserve,
        strategic_intel,
    }
}

/// A rest action; these never fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestAction {
    pub id: String,
    pub name: String,
    pub description: String,
    pub energy_cost: u32,
    pub energy_gain: u32,
    pub reward_modifier: f64,
    /// Fraction of the site's intel this action uncovers.
    #[serde(default)]
    pub intel_share: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_effect: Option<String>,
}

impl RestAction {
    #[must_use]
    pub const fn success_rate(&self) -> f64 {
        1.0
    }

    #[must_use]
    pub fn reveals_intel(&self) -> bool {
        self.intel_share > 0.0
    }

    /// Energy gained minus energy spent, floored at zero.
    #[must_use]
    pub const fn net_energy(&self) -> u32 {
        self.energy_gain.saturating_sub(self.energy_cost)
    }
}

impl EncounterOption for RestAction {
    fn id(&self) -> &str {
        &self.id
    }

    fn energy_cost(&self) -> u32 {
        self.energy_cost
    }
}

#[derive(Debug, Clone, Copy)]
struct RestBlueprint {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    cost: Curve,
    gain: Curve,
    reward_modifier: f64,
    intel_share: f64,
    special_effect: Option<&'static str>,
}

impl RestBlueprint {
    fn build(&self, quality: f64) -> RestAction {
        RestAction {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            energy_cost: self.cost.at(quality),
            energy_gain: self.gain.at(quality),
            reward_modifier: self.reward_modifier,
            intel_share: self.intel_share,
            special_effect: self.special_effect.map(ToString::to_string),
        }
    }
}

const GENERIC_ACTIONS: [RestBlueprint; 3] = [
    RestBlueprint {
        id: "quick_rest",
        name: "Quick Rest",
        description: "Catch your breath before moving on.",
        cost: Curve::new(1.0, 0.3),
        gain: Curve::new(8.0, 0.6),
        reward_modifier: 0.5,
        intel_share: 0.0,
        special_effect: None,
    },
    RestBlueprint {
        id: "deep_rest",
        name: "Deep Rest",
        description: "Make camp and sleep through a full cycle.",
        cost: Curve::new(3.0, 0.4),
        gain: Curve::new(16.0, 0.7),
        reward_modifier: 1.0,
        intel_share: 0.0,
        special_effect: None,
    },
    RestBlueprint {
        id: "scout_surroundings",
        name: "Scout the Surroundings",
        description: "Use the lull to survey the tunnels ahead.",
        cost: Curve::new(4.0, 0.5),
        gain: Curve::new(2.0, 0.3),
        reward_modifier: 1.2,
        intel_share: 1.0,
        special_effect: Some("Reveals nearby intel"),
    },
];

const CAMPFIRE_ACTIONS: [RestBlueprint; 1] = [RestBlueprint {
    id: "cook_meal",
    name: "Cook a Meal",
    description: "Roast whatever the day's foraging turned up.",
    cost: Curve::new(2.0, 0.4),
    gain: Curve::new(14.0, 0.6),
    reward_modifier: 0.8,
    intel_share: 0.0,
    special_effect: Some("A hot meal restores spirits"),
}];

const HEALING_SPRING_ACTIONS: [RestBlueprint; 1] = [RestBlueprint {
    id: "bathe_in_spring",
    name: "Bathe in the Spring",
    description: "Soak in the glowing water.",
    cost: Curve::new(1.0, 0.3),
    gain: Curve::new(22.0, 0.7),
    reward_modifier: 0.6,
    intel_share: 0.0,
    special_effect: None,
}];

const ABANDONED_OUTPOST_ACTIONS: [RestBlueprint; 2] = [
    RestBlueprint {
        id: "search_supplies",
        name: "Search for Supplies",
        description: "Rummage through the outpost's crates.",
        cost: Curve::new(5.0, 0.5),
        gain: Curve::new(6.0, 0.5),
        reward_modifier: 1.4,
        intel_share: 0.0,
        special_effect: None,
    },
    RestBlueprint {
        id: "study_maps",
        name: "Study the Maps",
        description: "Pore over the charts the last expedition left behind.",
        cost: Curve::new(3.0, 0.4),
        gain: Curve::new(0.0, 1.0),
        reward_modifier: 1.0,
        intel_share: 1.5,
        special_effect: Some("Charts the levels below"),
    },
];

const ANCIENT_SHRINE_ACTIONS: [RestBlueprint; 1] = [RestBlueprint {
    id: "meditate",
    name: "Meditate",
    description: "Kneel before the shrine and listen.",
    cost: Curve::new(2.0, 0.5),
    gain: Curve::new(10.0, 0.6),
    reward_modifier: 1.5,
    intel_share: 0.5,
    special_effect: Some("Visions hint at the path ahead"),
}];

fn build_actions(site_type: RestSiteType, quality: f64) -> OptionList<RestAction> {
    GENERIC_ACTIONS
        .iter()
        .chain(site_type.specific_actions())
        .map(|blueprint| blueprint.build(quality))
        .collect()
}

/// Turn the site's intel into reward lines; zero-quantity lines are skipped.
#[must_use]
pub fn synthesize_intel(intel: &StrategicIntel, share: f64) -> Vec<RewardItem> {
    if share <= 0.0 {
        return Vec::new();
    }
    let lines = [
        (
            intel.map_reveals,
            "map_reveal",
            "Map Reveal",
            Rarity::Common,
            MAP_REVEAL_XP,
        ),
        (
            intel.shortcuts,
            "shortcut_hint",
            "Shortcut Hint",
            Rarity::Rare,
            SHORTCUT_HINT_XP,
        ),
        (
            intel.hazard_warnings,
            "hazard_warning",
            "Hazard Warning",
            Rarity::Uncommon,
            HAZARD_WARNING_XP,
        ),
    ];
    lines
        .into_iter()
        .filter_map(|(count, id, name, rarity, xp_value)| {
            let quantity = round_f64_to_u32(f64::from(count) * share);
            (quantity > 0).then(|| RewardItem {
                id: id.to_string(),
                name: name.to_string(),
                rarity,
                quantity,
                xp_value,
            })
        })
        .collect()
}

fn rest_outcome(config: &RestSiteConfig, action: &RestAction) -> AdvancedOutcome {
    let scaled = scale_reward(&config.base_reward, action.reward_modifier);
    let capacity = config.energy_reserve.current_capacity;
    let energy = scaled.energy.saturating_add(action.net_energy()).min(capacity);
    let items = synthesize_intel(&config.strategic_intel, action.intel_share);
    let intel_xp = items
        .iter()
        .map(RewardItem::total_xp)
        .fold(0u32, u32::saturating_add);

    AdvancedOutcome {
        kind: OutcomeKind::Success,
        option_id: action.id.clone(),
        energy_spent: action.energy_cost,
        reward: Some(EncounterReward {
            energy,
            xp: scaled.xp.saturating_add(intel_xp),
            items,
        }),
        consequences: None,
        special_effect: action.special_effect.clone(),
        roll: None,
        legendary_reward: None,
        reserve_remaining: Some(capacity - energy),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestSiteEncounter {
    id: String,
    config: RestSiteConfig,
    menu: OptionMenu<RestAction>,
}

impl RestSiteEncounter {
    #[must_use]
    pub fn new(id: impl Into<String>, mut config: RestSiteConfig) -> Self {
        config.quality = clamp_scalar(config.quality);
        let actions = build_actions(config.site_type, config.quality);
        Self {
            id: id.into(),
            config,
            menu: OptionMenu::new(actions),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn config(&self) -> &RestSiteConfig {
        &self.config
    }

    #[must_use]
    pub fn actions(&self) -> &[RestAction] {
        self.menu.options()
    }

    #[must_use]
    pub fn selected_action(&self) -> Option<&RestAction> {
        self.menu.selected()
    }

    pub fn affordable_actions(&self, energy: u32) -> impl Iterator<Item = &RestAction> {
        self.menu.affordable(energy)
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.menu.is_resolved()
    }

    pub fn select_action(&mut self, action_id: &str) -> bool {
        self.menu.select(action_id)
    }

    /// Resolve the selected action; rest sites always succeed.
    ///
    /// # Errors
    ///
    /// Returns [`AdvancedEncounterError::NoSelection`] if no action was selected.
    pub fn resolve(&mut self) -> Result<&AdvancedOutcome, AdvancedEncounterError> {
        let config = &self.config;
        self.menu.resolve_with(|action| rest_outcome(config, action))
    }

    #[must_use]
    pub fn state(&self) -> AdvancedEncounterState<RestSiteConfig, RestAction> {
        AdvancedEncounterState::capture(&self.id, &self.config, &self.menu)
    }
}
