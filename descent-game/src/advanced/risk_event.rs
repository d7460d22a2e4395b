//! Risk events: a gamble whose stakes grow with the declared risk level.
//!
//! Extreme events carry a legendary collectible that is only handed out when
//! the chosen gamble pays off.
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::{
    AdvancedEncounterError, AdvancedEncounterState, AdvancedOutcome, Curve, OptionBlueprint,
    OptionMenu, SelectableOption, SuccessCurve, build_options, resolve_risky_option,
};
use crate::constants::RISK_EVENT_DEPTH_EXPONENT;
use crate::encounter::{CollectedItem, CollectionType, EncounterReward};
use crate::failure::ConsequenceProfile;
use crate::numbers::{clamp_scalar, round_f64_to_u32};
use crate::rewards::{calculate_depth_scaling, catalog, depth_adjusted_scalar};

pub type RiskChoice = SelectableOption;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Extreme,
}

impl RiskLevel {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Extreme => "extreme",
        }
    }

    #[must_use]
    pub const fn reward_multiplier(self) -> f64 {
        match self {
            Self::Low => 1.0,
            Self::Moderate => 1.4,
            Self::High => 2.0,
            Self::Extreme => 3.0,
        }
    }

    #[must_use]
    pub const fn danger_multiplier(self) -> f64 {
        match self {
            Self::Low => 0.6,
            Self::Moderate => 1.0,
            Self::High => 1.5,
            Self::Extreme => 2.2,
        }
    }

    const fn specific_choices(self) -> &'static [OptionBlueprint] {
        match self {
            Self::Low => &LOW_RISK_CHOICES,
            Self::Moderate => &MODERATE_RISK_CHOICES,
            Self::High => &HIGH_RISK_CHOICES,
            Self::Extreme => &EXTREME_RISK_CHOICES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLevelConfig {
    pub risk_level: RiskLevel,
    pub difficulty: f64,
    pub base_reward: EncounterReward,
    pub failure_consequence: ConsequenceProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legendary_reward: Option<CollectedItem>,
}

/// Build a risk-event config; only extreme events carry a legendary prize.
#[must_use]
pub fn create_risk_level_config(
    risk_level: RiskLevel,
    base_difficulty: f64,
    depth: i32,
) -> RiskLevelConfig {
    let difficulty = depth_adjusted_scalar(base_difficulty, depth, RISK_EVENT_DEPTH_EXPONENT);
    let depth_scaling = calculate_depth_scaling(depth);
    let reward_weight = risk_level.reward_multiplier();
    let danger_weight = risk_level.danger_multiplier();

    let base_reward = EncounterReward {
        energy: round_f64_to_u32(6.0 * difficulty.powf(0.5) * depth_scaling * reward_weight),
        xp: round_f64_to_u32(20.0 * difficulty.powf(0.6) * depth_scaling * reward_weight),
        items: Vec::new(),
    };
    let mut failure_consequence = ConsequenceProfile::for_depth(
        8.0 * danger_weight,
        0.08 * danger_weight,
        difficulty,
        0.5,
        depth,
    );
    failure_consequence.forced_retreat = risk_level == RiskLevel::Extreme;

    let legendary_reward = (risk_level == RiskLevel::Extreme).then(|| {
        let set_index = usize::try_from(depth.max(0)).unwrap_or_default();
        catalog().build_item(
            CollectionType::Legendary,
            depth,
            set_index,
            round_f64_to_u32(difficulty * 1000.0),
        )
    });

    RiskLevelConfig {
        risk_level,
        difficulty,
        base_reward,
        failure_consequence,
        legendary_reward,
    }
}

const GENERIC_CHOICES: [OptionBlueprint; 3] = [
    OptionBlueprint {
        id: "play_it_safe",
        name: "Play It Safe",
        description: "Take the smallest stake on offer.",
        cost: Curve::new(3.0, 0.5),
        success: SuccessCurve::new(0.9, 0.03, 1.0),
        reward_modifier: 0.7,
        consequence_modifier: 0.5,
        special_effect: None,
    },
    OptionBlueprint {
        id: "calculated_risk",
        name: "Calculated Risk",
        description: "Weigh the odds and commit to a measured bet.",
        cost: Curve::new(5.0, 0.5),
        success: SuccessCurve::new(0.75, 0.04, 1.0),
        reward_modifier: 1.3,
        consequence_modifier: 1.2,
        special_effect: None,
    },
    OptionBlueprint {
        id: "all_in",
        name: "All In",
        description: "Stake everything on a single throw.",
        cost: Curve::new(8.0, 0.6),
        success: SuccessCurve::new(0.55, 0.04, 1.0),
        reward_modifier: 2.2,
        consequence_modifier: 2.1,
        special_effect: Some("Losing everything seals the event"),
    },
];

const LOW_RISK_CHOICES: [OptionBlueprint; 1] = [OptionBlueprint {
    id: "walk_away",
    name: "Walk Away",
    description: "Pocket a token for showing up and leave.",
    cost: Curve::new(1.0, 0.3),
    success: SuccessCurve::new(0.95, 0.01, 1.0),
    reward_modifier: 0.4,
    consequence_modifier: 0.2,
    special_effect: None,
}];

const MODERATE_RISK_CHOICES: [OptionBlueprint; 1] = [OptionBlueprint {
    id: "bargain",
    name: "Bargain",
    description: "Haggle the stakes down before playing.",
    cost: Curve::new(4.0, 0.5),
    success: SuccessCurve::new(0.8, 0.03, 1.0),
    reward_modifier: 1.1,
    consequence_modifier: 0.8,
    special_effect: None,
}];

const HIGH_RISK_CHOICES: [OptionBlueprint; 2] = [
    OptionBlueprint {
        id: "double_down",
        name: "Double Down",
        description: "Raise the stakes after the first win.",
        cost: Curve::new(7.0, 0.6),
        success: SuccessCurve::new(0.6, 0.04, 1.0),
        reward_modifier: 2.0,
        consequence_modifier: 1.8,
        special_effect: None,
    },
    OptionBlueprint {
        id: "hedge_bets",
        name: "Hedge Your Bets",
        description: "Spread the stake across several outcomes.",
        cost: Curve::new(6.0, 0.5),
        success: SuccessCurve::new(0.82, 0.03, 1.0),
        reward_modifier: 1.0,
        consequence_modifier: 0.7,
        special_effect: None,
    },
];

const EXTREME_RISK_CHOICES: [OptionBlueprint; 2] = [
    OptionBlueprint {
        id: "gamble_everything",
        name: "Gamble Everything",
        description: "Wager the whole expedition on the outcome.",
        cost: Curve::new(10.0, 0.7),
        success: SuccessCurve::new(0.5, 0.03, 1.1),
        reward_modifier: 3.0,
        consequence_modifier: 2.5,
        special_effect: Some("The stakes are sealed in blood"),
    },
    OptionBlueprint {
        id: "seek_omen",
        name: "Seek an Omen",
        description: "Read the signs before committing.",
        cost: Curve::new(5.0, 0.6),
        success: SuccessCurve::new(0.7, 0.03, 1.0),
        reward_modifier: 1.5,
        consequence_modifier: 1.3,
        special_effect: Some("Omens reveal the event's weak point"),
    },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEventEncounter {
    id: String,
    config: RiskLevelConfig,
    menu: OptionMenu<RiskChoice>,
}

impl RiskEventEncounter {
    #[must_use]
    pub fn new(id: impl Into<String>, mut config: RiskLevelConfig) -> Self {
        config.difficulty = clamp_scalar(config.difficulty);
        let choices = build_options(
            &GENERIC_CHOICES,
            config.risk_level.specific_choices(),
            config.difficulty,
        );
        Self {
            id: id.into(),
            config,
            menu: OptionMenu::new(choices),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn config(&self) -> &RiskLevelConfig {
        &self.config
    }

    #[must_use]
    pub fn choices(&self) -> &[RiskChoice] {
        self.menu.options()
    }

    #[must_use]
    pub fn selected_choice(&self) -> Option<&RiskChoice> {
        self.menu.selected()
    }

    pub fn affordable_choices(&self, energy: u32) -> impl Iterator<Item = &RiskChoice> {
        self.menu.affordable(energy)
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.menu.is_resolved()
    }

    pub fn select_choice(&mut self, choice_id: &str) -> bool {
        self.menu.select(choice_id)
    }

    /// Roll the selected choice once; a win on an extreme event also
    /// grants the legendary reward.
    ///
    /// # Errors
    ///
    /// Returns [`AdvancedEncounterError::NoSelection`] if no choice was selected.
    pub fn resolve<R: RngCore + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<&AdvancedOutcome, AdvancedEncounterError> {
        let config = &self.config;
        self.menu.resolve_with(|choice| {
            let mut outcome = resolve_risky_option(
                choice,
                &config.base_reward,
                &config.failure_consequence,
                rng,
            );
            if outcome.is_success() {
                outcome.legendary_reward.clone_from(&config.legendary_reward);
            }
            outcome
        })
    }

    #[must_use]
    pub fn state(&self) -> AdvancedEncounterState<RiskLevelConfig, RiskChoice> {
        AdvancedEncounterState::capture(&self.id, &self.config, &self.menu)
    }
}
