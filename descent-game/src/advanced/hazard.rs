//! Environmental hazards resolved by choosing a solution path.
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::{
    AdvancedEncounterError, AdvancedEncounterState, AdvancedOutcome, Curve, OptionBlueprint,
    OptionMenu, SelectableOption, SuccessCurve, build_options, resolve_risky_option,
};
use crate::constants::{HAZARD_DEPTH_EXPONENT, HAZARD_FORCED_RETREAT_DIFFICULTY};
use crate::encounter::EncounterReward;
use crate::failure::ConsequenceProfile;
use crate::numbers::{clamp_scalar, round_f64_to_u32};
use crate::rewards::{calculate_depth_scaling, depth_adjusted_scalar};

pub type SolutionPath = SelectableOption;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleType {
    CollapsedPassage,
    FloodedTunnel,
    UnstableBridge,
    ToxicVents,
    ArcaneBarrier,
}

impl ObstacleType {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::CollapsedPassage => "collapsed_passage",
            Self::FloodedTunnel => "flooded_tunnel",
            Self::UnstableBridge => "unstable_bridge",
            Self::ToxicVents => "toxic_vents",
            Self::ArcaneBarrier => "arcane_barrier",
        }
    }

    /// (reward weight, danger weight)
    const fn weights(self) -> (f64, f64) {
        match self {
            Self::CollapsedPassage => (1.0, 1.0),
            Self::FloodedTunnel => (1.1, 1.2),
            Self::UnstableBridge => (1.2, 1.4),
            Self::ToxicVents => (1.15, 1.3),
            Self::ArcaneBarrier => (1.4, 1.5),
        }
    }

    const fn specific_paths(self) -> &'static [OptionBlueprint] {
        match self {
            Self::CollapsedPassage => &COLLAPSED_PASSAGE_PATHS,
            Self::FloodedTunnel => &FLOODED_TUNNEL_PATHS,
            Self::UnstableBridge => &UNSTABLE_BRIDGE_PATHS,
            Self::ToxicVents => &TOXIC_VENTS_PATHS,
            Self::ArcaneBarrier => &ARCANE_BARRIER_PATHS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardConfig {
    pub obstacle_type: ObstacleType,
    pub difficulty: f64,
    pub base_reward: EncounterReward,
    pub failure_consequence: ConsequenceProfile,
}

/// Build a hazard config whose numbers all rise with depth.
#[must_use]
pub fn create_hazard_config(
    obstacle_type: ObstacleType,
    base_difficulty: f64,
    depth: i32,
) -> HazardConfig {
    let difficulty = depth_adjusted_scalar(base_difficulty, depth, HAZARD_DEPTH_EXPONENT);
    let depth_scaling = calculate_depth_scaling(depth);
    let (reward_weight, danger_weight) = obstacle_type.weights();

    let base_reward = EncounterReward {
        energy: round_f64_to_u32(8.0 * difficulty.powf(0.5) * depth_scaling * reward_weight),
        xp: round_f64_to_u32(15.0 * difficulty.powf(0.6) * depth_scaling * reward_weight),
        items: Vec::new(),
    };
    let mut failure_consequence = ConsequenceProfile::for_depth(
        6.0 * danger_weight,
        0.05 * danger_weight,
        difficulty,
        0.5,
        depth,
    );
    failure_consequence.forced_retreat = difficulty >= HAZARD_FORCED_RETREAT_DIFFICULTY;

    HazardConfig {
        obstacle_type,
        difficulty,
        base_reward,
        failure_consequence,
    }
}

const GENERIC_PATHS: [OptionBlueprint; 3] = [
    OptionBlueprint {
        id: "careful_approach",
        name: "Careful Approach",
        description: "Test every handhold and take the slow way through.",
        cost: Curve::new(4.0, 0.6),
        success: SuccessCurve::new(0.95, 0.03, 1.0),
        reward_modifier: 0.8,
        consequence_modifier: 0.6,
        special_effect: None,
    },
    OptionBlueprint {
        id: "direct_approach",
        name: "Direct Approach",
        description: "Push straight through the obstacle.",
        cost: Curve::new(6.0, 0.5),
        success: SuccessCurve::new(0.85, 0.04, 1.0),
        reward_modifier: 1.2,
        consequence_modifier: 1.2,
        special_effect: None,
    },
    OptionBlueprint {
        id: "reckless_rush",
        name: "Reckless Rush",
        description: "Sprint for it and hope for the best.",
        cost: Curve::new(2.0, 0.4),
        success: SuccessCurve::new(0.7, 0.05, 1.0),
        reward_modifier: 1.8,
        consequence_modifier: 1.8,
        special_effect: Some("A failed rush forces a retreat"),
    },
];

const COLLAPSED_PASSAGE_PATHS: [OptionBlueprint; 2] = [
    OptionBlueprint {
        id: "dig_through",
        name: "Dig Through",
        description: "Clear the rubble stone by stone.",
        cost: Curve::new(10.0, 0.7),
        success: SuccessCurve::new(0.9, 0.02, 1.1),
        reward_modifier: 1.5,
        consequence_modifier: 1.0,
        special_effect: None,
    },
    OptionBlueprint {
        id: "find_crawlspace",
        name: "Find a Crawlspace",
        description: "Search the collapse for a gap to squeeze through.",
        cost: Curve::new(3.0, 0.5),
        success: SuccessCurve::new(0.8, 0.05, 0.9),
        reward_modifier: 1.0,
        consequence_modifier: 0.8,
        special_effect: Some("Reveals a hidden side passage"),
    },
];

const FLOODED_TUNNEL_PATHS: [OptionBlueprint; 2] = [
    OptionBlueprint {
        id: "swim_across",
        name: "Swim Across",
        description: "Dive in and swim for the far ledge.",
        cost: Curve::new(8.0, 0.6),
        success: SuccessCurve::new(0.75, 0.04, 1.0),
        reward_modifier: 1.4,
        consequence_modifier: 1.6,
        special_effect: None,
    },
    OptionBlueprint {
        id: "build_raft",
        name: "Build a Raft",
        description: "Lash driftwood together and paddle over.",
        cost: Curve::new(12.0, 0.6),
        success: SuccessCurve::new(0.92, 0.02, 1.0),
        reward_modifier: 1.1,
        consequence_modifier: 0.7,
        special_effect: None,
    },
];

const UNSTABLE_BRIDGE_PATHS: [OptionBlueprint; 1] = [OptionBlueprint {
    id: "sprint_across",
    name: "Sprint Across",
    description: "Cross before the planks give way.",
    cost: Curve::new(3.0, 0.4),
    success: SuccessCurve::new(0.65, 0.05, 1.0),
    reward_modifier: 1.6,
    consequence_modifier: 2.2,
    special_effect: Some("A fall sends the bridge into the abyss"),
}];

const TOXIC_VENTS_PATHS: [OptionBlueprint; 2] = [
    OptionBlueprint {
        id: "hold_breath",
        name: "Hold Your Breath",
        description: "Dash between eruptions without breathing.",
        cost: Curve::new(5.0, 0.6),
        success: SuccessCurve::new(0.8, 0.04, 1.0),
        reward_modifier: 1.3,
        consequence_modifier: 1.4,
        special_effect: None,
    },
    OptionBlueprint {
        id: "seal_vents",
        name: "Seal the Vents",
        description: "Plug the vents with clay before crossing.",
        cost: Curve::new(9.0, 0.7),
        success: SuccessCurve::new(0.88, 0.03, 1.0),
        reward_modifier: 1.2,
        consequence_modifier: 0.9,
        special_effect: None,
    },
];

const ARCANE_BARRIER_PATHS: [OptionBlueprint; 1] = [OptionBlueprint {
    id: "dispel_ward",
    name: "Dispel the Ward",
    description: "Unravel the barrier's runes one by one.",
    cost: Curve::new(7.0, 0.8),
    success: SuccessCurve::new(0.7, 0.03, 1.1),
    reward_modifier: 2.0,
    consequence_modifier: 2.4,
    special_effect: Some("Backlash seals the chamber"),
}];

/// One hazard instance and its path menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardEncounter {
    id: String,
    config: HazardConfig,
    menu: OptionMenu<SolutionPath>,
}

impl HazardEncounter {
    #[must_use]
    pub fn new(id: impl Into<String>, mut config: HazardConfig) -> Self {
        config.difficulty = clamp_scalar(config.difficulty);
        let paths = build_options(
            &GENERIC_PATHS,
            config.obstacle_type.specific_paths(),
            config.difficulty,
        );
        Self {
            id: id.into(),
            config,
            menu: OptionMenu::new(paths),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn config(&self) -> &HazardConfig {
        &self.config
    }

    #[must_use]
    pub fn paths(&self) -> &[SolutionPath] {
        self.menu.options()
    }

    #[must_use]
    pub fn selected_path(&self) -> Option<&SolutionPath> {
        self.menu.selected()
    }

    pub fn affordable_paths(&self, energy: u32) -> impl Iterator<Item = &SolutionPath> {
        self.menu.affordable(energy)
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.menu.is_resolved()
    }

    pub fn select_path(&mut self, path_id: &str) -> bool {
        self.menu.select(path_id)
    }

    /// Roll the selected path once and cache the result.
    ///
    /// # Errors
    ///
    /// Returns [`AdvancedEncounterError::NoSelection`] if no path was selected.
    pub fn resolve<R: RngCore + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<&AdvancedOutcome, AdvancedEncounterError> {
        let config = &self.config;
        self.menu.resolve_with(|path| {
            resolve_risky_option(
                path,
                &config.base_reward,
                &config.failure_consequence,
                rng,
            )
        })
    }

    #[must_use]
    pub fn state(&self) -> AdvancedEncounterState<HazardConfig, SolutionPath> {
        AdvancedEncounterState::capture(&self.id, &self.config, &self.menu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advanced::test_support::StubRng;
    use crate::encounter::OutcomeKind;

    #[test]
    fn deeper_config_scales_up() {
        let shallow = create_hazard_config(ObstacleType::CollapsedPassage, 5.0, 1);
        let deep = create_hazard_config(ObstacleType::CollapsedPassage, 5.0, 3);
        assert!(deep.difficulty > shallow.difficulty);
        assert!(deep.base_reward.xp > shallow.base_reward.xp);
        assert!(deep.base_reward.energy > shallow.base_reward.energy);
        assert!(deep.failure_consequence.energy_loss > shallow.failure_consequence.energy_loss);
        assert!(
            deep.failure_consequence.item_loss_risk > shallow.failure_consequence.item_loss_risk
        );
    }

    #[test]
    fn difficulty_is_clamped() {
        let capped = create_hazard_config(ObstacleType::ToxicVents, 42.0, 8);
        assert!((capped.difficulty - 10.0).abs() < f64::EPSILON);
        let floored = create_hazard_config(ObstacleType::ToxicVents, -3.0, 1);
        assert!((floored.difficulty - 1.0).abs() < f64::EPSILON);
        let brutal = create_hazard_config(ObstacleType::ArcaneBarrier, 10.0, 5);
        assert!(brutal.failure_consequence.forced_retreat);
    }

    #[test]
    fn hand_built_difficulty_is_clamped_on_construction() {
        let mut config = create_hazard_config(ObstacleType::ToxicVents, 5.0, 1);
        config.difficulty = 42.0;
        let hazard = HazardEncounter::new("h-wild", config);
        assert!((hazard.state().config.difficulty - 10.0).abs() < f64::EPSILON);
        let capped = HazardEncounter::new(
            "h-capped",
            create_hazard_config(ObstacleType::ToxicVents, 10.0, 1),
        );
        assert_eq!(hazard.paths(), capped.paths());

        let mut config = create_hazard_config(ObstacleType::ToxicVents, 5.0, 1);
        config.difficulty = f64::NAN;
        let hazard = HazardEncounter::new("h-nan", config);
        assert!((hazard.config().difficulty - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn menu_has_generic_and_specific_paths() {
        let collapsed = HazardEncounter::new(
            "h-1",
            create_hazard_config(ObstacleType::CollapsedPassage, 4.0, 2),
        );
        let ids: Vec<&str> = collapsed.paths().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "careful_approach",
                "direct_approach",
                "reckless_rush",
                "dig_through",
                "find_crawlspace"
            ]
        );
        let bridge = HazardEncounter::new(
            "h-2",
            create_hazard_config(ObstacleType::UnstableBridge, 4.0, 2),
        );
        assert_eq!(bridge.paths().len(), 4);
    }

    #[test]
    fn harder_hazards_cost_more_and_succeed_less() {
        let easy_config = create_hazard_config(ObstacleType::FloodedTunnel, 2.0, 1);
        let hard_config = create_hazard_config(ObstacleType::FloodedTunnel, 8.0, 1);
        let easy = HazardEncounter::new("e", easy_config);
        let hard = HazardEncounter::new("h", hard_config);
        for (a, b) in easy.paths().iter().zip(hard.paths()) {
            assert_eq!(a.id, b.id);
            assert!(b.energy_cost >= a.energy_cost, "{} cost", a.id);
            assert!(b.success_rate < a.success_rate, "{} success", a.id);
        }
    }

    #[test]
    fn success_scales_reward() {
        let config = create_hazard_config(ObstacleType::CollapsedPassage, 5.0, 2);
        let mut hazard = HazardEncounter::new("h-ok", config.clone());
        assert!(hazard.select_path("dig_through"));
        let outcome = hazard.resolve(&mut StubRng::always_succeed()).unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Success);
        let reward = outcome.reward.as_ref().unwrap();
        assert_eq!(
            reward.xp,
            round_f64_to_u32(f64::from(config.base_reward.xp) * 1.5)
        );
        assert!(outcome.consequences.is_none());
    }

    #[test]
    fn reckless_failure_forces_retreat() {
        let mut hazard = HazardEncounter::new(
            "h-fail",
            create_hazard_config(ObstacleType::CollapsedPassage, 3.0, 1),
        );
        hazard.select_path("reckless_rush");
        let outcome = hazard.resolve(&mut StubRng::always_fail()).unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Failure);
        let consequences = outcome.consequences.as_ref().unwrap();
        assert!(consequences.forced_retreat);
        assert!(!consequences.encounter_lockout);
    }

    #[test]
    fn bridge_fall_locks_out() {
        let mut hazard = HazardEncounter::new(
            "h-bridge",
            create_hazard_config(ObstacleType::UnstableBridge, 3.0, 1),
        );
        hazard.select_path("sprint_across");
        let outcome = hazard.resolve(&mut StubRng::always_fail()).unwrap();
        let consequences = outcome.consequences.as_ref().unwrap();
        assert!(consequences.forced_retreat);
        assert!(consequences.encounter_lockout);
    }

    #[test]
    fn state_snapshot_tracks_lifecycle() {
        let mut hazard = HazardEncounter::new(
            "h-state",
            create_hazard_config(ObstacleType::ToxicVents, 5.0, 1),
        );
        let before = hazard.state();
        assert_eq!(before.id, "h-state");
        assert!(before.selected_option.is_none());
        assert!(!before.resolved);

        hazard.select_path("seal_vents");
        let _ = hazard.resolve(&mut StubRng::always_succeed()).unwrap();
        let after = hazard.state();
        assert_eq!(after.selected_option.as_deref(), Some("seal_vents"));
        assert!(after.resolved);
        assert!(after.outcome.is_some());
        assert_eq!(after.config.obstacle_type, ObstacleType::ToxicVents);
    }
}
