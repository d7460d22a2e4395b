//! Option-driven encounter state machines.
//!
//! Hazards, rest sites, and risk events share one lifecycle: a menu of
//! options is generated from the config when the encounter is built, the
//! player selects exactly one, and `resolve` computes the outcome once and
//! returns the cached copy on every later call.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::encounter::{CollectedItem, EncounterReward, OutcomeKind};
use crate::failure::{ConsequenceProfile, FailureConsequences, risk_adjusted_success_rate};
use crate::rewards::{scale_reward, scaled_coefficient};
use crate::rng::unit_roll;

pub mod hazard;
pub mod rest_site;
pub mod risk_event;

/// Upper bound on generated options: three generic plus up to two specific.
pub const MAX_OPTIONS: usize = 5;

pub type OptionList<O> = SmallVec<[O; MAX_OPTIONS]>;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AdvancedEncounterError {
    #[error("No option selected")]
    NoSelection,
}

/// Anything a player can pick from an encounter menu.
pub trait EncounterOption {
    fn id(&self) -> &str;
    fn energy_cost(&self) -> u32;
}

/// A risk-bearing approach (hazard path or risk-event choice).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectableOption {
    pub id: String,
    pub name: String,
    pub description: String,
    pub energy_cost: u32,
    pub success_rate: f64,
    pub reward_modifier: f64,
    pub consequence_modifier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_effect: Option<String>,
}

impl EncounterOption for SelectableOption {
    fn id(&self) -> &str {
        &self.id
    }

    fn energy_cost(&self) -> u32 {
        self.energy_cost
    }
}

/// `round(coefficient * scalar^exponent)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Curve {
    pub coefficient: f64,
    pub exponent: f64,
}

impl Curve {
    #[must_use]
    pub const fn new(coefficient: f64, exponent: f64) -> Self {
        Self {
            coefficient,
            exponent,
        }
    }

    #[must_use]
    pub fn at(self, scalar: f64) -> u32 {
        scaled_coefficient(self.coefficient, scalar, self.exponent)
    }
}

/// `base - coefficient * scalar^exponent`, clamped into the success band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuccessCurve {
    pub base: f64,
    pub coefficient: f64,
    pub exponent: f64,
}

impl SuccessCurve {
    #[must_use]
    pub const fn new(base: f64, coefficient: f64, exponent: f64) -> Self {
        Self {
            base,
            coefficient,
            exponent,
        }
    }

    #[must_use]
    pub fn at(self, scalar: f64) -> f64 {
        risk_adjusted_success_rate(self.base, self.coefficient, scalar, self.exponent)
    }
}

/// Static description of a risk-bearing option before the scalar is known.
#[derive(Debug, Clone, Copy)]
pub struct OptionBlueprint {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub cost: Curve,
    pub success: SuccessCurve,
    pub reward_modifier: f64,
    pub consequence_modifier: f64,
    pub special_effect: Option<&'static str>,
}

impl OptionBlueprint {
    #[must_use]
    pub fn build(&self, scalar: f64) -> SelectableOption {
        SelectableOption {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            energy_cost: self.cost.at(scalar),
            success_rate: self.success.at(scalar),
            reward_modifier: self.reward_modifier,
            consequence_modifier: self.consequence_modifier,
            special_effect: self.special_effect.map(ToString::to_string),
        }
    }
}

/// Generic options first, then the type-specific ones.
#[must_use]
pub fn build_options(
    generic: &[OptionBlueprint],
    specific: &[OptionBlueprint],
    scalar: f64,
) -> OptionList<SelectableOption> {
    generic
        .iter()
        .chain(specific)
        .map(|blueprint| blueprint.build(scalar))
        .collect()
}

/// Cached result of resolving an advanced encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedOutcome {
    #[serde(rename = "type")]
    pub kind: OutcomeKind,
    pub option_id: String,
    pub energy_spent: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<EncounterReward>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consequences: Option<FailureConsequences>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_effect: Option<String>,
    /// Uniform draw compared against the success rate, if one was taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legendary_reward: Option<CollectedItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserve_remaining: Option<u32>,
}

impl AdvancedOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.kind.is_success()
    }
}

/// Draw once against the option's success rate and scale reward or penalty.
pub fn resolve_risky_option<R: RngCore + ?Sized>(
    option: &SelectableOption,
    base_reward: &EncounterReward,
    base_consequence: &ConsequenceProfile,
    rng: &mut R,
) -> AdvancedOutcome {
    let roll = unit_roll(rng);
    let succeeded = roll < option.success_rate;
    let (kind, reward, consequences) = if succeeded {
        (
            OutcomeKind::Success,
            Some(scale_reward(base_reward, option.reward_modifier)),
            None,
        )
    } else {
        let label = format!("{} failed", option.name);
        (
            OutcomeKind::Failure,
            None,
            Some(base_consequence.scaled(option.consequence_modifier, &label)),
        )
    };
    AdvancedOutcome {
        kind,
        option_id: option.id.clone(),
        energy_spent: option.energy_cost,
        reward,
        consequences,
        special_effect: option.special_effect.clone(),
        roll: Some(roll),
        legendary_reward: None,
        reserve_remaining: None,
    }
}

/// Selection and memoized resolution for one encounter instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionMenu<O> {
    options: OptionList<O>,
    selected: Option<String>,
    outcome: Option<AdvancedOutcome>,
}

impl<O: EncounterOption> OptionMenu<O> {
    #[must_use]
    pub fn new(options: OptionList<O>) -> Self {
        Self {
            options,
            selected: None,
            outcome: None,
        }
    }

    #[must_use]
    pub fn options(&self) -> &[O] {
        &self.options
    }

    /// Record a selection; unknown ids are refused.
    ///
    /// Selecting after resolution is recorded but does not change the cached
    /// outcome, whose `option_id` names the option that was actually resolved.
    pub fn select(&mut self, option_id: &str) -> bool {
        if self.options.iter().any(|option| option.id() == option_id) {
            self.selected = Some(option_id.to_string());
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&O> {
        let id = self.selected.as_deref()?;
        self.options.iter().find(|option| option.id() == id)
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<&AdvancedOutcome> {
        self.outcome.as_ref()
    }

    /// Options whose cost fits within `energy`.
    pub fn affordable(&self, energy: u32) -> impl Iterator<Item = &O> {
        self.options
            .iter()
            .filter(move |option| option.energy_cost() <= energy)
    }

    /// Compute the outcome on first call and return the cached copy after.
    ///
    /// # Errors
    ///
    /// Returns [`AdvancedEncounterError::NoSelection`] before any selection.
    pub fn resolve_with(
        &mut self,
        compute: impl FnOnce(&O) -> AdvancedOutcome,
    ) -> Result<&AdvancedOutcome, AdvancedEncounterError> {
        if self.outcome.is_none() {
            let option = self.selected().ok_or(AdvancedEncounterError::NoSelection)?;
            let outcome = compute(option);
            self.outcome = Some(outcome);
        }
        self.outcome
            .as_ref()
            .ok_or(AdvancedEncounterError::NoSelection)
    }
}

/// Read-only snapshot of an advanced encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedEncounterState<C, O> {
    pub id: String,
    pub config: C,
    pub options: Vec<O>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<String>,
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<AdvancedOutcome>,
}

impl<C: Clone, O: EncounterOption + Clone> AdvancedEncounterState<C, O> {
    pub(crate) fn capture(id: &str, config: &C, menu: &OptionMenu<O>) -> Self {
        Self {
            id: id.to_string(),
            config: config.clone(),
            options: menu.options().to_vec(),
            selected_option: menu.selected_id().map(ToString::to_string),
            resolved: menu.is_resolved(),
            outcome: menu.outcome().cloned(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::StubRng;
    use super::*;

    const CAREFUL: OptionBlueprint = OptionBlueprint {
        id: "careful",
        name: "Careful",
        description: "Slow and steady",
        cost: Curve::new(4.0, 0.5),
        success: SuccessCurve::new(0.9, 0.03, 1.0),
        reward_modifier: 0.8,
        consequence_modifier: 0.5,
        special_effect: None,
    };

    fn menu() -> OptionMenu<SelectableOption> {
        OptionMenu::new(build_options(&[CAREFUL], &[], 4.0))
    }

    #[test]
    fn blueprint_builds_scaled_option() {
        let option = CAREFUL.build(4.0);
        assert_eq!(option.energy_cost, 8);
        assert!((option.success_rate - 0.78).abs() < 1e-9);
    }

    #[test]
    fn unknown_selection_leaves_menu_untouched() {
        let mut menu = menu();
        assert!(!menu.select("bogus-id"));
        assert!(menu.selected_id().is_none());
        assert!(menu.select("careful"));
        assert_eq!(menu.selected_id(), Some("careful"));
    }

    #[test]
    fn resolve_requires_selection_and_memoizes() {
        let mut menu = menu();
        let base_reward = EncounterReward {
            energy: 10,
            xp: 20,
            items: Vec::new(),
        };
        let profile = ConsequenceProfile::default();
        let mut rng = StubRng::always_succeed();
        let err = menu
            .resolve_with(|option| resolve_risky_option(option, &base_reward, &profile, &mut rng))
            .unwrap_err();
        assert_eq!(err, AdvancedEncounterError::NoSelection);
        assert_eq!(err.to_string(), "No option selected");

        menu.select("careful");
        let first = menu
            .resolve_with(|option| resolve_risky_option(option, &base_reward, &profile, &mut rng))
            .unwrap()
            .clone();
        let second = menu
            .resolve_with(|option| resolve_risky_option(option, &base_reward, &profile, &mut rng))
            .unwrap()
            .clone();
        assert_eq!(first, second);
        assert_eq!(rng.calls, 1);
        assert_eq!(first.reward.map(|r| r.xp), Some(16));
        assert!(menu.select("careful"));
    }

    #[test]
    fn reselect_after_resolve_keeps_cached_outcome() {
        const BOLD: OptionBlueprint = OptionBlueprint {
            id: "bold",
            name: "Bold",
            ..CAREFUL
        };
        let mut menu = OptionMenu::new(build_options(&[CAREFUL, BOLD], &[], 4.0));
        let profile = ConsequenceProfile::default();
        let mut rng = StubRng::always_succeed();
        menu.select("careful");
        let resolved = menu
            .resolve_with(|option| {
                resolve_risky_option(option, &EncounterReward::default(), &profile, &mut rng)
            })
            .unwrap()
            .clone();

        assert!(menu.select("bold"));
        assert_eq!(menu.selected_id(), Some("bold"));
        assert!(!menu.select("bogus-id"));
        assert_eq!(menu.selected_id(), Some("bold"));
        let cached = menu
            .resolve_with(|option| {
                resolve_risky_option(option, &EncounterReward::default(), &profile, &mut rng)
            })
            .unwrap();
        assert_eq!(cached, &resolved);
        assert_eq!(cached.option_id, "careful");
        assert_eq!(rng.calls, 1);
    }

    #[test]
    fn failing_roll_scales_consequence() {
        let option = CAREFUL.build(4.0);
        let profile = ConsequenceProfile {
            energy_loss: 12,
            item_loss_risk: 0.2,
            ..ConsequenceProfile::default()
        };
        let mut rng = StubRng::always_fail();
        let outcome =
            resolve_risky_option(&option, &EncounterReward::default(), &profile, &mut rng);
        assert_eq!(outcome.kind, OutcomeKind::Failure);
        assert!(outcome.reward.is_none());
        let consequences = outcome.consequences.unwrap();
        assert_eq!(consequences.energy_loss, 6);
        assert!(consequences.description.starts_with("Careful failed"));
    }

    #[test]
    fn affordable_filters_by_cost() {
        let menu = OptionMenu::new(build_options(&[CAREFUL], &[], 9.0));
        assert_eq!(menu.affordable(11).count(), 0);
        assert_eq!(menu.affordable(12).count(), 1);
    }
}
