//! Failure consequences and escalating severity tracking.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::constants::{
    ENCOUNTER_LOCKOUT_TIER, ENERGY_EXHAUSTED_TIER, ENERGY_LOSS_DEPTH_FACTOR,
    FORCED_RETREAT_MODIFIER_THRESHOLD, FORCED_RETREAT_TIER, ITEM_RISK_DEPTH_FACTOR,
    LOCKOUT_MODIFIER_THRESHOLD, OBJECTIVE_FAILED_TIER, SEVERITY_MAX, SEVERITY_MIN,
    SEVERITY_RELAX_PER_SUCCESS, SEVERITY_STEP_PER_FAILURE, SUCCESS_RATE_CEILING,
    SUCCESS_RATE_FLOOR,
};
use crate::numbers::{clamp_scalar, clamp_unit, depth_contribution, round_f64_to_u32};

/// Failure kinds in increasing base severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    EnergyExhausted,
    ObjectiveFailed,
    ForcedRetreat,
    EncounterLockout,
}

const FAILURE_KINDS: [FailureKind; 4] = [
    FailureKind::EnergyExhausted,
    FailureKind::ObjectiveFailed,
    FailureKind::ForcedRetreat,
    FailureKind::EncounterLockout,
];

impl FailureKind {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::EnergyExhausted => "energy_exhausted",
            Self::ObjectiveFailed => "objective_failed",
            Self::ForcedRetreat => "forced_retreat",
            Self::EncounterLockout => "encounter_lockout",
        }
    }

    /// Unknown keys land on the `objective_failed` tier.
    #[must_use]
    pub fn from_key_or_default(key: &str) -> Self {
        FAILURE_KINDS
            .iter()
            .copied()
            .find(|kind| kind.key() == key)
            .unwrap_or(Self::ObjectiveFailed)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::EnergyExhausted => "Energy exhausted",
            Self::ObjectiveFailed => "Objective failed",
            Self::ForcedRetreat => "Forced retreat",
            Self::EncounterLockout => "Encounter lockout",
        }
    }

    #[must_use]
    pub const fn base_energy_loss(self) -> u32 {
        self.tier().0
    }

    #[must_use]
    pub const fn base_item_loss_risk(self) -> f64 {
        self.tier().1
    }

    const fn tier(self) -> (u32, f64) {
        match self {
            Self::EnergyExhausted => ENERGY_EXHAUSTED_TIER,
            Self::ObjectiveFailed => OBJECTIVE_FAILED_TIER,
            Self::ForcedRetreat => FORCED_RETREAT_TIER,
            Self::EncounterLockout => ENCOUNTER_LOCKOUT_TIER,
        }
    }
}

/// Retreat and lockout failures both end the encounter on the spot.
#[must_use]
pub const fn should_force_retreat(kind: FailureKind) -> bool {
    matches!(
        kind,
        FailureKind::ForcedRetreat | FailureKind::EncounterLockout
    )
}

#[must_use]
pub const fn should_lockout_encounter(kind: FailureKind) -> bool {
    matches!(kind, FailureKind::EncounterLockout)
}

/// Depth multiplier for energy loss.
#[must_use]
pub fn energy_loss_depth_factor(depth: i32) -> f64 {
    depth_contribution(depth).mul_add(ENERGY_LOSS_DEPTH_FACTOR, 1.0)
}

#[must_use]
pub fn item_risk_depth_factor(depth: i32) -> f64 {
    depth_contribution(depth).mul_add(ITEM_RISK_DEPTH_FACTOR, 1.0)
}

/// Penalties applied when an encounter is failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureConsequences {
    pub energy_loss: u32,
    pub item_loss_risk: f64,
    pub forced_retreat: bool,
    pub encounter_lockout: bool,
    pub description: String,
}

/// Unscaled failure penalty carried by hazard and risk-event configs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConsequenceProfile {
    pub energy_loss: u32,
    pub item_loss_risk: f64,
    #[serde(default)]
    pub forced_retreat: bool,
    #[serde(default)]
    pub encounter_lockout: bool,
}

impl ConsequenceProfile {
    /// Build a depth-scaled profile from `coefficient * scalar^exponent` bases.
    #[must_use]
    pub fn for_depth(
        energy_coefficient: f64,
        risk_coefficient: f64,
        scalar: f64,
        exponent: f64,
        depth: i32,
    ) -> Self {
        let weight = clamp_scalar(scalar).powf(exponent);
        Self {
            energy_loss: round_f64_to_u32(
                energy_coefficient * weight * energy_loss_depth_factor(depth),
            ),
            item_loss_risk: clamp_unit(risk_coefficient * weight * item_risk_depth_factor(depth)),
            forced_retreat: false,
            encounter_lockout: false,
        }
    }

    /// Scale by an option's consequence modifier.
    ///
    /// Modifiers past the retreat and lockout thresholds escalate the outcome
    /// even when the base profile does not.
    #[must_use]
    pub fn scaled(&self, modifier: f64, label: &str) -> FailureConsequences {
        let modifier = modifier.max(0.0);
        let energy_loss = round_f64_to_u32(f64::from(self.energy_loss) * modifier);
        let item_loss_risk = clamp_unit(self.item_loss_risk * modifier);
        let forced_retreat = self.forced_retreat || modifier > FORCED_RETREAT_MODIFIER_THRESHOLD;
        let encounter_lockout = self.encounter_lockout || modifier > LOCKOUT_MODIFIER_THRESHOLD;
        let description = describe(
            label,
            energy_loss,
            item_loss_risk,
            forced_retreat,
            encounter_lockout,
        );
        FailureConsequences {
            energy_loss,
            item_loss_risk,
            forced_retreat,
            encounter_lockout,
            description,
        }
    }
}

/// Success chance that falls as the scalar grows.
#[must_use]
pub fn risk_adjusted_success_rate(base: f64, coefficient: f64, scalar: f64, exponent: f64) -> f64 {
    let penalty = coefficient * clamp_scalar(scalar).powf(exponent);
    (base - penalty).clamp(SUCCESS_RATE_FLOOR, SUCCESS_RATE_CEILING)
}

fn describe(
    label: &str,
    energy_loss: u32,
    item_loss_risk: f64,
    forced_retreat: bool,
    encounter_lockout: bool,
) -> String {
    let mut text = format!(
        "{label}: lose {energy_loss} energy, {:.0}% item loss risk",
        item_loss_risk * 100.0
    );
    if forced_retreat {
        text.push_str(", forced to retreat");
    }
    if encounter_lockout {
        text.push_str(", encounter sealed");
    }
    text
}

/// Persistent failure bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureHistory {
    #[serde(default)]
    pub consecutive_failures: HashMap<String, u32>,
    #[serde(default)]
    pub locked_out: BTreeSet<String>,
    #[serde(default)]
    pub total_failures: u32,
    #[serde(default)]
    pub total_successes: u32,
    #[serde(default = "FailureHistory::default_severity")]
    pub severity_multiplier: f64,
}

impl FailureHistory {
    const fn default_severity() -> f64 {
        SEVERITY_MIN
    }
}

impl Default for FailureHistory {
    fn default() -> Self {
        Self {
            consecutive_failures: HashMap::new(),
            locked_out: BTreeSet::new(),
            total_failures: 0,
            total_successes: 0,
            severity_multiplier: Self::default_severity(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FailureStatistics {
    pub total_failures: u32,
    pub total_successes: u32,
    pub failure_rate: f64,
    pub severity_multiplier: f64,
}

/// Tracks failures across many encounters and turns them into penalties.
#[derive(Debug, Clone, Default)]
pub struct FailureConsequenceManager {
    history: FailureHistory,
}

impl FailureConsequenceManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from a saved history, clamping the severity back into range.
    #[must_use]
    pub fn from_history(mut history: FailureHistory) -> Self {
        history.severity_multiplier = if history.severity_multiplier.is_nan() {
            SEVERITY_MIN
        } else {
            history.severity_multiplier.clamp(SEVERITY_MIN, SEVERITY_MAX)
        };
        Self { history }
    }

    #[must_use]
    pub const fn history(&self) -> &FailureHistory {
        &self.history
    }

    #[must_use]
    pub const fn severity_multiplier(&self) -> f64 {
        self.history.severity_multiplier
    }

    #[must_use]
    pub fn calculate_energy_loss(&self, kind: FailureKind, depth: i32) -> u32 {
        let base = f64::from(kind.base_energy_loss());
        round_f64_to_u32(base * energy_loss_depth_factor(depth) * self.severity_multiplier())
    }

    #[must_use]
    pub fn calculate_item_loss_risk(&self, kind: FailureKind, depth: i32) -> f64 {
        let risk =
            kind.base_item_loss_risk() * item_risk_depth_factor(depth) * self.severity_multiplier();
        clamp_unit(risk.min(1.0))
    }

    #[must_use]
    pub fn consecutive_failures(&self, encounter_id: &str) -> u32 {
        self.history
            .consecutive_failures
            .get(encounter_id)
            .copied()
            .unwrap_or(0)
    }

    /// Count a failure and escalate severity; returns the new streak length.
    pub fn record_failure(&mut self, encounter_id: &str) -> u32 {
        let count = self
            .history
            .consecutive_failures
            .entry(encounter_id.to_string())
            .or_insert(0);
        *count = count.saturating_add(1);
        let streak = *count;
        self.history.total_failures = self.history.total_failures.saturating_add(1);

        let escalated =
            f64::from(streak).mul_add(SEVERITY_STEP_PER_FAILURE, 1.0).min(SEVERITY_MAX);
        self.history.severity_multiplier = self.history.severity_multiplier.max(escalated);
        streak
    }

    pub fn record_success(&mut self, encounter_id: &str) {
        self.history
            .consecutive_failures
            .insert(encounter_id.to_string(), 0);
        self.history.total_successes = self.history.total_successes.saturating_add(1);
        self.history.severity_multiplier =
            (self.history.severity_multiplier - SEVERITY_RELAX_PER_SUCCESS).max(SEVERITY_MIN);
    }

    pub fn lockout_encounter(&mut self, encounter_id: &str) {
        if self.history.locked_out.insert(encounter_id.to_string()) {
            log::info!("encounter {encounter_id} locked out");
        }
    }

    #[must_use]
    pub fn is_encounter_locked_out(&self, encounter_id: &str) -> bool {
        self.history.locked_out.contains(encounter_id)
    }

    #[must_use]
    pub fn locked_out_encounters(&self) -> Vec<String> {
        self.history.locked_out.iter().cloned().collect()
    }

    /// Single entry point for a failed encounter.
    pub fn process_failure_consequences(
        &mut self,
        kind: FailureKind,
        depth: i32,
        encounter_id: &str,
    ) -> FailureConsequences {
        let energy_loss = self.calculate_energy_loss(kind, depth);
        let item_loss_risk = self.calculate_item_loss_risk(kind, depth);
        let forced_retreat = should_force_retreat(kind);
        let encounter_lockout = should_lockout_encounter(kind);
        if encounter_lockout {
            self.lockout_encounter(encounter_id);
        }
        self.record_failure(encounter_id);

        let label = format!("{} at depth {depth}", kind.label());
        FailureConsequences {
            energy_loss,
            item_loss_risk,
            forced_retreat,
            encounter_lockout,
            description: describe(
                &label,
                energy_loss,
                item_loss_risk,
                forced_retreat,
                encounter_lockout,
            ),
        }
    }

    #[must_use]
    pub fn failure_statistics(&self) -> FailureStatistics {
        let failures = self.history.total_failures;
        let successes = self.history.total_successes;
        let attempts = f64::from(failures) + f64::from(successes);
        let failure_rate = if attempts > 0.0 {
            f64::from(failures) / attempts
        } else {
            0.0
        };
        FailureStatistics {
            total_failures: failures,
            total_successes: successes,
            failure_rate,
            severity_multiplier: self.severity_multiplier(),
        }
    }

    /// Forget all history, including lockouts.
    pub fn reset(&mut self) {
        self.history = FailureHistory::default();
    }
}
