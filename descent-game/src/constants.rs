//! Centralized balance and tuning constants for the descent encounter engine.
//!
//! Every formula in the reward, failure, and option modules reads its knobs
//! from here so tuning stays a reviewed code change rather than a data tweak.

// Depth scaling ------------------------------------------------------------
pub const DEPTH_SCALING_PER_LEVEL: f64 = 0.2;
pub const VARIANCE_BASE_SPREAD: f64 = 0.2;
pub const VARIANCE_SPREAD_PER_DEPTH: f64 = 0.05;
pub const VARIANCE_MAX_SPREAD: f64 = 0.6;

// Basic encounter multipliers ---------------------------------------------
pub const PUZZLE_CHAMBER_MULTIPLIER: f64 = 1.0;
pub const TRADE_OPPORTUNITY_MULTIPLIER: f64 = 1.2;
pub const DISCOVERY_SITE_MULTIPLIER: f64 = 1.5;
pub const DEFAULT_TYPE_MULTIPLIER: f64 = 1.0;

// Failure tiers ------------------------------------------------------------
pub const ENERGY_EXHAUSTED_TIER: (u32, f64) = (5, 0.10);
pub const OBJECTIVE_FAILED_TIER: (u32, f64) = (10, 0.20);
pub const FORCED_RETREAT_TIER: (u32, f64) = (15, 0.30);
pub const ENCOUNTER_LOCKOUT_TIER: (u32, f64) = (20, 0.40);
pub const ENERGY_LOSS_DEPTH_FACTOR: f64 = 0.1;
pub const ITEM_RISK_DEPTH_FACTOR: f64 = 0.05;

// Severity -----------------------------------------------------------------
pub const SEVERITY_MIN: f64 = 1.0;
pub const SEVERITY_MAX: f64 = 3.0;
pub const SEVERITY_STEP_PER_FAILURE: f64 = 0.2;
pub const SEVERITY_RELAX_PER_SUCCESS: f64 = 0.1;

// Option scaling -----------------------------------------------------------
pub const SCALAR_MIN: f64 = 1.0;
pub const SCALAR_MAX: f64 = 10.0;
pub const SUCCESS_RATE_FLOOR: f64 = 0.05;
pub const SUCCESS_RATE_CEILING: f64 = 0.95;
pub const FORCED_RETREAT_MODIFIER_THRESHOLD: f64 = 1.5;
pub const LOCKOUT_MODIFIER_THRESHOLD: f64 = 2.0;
pub const HAZARD_DEPTH_EXPONENT: f64 = 0.25;
pub const REST_SITE_DEPTH_EXPONENT: f64 = 0.2;
pub const RISK_EVENT_DEPTH_EXPONENT: f64 = 0.3;
pub const HAZARD_FORCED_RETREAT_DIFFICULTY: f64 = 9.0;

// Strategic intel ----------------------------------------------------------
pub const MAP_REVEAL_XP: u32 = 5;
pub const SHORTCUT_HINT_XP: u32 = 12;
pub const HAZARD_WARNING_XP: u32 = 8;

// Persistence --------------------------------------------------------------
pub const DEFAULT_STORAGE_KEY: &str = "descent.active_encounter";
pub const DEFAULT_RESOLVER_SEED: u64 = 0x00DE_5CE7;
