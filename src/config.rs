use std::env;
use std::num::ParseIntError;

use once_cell::sync::OnceCell;
use thiserror::Error;

/// Default amount of work units a single [`TimSort::step`](crate::timsort::TimSort::step) may
/// start.
pub const DEFAULT_STEP_BUDGET: usize = 1024;

/// Default threshold of consecutive wins by one run before a merge switches to galloping mode.
pub const DEFAULT_MIN_GALLOP: usize = 7;

const STEP_BUDGET_VAR: &str = "SORT_VIEW_STEP_BUDGET";
const MIN_GALLOP_VAR: &str = "SORT_VIEW_MIN_GALLOP";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is not a valid number")]
    InvalidNumber {
        var: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("the step budget must be at least 1")]
    ZeroStepBudget,
}

/// Tuning knobs of the incremental sort.
///
/// Only constructible through [`Default`] and the validating setters, so the step budget is never
/// zero and the galloping threshold never drops below one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortConfig {
    step_budget: usize,
    min_gallop: usize,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            step_budget: DEFAULT_STEP_BUDGET,
            min_gallop: DEFAULT_MIN_GALLOP,
        }
    }
}

impl SortConfig {
    /// Work units a step may start before it yields. A unit is one comparison, one swap or one
    /// moved element.
    pub fn step_budget(&self) -> usize {
        self.step_budget
    }

    /// Initial galloping threshold, adapted while merging.
    pub fn min_gallop(&self) -> usize {
        self.min_gallop
    }

    pub fn with_step_budget(mut self, step_budget: usize) -> Result<Self, ConfigError> {
        if step_budget == 0 {
            return Err(ConfigError::ZeroStepBudget);
        }

        self.step_budget = step_budget;
        Ok(self)
    }

    pub fn with_min_gallop(mut self, min_gallop: usize) -> Self {
        self.min_gallop = min_gallop.max(1);
        self
    }

    /// Reads `SORT_VIEW_STEP_BUDGET` and `SORT_VIEW_MIN_GALLOP`, unset variables keep their
    /// default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// The process wide configuration, read from the environment once.
    pub fn global() -> SortConfig {
        static CONFIG: OnceCell<SortConfig> = OnceCell::new();

        *CONFIG.get_or_init(|| match Self::from_env() {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(%err, "ignoring sort configuration from environment");
                Self::default()
            }
        })
    }

    /// Like [`from_env`](Self::from_env), with `lookup` standing in for the environment.
    pub fn from_lookup(
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(STEP_BUDGET_VAR) {
            config = config.with_step_budget(parse_var(STEP_BUDGET_VAR, value)?)?;
        }

        if let Some(value) = lookup(MIN_GALLOP_VAR) {
            config = config.with_min_gallop(parse_var(MIN_GALLOP_VAR, value)?);
        }

        Ok(config)
    }
}

fn parse_var(var: &'static str, value: String) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(val) => Ok(val),
        Err(source) => Err(ConfigError::InvalidNumber { var, value, source }),
    }
}
