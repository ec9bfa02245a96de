//! Tabu Search Core configuration (`spec.md` §6 Options record, the
//! `tabu::TabuOptions` half; `TabuConfig` in the teacher crate's `sa`/`ga`
//! modules is the stylistic model — a builder struct plus `validate`).

use std::time::Instant;

use crate::error::{SolverError, SolverResult};
use crate::memory::TabuMode;
use crate::neighborhood::ImprovabilityScreeningMode;

/// Knobs that stay fixed across the whole solve (as opposed to
/// [`TabuRunParameters`], which the controller re-derives every outer
/// iteration).
#[derive(Debug, Clone)]
pub struct TabuOptions {
    pub initial_tabu_tenure: i64,
    pub tabu_mode: TabuMode,
    pub tabu_tenure_randomize_rate: f64,
    pub frequency_penalty_coefficient: f64,
    /// Consecutive primal-intensity increases (resp. decreases) required
    /// before the tenure is nudged up (resp. down) (`spec.md` §4.5 step 9).
    pub bias_increase_threshold: u32,
    pub bias_decrease_threshold: u32,
    /// Consecutive local updates without a global update that trigger a
    /// pruning termination (`spec.md` §4.5 step 1, "too many local updates
    /// without a global update"). `None` disables pruning.
    pub pruning_local_update_limit: Option<u32>,
    pub auto_break_iteration_threshold: usize,
    pub auto_break_penalty_multiplier: f64,
}

impl Default for TabuOptions {
    fn default() -> Self {
        Self {
            initial_tabu_tenure: 10,
            tabu_mode: TabuMode::All,
            tabu_tenure_randomize_rate: 0.1,
            frequency_penalty_coefficient: 1e-5,
            bias_increase_threshold: 5,
            bias_decrease_threshold: 5,
            pruning_local_update_limit: None,
            auto_break_iteration_threshold: 10,
            auto_break_penalty_multiplier: 100.0,
        }
    }
}

impl TabuOptions {
    pub fn with_initial_tabu_tenure(mut self, tenure: i64) -> Self {
        self.initial_tabu_tenure = tenure;
        self
    }

    pub fn with_tabu_mode(mut self, mode: TabuMode) -> Self {
        self.tabu_mode = mode;
        self
    }

    pub fn with_tabu_tenure_randomize_rate(mut self, rate: f64) -> Self {
        self.tabu_tenure_randomize_rate = rate;
        self
    }

    pub fn with_frequency_penalty_coefficient(mut self, coefficient: f64) -> Self {
        self.frequency_penalty_coefficient = coefficient;
        self
    }

    pub fn with_bias_thresholds(mut self, increase: u32, decrease: u32) -> Self {
        self.bias_increase_threshold = increase;
        self.bias_decrease_threshold = decrease;
        self
    }

    pub fn with_pruning_local_update_limit(mut self, limit: Option<u32>) -> Self {
        self.pruning_local_update_limit = limit;
        self
    }

    pub fn with_auto_break(mut self, iteration_threshold: usize, penalty_multiplier: f64) -> Self {
        self.auto_break_iteration_threshold = iteration_threshold;
        self.auto_break_penalty_multiplier = penalty_multiplier;
        self
    }

    pub fn validate(&self) -> SolverResult<()> {
        if self.initial_tabu_tenure < 1 {
            return Err(SolverError::UserInputError(format!(
                "initial_tabu_tenure must be >= 1, got {}",
                self.initial_tabu_tenure
            )));
        }
        if !(0.0..=1.0).contains(&self.tabu_tenure_randomize_rate) {
            return Err(SolverError::UserInputError(format!(
                "tabu_tenure_randomize_rate must be in [0, 1], got {}",
                self.tabu_tenure_randomize_rate
            )));
        }
        if self.frequency_penalty_coefficient < 0.0 {
            return Err(SolverError::UserInputError(
                "frequency_penalty_coefficient must be non-negative".to_string(),
            ));
        }
        if self.auto_break_penalty_multiplier <= 0.0 {
            return Err(SolverError::UserInputError(
                "auto_break_penalty_multiplier must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-run knobs the controller derives fresh before every call into
/// [`super::TabuSearchCore::run`] (`spec.md` §2, "Controller → (configure
/// run) → TabuSearchCore").
#[derive(Debug, Clone)]
pub struct TabuRunParameters {
    pub max_iterations: usize,
    pub deadline: Option<Instant>,
    pub target_objective: Option<f64>,
    /// Tenure this run starts from; adapted internally per `spec.md` §4.5
    /// step 9 and reported back on [`super::TabuSearchResult`].
    pub tabu_tenure: i64,
    pub screening_mode: ImprovabilityScreeningMode,
    pub move_preserve_rate: f64,
    pub is_enabled_shuffle: bool,
    pub number_of_initial_modification: usize,
}

impl TabuRunParameters {
    pub fn new(max_iterations: usize, tabu_tenure: i64) -> Self {
        Self {
            max_iterations,
            deadline: None,
            target_objective: None,
            tabu_tenure,
            screening_mode: ImprovabilityScreeningMode::Soft,
            move_preserve_rate: 1.0,
            is_enabled_shuffle: true,
            number_of_initial_modification: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(TabuOptions::default().validate().is_ok());
    }

    #[test]
    fn zero_tenure_is_rejected() {
        let options = TabuOptions::default().with_initial_tabu_tenure(0);
        assert!(options.validate().is_err());
    }

    #[test]
    fn randomize_rate_out_of_range_is_rejected() {
        let options = TabuOptions::default().with_tabu_tenure_randomize_rate(1.5);
        assert!(options.validate().is_err());
    }
}
