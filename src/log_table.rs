//! The progress-table printer: a human-readable line per inner iteration,
//! distinct from the lifecycle messages the rest of the crate sends through
//! `log` (`spec.md` §6, grounded in `original_source/printemps/solver/
//! tabu_search/tabu_search_print.h`).
//!
//! Printing goes straight to stdout, matching the table format a caller
//! piping solver output to a terminal expects; it is gated by
//! [`LogTable::is_enabled`] rather than a `log` level, since it is a table
//! the user asked for, not a diagnostic.

use crate::incumbent::IncumbentHolder;
use crate::model::{Model, SolutionScore};

/// Which of the three incumbent slots a row just improved, used to choose
/// the `!`/`#`/`*` row marks (`spec.md` §4.4, `IncumbentUpdate`).
#[derive(Debug, Clone, Copy, Default)]
pub struct RowMarks {
    pub local: bool,
    pub global: bool,
    pub feasible: bool,
}

/// Neighborhood size counters printed in the "Number of Neighborhoods"
/// column.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeighborhoodCounts {
    pub all: usize,
    pub feasible_improvable: usize,
    pub permissible: usize,
    pub improvable: usize,
}

/// Stateless table printer; holds only the on/off switch.
#[derive(Debug, Clone, Copy)]
pub struct LogTable {
    enabled: bool,
}

impl LogTable {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn print_header(&self) {
        if !self.enabled {
            return;
        }
        println!("---------+------------------------+----------------------+-----------------------");
        println!("Iteration| Number of Neighborhoods|   Current Solution   |  Incumbent Solution ");
        println!("         |  All Feas. Perm. Impr. |   Aug.Obj.(Penalty)  |   Aug.Obj.  Feas.Obj ");
        println!("---------+------------------------+----------------------+-----------------------");
    }

    pub fn print_initial(&self, model: &Model, current: SolutionScore, incumbent: &IncumbentHolder) {
        if !self.enabled {
            return;
        }
        let sign = model.objective().sign();
        println!(
            " INITIAL |    -     -     -     - | {:>9.2e}({:>9.2e}) | {:>9.2e}  {:>9.2e}",
            current.local_augmented_objective * sign,
            if current.is_feasible { 0.0 } else { current.local_penalty },
            incumbent.global_augmented_objective() * sign,
            incumbent.feasible_objective() * sign,
        );
    }

    /// One row per inner iteration. `marks` selects the `!`/`#`/`*` prefix
    /// characters the way `original_source`'s printer keys them off the
    /// incumbent-update status bitmask.
    pub fn print_row(
        &self,
        model: &Model,
        iteration: i64,
        counts: NeighborhoodCounts,
        current: SolutionScore,
        marks: RowMarks,
        incumbent: &IncumbentHolder,
    ) {
        if !self.enabled {
            return;
        }
        let sign = model.objective().sign();

        let mut mark_current = ' ';
        let mut mark_global = ' ';
        let mut mark_feasible = ' ';
        if marks.local {
            mark_current = '!';
        }
        if marks.global {
            mark_current = '#';
            mark_global = '#';
        }
        if marks.feasible {
            mark_current = '*';
            mark_global = '*';
            mark_feasible = '*';
        }

        println!(
            "{:>8} |{} {} {} {} |{}{:>9.2e}({:>9.2e}) |{}{:>9.2e} {}{:>9.2e}",
            iteration,
            int_format(counts.all),
            int_format(counts.feasible_improvable),
            int_format(counts.permissible),
            int_format(counts.improvable),
            mark_current,
            current.local_augmented_objective * sign,
            if current.is_feasible { 0.0 } else { current.local_penalty },
            mark_global,
            incumbent.global_augmented_objective() * sign,
            mark_feasible,
            incumbent.feasible_objective() * sign,
        );
    }

    pub fn print_footer(&self) {
        if !self.enabled {
            return;
        }
        println!("---------+------------------------+----------------------+-----------------------");
    }
}

/// Large counts print as e.g. `"  4k"` instead of overflowing the column
/// (`spec.md` §6, `int_format` in `tabu_search_print.h`).
fn int_format(value: usize) -> String {
    if value >= 100_000 {
        format!("{:>4}k", value / 1000)
    } else {
        format!("{:>5}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_format_switches_to_k_suffix_at_100k() {
        assert_eq!(int_format(99_999), "99999");
        assert_eq!(int_format(100_000), " 100k");
        assert_eq!(int_format(250_000), " 250k");
    }

    #[test]
    fn disabled_table_prints_nothing_and_does_not_panic() {
        let table = LogTable::new(false);
        table.print_header();
        table.print_footer();
    }
}
