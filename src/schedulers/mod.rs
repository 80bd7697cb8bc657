//! Scheduling policies.
//!
//! Every policy implements [`Scheduler`](crate::ports::Scheduler). Randomized
//! policies own their `StdRng`; construct them with `with_seed` for
//! reproducible matches.

pub mod boltzmann;
pub mod coverage_priority;
pub mod fifo;
pub mod pass;
pub mod random;
pub mod round_robin;
pub mod smart_random;
pub mod stochastic;

pub use boltzmann::BoltzmannCScheduler;
pub use coverage_priority::{CScheduler, CoverageType, intention_coverage};
pub use fifo::FifoScheduler;
pub use pass::PassScheduler;
pub use random::RandomScheduler;
pub use round_robin::RoundRobinScheduler;
pub use smart_random::SmartRandomScheduler;
pub use stochastic::{StochasticCScheduler, StochasticFifoScheduler};

use crate::state::{Move, State};

/// Build the move for `intention`. Goals get the plan `pick` chooses among the
/// applicable plan indices; actions take no plan.
pub(crate) fn move_with_plan(
    state: &State,
    intention: usize,
    pick: impl FnOnce(&[usize]) -> Option<usize>,
) -> Move {
    let at_goal = state
        .current_step(intention)
        .and_then(|step| state.forest().goal(step))
        .is_some();
    if at_goal {
        Move {
            intention,
            plan: pick(&state.applicable_plans(intention)),
        }
    } else {
        Move::action(intention)
    }
}

/// Progressable intentions selected by `mask`, in index order.
pub(crate) fn progressable_in(state: &State, mask: &[bool]) -> Vec<usize> {
    (0..state.num_intentions())
        .filter(|&i| mask.get(i).copied().unwrap_or(false) && state.progressable(i))
        .collect()
}
