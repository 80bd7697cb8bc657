//! Match state, scheduler decisions and the state transition.

use std::{fmt, sync::Arc};

use crate::{
    Error, Result,
    beliefs::BeliefBase,
    forest::{GoalPlanForest, NodeId, PlanNode, TreeNode},
};

/// A legal way to progress one intention from a given state.
///
/// `plan` is the index of the chosen plan when the current step is a goal and
/// `None` when it is an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub intention: usize,
    pub plan: Option<usize>,
}

impl Move {
    pub fn action(intention: usize) -> Self {
        Self {
            intention,
            plan: None,
        }
    }

    pub fn plan(intention: usize, plan: usize) -> Self {
        Self {
            intention,
            plan: Some(plan),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.plan {
            Some(plan) => write!(f, "intention {} via plan {}", self.intention, plan),
            None => write!(f, "intention {}", self.intention),
        }
    }
}

/// What a scheduler wants to do on its turn.
///
/// `intention == None` is a pass. A forced pass means the agent had nothing it
/// could do; an unforced pass is a deliberate choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub intention: Option<usize>,
    pub plan: Option<usize>,
    pub forced_pass: bool,
}

impl Decision {
    /// Deliberately skip this turn.
    pub fn pass() -> Self {
        Self {
            intention: None,
            plan: None,
            forced_pass: false,
        }
    }

    /// Nothing to do; the match hands the turn to the next agent.
    pub fn forced() -> Self {
        Self {
            intention: None,
            plan: None,
            forced_pass: true,
        }
    }

    pub fn progress(mv: Move) -> Self {
        Self {
            intention: Some(mv.intention),
            plan: mv.plan,
            forced_pass: false,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.intention.is_none()
    }

    /// The move this decision names, if it is not a pass.
    pub fn as_move(&self) -> Option<Move> {
        self.intention.map(|intention| Move {
            intention,
            plan: self.plan,
        })
    }
}

impl From<Move> for Decision {
    fn from(mv: Move) -> Self {
        Decision::progress(mv)
    }
}

impl From<Option<Move>> for Decision {
    fn from(mv: Option<Move>) -> Self {
        mv.map_or_else(Decision::pass, Decision::progress)
    }
}

/// Result of applying a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// An action executed; the pointer moved past it.
    Progressed,
    /// The chosen plan starts with a sub-goal; the pointer now names it.
    Descended,
    /// A precondition did not hold. Nothing changed.
    Failed,
}

/// Snapshot of a match: beliefs, per-intention step pointers and whose turn it is.
///
/// The forest is shared between clones; beliefs and pointers are copied.
#[derive(Debug, Clone)]
pub struct State {
    forest: Arc<GoalPlanForest>,
    pub beliefs: BeliefBase,
    intentions: Vec<Option<NodeId>>,
    pub player_turn: usize,
}

impl State {
    /// Every intention starts at its top-level goal.
    pub fn new(forest: Arc<GoalPlanForest>, beliefs: BeliefBase, player_turn: usize) -> Self {
        let intentions = forest.roots().iter().copied().map(Some).collect();
        Self {
            forest,
            beliefs,
            intentions,
            player_turn,
        }
    }

    pub fn forest(&self) -> &GoalPlanForest {
        &self.forest
    }

    pub fn shared_forest(&self) -> &Arc<GoalPlanForest> {
        &self.forest
    }

    pub fn forest_name(&self) -> &str {
        self.forest.name()
    }

    /// Current step of every intention; `None` once complete.
    pub fn intentions(&self) -> &[Option<NodeId>] {
        &self.intentions
    }

    pub fn current_step(&self, intention: usize) -> Option<NodeId> {
        self.intentions.get(intention).copied().flatten()
    }

    pub fn set_current_step(&mut self, intention: usize, step: Option<NodeId>) {
        if let Some(slot) = self.intentions.get_mut(intention) {
            *slot = step;
        }
    }

    pub fn num_intentions(&self) -> usize {
        self.intentions.len()
    }

    pub fn is_complete(&self, intention: usize) -> bool {
        self.current_step(intention).is_none()
    }

    pub fn all_complete(&self) -> bool {
        self.intentions.iter().all(Option::is_none)
    }

    pub fn advance_turn(&mut self, num_agents: usize) {
        if num_agents > 0 {
            self.player_turn = (self.player_turn + 1) % num_agents;
        }
    }

    /// Indices of the plans of the current goal that can be adopted now.
    /// Empty when the current step is an action or the intention is complete.
    pub fn applicable_plans(&self, intention: usize) -> Vec<usize> {
        let Some(step) = self.current_step(intention) else {
            return Vec::new();
        };
        self.forest
            .plans_of(step)
            .enumerate()
            .filter(|(_, (_, plan))| self.plan_ready(plan))
            .map(|(j, _)| j)
            .collect()
    }

    /// An action is progressable when its precondition holds, a goal when at
    /// least one plan precondition holds.
    pub fn progressable(&self, intention: usize) -> bool {
        let Some(step) = self.current_step(intention) else {
            return false;
        };
        match self.forest.get(step) {
            Some(TreeNode::Action(action)) => self.beliefs.evaluate(&action.precondition),
            Some(TreeNode::Goal(_)) => self
                .forest
                .plans_of(step)
                .any(|(_, plan)| self.plan_ready(plan)),
            _ => false,
        }
    }

    /// The plan precondition holds and, when the body opens with an action,
    /// so does that action's precondition. Adopting a plan executes its first
    /// action in the same move.
    fn plan_ready(&self, plan: &PlanNode) -> bool {
        if !self.beliefs.evaluate(&plan.precondition) {
            return false;
        }
        match plan.body().first().and_then(|&first| self.forest.action(first)) {
            Some(action) => self.beliefs.evaluate(&action.precondition),
            None => true,
        }
    }

    /// Legal moves of one intention, in plan order.
    pub fn moves_for(&self, intention: usize) -> Vec<Move> {
        let Some(step) = self.current_step(intention) else {
            return Vec::new();
        };
        match self.forest.get(step) {
            Some(TreeNode::Action(action)) if self.beliefs.evaluate(&action.precondition) => {
                vec![Move::action(intention)]
            }
            Some(TreeNode::Goal(_)) => self
                .applicable_plans(intention)
                .into_iter()
                .map(|plan| Move::plan(intention, plan))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Legal moves over the intentions selected by `mask`, ordered by
    /// intention then plan.
    pub fn legal_moves(&self, mask: &[bool]) -> Vec<Move> {
        (0..self.intentions.len())
            .filter(|&i| mask.get(i).copied().unwrap_or(false))
            .flat_map(|i| self.moves_for(i))
            .collect()
    }

    /// Execute `mv` for the agent whose turn it is. The turn is not advanced.
    ///
    /// Failed preconditions are not errors; naming a completed or unknown
    /// intention or a plan that does not fit the current step is.
    pub fn apply_move(&mut self, mv: Move) -> Result<MoveOutcome> {
        let agent = self.player_turn;
        let invalid = |reason: String| Error::InvalidDecision { agent, reason };

        if mv.intention >= self.intentions.len() {
            return Err(invalid(format!(
                "intention {} out of range (match has {})",
                mv.intention,
                self.intentions.len()
            )));
        }
        let Some(step) = self.current_step(mv.intention) else {
            return Err(invalid(format!(
                "intention {} is already complete",
                mv.intention
            )));
        };

        let forest = Arc::clone(&self.forest);
        match (forest.node(step), mv.plan) {
            (TreeNode::Action(_), Some(plan)) => Err(invalid(format!(
                "intention {} is at an action but plan {plan} was given",
                mv.intention
            ))),
            (TreeNode::Action(_), None) => Ok(self.execute_action(mv.intention, step)),
            (TreeNode::Goal(_), None) => Err(invalid(format!(
                "intention {} is at a goal but no plan was given",
                mv.intention
            ))),
            (TreeNode::Goal(goal), Some(index)) => {
                let Some(&plan_id) = goal.plans().get(index) else {
                    return Err(invalid(format!(
                        "plan {index} out of range for goal '{}' ({} plans)",
                        goal.name,
                        goal.plans().len()
                    )));
                };
                let Some(plan) = forest.plan(plan_id) else {
                    return Err(Error::UnexpectedNodeKind {
                        id: plan_id.index(),
                        expected: "plan",
                    });
                };
                if !self.beliefs.evaluate(&plan.precondition) {
                    return Ok(MoveOutcome::Failed);
                }
                let Some(&first) = plan.body().first() else {
                    self.set_current_step(mv.intention, forest.next_step(step));
                    return Ok(MoveOutcome::Progressed);
                };
                match forest.node(first) {
                    TreeNode::Goal(_) => {
                        self.set_current_step(mv.intention, Some(first));
                        Ok(MoveOutcome::Descended)
                    }
                    _ => Ok(self.execute_action(mv.intention, first)),
                }
            }
            (TreeNode::Plan(_), _) => Err(Error::UnexpectedNodeKind {
                id: step.index(),
                expected: "action or goal",
            }),
        }
    }

    fn execute_action(&mut self, intention: usize, step: NodeId) -> MoveOutcome {
        let Some(action) = self.forest.action(step) else {
            return MoveOutcome::Failed;
        };
        if !self.beliefs.evaluate(&action.precondition) {
            return MoveOutcome::Failed;
        }
        self.beliefs.apply(&action.postcondition);
        let next = self.forest.next_step(step);
        self.set_current_step(intention, next);
        MoveOutcome::Progressed
    }

    /// Number of completed intentions selected by `mask`.
    pub fn completed(&self, mask: &[bool]) -> usize {
        self.intentions
            .iter()
            .zip(mask)
            .filter(|(step, counted)| **counted && step.is_none())
            .count()
    }

    /// Sum of `values` over completed intentions selected by `mask`.
    pub fn score(&self, values: &[f64], mask: &[bool]) -> f64 {
        self.intentions
            .iter()
            .zip(mask)
            .zip(values)
            .filter(|((step, counted), _)| **counted && step.is_none())
            .map(|(_, value)| value)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::ForestBuilder;

    /// G0: P0 [A] -> a0 [A] => B ; P1 [!A] -> sub-goal S (plan Q [] -> s0 => C)
    /// G1: P2 [B] -> b0 [B] => D
    fn fixture() -> State {
        let mut builder = ForestBuilder::new("state");
        let g0 = builder.intention("G0");
        let p0 = builder.plan(g0, "P0", &["A"]).unwrap();
        builder.action(p0, "a0", &["A"], &["B"]).unwrap();
        let p1 = builder.plan(g0, "P1", &["!A"]).unwrap();
        let sub = builder.subgoal(p1, "S").unwrap();
        let q = builder.plan(sub, "Q", &[]).unwrap();
        builder.action(q, "s0", &[], &["C"]).unwrap();
        let g1 = builder.intention("G1");
        let p2 = builder.plan(g1, "P2", &["B"]).unwrap();
        builder.action(p2, "b0", &["B"], &["D"]).unwrap();
        let a = builder.literal("A");
        let forest = builder.build().unwrap();

        let mut beliefs = BeliefBase::with_len(forest.vocabulary().len());
        beliefs.set(a, true);
        State::new(Arc::new(forest), beliefs, 0)
    }

    #[test]
    fn legal_moves_respect_preconditions_and_mask() {
        let state = fixture();
        assert_eq!(state.legal_moves(&[true, true]), vec![Move::plan(0, 0)]);
        assert!(state.legal_moves(&[false, true]).is_empty());
        assert!(state.progressable(0));
        assert!(!state.progressable(1));
    }

    #[test]
    fn plan_with_blocked_first_action_is_not_applicable() {
        let mut builder = ForestBuilder::new("blocked");
        let goal = builder.intention("G");
        let plan = builder.plan(goal, "P", &[]).unwrap();
        builder.action(plan, "a", &["Key"], &["Done"]).unwrap();
        let forest = builder.build().unwrap();
        let beliefs = BeliefBase::with_len(forest.vocabulary().len());
        let state = State::new(Arc::new(forest), beliefs, 0);

        assert!(state.applicable_plans(0).is_empty());
        assert!(!state.progressable(0));
        assert!(state.legal_moves(&[true]).is_empty());
    }

    #[test]
    fn goal_move_executes_first_action_and_completes() {
        let mut state = fixture();
        let outcome = state.apply_move(Move::plan(0, 0)).unwrap();
        assert_eq!(outcome, MoveOutcome::Progressed);
        assert!(state.is_complete(0));

        // B now holds, so G1 can run to completion.
        assert_eq!(state.apply_move(Move::plan(1, 0)).unwrap(), MoveOutcome::Progressed);
        assert!(state.all_complete());
        assert_eq!(state.completed(&[true, false]), 1);
        assert_eq!(state.score(&[2.0, 3.0], &[true, true]), 5.0);
    }

    #[test]
    fn failed_plan_precondition_leaves_state_unchanged() {
        let mut state = fixture();
        let before = state.clone();
        assert_eq!(state.apply_move(Move::plan(0, 1)).unwrap(), MoveOutcome::Failed);
        assert_eq!(state.beliefs, before.beliefs);
        assert_eq!(state.intentions(), before.intentions());
    }

    #[test]
    fn plan_starting_with_subgoal_descends() {
        let mut state = fixture();
        let a = state.forest().vocabulary().lookup("A").unwrap();
        state.beliefs.set(a, false);

        assert_eq!(state.apply_move(Move::plan(0, 1)).unwrap(), MoveOutcome::Descended);
        let step = state.current_step(0).unwrap();
        assert_eq!(state.forest().node(step).name(), "S");

        assert_eq!(state.apply_move(Move::plan(0, 0)).unwrap(), MoveOutcome::Progressed);
        assert!(state.is_complete(0));
    }

    #[test]
    fn contract_violations_are_errors() {
        let mut state = fixture();
        assert!(matches!(
            state.apply_move(Move::plan(5, 0)),
            Err(Error::InvalidDecision { agent: 0, .. })
        ));
        assert!(state.apply_move(Move::action(0)).is_err());
        assert!(state.apply_move(Move::plan(0, 7)).is_err());

        state.apply_move(Move::plan(0, 0)).unwrap();
        assert!(state.apply_move(Move::plan(0, 0)).is_err());
    }

    #[test]
    fn clones_share_forest_but_not_beliefs() {
        let state = fixture();
        let mut copy = state.clone();
        copy.apply_move(Move::plan(0, 0)).unwrap();
        copy.advance_turn(2);

        assert!(Arc::ptr_eq(state.shared_forest(), copy.shared_forest()));
        assert!(!state.is_complete(0));
        assert_eq!(state.player_turn, 0);
        assert_eq!(copy.player_turn, 1);
    }
}
