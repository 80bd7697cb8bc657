//! Programmatic forest construction.

use crate::{
    Error, Result,
    beliefs::{Condition, Literal, Vocabulary},
    coverage::CoverageCalculator,
};

use super::{
    GoalPlanForest,
    node::{ActionNode, GoalNode, NodeId, PlanNode, TreeNode},
};

/// Incrementally assembles a [`GoalPlanForest`].
///
/// Steps are appended to a plan body in call order; the builder keeps the
/// `next` links of the body consistent. Plans may be added to a sub-goal after
/// later steps of the enclosing plan were appended.
#[derive(Debug)]
pub struct ForestBuilder {
    name: String,
    vocabulary: Vocabulary,
    nodes: Vec<TreeNode>,
    roots: Vec<NodeId>,
}

impl ForestBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vocabulary: Vocabulary::new(),
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Intern a literal name.
    pub fn literal(&mut self, name: &str) -> Literal {
        self.vocabulary.intern(name)
    }

    pub fn condition(&mut self, text: &str) -> Result<Condition> {
        self.vocabulary.parse_condition(text)
    }

    pub fn conditions(&mut self, texts: &[&str]) -> Result<Vec<Condition>> {
        texts.iter().map(|text| self.condition(text)).collect()
    }

    /// Add a top-level goal. Intentions are numbered in insertion order.
    pub fn intention(&mut self, name: &str) -> NodeId {
        let id = self.push(TreeNode::Goal(GoalNode {
            name: name.to_string(),
            conditions: Vec::new(),
            plans: Vec::new(),
            parent: None,
            next: None,
            extended_coverage: 1.0,
        }));
        self.roots.push(id);
        id
    }

    /// Set the goal conditions of an existing goal.
    pub fn goal_conditions(&mut self, goal: NodeId, conditions: &[&str]) -> Result<()> {
        let conditions = self.conditions(conditions)?;
        self.set_goal_conditions(goal, conditions)
    }

    pub fn set_goal_conditions(&mut self, goal: NodeId, conditions: Vec<Condition>) -> Result<()> {
        match self.nodes.get_mut(goal.index()) {
            Some(TreeNode::Goal(node)) => {
                node.conditions = conditions;
                Ok(())
            }
            Some(_) => Err(Error::UnexpectedNodeKind {
                id: goal.index(),
                expected: "goal",
            }),
            None => Err(Error::UnknownNode { id: goal.index() }),
        }
    }

    pub fn plan(&mut self, goal: NodeId, name: &str, precondition: &[&str]) -> Result<NodeId> {
        let precondition = self.conditions(precondition)?;
        self.plan_with(goal, name, precondition)
    }

    /// Add a plan to `goal` with an already interned precondition.
    pub fn plan_with(
        &mut self,
        goal: NodeId,
        name: &str,
        precondition: Vec<Condition>,
    ) -> Result<NodeId> {
        self.expect_kind(goal, "goal")?;
        let id = self.push(TreeNode::Plan(PlanNode {
            name: name.to_string(),
            precondition,
            body: Vec::new(),
            parent: goal,
            basic_coverage: 1.0,
            extended_coverage: 1.0,
        }));
        if let TreeNode::Goal(node) = &mut self.nodes[goal.index()] {
            node.plans.push(id);
        }
        Ok(id)
    }

    pub fn action(
        &mut self,
        plan: NodeId,
        name: &str,
        precondition: &[&str],
        postcondition: &[&str],
    ) -> Result<NodeId> {
        let precondition = self.conditions(precondition)?;
        let postcondition = self.conditions(postcondition)?;
        self.action_with(plan, name, precondition, postcondition)
    }

    /// Append an action to the body of `plan`.
    pub fn action_with(
        &mut self,
        plan: NodeId,
        name: &str,
        precondition: Vec<Condition>,
        postcondition: Vec<Condition>,
    ) -> Result<NodeId> {
        self.expect_kind(plan, "plan")?;
        let id = self.push(TreeNode::Action(ActionNode {
            name: name.to_string(),
            precondition,
            postcondition,
            parent: plan,
            next: None,
        }));
        self.append_step(plan, id);
        Ok(id)
    }

    pub fn subgoal(&mut self, plan: NodeId, name: &str) -> Result<NodeId> {
        self.subgoal_with(plan, name, Vec::new())
    }

    /// Append a sub-goal to the body of `plan`. Its plans are added afterwards.
    pub fn subgoal_with(
        &mut self,
        plan: NodeId,
        name: &str,
        conditions: Vec<Condition>,
    ) -> Result<NodeId> {
        self.expect_kind(plan, "plan")?;
        let id = self.push(TreeNode::Goal(GoalNode {
            name: name.to_string(),
            conditions,
            plans: Vec::new(),
            parent: Some(plan),
            next: None,
            extended_coverage: 1.0,
        }));
        self.append_step(plan, id);
        Ok(id)
    }

    /// Validate the structure and annotate coverage values.
    pub fn build(self) -> Result<GoalPlanForest> {
        if self.roots.is_empty() {
            return Err(Error::InvalidForest {
                forest: self.name,
                reason: "forest has no intentions".to_string(),
            });
        }
        if let Some(goal) = self
            .nodes
            .iter()
            .filter_map(TreeNode::as_goal)
            .find(|goal| goal.plans.is_empty())
        {
            return Err(Error::InvalidForest {
                reason: format!("goal '{}' has no plans", goal.name),
                forest: self.name,
            });
        }

        let mut forest =
            GoalPlanForest::from_parts(self.name, self.vocabulary, self.nodes, self.roots);
        CoverageCalculator::new().annotate(&mut forest);
        Ok(forest)
    }

    fn push(&mut self, node: TreeNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    fn expect_kind(&self, id: NodeId, expected: &'static str) -> Result<()> {
        match self.nodes.get(id.index()) {
            Some(node) if node.kind() == expected => Ok(()),
            Some(_) => Err(Error::UnexpectedNodeKind {
                id: id.index(),
                expected,
            }),
            None => Err(Error::UnknownNode { id: id.index() }),
        }
    }

    fn append_step(&mut self, plan: NodeId, step: NodeId) {
        let previous = match &mut self.nodes[plan.index()] {
            TreeNode::Plan(node) => {
                let previous = node.body.last().copied();
                node.body.push(step);
                previous
            }
            _ => None,
        };
        if let Some(previous) = previous {
            self.nodes[previous.index()].set_next(step);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_are_linked_in_append_order() {
        let mut builder = ForestBuilder::new("links");
        let goal = builder.intention("G");
        let plan = builder.plan(goal, "P", &[]).unwrap();
        let first = builder.action(plan, "A1", &[], &["X"]).unwrap();
        let second = builder.action(plan, "A2", &["X"], &["Y"]).unwrap();
        let forest = builder.build().unwrap();

        assert_eq!(forest.next(first), Some(second));
        assert_eq!(forest.next(second), None);
        assert_eq!(forest.plan(plan).unwrap().body(), &[first, second]);
        assert_eq!(forest.vocabulary().len(), 2);
    }

    #[test]
    fn goals_without_plans_are_rejected() {
        let mut builder = ForestBuilder::new("broken");
        let goal = builder.intention("G");
        let plan = builder.plan(goal, "P", &[]).unwrap();
        builder.subgoal(plan, "Empty").unwrap();

        let err = builder.build().unwrap_err();
        assert!(matches!(err, Error::InvalidForest { .. }));
        assert!(err.to_string().contains("Empty"));
    }

    #[test]
    fn kind_mismatches_are_reported() {
        let mut builder = ForestBuilder::new("kinds");
        let goal = builder.intention("G");
        assert!(matches!(
            builder.action(goal, "A", &[], &[]),
            Err(Error::UnexpectedNodeKind { expected: "plan", .. })
        ));
        assert!(matches!(
            builder.plan(NodeId(42), "P", &[]),
            Err(Error::UnknownNode { id: 42 })
        ));
    }

    #[test]
    fn empty_forests_are_rejected() {
        assert!(ForestBuilder::new("empty").build().is_err());
    }
}
