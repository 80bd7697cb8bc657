//! Goal-plan tree node variants.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::beliefs::Condition;

/// Stable index of a node inside a [`GoalPlanForest`](super::GoalPlanForest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Primitive step with a precondition and an effect on the belief base.
#[derive(Debug, Clone)]
pub struct ActionNode {
    pub name: String,
    pub precondition: Vec<Condition>,
    pub postcondition: Vec<Condition>,
    pub(crate) parent: NodeId,
    pub(crate) next: Option<NodeId>,
}

/// One way of achieving a goal.
#[derive(Debug, Clone)]
pub struct PlanNode {
    pub name: String,
    pub precondition: Vec<Condition>,
    pub(crate) body: Vec<NodeId>,
    pub(crate) parent: NodeId,
    pub(crate) basic_coverage: f64,
    pub(crate) extended_coverage: f64,
}

impl PlanNode {
    /// Steps (actions and sub-goals) in execution order.
    pub fn body(&self) -> &[NodeId] {
        &self.body
    }

    /// `1 / 2^|precondition|`.
    pub fn basic_coverage(&self) -> f64 {
        self.basic_coverage
    }

    pub fn extended_coverage(&self) -> f64 {
        self.extended_coverage
    }
}

/// A goal with alternative plans. Top-level goals are intentions.
#[derive(Debug, Clone)]
pub struct GoalNode {
    pub name: String,
    pub conditions: Vec<Condition>,
    pub(crate) plans: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub(crate) extended_coverage: f64,
}

impl GoalNode {
    pub fn plans(&self) -> &[NodeId] {
        &self.plans
    }

    /// Probability that some plan of this goal stays applicable.
    pub fn extended_coverage(&self) -> f64 {
        self.extended_coverage
    }

    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }
}

#[derive(Debug, Clone)]
pub enum TreeNode {
    Action(ActionNode),
    Goal(GoalNode),
    Plan(PlanNode),
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            TreeNode::Action(action) => &action.name,
            TreeNode::Goal(goal) => &goal.name,
            TreeNode::Plan(plan) => &plan.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TreeNode::Action(_) => "action",
            TreeNode::Goal(_) => "goal",
            TreeNode::Plan(_) => "plan",
        }
    }

    /// Enclosing plan for steps, owning goal for plans.
    pub fn parent(&self) -> Option<NodeId> {
        match self {
            TreeNode::Action(action) => Some(action.parent),
            TreeNode::Goal(goal) => goal.parent,
            TreeNode::Plan(plan) => Some(plan.parent),
        }
    }

    /// Following step in the same plan body. Plans have none.
    pub fn next(&self) -> Option<NodeId> {
        match self {
            TreeNode::Action(action) => action.next,
            TreeNode::Goal(goal) => goal.next,
            TreeNode::Plan(_) => None,
        }
    }

    pub fn as_action(&self) -> Option<&ActionNode> {
        match self {
            TreeNode::Action(action) => Some(action),
            _ => None,
        }
    }

    pub fn as_goal(&self) -> Option<&GoalNode> {
        match self {
            TreeNode::Goal(goal) => Some(goal),
            _ => None,
        }
    }

    pub fn as_plan(&self) -> Option<&PlanNode> {
        match self {
            TreeNode::Plan(plan) => Some(plan),
            _ => None,
        }
    }

    pub(crate) fn set_next(&mut self, next: NodeId) {
        match self {
            TreeNode::Action(action) => action.next = Some(next),
            TreeNode::Goal(goal) => goal.next = Some(next),
            TreeNode::Plan(_) => {}
        }
    }
}
