//! Goal-plan tree forests.
//!
//! A forest is an arena of [`TreeNode`]s addressed by [`NodeId`]. Each root is a
//! top-level goal, i.e. one intention. Parent and next links are plain indices,
//! so "what happens after this step completes" is answered by walking the arena
//! upwards without any back-references.

pub mod builder;
pub mod generator;
pub mod node;
pub mod spec;

pub use builder::ForestBuilder;
pub use generator::SynthGenerator;
pub use node::{ActionNode, GoalNode, NodeId, PlanNode, TreeNode};
pub use spec::{ActionSpec, ForestInstance, ForestSpec, GoalSpec, PlanSpec, StepSpec};

use crate::beliefs::Vocabulary;

/// Immutable arena holding every node of every intention.
#[derive(Debug, Clone)]
pub struct GoalPlanForest {
    name: String,
    vocabulary: Vocabulary,
    nodes: Vec<TreeNode>,
    roots: Vec<NodeId>,
}

impl GoalPlanForest {
    pub(crate) fn from_parts(
        name: String,
        vocabulary: Vocabulary,
        nodes: Vec<TreeNode>,
        roots: Vec<NodeId>,
    ) -> Self {
        Self {
            name,
            vocabulary,
            nodes,
            roots,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Top-level goals, one per intention, in intention order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn num_intentions(&self) -> usize {
        self.roots.len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.index())
    }

    /// Node lookup for ids produced by this forest.
    ///
    /// # Panics
    ///
    /// Panics when `id` belongs to another forest.
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.index()]
    }

    pub fn action(&self, id: NodeId) -> Option<&ActionNode> {
        self.get(id).and_then(TreeNode::as_action)
    }

    pub fn goal(&self, id: NodeId) -> Option<&GoalNode> {
        self.get(id).and_then(TreeNode::as_goal)
    }

    pub fn plan(&self, id: NodeId) -> Option<&PlanNode> {
        self.get(id).and_then(TreeNode::as_plan)
    }

    /// Plans of `goal`, in declaration order. Empty for non-goal ids.
    pub fn plans_of(&self, goal: NodeId) -> impl Iterator<Item = (NodeId, &PlanNode)> + '_ {
        self.goal(goal)
            .map(|g| g.plans.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |&id| self.plan(id).map(|plan| (id, plan)))
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(TreeNode::next)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(TreeNode::parent)
    }

    /// The step that becomes current once `step` completes.
    ///
    /// Returns the following step of the enclosing plan or, for the last step
    /// of a plan, recurses to the goal that plan achieves. `None` means the
    /// whole intention is finished.
    pub fn next_step(&self, step: NodeId) -> Option<NodeId> {
        let mut current = step;
        loop {
            let node = self.get(current)?;
            if let Some(next) = node.next() {
                return Some(next);
            }
            let plan = node.parent()?;
            current = self.parent(plan)?;
        }
    }

    /// `start` followed by every step reached through [`next_step`](Self::next_step).
    pub fn remaining_steps(&self, start: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(start), move |&id| self.next_step(id))
    }

    /// Every goal id in the arena, top-level and nested.
    pub fn goal_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node, TreeNode::Goal(_)))
            .map(|(i, _)| NodeId(i))
    }

    /// Depth of the deepest goal below `root` (a lone goal has depth 1).
    pub fn depth(&self, root: NodeId) -> usize {
        self.plans_of(root)
            .map(|(_, plan)| {
                plan.body
                    .iter()
                    .filter(|&&step| self.goal(step).is_some())
                    .map(|&step| self.depth(step))
                    .max()
                    .unwrap_or(0)
            })
            .max()
            .unwrap_or(0)
            + 1
    }
}
