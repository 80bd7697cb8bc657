//! Search tree storage.
//!
//! Nodes live in a flat arena and refer to their children by index, so a
//! whole tree is dropped in one go once a decision is made.

use crate::state::{Move, State};

/// One node of the search tree.
#[derive(Debug, Clone)]
pub struct MctsNode {
    /// State reached after the move, with the turn already advanced.
    pub state: State,
    /// Move that leads here from the parent; `None` is a pass (and the root).
    pub mv: Option<Move>,
    /// `None` until the node is expanded.
    pub children: Option<Vec<usize>>,
    pub visits: u32,
    /// Per-agent sum of rollout values.
    pub total: Vec<f64>,
    /// Per-agent sum of squared rollout values.
    pub total_sq: Vec<f64>,
}

impl MctsNode {
    pub fn new(state: State, mv: Option<Move>, num_agents: usize) -> Self {
        Self {
            state,
            mv,
            children: None,
            visits: 0,
            total: vec![0.0; num_agents],
            total_sq: vec![0.0; num_agents],
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Mean value for `agent`; zero before the first visit.
    pub fn mean(&self, agent: usize) -> f64 {
        if self.visits == 0 {
            return 0.0;
        }
        self.total.get(agent).copied().unwrap_or(0.0) / f64::from(self.visits)
    }

    pub fn record(&mut self, agent: usize, value: f64) {
        if let Some(total) = self.total.get_mut(agent) {
            *total += value;
        }
        if let Some(total_sq) = self.total_sq.get_mut(agent) {
            *total_sq += value * value;
        }
    }
}

/// Arena owning every node of one search tree. Index 0 is the root.
#[derive(Debug, Default)]
pub struct MctsArena {
    nodes: Vec<MctsNode>,
}

impl MctsArena {
    pub fn with_root(root: MctsNode) -> Self {
        Self { nodes: vec![root] }
    }

    pub fn allocate(&mut self, node: MctsNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn get(&self, index: usize) -> &MctsNode {
        &self.nodes[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut MctsNode {
        &mut self.nodes[index]
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Children of `index`; empty for leaves.
    pub fn children(&self, index: usize) -> &[usize] {
        self.nodes[index].children.as_deref().unwrap_or(&[])
    }
}
