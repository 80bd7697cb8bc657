//! JSON description of a forest and its initial beliefs.
//!
//! ```json
//! {
//!   "name": "demo",
//!   "beliefs": { "A": true },
//!   "intentions": [
//!     { "name": "G0", "plans": [
//!       { "name": "P0", "precondition": ["A"], "body": [
//!         { "action": { "name": "a0", "precondition": ["A"], "postcondition": ["!A", "B"] } }
//!       ] }
//!     ] }
//!   ]
//! }
//! ```

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    beliefs::{BeliefBase, Condition, Vocabulary},
};

use super::{ForestBuilder, GoalPlanForest, NodeId, TreeNode};

/// A built forest together with the belief base a match starts from.
#[derive(Debug, Clone)]
pub struct ForestInstance {
    pub forest: GoalPlanForest,
    pub beliefs: BeliefBase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestSpec {
    pub name: String,
    /// Initial truth values. Literals not listed start false.
    #[serde(default)]
    pub beliefs: BTreeMap<String, bool>,
    pub intentions: Vec<GoalSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
    pub plans: Vec<PlanSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSpec {
    pub name: String,
    #[serde(default)]
    pub precondition: Vec<String>,
    #[serde(default)]
    pub body: Vec<StepSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepSpec {
    Action(ActionSpec),
    Goal(GoalSpec),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub name: String,
    #[serde(default)]
    pub precondition: Vec<String>,
    #[serde(default)]
    pub postcondition: Vec<String>,
}

impl ForestSpec {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::io(format!("open forest file {}", path.display()), e))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| Error::io(format!("create forest file {}", path.display()), e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the forest arena and the initial belief base.
    pub fn build(&self) -> Result<ForestInstance> {
        let mut builder = ForestBuilder::new(self.name.clone());
        for literal in self.beliefs.keys() {
            builder.literal(literal);
        }
        for goal in &self.intentions {
            let id = builder.intention(&goal.name);
            add_goal_contents(&mut builder, id, goal)?;
        }
        let forest = builder.build()?;

        let vocabulary = forest.vocabulary();
        let mut beliefs = BeliefBase::with_len(vocabulary.len());
        for (name, &value) in &self.beliefs {
            if let Some(literal) = vocabulary.lookup(name) {
                beliefs.set(literal, value);
            }
        }
        Ok(ForestInstance { forest, beliefs })
    }

    /// Describe an existing forest. Only literals that are true are listed.
    pub fn from_forest(forest: &GoalPlanForest, beliefs: &BeliefBase) -> Self {
        let vocabulary = forest.vocabulary();
        Self {
            name: forest.name().to_string(),
            beliefs: beliefs
                .true_literals()
                .map(|literal| (vocabulary.name(literal).to_string(), true))
                .collect(),
            intentions: forest
                .roots()
                .iter()
                .filter_map(|&root| goal_spec(forest, root))
                .collect(),
        }
    }
}

impl ForestInstance {
    pub fn to_spec(&self) -> ForestSpec {
        ForestSpec::from_forest(&self.forest, &self.beliefs)
    }
}

fn add_goal_contents(builder: &mut ForestBuilder, goal: NodeId, spec: &GoalSpec) -> Result<()> {
    let conditions: Vec<&str> = spec.conditions.iter().map(String::as_str).collect();
    builder.goal_conditions(goal, &conditions)?;

    for plan in &spec.plans {
        let precondition: Vec<&str> = plan.precondition.iter().map(String::as_str).collect();
        let plan_id = builder.plan(goal, &plan.name, &precondition)?;
        for step in &plan.body {
            match step {
                StepSpec::Action(action) => {
                    let pre: Vec<&str> = action.precondition.iter().map(String::as_str).collect();
                    let post: Vec<&str> =
                        action.postcondition.iter().map(String::as_str).collect();
                    builder.action(plan_id, &action.name, &pre, &post)?;
                }
                StepSpec::Goal(subgoal) => {
                    let sub_id = builder.subgoal(plan_id, &subgoal.name)?;
                    add_goal_contents(builder, sub_id, subgoal)?;
                }
            }
        }
    }
    Ok(())
}

fn render(conditions: &[Condition], vocabulary: &Vocabulary) -> Vec<String> {
    conditions
        .iter()
        .map(|condition| condition.display(vocabulary).to_string())
        .collect()
}

fn goal_spec(forest: &GoalPlanForest, id: NodeId) -> Option<GoalSpec> {
    let vocabulary = forest.vocabulary();
    let goal = forest.goal(id)?;
    let plans = forest
        .plans_of(id)
        .map(|(_, plan)| PlanSpec {
            name: plan.name.clone(),
            precondition: render(&plan.precondition, vocabulary),
            body: plan
                .body()
                .iter()
                .filter_map(|&step| match forest.get(step)? {
                    TreeNode::Action(action) => Some(StepSpec::Action(ActionSpec {
                        name: action.name.clone(),
                        precondition: render(&action.precondition, vocabulary),
                        postcondition: render(&action.postcondition, vocabulary),
                    })),
                    TreeNode::Goal(_) => goal_spec(forest, step).map(StepSpec::Goal),
                    TreeNode::Plan(_) => None,
                })
                .collect(),
        })
        .collect();
    Some(GoalSpec {
        name: goal.name.clone(),
        conditions: render(&goal.conditions, vocabulary),
        plans,
    })
}
