use serde::Deserialize;
use serde_json::Value;

use crate::error::SearchError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamedSpecies {
    pub name: String,
}

/// `species` is required: a node without it fails to decode instead of
/// being skipped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EvolutionNode {
    pub species: NamedSpecies,
    #[serde(default)]
    pub evolves_to: Vec<EvolutionNode>,
}

impl EvolutionNode {
    pub fn leaf(name: &str) -> Self {
        Self {
            species: NamedSpecies {
                name: name.to_string(),
            },
            evolves_to: Vec::new(),
        }
    }

    pub fn with_children(name: &str, evolves_to: Vec<EvolutionNode>) -> Self {
        Self {
            species: NamedSpecies {
                name: name.to_string(),
            },
            evolves_to,
        }
    }
}

pub fn parse_chain(resource: &Value) -> Result<EvolutionNode, SearchError> {
    let chain = resource
        .get("chain")
        .ok_or_else(|| SearchError::Parse("evolution chain has no `chain` member".to_string()))?;
    EvolutionNode::deserialize(chain)
        .map_err(|err| SearchError::Parse(format!("evolution chain: {err}")))
}

impl Drop for EvolutionNode {
    fn drop(&mut self) {
        // Detach descendants first so each node drops with no children left.
        let mut pending = std::mem::take(&mut self.evolves_to);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.evolves_to);
        }
    }
}

/// Pre-order walk: the root first, then each child subtree in full before
/// the next sibling.
pub fn flatten(root: &EvolutionNode) -> Vec<String> {
    let mut names = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        names.push(node.species.name.clone());
        stack.extend(node.evolves_to.iter().rev());
    }
    names
}
