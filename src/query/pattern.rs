//! Query graph accumulated from MATCH pattern elements.
//!
//! Every pattern node and relationship becomes an indexed slot; the index
//! determines the table alias used in emission, so slot order is stable and
//! dense. Variables unify: naming the same variable twice yields the same
//! slot with its label sets merged.

use crate::query::errors::{TranslateError, TranslateResult};
use crate::query::ir::{Direction, NodePattern, RelationPattern};

/// Table alias of the node slot at `index`.
pub(crate) fn node_alias(index: usize) -> String {
    format!("a{index}")
}

/// Table alias of the relation slot at `index`.
pub(crate) fn relation_alias(index: usize) -> String {
    format!("r{index}")
}

/// Node slot in the query graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryNode {
    pub labels: Vec<String>,
    pub variable: Option<String>,
}

/// Relation slot connecting two node slots by index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryRelation {
    pub labels: Vec<String>,
    pub variable: Option<String>,
    pub left_idx: usize,
    pub right_idx: usize,
    pub direction: Direction,
}

/// Which kind of slot a variable is bound to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VariableKind {
    Node,
    Relation,
}

/// Slots collected while the translator walks the MATCH clauses.
#[derive(Debug, Default)]
pub struct QueryGraph {
    nodes: Vec<QueryNode>,
    relations: Vec<QueryRelation>,
}

impl QueryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node slot and returns its index.
    ///
    /// A pattern naming an already-bound variable returns the existing slot
    /// with the new labels merged in written order.
    pub fn push_node(&mut self, pattern: &NodePattern) -> TranslateResult<usize> {
        if let Some(name) = &pattern.variable {
            if self
                .relations
                .iter()
                .any(|relation| relation.variable.as_deref() == Some(name))
            {
                return Err(TranslateError::VariableKindConflict(name.clone()));
            }
            if let Some(index) = self
                .nodes
                .iter()
                .position(|node| node.variable.as_deref() == Some(name))
            {
                merge_labels(&mut self.nodes[index].labels, &pattern.labels);
                return Ok(index);
            }
        }
        self.nodes.push(QueryNode {
            labels: pattern.labels.clone(),
            variable: pattern.variable.clone(),
        });
        Ok(self.nodes.len() - 1)
    }

    /// Appends a relation slot between two node slots and returns its index.
    ///
    /// Named relations unify the same way nodes do; the first occurrence
    /// fixes the endpoints.
    pub fn push_relation(
        &mut self,
        pattern: &RelationPattern,
        left_idx: usize,
        right_idx: usize,
    ) -> TranslateResult<usize> {
        if let Some(name) = &pattern.variable {
            if self
                .nodes
                .iter()
                .any(|node| node.variable.as_deref() == Some(name))
            {
                return Err(TranslateError::VariableKindConflict(name.clone()));
            }
            if let Some(index) = self
                .relations
                .iter()
                .position(|relation| relation.variable.as_deref() == Some(name))
            {
                merge_labels(&mut self.relations[index].labels, &pattern.labels);
                return Ok(index);
            }
        }
        self.relations.push(QueryRelation {
            labels: pattern.labels.clone(),
            variable: pattern.variable.clone(),
            left_idx,
            right_idx,
            direction: pattern.direction,
        });
        Ok(self.relations.len() - 1)
    }

    /// Resolves a variable name to its slot.
    pub fn find_variable(&self, name: &str) -> TranslateResult<(VariableKind, usize)> {
        if let Some(index) = self
            .nodes
            .iter()
            .position(|node| node.variable.as_deref() == Some(name))
        {
            return Ok((VariableKind::Node, index));
        }
        if let Some(index) = self
            .relations
            .iter()
            .position(|relation| relation.variable.as_deref() == Some(name))
        {
            return Ok((VariableKind::Relation, index));
        }
        Err(TranslateError::UnknownVariable(name.to_owned()))
    }

    pub fn find_node(&self, index: usize) -> TranslateResult<&QueryNode> {
        self.nodes
            .get(index)
            .ok_or(TranslateError::OutOfRange { kind: "node", index })
    }

    pub fn find_relation(&self, index: usize) -> TranslateResult<&QueryRelation> {
        self.relations.get(index).ok_or(TranslateError::OutOfRange {
            kind: "relation",
            index,
        })
    }

    pub fn nodes(&self) -> &[QueryNode] {
        &self.nodes
    }

    pub fn relations(&self) -> &[QueryRelation] {
        &self.relations
    }
}

fn merge_labels(existing: &mut Vec<String>, incoming: &[String]) {
    for label in incoming {
        if !existing.iter().any(|known| known == label) {
            existing.push(label.clone());
        }
    }
}
