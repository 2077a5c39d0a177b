//! In-memory graph snapshots and differential updates.
//!
//! Sources observe a graph, diff it against the previously stored snapshot,
//! and push the resulting [`GraphUpdatesBulk`] to the store.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{Asset, Relation};

/// Set-semantic collection of assets and relations.
///
/// Inserting the same asset or relation twice yields a single entry, and
/// adding a relation implies both endpoint assets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    assets: BTreeSet<Asset>,
    relations: BTreeSet<Relation>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an asset, returning the inserted value.
    pub fn add_asset(&mut self, type_name: impl Into<String>, key: impl Into<String>) -> Asset {
        let asset = Asset::new(type_name, key);
        self.assets.insert(asset.clone());
        asset
    }

    /// Adds a relation together with its endpoint assets.
    pub fn add_relation(&mut self, from: Asset, type_name: impl Into<String>, to: Asset) -> Relation {
        self.assets.insert(from.clone());
        self.assets.insert(to.clone());
        let relation = Relation::new(from, type_name, to);
        self.relations.insert(relation.clone());
        relation
    }

    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter()
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter()
    }

    pub fn contains_asset(&self, asset: &Asset) -> bool {
        self.assets.contains(asset)
    }

    pub fn contains_relation(&self, relation: &Relation) -> bool {
        self.relations.contains(relation)
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Computes the differential update that turns `previous` into `self`.
    ///
    /// Everything present here but not in `previous` is upserted; everything
    /// present in `previous` but not here is removed.
    pub fn updates_from(&self, previous: &Graph) -> GraphUpdatesBulk {
        GraphUpdatesBulk {
            asset_upserts: self.assets.difference(&previous.assets).cloned().collect(),
            asset_removals: previous.assets.difference(&self.assets).cloned().collect(),
            relation_upserts: self
                .relations
                .difference(&previous.relations)
                .cloned()
                .collect(),
            relation_removals: previous
                .relations
                .difference(&self.relations)
                .cloned()
                .collect(),
        }
    }
}

/// Bulk of upserts and removals scoped to one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphUpdatesBulk {
    pub asset_upserts: Vec<Asset>,
    pub asset_removals: Vec<Asset>,
    pub relation_upserts: Vec<Relation>,
    pub relation_removals: Vec<Relation>,
}

impl GraphUpdatesBulk {
    /// Bulk that inserts an entire graph from scratch.
    pub fn upsert_all(graph: &Graph) -> Self {
        Self {
            asset_upserts: graph.assets().cloned().collect(),
            relation_upserts: graph.relations().cloned().collect(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.asset_upserts.is_empty()
            && self.asset_removals.is_empty()
            && self.relation_upserts.is_empty()
            && self.relation_removals.is_empty()
    }
}
