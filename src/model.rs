use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Asset {
    #[serde(rename = "type")]
    pub type_name: String,
    pub key: String,
}

impl Asset {
    pub fn new(type_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            key: key.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub from: Asset,
    pub to: Asset,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl Relation {
    pub fn new(from: Asset, type_name: impl Into<String>, to: Asset) -> Self {
        Self {
            from,
            to,
            type_name: type_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRelation {
    #[serde(flatten)]
    pub relation: Relation,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetWithId {
    pub id: String,
    pub asset: Asset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationWithId {
    pub id: String,
    pub from_id: String,
    pub to_id: String,
    pub type_name: String,
    pub source: String,
}
