pub mod error;
pub mod graph;
pub mod model;
pub mod query;
pub mod store;

pub use crate::error::{Result, StoreError};
pub use crate::graph::{Graph, GraphUpdatesBulk};
pub use crate::model::{Asset, AssetWithId, Relation, RelationWithId, SourceRelation};
pub use crate::query::{
    PatternQuery, QueryBuilder, SqlTranslation, SqlTranslator, TranslateError,
};
pub use crate::store::{QueryResult, QueryValue, ScalarValue, SqliteStore, UpdateStats};
