//! Row-to-object rematerialization.
//!
//! Result rows come back as flat column lists; the projection schema says
//! how many columns each projected item consumes (three for a node, five
//! for an edge, one for a scalar) and in what order. Columns are drained
//! left to right and reassembled into typed outputs.

use crate::error::{Result, StoreError};
use crate::model::{Asset, AssetWithId, RelationWithId};
use crate::query::{Projection, ProjectionKind};

/// Scalar cell value surfaced to clients.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<rusqlite::types::Value> for ScalarValue {
    fn from(value: rusqlite::types::Value) -> Self {
        match value {
            rusqlite::types::Value::Null => ScalarValue::Null,
            rusqlite::types::Value::Integer(value) => ScalarValue::Int(value),
            rusqlite::types::Value::Real(value) => ScalarValue::Float(value),
            rusqlite::types::Value::Text(value) => ScalarValue::Text(value),
            rusqlite::types::Value::Blob(value) => ScalarValue::Bytes(value),
        }
    }
}

/// One reassembled output item.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryValue {
    Node(AssetWithId),
    Edge(RelationWithId),
    Scalar(ScalarValue),
}

/// One reassembled result row, item order matching the projection schema.
pub type QueryRow = Vec<QueryValue>;

/// Reassembles one flat row according to the projection schema.
pub fn decode_row(projections: &[Projection], columns: Vec<ScalarValue>) -> Result<QueryRow> {
    let expected: usize = projections
        .iter()
        .map(|projection| projection.kind.column_count())
        .sum();
    if columns.len() != expected {
        return Err(StoreError::Corruption(format!(
            "result row has {} columns, projection schema expects {expected}",
            columns.len()
        )));
    }

    let mut drain = columns.into_iter();
    let mut row = Vec::with_capacity(projections.len());
    for projection in projections {
        match projection.kind {
            ProjectionKind::Node => {
                let id = expect_text(drain.next(), "asset id")?;
                let key = expect_text(drain.next(), "asset value")?;
                let type_name = expect_text(drain.next(), "asset type")?;
                row.push(QueryValue::Node(AssetWithId {
                    id,
                    asset: Asset { type_name, key },
                }));
            }
            ProjectionKind::Edge => {
                let id = expect_text(drain.next(), "relation id")?;
                let from_id = expect_text(drain.next(), "relation from_id")?;
                let to_id = expect_text(drain.next(), "relation to_id")?;
                let type_name = expect_text(drain.next(), "relation type")?;
                let source = expect_text(drain.next(), "relation source")?;
                row.push(QueryValue::Edge(RelationWithId {
                    id,
                    from_id,
                    to_id,
                    type_name,
                    source,
                }));
            }
            ProjectionKind::Property => {
                let value = drain.next().ok_or_else(|| {
                    StoreError::Corruption("row exhausted before projection schema".into())
                })?;
                row.push(QueryValue::Scalar(value));
            }
        }
    }
    Ok(row)
}

fn expect_text(cell: Option<ScalarValue>, what: &str) -> Result<String> {
    match cell {
        Some(ScalarValue::Text(value)) => Ok(value),
        other => Err(StoreError::Corruption(format!(
            "expected text column for {what}, got {other:?}"
        ))),
    }
}
