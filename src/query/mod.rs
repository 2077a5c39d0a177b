#![forbid(unsafe_code)]

//! Pattern-query IR and the pattern-to-SQL compiler.
//!
//! Queries arrive as an intermediate representation that resembles Cypher:
//! MATCH clauses made of node/relationship chains, an optional WHERE tree,
//! and a projection body with DISTINCT/LIMIT/SKIP. The translator lowers
//! that IR into a single SQL string over the `assets` and `relations`
//! tables plus a typed projection schema the cursor layer uses to reshape
//! result rows.

/// Intermediate representation of pattern queries.
pub mod ir;

/// Fluent construction of pattern queries.
pub mod builder;

/// Boolean AND/OR tree over rendered SQL fragments.
pub mod expr;

/// Query graph accumulated from MATCH pattern elements.
pub mod pattern;

/// Structured translation errors.
pub mod errors;

/// IR visitors for WHERE clauses, projections, LIMIT, and SKIP.
pub mod visit;

/// Translator orchestration and SQL emission.
pub mod translate;

pub use builder::QueryBuilder;
pub use errors::{TranslateError, TranslateResult};
pub use ir::{
    CompareOp, Direction, Expr, Literal, MatchClause, NodePattern, PatternElement, PatternQuery,
    ProjectionBody, ProjectionItem, RelationPattern,
};
pub use translate::{Projection, ProjectionKind, SqlTranslation, SqlTranslator};
