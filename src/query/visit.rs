//! IR visitors: WHERE lowering, projection classification and rendering,
//! LIMIT/SKIP extraction.
//!
//! Each visitor is stateless across calls: it walks one IR sub-tree against
//! the query graph and returns a single result. Variables resolve to the
//! table alias of their slot, so `n.value` becomes `a3.value` when `n` is
//! bound to node slot 3.

use crate::query::errors::{TranslateError, TranslateResult};
use crate::query::expr::BoolExpr;
use crate::query::ir::{Expr, Literal};
use crate::query::pattern::{node_alias, relation_alias, QueryGraph, VariableKind};
use crate::query::translate::ProjectionKind;

/// Columns addressable on a node binding.
const NODE_COLUMNS: &[&str] = &["id", "value", "type"];

/// Columns addressable on a relation binding.
const RELATION_COLUMNS: &[&str] = &["id", "from_id", "to_id", "type", "source"];

/// Lowered WHERE clause: a boolean tree over rendered comparison fragments
/// plus the variables the clause referenced, in first-use order.
#[derive(Debug)]
pub struct WhereClause {
    pub tree: BoolExpr,
    pub variables: Vec<String>,
}

/// Lowers a WHERE expression into a renderable boolean tree.
///
/// AND/OR structure is preserved as tree nodes so disjunctions survive into
/// DNF expansion; comparisons render into leaves.
pub fn parse_where(expr: &Expr, graph: &QueryGraph) -> TranslateResult<WhereClause> {
    let mut variables = Vec::new();
    let tree = lower_bool(expr, graph, &mut variables)?;
    Ok(WhereClause { tree, variables })
}

fn lower_bool(
    expr: &Expr,
    graph: &QueryGraph,
    variables: &mut Vec<String>,
) -> TranslateResult<BoolExpr> {
    match expr {
        Expr::And(children) => Ok(BoolExpr::And(
            children
                .iter()
                .map(|child| lower_bool(child, graph, variables))
                .collect::<TranslateResult<Vec<_>>>()?,
        )),
        Expr::Or(children) => Ok(BoolExpr::Or(
            children
                .iter()
                .map(|child| lower_bool(child, graph, variables))
                .collect::<TranslateResult<Vec<_>>>()?,
        )),
        Expr::Comparison { .. } => Ok(BoolExpr::Leaf(render_comparison(expr, graph, variables)?)),
        Expr::Not(inner) => {
            let fragment = render_comparison(inner, graph, variables)?;
            Ok(BoolExpr::Leaf(format!("NOT ({fragment})")))
        }
        other => Err(TranslateError::UnsupportedExpression(format!(
            "{} cannot be used as a filter",
            describe(other)
        ))),
    }
}

fn render_comparison(
    expr: &Expr,
    graph: &QueryGraph,
    variables: &mut Vec<String>,
) -> TranslateResult<String> {
    let Expr::Comparison { left, op, right } = expr else {
        return Err(TranslateError::UnsupportedExpression(format!(
            "{} cannot be negated or compared",
            describe(expr)
        )));
    };
    let lhs = render_operand(left, graph, variables)?;
    let rhs = render_operand(right, graph, variables)?;
    Ok(format!("{lhs} {} {rhs}", op.sql()))
}

fn render_operand(
    expr: &Expr,
    graph: &QueryGraph,
    variables: &mut Vec<String>,
) -> TranslateResult<String> {
    match expr {
        Expr::Literal(literal) => Ok(render_literal(literal)),
        Expr::Variable(name) => {
            record_variable(variables, name);
            let (kind, index) = graph.find_variable(name)?;
            Ok(match kind {
                VariableKind::Node => format!("{}.id", node_alias(index)),
                VariableKind::Relation => format!("{}.id", relation_alias(index)),
            })
        }
        Expr::Property { variable, property } => {
            record_variable(variables, variable);
            resolve_column(graph, variable, property)
        }
        other => Err(TranslateError::UnsupportedExpression(format!(
            "{} cannot be used as a comparison operand",
            describe(other)
        ))),
    }
}

/// Resolves `variable.property` to an alias-qualified column.
pub(crate) fn resolve_column(
    graph: &QueryGraph,
    variable: &str,
    property: &str,
) -> TranslateResult<String> {
    let (kind, index) = graph.find_variable(variable)?;
    match kind {
        VariableKind::Node => {
            if !NODE_COLUMNS.contains(&property) {
                return Err(TranslateError::UnsupportedExpression(format!(
                    "unknown node property '{variable}.{property}'"
                )));
            }
            Ok(format!("{}.{property}", node_alias(index)))
        }
        VariableKind::Relation => {
            if !RELATION_COLUMNS.contains(&property) {
                return Err(TranslateError::UnsupportedExpression(format!(
                    "unknown relation property '{variable}.{property}'"
                )));
            }
            Ok(format!("{}.{property}", relation_alias(index)))
        }
    }
}

fn record_variable(variables: &mut Vec<String>, name: &str) {
    if !variables.iter().any(|known| known == name) {
        variables.push(name.to_owned());
    }
}

pub(crate) fn render_literal(literal: &Literal) -> String {
    match literal {
        Literal::Null => "NULL".to_owned(),
        Literal::Bool(true) => "TRUE".to_owned(),
        Literal::Bool(false) => "FALSE".to_owned(),
        Literal::Int(value) => value.to_string(),
        Literal::Float(value) => value.to_string(),
        Literal::String(value) => quote_string(value),
    }
}

/// Single-quotes a string literal, doubling embedded quotes.
pub(crate) fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Aggregate functions recognized in projections.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AggregateFn {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFn {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Some(AggregateFn::Count),
            "sum" => Some(AggregateFn::Sum),
            "avg" => Some(AggregateFn::Avg),
            "min" => Some(AggregateFn::Min),
            "max" => Some(AggregateFn::Max),
            _ => None,
        }
    }

    pub(crate) fn sql(self) -> &'static str {
        match self {
            AggregateFn::Count => "COUNT",
            AggregateFn::Sum => "SUM",
            AggregateFn::Avg => "AVG",
            AggregateFn::Min => "MIN",
            AggregateFn::Max => "MAX",
        }
    }
}

/// Classification of one projection item.
#[derive(Debug)]
pub struct ProjectionShape {
    pub kind: ProjectionKind,
    pub aggregate: Option<AggregateFn>,
}

/// Classifies a projection expression and detects aggregation.
///
/// A whole node variable projects as a node, a whole relation variable as
/// an edge; property paths, literals, and aggregate calls fall back to a
/// single scalar column.
pub fn inspect_projection(expr: &Expr, graph: &QueryGraph) -> TranslateResult<ProjectionShape> {
    match expr {
        Expr::Variable(name) => {
            let (kind, _) = graph.find_variable(name)?;
            let kind = match kind {
                VariableKind::Node => ProjectionKind::Node,
                VariableKind::Relation => ProjectionKind::Edge,
            };
            Ok(ProjectionShape {
                kind,
                aggregate: None,
            })
        }
        Expr::Property { variable, property } => {
            resolve_column(graph, variable, property)?;
            Ok(ProjectionShape {
                kind: ProjectionKind::Property,
                aggregate: None,
            })
        }
        Expr::Literal(_) => Ok(ProjectionShape {
            kind: ProjectionKind::Property,
            aggregate: None,
        }),
        Expr::FnCall { name, args } => {
            let aggregate = AggregateFn::parse(name).ok_or_else(|| {
                TranslateError::UnsupportedExpression(format!("unknown function '{name}'"))
            })?;
            aggregate_argument(name, args, graph)?;
            Ok(ProjectionShape {
                kind: ProjectionKind::Property,
                aggregate: Some(aggregate),
            })
        }
        other => Err(TranslateError::UnsupportedExpression(format!(
            "{} cannot be projected",
            describe(other)
        ))),
    }
}

/// Rendered SQL for one projection item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedProjection {
    /// Flattened column expressions: one for scalars, three for nodes, five
    /// for edges. Aggregates carry the single column they fold over.
    pub columns: Vec<String>,
    /// Aggregate applied over `columns[0]`, when present.
    pub aggregate: Option<AggregateFn>,
}

impl RenderedProjection {
    /// Projection-list fragment for a plain SELECT.
    pub fn to_select_sql(&self) -> String {
        match self.aggregate {
            Some(aggregate) => format!("{}({})", aggregate.sql(), self.columns.join(", ")),
            None => self.columns.join(", "),
        }
    }
}

/// Renders a projection expression into its output columns.
pub fn render_projection(expr: &Expr, graph: &QueryGraph) -> TranslateResult<RenderedProjection> {
    match expr {
        Expr::Variable(name) => {
            let (kind, index) = graph.find_variable(name)?;
            let columns = match kind {
                VariableKind::Node => {
                    let alias = node_alias(index);
                    vec![
                        format!("{alias}.id"),
                        format!("{alias}.value"),
                        format!("{alias}.type"),
                    ]
                }
                VariableKind::Relation => {
                    let alias = relation_alias(index);
                    vec![
                        format!("{alias}.id"),
                        format!("{alias}.from_id"),
                        format!("{alias}.to_id"),
                        format!("{alias}.type"),
                        format!("{alias}.source"),
                    ]
                }
            };
            Ok(RenderedProjection {
                columns,
                aggregate: None,
            })
        }
        Expr::Property { variable, property } => Ok(RenderedProjection {
            columns: vec![resolve_column(graph, variable, property)?],
            aggregate: None,
        }),
        Expr::Literal(literal) => Ok(RenderedProjection {
            columns: vec![render_literal(literal)],
            aggregate: None,
        }),
        Expr::FnCall { name, args } => {
            let aggregate = AggregateFn::parse(name).ok_or_else(|| {
                TranslateError::UnsupportedExpression(format!("unknown function '{name}'"))
            })?;
            let column = aggregate_argument(name, args, graph)?;
            Ok(RenderedProjection {
                columns: vec![column],
                aggregate: Some(aggregate),
            })
        }
        other => Err(TranslateError::UnsupportedExpression(format!(
            "{} cannot be projected",
            describe(other)
        ))),
    }
}

/// Column an aggregate folds over; nodes and relations fold over their id.
fn aggregate_argument(name: &str, args: &[Expr], graph: &QueryGraph) -> TranslateResult<String> {
    let [arg] = args else {
        return Err(TranslateError::UnsupportedExpression(format!(
            "{name} takes exactly one argument"
        )));
    };
    match arg {
        Expr::Variable(variable) => {
            let (kind, index) = graph.find_variable(variable)?;
            Ok(match kind {
                VariableKind::Node => format!("{}.id", node_alias(index)),
                VariableKind::Relation => format!("{}.id", relation_alias(index)),
            })
        }
        Expr::Property { variable, property } => resolve_column(graph, variable, property),
        other => Err(TranslateError::UnsupportedExpression(format!(
            "{} cannot be aggregated",
            describe(other)
        ))),
    }
}

/// Extracts the LIMIT operand as a non-negative integer.
pub fn parse_limit(expr: &Expr) -> TranslateResult<u64> {
    parse_paging(expr, "LIMIT")
}

/// Extracts the SKIP operand as a non-negative integer.
pub fn parse_skip(expr: &Expr) -> TranslateResult<u64> {
    parse_paging(expr, "SKIP")
}

fn parse_paging(expr: &Expr, clause: &'static str) -> TranslateResult<u64> {
    match expr {
        Expr::Literal(Literal::Int(value)) if *value >= 0 => Ok(*value as u64),
        other => Err(TranslateError::UnsupportedExpression(format!(
            "{clause} expects a non-negative integer literal, not {}",
            describe(other)
        ))),
    }
}

fn describe(expr: &Expr) -> &'static str {
    match expr {
        Expr::Variable(_) => "a variable",
        Expr::Property { .. } => "a property access",
        Expr::Literal(_) => "a literal",
        Expr::Comparison { .. } => "a comparison",
        Expr::And(_) => "a conjunction",
        Expr::Or(_) => "a disjunction",
        Expr::Not(_) => "a negation",
        Expr::FnCall { .. } => "a function call",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ir::NodePattern;
    use crate::query::ir::RelationPattern;

    fn graph_with_node() -> QueryGraph {
        let mut graph = QueryGraph::new();
        graph
            .push_node(&NodePattern::var("n").label("Person"))
            .unwrap();
        graph
    }

    fn graph_with_relation() -> QueryGraph {
        let mut graph = QueryGraph::new();
        let left = graph.push_node(&NodePattern::var("a")).unwrap();
        let right = graph.push_node(&NodePattern::var("b")).unwrap();
        graph
            .push_relation(&RelationPattern::var("r").label("KNOWS").right(), left, right)
            .unwrap();
        graph
    }

    #[test]
    fn where_comparison_renders_column_and_literal() {
        let graph = graph_with_node();
        let clause =
            parse_where(&Expr::property("n", "value").eq("Alice"), &graph).unwrap();
        assert_eq!(clause.tree, BoolExpr::Leaf("a0.value = 'Alice'".into()));
        assert_eq!(clause.variables, ["n"]);
    }

    #[test]
    fn where_or_keeps_tree_structure() {
        let graph = graph_with_node();
        let clause = parse_where(
            &Expr::or(vec![
                Expr::property("n", "value").eq("A"),
                Expr::property("n", "value").eq("B"),
            ]),
            &graph,
        )
        .unwrap();
        assert_eq!(
            clause.tree,
            BoolExpr::Or(vec![
                BoolExpr::Leaf("a0.value = 'A'".into()),
                BoolExpr::Leaf("a0.value = 'B'".into()),
            ])
        );
    }

    #[test]
    fn where_negation_wraps_the_fragment() {
        let graph = graph_with_node();
        let clause =
            parse_where(&Expr::property("n", "value").eq("x").not(), &graph).unwrap();
        assert_eq!(
            clause.tree,
            BoolExpr::Leaf("NOT (a0.value = 'x')".into())
        );
    }

    #[test]
    fn where_string_literals_are_escaped() {
        let graph = graph_with_node();
        let clause =
            parse_where(&Expr::property("n", "value").eq("O'Brien"), &graph).unwrap();
        assert_eq!(
            clause.tree,
            BoolExpr::Leaf("a0.value = 'O''Brien'".into())
        );
    }

    #[test]
    fn where_unknown_variable_fails() {
        let graph = graph_with_node();
        let err = parse_where(&Expr::property("m", "value").eq("x"), &graph).unwrap_err();
        assert_eq!(err, TranslateError::UnknownVariable("m".into()));
    }

    #[test]
    fn where_unknown_property_fails() {
        let graph = graph_with_node();
        let err = parse_where(&Expr::property("n", "name").eq("x"), &graph).unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedExpression(_)));
    }

    #[test]
    fn where_relation_columns_resolve() {
        let graph = graph_with_relation();
        let clause = parse_where(&Expr::property("r", "source").eq("dns"), &graph).unwrap();
        assert_eq!(clause.tree, BoolExpr::Leaf("r0.source = 'dns'".into()));
    }

    #[test]
    fn projection_classifies_node_edge_and_property() {
        let graph = graph_with_relation();
        assert_eq!(
            inspect_projection(&Expr::var("a"), &graph).unwrap().kind,
            ProjectionKind::Node
        );
        assert_eq!(
            inspect_projection(&Expr::var("r"), &graph).unwrap().kind,
            ProjectionKind::Edge
        );
        assert_eq!(
            inspect_projection(&Expr::property("a", "value"), &graph)
                .unwrap()
                .kind,
            ProjectionKind::Property
        );
    }

    #[test]
    fn projection_detects_aggregation() {
        let graph = graph_with_node();
        let shape = inspect_projection(&Expr::count(Expr::var("n")), &graph).unwrap();
        assert_eq!(shape.kind, ProjectionKind::Property);
        assert_eq!(shape.aggregate, Some(AggregateFn::Count));
    }

    #[test]
    fn projection_rejects_unknown_functions() {
        let graph = graph_with_node();
        let err = inspect_projection(
            &Expr::fn_call("collect", vec![Expr::var("n")]),
            &graph,
        )
        .unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedExpression(_)));
    }

    #[test]
    fn render_node_projection_emits_three_columns() {
        let graph = graph_with_node();
        let rendered = render_projection(&Expr::var("n"), &graph).unwrap();
        assert_eq!(rendered.columns, ["a0.id", "a0.value", "a0.type"]);
        assert_eq!(rendered.to_select_sql(), "a0.id, a0.value, a0.type");
    }

    #[test]
    fn render_edge_projection_emits_five_columns() {
        let graph = graph_with_relation();
        let rendered = render_projection(&Expr::var("r"), &graph).unwrap();
        assert_eq!(
            rendered.columns,
            ["r0.id", "r0.from_id", "r0.to_id", "r0.type", "r0.source"]
        );
    }

    #[test]
    fn render_count_folds_over_the_id() {
        let graph = graph_with_node();
        let rendered = render_projection(&Expr::count(Expr::var("n")), &graph).unwrap();
        assert_eq!(rendered.columns, ["a0.id"]);
        assert_eq!(rendered.to_select_sql(), "COUNT(a0.id)");
    }

    #[test]
    fn limit_and_skip_extract_integers() {
        assert_eq!(parse_limit(&Expr::literal(10i64)).unwrap(), 10);
        assert_eq!(parse_skip(&Expr::literal(0i64)).unwrap(), 0);
        assert!(parse_limit(&Expr::literal("ten")).is_err());
        assert!(parse_skip(&Expr::literal(-1i64)).is_err());
    }
}
