//! Pattern-to-SQL translation.
//!
//! [`SqlTranslator`] lowers a [`PatternQuery`] into one SQL string over the
//! `assets` and `relations` tables plus a typed projection schema telling
//! the cursor how many columns each output item consumes. The WHERE tree is
//! expanded into disjunctive normal form and, when more than one conjunction
//! survives, each conjunction becomes its own UNION branch: the backing
//! tables are indexed by type, and per-branch label predicates compose into
//! far better plans than one query with a top-level OR.

use std::collections::HashSet;

use crate::query::errors::{TranslateError, TranslateResult};
use crate::query::expr::BoolExpr;
use crate::query::ir::{Direction, PatternQuery};
use crate::query::pattern::{node_alias, relation_alias, QueryGraph, QueryRelation, VariableKind};
use crate::query::visit::{self, RenderedProjection};

/// How many result columns a projected item consumes and how the cursor
/// reassembles them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProjectionKind {
    /// Three columns in order: `id, value, type`.
    Node,
    /// Five columns in order: `id, from_id, to_id, type, source`.
    Edge,
    /// A single scalar column.
    Property,
}

impl ProjectionKind {
    /// Number of result columns the item consumes.
    pub fn column_count(self) -> usize {
        match self {
            ProjectionKind::Node => 3,
            ProjectionKind::Edge => 5,
            ProjectionKind::Property => 1,
        }
    }
}

/// Schema entry for one projected item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Projection {
    pub alias: Option<String>,
    pub kind: ProjectionKind,
}

/// Result of a translation: the SQL text and the projection schema the
/// cursor uses to reshape each row. The row-reading contract depends on the
/// schema's ordering matching the projection items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SqlTranslation {
    pub query: String,
    pub projections: Vec<Projection>,
}

/// Compiles one pattern query.
///
/// The translator owns the query graph for a single translation;
/// [`SqlTranslator::translate`] consumes it, so a fresh instance is needed
/// per query.
#[derive(Debug, Default)]
pub struct SqlTranslator {
    graph: QueryGraph,
}

impl SqlTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates the query IR into SQL plus a projection schema.
    pub fn translate(mut self, query: &PatternQuery) -> TranslateResult<SqlTranslation> {
        let mut filter_expressions: Vec<BoolExpr> = Vec::new();
        let mut constrained_nodes: HashSet<usize> = HashSet::new();

        for clause in &query.matches {
            for element in &clause.elements {
                let mut left_idx = self.graph.push_node(&element.start)?;
                for hop in &element.hops {
                    let right_idx = self.graph.push_node(&hop.node)?;
                    self.graph.push_relation(&hop.relation, left_idx, right_idx)?;
                    left_idx = right_idx;
                }
            }

            if let Some(filter) = &clause.where_clause {
                let lowered = visit::parse_where(filter, &self.graph)?;
                for name in &lowered.variables {
                    let (kind, index) = self.graph.find_variable(name)?;
                    if kind == VariableKind::Node {
                        constrained_nodes.insert(index);
                    }
                }
                filter_expressions.push(lowered.tree);
            }
        }

        let mut projections: Vec<RenderedProjection> = Vec::new();
        let mut projection_types: Vec<Projection> = Vec::new();
        let mut unaggregated_items: Vec<usize> = Vec::new();
        let mut aggregation_required = false;

        for (item_idx, item) in query.projection.items.iter().enumerate() {
            let shape = visit::inspect_projection(&item.expr, &self.graph)?;
            let rendered = visit::render_projection(&item.expr, &self.graph)?;

            if shape.aggregate.is_some() {
                aggregation_required = true;
            } else {
                unaggregated_items.push(item_idx);
            }

            projections.push(rendered);
            projection_types.push(Projection {
                alias: item.alias.clone(),
                kind: shape.kind,
            });
        }

        if !aggregation_required {
            unaggregated_items.clear();
        }

        let mut from_tables: Vec<String> = Vec::new();
        let mut and_expressions: Vec<BoolExpr> = Vec::new();

        for (index, node) in self.graph.nodes().iter().enumerate() {
            let alias = node_alias(index);
            from_tables.push(format!("assets {alias}"));
            if !node.labels.is_empty() {
                and_expressions.push(label_constraint(&alias, &node.labels));
            }
        }

        for (index, relation) in self.graph.relations().iter().enumerate() {
            let alias = relation_alias(index);
            from_tables.push(format!("relations {alias}"));
            if !relation.labels.is_empty() {
                and_expressions.push(label_constraint(&alias, &relation.labels));
            }

            let outbound = direction_predicate(&alias, relation.left_idx, relation.right_idx);
            let inbound = direction_predicate(&alias, relation.right_idx, relation.left_idx);
            match relation.direction {
                Direction::Right => and_expressions.push(outbound),
                Direction::Left => and_expressions.push(inbound),
                Direction::Either => {
                    if self.single_direction_applies(relation, &constrained_nodes)? {
                        and_expressions.push(outbound);
                    } else {
                        and_expressions.push(BoolExpr::Or(vec![outbound, inbound]));
                    }
                }
            }
        }

        let limit = match &query.projection.limit {
            Some(expr) => visit::parse_limit(expr)?,
            None => 0,
        };
        let offset = match &query.projection.skip {
            Some(expr) => {
                if limit == 0 {
                    return Err(TranslateError::SkipWithoutLimit);
                }
                visit::parse_skip(expr)?
            }
            None => 0,
        };

        if !filter_expressions.is_empty() {
            and_expressions.push(BoolExpr::And(filter_expressions));
        }

        let sql = build_select(
            query.projection.distinct,
            &projections,
            &from_tables,
            &BoolExpr::And(and_expressions),
            &unaggregated_items,
            limit,
            offset,
        );

        Ok(SqlTranslation {
            query: sql,
            projections: projection_types,
        })
    }

    /// Whether an undirected relation may be emitted as a single outbound
    /// predicate. Safe only when it is the sole relation, neither endpoint
    /// is constrained by WHERE, and neither endpoint carries a label: the
    /// inbound disjunct would then only relabel the result rows while
    /// doubling the UNION cost.
    fn single_direction_applies(
        &self,
        relation: &QueryRelation,
        constrained_nodes: &HashSet<usize>,
    ) -> TranslateResult<bool> {
        if self.graph.relations().len() != 1 {
            return Ok(false);
        }
        if constrained_nodes.contains(&relation.left_idx)
            || constrained_nodes.contains(&relation.right_idx)
        {
            return Ok(false);
        }
        let left = self.graph.find_node(relation.left_idx)?;
        let right = self.graph.find_node(relation.right_idx)?;
        Ok(left.labels.is_empty() && right.labels.is_empty())
    }
}

/// OR of `alias.type = 'label'` leaves, one per label.
fn label_constraint(alias: &str, labels: &[String]) -> BoolExpr {
    BoolExpr::Or(
        labels
            .iter()
            .map(|label| {
                BoolExpr::Leaf(format!(
                    "{alias}.type = {}",
                    visit::quote_string(label)
                ))
            })
            .collect(),
    )
}

/// `alias.from_id = a{from}.id AND alias.to_id = a{to}.id`.
fn direction_predicate(alias: &str, from_idx: usize, to_idx: usize) -> BoolExpr {
    BoolExpr::And(vec![
        BoolExpr::Leaf(format!("{alias}.from_id = {}.id", node_alias(from_idx))),
        BoolExpr::Leaf(format!("{alias}.to_id = {}.id", node_alias(to_idx))),
    ])
}

/// Emits the final SELECT.
///
/// A single DNF conjunction becomes one plain SELECT. Multiple conjunctions
/// become parenthesized branches joined with UNION (when DISTINCT) or
/// UNION ALL; when any projection aggregates, every flattened output column
/// is named `c{k}` at the union boundary and an outer SELECT re-applies the
/// aggregates over those names, grouping by the non-aggregated ones.
fn build_select(
    distinct: bool,
    projections: &[RenderedProjection],
    from_tables: &[String],
    where_tree: &BoolExpr,
    group_by: &[usize],
    limit: u64,
    offset: u64,
) -> String {
    let conjunctions = where_tree.to_dnf();

    if conjunctions.len() <= 1 {
        let select_list: Vec<String> = projections
            .iter()
            .map(RenderedProjection::to_select_sql)
            .collect();
        let group_columns = grouped_columns(projections, group_by);
        return build_single(
            distinct,
            &select_list,
            from_tables,
            &BoolExpr::And(conjunctions),
            &group_columns,
            limit,
            offset,
        );
    }

    let aggregated = projections
        .iter()
        .any(|projection| projection.aggregate.is_some());
    let branch_list: Vec<String> = if aggregated {
        named_branch_columns(projections)
    } else {
        projections
            .iter()
            .map(RenderedProjection::to_select_sql)
            .collect()
    };

    let mut branches = Vec::with_capacity(conjunctions.len());
    for conjunction in &conjunctions {
        branches.push(format!(
            "({})",
            build_single(false, &branch_list, from_tables, conjunction, &[], 0, 0)
        ));
    }
    let separator = if distinct { "\nUNION\n" } else { "\nUNION ALL\n" };
    let mut sql = branches.join(separator);

    if aggregated {
        let outer_list = outer_select_columns(projections);
        sql = format!("SELECT {} FROM (\n{sql}\n)", outer_list.join(", "));
        let group_names = outer_group_names(projections, group_by);
        if !group_names.is_empty() {
            sql.push_str("\nGROUP BY ");
            sql.push_str(&group_names.join(", "));
        }
    }

    if limit > 0 {
        sql.push_str(&format!("\nLIMIT {limit}"));
    }
    if offset > 0 {
        sql.push_str(&format!("\nOFFSET {offset}"));
    }
    sql
}

/// Assembles one SELECT in fixed clause order.
fn build_single(
    distinct: bool,
    select_list: &[String],
    from_tables: &[String],
    where_tree: &BoolExpr,
    group_by_columns: &[String],
    limit: u64,
    offset: u64,
) -> String {
    let mut sql = String::from("SELECT ");
    if distinct {
        sql.push_str("DISTINCT ");
    }
    sql.push_str(&select_list.join(", "));
    sql.push_str(" FROM ");
    sql.push_str(&from_tables.join(", "));

    let rendered = where_tree.render();
    if !rendered.is_empty() {
        sql.push_str("\nWHERE ");
        sql.push_str(&rendered);
    }
    if !group_by_columns.is_empty() {
        sql.push_str("\nGROUP BY ");
        sql.push_str(&group_by_columns.join(", "));
    }
    if limit > 0 {
        sql.push_str(&format!("\nLIMIT {limit}"));
    }
    if offset > 0 {
        sql.push_str(&format!("\nOFFSET {offset}"));
    }
    sql
}

/// Raw grouped column expressions for the single-SELECT path.
fn grouped_columns(projections: &[RenderedProjection], group_by: &[usize]) -> Vec<String> {
    group_by
        .iter()
        .flat_map(|&item| projections[item].columns.iter().cloned())
        .collect()
}

/// Flattened `expr AS c{k}` list for union branches feeding an aggregate
/// wrap. Aggregated items contribute their argument column unaggregated;
/// the outer SELECT folds over the recombined rows.
fn named_branch_columns(projections: &[RenderedProjection]) -> Vec<String> {
    let mut named = Vec::new();
    let mut next = 0usize;
    for projection in projections {
        for column in &projection.columns {
            named.push(format!("{column} AS c{next}"));
            next += 1;
        }
    }
    named
}

/// Outer select list over the named union columns.
fn outer_select_columns(projections: &[RenderedProjection]) -> Vec<String> {
    let mut list = Vec::new();
    let mut next = 0usize;
    for projection in projections {
        match projection.aggregate {
            Some(aggregate) => {
                list.push(format!("{}(c{next})", aggregate.sql()));
                next += 1;
            }
            None => {
                let names: Vec<String> = (0..projection.columns.len())
                    .map(|offset| format!("c{}", next + offset))
                    .collect();
                list.push(names.join(", "));
                next += projection.columns.len();
            }
        }
    }
    list
}

/// Names of the grouped (non-aggregated) columns at the union boundary.
fn outer_group_names(projections: &[RenderedProjection], group_by: &[usize]) -> Vec<String> {
    let mut offsets = Vec::with_capacity(projections.len());
    let mut next = 0usize;
    for projection in projections {
        offsets.push(next);
        next += projection.columns.len();
    }

    let mut names = Vec::new();
    for &item in group_by {
        for offset in 0..projections[item].columns.len() {
            names.push(format!("c{}", offsets[item] + offset));
        }
    }
    names
}
