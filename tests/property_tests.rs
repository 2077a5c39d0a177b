use proptest::prelude::*;

use lattice::query::expr::BoolExpr;
use lattice::query::{Expr, NodePattern, PatternElement, QueryBuilder, RelationPattern};

const LEAF_COUNT: usize = 6;

fn arb_tree() -> impl Strategy<Value = BoolExpr> {
    let leaf = (0..LEAF_COUNT).prop_map(|index| BoolExpr::Leaf(format!("p{index}")));
    leaf.prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(BoolExpr::And),
            prop::collection::vec(inner, 0..4).prop_map(BoolExpr::Or),
        ]
    })
}

/// Evaluates a tree under a truth assignment for leaves `p0..p5`.
///
/// Empty composites evaluate to `None` and are ignored by their parent,
/// mirroring how rendering drops children that render to the empty string.
fn eval(tree: &BoolExpr, truth: &[bool; LEAF_COUNT]) -> Option<bool> {
    match tree {
        BoolExpr::Leaf(name) => {
            let index: usize = name[1..].parse().expect("test leaves are p{index}");
            Some(truth[index])
        }
        BoolExpr::And(children) => children
            .iter()
            .filter_map(|child| eval(child, truth))
            .reduce(|lhs, rhs| lhs && rhs),
        BoolExpr::Or(children) => children
            .iter()
            .filter_map(|child| eval(child, truth))
            .reduce(|lhs, rhs| lhs || rhs),
    }
}

fn all_assignments() -> impl Iterator<Item = [bool; LEAF_COUNT]> {
    (0u32..1 << LEAF_COUNT).map(|bits| {
        let mut truth = [false; LEAF_COUNT];
        for (index, slot) in truth.iter_mut().enumerate() {
            *slot = bits & (1 << index) != 0;
        }
        truth
    })
}

proptest! {
    #[test]
    fn prop_dnf_preserves_logical_equivalence(tree in arb_tree()) {
        let disjunction = BoolExpr::Or(tree.to_dnf());
        for truth in all_assignments() {
            prop_assert_eq!(eval(&tree, &truth), eval(&disjunction, &truth));
        }
    }

    #[test]
    fn prop_dnf_is_idempotent(tree in arb_tree()) {
        let first = tree.to_dnf();
        let second = BoolExpr::Or(first.clone()).to_dnf();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_dnf_conjunctions_are_flat(tree in arb_tree()) {
        for conjunction in tree.to_dnf() {
            match conjunction {
                BoolExpr::And(children) => {
                    prop_assert!(!children.is_empty());
                    prop_assert!(children
                        .iter()
                        .all(|child| matches!(child, BoolExpr::Leaf(_))));
                }
                other => prop_assert!(false, "conjunction is not an And: {other:?}"),
            }
        }
    }

    #[test]
    fn prop_translation_is_a_pure_function_of_the_pattern(
        node_label in "[A-Z][a-z]{1,8}",
        edge_label in "[A-Z]{2,8}",
        value in "[a-z0-9.-]{1,12}",
    ) {
        let build = || {
            QueryBuilder::new()
                .match_pattern(
                    PatternElement::start(NodePattern::var("a").label(node_label.clone()))
                        .hop(
                            RelationPattern::any().label(edge_label.clone()).right(),
                            NodePattern::var("b"),
                        ),
                )
                .where_expr(Expr::property("a", "value").eq(value.as_str()))
                .returning(["a", "b"])
                .translate()
                .expect("translation should succeed")
        };
        prop_assert_eq!(build(), build());
    }

    #[test]
    fn prop_group_by_lists_exactly_the_unaggregated_columns(
        label in "[A-Z][a-z]{1,8}",
        properties in prop::collection::vec(
            prop::sample::select(vec!["id", "value", "type"]),
            1..4,
        ),
        aggregate in any::<bool>(),
    ) {
        let mut builder = QueryBuilder::new()
            .match_pattern(NodePattern::var("n").label(label.clone()));
        for property in &properties {
            builder = builder.returning_expr(Expr::property("n", *property));
        }
        if aggregate {
            builder = builder.returning_expr(Expr::count(Expr::var("n")));
        }
        let translation = builder.translate().expect("translation should succeed");

        if aggregate {
            let expected: Vec<String> = properties
                .iter()
                .map(|property| format!("a0.{property}"))
                .collect();
            let clause = format!("\nGROUP BY {}", expected.join(", "));
            prop_assert!(translation.query.ends_with(&clause));
        } else {
            prop_assert!(!translation.query.contains("GROUP BY"));
        }
    }

    #[test]
    fn prop_constrained_undirected_relations_emit_both_directions(
        label in "[A-Z][a-z]{1,8}",
        label_on_left in any::<bool>(),
    ) {
        let (left, right) = if label_on_left {
            (NodePattern::var("a").label(label.clone()), NodePattern::var("b"))
        } else {
            (NodePattern::var("a"), NodePattern::var("b").label(label.clone()))
        };
        let translation = QueryBuilder::new()
            .match_pattern(PatternElement::start(left).hop(RelationPattern::var("r"), right))
            .returning(["a", "b"])
            .translate()
            .expect("translation should succeed");

        prop_assert!(translation
            .query
            .contains("r0.from_id = a0.id AND r0.to_id = a1.id"));
        prop_assert!(translation
            .query
            .contains("r0.from_id = a1.id AND r0.to_id = a0.id"));
    }

    #[test]
    fn prop_unconstrained_undirected_relations_emit_one_direction(
        var_a in "[a-z]{1,4}",
        var_b in "[A-Z]{1,4}",
    ) {
        let translation = QueryBuilder::new()
            .match_pattern(
                PatternElement::start(NodePattern::var(var_a.clone()))
                    .hop(RelationPattern::any(), NodePattern::var(var_b.clone())),
            )
            .returning([var_a.clone(), var_b.clone()])
            .translate()
            .expect("translation should succeed");

        prop_assert!(translation
            .query
            .contains("r0.from_id = a0.id AND r0.to_id = a1.id"));
        prop_assert!(!translation
            .query
            .contains("r0.from_id = a1.id AND r0.to_id = a0.id"));
    }
}
