//! Boolean combination tree over rendered SQL fragments.
//!
//! WHERE filters, label constraints, and direction predicates are collected
//! into this tree before emission. [`BoolExpr::render`] produces a single
//! WHERE body; [`BoolExpr::to_dnf`] rewrites the tree into a disjunction of
//! conjunctions so the SQL builder can emit each conjunction as its own
//! UNION branch against the type-indexed tables.

/// Boolean tree node. Leaves carry already-rendered SQL fragments.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BoolExpr {
    Leaf(String),
    And(Vec<BoolExpr>),
    Or(Vec<BoolExpr>),
}

impl BoolExpr {
    pub fn leaf(expr: impl Into<String>) -> Self {
        BoolExpr::Leaf(expr.into())
    }

    /// Renders the tree to a SQL boolean expression.
    ///
    /// Children rendering to the empty string are treated as absent. Two or
    /// more surviving children are joined and parenthesized; a single child
    /// renders bare; no children render as the empty string.
    pub fn render(&self) -> String {
        match self {
            BoolExpr::Leaf(expr) => expr.clone(),
            BoolExpr::And(children) => join_children(children, " AND "),
            BoolExpr::Or(children) => join_children(children, " OR "),
        }
    }

    /// Rewrites the tree into disjunctive normal form.
    ///
    /// Returns conjunctions whose OR is logically equivalent to the input;
    /// each entry is `And` over leaves. Empty sub-trees are skipped during
    /// the fold so the expansion agrees with `render`'s absent-is-ignored
    /// semantics. Worst case is exponential in OR nodes nested under AND,
    /// which filter trees keep shallow in practice; no deduplication is
    /// attempted.
    pub fn to_dnf(&self) -> Vec<BoolExpr> {
        match self {
            BoolExpr::Leaf(_) => vec![BoolExpr::And(vec![self.clone()])],
            BoolExpr::Or(children) => children.iter().flat_map(Self::to_dnf).collect(),
            BoolExpr::And(children) => {
                let mut conjunctions: Vec<BoolExpr> = Vec::new();
                for child in children {
                    let expanded = child.to_dnf();
                    if expanded.is_empty() {
                        continue;
                    }
                    if conjunctions.is_empty() {
                        conjunctions = expanded;
                    } else {
                        conjunctions = cross_product(&conjunctions, &expanded);
                    }
                }
                conjunctions
            }
        }
    }
}

fn join_children(children: &[BoolExpr], separator: &str) -> String {
    let rendered: Vec<String> = children
        .iter()
        .map(BoolExpr::render)
        .filter(|fragment| !fragment.is_empty())
        .collect();
    if rendered.len() > 1 {
        format!("({})", rendered.join(separator))
    } else {
        rendered.join(separator)
    }
}

/// Pairwise AND-combination of two conjunction lists.
///
/// Every pairing concatenates the two conjunctions' leaves into one flat
/// `And`, which keeps repeated expansion from nesting.
pub fn cross_product(left: &[BoolExpr], right: &[BoolExpr]) -> Vec<BoolExpr> {
    let mut combined = Vec::with_capacity(left.len() * right.len());
    for lhs in left {
        for rhs in right {
            let mut children = conjunction_children(lhs);
            children.extend(conjunction_children(rhs));
            combined.push(BoolExpr::And(children));
        }
    }
    combined
}

fn conjunction_children(conjunction: &BoolExpr) -> Vec<BoolExpr> {
    match conjunction {
        BoolExpr::And(children) => children.clone(),
        other => vec![other.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> BoolExpr {
        BoolExpr::leaf(name)
    }

    #[test]
    fn render_leaf_is_identity() {
        assert_eq!(leaf("a = 1").render(), "a = 1");
    }

    #[test]
    fn render_joins_and_wraps_multiple_children() {
        let tree = BoolExpr::And(vec![leaf("a = 1"), leaf("b = 2")]);
        assert_eq!(tree.render(), "(a = 1 AND b = 2)");

        let tree = BoolExpr::Or(vec![leaf("a = 1"), leaf("b = 2"), leaf("c = 3")]);
        assert_eq!(tree.render(), "(a = 1 OR b = 2 OR c = 3)");
    }

    #[test]
    fn render_single_child_has_no_parentheses() {
        let tree = BoolExpr::And(vec![leaf("a = 1")]);
        assert_eq!(tree.render(), "a = 1");
    }

    #[test]
    fn render_empty_children_are_absent() {
        assert_eq!(BoolExpr::And(vec![]).render(), "");
        let tree = BoolExpr::And(vec![BoolExpr::Or(vec![]), leaf("a = 1")]);
        assert_eq!(tree.render(), "a = 1");
    }

    #[test]
    fn dnf_of_leaf_is_single_conjunction() {
        let conjunctions = leaf("a = 1").to_dnf();
        assert_eq!(conjunctions, vec![BoolExpr::And(vec![leaf("a = 1")])]);
    }

    #[test]
    fn dnf_distributes_and_over_or() {
        // a AND (b OR c) => (a AND b) OR (a AND c)
        let tree = BoolExpr::And(vec![
            leaf("a"),
            BoolExpr::Or(vec![leaf("b"), leaf("c")]),
        ]);
        let conjunctions = tree.to_dnf();
        assert_eq!(
            conjunctions,
            vec![
                BoolExpr::And(vec![leaf("a"), leaf("b")]),
                BoolExpr::And(vec![leaf("a"), leaf("c")]),
            ]
        );
    }

    #[test]
    fn dnf_cross_product_multiplies_disjunctions() {
        // (a OR b) AND (c OR d) => 4 conjunctions
        let tree = BoolExpr::And(vec![
            BoolExpr::Or(vec![leaf("a"), leaf("b")]),
            BoolExpr::Or(vec![leaf("c"), leaf("d")]),
        ]);
        let conjunctions = tree.to_dnf();
        assert_eq!(conjunctions.len(), 4);
        assert_eq!(conjunctions[0], BoolExpr::And(vec![leaf("a"), leaf("c")]));
        assert_eq!(conjunctions[3], BoolExpr::And(vec![leaf("b"), leaf("d")]));
    }

    #[test]
    fn dnf_skips_empty_subtrees() {
        let tree = BoolExpr::And(vec![leaf("a"), BoolExpr::Or(vec![])]);
        assert_eq!(tree.to_dnf(), vec![BoolExpr::And(vec![leaf("a")])]);

        assert!(BoolExpr::And(vec![]).to_dnf().is_empty());
        assert!(BoolExpr::Or(vec![]).to_dnf().is_empty());
    }

    #[test]
    fn dnf_flattens_nested_conjunctions() {
        // (a AND b) AND (c OR d) => conjunctions with three flat leaves each
        let tree = BoolExpr::And(vec![
            BoolExpr::And(vec![leaf("a"), leaf("b")]),
            BoolExpr::Or(vec![leaf("c"), leaf("d")]),
        ]);
        let conjunctions = tree.to_dnf();
        assert_eq!(
            conjunctions[0],
            BoolExpr::And(vec![leaf("a"), leaf("b"), leaf("c")])
        );
        assert_eq!(
            conjunctions[1],
            BoolExpr::And(vec![leaf("a"), leaf("b"), leaf("d")])
        );
    }
}
