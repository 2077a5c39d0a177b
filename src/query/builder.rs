//! Fluent construction of pattern queries.
//!
//! The parser that produces the IR lives outside this crate; the builder is
//! the programmatic way to assemble a [`PatternQuery`], mirroring the order
//! a query is written: MATCH patterns, WHERE filters, then the RETURN body.

use crate::query::errors::{TranslateError, TranslateResult};
use crate::query::ir::{
    Expr, Literal, MatchClause, PatternElement, PatternQuery, ProjectionBody, ProjectionItem,
};
use crate::query::translate::{SqlTranslation, SqlTranslator};

/// Fluent builder producing [`PatternQuery`] values.
///
/// Misuse (a filter before any MATCH, say) is latched and reported from
/// [`QueryBuilder::build`], so call chains stay uninterrupted.
#[derive(Debug, Default)]
pub struct QueryBuilder {
    matches: Vec<MatchClause>,
    projection: ProjectionBody,
    error: Option<TranslateError>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new MATCH clause from a pattern element.
    pub fn match_pattern(mut self, element: impl Into<PatternElement>) -> Self {
        if self.error.is_some() {
            return self;
        }
        self.matches.push(MatchClause {
            elements: vec![element.into()],
            where_clause: None,
        });
        self
    }

    /// Adds another comma-separated pattern element to the current MATCH.
    pub fn and_pattern(mut self, element: impl Into<PatternElement>) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.matches.last_mut() {
            Some(clause) => clause.elements.push(element.into()),
            None => self.fail("and_pattern requires a preceding match_pattern"),
        }
        self
    }

    /// ANDs a filter onto the current MATCH clause.
    pub fn where_expr(mut self, expr: Expr) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.matches.last_mut() {
            Some(clause) => {
                clause.where_clause = Some(match clause.where_clause.take() {
                    Some(existing) => Expr::And(vec![existing, expr]),
                    None => expr,
                });
            }
            None => self.fail("where_expr requires a preceding match_pattern"),
        }
        self
    }

    /// Projects plain variables in order.
    pub fn returning<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for variable in variables {
            self.projection.items.push(ProjectionItem {
                expr: Expr::Variable(variable.into()),
                alias: None,
            });
        }
        self
    }

    /// Projects an arbitrary expression.
    pub fn returning_expr(mut self, expr: Expr) -> Self {
        self.projection.items.push(ProjectionItem { expr, alias: None });
        self
    }

    /// Projects an expression under an alias.
    pub fn returning_as(mut self, expr: Expr, alias: impl Into<String>) -> Self {
        self.projection.items.push(ProjectionItem {
            expr,
            alias: Some(alias.into()),
        });
        self
    }

    /// Marks the projection DISTINCT.
    pub fn distinct(mut self) -> Self {
        self.projection.distinct = true;
        self
    }

    pub fn limit(mut self, count: i64) -> Self {
        self.projection.limit = Some(Expr::Literal(Literal::Int(count)));
        self
    }

    pub fn skip(mut self, count: i64) -> Self {
        self.projection.skip = Some(Expr::Literal(Literal::Int(count)));
        self
    }

    /// Finishes the builder.
    pub fn build(self) -> TranslateResult<PatternQuery> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(PatternQuery {
            matches: self.matches,
            projection: self.projection,
        })
    }

    /// Builds the query and immediately translates it.
    pub fn translate(self) -> TranslateResult<SqlTranslation> {
        let query = self.build()?;
        SqlTranslator::new().translate(&query)
    }

    fn fail(&mut self, message: &'static str) {
        if self.error.is_none() {
            self.error = Some(TranslateError::UnsupportedExpression(message.to_owned()));
        }
    }
}
