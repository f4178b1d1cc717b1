use crate::{model::PaginationExpression, plan::QueryExpr};

/// Translates pagination into offset and limit operators.
///
/// A zero offset is omitted. A limit is emitted whenever one is present,
/// including zero.
pub struct SkipTakeClauseBuilder;

impl SkipTakeClauseBuilder {
    pub fn apply_skip_take(source: QueryExpr, pagination: &PaginationExpression) -> QueryExpr {
        let mut expr = source;
        if pagination.skip > 0 {
            expr = QueryExpr::Skip { input: Box::new(expr), count: pagination.skip };
        }
        if let Some(take) = pagination.take {
            expr = QueryExpr::Take { input: Box::new(expr), count: take };
        }
        expr
    }
}
