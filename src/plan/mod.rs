pub mod value_expr;
pub use value_expr::*;

pub mod query_expr;
pub use query_expr::*;
