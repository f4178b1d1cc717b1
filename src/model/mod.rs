pub mod literal;
pub use literal::*;

pub mod field_chain;
pub use field_chain::*;

pub mod include_expression;
pub use include_expression::*;

pub mod include_chain_converter;
pub use include_chain_converter::*;

pub mod filter_expression;
pub use filter_expression::*;

pub mod sort_expression;
pub use sort_expression::*;

pub mod pagination_expression;
pub use pagination_expression::*;

pub mod query_layer;
pub use query_layer::*;
