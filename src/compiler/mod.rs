pub mod compile_error;
pub use compile_error::*;

pub mod config;
pub use config::*;

pub mod scope;
pub use scope::*;

pub mod context;
pub use context::*;

pub mod field_resolver;
pub use field_resolver::*;

pub mod include_clause_builder;
pub use include_clause_builder::*;

pub mod where_clause_builder;
pub use where_clause_builder::*;

pub mod order_clause_builder;
pub use order_clause_builder::*;

pub mod skip_take_clause_builder;
pub use skip_take_clause_builder::*;

pub mod select_clause_builder;
pub use select_clause_builder::*;

pub mod queryable_builder;
pub use queryable_builder::*;
