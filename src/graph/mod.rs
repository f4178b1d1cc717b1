pub mod value_type;
pub use value_type::*;

pub mod resource_field;
pub use resource_field::*;

pub mod resource_type;
pub use resource_type::*;

pub mod resource_graph;
pub use resource_graph::*;
