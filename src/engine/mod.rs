pub mod engine_error;
pub use engine_error::*;

pub mod memory_store;
pub use memory_store::*;

pub mod helpers;
pub use helpers::*;

pub mod evaluator;
pub use evaluator::*;

pub mod plan_executor;
pub use plan_executor::*;

pub mod materializer;
pub use materializer::*;

pub mod in_memory_engine;
pub use in_memory_engine::*;
