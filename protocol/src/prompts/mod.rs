pub mod context;
pub mod ide;
