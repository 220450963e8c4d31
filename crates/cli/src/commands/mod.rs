pub mod deps;
pub mod lint;
