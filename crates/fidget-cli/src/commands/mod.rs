pub mod analyze;
pub mod collect;
