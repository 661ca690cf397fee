pub mod predicate;
pub mod scan;
