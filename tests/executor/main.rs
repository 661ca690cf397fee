mod predicate_test;
mod select_test;
