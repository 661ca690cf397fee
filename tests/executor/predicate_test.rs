use tertib::{
    executor::predicate::{ComparisonOp, LogicalOp, Predicate, SqlTerm},
    types::{error::DatabaseError, tuple::Tuple, value::Value},
    utils::mock::student_record,
};

#[test]
fn test_operator_parsing() -> Result<(), DatabaseError> {
    for (symbol, op) in [
        ("=", ComparisonOp::Equal),
        ("!=", ComparisonOp::NotEqual),
        ("<", ComparisonOp::LessThan),
        ("<=", ComparisonOp::LessThanOrEqual),
        (">", ComparisonOp::GreaterThan),
        (">=", ComparisonOp::GreaterThanOrEqual),
    ] {
        assert_eq!(symbol.parse::<ComparisonOp>()?, op);
        assert_eq!(op.to_string(), symbol);
    }
    assert_eq!("Or".parse::<LogicalOp>()?, LogicalOp::Or);
    assert!("<>".parse::<ComparisonOp>().is_err());
    Ok(())
}

#[test]
fn test_all_equal_predicate() -> Result<(), DatabaseError> {
    let tuple = Tuple::new("id", student_record(3, "Cy", 2.5))?;
    let criteria = student_record(3, "Cy", 2.5);
    assert!(Predicate::all_equal("students", &criteria)?.evaluate(&tuple)?);

    let other = student_record(3, "Cy", 2.6);
    assert!(!Predicate::all_equal("students", &other)?.evaluate(&tuple)?);
    Ok(())
}

#[test]
fn test_comparisons_across_types_never_match() -> Result<(), DatabaseError> {
    let tuple = Tuple::new("id", student_record(3, "Cy", 2.5))?;
    let term = SqlTerm::new("students", "id", ComparisonOp::LessThan, Value::Real(10.0));
    assert!(!term.evaluate(&tuple)?);
    let term = SqlTerm::new("students", "id", ComparisonOp::NotEqual, Value::Real(3.0));
    assert!(term.evaluate(&tuple)?);
    Ok(())
}
