use tertib::types::{
    error::DatabaseError,
    tuple::{Record, Tuple},
    value::Value,
};

fn record(id: i64, name: &str) -> Record {
    Record::from([
        ("id".to_string(), Value::Integer(id)),
        ("name".to_string(), Value::Text(name.to_string())),
    ])
}

#[test]
fn test_tuple_requires_its_clustering_column() {
    assert!(Tuple::new("id", record(1, "a")).is_ok());
    assert!(matches!(
        Tuple::new("email", record(1, "a")),
        Err(DatabaseError::SchemaError { .. })
    ));
}

#[test]
fn test_tuple_key_is_immutable() -> Result<(), DatabaseError> {
    let mut tuple = Tuple::new("id", record(1, "a"))?;
    tuple.set_value("name", Value::Text("b".into()))?;
    assert_eq!(tuple.get_value("name"), Some(&Value::Text("b".into())));

    assert!(tuple.set_value("id", Value::Integer(2)).is_err());
    assert!(matches!(
        tuple.set_value("age", Value::Integer(2)),
        Err(DatabaseError::ColumnNotFound { .. })
    ));
    assert_eq!(tuple.cluster_key_value(), &Value::Integer(1));
    Ok(())
}

#[test]
fn test_tuple_matches_all_criteria() -> Result<(), DatabaseError> {
    let tuple = Tuple::new("id", record(3, "c"))?;
    assert!(tuple.matches_all(&Record::new()));
    assert!(tuple.matches_all(&record(3, "c")));
    assert!(!tuple.matches_all(&record(3, "d")));

    let unknown = Record::from([("age".to_string(), Value::Integer(3))]);
    assert!(!tuple.matches_all(&unknown));
    Ok(())
}
