use chrono::NaiveDate;
use tertib::types::{
    error::{DatabaseError, ErrorKind},
    value::{DataType, Value},
};

#[test]
fn test_data_type_parsing() -> Result<(), DatabaseError> {
    assert_eq!(DataType::from_string("INTEGER")?, DataType::Integer);
    assert_eq!(DataType::from_string("java.lang.String")?, DataType::Text);
    assert_eq!(DataType::from_string("java.lang.Double")?, DataType::Real);
    assert_eq!("date".parse::<DataType>()?, DataType::Date);

    let err = DataType::from_string("blob").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
    Ok(())
}

#[test]
fn test_value_parse_by_type() -> Result<(), DatabaseError> {
    assert_eq!(Value::parse("42", DataType::Integer)?, Value::Integer(42));
    assert_eq!(Value::parse(" 3.5 ", DataType::Real)?, Value::Real(3.5));
    assert_eq!(
        Value::parse("2024-02-29", DataType::Date)?,
        Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
    );
    assert!(Value::parse("forty", DataType::Integer).is_err());
    assert!(Value::parse("2023-02-29", DataType::Date).is_err());
    Ok(())
}

#[test]
fn test_value_ordering_within_one_type() {
    assert!(Value::Integer(5) < Value::Integer(10));
    assert!(Value::Real(-1.5) < Value::Real(0.0));
    assert!(Value::Text("apple".into()) < Value::Text("banana".into()));
    assert!(
        Value::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())
            < Value::Date(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap())
    );
}

#[test]
fn test_values_of_different_types_are_incomparable() {
    assert_eq!(Value::Integer(5).compare(&Value::Real(5.0)), None);
    assert!(!(Value::Integer(5) < Value::Text("6".into())));
    assert!(!(Value::Integer(5) > Value::Text("6".into())));
    assert_ne!(Value::Integer(1), Value::Real(1.0));
}

#[test]
fn test_value_display_round_trips_through_parse() -> Result<(), DatabaseError> {
    let date = Value::Date(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap());
    assert_eq!(date.to_string(), "1999-12-31");
    assert_eq!(Value::parse(&date.to_string(), DataType::Date)?, date);
    assert_eq!(Value::Integer(-7).to_string(), "-7");
    Ok(())
}
