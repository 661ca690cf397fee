use tertib::{
    config::Config,
    executor::predicate::{Predicate, SqlTerm},
    storage::{database::Database, store::MemoryStore},
    types::{error::DatabaseError, tuple::Tuple, value::Value},
    utils::mock::{TempDatabase, student_columns, student_record},
};

const STUDENTS: [(i64, &str, f64); 8] = [
    (4, "Z", 1.5),
    (1, "Ann", 3.2),
    (7, "Bob", 2.1),
    (2, "Z", 3.7),
    (9, "Cid", 3.0),
    (3, "Dee", 2.9),
    (6, "Eli", 0.5),
    (5, "Z", 2.2),
];

fn students_db() -> Result<Database<MemoryStore>, DatabaseError> {
    let config = Config::builder().max_rows_per_page(3).build()?;
    let mut db = Database::in_memory(config)?;
    db.create_table("students", "id", student_columns())?;
    for (id, name, gpa) in STUDENTS {
        db.insert_into_table("students", student_record(id, name, gpa))?;
    }
    Ok(db)
}

fn ids(rows: &[Tuple]) -> Vec<i64> {
    rows.iter()
        .filter_map(|t| match t.cluster_key_value() {
            Value::Integer(id) => Some(*id),
            _ => None,
        })
        .collect()
}

fn gpa_or_z() -> Result<Vec<SqlTerm>, DatabaseError> {
    Ok(vec![
        SqlTerm::parse("students", "gpa", ">=", 3.0)?,
        SqlTerm::parse("students", "name", "=", "Z")?,
    ])
}

#[test]
fn test_or_select_unions_both_terms() -> Result<(), DatabaseError> {
    let db = students_db()?;
    let rows = db.select_from_table("students", gpa_or_z()?, &["OR"])?;
    // Results come back in clustering order.
    assert_eq!(ids(&rows), vec![1, 2, 4, 5, 9]);
    Ok(())
}

#[test]
fn test_and_and_xor_select() -> Result<(), DatabaseError> {
    let db = students_db()?;
    let both = db.select_from_table("students", gpa_or_z()?, &["AND"])?;
    assert_eq!(ids(&both), vec![2]);
    let either = db.select_from_table("students", gpa_or_z()?, &["xor"])?;
    assert_eq!(ids(&either), vec![1, 4, 5, 9]);
    Ok(())
}

#[test]
fn test_select_with_combined_index_matches_full_scan() -> Result<(), DatabaseError> {
    let mut db = students_db()?;
    let full = db.select_from_table("students", gpa_or_z()?, &["OR"])?;

    db.create_index("students", "gpa_name_idx", &["gpa", "name"])?;
    db.create_index("students", "name_gpa_idx", &["name", "gpa"])?;
    let table = db.table("students")?;
    let columns = vec!["gpa".to_string(), "name".to_string()];
    assert_eq!(table.get_relevant_indices(&columns).len(), 2);

    let indexed = db.select_from_table("students", gpa_or_z()?, &["OR"])?;
    assert_eq!(indexed, full);
    Ok(())
}

#[test]
fn test_signed_zero_equality_matches_full_scan() -> Result<(), DatabaseError> {
    let config = Config::builder().max_rows_per_page(2).build()?;
    let mut db = Database::in_memory(config)?;
    db.create_table("students", "id", student_columns())?;
    for (id, gpa) in [(1, 0.0), (2, 1.0), (3, 2.0), (4, 3.0)] {
        db.insert_into_table("students", student_record(id, "Ann", gpa))?;
    }
    db.create_index("students", "a", &["gpa"])?;
    db.create_index("students", "b", &["gpa", "name"])?;
    let table = db.table("students")?;

    for (op, value, expected) in [("=", -0.0, vec![]), ("=", 0.0, vec![1]), ("!=", -0.0, vec![1, 2, 3, 4])] {
        let terms = vec![SqlTerm::parse("students", "gpa", op, value)?];
        let full = table.select_tuples(db.store(), &Predicate::parse(terms.clone(), &[])?)?;
        let indexed = db.select_from_table("students", terms, &[])?;
        assert_eq!(ids(&indexed), expected, "gpa {op} {value:?}");
        assert_eq!(indexed, full, "gpa {op} {value:?}");
    }
    Ok(())
}

#[test]
fn test_select_range_on_clustering_key_reads_fewer_pages() -> Result<(), DatabaseError> {
    let mut db = students_db()?;
    db.create_index("students", "id_a", &["id"])?;
    db.create_index("students", "id_b", &["id", "gpa"])?;
    let terms = vec![SqlTerm::parse("students", "id", "<=", 2)?];

    db.store().stats.reset();
    let rows = db.select_from_table("students", terms, &[])?;
    assert_eq!(ids(&rows), vec![1, 2]);
    assert_eq!(db.store().stats.page_reads(), 1);
    Ok(())
}

#[test]
fn test_select_on_file_store() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_page_capacity("select", 2)?;
    let db = temp_db.database()?;
    db.create_table("students", "id", student_columns())?;
    for (id, name, gpa) in STUDENTS {
        db.insert_into_table("students", student_record(id, name, gpa))?;
    }
    let rows = db.select_from_table("students", gpa_or_z()?, &["OR"])?;
    assert_eq!(ids(&rows), vec![1, 2, 4, 5, 9]);

    let missing = vec![SqlTerm::parse("students", "age", ">", 1)?];
    assert!(matches!(
        db.select_from_table("students", missing, &[]),
        Err(DatabaseError::ColumnNotFound { .. })
    ));
    Ok(())
}
