use std::collections::{BTreeMap, BTreeSet};

use tertib::{
    executor::predicate::{Predicate, SqlTerm},
    storage::{
        index::{Index, combine_indices},
        store::MemoryStore,
        table::Table,
    },
    types::{
        error::DatabaseError,
        tuple::{Record, Tuple},
        value::Value,
    },
};

const NAMES: [&str; 6] = ["Ada", "Bo", "Cy", "Di", "Ed", "Z"];

fn student(id: i64) -> Tuple {
    let record = Record::from([
        ("id".to_string(), Value::Integer(id)),
        ("name".to_string(), Value::Text(NAMES[(id as usize / 5) % NAMES.len()].to_string())),
    ]);
    Tuple::new("id", record).unwrap()
}

fn range_index(name: &str, column: &str, lo: Value, hi: Value) -> Result<Index, DatabaseError> {
    Index::new(
        name,
        vec![column.to_string()],
        BTreeMap::from([(column.to_string(), lo)]),
        BTreeMap::from([(column.to_string(), hi)]),
    )
}

fn indexed_table() -> Result<(Table, MemoryStore), DatabaseError> {
    let mut store = MemoryStore::new();
    let mut table = Table::new("students", "id", 5);
    for id in 0..30 {
        table.insert_tuple(&mut store, student(id))?;
    }
    table.create_index(
        &store,
        range_index("id_idx", "id", Value::Integer(0), Value::Integer(1000))?,
    )?;
    table.create_index(
        &store,
        range_index("name_idx", "name", Value::Text("A".into()), Value::Text("zz".into()))?,
    )?;
    Ok((table, store))
}

#[test]
fn test_combined_index_covers_both_columns() -> Result<(), DatabaseError> {
    let (table, _) = indexed_table()?;
    let columns = vec!["id".to_string(), "name".to_string()];
    assert!(table.get_relevant_indices(&columns).is_empty());

    let sources: Vec<&Index> = table.indices().iter().collect();
    let combined = combine_indices(&sources).expect("two sources combine");
    assert_eq!(combined.column_set(), BTreeSet::from(["id", "name"]));
    assert!(combined.covers_columns(&columns));
    assert_eq!(combined.page_count(), table.page_count());
    Ok(())
}

#[test]
fn test_combined_index_selection_matches_full_scan() -> Result<(), DatabaseError> {
    let (table, store) = indexed_table()?;
    let sources: Vec<&Index> = table.indices().iter().collect();
    let combined = combine_indices(&sources).expect("two sources combine");

    let predicates = [
        Predicate::parse(
            vec![
                SqlTerm::parse("students", "id", ">=", 12)?,
                SqlTerm::parse("students", "name", "=", "Di")?,
            ],
            &["AND"],
        )?,
        Predicate::parse(
            vec![
                SqlTerm::parse("students", "id", "<", 3)?,
                SqlTerm::parse("students", "name", "=", "Z")?,
            ],
            &["OR"],
        )?,
        Predicate::parse(
            vec![
                SqlTerm::parse("students", "id", "!=", 7)?,
                SqlTerm::parse("students", "name", ">", "Bo")?,
            ],
            &["XOR"],
        )?,
    ];
    for predicate in &predicates {
        let indexed = table.select_tuples_using_index(&store, &combined, predicate)?;
        let scanned = table.select_tuples(&store, predicate)?;
        assert_eq!(indexed, scanned);
    }
    Ok(())
}

#[test]
fn test_index_prunes_pages() -> Result<(), DatabaseError> {
    let (table, store) = indexed_table()?;
    let predicate = Predicate::parse(
        vec![
            SqlTerm::parse("students", "id", ">=", 12)?,
            SqlTerm::parse("students", "name", "=", "Di")?,
        ],
        &["AND"],
    )?;

    store.stats.reset();
    let rows = table.select_tuples_with_index(&store, &predicate)?;
    let pruned_reads = store.stats.page_reads();

    store.stats.reset();
    assert_eq!(table.select_tuples(&store, &predicate)?, rows);
    let full_reads = store.stats.page_reads();

    // Only two single-column indices exist, neither covering both columns,
    // so the indexed path falls back to a full scan.
    assert_eq!(pruned_reads, full_reads);
    assert_eq!(rows.len(), 5);

    let sources: Vec<&Index> = table.indices().iter().collect();
    let combined = combine_indices(&sources).expect("two sources combine");
    store.stats.reset();
    table.select_tuples_using_index(&store, &combined, &predicate)?;
    assert_eq!(store.stats.page_reads(), 1);
    Ok(())
}

#[test]
fn test_index_tracks_rebalanced_pages() -> Result<(), DatabaseError> {
    let (mut table, mut store) = indexed_table()?;
    let criteria = Record::from([("name".to_string(), Value::Text("Ada".into()))]);
    assert_eq!(table.delete_tuples(&mut store, &criteria)?, 5);

    let index = table.get_index("id_idx").expect("index exists");
    assert_eq!(index.page_count(), table.page_count());
    assert_eq!(
        index.page_bounds(0).map(|b| b["id"].clone()),
        Some((Value::Integer(5), Value::Integer(9)))
    );
    Ok(())
}

#[test]
fn test_out_of_range_pages_are_never_pruned() -> Result<(), DatabaseError> {
    let mut store = MemoryStore::new();
    let mut table = Table::new("students", "id", 5);
    for id in 0..30 {
        table.insert_tuple(&mut store, student(id))?;
    }
    // Declared ranges deliberately narrower than the data.
    table.create_index(&store, range_index("a", "id", Value::Integer(0), Value::Integer(9))?)?;
    table.create_index(&store, range_index("b", "id", Value::Integer(0), Value::Integer(14))?)?;

    let predicate = Predicate::new(vec![SqlTerm::parse("students", "id", ">", 25)?], vec![])?;
    let rows = table.select_tuples_with_index(&store, &predicate)?;
    assert_eq!(rows, table.select_tuples(&store, &predicate)?);
    assert_eq!(rows.len(), 4);
    Ok(())
}
