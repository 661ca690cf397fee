use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use tertib::{
    executor::scan::{ScanIterator, Scanner},
    storage::{store::MemoryStore, table::Table},
    types::{
        error::DatabaseError,
        tuple::{Record, Tuple},
        value::Value,
    },
};

fn tuple(id: i64) -> Tuple {
    let record = Record::from([
        ("id".to_string(), Value::Integer(id)),
        ("bucket".to_string(), Value::Integer(id % 4)),
    ]);
    Tuple::new("id", record).unwrap()
}

fn by_id(id: i64) -> Record {
    Record::from([("id".to_string(), Value::Integer(id))])
}

fn scanned_keys(table: &Table, store: &MemoryStore) -> Result<Vec<i64>, DatabaseError> {
    ScanIterator::new(table.scanner(store))
        .map(|tuple| {
            tuple.map(|t| match t.cluster_key_value() {
                Value::Integer(id) => *id,
                other => panic!("unexpected key {other}"),
            })
        })
        .collect()
}

fn build(capacity: usize, ids: &[i64]) -> Result<(Table, MemoryStore), DatabaseError> {
    let mut store = MemoryStore::new();
    let mut table = Table::new("t", "id", capacity);
    for id in ids {
        table.insert_tuple(&mut store, tuple(*id))?;
        table.verify_layout(&store)?;
    }
    Ok((table, store))
}

#[test]
fn test_insert_scenario_fills_three_pages() -> Result<(), DatabaseError> {
    let (table, store) = build(3, &[5, 1, 3, 8, 2, 9, 4])?;
    assert_eq!(scanned_keys(&table, &store)?, vec![1, 2, 3, 4, 5, 8, 9]);
    assert_eq!(table.page_count(), 3);
    assert_eq!(table.size(), 7);
    assert!(table.page_references().iter().all(|r| r.size <= 3));
    Ok(())
}

#[test]
fn test_delete_scenario_keeps_pages_dense() -> Result<(), DatabaseError> {
    let (mut table, mut store) = build(3, &[5, 1, 3, 8, 2, 9, 4])?;
    assert_eq!(table.delete_tuples(&mut store, &by_id(5))?, 1);

    assert_eq!(scanned_keys(&table, &store)?, vec![1, 2, 3, 4, 8, 9]);
    assert_eq!(table.size(), 6);
    assert_eq!(table.page_count(), 2);
    assert!(table.page_references().iter().all(|r| !r.is_empty()));
    assert_eq!(store.stored_page_count("t"), 2);
    table.verify_layout(&store)?;
    Ok(())
}

#[test]
fn test_any_insertion_order_scans_sorted() -> Result<(), DatabaseError> {
    let mut rng = StdRng::seed_from_u64(7);
    for capacity in [1, 2, 3, 5, 8] {
        let mut ids: Vec<i64> = (0..60).collect();
        ids.shuffle(&mut rng);
        let (table, store) = build(capacity, &ids)?;
        assert_eq!(scanned_keys(&table, &store)?, (0..60).collect::<Vec<_>>());
        assert_eq!(table.page_count(), 60usize.div_ceil(capacity));
    }
    Ok(())
}

#[test]
fn test_mixed_workload_preserves_invariants() -> Result<(), DatabaseError> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut store = MemoryStore::new();
    let mut table = Table::new("t", "id", 4);
    let mut live: Vec<i64> = Vec::new();

    for _ in 0..300 {
        if live.is_empty() || rng.gen_bool(0.6) {
            let id = rng.gen_range(0..500);
            match table.insert_tuple(&mut store, tuple(id)) {
                Ok(()) => live.push(id),
                Err(DatabaseError::DuplicateKey { .. }) => assert!(live.contains(&id)),
                Err(err) => return Err(err),
            }
        } else {
            let id = live.swap_remove(rng.gen_range(0..live.len()));
            assert_eq!(table.delete_tuples(&mut store, &by_id(id))?, 1);
        }
        table.verify_layout(&store)?;
        assert_eq!(table.size(), live.len());
    }

    live.sort();
    assert_eq!(scanned_keys(&table, &store)?, live);
    Ok(())
}

#[test]
fn test_delete_by_non_key_column() -> Result<(), DatabaseError> {
    let ids: Vec<i64> = (1..=20).collect();
    let (mut table, mut store) = build(3, &ids)?;
    let bucket = Record::from([("bucket".to_string(), Value::Integer(0))]);

    assert_eq!(table.delete_tuples(&mut store, &bucket)?, 5);
    assert_eq!(table.size(), 15);
    assert_eq!(table.page_count(), 5);
    assert!(scanned_keys(&table, &store)?.iter().all(|id| id % 4 != 0));
    table.verify_layout(&store)?;
    Ok(())
}

#[test]
fn test_delete_matching_nothing_is_idempotent() -> Result<(), DatabaseError> {
    let (mut table, mut store) = build(3, &[5, 1, 3, 8, 2, 9, 4])?;
    let before = table.clone();
    store.stats.reset();

    assert_eq!(table.delete_tuples(&mut store, &by_id(6))?, 0);
    assert_eq!(table, before);
    assert_eq!(store.stats.page_writes(), 0);

    let nobody = Record::from([("bucket".to_string(), Value::Integer(9))]);
    assert_eq!(table.delete_tuples(&mut store, &nobody)?, 0);
    assert_eq!(table, before);
    Ok(())
}

#[test]
fn test_delete_everything_leaves_no_pages() -> Result<(), DatabaseError> {
    let (mut table, mut store) = build(2, &[1, 2, 3, 4, 5])?;
    assert_eq!(table.delete_tuples(&mut store, &Record::new())?, 5);
    assert_eq!(table.page_count(), 0);
    assert_eq!(store.stored_page_count("t"), 0);

    table.insert_tuple(&mut store, tuple(10))?;
    assert_eq!(scanned_keys(&table, &store)?, vec![10]);
    Ok(())
}

#[test]
fn test_update_changes_one_tuple() -> Result<(), DatabaseError> {
    let (mut table, mut store) = build(3, &[1, 2, 3, 4])?;
    let change = Record::from([("bucket".to_string(), Value::Integer(99))]);
    table.update_tuple(&mut store, &Value::Integer(4), &change)?;

    let mut scanner = table.scanner(&store);
    let tuples = scanner.scan_batch(10)?;
    let updated: Vec<_> = tuples
        .iter()
        .filter(|t| t.get_value("bucket") == Some(&Value::Integer(99)))
        .collect();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].cluster_key_value(), &Value::Integer(4));
    assert_eq!(table.size(), 4);
    Ok(())
}

#[test]
fn test_rejects_tuple_clustered_on_other_column() {
    let mut store = MemoryStore::new();
    let mut table = Table::new("t", "id", 3);
    let record = Record::from([("code".to_string(), Value::Text("x".into()))]);
    let tuple = Tuple::new("code", record).unwrap();
    assert!(matches!(
        table.insert_tuple(&mut store, tuple),
        Err(DatabaseError::SchemaError { .. })
    ));
    assert_eq!(table.page_count(), 0);
}
