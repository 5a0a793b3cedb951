use picobase::errors::Error;
use picobase::storage::row::Row;
use picobase::storage::table::Table;

fn temp_db_path() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db").to_str().unwrap().to_string();
    (dir, path)
}

#[test]
fn insert_then_select_round_trips_a_row() {
    let (_dir, path) = temp_db_path();
    let mut table = Table::open(&path).unwrap();
    table
        .insert(&Row::new(1, "user1", "person1@example.com").unwrap())
        .unwrap();

    let rows = table.select().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, 1);
    assert_eq!(rows[0].username, "user1");
    assert_eq!(rows[0].email, "person1@example.com");
    table.close().unwrap();
}

#[test]
fn duplicate_key_is_rejected_and_leaves_select_unchanged() {
    let (_dir, path) = temp_db_path();
    let mut table = Table::open(&path).unwrap();
    table.insert(&Row::new(1, "a", "a@a").unwrap()).unwrap();

    let err = table.insert(&Row::new(1, "b", "b@b").unwrap()).unwrap_err();
    assert!(matches!(err, Error::DuplicateKey));

    let rows = table.select().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].username, "a");
    table.close().unwrap();
}

#[test]
fn select_returns_rows_in_ascending_key_order_regardless_of_insertion_order() {
    let (_dir, path) = temp_db_path();
    let mut table = Table::open(&path).unwrap();
    table.insert(&Row::new(3, "c", "c@c").unwrap()).unwrap();
    table.insert(&Row::new(1, "a", "a@a").unwrap()).unwrap();
    table.insert(&Row::new(2, "b", "b@b").unwrap()).unwrap();

    let rows = table.select().unwrap();
    let ids: Vec<u32> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    table.close().unwrap();
}

#[test]
fn rows_persist_across_close_and_reopen() {
    let (_dir, path) = temp_db_path();
    {
        let mut table = Table::open(&path).unwrap();
        for id in 1..=3u32 {
            table
                .insert(&Row::new(id, &format!("user{id}"), &format!("user{id}@example.com")).unwrap())
                .unwrap();
        }
        table.close().unwrap();
    }

    let mut table = Table::open(&path).unwrap();
    let rows = table.select().unwrap();
    let ids: Vec<u32> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    table.close().unwrap();
}

#[test]
fn fourteen_sequential_inserts_split_the_root_leaf() {
    let (_dir, path) = temp_db_path();
    let mut table = Table::open(&path).unwrap();
    for id in 1..=14u32 {
        table
            .insert(&Row::new(id, &format!("user{id}"), "a@a").unwrap())
            .unwrap();
    }

    let tree = table.print_tree().unwrap();
    assert!(tree.contains("- internal (size 1)"));
    assert!(tree.contains("- leaf (size 7)"));
    assert!(tree.contains("- key 7"));

    let rows = table.select().unwrap();
    let ids: Vec<u32> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, (1..=14).collect::<Vec<_>>());
    table.close().unwrap();
}

#[test]
fn many_inserts_force_multiple_splits_and_scan_stays_ordered() {
    let (_dir, path) = temp_db_path();
    let mut table = Table::open(&path).unwrap();
    for id in 1..=40u32 {
        table
            .insert(&Row::new(id, &format!("u{id}"), "a@a").unwrap())
            .unwrap();
    }

    let rows = table.select().unwrap();
    let ids: Vec<u32> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, (1..=40).collect::<Vec<_>>());
    table.close().unwrap();
}

#[test]
fn reversed_insertion_order_still_splits_and_scans_in_order() {
    let (_dir, path) = temp_db_path();
    let mut table = Table::open(&path).unwrap();
    for id in (1..=30u32).rev() {
        table
            .insert(&Row::new(id, &format!("u{id}"), "a@a").unwrap())
            .unwrap();
    }

    let rows = table.select().unwrap();
    let ids: Vec<u32> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, (1..=30).collect::<Vec<_>>());
    table.close().unwrap();
}

#[test]
fn username_over_max_length_is_rejected_before_reaching_the_table() {
    let long_username = "a".repeat(33);
    assert!(Row::new(1, &long_username, "a@a").is_err());
}

#[test]
fn corrupt_file_length_is_rejected_at_open() {
    use std::io::Write;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.db");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(&[0u8; 100])
        .unwrap();

    let err = Table::open(path.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, Error::CorruptFile(_)));
}

#[test]
fn running_out_of_pages_is_reported_as_table_full_not_a_fatal_error() {
    let (_dir, path) = temp_db_path();
    let mut table = Table::open(&path).unwrap();

    let mut table_full_at = None;
    for id in 1..=2000u32 {
        match table.insert(&Row::new(id, &format!("u{id}"), "a@a").unwrap()) {
            Ok(()) => {}
            Err(Error::TableFull) => {
                table_full_at = Some(id);
                break;
            }
            Err(e) => panic!("expected a recoverable TableFull, got a fatal error instead: {e}"),
        }
    }

    let table_full_at = table_full_at.expect("2000 inserts should have exhausted TABLE_MAX_PAGES");
    assert!(!Error::TableFull.is_fatal());

    // The rejected insert must not have corrupted anything already stored.
    let rows = table.select().unwrap();
    assert_eq!(rows.len() as u32, table_full_at - 1);
    table.close().unwrap();
}

#[test]
fn file_length_after_close_is_a_multiple_of_the_page_size() {
    let (_dir, path) = temp_db_path();
    let mut table = Table::open(&path).unwrap();
    table.insert(&Row::new(1, "a", "a@a").unwrap()).unwrap();
    table.close().unwrap();

    let len = std::fs::metadata(&path).unwrap().len();
    assert_eq!(len % 4096, 0);
    assert!(len > 0);
}
