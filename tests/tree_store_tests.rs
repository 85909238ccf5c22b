use dirtree::auth::Principal;
use dirtree::config::AppConfig;
use dirtree::persistence::snapshot::{load_snapshot, save_snapshot};
use dirtree::persistence::wal::WalWriter;
use dirtree::services::{directory_service, file_service};
use dirtree::state::AppState;
use dirtree::store::{StoreError, TreeStore};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

fn open_store(data_dir: &Path) -> TreeStore {
    TreeStore::new(WalWriter::open(&data_dir.join("wal")).unwrap())
}

/// Rebuilds a store from whatever is on disk, the way boot recovery does.
fn recover_store(data_dir: &Path) -> TreeStore {
    let store = open_store(data_dir);
    if let Some(snapshot) = load_snapshot(&data_dir.join("snapshot.bin")).unwrap() {
        store.restore(snapshot);
    }
    for entry in WalWriter::read_entries(&data_dir.join("wal")).unwrap() {
        store.replay(entry);
    }
    store
}

fn test_state(data_dir: &Path) -> AppState {
    let config = AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        data_dir: data_dir.to_str().unwrap().to_string(),
        public_url: "http://files.test".to_string(),
        max_upload_size: 1_048_576,
        snapshot_interval_secs: 3600,
        log_level: "error".to_string(),
        cors_allowed_origins: "*".to_string(),
        insights_api_key: None,
        insights_base_url: "http://127.0.0.1:9".to_string(),
        insights_model: "test-model".to_string(),
        insights_timeout_secs: 1,
    };
    let wal = WalWriter::open(&config.wal_dir()).unwrap();
    AppState::new(config, wal).unwrap()
}

// ==================== Structure ====================

#[test]
fn test_insert_under_missing_parent_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let store = open_store(tmp.path());

    let missing = Uuid::new_v4();
    let err = store.insert_directory(missing, "x", "u1").unwrap_err();
    assert!(matches!(err, StoreError::DirectoryNotFound(id) if id == missing));
    assert_eq!(store.directory_count(), 0);
}

#[test]
fn test_insert_enforces_inherited_ownership() {
    let tmp = tempfile::tempdir().unwrap();
    let store = open_store(tmp.path());
    let root = store.get_or_create_root("u1").unwrap();

    let err = store.insert_directory(root.id, "x", "u2").unwrap_err();
    assert!(matches!(err, StoreError::OwnershipMismatch { .. }));
    assert_eq!(store.directory_count(), 1);

    let child = store.insert_directory(root.id, "x", "u1").unwrap();
    assert_eq!(child.owner_id, "u1");
    assert_eq!(child.parent_id, Some(root.id));
}

#[test]
fn test_root_is_parentless_and_unique() {
    let tmp = tempfile::tempdir().unwrap();
    let store = open_store(tmp.path());

    let root = store.get_or_create_root("u1").unwrap();
    assert!(root.is_root());
    assert_eq!(store.get_or_create_root("u1").unwrap().id, root.id);
    assert_eq!(store.root_of("u1").unwrap().id, root.id);
    assert!(store.root_of("u2").is_none());
}

#[test]
fn test_list_children_preserves_insertion_order() {
    let tmp = tempfile::tempdir().unwrap();
    let store = open_store(tmp.path());
    let root = store.get_or_create_root("u1").unwrap();

    let names = ["c", "a", "b"];
    for name in names {
        store.insert_directory(root.id, name, "u1").unwrap();
    }
    store.register_file(root.id, "z", "txt", "u://z").unwrap();
    store.register_file(root.id, "y", "", "u://y").unwrap();

    let (dirs, files) = store.list_children(root.id).unwrap();
    let listed: Vec<&str> = dirs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(listed, names);
    let listed: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(listed, ["z", "y"]);
}

#[test]
fn test_list_children_of_missing_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let store = open_store(tmp.path());

    assert!(matches!(
        store.list_children(Uuid::new_v4()),
        Err(StoreError::DirectoryNotFound(_))
    ));
}

#[test]
fn test_register_file_requires_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let store = open_store(tmp.path());

    assert!(store
        .register_file(Uuid::new_v4(), "a", "b", "u://a")
        .is_err());
    assert_eq!(store.file_count(), 0);
}

#[test]
fn test_subtree_files_spans_nested_directories() {
    let tmp = tempfile::tempdir().unwrap();
    let store = open_store(tmp.path());
    let root = store.get_or_create_root("u1").unwrap();
    let docs = store.insert_directory(root.id, "docs", "u1").unwrap();
    let deep = store.insert_directory(docs.id, "deep", "u1").unwrap();
    let other = store.get_or_create_root("u2").unwrap();

    store.register_file(root.id, "top", "txt", "u://1").unwrap();
    store.register_file(deep.id, "bottom", "txt", "u://2").unwrap();
    store.register_file(other.id, "foreign", "txt", "u://3").unwrap();

    let names: Vec<String> = store
        .subtree_files(root.id)
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(names, ["top", "bottom"]);
}

#[test]
fn test_split_filename() {
    assert_eq!(
        file_service::split_filename("report.pdf"),
        ("report".to_string(), "pdf".to_string())
    );
    assert_eq!(
        file_service::split_filename("archive.tar.gz"),
        ("archive.tar".to_string(), "gz".to_string())
    );
    assert_eq!(
        file_service::split_filename(".bashrc"),
        (".bashrc".to_string(), String::new())
    );
    assert_eq!(
        file_service::split_filename("README"),
        ("README".to_string(), String::new())
    );
    assert_eq!(
        file_service::split_filename("trailing."),
        ("trailing.".to_string(), String::new())
    );
}

// ==================== Ranking ====================

#[test]
fn test_most_accessed_on_empty_store() {
    let tmp = tempfile::tempdir().unwrap();
    let store = open_store(tmp.path());
    assert!(store.find_most_accessed().is_none());
}

#[test]
fn test_most_accessed_ranking_and_tie_break() {
    let tmp = tempfile::tempdir().unwrap();
    let store = open_store(tmp.path());
    let root = store.get_or_create_root("u1").unwrap();
    let a = store.insert_directory(root.id, "A", "u1").unwrap();
    let b = store.insert_directory(root.id, "B", "u1").unwrap();

    // Everything at zero: the oldest directory wins.
    assert_eq!(store.find_most_accessed().unwrap().id, root.id);

    for _ in 0..3 {
        store.record_access(a.id).unwrap();
    }
    for _ in 0..5 {
        store.record_access(b.id).unwrap();
    }
    assert_eq!(store.find_most_accessed().unwrap().id, b.id);

    store.record_access(a.id).unwrap();
    assert_eq!(store.record_access(a.id).unwrap(), 5);
    let top = store.find_most_accessed().unwrap();
    assert_eq!(top.id, a.id);
    assert_eq!(top.access_count, 5);
}

#[test]
fn test_record_access_on_missing_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let store = open_store(tmp.path());

    assert!(matches!(
        store.record_access(Uuid::new_v4()),
        Err(StoreError::DirectoryNotFound(_))
    ));
}

// ==================== Concurrency ====================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_access_loses_no_increments() {
    for n in [1u64, 10, 100] {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(tmp.path());
        let root = state.tree.get_or_create_root("u1").unwrap();
        let dir_id = state.tree.insert_directory(root.id, "hot", "u1").unwrap().id;

        let handles: Vec<_> = (0..n)
            .map(|_| {
                let state = state.clone();
                tokio::spawn(async move {
                    directory_service::record_access(&state, dir_id).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(state.tree.get_directory(dir_id).unwrap().access_count, n);
        assert_eq!(state.tree.find_most_accessed().unwrap().id, dir_id);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_root_provisioning_creates_one_root() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Arc::new(open_store(tmp.path()));

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.get_or_create_root("u1").unwrap().id })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }
    assert_eq!(ids.len(), 1);
    assert_eq!(store.directory_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creation_under_one_parent() {
    let tmp = tempfile::tempdir().unwrap();
    let state = test_state(tmp.path());
    let principal = Principal("u1".to_string());
    let root_id = state.tree.get_or_create_root("u1").unwrap().id;

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let state = state.clone();
            let principal = principal.clone();
            tokio::spawn(async move {
                directory_service::create_subdirectory(
                    &state,
                    &principal,
                    root_id,
                    &format!("dir-{}", i),
                )
                .await
                .unwrap()
                .id
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }
    assert_eq!(ids.len(), 50);

    let contents = directory_service::get_contents(&state, &principal, root_id)
        .await
        .unwrap();
    let listed: HashSet<Uuid> = contents.directories.iter().map(|d| d.id).collect();
    assert_eq!(listed, ids);
}

// ==================== Recovery ====================

#[test]
fn test_wal_replay_restores_tree_and_counts() {
    let tmp = tempfile::tempdir().unwrap();
    let (root_id, docs_id) = {
        let store = open_store(tmp.path());
        let root = store.get_or_create_root("u1").unwrap();
        let docs = store.insert_directory(root.id, "docs", "u1").unwrap();
        store.register_file(docs.id, "cv", "pdf", "u://cv").unwrap();
        store.record_access(docs.id).unwrap();
        store.record_access(docs.id).unwrap();
        (root.id, docs.id)
    };

    let store = recover_store(tmp.path());
    assert_eq!(store.directory_count(), 2);
    assert_eq!(store.file_count(), 1);
    assert_eq!(store.root_of("u1").unwrap().id, root_id);
    assert_eq!(store.get_directory(docs_id).unwrap().access_count, 2);

    let (dirs, _) = store.list_children(root_id).unwrap();
    assert_eq!(dirs[0].id, docs_id);
    let (_, files) = store.list_children(docs_id).unwrap();
    assert_eq!(files[0].name, "cv");
}

#[test]
fn test_checkpoint_truncates_wal_and_keeps_later_writes() {
    let tmp = tempfile::tempdir().unwrap();
    let snapshot_path = tmp.path().join("snapshot.bin");
    let (a_id, b_id) = {
        let store = open_store(tmp.path());
        let root = store.get_or_create_root("u1").unwrap();
        let a = store.insert_directory(root.id, "A", "u1").unwrap();
        let b = store.insert_directory(root.id, "B", "u1").unwrap();
        store.record_access(b.id).unwrap();

        assert_eq!(store.checkpoint(&snapshot_path).unwrap(), 4);
        assert!(WalWriter::read_entries(&tmp.path().join("wal"))
            .unwrap()
            .is_empty());

        store.record_access(a.id).unwrap();
        (a.id, b.id)
    };

    let store = recover_store(tmp.path());
    assert_eq!(store.get_directory(a_id).unwrap().access_count, 1);
    assert_eq!(store.get_directory(b_id).unwrap().access_count, 1);
    // Creation order survives the snapshot, so the tie still goes to A.
    assert_eq!(store.find_most_accessed().unwrap().id, a_id);
}

#[test]
fn test_replayed_creation_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let store = open_store(tmp.path());
        let root = store.get_or_create_root("u1").unwrap();
        store.insert_directory(root.id, "docs", "u1").unwrap();
    }

    let store = recover_store(tmp.path());
    for entry in WalWriter::read_entries(&tmp.path().join("wal")).unwrap() {
        store.replay(entry);
    }
    assert_eq!(store.directory_count(), 2);
    let root = store.root_of("u1").unwrap();
    assert_eq!(store.list_children(root.id).unwrap().0.len(), 1);
}

#[test]
fn test_crash_between_snapshot_and_truncate_does_not_double_count() {
    let tmp = tempfile::tempdir().unwrap();
    let snapshot_path = tmp.path().join("snapshot.bin");
    let docs_id = {
        let store = open_store(tmp.path());
        let root = store.get_or_create_root("u1").unwrap();
        let docs = store.insert_directory(root.id, "docs", "u1").unwrap();
        for _ in 0..3 {
            store.record_access(docs.id).unwrap();
        }
        // Snapshot lands on disk but the WAL is never truncated.
        save_snapshot(&snapshot_path, &store.snapshot()).unwrap();
        docs.id
    };

    let store = recover_store(tmp.path());
    assert_eq!(store.directory_count(), 2);
    assert_eq!(store.get_directory(docs_id).unwrap().access_count, 3);

    store.record_access(docs_id).unwrap();
    drop(store);
    let store = recover_store(tmp.path());
    assert_eq!(store.get_directory(docs_id).unwrap().access_count, 4);
}

#[test]
fn test_writes_after_restart_from_checkpoint_are_replayed() {
    let tmp = tempfile::tempdir().unwrap();
    let snapshot_path = tmp.path().join("snapshot.bin");
    let docs_id = {
        let store = open_store(tmp.path());
        let root = store.get_or_create_root("u1").unwrap();
        let docs = store.insert_directory(root.id, "docs", "u1").unwrap();
        store.record_access(docs.id).unwrap();
        store.checkpoint(&snapshot_path).unwrap();
        docs.id
    };

    // Empty WAL on restart: new records must still sort after the snapshot.
    {
        let store = recover_store(tmp.path());
        store.record_access(docs_id).unwrap();
        store.insert_directory(docs_id, "inner", "u1").unwrap();
    }

    let store = recover_store(tmp.path());
    assert_eq!(store.get_directory(docs_id).unwrap().access_count, 2);
    assert_eq!(store.list_children(docs_id).unwrap().0.len(), 1);
}

#[test]
fn test_wal_sequence_survives_truncation_and_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let wal_dir = tmp.path().join("wal");
    let entry = |n: u128| dirtree::persistence::wal::WalEntry::AccessRecorded {
        directory_id: Uuid::from_u128(n),
        recorded_at: chrono::Utc::now(),
    };

    {
        let mut wal = WalWriter::open(&wal_dir).unwrap();
        assert_eq!(wal.append(&entry(1)).unwrap(), 1);
        assert_eq!(wal.append(&entry(2)).unwrap(), 2);
        wal.truncate().unwrap();
        assert_eq!(wal.append(&entry(3)).unwrap(), 3);
        assert_eq!(wal.entry_count(), 1);
    }

    let mut wal = WalWriter::open(&wal_dir).unwrap();
    assert_eq!(wal.last_seq(), 3);
    wal.resume_after(10);
    assert_eq!(wal.append(&entry(4)).unwrap(), 11);

    let seqs: Vec<u64> = WalWriter::read_entries(&wal_dir)
        .unwrap()
        .into_iter()
        .map(|r| r.seq)
        .collect();
    assert_eq!(seqs, [3, 11]);
}
