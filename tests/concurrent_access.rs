use mxid_rust::domain::Account;
use mxid_rust::persistence::{AccountStore, HashStore, PolicyStore, TransactionStore};
use mxid_rust::{SqlStorage, StorageConfig};
use std::sync::{Arc, Barrier};

// Muchos hilos comparten un almacenamiento SQLite de una sola conexión: las
// llamadas se serializan en el pool y ninguna se pierde.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_writers_share_single_sqlite_connection() {
    let store = Arc::new(SqlStorage::open(&StorageConfig::sqlite(":memory:")).unwrap());

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = Arc::clone(&store);
        handles.push(tokio::task::spawn_blocking(move || {
            let mxid = format!("@user{i}:example.org");
            store.add_hash(&mxid, "email", &format!("user{i}@example.org"), &format!("h{i}"))?;
            store.insert_transaction_result("bridge", &i.to_string(), chrono::Utc::now(), "{}")
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }

    let wanted: Vec<String> = (0..16).map(|i| format!("h{i}")).collect();
    assert_eq!(store.find_hashes(&wanted).unwrap().len(), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_duplicate_transaction_has_one_winner() {
    let store = Arc::new(SqlStorage::open(&StorageConfig::sqlite(":memory:")).unwrap());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::task::spawn_blocking(move || {
            store.insert_transaction_result("bridge", "same-id", chrono::Utc::now(), "{}")
        }));
    }
    let mut ok = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(()) => ok += 1,
            Err(e) => assert!(e.is_duplicate_key(), "got {e:?}"),
        }
    }
    assert_eq!(ok, 1);
}

// Aceptar la misma URL desde varios hilos a la vez sigue siendo idempotente.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_policy_accepts_all_succeed_with_one_row_per_url() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accepts.db");
    let store = Arc::new(SqlStorage::open(&StorageConfig::sqlite(path.to_str().unwrap())).unwrap());
    store.insert_token(&Account::new("tok", "@alice:example.org")).unwrap();

    const THREADS: usize = 8;
    for round in 0..20 {
        let url = format!("https://example.org/terms-{round}.html");
        let barrier = Arc::new(Barrier::new(THREADS));
        let mut handles = Vec::new();
        for _ in 0..THREADS {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            let url = url.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                barrier.wait();
                store.accept_policy("tok", &url)
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
    }

    let accepted = store.accepted_policies("@alice:example.org").unwrap();
    assert_eq!(accepted.len(), 20);
}
