//! Store-level scenarios across engines and handles

use std::collections::HashSet;

use serde_json::json;
use tempfile::TempDir;

use crate::{StoreError, StoreRegistry};

const WRITERS: usize = 32;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_are_all_kept_on_disk() {
    let tmp = TempDir::new().unwrap();
    let registry = StoreRegistry::open(tmp.path());

    let mut tasks = Vec::with_capacity(WRITERS);
    for n in 0..WRITERS {
        // Fresh handle per task; they must still share one lock.
        let orders = registry.store("orders").unwrap();
        tasks.push(tokio::spawn(async move {
            orders.create(json!({"n": n})).await.unwrap()
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let all = registry.store("orders").unwrap().read().await.unwrap();
    assert_eq!(all.len(), WRITERS);

    let ids: HashSet<&str> = all.iter().map(|d| d.id()).collect();
    assert_eq!(ids.len(), WRITERS);

    // A fresh registry over the same directory sees the same data.
    let reopened = StoreRegistry::open(tmp.path());
    assert_eq!(
        reopened.store("orders").unwrap().read().await.unwrap().len(),
        WRITERS
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_do_not_lose_fields() {
    let registry = StoreRegistry::in_memory();
    let counters = registry.store("counters").unwrap();
    let doc = counters.create(json!({})).await.unwrap();

    let mut tasks = Vec::new();
    for n in 0..WRITERS {
        let counters = counters.clone();
        let id = doc.id().to_string();
        tasks.push(tokio::spawn(async move {
            let mut patch = serde_json::Map::new();
            patch.insert(format!("f{n}"), json!(n));
            counters
                .update(&id, serde_json::Value::Object(patch))
                .await
                .unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let merged = counters.get(doc.id()).await.unwrap().unwrap();
    for n in 0..WRITERS {
        assert_eq!(merged.get(&format!("f{n}")), Some(&json!(n)));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_unique_creates_admit_one() {
    let registry = StoreRegistry::in_memory();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let users = registry.store("users").unwrap();
        tasks.push(tokio::spawn(async move {
            users.create_unique("email", json!({"email": "same@x.io"})).await
        }));
    }

    let mut created = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(StoreError::Conflict { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test]
async fn test_corrupt_file_fails_and_is_left_untouched() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("orders.json");
    std::fs::write(&path, b"{ definitely not an array").unwrap();

    let orders = StoreRegistry::open(tmp.path()).store("orders").unwrap();

    assert!(matches!(
        orders.read().await,
        Err(StoreError::Corrupt { .. })
    ));
    assert!(matches!(
        orders.create(json!({"n": 1})).await,
        Err(StoreError::Corrupt { .. })
    ));
    assert_eq!(
        std::fs::read(&path).unwrap(),
        b"{ definitely not an array".to_vec()
    );
}

#[tokio::test]
async fn test_file_engine_crud_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let registry = StoreRegistry::open(tmp.path());
    let customers = registry.store("customers").unwrap();

    assert!(customers.read().await.unwrap().is_empty());

    let ada = customers
        .create(json!({"name": "Ada", "tier": "gold"}))
        .await
        .unwrap();
    let bob = customers.create(json!({"name": "Bob"})).await.unwrap();

    customers
        .update(ada.id(), json!({"tier": "platinum"}))
        .await
        .unwrap();
    assert!(customers.delete(bob.id()).await.unwrap());

    let raw = std::fs::read_to_string(tmp.path().join("customers.json")).unwrap();
    let on_disk: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
    assert_eq!(on_disk.len(), 1);
    assert_eq!(on_disk[0]["id"], json!(ada.id()));
    assert_eq!(on_disk[0]["name"], json!("Ada"));
    assert_eq!(on_disk[0]["tier"], json!("platinum"));
}

#[tokio::test]
async fn test_no_op_delete_does_not_create_file() {
    let tmp = TempDir::new().unwrap();
    let sessions = StoreRegistry::open(tmp.path()).store("sessions").unwrap();

    assert!(!sessions.delete("missing").await.unwrap());
    assert_eq!(
        sessions.delete_by("userId", &json!("u1")).await.unwrap(),
        0
    );
    assert!(!tmp.path().join("sessions.json").exists());
}
