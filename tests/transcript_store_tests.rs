//! File-backed transcript store against a scratch directory.

mod common;

use common::TempDir;
use ollama_webui::history::{ record_from_payload, FileTranscriptStore, StoreError, TranscriptStore };
use ollama_webui::models::chat::ConversationRecord;
use serde_json::{ json, Value };

fn store(dir: &TempDir) -> FileTranscriptStore {
    FileTranscriptStore::new(dir.path.clone())
}

fn payload(value: Value) -> ConversationRecord {
    record_from_payload(value).expect("valid payload")
}

#[tokio::test]
async fn save_then_load_returns_the_same_record() {
    let dir = TempDir::new("store-roundtrip");
    let store = store(&dir);
    let record = json!({
        "name": "Greeting",
        "messages": [
            {"role": "user", "content": "Hi", "timestamp": 1718000000},
            {"role": "assistant", "content": "Hello!"}
        ],
        "system": "Be terse",
        "model": "llama3:8b",
        "temperature": 0.7,
    });

    let filename = store.save(payload(record.clone())).await.unwrap();
    let loaded = store.load(&filename).await.unwrap();

    assert_eq!(loaded, record);
}

#[tokio::test]
async fn irregular_records_are_stored_verbatim() {
    let dir = TempDir::new("store-verbatim");
    let store = store(&dir);

    for record in [
        json!({"name": "x", "messages": [{"role": "assistant", "thinking": "hmm"}]}),
        json!({"name": "x", "messages": [{"role": "user", "content": null}]}),
        json!({"name": "x", "messages": [{"content": "who said this?"}]}),
        json!({"name": 7, "messages": [{"role": "user", "content": "Hi"}]}),
        json!({"name": null, "messages": "not a list", "pinned": true}),
    ] {
        let filename = store.save(payload(record.clone())).await.unwrap();
        assert_eq!(store.load(&filename).await.unwrap(), record);
    }
}

#[tokio::test]
async fn derived_name_is_the_only_addition() {
    let dir = TempDir::new("store-name-only");
    let store = store(&dir);
    let record = json!({"messages": [{"role": "user"}, {"role": "assistant", "content": "Hello"}]});

    let filename = store.save(payload(record.clone())).await.unwrap();
    let mut expected = record;
    expected["name"] = json!("New Chat");
    assert_eq!(store.load(&filename).await.unwrap(), expected);
}

#[tokio::test]
async fn unnamed_conversation_gets_derived_name() {
    let dir = TempDir::new("store-name");
    let store = store(&dir);

    let filename = store.save(payload(json!({
        "messages": [{"role": "user", "content": "What is the capital city of Australia, roughly?"}]
    }))).await.unwrap();
    let loaded = store.load(&filename).await.unwrap();
    assert_eq!(loaded["name"], json!("What is the capital city of Au..."));

    let filename = store.save(payload(json!({"messages": []}))).await.unwrap();
    let loaded = store.load(&filename).await.unwrap();
    assert_eq!(loaded["name"], json!("New Chat"));
}

#[tokio::test]
async fn saving_twice_never_overwrites() {
    let dir = TempDir::new("store-twice");
    let store = store(&dir);
    let record = json!({"messages": [{"role": "user", "content": "same"}]});

    let first = store.save(payload(record.clone())).await.unwrap();
    let second = store.save(payload(record)).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(store.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn list_is_descending_and_ignores_other_files() {
    let dir = TempDir::new("store-list");
    for name in [
        "conv_20240101_090000_aaaaaaaa.json",
        "conv_20240315_120000_bbbbbbbb.json",
        "conv_20231231_235959_cccccccc.json",
        "notes.txt",
    ] {
        std::fs::write(dir.path.join(name), "{}").unwrap();
    }
    std::fs::create_dir(dir.path.join("archive")).unwrap();

    let names = store(&dir).list().await.unwrap();
    assert_eq!(names, vec![
        "conv_20240315_120000_bbbbbbbb.json",
        "conv_20240101_090000_aaaaaaaa.json",
        "conv_20231231_235959_cccccccc.json",
    ]);
}

#[tokio::test]
async fn load_missing_is_not_found() {
    let dir = TempDir::new("store-missing");
    let err = store(&dir).load("conv_19700101_000000_deadbeef.json").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn names_outside_the_store_are_not_found() {
    let dir = TempDir::new("store-escape");
    let outside = dir.path.join("outside.json");
    std::fs::write(&outside, "{\"secret\": true}").unwrap();
    let inner = dir.path.join("conversations");
    std::fs::create_dir(&inner).unwrap();
    let store = FileTranscriptStore::new(inner);

    assert!(matches!(store.load("../outside.json").await, Err(StoreError::NotFound(_))));
    assert!(matches!(store.delete("../outside.json").await, Err(StoreError::NotFound(_))));
    assert!(outside.exists());
}

#[tokio::test]
async fn delete_removes_only_the_named_file() {
    let dir = TempDir::new("store-delete");
    let store = store(&dir);
    let keep = store.save(payload(json!({"messages": [{"role": "user", "content": "keep"}]}))).await.unwrap();
    let drop = store.save(payload(json!({"messages": [{"role": "user", "content": "drop"}]}))).await.unwrap();

    store.delete(&drop).await.unwrap();

    assert_eq!(store.list().await.unwrap(), vec![keep.clone()]);
    assert!(matches!(store.delete(&drop).await, Err(StoreError::NotFound(_))));
    assert!(store.load(&keep).await.is_ok());
}

#[tokio::test]
async fn delete_all_clears_json_files_only() {
    let dir = TempDir::new("store-delete-all");
    let store = store(&dir);
    for text in ["one", "two", "three"] {
        store.save(payload(json!({"messages": [{"role": "user", "content": text}]}))).await.unwrap();
    }
    std::fs::write(dir.path.join("readme.txt"), "not a transcript").unwrap();

    store.delete_all().await.unwrap();

    assert!(store.list().await.unwrap().is_empty());
    assert!(dir.path.join("readme.txt").exists());
}

#[tokio::test]
async fn missing_store_dir_is_an_io_error() {
    let dir = TempDir::new("store-gone");
    let store = FileTranscriptStore::new(dir.path.join("never-created"));
    assert!(matches!(store.list().await, Err(StoreError::Io(_))));
    assert!(matches!(store.delete_all().await, Err(StoreError::Io(_))));
}
