// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn store() -> (FsBlobStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    (FsBlobStore::new(dir.path()), dir)
}

#[tokio::test]
async fn put_get_round_trip() {
    let (store, _dir) = store();
    store.put_object("skills/u1/a/file.md", b"hello".to_vec(), None).await.unwrap();
    let bytes = store.get_object("skills/u1/a/file.md").await.unwrap();
    assert_eq!(bytes, b"hello");
}

#[tokio::test]
async fn get_missing_is_not_found() {
    let (store, _dir) = store();
    assert!(matches!(store.get_object("nope").await, Err(BlobError::NotFound(_))));
}

#[tokio::test]
async fn download_prefix_keeps_relative_paths() {
    let (store, _dir) = store();
    store.put_object("skills/u1/docs/v1/SKILL.md", b"a".to_vec(), None).await.unwrap();
    store.put_object("skills/u1/docs/v1/ref/more.md", b"b".to_vec(), None).await.unwrap();
    store.put_object("skills/u1/other/x.md", b"c".to_vec(), None).await.unwrap();

    let dest = tempfile::tempdir().unwrap();
    let count = store.download_prefix("skills/u1/docs/v1/", dest.path()).await.unwrap();
    assert_eq!(count, 2);
    assert!(dest.path().join("SKILL.md").is_file());
    assert!(dest.path().join("ref/more.md").is_file());
    assert!(!dest.path().join("x.md").exists());
}

#[tokio::test]
async fn upload_and_download_file() {
    let (store, _dir) = store();
    let src = tempfile::tempdir().unwrap();
    let file = src.path().join("input.txt");
    std::fs::write(&file, b"payload").unwrap();

    store.upload_file(&file, "inputs/u1/input.txt", Some("text/plain")).await.unwrap();

    let dest = src.path().join("copy.txt");
    store.download_file("inputs/u1/input.txt", &dest).await.unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
}

#[parameterized(
    traversal = { "a/../../etc/passwd" },
    absolute = { "/etc/passwd" },
    dotdot = { ".." },
    empty = { "" },
    blank = { "   " },
)]
fn invalid_keys_rejected(key: &str) {
    assert!(validate_key(key).is_err());
}

#[test]
fn valid_keys_pass_through() {
    assert_eq!(validate_key("a/b.txt").unwrap(), "a/b.txt");
    assert_eq!(validate_key("skills/u1/docs/v1/").unwrap(), "skills/u1/docs/v1/");
}
