//! Tests for storage object content representations.

use std::io::Write;
use stowage_core::{ATTR_CONTENT_TYPE, ATTR_FILE_NAME, Content, StorageObject};
use stowage_error::StowageErrorKind;
use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;

const PAYLOAD: &[u8] = b"The quick brown fox jumps over the lazy dog";

fn payload_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(PAYLOAD).unwrap();
    file.flush().unwrap();
    file
}

async fn read_all(object: &StorageObject) -> Vec<u8> {
    let mut reader = object.as_reader().await.unwrap();
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await.unwrap();
    buf
}

#[tokio::test]
async fn test_every_variant_round_trips_through_buffer() {
    let file = payload_file();
    let objects = vec![
        StorageObject::from_file("k", file.path()).unwrap(),
        StorageObject::from_bytes("k", PAYLOAD.to_vec()).unwrap(),
        StorageObject::from_string("k", std::str::from_utf8(PAYLOAD).unwrap()).unwrap(),
        StorageObject::from_reader("k", std::io::Cursor::new(PAYLOAD.to_vec())).unwrap(),
    ];

    for object in objects {
        let bytes = object.as_bytes().await.unwrap();
        let rewrapped = StorageObject::from_bytes("k", bytes.clone()).unwrap();
        assert_eq!(rewrapped.as_bytes().await.unwrap(), bytes);
        assert_eq!(bytes, PAYLOAD);
    }
}

#[tokio::test]
async fn test_blank_key_rejected() {
    let err = StorageObject::from_string("  ", "content").unwrap_err();
    assert!(matches!(err.kind(), StowageErrorKind::Storage(_)));
}

#[tokio::test]
async fn test_lengths() {
    let file = payload_file();
    let len = PAYLOAD.len() as u64;

    assert_eq!(StorageObject::from_file("k", file.path()).unwrap().len().await.unwrap(), len);
    assert_eq!(StorageObject::from_bytes("k", PAYLOAD).unwrap().len().await.unwrap(), len);
    assert_eq!(StorageObject::from_string("k", "héllo").unwrap().len().await.unwrap(), 6);

    let stream = StorageObject::from_reader("k", std::io::Cursor::new(PAYLOAD.to_vec())).unwrap();
    assert_eq!(stream.len().await.unwrap(), len);
    // length buffered the stream, so the content is still there
    assert_eq!(stream.as_bytes().await.unwrap(), PAYLOAD);
}

#[tokio::test]
async fn test_stream_bytes_cached() {
    let object = StorageObject::from_reader("k", std::io::Cursor::new(PAYLOAD.to_vec())).unwrap();
    assert_eq!(object.as_bytes().await.unwrap(), PAYLOAD);
    assert_eq!(object.as_bytes().await.unwrap(), PAYLOAD);
    assert_eq!(object.as_string().await.unwrap().as_bytes(), PAYLOAD);
    assert_eq!(read_all(&object).await, PAYLOAD);
}

#[tokio::test]
async fn test_stream_reader_is_single_use() {
    let object = StorageObject::from_reader("k", std::io::Cursor::new(PAYLOAD.to_vec())).unwrap();
    assert_eq!(read_all(&object).await, PAYLOAD);
    assert!(read_all(&object).await.is_empty());
}

#[tokio::test]
async fn test_file_reader_reopens() {
    let file = payload_file();
    let object = StorageObject::from_file("k", file.path()).unwrap();
    assert_eq!(read_all(&object).await, PAYLOAD);
    assert_eq!(read_all(&object).await, PAYLOAD);
}

#[tokio::test]
async fn test_as_file_backing_is_not_copied() {
    let file = payload_file();
    let object = StorageObject::from_file("k", file.path()).unwrap();

    let local = object.as_file().await.unwrap();
    assert!(!local.is_temporary());
    assert_eq!(local.path(), file.path());
}

#[tokio::test]
async fn test_as_file_temporary_removed_on_drop() {
    let object = StorageObject::from_bytes("k", PAYLOAD).unwrap();

    let local = object.as_file().await.unwrap();
    assert!(local.is_temporary());
    let path = local.path().to_path_buf();
    assert_eq!(std::fs::read(&path).unwrap(), PAYLOAD);

    drop(local);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_invalid_utf8_is_an_error() {
    let object = StorageObject::from_bytes("k", vec![0xff, 0xfe, 0xfd]).unwrap();
    assert!(object.as_string().await.is_err());
}

#[tokio::test]
async fn test_attributes_are_copied() {
    let mut object = StorageObject::from_string("k", "x")
        .unwrap()
        .with_attribute(ATTR_CONTENT_TYPE, "text/plain");

    let mut copy = object.attributes();
    copy.insert(ATTR_FILE_NAME.to_string(), "x.txt".to_string());
    assert!(object.attribute(ATTR_FILE_NAME).is_none());

    object.set_attributes(copy);
    assert_eq!(object.attribute(ATTR_FILE_NAME), Some("x.txt"));
    assert_eq!(object.content_type(), Some("text/plain"));
    assert!(object.has_attributes());

    assert_eq!(object.remove_attribute(ATTR_FILE_NAME).as_deref(), Some("x.txt"));
}

#[tokio::test]
async fn test_content_factory_dispatch() {
    let file = payload_file();
    let by_path = StorageObject::new("k", file.path()).unwrap();
    assert!(matches!(by_path.content(), Content::File(_)));
    assert_eq!(by_path.backing_path(), Some(file.path()));

    let by_text = StorageObject::new("k", "text").unwrap();
    assert!(matches!(by_text.content(), Content::Text(_)));
    assert!(by_text.backing_path().is_none());

    let by_bytes = StorageObject::new("k", vec![1u8, 2, 3]).unwrap();
    assert!(matches!(by_bytes.content(), Content::Buffer(_)));
}
