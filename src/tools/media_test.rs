use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use crate::client::{ApiRequest, ApiResult, Method, MockTransport, RequestBody};
use crate::tools::ToolModule;
use crate::tools::media::*;
use crate::tools::test_support::*;

fn media_tools(responses: Vec<ApiResult<Value>>) -> (MediaTools<MockTransport>, Recorded) {
    let (mock, seen) = recording(responses);
    (MediaTools::new(context(mock)), seen)
}

/// Mock that answers by the requested listing type, whatever the call order.
fn by_type(files: ApiResult<Value>, folders: ApiResult<Value>) -> (MockTransport, Recorded) {
    let seen: Recorded = Arc::new(Mutex::new(Vec::new()));
    let files = Mutex::new(Some(files));
    let folders = Mutex::new(Some(folders));

    let mut mock = MockTransport::new();
    let sink = Arc::clone(&seen);
    mock.expect_send()
        .times(2)
        .returning(move |request: ApiRequest| {
            let slot = match request.query_value("type") {
                Some("folder") => &folders,
                _ => &files,
            };
            sink.lock().unwrap().push(request);
            slot.lock().unwrap().take().unwrap()
        });
    (mock, seen)
}

#[tokio::test]
async fn test_get_media_files_defaults() {
    let (tools, seen) = media_tools(vec![Ok(json!({"files": [{"_id": "f1"}, {"_id": "f2"}]}))]);

    let output = tools.execute("get_media_files", json!({})).await.unwrap();

    let request = only_request(&seen);
    assert_eq!(request.path, "/medias/files");
    assert_eq!(request.query_value("type"), Some("file"));
    assert_eq!(request.query_value("sortOrder"), Some("desc"));
    assert_eq!(request.query_value("altId"), Some(LOCATION));
    assert_eq!(message(&output), "Found 2 media files");
}

#[tokio::test]
async fn test_overview_fetches_files_and_folders() {
    let (mock, seen) = by_type(
        Ok(json!({"files": [{"_id": "f1"}, {"_id": "f2"}, {"_id": "f3"}]})),
        Ok(json!({"files": [{"_id": "d1"}]})),
    );
    let tools = MediaTools::new(context(mock));

    let output = tools
        .execute("get_media_overview", json!({"parentId": "root-folder"}))
        .await
        .unwrap();

    assert_eq!(seen.lock().unwrap().len(), 2);
    assert!(
        seen.lock()
            .unwrap()
            .iter()
            .all(|r| r.query_value("parentId") == Some("root-folder"))
    );
    assert_eq!(message(&output), "Found 3 files and 1 folders");
    assert_eq!(output.get("folders").and_then(Value::as_array).map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_overview_fails_when_one_listing_fails() {
    let (mock, _) = by_type(
        Ok(json!({"files": []})),
        Err(status_error(403, "scope missing")),
    );
    let tools = MediaTools::new(context(mock));

    let err = tools
        .execute("get_media_overview", json!({}))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Permission denied while trying to list media folders"));
}

#[tokio::test]
async fn test_upload_sends_hosted_multipart() {
    let (tools, seen) = media_tools(vec![Ok(json!({"fileId": "f9", "url": "https://cdn/x.png"}))]);

    let output = tools
        .execute(
            "upload_media_file",
            json!({"fileUrl": "https://example.com/x.png", "name": "x.png"}),
        )
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.path, "/medias/upload-file");
    let Some(RequestBody::Multipart(fields)) = &request.body else {
        panic!("expected a multipart body");
    };
    let field = |key: &str| {
        fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };
    assert_eq!(field("hosted"), Some("true"));
    assert_eq!(field("fileUrl"), Some("https://example.com/x.png"));
    assert_eq!(field("name"), Some("x.png"));
    assert_eq!(field("parentId"), None);
    assert!(message(&output).contains("f9"));
}

#[tokio::test]
async fn test_delete_media_not_found() {
    let (tools, _) = media_tools(vec![Err(status_error(404, "not found"))]);

    let err = tools
        .execute("delete_media_file", json!({"id": "f-gone"}))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("media item 'f-gone'"));
    assert!(err.to_string().contains("get_media_files"));
}

#[tokio::test]
async fn test_create_media_folder_body() {
    let (tools, seen) = media_tools(vec![Ok(json!({"_id": "fold1", "name": "Logos"}))]);

    let output = tools
        .execute("create_media_folder", json!({"name": "Logos", "parentId": "root1"}))
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.path, "/medias/folder");
    assert_eq!(
        request.json_body(),
        Some(&json!({
            "altId": LOCATION,
            "altType": "location",
            "name": "Logos",
            "parentId": "root1"
        }))
    );
    assert_eq!(message(&output), "Folder 'Logos' created");
}
