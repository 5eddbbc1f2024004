//! HTTP client integration tests.
//!
//! The real `PortalClient` and `HttpTranscoderClient` are pointed at
//! in-process axum stub servers bound to ephemeral ports.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use mediacid_core::{
    config::{StorageConfig, TranscoderConfig},
    storage::{DownloadOptions, DownloadProgress, UploadOptions},
    transcoder::{JobFailure, StatusPoller, TranscodeFlags, TranscodeRequester},
    Blob, ContentId, ContentStore, FormatDescriptor, HttpTranscoderClient, JobStatus,
    Orchestrator, OrchestratorSettings, PortalClient, RefreshOutcome, StorageError,
    TranscoderError,
};

/// Serve `router` on an ephemeral port and return its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Serve the same raw HTTP/1.1 `response` to every connection.
async fn raw_http_stub(response: &'static str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{}", addr)
}

/// A base URL nothing listens on.
async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

// ============================================================================
// Transcoder stub
// ============================================================================

#[derive(Clone, Default)]
struct TranscoderStub {
    submissions: Arc<Mutex<Vec<HashMap<String, String>>>>,
    status_keys: Arc<Mutex<Vec<String>>>,
    replies: Arc<Mutex<HashMap<String, (u16, String)>>>,
}

impl TranscoderStub {
    fn reply(&self, key: &str, status: u16, body: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(key.to_string(), (status, body.to_string()));
    }

    fn publish(&self, key: &str, outputs: Value) {
        let body = json!({ "metadata": outputs.to_string() }).to_string();
        self.reply(key, 200, &body);
    }
}

async fn stub_transcode(
    State(stub): State<TranscoderStub>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let rejected = params.get("source_cid").map(String::as_str) == Some("zrejected");
    stub.submissions.lock().unwrap().push(params);

    if rejected {
        return (StatusCode::UNPROCESSABLE_ENTITY, "unsupported source").into_response();
    }
    Json(json!({ "status": "queued" })).into_response()
}

async fn stub_get_transcoded(
    State(stub): State<TranscoderStub>,
    Path(key): Path<String>,
) -> Response {
    stub.status_keys.lock().unwrap().push(key.clone());

    let reply = stub.replies.lock().unwrap().get(&key).cloned();
    match reply {
        Some((status, body)) => {
            let status = StatusCode::from_u16(status).unwrap();
            (status, body).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn transcoder_stub() -> (TranscoderStub, String) {
    let stub = TranscoderStub::default();
    let router = Router::new()
        .route("/transcode", post(stub_transcode))
        .route("/get_transcoded/{key}", get(stub_get_transcoded))
        .with_state(stub.clone());
    let base_url = serve(router).await;
    (stub, base_url)
}

fn transcoder_client(base_url: &str) -> Arc<HttpTranscoderClient> {
    Arc::new(
        HttpTranscoderClient::new(TranscoderConfig {
            base_url: base_url.to_string(),
            gpu: false,
            timeout_secs: 5,
        })
        .unwrap(),
    )
}

// ============================================================================
// Portal stub
// ============================================================================

#[derive(Clone, Default)]
struct PortalStub {
    blobs: Arc<Mutex<HashMap<String, (String, Vec<u8>)>>>,
    authorizations: Arc<Mutex<Vec<Option<String>>>>,
    encrypt_flags: Arc<Mutex<Vec<bool>>>,
}

async fn stub_upload(
    State(stub): State<PortalStub>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    stub.authorizations.lock().unwrap().push(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    );
    stub.encrypt_flags
        .lock()
        .unwrap()
        .push(params.get("encrypt").map(String::as_str) == Some("true"));

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let ext = field
            .file_name()
            .and_then(|n| n.rsplit_once('.'))
            .map(|(_, ext)| ext.to_string())
            .unwrap_or_default();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.unwrap().to_vec();

        let mut blobs = stub.blobs.lock().unwrap();
        let cid = format!("zstub{}.{}", blobs.len(), ext);
        blobs.insert(cid.clone(), (content_type, bytes));
        return Json(json!({ "cid": cid })).into_response();
    }

    (StatusCode::BAD_REQUEST, "missing file").into_response()
}

async fn stub_blob(State(stub): State<PortalStub>, Path(cid): Path<String>) -> Response {
    let stored = stub.blobs.lock().unwrap().get(&cid).cloned();
    match stored {
        Some((content_type, bytes)) => {
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn portal_stub() -> (PortalStub, String) {
    let stub = PortalStub::default();
    let router = Router::new()
        .route("/s5/upload", post(stub_upload))
        .route("/s5/blob/{cid}", get(stub_blob))
        .with_state(stub.clone());
    let base_url = serve(router).await;
    (stub, base_url)
}

fn portal_client(base_url: &str, auth_token: &str) -> PortalClient {
    PortalClient::new(StorageConfig {
        portal_url: base_url.to_string(),
        auth_token: auth_token.to_string(),
        download_base_url: format!("{}/s5/blob/", base_url),
        default_encrypt: false,
        timeout_secs: 5,
    })
    .unwrap()
}

// ============================================================================
// Transcoder tests
// ============================================================================

#[tokio::test]
async fn test_submit_sends_query_parameters() {
    let (stub, base_url) = transcoder_stub().await;
    let requester = TranscodeRequester::new(transcoder_client(&base_url));
    let flags = TranscodeFlags {
        is_encrypted: false,
        is_gpu: true,
    };

    let ack = requester
        .submit(
            &ContentId::parse("abc.wav").unwrap(),
            &[FormatDescriptor::flac_stereo_48k()],
            flags,
        )
        .await
        .unwrap();

    assert_eq!(ack.body, json!({ "status": "queued" }));

    let submissions = stub.submissions.lock().unwrap().clone();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0]["source_cid"], "abc.wav");
    assert_eq!(submissions[0]["is_encrypted"], "false");
    assert_eq!(submissions[0]["is_gpu"], "true");

    let formats: Vec<FormatDescriptor> =
        serde_json::from_str(&submissions[0]["media_formats"]).unwrap();
    assert_eq!(formats, vec![FormatDescriptor::flac_stereo_48k()]);
}

#[tokio::test]
async fn test_submit_rejection_is_http_error() {
    let (_stub, base_url) = transcoder_stub().await;
    let requester = TranscodeRequester::new(transcoder_client(&base_url));

    let err = requester
        .submit(
            &ContentId::parse("zrejected").unwrap(),
            &[FormatDescriptor::flac_stereo_48k()],
            TranscodeFlags::default(),
        )
        .await
        .unwrap_err();

    match err {
        TranscoderError::Http { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "unsupported source");
        }
        other => panic!("expected Http error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_poll_strips_extension_and_treats_404_as_pending() {
    let (stub, base_url) = transcoder_stub().await;
    let poller = StatusPoller::new(transcoder_client(&base_url));

    let status = poller
        .poll(&ContentId::parse("abc.wav").unwrap())
        .await
        .unwrap();

    assert_eq!(status, JobStatus::Pending);
    assert_eq!(*stub.status_keys.lock().unwrap(), vec!["abc".to_string()]);
}

#[tokio::test]
async fn test_poll_server_error_is_failed() {
    let (stub, base_url) = transcoder_stub().await;
    stub.reply("abc", 500, "internal error");
    let poller = StatusPoller::new(transcoder_client(&base_url));

    let status = poller.poll(&ContentId::parse("abc").unwrap()).await.unwrap();

    assert_eq!(
        status,
        JobStatus::Failed {
            error: JobFailure::Http {
                status: 500,
                body: "internal error".to_string()
            }
        }
    );
}

#[tokio::test]
async fn test_poll_null_metadata_is_pending() {
    let (stub, base_url) = transcoder_stub().await;
    stub.reply("abc", 200, r#"{"metadata": null}"#);
    let poller = StatusPoller::new(transcoder_client(&base_url));

    let status = poller.poll(&ContentId::parse("abc").unwrap()).await.unwrap();
    assert!(status.is_pending());
}

#[tokio::test]
async fn test_poll_published_metadata_is_ready() {
    let (stub, base_url) = transcoder_stub().await;
    stub.publish(
        "abc",
        json!([{ "id": 16, "cid": "zb2flac", "type": "audio/flac", "ext": "flac", "label": "1600k" }]),
    );
    let poller = StatusPoller::new(transcoder_client(&base_url));

    match poller.poll(&ContentId::parse("abc.wav").unwrap()).await.unwrap() {
        JobStatus::Ready { outputs } => {
            assert_eq!(outputs.len(), 1);
            assert_eq!(outputs[0].cid.as_str(), "zb2flac");
            assert_eq!(outputs[0].mime_type.as_deref(), Some("audio/flac"));
            assert_eq!(outputs[0].extra["id"], 16);
        }
        other => panic!("expected Ready, got {:?}", other),
    }
}

#[tokio::test]
async fn test_poll_unreachable_service_is_transport_error() {
    let poller = StatusPoller::new(transcoder_client(&dead_url().await));

    let err = poller
        .poll(&ContentId::parse("abc").unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, TranscoderError::Transport(_)));
    assert!(err.is_retryable());
}

// ============================================================================
// Portal tests
// ============================================================================

#[tokio::test]
async fn test_portal_upload_download_round_trip() {
    let (stub, base_url) = portal_stub().await;
    let client = portal_client(&base_url, "secret");
    let bytes: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();

    let cid = client
        .upload(
            Blob::new("song.wav", bytes.clone()),
            UploadOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(cid.extension(), Some("wav"));

    let reports = Arc::new(Mutex::new(Vec::new()));
    let observer_reports = Arc::clone(&reports);
    let observer = move |p: DownloadProgress| observer_reports.lock().unwrap().push(p);

    let content = client
        .download(&cid, DownloadOptions::default(), Some(&observer))
        .await
        .unwrap();

    assert_eq!(content.bytes, bytes);
    assert_eq!(content.content_type.as_deref(), Some("audio/wav"));

    let reports = reports.lock().unwrap().clone();
    let last = reports.last().expect("progress was reported");
    assert_eq!(last.bytes_transferred, bytes.len() as u64);

    assert_eq!(
        *stub.authorizations.lock().unwrap(),
        vec![Some("Bearer secret".to_string())]
    );
}

#[tokio::test]
async fn test_portal_upload_forwards_encrypt_flag() {
    let (stub, base_url) = portal_stub().await;
    let client = portal_client(&base_url, "");

    client
        .upload(Blob::new("a.wav", vec![1, 2, 3]), UploadOptions { encrypt: true })
        .await
        .unwrap();
    client
        .upload(Blob::new("b.wav", vec![4, 5, 6]), UploadOptions::default())
        .await
        .unwrap();

    assert_eq!(*stub.encrypt_flags.lock().unwrap(), vec![true, false]);
    assert_eq!(*stub.authorizations.lock().unwrap(), vec![None, None]);
}

#[tokio::test]
async fn test_portal_download_missing_is_not_found() {
    let (_stub, base_url) = portal_stub().await;
    let client = portal_client(&base_url, "");

    let err = client
        .download(
            &ContentId::parse("zmissing").unwrap(),
            DownloadOptions::default(),
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn test_portal_download_survives_bogus_content_length() {
    let base_url =
        raw_http_stub("HTTP/1.1 200 OK\r\nContent-Length: 18446744073709551613\r\n\r\nabc").await;
    let client = portal_client(&base_url, "");

    let result = client
        .download(
            &ContentId::parse("zhuge").unwrap(),
            DownloadOptions::default(),
            None,
        )
        .await;

    // The body ends long before the advertised length.
    match result {
        Ok(content) => assert_eq!(content.bytes, b"abc"),
        Err(err) => assert!(!matches!(err, StorageError::NotFound(_))),
    }
}

#[tokio::test]
async fn test_portal_download_reports_content_length_as_total() {
    let base_url = raw_http_stub(
        "HTTP/1.1 200 OK\r\nContent-Type: audio/flac\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
    )
    .await;
    let client = portal_client(&base_url, "");

    let totals = Arc::new(Mutex::new(Vec::new()));
    let observer_totals = Arc::clone(&totals);
    let observer = move |p: DownloadProgress| observer_totals.lock().unwrap().push(p.total_bytes);

    let content = client
        .download(
            &ContentId::parse("zsmall.flac").unwrap(),
            DownloadOptions::default(),
            Some(&observer),
        )
        .await
        .unwrap();

    assert_eq!(content.bytes, b"hello");
    assert_eq!(content.content_type.as_deref(), Some("audio/flac"));
    assert_eq!(totals.lock().unwrap().last(), Some(&Some(5)));
}

#[tokio::test]
async fn test_portal_unreachable_is_transport_error() {
    let client = portal_client(&dead_url().await, "");

    let err = client
        .upload(Blob::new("a.wav", vec![1]), UploadOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_retryable());
}

// ============================================================================
// Orchestrator over both services
// ============================================================================

#[tokio::test]
async fn test_orchestrator_end_to_end() {
    let (portal, portal_url) = portal_stub().await;
    let (transcoder, transcoder_url) = transcoder_stub().await;

    let orchestrator = Orchestrator::new(
        Arc::new(portal_client(&portal_url, "")),
        transcoder_client(&transcoder_url),
        OrchestratorSettings {
            download_base_url: format!("{}/s5/blob/", portal_url),
            encrypt: false,
            gpu: false,
        },
    );

    let cid = orchestrator
        .start_upload(Blob::new("song.wav", b"RIFF....WAVE".to_vec()))
        .await
        .unwrap();
    assert_eq!(orchestrator.active_cid().await, Some(cid.clone()));

    orchestrator
        .request_transcode(&cid, &[FormatDescriptor::flac_stereo_48k()])
        .await
        .unwrap();
    assert_eq!(
        transcoder.submissions.lock().unwrap()[0]["source_cid"],
        cid.as_str()
    );

    assert_eq!(orchestrator.refresh(&cid).await.unwrap(), RefreshOutcome::Pending);

    // The service stores the transcoded file and publishes it.
    portal
        .blobs
        .lock()
        .unwrap()
        .insert("zb2flac".to_string(), ("audio/flac".to_string(), b"fLaC".to_vec()));
    transcoder.publish(
        cid.job_key(),
        json!([{ "cid": "zb2flac", "type": "audio/flac", "ext": "flac" }]),
    );

    let outcome = orchestrator.refresh(&cid).await.unwrap();
    let address = outcome.primary().expect("job is ready").clone();
    assert_eq!(
        address.url,
        format!("{}/s5/blob/zb2flac?mediaType=audio%2Fflac", portal_url)
    );

    let mut sink = Vec::new();
    let summary = orchestrator
        .download(&address.cid, &mut sink, None)
        .await
        .unwrap();
    assert_eq!(sink, b"fLaC");
    assert_eq!(summary.content_type.as_deref(), Some("audio/flac"));
}
