//! HTTP client for the videolang backend.
//!
//! Every call is a single request/response. Non-success statuses become
//! [`VideolangError::RequestFailed`], transport failures come through as
//! [`VideolangError::ApiError`].

use std::{path::Path, time::Duration};

use async_trait::async_trait;
use reqwest::{
    Client, Response,
    header::{CONTENT_LENGTH, CONTENT_TYPE},
};
use tokio::fs::File;
use tracing::debug;

use crate::{
    config::ClientConfig,
    error::{Result, VideolangError},
    types::{Answer, AskRequest, NewVideo, UploadTarget, UploadUrlRequest, Video, VideoId},
};

#[async_trait]
pub trait VideoApi: Send + Sync {
    async fn list_videos(&self) -> Result<Vec<Video>>;

    async fn get_video(&self, id: VideoId) -> Result<Video>;

    /// Ask the backend for a pre-signed storage URL for `filename`
    async fn request_upload_url(&self, filename: &str) -> Result<UploadTarget>;

    /// Stream the file at `path` straight to storage, bypassing the backend
    async fn put_object(
        &self,
        target: &UploadTarget,
        path: &Path,
        content_type: &str,
    ) -> Result<()>;

    /// Register an uploaded file. Any success status counts; the record is
    /// returned only when the reply body carries a full one.
    async fn create_video(&self, video: &NewVideo) -> Result<Option<Video>>;

    async fn ask(&self, id: VideoId, question: &str) -> Result<Answer>;

    async fn delete_video(&self, id: VideoId) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct HttpVideoApi {
    http: Client,
    base_url: String,
    upload_timeout: Duration,
}

impl HttpVideoApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self::with_client(http, config))
    }

    /// Use a preconfigured reqwest client (proxies, extra headers)
    pub fn with_client(http: Client, config: &ClientConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            upload_timeout: config.upload_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turn a non-success response into `RequestFailed`, keeping the body text
async fn ensure_success(response: Response, endpoint: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(VideolangError::RequestFailed {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl VideoApi for HttpVideoApi {
    async fn list_videos(&self) -> Result<Vec<Video>> {
        let url = self.endpoint("/api/videos/");
        debug!(%url, "listing videos");

        let response = self.http.get(&url).send().await?;
        let videos = ensure_success(response, &url).await?.json().await?;
        Ok(videos)
    }

    async fn get_video(&self, id: VideoId) -> Result<Video> {
        let url = self.endpoint(&format!("/api/videos/{}/", id));
        debug!(%url, "fetching video");

        let response = self.http.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(VideolangError::VideoNotFound { id });
        }
        let video = ensure_success(response, &url).await?.json().await?;
        Ok(video)
    }

    async fn request_upload_url(&self, filename: &str) -> Result<UploadTarget> {
        let url = self.endpoint("/api/videos/upload_url/");
        debug!(%url, filename, "requesting upload url");

        let response = self
            .http
            .post(&url)
            .json(&UploadUrlRequest {
                filename: filename.to_string(),
            })
            .send()
            .await?;
        let target = ensure_success(response, &url).await?.json().await?;
        Ok(target)
    }

    async fn put_object(
        &self,
        target: &UploadTarget,
        path: &Path,
        content_type: &str,
    ) -> Result<()> {
        let bucket = target.bucket().unwrap_or_else(|| "unknown".to_string());
        let file = File::open(path).await?;
        let size = file.metadata().await?.len();
        debug!(
            bucket = %bucket,
            file_url = %target.file_url,
            size,
            "uploading to storage"
        );

        // Pre-signed PUTs need an explicit length, and the whole transfer
        // gets the upload budget instead of the per-request one.
        let response = self
            .http
            .put(&target.upload_url)
            .timeout(self.upload_timeout)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, size)
            .body(file)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VideolangError::StorageUploadFailed {
                bucket,
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn create_video(&self, video: &NewVideo) -> Result<Option<Video>> {
        let url = self.endpoint("/api/videos/");
        debug!(%url, title = %video.title, "registering video");

        let response = self.http.post(&url).json(video).send().await?;
        let body = ensure_success(response, &url).await?.text().await?;
        match serde_json::from_str::<Video>(&body) {
            Ok(created) => Ok(Some(created)),
            Err(e) => {
                debug!(error = %e, "registration reply carried no video record");
                Ok(None)
            }
        }
    }

    async fn ask(&self, id: VideoId, question: &str) -> Result<Answer> {
        let url = self.endpoint(&format!("/api/videos/{}/ask/", id));
        debug!(%url, "asking question");

        let response = self
            .http
            .post(&url)
            .json(&AskRequest {
                question: question.to_string(),
            })
            .send()
            .await?;
        let answer = ensure_success(response, &url).await?.json().await?;
        Ok(answer)
    }

    async fn delete_video(&self, id: VideoId) -> Result<()> {
        let url = self.endpoint(&format!("/api/videos/{}/", id));
        debug!(%url, "deleting video");

        let response = self.http.delete(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(VideolangError::VideoNotFound { id });
        }
        ensure_success(response, &url).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;

    /// Minimal HTTP responder: answers each connection with the next canned
    /// response and records the raw request text.
    struct CannedServer {
        base_url: String,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl CannedServer {
        async fn start(responses: Vec<(u16, String)>) -> Self {
            Self::start_delayed(responses, Duration::ZERO).await
        }

        /// Like `start`, but every reply is held back by `delay`
        async fn start_delayed(responses: Vec<(u16, String)>, delay: Duration) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let requests = Arc::new(Mutex::new(Vec::new()));
            let seen = Arc::clone(&requests);

            tokio::spawn(async move {
                for (status, body) in responses {
                    let Ok((mut socket, _)) = listener.accept().await else {
                        return;
                    };
                    let request = read_request(&mut socket).await;
                    seen.lock().unwrap().push(request);
                    tokio::time::sleep(delay).await;

                    let reply = format!(
                        "HTTP/1.1 {} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(reply.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
            });

            Self {
                base_url: format!("http://{}", addr),
                requests,
            }
        }

        fn api(&self) -> HttpVideoApi {
            let config = ClientConfig::default()
                .with_base_url(self.base_url.clone())
                .unwrap();
            let http = Client::builder().no_proxy().build().unwrap();
            HttpVideoApi::with_client(http, &config)
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    const VIDEO_JSON: &str = r#"{"id":3,"title":"clip.mp4","file_url":"https://b.s3.amazonaws.com/videos/clip.mp4","transcript":null,"processed":true,"uploaded_at":"2024-11-02T10:15:30Z","processing_status":"completed","processing_progress":100}"#;

    #[tokio::test]
    async fn lists_videos() {
        let server = CannedServer::start(vec![(200, format!("[{}]", VIDEO_JSON))]).await;

        let videos = server.api().list_videos().await.unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].id, 3);
        assert!(server.requests()[0].starts_with("GET /api/videos/ HTTP/1.1"));
    }

    #[tokio::test]
    async fn asks_with_question_body() {
        let server =
            CannedServer::start(vec![(200, r#"{"answer":"A red car","timestamp":14.0}"#.into())])
                .await;

        let answer = server.api().ask(3, "What color is the car?").await.unwrap();
        assert_eq!(answer.answer, "A red car");
        assert_eq!(answer.timestamp, 14.0);

        let request = &server.requests()[0];
        assert!(request.starts_with("POST /api/videos/3/ask/ HTTP/1.1"));
        assert!(request.contains(r#"{"question":"What color is the car?"}"#));
    }

    #[tokio::test]
    async fn requests_upload_url_for_filename() {
        let server = CannedServer::start(vec![(
            200,
            r#"{"upload_url":"https://bucket.s3.amazonaws.com/videos/1-a.mp4?sig=x","file_url":"https://bucket.s3.amazonaws.com/videos/1-a.mp4"}"#.into(),
        )])
        .await;

        let target = server.api().request_upload_url("1-a.mp4").await.unwrap();
        assert_eq!(
            target.upload_url,
            "https://bucket.s3.amazonaws.com/videos/1-a.mp4?sig=x"
        );
        assert_eq!(target.file_url, "https://bucket.s3.amazonaws.com/videos/1-a.mp4");
        assert_eq!(target.bucket().as_deref(), Some("bucket"));

        let request = &server.requests()[0];
        assert!(request.starts_with("POST /api/videos/upload_url/ HTTP/1.1"));
        assert!(request.contains(r#"{"filename":"1-a.mp4"}"#));
    }

    #[tokio::test]
    async fn non_success_status_is_request_failed() {
        let server = CannedServer::start(vec![(500, r#"{"error":"boom"}"#.into())]).await;

        let err = server.api().request_upload_url("1-a.mp4").await.unwrap_err();
        match err {
            VideolangError::RequestFailed { status, body, endpoint } => {
                assert_eq!(status, 500);
                assert!(body.contains("boom"));
                assert!(endpoint.ends_with("/api/videos/upload_url/"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn clip_file(dir: &tempfile::TempDir, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join("a.mp4");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn put_object_streams_file_with_type_and_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = clip_file(&dir, b"rawbytes");
        let server = CannedServer::start(vec![(200, String::new())]).await;
        let target = UploadTarget {
            upload_url: format!("{}/videos/1-a.mp4?sig=x", server.base_url),
            file_url: "https://bucket.s3.amazonaws.com/videos/1-a.mp4".into(),
        };

        server
            .api()
            .put_object(&target, &path, "video/mp4")
            .await
            .unwrap();

        let request = &server.requests()[0];
        let lowered = request.to_ascii_lowercase();
        assert!(request.starts_with("PUT /videos/1-a.mp4?sig=x HTTP/1.1"));
        assert!(lowered.contains("content-type: video/mp4"));
        assert!(lowered.contains("content-length: 8"));
        assert!(request.ends_with("rawbytes"));
    }

    #[tokio::test]
    async fn storage_put_outlives_request_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = clip_file(&dir, b"slow");
        let server = CannedServer::start_delayed(
            vec![(200, String::new()), (200, "[]".into())],
            Duration::from_millis(400),
        )
        .await;

        let mut config = ClientConfig::default()
            .with_base_url(server.base_url.clone())
            .unwrap();
        config.request_timeout = Duration::from_millis(100);
        config.upload_timeout = Duration::from_secs(10);
        let http = Client::builder()
            .no_proxy()
            .timeout(config.request_timeout)
            .build()
            .unwrap();
        let api = HttpVideoApi::with_client(http, &config);

        let target = UploadTarget {
            upload_url: format!("{}/videos/1-a.mp4", server.base_url),
            file_url: String::new(),
        };
        api.put_object(&target, &path, "video/mp4").await.unwrap();

        let err = api.list_videos().await.unwrap_err();
        assert!(matches!(err, VideolangError::ApiError(ref e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn storage_rejection_is_reported() {
        let server = CannedServer::start(vec![(403, "SignatureDoesNotMatch".into())]).await;
        let target = UploadTarget {
            upload_url: format!("{}/videos/1-a.mp4", server.base_url),
            file_url: String::new(),
        };

        let dir = tempfile::tempdir().unwrap();
        let path = clip_file(&dir, &[1, 2, 3]);

        let err = server
            .api()
            .put_object(&target, &path, "video/mp4")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VideolangError::StorageUploadFailed { status: 403, .. }
        ));
    }

    #[tokio::test]
    async fn missing_video_maps_to_not_found() {
        let server = CannedServer::start(vec![(404, r#"{"detail":"Not found."}"#.into())]).await;

        let err = server.api().get_video(99).await.unwrap_err();
        assert!(matches!(err, VideolangError::VideoNotFound { id: 99 }));
    }

    #[tokio::test]
    async fn registers_video_record() {
        let server = CannedServer::start(vec![(201, VIDEO_JSON.into())]).await;

        let created = server
            .api()
            .create_video(&NewVideo {
                title: "clip.mp4".into(),
                file_url: "https://b.s3.amazonaws.com/videos/clip.mp4".into(),
            })
            .await
            .unwrap();
        assert_eq!(created.map(|v| v.id), Some(3));

        let request = &server.requests()[0];
        assert!(request.starts_with("POST /api/videos/ HTTP/1.1"));
        assert!(request.contains(r#""title":"clip.mp4""#));
    }

    #[tokio::test]
    async fn short_registration_reply_still_succeeds() {
        let server = CannedServer::start(vec![
            (201, r#"{"id":5,"title":"clip.mp4"}"#.into()),
            (201, String::new()),
        ])
        .await;
        let api = server.api();
        let new_video = NewVideo {
            title: "clip.mp4".into(),
            file_url: "https://b.s3.amazonaws.com/videos/clip.mp4".into(),
        };

        assert_eq!(api.create_video(&new_video).await.unwrap(), None);
        assert_eq!(api.create_video(&new_video).await.unwrap(), None);
    }

    #[tokio::test]
    async fn registration_rejection_is_request_failed() {
        let server = CannedServer::start(vec![(400, r#"{"title":["required"]}"#.into())]).await;

        let err = server
            .api()
            .create_video(&NewVideo {
                title: String::new(),
                file_url: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, VideolangError::RequestFailed { status: 400, .. }));
    }
}
