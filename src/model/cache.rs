//! On-disk model cache with lazy, cancellable provisioning.
//!
//! [`ModelCache`] owns the models directory. Presence is a pure filesystem
//! check; [`ensure_downloaded`](ModelCache::ensure_downloaded) is idempotent
//! and streams missing variants from a [`ModelSource`] in chunks, reporting
//! cumulative bytes after each one.
//!
//! Bytes never stream directly into the canonical path. They go into a
//! unique temp file in the same directory, persisted by atomic rename only
//! after the transfer completes, so `is_present` can never observe a
//! truncated model and concurrent downloads of the same variant cannot
//! corrupt each other.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::cancel::CancelToken;
use crate::model::variant::ModelVariant;

// ---------------------------------------------------------------------------
// DownloadProgress
// ---------------------------------------------------------------------------

/// One progress report from an in-flight model download.
///
/// `bytes` is cumulative and strictly increasing within a download. `total`
/// is present only when the remote transfer exposed its size; callers that
/// want a percentage must check for `None` rather than assume one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Cumulative bytes transferred so far.
    pub bytes: u64,
    /// Total transfer size, when the source knows it.
    pub total: Option<u64>,
}

// ---------------------------------------------------------------------------
// DownloadError
// ---------------------------------------------------------------------------

/// Failure modes of a model download.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The run was cancelled mid-transfer.
    #[error("model download cancelled")]
    Cancelled,

    /// The remote source refused or dropped the transfer.
    #[error("model download failed: {0}")]
    Http(String),

    /// Local filesystem failure while writing the model file.
    #[error("model file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// ModelSource / ModelStream capability traits
// ---------------------------------------------------------------------------

/// An open byte stream for one model file.
#[async_trait]
pub trait ModelStream: Send {
    /// Total size of the transfer, when the source knows it up front.
    fn total_bytes(&self) -> Option<u64>;

    /// Next chunk of bytes, or `None` when the transfer is complete.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, DownloadError>;
}

/// Capability for opening model downloads, keyed by variant.
#[async_trait]
pub trait ModelSource: Send + Sync {
    /// Begin a transfer of the given variant's model file.
    async fn open(&self, variant: ModelVariant) -> Result<Box<dyn ModelStream>, DownloadError>;
}

// ---------------------------------------------------------------------------
// HttpModelSource
// ---------------------------------------------------------------------------

/// Streams GGML model files from the whisper.cpp Hugging Face repository.
///
/// The HTTP client is injected by the composition root so every network
/// component in the process shares one connection pool.
#[derive(Debug, Clone)]
pub struct HttpModelSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpModelSource {
    /// Default distribution source for GGML Whisper models.
    pub const DEFAULT_BASE_URL: &'static str =
        "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, Self::DEFAULT_BASE_URL)
    }

    /// Override the distribution URL (mirrors, test servers).
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url_for(&self, variant: ModelVariant) -> String {
        // Remote files keep the upstream ggml naming; the local canonical
        // name is applied by the cache.
        format!("{}/ggml-{}.bin", self.base_url, variant.slug())
    }
}

#[async_trait]
impl ModelSource for HttpModelSource {
    async fn open(&self, variant: ModelVariant) -> Result<Box<dyn ModelStream>, DownloadError> {
        let url = self.url_for(variant);
        log::debug!("model download: GET {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DownloadError::Http(e.to_string()))?;

        let total = response.content_length();
        Ok(Box::new(HttpModelStream { response, total }))
    }
}

struct HttpModelStream {
    response: reqwest::Response,
    total: Option<u64>,
}

#[async_trait]
impl ModelStream for HttpModelStream {
    fn total_bytes(&self) -> Option<u64> {
        self.total
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>, DownloadError> {
        self.response
            .chunk()
            .await
            .map_err(|e| DownloadError::Http(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// ModelCache
// ---------------------------------------------------------------------------

/// Manages the directory of downloaded speech model files.
///
/// Cheap to clone; safe to share across concurrent runs. The pipeline never
/// deletes model files — a completed download is the only mutation.
#[derive(Clone)]
pub struct ModelCache {
    models_dir: PathBuf,
    source: Arc<dyn ModelSource>,
}

impl std::fmt::Debug for ModelCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCache")
            .field("models_dir", &self.models_dir)
            .finish_non_exhaustive()
    }
}

impl ModelCache {
    pub fn new(models_dir: impl Into<PathBuf>, source: Arc<dyn ModelSource>) -> Self {
        Self {
            models_dir: models_dir.into(),
            source,
        }
    }

    /// Directory the cache writes model files into.
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Canonical path for a variant's model file
    /// (`models_dir/model-<variant>.bin`).
    pub fn model_path(&self, variant: ModelVariant) -> PathBuf {
        self.models_dir.join(variant.file_name())
    }

    /// Returns `true` if the variant's model file exists on disk.
    pub fn is_present(&self, variant: ModelVariant) -> bool {
        self.model_path(variant).exists()
    }

    /// Download the variant's model file unless it is already present.
    ///
    /// Idempotent: when the file exists this returns immediately without
    /// touching the network. `progress` is invoked synchronously after each
    /// chunk with cumulative byte counts; it must not block.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::Cancelled`] — `cancel` fired mid-transfer.
    /// - [`DownloadError::Http`] — the source refused or dropped the stream.
    /// - [`DownloadError::Io`] — local filesystem failure.
    ///
    /// On any error the canonical path is left untouched.
    pub async fn ensure_downloaded<F>(
        &self,
        variant: ModelVariant,
        progress: F,
        cancel: &CancelToken,
    ) -> Result<(), DownloadError>
    where
        F: Fn(DownloadProgress),
    {
        let dest = self.model_path(variant);
        if dest.exists() {
            log::debug!("model {variant} already present at {}", dest.display());
            return Ok(());
        }

        if cancel.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }

        tokio::fs::create_dir_all(&self.models_dir).await?;

        let mut stream = self.source.open(variant).await?;
        let total = stream.total_bytes();

        // Unique temp file in the destination directory, so the final
        // persist is a same-filesystem atomic rename. Dropping the TempPath
        // on any early return removes the partial file.
        let tmp = tempfile::Builder::new()
            .prefix("model-")
            .suffix(".part")
            .tempfile_in(&self.models_dir)?;
        let (file, tmp_path) = tmp.into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut transferred: u64 = 0;
        loop {
            let chunk = tokio::select! {
                _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
                chunk = stream.next_chunk() => chunk?,
            };
            let Some(chunk) = chunk else { break };

            file.write_all(&chunk).await?;
            transferred += chunk.len() as u64;
            progress(DownloadProgress {
                bytes: transferred,
                total,
            });
        }

        file.flush().await?;
        drop(file);

        tmp_path.persist(&dest).map_err(|e| DownloadError::Io(e.error))?;
        log::info!(
            "model {variant} downloaded ({transferred} bytes) to {}",
            dest.display()
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use tempfile::tempdir;

    use super::*;

    /// Source that serves fixed chunks and counts how often it is opened.
    struct FixedSource {
        chunks: Vec<Vec<u8>>,
        total: Option<u64>,
        opens: AtomicUsize,
    }

    impl FixedSource {
        fn new(chunks: Vec<Vec<u8>>) -> Self {
            let total = chunks.iter().map(|c| c.len() as u64).sum();
            Self {
                chunks,
                total: Some(total),
                opens: AtomicUsize::new(0),
            }
        }

        fn without_total(mut self) -> Self {
            self.total = None;
            self
        }

        fn open_count(&self) -> usize {
            self.opens.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelSource for FixedSource {
        async fn open(
            &self,
            _variant: ModelVariant,
        ) -> Result<Box<dyn ModelStream>, DownloadError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FixedStream {
                chunks: self.chunks.clone(),
                total: self.total,
                next: 0,
            }))
        }
    }

    struct FixedStream {
        chunks: Vec<Vec<u8>>,
        total: Option<u64>,
        next: usize,
    }

    #[async_trait]
    impl ModelStream for FixedStream {
        fn total_bytes(&self) -> Option<u64> {
            self.total
        }

        async fn next_chunk(&mut self) -> Result<Option<Bytes>, DownloadError> {
            if self.next >= self.chunks.len() {
                return Ok(None);
            }
            let chunk = Bytes::from(self.chunks[self.next].clone());
            self.next += 1;
            Ok(Some(chunk))
        }
    }

    /// Stream that cancels the given token after yielding one chunk,
    /// simulating a user abort mid-transfer.
    struct CancellingSource {
        cancel: CancelToken,
    }

    #[async_trait]
    impl ModelSource for CancellingSource {
        async fn open(
            &self,
            _variant: ModelVariant,
        ) -> Result<Box<dyn ModelStream>, DownloadError> {
            Ok(Box::new(CancellingStream {
                cancel: self.cancel.clone(),
                yielded: false,
            }))
        }
    }

    struct CancellingStream {
        cancel: CancelToken,
        yielded: bool,
    }

    #[async_trait]
    impl ModelStream for CancellingStream {
        fn total_bytes(&self) -> Option<u64> {
            None
        }

        async fn next_chunk(&mut self) -> Result<Option<Bytes>, DownloadError> {
            if !self.yielded {
                self.yielded = true;
                return Ok(Some(Bytes::from_static(b"partial data")));
            }
            self.cancel.cancel();
            // The select! in the download loop observes the token before
            // this pending chunk would resolve.
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    /// Source whose stream fails after the first chunk.
    struct FailingSource;

    #[async_trait]
    impl ModelSource for FailingSource {
        async fn open(
            &self,
            _variant: ModelVariant,
        ) -> Result<Box<dyn ModelStream>, DownloadError> {
            Ok(Box::new(FailingStream { yielded: false }))
        }
    }

    struct FailingStream {
        yielded: bool,
    }

    #[async_trait]
    impl ModelStream for FailingStream {
        fn total_bytes(&self) -> Option<u64> {
            Some(1_000)
        }

        async fn next_chunk(&mut self) -> Result<Option<Bytes>, DownloadError> {
            if !self.yielded {
                self.yielded = true;
                return Ok(Some(Bytes::from_static(b"first chunk")));
            }
            Err(DownloadError::Http("connection reset".into()))
        }
    }

    fn no_progress(_: DownloadProgress) {}

    // ---- presence and paths ---

    #[test]
    fn model_path_uses_canonical_naming() {
        let cache = ModelCache::new("/models", Arc::new(FixedSource::new(vec![])));
        assert_eq!(
            cache.model_path(ModelVariant::Base),
            PathBuf::from("/models/model-base.bin")
        );
    }

    #[test]
    fn is_present_false_for_empty_dir() {
        let dir = tempdir().expect("temp dir");
        let cache = ModelCache::new(dir.path(), Arc::new(FixedSource::new(vec![])));
        assert!(!cache.is_present(ModelVariant::Tiny));
    }

    // ---- ensure_downloaded ---

    #[tokio::test]
    async fn download_writes_all_chunks_to_canonical_path() {
        let dir = tempdir().expect("temp dir");
        let source = Arc::new(FixedSource::new(vec![b"abc".to_vec(), b"defg".to_vec()]));
        let cache = ModelCache::new(dir.path(), source);
        let cancel = CancelToken::new();

        cache
            .ensure_downloaded(ModelVariant::Base, no_progress, &cancel)
            .await
            .expect("download should succeed");

        let written = std::fs::read(cache.model_path(ModelVariant::Base)).unwrap();
        assert_eq!(written, b"abcdefg");
        assert!(cache.is_present(ModelVariant::Base));
    }

    #[tokio::test]
    async fn progress_is_cumulative_and_strictly_increasing() {
        let dir = tempdir().expect("temp dir");
        let source = Arc::new(FixedSource::new(vec![
            b"aa".to_vec(),
            b"bbb".to_vec(),
            b"c".to_vec(),
        ]));
        let cache = ModelCache::new(dir.path(), source);
        let cancel = CancelToken::new();

        let seen = Mutex::new(Vec::<DownloadProgress>::new());
        cache
            .ensure_downloaded(
                ModelVariant::Small,
                |p| seen.lock().unwrap().push(p),
                &cancel,
            )
            .await
            .unwrap();

        let seen = seen.into_inner().unwrap();
        let counts: Vec<u64> = seen.iter().map(|p| p.bytes).collect();
        assert_eq!(counts, vec![2, 5, 6]);
        assert!(seen.iter().all(|p| p.total == Some(6)));
    }

    #[tokio::test]
    async fn unknown_total_is_reported_as_none() {
        let dir = tempdir().expect("temp dir");
        let source = Arc::new(FixedSource::new(vec![b"data".to_vec()]).without_total());
        let cache = ModelCache::new(dir.path(), source);
        let cancel = CancelToken::new();

        let seen = Mutex::new(Vec::new());
        cache
            .ensure_downloaded(ModelVariant::Tiny, |p| seen.lock().unwrap().push(p), &cancel)
            .await
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].bytes, 4);
        assert_eq!(seen[0].total, None);
    }

    #[tokio::test]
    async fn second_call_is_a_no_op() {
        let dir = tempdir().expect("temp dir");
        let source = Arc::new(FixedSource::new(vec![b"model bytes".to_vec()]));
        let cache = ModelCache::new(dir.path(), Arc::clone(&source) as Arc<dyn ModelSource>);
        let cancel = CancelToken::new();

        cache
            .ensure_downloaded(ModelVariant::Base, no_progress, &cancel)
            .await
            .unwrap();
        cache
            .ensure_downloaded(ModelVariant::Base, no_progress, &cancel)
            .await
            .unwrap();

        // Idempotency: the source was only opened for the first call.
        assert_eq!(source.open_count(), 1);
    }

    #[tokio::test]
    async fn cancelled_download_leaves_no_file_behind() {
        let dir = tempdir().expect("temp dir");
        let cancel = CancelToken::new();
        let source = Arc::new(CancellingSource {
            cancel: cancel.clone(),
        });
        let cache = ModelCache::new(dir.path(), source);

        let err = cache
            .ensure_downloaded(ModelVariant::Base, no_progress, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Cancelled));
        assert!(!cache.is_present(ModelVariant::Base));
        // The temp file must be gone too.
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn failed_stream_leaves_no_file_behind() {
        let dir = tempdir().expect("temp dir");
        let cache = ModelCache::new(dir.path(), Arc::new(FailingSource));
        let cancel = CancelToken::new();

        let err = cache
            .ensure_downloaded(ModelVariant::Medium, no_progress, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Http(_)));
        assert!(!cache.is_present(ModelVariant::Medium));
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn pre_cancelled_token_skips_the_network() {
        let dir = tempdir().expect("temp dir");
        let source = Arc::new(FixedSource::new(vec![b"data".to_vec()]));
        let cache = ModelCache::new(dir.path(), Arc::clone(&source) as Arc<dyn ModelSource>);
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = cache
            .ensure_downloaded(ModelVariant::Base, no_progress, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Cancelled));
        assert_eq!(source.open_count(), 0);
    }

    // ---- HttpModelSource ---

    #[test]
    fn http_source_builds_ggml_urls() {
        let source = HttpModelSource::new(reqwest::Client::new());
        assert_eq!(
            source.url_for(ModelVariant::Base),
            format!("{}/ggml-base.bin", HttpModelSource::DEFAULT_BASE_URL)
        );
    }
}
