// Remote optimizer integration tests with fake compression services

use super::test_harness::write_picture;
use async_trait::async_trait;
use image::Rgb;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;
use watermark_me::optimizer::{CompressionQuota, CompressionService, OptimizeError, Optimizer};
use watermark_me::retry::RetryPolicy;
use watermark_me::watermark::{apply_watermarks, Color, WatermarkRequest, WatermarkStyle};

/// Halves the file and bumps the shared quota, like the real service.
struct HalvingService {
    quota: CompressionQuota,
    calls: AtomicU32,
}

impl HalvingService {
    fn new(quota: CompressionQuota) -> Self {
        Self {
            quota,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl CompressionService for HalvingService {
    async fn compress(&self, source: &Path, output: &Path) -> Result<(), OptimizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let data = fs::read(source)?;
        fs::write(output, &data[..data.len() / 2])?;
        self.quota.set(self.quota.used() + 1);
        Ok(())
    }

    async fn validate_key(&self, _key: &str) -> Result<(), OptimizeError> {
        Ok(())
    }
}

/// Fails every call with a transient error.
#[derive(Default)]
struct FlakyService {
    calls: AtomicU32,
    connection_errors: bool,
}

#[async_trait]
impl CompressionService for FlakyService {
    async fn compress(&self, _source: &Path, _output: &Path) -> Result<(), OptimizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.connection_errors {
            Err(OptimizeError::Connection("connection reset".into()))
        } else {
            Err(OptimizeError::from_status(502, "bad gateway"))
        }
    }

    async fn validate_key(&self, _key: &str) -> Result<(), OptimizeError> {
        Err(OptimizeError::Connection("offline".into()))
    }
}

/// Answers every call with the same unexpected status.
struct StatusService {
    status: u16,
    calls: AtomicU32,
}

#[async_trait]
impl CompressionService for StatusService {
    async fn compress(&self, _source: &Path, _output: &Path) -> Result<(), OptimizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(OptimizeError::from_status(self.status, "unexpected"))
    }

    async fn validate_key(&self, _key: &str) -> Result<(), OptimizeError> {
        Ok(())
    }
}

fn watermarked_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("photo-w.jpg");
    fs::write(&path, vec![7u8; 100]).unwrap();
    path
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(3)]
#[case(5)]
#[tokio::test]
async fn test_transient_failures_use_exactly_the_budget(#[case] budget: u32) {
    let dir = TempDir::new().unwrap();
    let file = watermarked_file(&dir);
    let optimizer = Optimizer::new(
        FlakyService::default(),
        CompressionQuota::default(),
        RetryPolicy::default(),
    );

    let output = optimizer.optimize_with_budget(&file, budget).await.unwrap();

    assert!(output.is_none());
    assert_eq!(optimizer.service().calls.load(Ordering::SeqCst), budget + 1);
    // The watermarked file is left alone
    assert!(file.exists());
}

#[rstest]
#[case(304)]
#[case(415)]
#[tokio::test]
async fn test_non_server_statuses_are_not_retried(#[case] status: u16) {
    let dir = TempDir::new().unwrap();
    let file = watermarked_file(&dir);
    let service = StatusService {
        status,
        calls: AtomicU32::new(0),
    };
    let optimizer = Optimizer::new(service, CompressionQuota::default(), RetryPolicy::default());

    let result = optimizer.optimize(&file).await;

    assert!(matches!(result, Err(OptimizeError::Client { .. })));
    assert_eq!(optimizer.service().calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_default_budget_is_three_retries() {
    let dir = TempDir::new().unwrap();
    let file = watermarked_file(&dir);
    let service = FlakyService {
        connection_errors: true,
        ..Default::default()
    };
    let optimizer = Optimizer::new(service, CompressionQuota::default(), RetryPolicy::default());

    assert!(optimizer.optimize(&file).await.unwrap().is_none());
    assert_eq!(optimizer.service().calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_backoff_is_applied_between_attempts() {
    let dir = TempDir::new().unwrap();
    let file = watermarked_file(&dir);
    let optimizer = Optimizer::new(
        FlakyService::default(),
        CompressionQuota::default(),
        RetryPolicy::new(2, 20, 100),
    );

    let started = std::time::Instant::now();
    assert!(optimizer.optimize(&file).await.unwrap().is_none());

    // 20ms + 40ms of backoff
    assert!(started.elapsed() >= std::time::Duration::from_millis(60));
}

#[tokio::test]
async fn test_quota_over_ceiling_prevents_calls() {
    let dir = TempDir::new().unwrap();
    let file = watermarked_file(&dir);
    let quota = CompressionQuota::new(501);
    let optimizer = Optimizer::new(
        HalvingService::new(quota.clone()),
        quota,
        RetryPolicy::default(),
    );

    assert!(optimizer.optimize(&file).await.unwrap().is_none());
    assert_eq!(optimizer.service().calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_quota_reaching_ceiling_during_batch() {
    let dir = TempDir::new().unwrap();
    let quota = CompressionQuota::new(500);
    let optimizer = Optimizer::new(
        HalvingService::new(quota.clone()),
        quota.clone(),
        RetryPolicy::default(),
    );

    let first = dir.path().join("a-w.jpg");
    let second = dir.path().join("b-w.jpg");
    fs::write(&first, b"aaaa").unwrap();
    fs::write(&second, b"bbbb").unwrap();

    // 500 is still within the quota, the call brings it to 501
    assert!(optimizer.optimize(&first).await.unwrap().is_some());
    assert_eq!(quota.used(), 501);
    assert!(optimizer.optimize(&second).await.unwrap().is_none());
    assert_eq!(optimizer.service().calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_optimize_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let file = watermarked_file(&dir);
    let quota = CompressionQuota::default();
    let optimizer = Optimizer::new(
        HalvingService::new(quota.clone()),
        quota,
        RetryPolicy::default(),
    );

    let first = optimizer.optimize(&file).await.unwrap();
    let second = optimizer.optimize(&file).await.unwrap();

    assert_eq!(first, Some(dir.path().join("photo-wo.jpg")));
    assert_eq!(first, second);
    assert_eq!(optimizer.service().calls.load(Ordering::SeqCst), 1);
    assert_eq!(fs::read(dir.path().join("photo-wo.jpg")).unwrap().len(), 50);
}

#[tokio::test]
async fn test_validate_key_never_raises() {
    let optimizer = Optimizer::new(
        FlakyService::default(),
        CompressionQuota::default(),
        RetryPolicy::default(),
    );

    assert!(!optimizer.validate_key("").await);
    assert!(!optimizer.validate_key("some-key").await);
}

#[tokio::test]
async fn test_watermark_then_optimize_pipeline() {
    let dir = TempDir::new().unwrap();
    write_picture(dir.path(), "one.png", 32, 32, Rgb([200, 100, 50]));
    write_picture(dir.path(), "two.png", 32, 32, Rgb([50, 100, 200]));

    let request = WatermarkRequest {
        paths: vec![dir.path().to_path_buf()],
        text: String::new(),
        picture: None,
        style: WatermarkStyle {
            opacity: 0.25,
            font: PathBuf::from("/nonexistent/font.ttf"),
            color: Color::white(),
        },
        extensions: vec!["png".to_string()],
    };

    let quota = CompressionQuota::default();
    let optimizer = Optimizer::new(
        HalvingService::new(quota.clone()),
        quota.clone(),
        RetryPolicy::default(),
    );

    let mut optimized = Vec::new();
    for result in apply_watermarks(&request) {
        let watermarked = result.unwrap().output.unwrap();
        optimized.push(optimizer.optimize(&watermarked).await.unwrap().unwrap());
    }
    optimized.sort();

    assert_eq!(
        optimized,
        vec![dir.path().join("one-wo.jpg"), dir.path().join("two-wo.jpg")]
    );
    assert_eq!(quota.used(), 2);
}
