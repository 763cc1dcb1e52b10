use super::*;
use crate::db::Database;
use crate::resolver::StreamUrl;
use crate::types::UserId;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;

const LINK: &str = "https://terabox.com/s/1abcDEF";
const STREAM: &str = "https://cdn.example/stream/1abcDEF.m3u8";

// -----------------------------------------------------------------------------
// Fakes
// -----------------------------------------------------------------------------

enum Behavior {
    Succeed(&'static str),
    Fail(ResolveError),
    Panic,
}

struct FakeResolver {
    behavior: Behavior,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, String)>>,
}

impl FakeResolver {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Resolver for FakeResolver {
    async fn resolve(&self, link: &str, identifier: &str) -> Result<StreamUrl, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((link.to_string(), identifier.to_string()));
        match &self.behavior {
            Behavior::Succeed(url) => Ok(StreamUrl(url.to_string())),
            Behavior::Fail(e) => Err(e.clone()),
            Behavior::Panic => panic!("resolver exploded"),
        }
    }
}

#[async_trait]
impl Resolver for Arc<FakeResolver> {
    async fn resolve(&self, link: &str, identifier: &str) -> Result<StreamUrl, ResolveError> {
        (**self).resolve(link, identifier).await
    }
}

/// Store that counts writes and can be told to fail or stall
#[derive(Default)]
struct FakeStore {
    touches: AtomicUsize,
    upserts: AtomicUsize,
    fail_upsert: bool,
    stall: Option<Duration>,
}

impl FakeStore {
    fn writes(&self) -> usize {
        self.touches.load(Ordering::SeqCst) + self.upserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn touch_user(&self, _user_id: UserId, _username: Option<&str>) -> crate::Result<()> {
        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
        }
        self.touches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upsert_video(
        &self,
        _user_id: UserId,
        _original_url: &str,
        _stream_url: &str,
    ) -> crate::Result<()> {
        if self.fail_upsert {
            return Err(Error::Database(crate::error::DatabaseError::QueryFailed(
                "disk full".to_string(),
            )));
        }
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn pipeline<R: Resolver, S: RecordStore>(resolver: R, store: S) -> IntakePipeline<R, S> {
    IntakePipeline::new(
        LinkValidator::new(["terabox.com", "www.terabox.com"]),
        resolver,
        store,
        Duration::from_secs(5),
    )
}

fn message(text: &str) -> InboundMessage {
    InboundMessage::new(42, Some("alice".to_string()), text)
}

// -----------------------------------------------------------------------------
// Validation
// -----------------------------------------------------------------------------

#[tokio::test]
async fn test_disallowed_host_never_reaches_resolver_or_store() {
    let resolver = Arc::new(FakeResolver::new(Behavior::Succeed(STREAM)));
    let pipeline = pipeline(resolver.clone(), Arc::new(FakeStore::default()));

    let outcome = pipeline
        .handle(&message("https://example.com/s/1abc"))
        .await;

    assert_eq!(outcome, IntakeOutcome::InvalidUrl);
    assert_eq!(outcome.reply(), REPLY_INVALID_URL);
    assert_eq!(resolver.calls(), 0);
    assert_eq!(pipeline.store().writes(), 0);
}

#[tokio::test]
async fn test_allowed_host_without_share_token_is_invalid() {
    let resolver = Arc::new(FakeResolver::new(Behavior::Succeed(STREAM)));
    let pipeline = pipeline(resolver.clone(), Arc::new(FakeStore::default()));

    let outcome = pipeline.handle(&message("https://terabox.com/home")).await;

    assert_eq!(outcome, IntakeOutcome::InvalidUrl);
    assert_eq!(resolver.calls(), 0);
    assert_eq!(pipeline.store().writes(), 0);
}

#[tokio::test]
async fn test_plain_text_is_invalid() {
    let resolver = Arc::new(FakeResolver::new(Behavior::Succeed(STREAM)));
    let pipeline = pipeline(resolver.clone(), FakeStore::default());

    let outcome = pipeline.handle(&message("hello there")).await;

    assert_eq!(outcome, IntakeOutcome::InvalidUrl);
    assert_eq!(resolver.calls(), 0);
}

#[tokio::test]
async fn test_surrounding_whitespace_is_trimmed_before_validation() {
    let resolver = Arc::new(FakeResolver::new(Behavior::Succeed(STREAM)));
    let pipeline = pipeline(resolver.clone(), FakeStore::default());

    let outcome = pipeline.handle(&message(&format!("  {}\n", LINK))).await;

    assert!(outcome.is_success());
    let seen = resolver.seen.lock().unwrap();
    assert_eq!(seen[0], (LINK.to_string(), "1abcDEF".to_string()));
}

// -----------------------------------------------------------------------------
// Resolution
// -----------------------------------------------------------------------------

#[tokio::test]
async fn test_success_writes_user_and_video_once() {
    let resolver = Arc::new(FakeResolver::new(Behavior::Succeed(STREAM)));
    let pipeline = pipeline(resolver.clone(), FakeStore::default());

    let outcome = pipeline.handle(&message(LINK)).await;

    assert_eq!(
        outcome,
        IntakeOutcome::Success {
            stream_url: STREAM.to_string()
        }
    );
    assert_eq!(outcome.reply(), REPLY_SUCCESS);
    assert_eq!(resolver.calls(), 1);
    assert_eq!(pipeline.store().touches.load(Ordering::SeqCst), 1);
    assert_eq!(pipeline.store().upserts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_resolution_failure_writes_nothing() {
    let resolver = Arc::new(FakeResolver::new(Behavior::Fail(ResolveError::Status(500))));
    let pipeline = pipeline(resolver.clone(), FakeStore::default());

    let outcome = pipeline.handle(&message(LINK)).await;

    assert_eq!(
        outcome,
        IntakeOutcome::ResolutionFailed(ResolveError::Status(500))
    );
    assert_eq!(outcome.reply(), REPLY_RESOLUTION_FAILED);
    assert_eq!(pipeline.store().writes(), 0);
}

#[tokio::test]
async fn test_resolver_timeout_is_a_resolution_failure() {
    let resolver = FakeResolver::new(Behavior::Fail(ResolveError::Timeout(
        Duration::from_secs(10),
    )));
    let pipeline = pipeline(resolver, FakeStore::default());

    let outcome = pipeline.handle(&message(LINK)).await;

    assert!(matches!(
        outcome,
        IntakeOutcome::ResolutionFailed(ResolveError::Timeout(_))
    ));
}

// -----------------------------------------------------------------------------
// Persistence
// -----------------------------------------------------------------------------

#[tokio::test]
async fn test_store_failure_is_persistence_failed() {
    let store = FakeStore {
        fail_upsert: true,
        ..Default::default()
    };
    let pipeline = pipeline(FakeResolver::new(Behavior::Succeed(STREAM)), store);

    let outcome = pipeline.handle(&message(LINK)).await;

    assert_eq!(outcome, IntakeOutcome::PersistenceFailed);
    assert_eq!(outcome.reply(), REPLY_PERSISTENCE_FAILED);
}

#[tokio::test]
async fn test_stalled_store_times_out() {
    let store = FakeStore {
        stall: Some(Duration::from_secs(3)),
        ..Default::default()
    };
    let pipeline = IntakePipeline::new(
        LinkValidator::new(["terabox.com"]),
        FakeResolver::new(Behavior::Succeed(STREAM)),
        store,
        Duration::from_millis(50),
    );

    let outcome = pipeline.handle(&message(LINK)).await;

    assert_eq!(outcome, IntakeOutcome::PersistenceFailed);
    assert_eq!(pipeline.store().upserts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_resubmission_replaces_stored_stream() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Arc::new(Database::new(temp_file.path()).await.unwrap());

    let first = pipeline(FakeResolver::new(Behavior::Succeed("https://cdn/old")), db.clone());
    assert!(first.handle(&message(LINK)).await.is_success());

    let second = pipeline(FakeResolver::new(Behavior::Succeed("https://cdn/new")), db.clone());
    assert!(second.handle(&message(LINK)).await.is_success());

    assert_eq!(db.count_user_videos(UserId(42), LINK).await.unwrap(), 1);
    let record = db.get_video(UserId(42), LINK).await.unwrap().unwrap();
    assert_eq!(record.processed_url, "https://cdn/new");

    let user = db.get_user(UserId(42)).await.unwrap().unwrap();
    assert_eq!(user.username.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_stored_link_is_the_trimmed_text() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Arc::new(Database::new(temp_file.path()).await.unwrap());
    let pipeline = pipeline(FakeResolver::new(Behavior::Succeed(STREAM)), db.clone());

    assert!(pipeline.handle(&message(&format!("\t{}  ", LINK))).await.is_success());

    let videos = db.list_user_videos(UserId(42)).await.unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].original_url, LINK);
}

#[tokio::test]
async fn test_closed_database_is_persistence_failed() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    db.pool().close().await;

    let pipeline = pipeline(FakeResolver::new(Behavior::Succeed(STREAM)), db);

    assert_eq!(
        pipeline.handle(&message(LINK)).await,
        IntakeOutcome::PersistenceFailed
    );
}

// -----------------------------------------------------------------------------
// Faults
// -----------------------------------------------------------------------------

#[tokio::test]
async fn test_panicking_resolver_is_internal_fault() {
    let pipeline = pipeline(FakeResolver::new(Behavior::Panic), FakeStore::default());

    let outcome = pipeline.handle(&message(LINK)).await;

    assert_eq!(outcome, IntakeOutcome::InternalFault);
    assert_eq!(outcome.reply(), REPLY_INTERNAL_FAULT);
    assert_eq!(pipeline.store().writes(), 0);
}

#[tokio::test]
async fn test_pipeline_keeps_working_after_a_fault() {
    let resolver = Arc::new(FakeResolver::new(Behavior::Panic));
    let pipeline = pipeline(resolver.clone(), FakeStore::default());

    assert_eq!(
        pipeline.handle(&message(LINK)).await,
        IntakeOutcome::InternalFault
    );
    assert_eq!(
        pipeline.handle(&message("not a link")).await,
        IntakeOutcome::InvalidUrl
    );
    assert_eq!(resolver.calls(), 1);
}

#[test]
fn test_replies_are_distinct_per_outcome() {
    let replies = [
        REPLY_SUCCESS,
        REPLY_INVALID_URL,
        REPLY_RESOLUTION_FAILED,
        REPLY_PERSISTENCE_FAILED,
        REPLY_INTERNAL_FAULT,
    ];
    for (i, a) in replies.iter().enumerate() {
        for b in &replies[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_failure_replies_leak_no_detail() {
    let outcome = IntakeOutcome::ResolutionFailed(ResolveError::Connect(
        "tcp connect error: 10.0.0.1:443".to_string(),
    ));
    assert!(!outcome.reply().contains("10.0.0.1"));
    assert_eq!(outcome.kind(), "resolution_failed");
}
