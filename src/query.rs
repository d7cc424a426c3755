//! Data-synchronization layer: cached async queries with tag-based invalidation.
//!
//! Inspired by RTK Query, this module provides a process-wide [`QueryClient`]
//! holding one cache of read results keyed by (operation name, serialized
//! arguments). Each cached entry carries one or more entity [`Tag`]s; a
//! [`Mutation`] declares which tags it invalidates, and every cached read
//! under those tags is purged when the mutation succeeds. Mounted queries
//! notice the purge on their next poll and transparently re-fetch.
//!
//! # Example
//!
//! ```ignore
//! let client = QueryClient::new();
//! let api = api.clone();
//! let mut query = Query::new(
//!     client.clone(),
//!     QueryKey::new("blogs", &(page, 5)),
//!     &[Tag::Blogs],
//!     move || {
//!         let api = api.clone();
//!         async move { api.list_blogs(page, 5).await.map_err(|e| e.to_string()) }
//!     },
//! );
//! query.fetch();
//!
//! // In the event loop tick:
//! if query.poll() {
//!     // State changed, re-render
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::debug;

/// Entity-kind label attached to cached reads and declared by mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
  About,
  Blogs,
  Projects,
  Experiences,
  Educations,
}

/// Identifies one cached read result: operation name plus serialized arguments.
#[derive(Debug, Clone)]
pub struct QueryKey {
  op: &'static str,
  hash: String,
}

impl QueryKey {
  /// Build a key from an operation name and its arguments.
  ///
  /// Arguments are serialized to JSON and hashed together with the operation
  /// name, so any `Serialize` argument tuple yields a stable, fixed-length key.
  pub fn new<A: Serialize>(op: &'static str, args: &A) -> Self {
    let args = serde_json::to_string(args).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(op.as_bytes());
    hasher.update(b":");
    hasher.update(args.as_bytes());
    let hash = hex::encode(hasher.finalize());
    Self { op, hash }
  }

  pub fn op(&self) -> &'static str {
    self.op
  }
}

/// Outcome of a network fetch, in serialized form so that concurrent
/// subscribers with distinct `Query` instances can share one request.
type FetchOutcome = Result<serde_json::Value, String>;

struct CacheEntry {
  value: serde_json::Value,
  tags: Vec<Tag>,
  cached_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
  entries: HashMap<String, CacheEntry>,
  /// Subscribers waiting on an in-flight fetch, keyed by cache key.
  in_flight: HashMap<String, Vec<mpsc::UnboundedSender<FetchOutcome>>>,
  /// Bumped per tag on invalidation; queries compare snapshots to detect purges.
  generations: HashMap<Tag, u64>,
}

/// Process-wide cache of read results plus the write-invalidation protocol.
///
/// Cheap to clone; all clones share one cache.
#[derive(Clone, Default)]
pub struct QueryClient {
  inner: Arc<Mutex<Inner>>,
}

impl QueryClient {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    // A poisoned cache is still structurally valid; recover rather than panic
    self.inner.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Purge every cached entry carrying any of `tags` and bump their
  /// generations so mounted queries re-fetch on their next poll.
  pub fn invalidate(&self, tags: &[Tag]) {
    let mut inner = self.lock();
    let before = inner.entries.len();
    inner
      .entries
      .retain(|_, entry| !entry.tags.iter().any(|t| tags.contains(t)));
    let purged = before - inner.entries.len();
    for tag in tags {
      *inner.generations.entry(*tag).or_insert(0) += 1;
    }
    debug!(?tags, purged, "cache invalidated");
  }

  /// Spawn a write operation. On success the declared tags are invalidated
  /// *before* the result is delivered, so the caller's next read of those
  /// tags observes fresh data. A failed write invalidates nothing.
  pub fn mutation<T, Fut>(&self, tags: &[Tag], fut: Fut) -> Mutation<T>
  where
    T: Send + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    let (tx, rx) = mpsc::unbounded_channel();
    let client = self.clone();
    let tags = tags.to_vec();
    tokio::spawn(async move {
      let result = fut.await;
      if result.is_ok() {
        client.invalidate(&tags);
      }
      // Ignore send errors - the caller may have navigated away
      let _ = tx.send(result);
    });
    Mutation {
      receiver: rx,
      done: false,
    }
  }

  /// Snapshot of the combined generation for a tag set.
  fn generation(&self, tags: &[Tag]) -> u64 {
    let inner = self.lock();
    tags
      .iter()
      .map(|t| inner.generations.get(t).copied().unwrap_or(0))
      .sum()
  }

  fn cached(&self, hash: &str) -> Option<serde_json::Value> {
    let inner = self.lock();
    inner.entries.get(hash).map(|entry| {
      debug!(cached_at = %entry.cached_at, "cache hit");
      entry.value.clone()
    })
  }

  /// Register interest in a fetch for `hash`. Returns `true` if a request is
  /// already in flight (the subscriber was attached to it), `false` if the
  /// caller was registered as the first subscriber and must spawn the fetch.
  fn subscribe(&self, hash: &str, tx: mpsc::UnboundedSender<FetchOutcome>) -> bool {
    let mut inner = self.lock();
    match inner.in_flight.get_mut(hash) {
      Some(subscribers) => {
        subscribers.push(tx);
        true
      }
      None => {
        inner.in_flight.insert(hash.to_string(), vec![tx]);
        false
      }
    }
  }

  /// Complete an in-flight fetch: store the result (success only) and fan it
  /// out to every subscriber.
  fn complete(&self, hash: &str, tags: &[Tag], outcome: FetchOutcome) {
    let subscribers = {
      let mut inner = self.lock();
      if let Ok(value) = &outcome {
        inner.entries.insert(
          hash.to_string(),
          CacheEntry {
            value: value.clone(),
            tags: tags.to_vec(),
            cached_at: Utc::now(),
          },
        );
      }
      inner.in_flight.remove(hash).unwrap_or_default()
    };
    for tx in subscribers {
      let _ = tx.send(outcome.clone());
    }
  }
}

/// Visible state of a query for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  /// No data yet, fetch in progress
  Loading,
  /// Data present (a background re-fetch may still be running)
  Success,
  /// Last fetch failed; data may still reflect a prior success
  Error,
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;
type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// A cached read operation owned by a view.
///
/// `fetch()` consults the shared cache first; `poll()` drains the async
/// result in the event-loop tick and re-fetches when the entry's tags have
/// been invalidated since the last fetch.
pub struct Query<T> {
  client: QueryClient,
  key: QueryKey,
  tags: Vec<Tag>,
  fetcher: FetcherFn<T>,
  data: Option<T>,
  error: Option<String>,
  fetching: bool,
  receiver: Option<mpsc::UnboundedReceiver<FetchOutcome>>,
  seen_generation: u64,
}

impl<T> Query<T>
where
  T: Serialize + DeserializeOwned + Send + 'static,
{
  pub fn new<F, Fut>(client: QueryClient, key: QueryKey, tags: &[Tag], fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      client,
      key,
      tags: tags.to_vec(),
      fetcher: Box::new(move || Box::pin(fetcher())),
      data: None,
      error: None,
      fetching: false,
      receiver: None,
      seen_generation: 0,
    }
  }

  pub fn data(&self) -> Option<&T> {
    self.data.as_ref()
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  /// True while a fetch is running and no data has arrived yet.
  pub fn is_loading(&self) -> bool {
    self.fetching && self.data.is_none()
  }

  pub fn is_fetching(&self) -> bool {
    self.fetching
  }

  pub fn status(&self) -> QueryStatus {
    if self.error.is_some() {
      QueryStatus::Error
    } else if self.data.is_some() {
      QueryStatus::Success
    } else {
      QueryStatus::Loading
    }
  }

  /// Start the query: serve from cache when possible, otherwise fetch.
  pub fn fetch(&mut self) {
    if self.fetching {
      return;
    }
    self.seen_generation = self.client.generation(&self.tags);
    if let Some(value) = self.client.cached(&self.key.hash) {
      if let Ok(data) = serde_json::from_value::<T>(value) {
        self.data = Some(data);
        self.error = None;
        return;
      }
      // Undecodable entry (schema drift); fall through to the network
    }
    self.start();
  }

  /// Force a network fetch, bypassing the cache. Joins an in-flight request
  /// for the same key rather than issuing a second one.
  pub fn refetch(&mut self) {
    self.receiver = None;
    self.fetching = false;
    self.seen_generation = self.client.generation(&self.tags);
    self.start();
  }

  /// Drain a pending result and react to tag invalidation.
  ///
  /// Returns `true` if the visible state changed. Call from the view's tick.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;

    if let Some(receiver) = &mut self.receiver {
      match receiver.try_recv() {
        Ok(Ok(value)) => {
          match serde_json::from_value::<T>(value) {
            Ok(data) => {
              self.data = Some(data);
              self.error = None;
            }
            Err(e) => self.error = Some(format!("invalid response payload: {}", e)),
          }
          self.fetching = false;
          self.receiver = None;
          changed = true;
        }
        // A failed read keeps any previous data in place
        Ok(Err(error)) => {
          self.error = Some(error);
          self.fetching = false;
          self.receiver = None;
          changed = true;
        }
        Err(mpsc::error::TryRecvError::Empty) => {}
        Err(mpsc::error::TryRecvError::Disconnected) => {
          self.error = Some("request was cancelled".to_string());
          self.fetching = false;
          self.receiver = None;
          changed = true;
        }
      }
    }

    // The cache under our tags was purged by a mutation: re-fetch.
    if !self.fetching {
      let generation = self.client.generation(&self.tags);
      if generation != self.seen_generation {
        self.seen_generation = generation;
        self.start();
        changed = true;
      }
    }

    changed
  }

  fn start(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.fetching = true;

    if self.client.subscribe(&self.key.hash, tx) {
      // Someone else is already fetching this key; ride along
      return;
    }

    let future = (self.fetcher)();
    let client = self.client.clone();
    let hash = self.key.hash.clone();
    let tags = self.tags.clone();
    tokio::spawn(async move {
      let outcome = match future.await {
        Ok(data) => serde_json::to_value(&data).map_err(|e| e.to_string()),
        Err(e) => Err(e),
      };
      client.complete(&hash, &tags, outcome);
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("op", &self.key.op)
      .field("tags", &self.tags)
      .field("fetching", &self.fetching)
      .field("data", &self.data)
      .field("error", &self.error)
      .finish_non_exhaustive()
  }
}

/// A write operation in flight. Poll from the view's tick; the single result
/// is delivered exactly once.
pub struct Mutation<T> {
  receiver: mpsc::UnboundedReceiver<Result<T, String>>,
  done: bool,
}

impl<T> Mutation<T> {
  pub fn poll(&mut self) -> Option<Result<T, String>> {
    if self.done {
      return None;
    }
    match self.receiver.try_recv() {
      Ok(result) => {
        self.done = true;
        Some(result)
      }
      Err(mpsc::error::TryRecvError::Empty) => None,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.done = true;
        Some(Err("request was cancelled".to_string()))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::time::Duration;

  fn counting_query(
    client: &QueryClient,
    key: QueryKey,
    counter: Arc<AtomicU32>,
  ) -> Query<Vec<u32>> {
    Query::new(client.clone(), key, &[Tag::Blogs], move || {
      let counter = counter.clone();
      async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok::<Vec<u32>, String>(vec![1, 2, 3])
      }
    })
  }

  async fn settle<T: Serialize + DeserializeOwned + Send + 'static>(query: &mut Query<T>) {
    for _ in 0..50 {
      tokio::time::sleep(Duration::from_millis(5)).await;
      if query.poll() {
        return;
      }
    }
  }

  #[tokio::test]
  async fn test_fetch_success() {
    let client = QueryClient::new();
    let counter = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(&client, QueryKey::new("blogs", &(1, 5)), counter.clone());

    assert_eq!(query.status(), QueryStatus::Loading);
    query.fetch();
    assert!(query.is_loading());

    settle(&mut query).await;
    assert_eq!(query.status(), QueryStatus::Success);
    assert_eq!(query.data(), Some(&vec![1, 2, 3]));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_cache_hit_skips_network() {
    let client = QueryClient::new();
    let counter = Arc::new(AtomicU32::new(0));
    let key = QueryKey::new("blogs", &(1, 5));

    let mut first = counting_query(&client, key.clone(), counter.clone());
    first.fetch();
    settle(&mut first).await;

    let mut second = counting_query(&client, key, counter.clone());
    second.fetch();
    // Served synchronously from cache, no network round trip
    assert_eq!(second.data(), Some(&vec![1, 2, 3]));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_concurrent_reads_share_one_request() {
    let client = QueryClient::new();
    let counter = Arc::new(AtomicU32::new(0));
    let key = QueryKey::new("blogs", &(1, 5));

    let mut a = counting_query(&client, key.clone(), counter.clone());
    let mut b = counting_query(&client, key, counter.clone());
    a.fetch();
    b.fetch();

    settle(&mut a).await;
    settle(&mut b).await;
    assert_eq!(a.data(), Some(&vec![1, 2, 3]));
    assert_eq!(b.data(), Some(&vec![1, 2, 3]));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_invalidation_triggers_refetch() {
    let client = QueryClient::new();
    let counter = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(&client, QueryKey::new("blogs", &(1, 5)), counter.clone());
    query.fetch();
    settle(&mut query).await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    client.invalidate(&[Tag::Blogs]);
    // Next poll notices the purged tag and re-fetches
    assert!(query.poll());
    settle(&mut query).await;
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert_eq!(query.data(), Some(&vec![1, 2, 3]));
  }

  #[tokio::test]
  async fn test_invalidation_ignores_other_tags() {
    let client = QueryClient::new();
    let counter = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(&client, QueryKey::new("blogs", &(1, 5)), counter.clone());
    query.fetch();
    settle(&mut query).await;

    client.invalidate(&[Tag::Projects]);
    assert!(!query.poll());
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_failed_read_keeps_previous_data() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicU32::new(0));
    let calls_in_fetcher = calls.clone();
    let mut query: Query<Vec<u32>> = Query::new(
      client.clone(),
      QueryKey::new("blogs", &(1, 5)),
      &[Tag::Blogs],
      move || {
        let calls = calls_in_fetcher.clone();
        async move {
          if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok::<Vec<u32>, String>(vec![7])
          } else {
            Err("network down".to_string())
          }
        }
      },
    );

    query.fetch();
    settle(&mut query).await;
    assert_eq!(query.data(), Some(&vec![7]));

    query.refetch();
    settle(&mut query).await;
    assert_eq!(query.error(), Some("network down"));
    // Stale data still visible alongside the error
    assert_eq!(query.data(), Some(&vec![7]));
    assert_eq!(query.status(), QueryStatus::Error);
  }

  #[tokio::test]
  async fn test_successful_mutation_invalidates() {
    let client = QueryClient::new();
    let counter = Arc::new(AtomicU32::new(0));
    let key = QueryKey::new("blogs", &(1, 5));
    let mut query = counting_query(&client, key.clone(), counter.clone());
    query.fetch();
    settle(&mut query).await;

    let mut mutation = client.mutation(&[Tag::Blogs], async { Ok::<_, String>(()) });
    loop {
      tokio::time::sleep(Duration::from_millis(5)).await;
      if mutation.poll().is_some() {
        break;
      }
    }

    // The purge happened before the mutation result was delivered
    let mut fresh = counting_query(&client, key, counter.clone());
    fresh.fetch();
    settle(&mut fresh).await;
    assert_eq!(counter.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_failed_mutation_invalidates_nothing() {
    let client = QueryClient::new();
    let counter = Arc::new(AtomicU32::new(0));
    let key = QueryKey::new("blogs", &(1, 5));
    let mut query = counting_query(&client, key.clone(), counter.clone());
    query.fetch();
    settle(&mut query).await;

    let mut mutation: Mutation<()> =
      client.mutation(&[Tag::Blogs], async { Err("rejected".to_string()) });
    loop {
      tokio::time::sleep(Duration::from_millis(5)).await;
      if let Some(result) = mutation.poll() {
        assert_eq!(result, Err("rejected".to_string()));
        break;
      }
    }

    let mut again = counting_query(&client, key, counter.clone());
    again.fetch();
    // Cache entry survived the failed write
    assert_eq!(again.data(), Some(&vec![1, 2, 3]));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn test_query_key_stability() {
    let a = QueryKey::new("blogs", &(1, 5));
    let b = QueryKey::new("blogs", &(1, 5));
    let c = QueryKey::new("blogs", &(2, 5));
    assert_eq!(a.hash, b.hash);
    assert_ne!(a.hash, c.hash);
    assert_ne!(QueryKey::new("projects", &(1, 5)).hash, a.hash);
  }
}
