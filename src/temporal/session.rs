//! Session-keyed temporal state.
//!
//! Each client stream gets its own buffer and cooldown gate so frames from
//! one stream never enter another stream's history. The map itself is a
//! `DashMap`; each session sits behind its own mutex so an append and the
//! dynamic gate check that follows it happen under one lock.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::buffer::TemporalBuffer;
use crate::classifier::GateState;

/// Session used when a request does not name one.
pub const DEFAULT_SESSION: &str = "default";

/// Temporal state owned by a single session.
#[derive(Debug)]
pub struct SessionState {
    pub buffer: TemporalBuffer,
    pub gate: GateState,
    pub frames_seen: u64,
    last_seen: Instant,
}

impl SessionState {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: TemporalBuffer::new(capacity),
            gate: GateState::default(),
            frames_seen: 0,
            last_seen: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_seen.elapsed()
    }
}

/// Read-only view of a session for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub buffered_frames: usize,
    pub buffer_span_secs: f64,
    pub frames_seen: u64,
    pub last_dynamic_success: Option<f64>,
    pub idle_secs: f64,
}

/// Concurrent map of session id to temporal state.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Arc<Mutex<SessionState>>>,
    capacity: usize,
}

impl SessionStore {
    pub fn new(buffer_capacity: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            capacity: buffer_capacity,
        }
    }

    pub const fn buffer_capacity(&self) -> usize {
        self.capacity
    }

    fn session(&self, id: &str) -> Arc<Mutex<SessionState>> {
        if let Some(existing) = self.sessions.get(id) {
            return Arc::clone(existing.value());
        }
        let capacity = self.capacity;
        Arc::clone(
            self.sessions
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(SessionState::new(capacity))))
                .value(),
        )
    }

    /// Run `f` with exclusive access to the session, creating it if needed.
    ///
    /// The map shard guard is released before the session lock is taken.
    /// Eviction never removes a locked session, so membership is re-checked
    /// once the lock is held; a session evicted in between is recreated.
    pub fn with_session<R>(&self, id: &str, f: impl FnOnce(&mut SessionState) -> R) -> R {
        loop {
            let session = self.session(id);
            let mut guard = session.lock().unwrap_or_else(|e| e.into_inner());
            let live = self
                .sessions
                .get(id)
                .is_some_and(|current| Arc::ptr_eq(current.value(), &session));
            if !live {
                continue;
            }
            guard.touch();
            return f(&mut *guard);
        }
    }

    /// Empty one session's buffer. Returns false if the session never existed.
    pub fn clear(&self, id: &str) -> bool {
        let Some(session) = self.sessions.get(id).map(|s| Arc::clone(s.value())) else {
            return false;
        };
        let mut guard = session.lock().unwrap_or_else(|e| e.into_inner());
        guard.buffer.clear();
        guard.touch();
        true
    }

    /// Empty every session's buffer. Returns the number of sessions cleared.
    pub fn clear_all(&self) -> usize {
        let sessions: Vec<_> = self.sessions.iter().map(|s| Arc::clone(s.value())).collect();
        for session in &sessions {
            session.lock().unwrap_or_else(|e| e.into_inner()).buffer.clear();
        }
        sessions.len()
    }

    pub fn remove(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Drop sessions idle for at least `max_idle`. Sessions currently locked
    /// by a request are in use and are kept.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| match session.try_lock() {
            Ok(guard) => guard.idle_for() < max_idle,
            Err(_) => true,
        });
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn snapshot(&self, id: &str) -> Option<SessionSnapshot> {
        let session = self.sessions.get(id).map(|s| Arc::clone(s.value()))?;
        let guard = session.lock().unwrap_or_else(|e| e.into_inner());
        Some(SessionSnapshot {
            session_id: id.to_string(),
            buffered_frames: guard.buffer.len(),
            buffer_span_secs: guard.buffer.span(),
            frames_seen: guard.frames_seen,
            last_dynamic_success: guard.gate.last_success(),
            idle_secs: guard.idle_for().as_secs_f64(),
        })
    }

    pub fn snapshots(&self) -> Vec<SessionSnapshot> {
        let mut ids: Vec<String> = self.sessions.iter().map(|s| s.key().clone()).collect();
        ids.sort();
        ids.iter().filter_map(|id| self.snapshot(id)).collect()
    }
}

/// Periodically evict idle sessions until `cancel` fires.
pub async fn run_session_sweeper(
    store: Arc<SessionStore>,
    idle_timeout: Duration,
    sweep_interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(sweep_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!("Session sweeper stopping");
                break;
            }
            _ = ticker.tick() => {
                let evicted = store.evict_idle(idle_timeout);
                if evicted > 0 {
                    tracing::info!(
                        evicted,
                        remaining = store.len(),
                        "Evicted idle sessions"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{KeypointVector, KEYPOINT_LEN};

    fn kp(v: f64) -> KeypointVector {
        KeypointVector::from_array([v; KEYPOINT_LEN])
    }

    #[test]
    fn test_frames_never_land_in_evicted_sessions() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let store = Arc::new(SessionStore::new(30));
        let stop = Arc::new(AtomicBool::new(false));
        let sweeper = {
            let store = Arc::clone(&store);
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    store.evict_idle(Duration::ZERO);
                }
            })
        };

        for i in 0..2_000 {
            let in_map = store.with_session("cam", |s| {
                s.buffer.append(kp(1.0), f64::from(i));
                store.sessions.contains_key("cam")
            });
            assert!(in_map, "frame {i} was appended to an evicted session");
        }

        stop.store(true, Ordering::Relaxed);
        sweeper.join().unwrap();
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = SessionStore::new(30);
        store.with_session("a", |s| s.buffer.append(kp(1.0), 0.0));
        store.with_session("a", |s| s.buffer.append(kp(1.0), 0.1));
        store.with_session("b", |s| s.buffer.append(kp(2.0), 0.0));

        assert_eq!(store.len(), 2);
        assert_eq!(store.with_session("a", |s| s.buffer.len()), 2);
        assert_eq!(store.with_session("b", |s| s.buffer.len()), 1);
    }

    #[test]
    fn test_clear_only_touches_named_session() {
        let store = SessionStore::new(30);
        store.with_session("a", |s| s.buffer.append(kp(1.0), 0.0));
        store.with_session("b", |s| s.buffer.append(kp(1.0), 0.0));

        assert!(store.clear("a"));
        assert!(!store.clear("missing"));
        assert_eq!(store.with_session("a", |s| s.buffer.len()), 0);
        assert_eq!(store.with_session("b", |s| s.buffer.len()), 1);
    }

    #[test]
    fn test_clear_all_empties_every_buffer() {
        let store = SessionStore::new(30);
        for id in ["a", "b", "c"] {
            store.with_session(id, |s| s.buffer.append(kp(1.0), 0.0));
        }
        assert_eq!(store.clear_all(), 3);
        for id in ["a", "b", "c"] {
            assert!(store.with_session(id, |s| s.buffer.is_empty()));
        }
    }

    #[test]
    fn test_evict_idle_with_zero_timeout_drops_all() {
        let store = SessionStore::new(30);
        store.with_session("a", |_| ());
        store.with_session("b", |_| ());
        assert_eq!(store.evict_idle(Duration::ZERO), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_evict_idle_keeps_recent_sessions() {
        let store = SessionStore::new(30);
        store.with_session("a", |_| ());
        assert_eq!(store.evict_idle(Duration::from_secs(3600)), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_snapshot_reports_buffer_state() {
        let store = SessionStore::new(30);
        assert!(store.snapshot("a").is_none());
        store.with_session("a", |s| {
            s.buffer.append(kp(1.0), 1.0);
            s.buffer.append(kp(1.0), 1.5);
            s.frames_seen = 2;
        });
        let snap = store.snapshot("a").unwrap();
        assert_eq!(snap.buffered_frames, 2);
        assert_eq!(snap.buffer_span_secs, 0.5);
        assert_eq!(snap.frames_seen, 2);
        assert_eq!(snap.last_dynamic_success, None);
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_cancel() {
        let store = Arc::new(SessionStore::new(30));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_session_sweeper(
            Arc::clone(&store),
            Duration::from_secs(60),
            Duration::from_millis(10),
            cancel.clone(),
        ));
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
