use crate::*;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};

struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    fn new() -> Arc<Self> {
        Arc::new(Self(Mutex::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())))
    }

    fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

fn store_with(clock: Arc<ManualClock>) -> SessionStore {
    SessionStore::with_clock(SessionStoreConfig::default(), clock)
}

// ========== Append / History ==========

#[test]
fn test_append_creates_session() {
    let store = SessionStore::default();
    assert!(store.history("u1").is_empty());
    store.append("u1", Role::User, "hola");
    let history = store.history("u1");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].content, "hola");
}

#[test]
fn test_history_bounded_to_most_recent() {
    let store = SessionStore::default();
    for i in 0..25 {
        store.append("u1", Role::User, &format!("m{i}"));
    }
    let history = store.history("u1");
    assert_eq!(history.len(), 20);
    assert_eq!(history.first().unwrap().content, "m5");
    assert_eq!(history.last().unwrap().content, "m24");
}

#[test]
fn test_sessions_are_independent() {
    let store = SessionStore::default();
    store.append("a", Role::User, "uno");
    store.append("b", Role::User, "dos");
    store.append("b", Role::Assistant, "tres");
    assert_eq!(store.history("a").len(), 1);
    assert_eq!(store.history("b").len(), 2);
}

#[test]
fn test_expired_session_removed_on_read() {
    let clock = ManualClock::new();
    let store = store_with(clock.clone());
    store.append("u1", Role::User, "hola");
    clock.advance(Duration::minutes(31));

    assert!(store.history("u1").is_empty());
    assert_eq!(store.len(), 0);
    assert!(store.history("u1").is_empty());
}

#[test]
fn test_activity_keeps_session_alive() {
    let clock = ManualClock::new();
    let store = store_with(clock.clone());
    store.append("u1", Role::User, "hola");
    clock.advance(Duration::minutes(20));
    store.append("u1", Role::Assistant, "buen día");
    clock.advance(Duration::minutes(20));
    assert_eq!(store.history("u1").len(), 2);
}

#[test]
fn test_append_after_expiry_starts_fresh() {
    let clock = ManualClock::new();
    let store = store_with(clock.clone());
    store.append("u1", Role::User, "viejo");
    clock.advance(Duration::hours(1));
    store.append("u1", Role::User, "nuevo");
    let history = store.history("u1");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "nuevo");
}

// ========== Clear ==========

#[test]
fn test_clear() {
    let store = SessionStore::default();
    store.append("u1", Role::User, "hola");
    assert!(store.clear("u1"));
    assert!(!store.clear("u1"));
    assert!(!store.clear("nadie"));
    assert!(store.history("u1").is_empty());
}

// ========== Stats ==========

#[test]
fn test_stats_average() {
    let store = SessionStore::default();
    for i in 0..4 {
        store.append("a", Role::User, &format!("{i}"));
    }
    for i in 0..6 {
        store.append("b", Role::User, &format!("{i}"));
    }
    let stats = store.stats();
    assert_eq!(
        stats,
        SessionStats {
            active_sessions: 2,
            total_sessions: 2,
            total_messages: 10,
            average_messages_per_session: 5,
        }
    );
}

#[test]
fn test_stats_empty() {
    let stats = SessionStore::default().stats();
    assert_eq!(stats, SessionStats::default());
}

#[test]
fn test_stats_counts_expired_only_in_total() {
    let clock = ManualClock::new();
    let store = store_with(clock.clone());
    store.append("viejo", Role::User, "x");
    clock.advance(Duration::minutes(45));
    store.append("nuevo", Role::User, "y");
    store.append("nuevo", Role::Assistant, "z");

    let stats = store.stats();
    assert_eq!(stats.active_sessions, 1);
    assert_eq!(stats.total_sessions, 2);
    assert_eq!(stats.total_messages, 2);
    assert_eq!(stats.average_messages_per_session, 2);
}

#[test]
fn test_stats_serialize_camel_case() {
    let json = serde_json::to_value(SessionStats::default()).unwrap();
    assert!(json.get("activeSessions").is_some());
    assert!(json.get("averageMessagesPerSession").is_some());
}

// ========== Sweep ==========

#[test]
fn test_sweep_removes_only_expired() {
    let clock = ManualClock::new();
    let store = store_with(clock.clone());
    store.append("a", Role::User, "x");
    store.append("b", Role::User, "x");
    clock.advance(Duration::minutes(25));
    store.append("c", Role::User, "x");
    clock.advance(Duration::minutes(10));

    assert_eq!(store.sweep(), 2);
    assert_eq!(store.len(), 1);
    assert_eq!(store.history("c").len(), 1);
    assert_eq!(store.sweep(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_runs_and_stops() {
    let clock = ManualClock::new();
    let store = Arc::new(store_with(clock.clone()));
    store.append("u1", Role::User, "hola");
    clock.advance(Duration::hours(1));

    let handle = SweepHandle::spawn(store.clone(), std::time::Duration::from_secs(300));
    tokio::time::sleep(std::time::Duration::from_secs(301)).await;
    assert_eq!(store.len(), 0);

    let token = handle.token();
    handle.shutdown().await;
    assert!(token.is_cancelled());
}

// ========== Context formatting ==========

#[test]
fn test_format_context() {
    let store = SessionStore::default();
    store.append("u1", Role::User, "¿Dónde está la leche?");
    store.append("u1", Role::Assistant, "En la góndola 4.");
    assert_eq!(
        store.format_context("u1"),
        "Cliente: ¿Dónde está la leche?\nAsistente: En la góndola 4."
    );
}

#[test]
fn test_format_context_last_n() {
    let store = SessionStore::default();
    for i in 0..15 {
        store.append("u1", Role::User, &format!("m{i}"));
    }
    let context = store.format_context("u1");
    let lines: Vec<&str> = context.lines().collect();
    assert_eq!(lines.len(), 10);
    assert_eq!(lines[0], "Cliente: m5");
    assert_eq!(lines[9], "Cliente: m14");
}

#[test]
fn test_format_context_empty() {
    assert_eq!(SessionStore::default().format_context("nadie"), "");
}

// ========== Concurrency ==========

async fn join_within(handles: Vec<tokio::task::JoinHandle<()>>) {
    let all = async {
        for handle in handles {
            handle.await.unwrap();
        }
    };
    tokio::time::timeout(std::time::Duration::from_secs(10), all)
        .await
        .expect("appenders did not finish");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_all_land() {
    let store = Arc::new(SessionStore::new(SessionStoreConfig {
        max_turns: 50,
        ..Default::default()
    }));

    let mut handles = Vec::new();
    for task in 0..8 {
        let own = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            for i in 0..10 {
                own.append(&format!("cliente{task}"), Role::User, &format!("m{i}"));
                tokio::task::yield_now().await;
            }
        }));
    }
    for task in 0..4 {
        let shared = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            for i in 0..10 {
                shared.append("compartido", Role::User, &format!("t{task}-{i}"));
                tokio::task::yield_now().await;
            }
        }));
    }
    let sweeping = Arc::clone(&store);
    handles.push(tokio::spawn(async move {
        for _ in 0..50 {
            sweeping.sweep();
            sweeping.stats();
            tokio::task::yield_now().await;
        }
    }));
    join_within(handles).await;

    for task in 0..8 {
        let contents: Vec<String> = store
            .history(&format!("cliente{task}"))
            .into_iter()
            .map(|t| t.content)
            .collect();
        assert_eq!(contents, (0..10).map(|i| format!("m{i}")).collect::<Vec<_>>());
    }

    let shared = store.history("compartido");
    assert_eq!(shared.len(), 40);
    // turns interleave across tasks but each task's own order survives
    for task in 0..4 {
        let prefix = format!("t{task}-");
        let own: Vec<&str> = shared
            .iter()
            .filter_map(|t| t.content.strip_prefix(prefix.as_str()))
            .collect();
        assert_eq!(own, vec!["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]);
    }
    assert_eq!(store.stats().total_sessions, 9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_same_id_stay_bounded() {
    let store = Arc::new(SessionStore::default());
    let mut handles = Vec::new();
    for task in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            for i in 0..10 {
                let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
                store.append("compartido", role, &format!("t{task}-{i}"));
                tokio::task::yield_now().await;
            }
        }));
    }
    join_within(handles).await;

    assert_eq!(store.history("compartido").len(), store.config().max_turns);
    let stats = store.stats();
    assert_eq!(stats.total_sessions, 1);
    assert_eq!(stats.total_messages, 20);
}
