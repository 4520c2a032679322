//! Exchange Scenarios - End-to-end Flows on the In-Memory Store
//!
//! Runs the exchange and sessions against `InMemoryStore` with a manual
//! clock: quotas across day boundaries, the full bottle lifecycle,
//! greeting hand-off, the beach window and concurrent catches.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use futures_util::future::join_all;
use tokio::sync::watch;

use treehole_bottles::adapters::memory::{InMemoryStore, ManualClock};
use treehole_bottles::adapters::metrics::MetricsRegistry;
use treehole_bottles::config::ExchangeSettings;
use treehole_bottles::domain::bottle::{BottleStatus, UserId};
use treehole_bottles::domain::conversation::ConversationStatus;
use treehole_bottles::domain::error::ExchangeError;
use treehole_bottles::domain::interaction::{PostCatchAction, View};
use treehole_bottles::domain::notification::NotificationKind;
use treehole_bottles::domain::quota::{DailyCounter, QuotaKind};
use treehole_bottles::ports::{BottleStore, NoopNotifier, QuotaStore};
use treehole_bottles::usecases::{BottleExchange, BottleSession, CatchResolution, ExchangePorts};

// ── Harness ─────────────────────────────────────────────────

struct Sea {
    store: Arc<InMemoryStore>,
    clock: Arc<ManualClock>,
    exchange: Arc<BottleExchange>,
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap()
}

fn user(name: &str) -> UserId {
    name.to_string()
}

impl Sea {
    fn new() -> Self {
        Self::with_settings(ExchangeSettings::default())
    }

    fn with_settings(settings: ExchangeSettings) -> Self {
        let (_tx, rx) = watch::channel(settings);
        Self::with_receiver(rx)
    }

    fn with_receiver(settings: watch::Receiver<ExchangeSettings>) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new(start()));
        let ports = ExchangePorts::from_backend(Arc::clone(&store)).with_clock(clock.clone());
        Self {
            exchange: Arc::new(BottleExchange::new(ports, settings)),
            store,
            clock,
        }
    }

    /// Throw a bottle and have a VIP picker draw it `picks` times.
    async fn bottle_with_picks(&self, creator: &str, picks: u32) -> String {
        let bottle = self
            .exchange
            .throw_bottle(&user(creator), "a message at sea", true)
            .await
            .unwrap();
        for _ in 0..picks {
            self.exchange
                .catch_bottle(&user("picker"), true)
                .await
                .unwrap();
        }
        bottle.id
    }
}

/// Quota store that yields before every call, like a network round trip.
struct SlowQuotas(Arc<InMemoryStore>);

#[async_trait]
impl QuotaStore for SlowQuotas {
    async fn get_counter(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> anyhow::Result<Option<DailyCounter>> {
        tokio::task::yield_now().await;
        self.0.get_counter(user_id, date).await
    }

    async fn increment_counter(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        kind: QuotaKind,
    ) -> anyhow::Result<DailyCounter> {
        tokio::task::yield_now().await;
        self.0.increment_counter(user_id, date, kind).await
    }

    async fn try_consume(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        kind: QuotaKind,
        limit: u32,
    ) -> anyhow::Result<Option<DailyCounter>> {
        tokio::task::yield_now().await;
        self.0.try_consume(user_id, date, kind, limit).await
    }

    async fn release(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        kind: QuotaKind,
    ) -> anyhow::Result<DailyCounter> {
        tokio::task::yield_now().await;
        self.0.release(user_id, date, kind).await
    }
}

/// An exchange over `store` whose quota calls interleave.
fn slow_quota_exchange(store: &Arc<InMemoryStore>) -> Arc<BottleExchange> {
    let ports = ExchangePorts {
        quotas: Arc::new(SlowQuotas(Arc::clone(store))),
        ..ExchangePorts::from_backend(Arc::clone(store))
            .with_clock(Arc::new(ManualClock::new(start())))
    };
    Arc::new(BottleExchange::with_settings(ports, ExchangeSettings::default()))
}

// ── Quotas ──────────────────────────────────────────────────

#[tokio::test]
async fn test_throw_quota_ceiling_and_vip_exemption() {
    let sea = Sea::new();
    let alice = user("alice");

    for i in 0..3 {
        sea.exchange
            .throw_bottle(&alice, &format!("bottle {i}"), false)
            .await
            .unwrap();
    }
    let err = sea
        .exchange
        .throw_bottle(&alice, "one too many", false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ExchangeError::QuotaExceeded {
            kind: QuotaKind::Throw,
            limit: 3
        }
    ));
    assert_eq!(sea.store.count_floating().await.unwrap(), 3);

    let vip = user("vip");
    for i in 0..10 {
        sea.exchange
            .throw_bottle(&vip, &format!("vip bottle {i}"), true)
            .await
            .unwrap();
    }
    assert_eq!(sea.store.count_floating().await.unwrap(), 13);

    let usage = sea.exchange.daily_usage(&vip, true).await.unwrap();
    assert_eq!(usage.throws, 10);
    assert_eq!(usage.throws_remaining, None);
}

#[tokio::test]
async fn test_catch_quota_counts_only_successful_catches() {
    let sea = Sea::new();
    let bob = user("bob");

    // Empty sea: informational, no counter movement
    let err = sea.exchange.catch_bottle(&bob, false).await.unwrap_err();
    assert!(matches!(err, ExchangeError::NothingToCatch));
    let usage = sea.exchange.daily_usage(&bob, false).await.unwrap();
    assert_eq!(usage.catches, 0);
    assert_eq!(usage.catches_remaining, Some(3));

    sea.exchange
        .throw_bottle(&user("alice"), "hello", false)
        .await
        .unwrap();
    for _ in 0..3 {
        sea.exchange.catch_bottle(&bob, false).await.unwrap();
    }
    let err = sea.exchange.catch_bottle(&bob, false).await.unwrap_err();
    assert!(matches!(
        err,
        ExchangeError::QuotaExceeded {
            kind: QuotaKind::Catch,
            limit: 3
        }
    ));
    assert_eq!(err.user_message(), "今天已捞满，开通VIP可无限");
}

#[tokio::test]
async fn test_quota_resets_on_the_next_day() {
    let sea = Sea::new();
    let alice = user("alice");

    for _ in 0..3 {
        sea.exchange.throw_bottle(&alice, "today", false).await.unwrap();
    }
    assert!(sea.exchange.throw_bottle(&alice, "today", false).await.is_err());

    sea.clock.advance(Duration::days(1));
    sea.exchange
        .throw_bottle(&alice, "tomorrow", false)
        .await
        .unwrap();

    let usage = sea.exchange.daily_usage(&alice, false).await.unwrap();
    assert_eq!(usage.date, (start() + Duration::days(1)).date_naive());
    assert_eq!(usage.throws, 1);
    assert_eq!(usage.throws_remaining, Some(2));
}

#[tokio::test]
async fn test_live_settings_change_the_limit() {
    let (tx, rx) = watch::channel(ExchangeSettings::default());
    let sea = Sea::with_receiver(rx);
    let alice = user("alice");

    sea.exchange.throw_bottle(&alice, "first", false).await.unwrap();

    let mut tighter = ExchangeSettings::default();
    tighter.quota.daily_throw_limit = 1;
    tx.send(tighter).unwrap();

    let err = sea
        .exchange
        .throw_bottle(&alice, "second", false)
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::QuotaExceeded { limit: 1, .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_throws_by_one_user_respect_the_limit() {
    let store = Arc::new(InMemoryStore::new());
    let exchange = slow_quota_exchange(&store);
    let alice = user("alice");

    let results = join_all((0..10).map(|i| {
        let exchange = Arc::clone(&exchange);
        let alice = alice.clone();
        tokio::spawn(async move {
            exchange
                .throw_bottle(&alice, &format!("bottle {i}"), false)
                .await
        })
    }))
    .await;

    let mut thrown = 0;
    for result in results {
        match result.unwrap() {
            Ok(_) => thrown += 1,
            Err(ExchangeError::QuotaExceeded {
                kind: QuotaKind::Throw,
                limit: 3,
            }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(thrown, 3);
    assert_eq!(store.count_floating().await.unwrap(), 3);
    let day = start().date_naive();
    let counter = store.get_counter(&alice, day).await.unwrap().unwrap();
    assert_eq!(counter.throws, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_catches_by_one_user_respect_the_limit() {
    let store = Arc::new(InMemoryStore::new());
    let exchange = slow_quota_exchange(&store);
    for i in 0..5 {
        exchange
            .throw_bottle(&user("alice"), &format!("bottle {i}"), true)
            .await
            .unwrap();
    }

    let bob = user("bob");
    let results = join_all((0..10).map(|_| {
        let exchange = Arc::clone(&exchange);
        let bob = bob.clone();
        tokio::spawn(async move { exchange.catch_bottle(&bob, false).await })
    }))
    .await;

    let mut caught = 0u32;
    let mut rejected = 0u32;
    let mut contended = 0u32;
    for result in results {
        match result.unwrap() {
            Ok(_) => caught += 1,
            Err(ExchangeError::QuotaExceeded { .. }) => rejected += 1,
            Err(ExchangeError::CatchContended { .. }) => contended += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    // A contended catch hands its unit back, so it may let one more through
    assert!(caught <= 3);
    assert!(rejected + contended >= 7);
    let usage = exchange.daily_usage(&bob, false).await.unwrap();
    assert_eq!(usage.catches, caught);
}

#[tokio::test]
async fn test_failed_catches_hand_their_quota_back() {
    let sea = Sea::new();
    let bob = user("bob");

    for _ in 0..5 {
        let err = sea.exchange.catch_bottle(&bob, false).await.unwrap_err();
        assert!(matches!(err, ExchangeError::NothingToCatch));
    }

    let usage = sea.exchange.daily_usage(&bob, false).await.unwrap();
    assert_eq!(usage.catches, 0);

    sea.exchange
        .throw_bottle(&user("alice"), "finally", false)
        .await
        .unwrap();
    sea.exchange.catch_bottle(&bob, false).await.unwrap();
    let usage = sea.exchange.daily_usage(&bob, false).await.unwrap();
    assert_eq!(usage.catches, 1);
}

#[tokio::test]
async fn test_prometheus_registry_as_exchange_telemetry() {
    let store = Arc::new(InMemoryStore::new());
    let metrics = Arc::new(MetricsRegistry::new().unwrap());
    let ports = ExchangePorts::from_backend(Arc::clone(&store)).with_telemetry(metrics.clone());
    let exchange = BottleExchange::with_settings(ports, ExchangeSettings::default());
    let alice = user("alice");

    for _ in 0..4 {
        let _ = exchange.throw_bottle(&alice, "counted", false).await;
    }
    let _ = exchange.catch_bottle(&alice, false).await;

    assert_eq!(metrics.thrown.get(), 3);
    assert_eq!(metrics.quota_rejections.with_label_values(&["throws"]).get(), 1);
    assert_eq!(metrics.empty_sea.get(), 1);
}

// ── Lifecycle ───────────────────────────────────────────────

#[tokio::test]
async fn test_own_bottles_are_never_caught() {
    let sea = Sea::new();
    let alice = user("alice");

    for _ in 0..3 {
        sea.exchange.throw_bottle(&alice, "mine", false).await.unwrap();
    }

    let err = sea.exchange.catch_bottle(&alice, true).await.unwrap_err();
    assert!(matches!(err, ExchangeError::NothingToCatch));
}

#[tokio::test]
async fn test_tenth_catch_returns_the_bottle() {
    let sea = Sea::new();
    let id = sea.bottle_with_picks("alice", 9).await;

    let caught = sea
        .exchange
        .catch_bottle(&user("carol"), false)
        .await
        .unwrap();

    assert_eq!(caught.detail.bottle.id, id);
    assert_eq!(caught.pick_number, 10);
    assert_eq!(caught.detail.bottle.status, BottleStatus::Returned);
    assert_eq!(caught.detail.bottle.returned_at, Some(start()));

    let err = sea
        .exchange
        .catch_bottle(&user("dave"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::NothingToCatch));

    let returned: Vec<_> = sea
        .store
        .notifications()
        .await
        .into_iter()
        .filter(|n| n.kind == NotificationKind::BottleReturned)
        .collect();
    assert_eq!(returned.len(), 1);
    assert_eq!(returned[0].user_id, "alice");
    assert_eq!(returned[0].reference_id.as_deref(), Some(id.as_str()));
}

#[tokio::test]
async fn test_pick_count_only_grows() {
    let sea = Sea::new();
    let id = sea.bottle_with_picks("alice", 0).await;

    let mut last = 0;
    for _ in 0..10 {
        let caught = sea.exchange.catch_bottle(&user("bob"), true).await.unwrap();
        assert_eq!(caught.pick_number, last + 1);
        last = caught.pick_number;
    }

    let bottle = sea.store.find_bottle(&id).await.unwrap().unwrap();
    assert_eq!(bottle.pick_count, 10);
    assert_eq!(bottle.status, BottleStatus::Returned);
}

// ── Replies and greeting ────────────────────────────────────

#[tokio::test]
async fn test_self_greet_writes_nothing() {
    let sea = Sea::new();
    let id = sea.bottle_with_picks("u1", 0).await;
    let u1 = user("u1");

    let err = sea
        .exchange
        .reply_and_greet(&u1, &id, &u1, "talk to me", 1)
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::SelfGreetRejected));
    assert_eq!(err.user_message(), "不能和自己打招呼");
    assert_eq!(sea.store.reply_count().await, 0);
    assert!(sea.store.conversations().await.is_empty());
}

#[tokio::test]
async fn test_reply_and_greet_hands_off_to_conversation() {
    let sea = Sea::new();
    let id = sea.bottle_with_picks("u1", 0).await;
    let u2 = user("u2");

    let caught = sea.exchange.catch_bottle(&u2, false).await.unwrap();
    assert_eq!(caught.detail.bottle.id, id);

    let resolution = sea
        .exchange
        .resolve_catch(&u2, &caught.ticket(), PostCatchAction::ReplyAndGreet, "hi there")
        .await
        .unwrap();

    let CatchResolution::Handoff {
        reply: Some(reply),
        conversation_id,
    } = resolution
    else {
        panic!("expected a hand-off with a reply, got {resolution:?}");
    };
    assert_eq!(reply.pick_number, 1);
    assert_eq!(reply.user_id, "u2");

    let conversations = sea.store.conversations().await;
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].id, conversation_id);
    assert_eq!(conversations[0].pair.user_a, "u1");
    assert_eq!(conversations[0].pair.user_b, "u2");
    assert_eq!(conversations[0].status, ConversationStatus::Stranger);
    assert_eq!(conversations[0].initiator_id.as_deref(), Some("u2"));

    // The creator greeting back lands in the same conversation
    let greeting = sea
        .exchange
        .reply_and_greet(&user("u1"), &id, &u2, "", 1)
        .await
        .unwrap();
    assert_eq!(greeting.conversation_id, conversation_id);
    assert!(greeting.reply.is_none());
    assert_eq!(sea.store.conversations().await.len(), 1);
}

#[tokio::test]
async fn test_throw_back_writes_nothing() {
    let sea = Sea::new();
    sea.bottle_with_picks("alice", 0).await;
    let bob = user("bob");

    let caught = sea.exchange.catch_bottle(&bob, false).await.unwrap();
    let resolution = sea
        .exchange
        .resolve_catch(&bob, &caught.ticket(), PostCatchAction::ThrowBack, "ignored")
        .await
        .unwrap();

    assert_eq!(resolution, CatchResolution::BackToSea { reply: None });
    assert_eq!(sea.store.reply_count().await, 0);
}

#[tokio::test]
async fn test_reply_notifies_creator_but_not_self() {
    let sea = Sea::new();
    let id = sea.bottle_with_picks("alice", 0).await;

    sea.exchange
        .reply_to_bottle(&id, &user("bob"), "nice bottle", 1)
        .await
        .unwrap();
    sea.exchange
        .reply_to_bottle(&id, &user("alice"), "thanks!", 1)
        .await
        .unwrap();

    let replies: Vec<_> = sea
        .store
        .notifications()
        .await
        .into_iter()
        .filter(|n| n.kind == NotificationKind::BottleReply)
        .collect();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].user_id, "alice");
    assert_eq!(replies[0].content.as_deref(), Some("nice bottle"));
}

#[tokio::test]
async fn test_silent_notifier_records_nothing() {
    let store = Arc::new(InMemoryStore::new());
    let ports = ExchangePorts::from_backend(Arc::clone(&store)).with_notifier(Arc::new(NoopNotifier));
    let exchange = BottleExchange::with_settings(ports, ExchangeSettings::default());

    let bottle = exchange
        .throw_bottle(&user("alice"), "quiet please", false)
        .await
        .unwrap();
    exchange
        .reply_to_bottle(&bottle.id, &user("bob"), "shh", 1)
        .await
        .unwrap();

    assert_eq!(store.reply_count().await, 1);
    assert!(store.notifications().await.is_empty());
}

#[tokio::test]
async fn test_catch_shows_names_and_thread_in_order() {
    let sea = Sea::new();
    sea.store.set_profile("alice", "Alice").await;
    sea.store.set_profile("bob", "Bob").await;
    let id = sea.bottle_with_picks("alice", 0).await;

    sea.exchange
        .reply_to_bottle(&id, &user("bob"), "first", 1)
        .await
        .unwrap();
    sea.clock.advance(Duration::minutes(5));
    sea.exchange
        .reply_to_bottle(&id, &user("nameless"), "second", 2)
        .await
        .unwrap();

    let caught = sea
        .exchange
        .catch_bottle(&user("carol"), false)
        .await
        .unwrap();

    assert_eq!(caught.detail.creator_name, "Alice");
    let thread: Vec<(&str, &str)> = caught
        .detail
        .replies
        .iter()
        .map(|r| (r.reply.content.as_str(), r.author_name.as_str()))
        .collect();
    assert_eq!(thread, vec![("first", "Bob"), ("second", "匿名")]);
}

// ── Beach ───────────────────────────────────────────────────

#[tokio::test]
async fn test_beach_shows_last_three_days_newest_first() {
    let sea = Sea::new();
    let alice = user("alice");

    sea.exchange.throw_bottle(&alice, "old", true).await.unwrap();
    sea.clock.advance(Duration::days(2));
    sea.exchange.throw_bottle(&alice, "middle", true).await.unwrap();
    sea.clock.advance(Duration::days(2));
    sea.exchange.throw_bottle(&alice, "new", true).await.unwrap();
    sea.exchange.throw_bottle(&user("bob"), "not mine", true).await.unwrap();

    let mine = sea.exchange.list_my_bottles(&alice).await.unwrap();
    let contents: Vec<&str> = mine.iter().map(|b| b.content.as_str()).collect();
    assert_eq!(contents, vec!["new", "middle"]);
}

#[tokio::test]
async fn test_bottle_detail_unknown_id() {
    let sea = Sea::new();
    let err = sea
        .exchange
        .bottle_detail(&"missing".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::BottleNotFound(_)));
}

// ── Concurrency ─────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_catches_never_lose_a_pick() {
    let sea = Sea::new();
    let id = sea.bottle_with_picks("alice", 0).await;

    let mut handles = Vec::new();
    for i in 0..30 {
        let exchange = Arc::clone(&sea.exchange);
        handles.push(tokio::spawn(async move {
            let catcher = format!("catcher-{i}");
            exchange.catch_bottle(&catcher, true).await
        }));
    }

    let mut caught = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => caught += 1,
            Err(ExchangeError::NothingToCatch | ExchangeError::CatchContended { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    let bottle = sea.store.find_bottle(&id).await.unwrap().unwrap();
    assert!(caught <= 10);
    assert_eq!(bottle.pick_count, caught);
    assert_eq!(bottle.status == BottleStatus::Returned, caught == 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_counter_increments_are_atomic() {
    let store = Arc::new(InMemoryStore::new());
    let day = start().date_naive();

    let mut handles = Vec::new();
    for _ in 0..50 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .increment_counter(&user("busy"), day, QuotaKind::Catch)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let counter = store.get_counter(&user("busy"), day).await.unwrap().unwrap();
    assert_eq!(counter.catches, 50);
    assert_eq!(counter.throws, 0);
}

// ── Session ─────────────────────────────────────────────────

#[tokio::test]
async fn test_session_walks_the_interaction() {
    let sea = Sea::new();
    sea.bottle_with_picks("alice", 0).await;

    let mut session = BottleSession::new(Arc::clone(&sea.exchange), "bob", false);
    session.load().await.unwrap();
    assert!(session.is_loaded());
    assert!(session.my_bottles().is_empty());
    assert_eq!(session.usage().unwrap().throws_remaining, Some(3));

    // Throwing needs the composer open first
    let err = session.throw("too early").await.unwrap_err();
    assert!(matches!(err, ExchangeError::InvalidTransition { .. }));

    session.begin_throw().unwrap();
    assert_eq!(session.view(), &View::ThrowCompose);
    session.throw("from bob").await.unwrap();
    assert_eq!(session.view(), &View::Main);
    assert_eq!(session.my_bottles().len(), 1);
    assert_eq!(session.usage().unwrap().throws, 1);

    // Resolving with nothing caught is refused
    let err = session
        .resolve(PostCatchAction::ThrowBack, "")
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::InvalidTransition { .. }));

    let caught = session.catch().await.unwrap();
    assert_eq!(caught.detail.bottle.creator_id, "alice");
    assert_eq!(session.view().name(), "catch_result");
    assert_eq!(session.usage().unwrap().catches, 1);

    // No second catch while one is held
    assert!(session.catch().await.is_err());

    session
        .resolve(PostCatchAction::ReplyAndThrowBack, "greetings from bob")
        .await
        .unwrap();
    assert_eq!(session.view(), &View::Main);
    assert!(session.current_catch().is_none());
    assert_eq!(sea.store.reply_count().await, 1);

    session.catch().await.unwrap();
    let resolution = session
        .resolve(PostCatchAction::ReplyAndGreet, "let's talk")
        .await
        .unwrap();
    let CatchResolution::Handoff {
        conversation_id, ..
    } = resolution
    else {
        panic!("expected hand-off");
    };
    assert_eq!(
        session.view(),
        &View::Handoff {
            conversation_id: conversation_id.clone()
        }
    );

    session.return_to_main();
    assert_eq!(session.view(), &View::Main);

    session.reset();
    assert!(!session.is_loaded());
    assert!(session.usage().is_none());
    assert!(session.my_bottles().is_empty());
}

#[tokio::test]
async fn test_session_cancel_leaves_composer() {
    let sea = Sea::new();
    let mut session = BottleSession::new(Arc::clone(&sea.exchange), "alice", false);

    assert!(session.cancel().is_err());
    session.begin_throw().unwrap();
    session.cancel().unwrap();
    assert_eq!(session.view(), &View::Main);
    assert_eq!(sea.store.count_floating().await.unwrap(), 0);
}
