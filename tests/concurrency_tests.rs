//! Concurrency tests: engines share nothing mutable between calls, so
//! concurrent calls must agree with sequential ones.

use std::sync::Arc;

use tagmatch::{
    Event, InMemoryItemSource, MatchConfig, MatchEngine, MatchOrigin, MatchResult, StoredItem,
    TagInstance,
};
use tokio::task::JoinSet;

const JAN_15: i64 = 1_705_276_800;

fn collection(prefix: &str, topic: &str) -> Vec<StoredItem> {
    (0..20)
        .map(|i| StoredItem::new(format!("{prefix}-{i}"), format!("{topic} note {i}")))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_engines_fuzzy_match_independently() {
    let gardening = Arc::new(
        MatchEngine::new(
            InMemoryItemSource::new(collection("garden", "tomato seedlings")),
            MatchConfig::default(),
        )
        .unwrap(),
    );
    let finance = Arc::new(
        MatchEngine::new(
            InMemoryItemSource::new(collection("money", "invoice reminder")),
            MatchConfig::default(),
        )
        .unwrap(),
    );

    let mut tasks = JoinSet::new();
    for round in 0..16 {
        let engine = if round % 2 == 0 {
            Arc::clone(&gardening)
        } else {
            Arc::clone(&finance)
        };
        let text = if round % 2 == 0 {
            "tomato seedlings"
        } else {
            "invoice reminder"
        };
        tasks.spawn(async move {
            let result = engine.match_event(&Event::new(text, JAN_15)).await.unwrap();
            (round, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (round, result) = joined.unwrap();
        let prefix = if round % 2 == 0 { "garden-" } else { "money-" };
        assert_eq!(result.origin, MatchOrigin::Fuzzy);
        assert!(!result.is_empty());
        assert!(
            result.item_ids().iter().all(|id| id.starts_with(prefix)),
            "round {round} leaked hits from another engine: {:?}",
            result.item_ids()
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shared_engine_agrees_with_sequential_run() {
    let mut items = collection("n", "weekly groceries");
    items.push(
        StoredItem::new("rule", "Payments").with_tag(TagInstance::new("desc", "contains", "rent")),
    );
    let engine = Arc::new(
        MatchEngine::new(InMemoryItemSource::new(items), MatchConfig::default()).unwrap(),
    );

    let events = ["weekly groceries", "rent due", "weekly grocerys", "zzzz"];
    let mut expected: Vec<MatchResult> = Vec::new();
    for text in events {
        expected.push(engine.match_event(&Event::new(text, JAN_15)).await.unwrap());
    }

    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        for (idx, text) in events.iter().copied().enumerate() {
            let engine = Arc::clone(&engine);
            tasks.spawn(async move {
                (idx, engine.match_event(&Event::new(text, JAN_15)).await.unwrap())
            });
        }
    }

    while let Some(joined) = tasks.join_next().await {
        let (idx, result) = joined.unwrap();
        assert_eq!(result, expected[idx], "event {:?}", events[idx]);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn edits_during_matching_are_seen_as_whole_snapshots() {
    let source = InMemoryItemSource::new(Vec::new());
    let engine = Arc::new(MatchEngine::new(source.clone(), MatchConfig::default()).unwrap());

    let writer = {
        let source = source.clone();
        tokio::spawn(async move {
            for i in 0..50 {
                source
                    .upsert(
                        StoredItem::new(format!("w{i}"), format!("item {i}"))
                            .with_tag(TagInstance::new("desc", "contains", "ping")),
                    )
                    .await;
                tokio::task::yield_now().await;
            }
        })
    };

    let mut readers = JoinSet::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        readers.spawn(async move {
            let mut last = 0;
            for _ in 0..20 {
                let result = engine.match_event(&Event::new("ping", JAN_15)).await.unwrap();
                assert!(result.is_empty() || result.origin == MatchOrigin::Rule);
                last = result.len();
            }
            last
        });
    }

    writer.await.unwrap();
    while let Some(joined) = readers.join_next().await {
        assert!(joined.unwrap() <= 50);
    }
    let final_result = engine.match_event(&Event::new("ping", JAN_15)).await.unwrap();
    assert_eq!(final_result.len(), 50);
}
