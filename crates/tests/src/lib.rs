//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置 -> 中继 -> HTTP 的完整链路
//! - 并发提交与拉取下的不变量
//! - 队列满后调度器的存活性

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_default_config_is_loadable() {
        let config = config_loader::ConfigLoader::load_from_str("", config_loader::ConfigFormat::Toml)
            .unwrap();
        assert_eq!(config.version, contracts::ConfigVersion::V1);
        assert_eq!(config.queue.capacity, contracts::DEFAULT_QUEUE_CAPACITY);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use config_loader::{ConfigFormat, ConfigLoader};
    use dispatcher::{create_relay, RelayHandle};
    use tokio::time::{sleep, timeout};
    use tower::ServiceExt;

    const CONFIG: &str = r#"
[queue]
capacity = 2

[rate_limit]
max_requests_per_second = 100000
"#;

    fn start(content: &str) -> (RelayHandle, Router) {
        let config = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        let (relay, dispatcher) = create_relay(config.queue.capacity).unwrap();
        dispatcher.spawn();
        let app = gateway::router(relay.clone(), &config).unwrap();
        (relay, app)
    }

    async fn settle(relay: &RelayHandle, expected: u64) {
        timeout(Duration::from_secs(5), async {
            while relay.metrics().processed() < expected {
                sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("dispatcher did not settle");
    }

    async fn post(app: &Router, source: &str, body: String) -> StatusCode {
        app.clone()
            .oneshot(
                Request::post(format!("/wh/{source}"))
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    async fn drain(app: &Router, source: &str) -> Vec<String> {
        let response = app
            .clone()
            .oneshot(
                Request::get(format!("/messages/{source}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Capacity 2: a, b kept, c dropped; queue reusable after drain.
    #[tokio::test]
    async fn test_e2e_capacity_scenario() {
        let (relay, app) = start(CONFIG);

        for body in ["a", "b", "c"] {
            assert_eq!(post(&app, "agent1", body.to_string()).await, StatusCode::OK);
        }
        settle(&relay, 3).await;

        assert_eq!(drain(&app, "agent1").await, vec!["a", "b"]);
        assert!(drain(&app, "agent1").await.is_empty());

        post(&app, "agent1", "d".to_string()).await;
        settle(&relay, 4).await;
        assert_eq!(drain(&app, "agent1").await, vec!["d"]);

        let snapshot = relay.metrics();
        assert_eq!(snapshot.submitted, 4);
        assert_eq!(snapshot.dropped, 1);
        assert_eq!(snapshot.drained, 3);
    }

    /// A drop on one source must not stall any other source.
    #[tokio::test]
    async fn test_e2e_liveness_after_drop() {
        let (relay, app) = start(CONFIG);

        for i in 0..5 {
            post(&app, "noisy", format!("n{i}")).await;
        }
        post(&app, "quiet", "q0".to_string()).await;
        settle(&relay, 6).await;

        assert_eq!(drain(&app, "quiet").await, vec!["q0"]);
        assert_eq!(drain(&app, "noisy").await, vec!["n0", "n1"]);

        post(&app, "noisy", "n5".to_string()).await;
        settle(&relay, 7).await;
        assert_eq!(drain(&app, "noisy").await, vec!["n5"]);
    }

    /// Concurrent producers and pollers: no loss, no duplicates, no cross-talk.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_e2e_concurrent_exactly_once() {
        const SOURCES: usize = 4;
        const PER_SOURCE: usize = 250;

        let (relay, app) = start(
            r#"
[queue]
capacity = 1000

[rate_limit]
max_requests_per_second = 100000
"#,
        );

        let producers: Vec<_> = (0..SOURCES)
            .map(|s| {
                let app = app.clone();
                tokio::spawn(async move {
                    for i in 0..PER_SOURCE {
                        post(&app, &format!("src{s}"), format!("src{s}-{i}")).await;
                    }
                })
            })
            .collect();

        let pollers: Vec<_> = (0..SOURCES)
            .flat_map(|s| (0..2).map(move |_| s))
            .map(|s| {
                let app = app.clone();
                let relay = relay.clone();
                tokio::spawn(async move {
                    let mut got = Vec::new();
                    let expected = (SOURCES * PER_SOURCE) as u64;
                    loop {
                        let done = relay.metrics().processed() >= expected;
                        let batch = drain(&app, &format!("src{s}")).await;
                        got.extend(batch);
                        if done && relay.depth(&format!("src{s}")) == 0 {
                            break;
                        }
                        tokio::task::yield_now().await;
                    }
                    (s, got)
                })
            })
            .collect();

        for producer in producers {
            producer.await.unwrap();
        }

        let mut per_source: Vec<HashSet<String>> = vec![HashSet::new(); SOURCES];
        for poller in pollers {
            let (s, got) = poller.await.unwrap();
            for message in got {
                assert!(
                    message.starts_with(&format!("src{s}-")),
                    "{message} leaked into src{s}"
                );
                assert!(per_source[s].insert(message), "duplicate delivery");
            }
        }

        for seen in per_source {
            assert_eq!(seen.len(), PER_SOURCE);
        }
        assert_eq!(relay.metrics().dropped, 0);
    }
}
