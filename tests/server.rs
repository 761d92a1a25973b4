//! End-to-end tests against a served listener.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;

use route_dispatch::Shutdown;

mod common;

#[tokio::test]
async fn test_crud_over_the_wire() {
    let shutdown = Shutdown::new();
    let (addr, handle) = common::spawn_server(&shutdown).await;
    let base = format!("http://{addr}");
    let client = reqwest::Client::new();

    let created = client
        .post(format!("{base}/users"))
        .json(&json!({"name": "linus"}))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let location = created.headers()["location"].to_str().unwrap().to_string();
    assert_eq!(location, "/users/2");

    let fetched: serde_json::Value = client
        .get(format!("{base}{location}"))
        .header("accept", "application/json")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, json!({"id": 2, "name": "linus"}));

    let deleted = client
        .delete(format!("{base}{location}"))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let missing = client
        .get(format!("{base}{location}"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_concurrent_requests() {
    let shutdown = Shutdown::new();
    let (addr, handle) = common::spawn_server(&shutdown).await;
    let client = reqwest::Client::new();

    let mut tasks = Vec::new();
    for i in 0..20 {
        let client = client.clone();
        let url = format!("http://{addr}/greeting?name=n{i}");
        tasks.push(tokio::spawn(async move {
            let response = client
                .get(url)
                .header("accept", "text/plain")
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            response.text().await.unwrap()
        }));
    }
    for (i, task) in tasks.into_iter().enumerate() {
        assert_eq!(task.await.unwrap(), format!("Hello, n{i}!"));
    }

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_graceful_shutdown_stops_accepting() {
    let shutdown = Shutdown::new();
    let (addr, handle) = common::spawn_server(&shutdown).await;

    let response = reqwest::get(format!("http://{addr}/greeting")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(shutdown.trigger(), 1);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    let client = reqwest::Client::new();
    assert!(client
        .get(format!("http://{addr}/greeting"))
        .timeout(Duration::from_secs(1))
        .send()
        .await
        .is_err());
}
