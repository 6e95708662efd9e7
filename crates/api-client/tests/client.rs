use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use replydesk_api::{
    BotRequest, BulkDeleteEventsRequest, EventListQuery, GptUpdate, OffsetQuery, RelayUpdate,
    SortOrder, SummaryListQuery,
};
use replydesk_api_client::{ApiClient, ClientError};
use serde_json::{Value, json};

async fn spawn_server(router: Router) -> ApiClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    ApiClient::new(&format!("http://{addr}/"), Duration::from_secs(5)).expect("client")
}

fn event_row(id: i64, content: &str) -> Value {
    json!({
        "id": id,
        "event_id": format!("ev{id}"),
        "pubkey": "ab",
        "kind": 1,
        "content": content,
        "created_at": 1_700_000_000 + id,
        "received_at": 1_700_000_000 + id,
        "kind0_name": null,
        "is_japanese": true,
        "has_embedding": false,
        "event_type": "mention",
    })
}

#[tokio::test]
async fn list_events_sends_encoded_query_and_decodes_page() {
    let router = Router::new().route(
        "/api/events",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            Json(json!({
                "events": [event_row(1, params.get("search").cloned().unwrap_or_default().as_str())],
                "total": 1,
                "page": params["page"].parse::<u32>().unwrap(),
                "page_size": params["page_size"].parse::<u32>().unwrap(),
                "total_pages": 1,
                "echo": params,
            }))
        }),
    );
    let client = spawn_server(router).await;

    let resp = client
        .list_events(&EventListQuery {
            page: 2,
            page_size: 25,
            search: Some("日本 語&x".into()),
            has_embedding: Some(false),
            sort_by: Some("received_at".into()),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        })
        .await
        .expect("list events");

    assert_eq!(resp.page, 2);
    assert_eq!(resp.page_size, 25);
    assert_eq!(resp.events.len(), 1);
    assert_eq!(resp.events[0].content, "日本 語&x");
}

#[tokio::test]
async fn summaries_and_replies_use_limit_offset() {
    let router = Router::new()
        .route(
            "/api/bots/{pubkey}/summaries",
            get(
                |Path(pubkey): Path<String>, Query(params): Query<HashMap<String, String>>| async move {
                    assert_eq!(pubkey, "abc");
                    assert_eq!(params["limit"], "25");
                    assert_eq!(params["offset"], "50");
                    assert_eq!(params["sort_order"], "desc");
                    assert!(!params.contains_key("search"));
                    Json(json!([]))
                },
            ),
        )
        .route(
            "/api/bots/{pubkey}/replies",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params["limit"], "50");
                Json(json!([{
                    "event_id": "r1",
                    "content": "hi",
                    "created_at": 1,
                    "reply_to_event_id": "e1",
                    "reply_to_user": null,
                }]))
            }),
        );
    let client = spawn_server(router).await;

    let summaries = client
        .list_summaries(
            "abc",
            &SummaryListQuery {
                limit: 25,
                offset: 50,
                sort_order: Some(SortOrder::Desc),
                ..Default::default()
            },
        )
        .await
        .expect("summaries");
    assert!(summaries.is_empty());

    let replies = client
        .list_replies(
            "abc",
            &OffsetQuery {
                limit: 50,
                offset: 0,
            },
        )
        .await
        .expect("replies");
    assert_eq!(replies[0].reply_to_event_id.as_deref(), Some("e1"));
}

#[tokio::test]
async fn error_status_carries_server_message() {
    let router = Router::new().route(
        "/api/events/bulk-delete",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "delete failed" })),
            )
        }),
    );
    let client = spawn_server(router).await;

    let err = client
        .bulk_delete_events(&BulkDeleteEventsRequest {
            is_japanese: Some(false),
            ..Default::default()
        })
        .await
        .expect_err("500 must be an error");
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "500: delete failed");
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let router = Router::new().route("/api/follower-cache", get(|| async { "not json" }));
    let client = spawn_server(router).await;

    let err = client
        .list_follower_cache()
        .await
        .expect_err("plain text is not a follower list");
    assert!(matches!(err, ClientError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();
    let err = client.global_pause().await.expect_err("nothing listens");
    assert!(err.is_transport(), "got {err:?}");
}

type Bodies = Arc<Mutex<Vec<(String, Value)>>>;

/// Accepts any settings write and records `(group, body)`.
fn recording_settings_router(bodies: Bodies) -> Router {
    Router::new().route(
        "/api/settings/{group}",
        get(|Path(group): Path<String>| async move {
            match group.as_str() {
                "gpt" => Json(json!({
                    "answer_length": 100,
                    "timeout": 60,
                    "gemini_search_timeout": 180,
                    "recent_context_count": 10,
                    "summary_threshold": 5000,
                    "max_summary_tokens": 8000,
                    "max_impression_length": 500,
                    "max_mental_diary_length": 1000,
                })),
                "relay" => Json(json!({ "write": ["wss://w"], "read": [], "search": ["wss://s"] })),
                _ => Json(json!({ "ttl_seconds": 86400 })),
            }
        })
        .post(
            move |Path(group): Path<String>, Json(body): Json<Value>| async move {
                bodies.lock().unwrap().push((group.clone(), body.clone()));
                if group == "follower-cache-ttl" {
                    Json(body)
                } else {
                    Json(json!({ "success": true }))
                }
            },
        ),
    )
}

#[tokio::test]
async fn settings_are_read_and_written_per_group() {
    let bodies = Bodies::default();
    let client = spawn_server(recording_settings_router(bodies.clone())).await;

    let gpt = client.gpt_settings().await.expect("gpt settings");
    assert_eq!(gpt.timeout, 60);
    let relays = client.relay_settings().await.expect("relay settings");
    assert_eq!(relays.write, vec!["wss://w"]);
    assert!(relays.read.is_empty());
    assert_eq!(client.follower_cache_ttl().await.unwrap().ttl_seconds, 86400);

    let ack = client
        .set_gpt_settings(&GptUpdate {
            timeout: Some(90),
            ..Default::default()
        })
        .await
        .expect("write gpt");
    assert!(ack.success);
    client
        .set_relay_settings(&RelayUpdate {
            read: Some(vec!["wss://r".into()]),
            ..Default::default()
        })
        .await
        .expect("write relays");
    let ttl = client.set_follower_cache_ttl(3600).await.expect("write ttl");
    assert_eq!(ttl.ttl_seconds, 3600);

    let bodies = bodies.lock().unwrap().clone();
    assert_eq!(
        bodies,
        vec![
            ("gpt".to_string(), json!({ "timeout": 90 })),
            ("relay".to_string(), json!({ "read": ["wss://r"] })),
            ("follower-cache-ttl".to_string(), json!({ "ttl_seconds": 3600 })),
        ]
    );
}

#[tokio::test]
async fn daily_replies_are_grouped_by_bot() {
    let router = Router::new().route(
        "/api/analytics/daily-replies",
        get(|| async {
            Json(json!({ "data": {
                "bb": [{ "date": "2026-10-01", "count": 4 }],
                "aa": [{ "date": "2026-10-01", "count": 1 }, { "date": "2026-10-02", "count": 2 }],
            }}))
        }),
    );
    let client = spawn_server(router).await;

    let resp = client.daily_replies().await.expect("daily replies");
    let bots: Vec<&str> = resp.data.keys().map(String::as_str).collect();
    assert_eq!(bots, vec!["aa", "bb"]);
    assert_eq!(resp.data["aa"][1].count, 2);
}

#[tokio::test]
async fn create_bot_posts_the_request_and_decodes_the_bot() {
    let router = Router::new().route(
        "/api/bots",
        post(|Json(body): Json<Value>| async move {
            Json(json!({
                "pubkey": "ab",
                "secretkey": body["secretkey"],
                "prompt": body["prompt"],
                "content": body["content"],
                "status": 0,
                "has_ratio": body.get("air_reply_single_ratio").is_some(),
            }))
        }),
    );
    let client = spawn_server(router).await;

    let bot = client
        .create_bot(&BotRequest {
            secretkey: "nsec1x".into(),
            prompt: "be kind".into(),
            content: "{}".into(),
            air_reply_single_ratio: None,
        })
        .await
        .expect("create bot");
    assert_eq!(bot.prompt, "be kind");
    assert!(bot.is_active());
    assert_eq!(bot.air_reply_single_ratio, None);
}
