//! Integration tests for the intake chat REST API.
//!
//! Each test spins up an Axum server on a random port with an
//! in-memory database and a scripted mock LLM, then drives the full
//! interview over HTTP.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use bizscope::api::{AppState, chat_routes};
use bizscope::config::EngineConfig;
use bizscope::engine::{QuestionPlanner, ReadinessClassifier, SessionController};
use bizscope::llm::mock::{MockProvider, MockReply};
use bizscope::proposal::ProposalGenerator;
use bizscope::store::{Database, LibSqlBackend};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Start a server on a random port with the given scripted replies.
async fn start_server(replies: Vec<MockReply>) -> String {
    let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let llm = Arc::new(MockProvider::new(replies));
    let config = EngineConfig::default();

    let generator = Arc::new(ProposalGenerator::new(
        Arc::clone(&db),
        llm.clone(),
        &config,
    ));
    let controller = Arc::new(SessionController::new(
        Arc::clone(&db),
        QuestionPlanner::new(llm.clone(), config.context_window_messages),
        ReadinessClassifier::new(llm, config.min_user_messages, config.context_window_messages),
        config,
    ));

    let app = chat_routes(AppState {
        controller,
        generator,
    });
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn profile_json() -> Value {
    json!({
        "business_name": "Acme Cleaning",
        "industry": "home services",
        "business_size": "small",
        "main_pain_points": ["double bookings"],
        "time_wasters": ["manual invoicing"],
        "bottlenecks": [],
        "automation_opportunities": ["appointment reminders"],
        "customer_service_challenges": ["slow email replies"]
    })
}

fn proposal_json() -> Value {
    json!({
        "pricing_tier": "starter",
        "recommended_agents": [
            {"name": "Scheduling Agent", "purpose": "handle bookings and reminders"}
        ],
        "implementation_timeline": "1-2 weeks",
        "estimated_cost": "$500/month",
        "key_benefits": ["fewer double bookings"],
        "technical_requirements": ["calendar API access"],
        "integration_points": ["Google Calendar"],
        "proposal_summary": "Automate scheduling.",
        "full_proposal_content": "Full proposal text."
    })
}

async fn post_json(client: &reqwest::Client, url: &str, body: Value) -> (u16, Value) {
    let response = client.post(url).json(&body).send().await.unwrap();
    let status = response.status().as_u16();
    let value = response.json().await.unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn full_interview_through_proposal() {
    timeout(TEST_TIMEOUT, async {
        // Three planned questions, then a positive readiness verdict,
        // then extraction and proposal generation.
        let base = start_server(vec![
            MockReply::Text("What are your biggest pain points?".to_string()),
            MockReply::Text("What wastes the most time?".to_string()),
            MockReply::Text("What would you automate first?".to_string()),
            MockReply::Json(json!({"ready": true})),
            MockReply::Json(profile_json()),
            MockReply::Json(proposal_json()),
        ])
        .await;
        let client = reqwest::Client::new();

        // Start: greeting plus a session id.
        let (status, started) =
            post_json(&client, &format!("{base}/api/chat/start"), json!({})).await;
        assert_eq!(status, 200);
        let session_id = started["session_id"].as_str().unwrap().to_string();
        assert!(started["message"].as_str().unwrap().contains("business name"));

        // Requesting a proposal before the interview has enough signal
        // is rejected without consuming any model call.
        let (status, _) = post_json(
            &client,
            &format!("{base}/api/chat/proposal"),
            json!({"session_id": session_id}),
        )
        .await;
        assert_eq!(status, 409);

        // Three early turns get questions back.
        for answer in [
            "Acme Cleaning, home services",
            "Double bookings mostly",
            "Manual invoicing eats hours",
        ] {
            let (status, reply) = post_json(
                &client,
                &format!("{base}/api/chat/message"),
                json!({"session_id": session_id, "message": answer}),
            )
            .await;
            assert_eq!(status, 200);
            assert_eq!(reply["ready_for_proposal"], false);
        }

        // Fourth turn crosses the floor and the verdict says ready.
        let (status, reply) = post_json(
            &client,
            &format!("{base}/api/chat/message"),
            json!({"session_id": session_id, "message": "Reminders would help a lot"}),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(reply["ready_for_proposal"], true);

        // Proposal generation completes the session.
        let (status, proposal) = post_json(
            &client,
            &format!("{base}/api/chat/proposal"),
            json!({"session_id": session_id}),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(proposal["content"]["pricing_tier"], "starter");
        assert_eq!(
            proposal["content"]["recommended_agents"][0]["name"],
            "Scheduling Agent"
        );

        // History shows the interview but not the handoff message.
        let history: Value = client
            .get(format!("{base}/api/chat/history/{session_id}"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let entries = history.as_array().unwrap();
        assert_eq!(entries.len(), 8);
        assert_eq!(entries[0]["role"], "assistant");
        assert_eq!(entries[7]["content"], "Reminders would help a lot");

        // Completed sessions reject further turns.
        let (status, _) = post_json(
            &client,
            &format!("{base}/api/chat/message"),
            json!({"session_id": session_id, "message": "one more thing"}),
        )
        .await;
        assert_eq!(status, 409);

        // Regeneration is idempotent.
        let (status, again) = post_json(
            &client,
            &format!("{base}/api/chat/proposal"),
            json!({"session_id": session_id}),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(again["id"], proposal["id"]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unknown_session_returns_404() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(vec![]).await;
        let client = reqwest::Client::new();

        let (status, body) = post_json(
            &client,
            &format!("{base}/api/chat/message"),
            json!({"session_id": uuid::Uuid::new_v4(), "message": "hello"}),
        )
        .await;
        assert_eq!(status, 404);
        assert!(body["error"].as_str().unwrap().contains("not found"));

        let status = client
            .get(format!("{base}/api/chat/history/{}", uuid::Uuid::new_v4()))
            .send()
            .await
            .unwrap()
            .status();
        assert_eq!(status.as_u16(), 404);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn llm_failure_maps_to_bad_gateway() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(vec![MockReply::Fail("upstream down".to_string())]).await;
        let client = reqwest::Client::new();

        let (status, started) =
            post_json(&client, &format!("{base}/api/chat/start"), json!({})).await;
        assert_eq!(status, 200);
        let session_id = started["session_id"].as_str().unwrap().to_string();

        let (status, _) = post_json(
            &client,
            &format!("{base}/api/chat/message"),
            json!({"session_id": session_id, "message": "hello"}),
        )
        .await;
        assert_eq!(status, 502);

        // The failed turn kept the user message in the log.
        let history: Value = client
            .get(format!("{base}/api/chat/history/{session_id}"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let entries = history.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1]["content"], "hello");
    })
    .await
    .expect("test timed out");
}
