use axum::http::StatusCode;
use gavel::api;
use gavel::db::{apply_seed, init_db, SeedFile};
use gavel::{AuctionEngine, EngineOptions, Repository, SeasonCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

const SEED: &str = r#"{
    "season": {
        "code": "S26", "maxClaimants": 2, "maxFreeQuota": 1, "maxRtmQuota": 1,
        "budgetLimit": "20", "minCandidateAmount": "1"
    },
    "claimants": [
        { "id": "csk", "name": "Chennai", "rtmEligible": true },
        { "id": "mi", "name": "Mumbai" }
    ],
    "candidates": [
        { "id": "p1", "name": "Opener", "levelCode": "l1", "baseAmount": "4" },
        { "id": "p2", "name": "Keeper", "levelCode": "l2", "allowsRandomDraw": true },
        { "id": "p3", "name": "Spinner", "levelCode": "l2", "baseAmount": "1.5" },
        { "id": "f1", "name": "Rookie", "levelCode": "l4", "isFreeTier": true }
    ]
}"#;

struct TestApp {
    app: axum::Router,
    _temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Repository::new(pool);
    let seed: SeedFile = serde_json::from_str(SEED).unwrap();
    apply_seed(&repo, &seed).await.unwrap();

    let engine = Arc::new(AuctionEngine::new(
        repo.clone(),
        SeasonCode::new("S26"),
        EngineOptions {
            draw_seed: Some(3),
            ..EngineOptions::default()
        },
    ));
    let app = api::create_router(api::AppState::new(repo, engine));

    TestApp {
        app,
        _temp: temp_dir,
    }
}

async fn request(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let t = setup_test_app().await;
    let (status, body) = request(&t.app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = request(&t.app, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["season"], "S26");
    assert_eq!(body["completed"], false);
}

#[tokio::test]
async fn test_manual_sale_flow() {
    let t = setup_test_app().await;

    let (status, body) = request(&t.app, "GET", "/v1/auction", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "idle");

    let (status, body) =
        request(&t.app, "POST", "/v1/auction/present", Some(json!({"candidateId": "p1"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "presented");
    assert_eq!(body["detail"]["candidate"]["id"], "p1");

    let (status, _) =
        request(&t.app, "POST", "/v1/auction/present", Some(json!({"candidateId": "p3"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = request(
        &t.app,
        "POST",
        "/v1/auction/choose",
        Some(json!({"claimantId": "csk", "amount": "4", "rtm": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "choosing");
    assert_eq!(body["detail"]["rtmRequested"], true);
    assert_eq!(body["rtmStatus"], "RTM is ON for Chennai");

    let (status, body) =
        request(&t.app, "POST", "/v1/auction/amount", Some(json!({"steps": -2}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"]["amount"], "3.5");

    let (status, record) =
        request(&t.app, "POST", "/v1/auction/resolve", Some(json!({"outcome": "sold"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["claimantId"], "csk");
    assert_eq!(record["amount"], "3.5");
    assert_eq!(record["rtmUsed"], true);
    assert!(record["reversalHandle"].as_str().unwrap().starts_with("pt-"));

    let (status, body) = request(&t.app, "GET", "/v1/claimants", None).await;
    assert_eq!(status, StatusCode::OK);
    let csk = body["claimants"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"] == "csk")
        .unwrap()
        .clone();
    assert_eq!(csk["playersHeld"], 1);
    assert_eq!(csk["amountSpent"], "3.5");
    assert_eq!(csk["budgetRemaining"], "16.5");
    assert_eq!(csk["budgetUsedPercent"], "17.5");

    let (status, squad) = request(&t.app, "GET", "/v1/claimants/csk/squad", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(squad["count"], 1);
    assert_eq!(squad["totalAmount"], "3.5");
    assert_eq!(squad["levels"][0]["levelCode"], "l1");

    let handle = record["reversalHandle"].clone();
    let (status, _) = request(
        &t.app,
        "POST",
        "/v1/auction/revert",
        Some(json!({"reversalHandle": handle})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(
        &t.app,
        "POST",
        "/v1/auction/revert",
        Some(json!({"reversalHandle": handle})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already been reverted"));

    let (_, squad) = request(&t.app, "GET", "/v1/claimants/csk/squad", None).await;
    assert_eq!(squad["count"], 0);
}

#[tokio::test]
async fn test_ineligible_claimant_is_rejected() {
    let t = setup_test_app().await;

    for (candidate, amount) in [("p1", "4"), ("p3", "2")] {
        request(&t.app, "POST", "/v1/auction/present", Some(json!({"candidateId": candidate}))).await;
        request(
            &t.app,
            "POST",
            "/v1/auction/choose",
            Some(json!({"claimantId": "mi", "amount": amount})),
        )
        .await;
        let (status, _) =
            request(&t.app, "POST", "/v1/auction/resolve", Some(json!({"outcome": "sold"}))).await;
        assert_eq!(status, StatusCode::OK);
    }

    request(&t.app, "POST", "/v1/auction/present", Some(json!({"candidateId": "f1"}))).await;
    let (status, body) = request(
        &t.app,
        "POST",
        "/v1/auction/choose",
        Some(json!({"claimantId": "mi"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("roster full (2/2)"));

    let (_, board) = request(&t.app, "GET", "/v1/claimants", None).await;
    assert_eq!(board["inPlay"], "f1");
    let mi = board["claimants"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"] == "mi")
        .unwrap()
        .clone();
    assert_eq!(mi["eligible"], false);
    assert_eq!(mi["reason"]["kind"], "rosterFull");
}

#[tokio::test]
async fn test_random_draw_and_unsold_results() {
    let t = setup_test_app().await;

    request(&t.app, "POST", "/v1/auction/present", Some(json!({"candidateId": "p3"}))).await;
    let (status, _) =
        request(&t.app, "POST", "/v1/auction/mode", Some(json!({"mode": "random"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) =
        request(&t.app, "POST", "/v1/auction/resolve", Some(json!({"outcome": "unsold"}))).await;
    assert_eq!(status, StatusCode::OK);

    request(&t.app, "POST", "/v1/auction/present", Some(json!({"candidateId": "p2"}))).await;
    let (status, _) =
        request(&t.app, "POST", "/v1/auction/mode", Some(json!({"mode": "random"}))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = request(&t.app, "POST", "/v1/auction/draw", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "choosing");
    assert_eq!(body["detail"]["amount"], "1");
    let (status, _) = request(&t.app, "POST", "/v1/auction/draw", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) =
        request(&t.app, "POST", "/v1/auction/resolve", Some(json!({"outcome": "sold"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, results) = request(&t.app, "GET", "/v1/results?level=l2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results["entries"].as_array().unwrap().len(), 2);
    assert_eq!(results["levels"][0]["sold"], 1);
    assert_eq!(results["levels"][0]["unsold"], 1);

    let (_, unsold) = request(&t.app, "GET", "/v1/results?status=unsold", None).await;
    assert_eq!(unsold["entries"][0]["candidate"]["id"], "p3");

    let (status, _) = request(&t.app, "GET", "/v1/results?status=gone", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_complete_season_blocks_presentation() {
    let t = setup_test_app().await;

    let (status, season) = request(
        &t.app,
        "POST",
        "/v1/season/complete",
        Some(json!({"note": "auction closed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(season["completionNote"], "auction closed");

    let (status, _) =
        request(&t.app, "POST", "/v1/auction/present", Some(json!({"candidateId": "p1"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let t = setup_test_app().await;

    let (status, _) =
        request(&t.app, "POST", "/v1/auction/present", Some(json!({"candidateId": "nope"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(&t.app, "GET", "/v1/claimants/nope/squad", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(&t.app, "POST", "/v1/auction/cancel", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
