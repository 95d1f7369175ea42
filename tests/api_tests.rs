// tests/api_tests.rs

use gelora_quiz::{
    config::Config,
    rate_limit::RateLimitConfig,
    routes,
    state::AppState,
    store::MemoryQuizStore,
};
use serde_json::{Value, json};
use std::{net::SocketAddr, sync::Arc};

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app_with(config: Config) -> String {
    // 1. In-memory store with the built-in quizzes
    let store = Arc::new(MemoryQuizStore::seeded());

    // 2. Create the router with the app state
    let state = AppState::new(store, config);
    let app = routes::create_router(state);

    // 3. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 4. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    address
}

async fn spawn_app() -> String {
    spawn_app_with(Config {
        rust_log: "error".to_string(),
        ..Config::default()
    })
    .await
}

/// Correct option per question of "crypto-basics".
const CRYPTO_KEY: [(&str, i64); 5] = [("q1", 0), ("q2", 0), ("q3", 1), ("q4", 1), ("q5", 2)];

fn crypto_answers(correct: usize) -> Vec<Value> {
    CRYPTO_KEY
        .iter()
        .enumerate()
        .map(|(i, (id, key))| {
            let pick = if i < correct { *key } else { (key + 1) % 4 };
            json!({ "questionId": id, "selectedOption": pick })
        })
        .collect()
}

async fn submit(client: &reqwest::Client, address: &str, body: Value) -> reqwest::Response {
    client
        .post(format!("{}/api/quizzes/submit", address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request")
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn health_endpoints_are_up_and_hardened() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/health", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["referrer-policy"], "strict-origin-when-cross-origin");
    assert!(headers.get("x-ratelimit-limit").is_none());
}

#[tokio::test]
async fn list_quizzes_hides_answer_keys() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/quizzes/list", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.headers()["x-ratelimit-limit"], "30");
    assert_eq!(response.headers()["x-ratelimit-remaining"], "29");

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 3);
    let first = &body["quizzes"][0];
    assert_eq!(first["id"], "crypto-basics");
    assert!(first["questions"][0].get("correctAnswer").is_none());
}

#[tokio::test]
async fn get_quiz_returns_meta_and_empty_board() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!("{}/api/quizzes/web3-advanced", address))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    assert_eq!(body["quiz"]["title"], "Web3 & DApps");
    assert_eq!(body["meta"]["questionsCount"], 4);
    assert_eq!(body["meta"]["leaderboardCount"], 0);
    assert_eq!(body["leaderboard"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn unknown_quiz_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/quizzes/does-not-exist", address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Quiz not found");

    let response = submit(
        &client,
        &address,
        json!({ "quizId": "does-not-exist", "answers": [], "timeSpent": 10 }),
    )
    .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn submit_rejects_negative_time() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = submit(
        &client,
        &address,
        json!({ "quizId": "crypto-basics", "answers": crypto_answers(5), "timeSpent": -5 }),
    )
    .await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn submit_grades_and_ranks() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // 1. First player: 3 of 5 correct
    let response = submit(
        &client,
        &address,
        json!({
            "quizId": "crypto-basics",
            "answers": crypto_answers(3),
            "timeSpent": 120,
            "user": { "fid": 1001, "username": "alice" }
        }),
    )
    .await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    let result = &body["result"];
    assert_eq!(result["score"], 60);
    assert_eq!(result["correctAnswers"], 3);
    assert_eq!(result["totalQuestions"], 5);
    assert_eq!(result["rank"], 1);
    assert_eq!(result["percentile"], 100);
    assert_eq!(result["answers"].as_array().unwrap().len(), 5);
    assert_eq!(result["answers"][0]["timeSpent"], 24.0);

    // 2. Second player: perfect score takes first place
    let body: Value = submit(
        &client,
        &address,
        json!({
            "quizId": "crypto-basics",
            "answers": crypto_answers(5),
            "timeSpent": 200,
            "user": { "fid": 1002 }
        }),
    )
    .await
    .json()
    .await
    .unwrap();
    assert_eq!(body["result"]["score"], 100);
    assert_eq!(body["result"]["rank"], 1);
    assert_eq!(body["result"]["percentile"], 100);

    // 3. The board now holds both, best first, with display defaults filled in
    let board: Value = client
        .get(format!("{}/api/quizzes/crypto-basics/leaderboard", address))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    let entries = board["leaderboard"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["userId"], "1002");
    assert_eq!(entries[0]["username"], "user_1002");
    assert_eq!(entries[0]["displayName"], "User 1002");
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(entries[1]["username"], "alice");
    assert_eq!(entries[1]["rank"], 2);
}

#[tokio::test]
async fn selected_option_accepts_any_json_number() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = submit(
        &client,
        &address,
        json!({
            "quizId": "crypto-basics",
            "answers": [
                { "questionId": "q1", "selectedOption": 1e20 },
                { "questionId": "q2", "selectedOption": 2.5 },
                { "questionId": "q3", "selectedOption": 1.0 },
                { "questionId": "q4", "selectedOption": -1 }
            ],
            "timeSpent": 50
        }),
    )
    .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    let result = &body["result"];
    assert_eq!(result["correctAnswers"], 1);
    assert_eq!(result["score"], 20);

    let graded: Vec<bool> = result["answers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|answer| answer["isCorrect"].as_bool().unwrap())
        .collect();
    assert_eq!(graded, vec![false, false, true, false, false]);
}

#[tokio::test]
async fn anonymous_submissions_are_ranked_but_not_saved() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    submit(
        &client,
        &address,
        json!({
            "quizId": "nft-knowledge",
            "answers": [{ "questionId": "q1", "selectedOption": 1 }],
            "timeSpent": 30,
            "user": { "fid": 7 }
        }),
    )
    .await;

    // Partial submission: 2 of 4 answered, both correct
    let body: Value = submit(
        &client,
        &address,
        json!({
            "quizId": "nft-knowledge",
            "answers": [
                { "questionId": "q2", "selectedOption": 1 },
                { "questionId": "q1", "selectedOption": 1 },
                { "questionId": "q9", "selectedOption": 1 }
            ],
            "timeSpent": 40
        }),
    )
    .await
    .json()
    .await
    .unwrap();

    assert_eq!(body["result"]["correctAnswers"], 2);
    assert_eq!(body["result"]["totalQuestions"], 4);
    assert_eq!(body["result"]["score"], 50);
    assert_eq!(body["result"]["rank"], 1);
    assert_eq!(body["result"]["percentile"], 100);

    // Only saved sessions are shown; the anonymous attempt is not listed as "0".
    let entries = body["leaderboard"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["userId"], "7");
    assert_eq!(entries[0]["rank"], 1);

    let board: Value = client
        .get(format!("{}/api/quizzes/nft-knowledge/leaderboard", address))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    assert_eq!(board["leaderboard"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn leaderboard_endpoints_return_only_the_top_entries() {
    let address = spawn_app_with(Config {
        rust_log: "error".to_string(),
        leaderboard_limit: 2,
        ..Config::default()
    })
    .await;
    let client = reqwest::Client::new();

    for (fid, correct) in [(11, 1), (12, 5), (13, 3)] {
        submit(
            &client,
            &address,
            json!({
                "quizId": "crypto-basics",
                "answers": crypto_answers(correct),
                "timeSpent": 60,
                "user": { "fid": fid }
            }),
        )
        .await;
    }

    let board: Value = client
        .get(format!("{}/api/quizzes/crypto-basics/leaderboard", address))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    let entries = board["leaderboard"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["userId"], "12");
    assert_eq!(entries[1]["userId"], "13");
    assert_eq!(entries[1]["rank"], 2);

    let detail: Value = client
        .get(format!("{}/api/quizzes/crypto-basics", address))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    assert_eq!(detail["meta"]["leaderboardCount"], 2);
    assert_eq!(detail["leaderboard"][0]["userId"], "12");
}

#[tokio::test]
async fn rate_limit_denies_after_max_requests() {
    let address = spawn_app_with(Config {
        rust_log: "error".to_string(),
        rate_limit: RateLimitConfig {
            max_requests: 3,
            cleanup_probability: 0.0,
            ..RateLimitConfig::default()
        },
        ..Config::default()
    })
    .await;
    let client = reqwest::Client::new();

    for expected_remaining in ["2", "1", "0"] {
        let response = client
            .get(format!("{}/api/quizzes/list", address))
            .header("x-forwarded-for", "203.0.113.7")
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.headers()["x-ratelimit-remaining"], expected_remaining);
        assert_eq!(response.headers()["x-ratelimit-window"], "60");
    }

    let response = client
        .get(format!("{}/api/quizzes/crypto-basics", address))
        .header("x-forwarded-for", "203.0.113.7")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 429);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    let retry_after: i64 = response.headers()["retry-after"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Too Many Requests");
    assert_eq!(body["limit"], 3);
    assert_eq!(body["retryAfter"], retry_after);

    // A different client and the health check are unaffected
    let other = client
        .get(format!("{}/api/quizzes/list", address))
        .header("x-forwarded-for", "198.51.100.1")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(other.status().as_u16(), 200);

    let health = client
        .get(format!("{}/api/health", address))
        .header("x-forwarded-for", "203.0.113.7")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(health.status().as_u16(), 200);
}
