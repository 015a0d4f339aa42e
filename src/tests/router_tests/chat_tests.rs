// src/tests/router_tests/chat_tests.rs

use crate::router::handle;
use crate::tests::utils::{body_json, post_json, seeded_app};
use serde_json::Value;

fn listing_ids(json: &Value) -> Vec<i64> {
    json["listings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_i64().unwrap())
        .collect()
}

#[test]
fn chat_returns_best_three_of_five_matches() {
    let app = seeded_app("chat_scenario");
    let body = r#"{"message": "2 bedroom apartment under $1500 near Riverside with parking"}"#;

    let resp = handle(post_json("/chat/ask", body), &app).unwrap();
    assert_eq!(resp.status(), 200);

    let json = body_json(resp);
    assert_eq!(listing_ids(&json), vec![1, 6, 4]);

    let message = json["message"].as_str().unwrap();
    assert!(message.starts_with("I found 5 apartments"), "{message}");
    // Listing 5 is over budget and still ranked, so the price is softened.
    assert!(message.contains("around $1,500"), "{message}");
    assert!(message.contains("Sunny 2BR near the river"), "{message}");
    assert!(json.get("matches").is_none());
}

#[test]
fn explain_adds_scores_and_reasons() {
    let app = seeded_app("chat_explain");
    let body = r#"{"message": "2 bedroom apartment under $1500 near Riverside with parking", "explain": true}"#;

    let json = body_json(handle(post_json("/chat/ask", body), &app).unwrap());
    let matches = json["matches"].as_array().unwrap();

    assert_eq!(matches.len(), 5);
    assert_eq!(matches[0]["listing_id"], 1);
    assert_eq!(matches[0]["score"], 10.0);
    assert_eq!(matches[1]["listing_id"], 6);
    assert!(matches[0]["reasons"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["reason"] == "location" && r["keyword"] == "riverside"));
}

#[test]
fn top_n_limits_the_ranking() {
    let app = seeded_app("chat_top_n");
    let body = r#"{"message": "2 bedroom apartment under $1500 near Riverside with parking", "top_n": 2}"#;

    let json = body_json(handle(post_json("/chat/ask", body), &app).unwrap());
    assert_eq!(listing_ids(&json), vec![1, 6]);
    assert!(json["message"].as_str().unwrap().starts_with("I found 2 "));
}

#[test]
fn non_positive_top_n_is_a_bad_request() {
    let app = seeded_app("chat_bad_top_n");

    for top_n in ["0", "-3"] {
        let body = format!(r#"{{"message": "a house", "top_n": {top_n}}}"#);
        let resp = handle(post_json("/chat/ask", &body), &app).unwrap();
        assert_eq!(resp.status(), 400, "top_n {top_n}");
        assert!(body_json(resp)["error"].as_str().unwrap().contains("top_n"));
    }
}

#[test]
fn missing_message_is_a_bad_request() {
    let app = seeded_app("chat_missing");

    for body in [r#"{}"#, r#"{"text": "hi"}"#, "not json at all", ""] {
        let resp = handle(post_json("/chat/ask", body), &app).unwrap();
        assert_eq!(resp.status(), 400, "{body:?}");
        assert_eq!(body_json(resp)["error"], "No message provided");
    }
}

#[test]
fn empty_message_falls_back_to_recent_listings() {
    let app = seeded_app("chat_empty");

    let json = body_json(handle(post_json("/chat/ask", r#"{"message": ""}"#), &app).unwrap());
    assert_eq!(listing_ids(&json), vec![6, 5, 4]);
    assert_eq!(
        json["message"],
        "I couldn't find an exact match, but here are the 5 most recent listings."
    );
}

#[test]
fn oversized_body_is_rejected() {
    let app = seeded_app("chat_too_big");
    let body = format!(r#"{{"message": "{}"}}"#, "a".repeat(70 * 1024));

    let resp = handle(post_json("/chat/ask", &body), &app).unwrap();
    assert_eq!(resp.status(), 400);
}

#[test]
fn listings_in_reply_carry_display_fields() {
    let app = seeded_app("chat_fields");
    let json = body_json(
        handle(post_json("/chat/ask", r#"{"message": "condo in Lakeview"}"#), &app).unwrap(),
    );

    let top = &json["listings"][0];
    assert_eq!(top["id"], 5);
    assert_eq!(top["title"], "Lakeview condo");
    assert_eq!(top["property_type"], "condo");
    assert_eq!(top["price"], 1950.0);
}
