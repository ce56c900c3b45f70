mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{
    create_test_app, empty_request, fox_dictionary, get_request, json_request, StubRecognizer,
    TestApp,
};

async fn app() -> TestApp {
    create_test_app(StubRecognizer::with_text(""), fox_dictionary()).await
}

#[tokio::test]
async fn create_and_list_own_wordbooks() {
    let app = app().await;
    let token = app.login_new_user("henry").await;

    let (status, created) = app.create_wordbook(&token, "Travel").await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["title"], "Travel");
    assert_eq!(created["description"], "from tests");
    assert_eq!(created["word_count"], 0);
    assert!(created["owner_id"].as_str().unwrap().starts_with("USR"));

    let (status, listed) = app.send(get_request("/api/wordbooks/", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], created["id"]);
}

#[tokio::test]
async fn duplicate_title_for_same_owner_conflicts() {
    let app = app().await;
    let token = app.login_new_user("iris").await;

    let (status, _) = app.create_wordbook(&token, "Verbs").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.create_wordbook(&token, "Verbs").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn same_title_is_allowed_for_different_owners() {
    let app = app().await;
    let first = app.login_new_user("jack").await;
    let second = app.login_new_user("kate").await;

    let (status, _) = app.create_wordbook(&first, "Shared name").await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.create_wordbook(&second, "Shared name").await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, listed) = app.send(get_request("/api/wordbooks", Some(&second))).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn full_create_inserts_words_with_defaults() {
    let app = app().await;
    let token = app.login_new_user("liam").await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/wordbooks/full-create",
            Some(&token),
            json!({
                "title": "Fruit",
                "description": null,
                "words": [
                    { "word": "apple", "meaning": "사과" },
                    { "word": "pear", "meaning": "배", "note": "autumn", "importance": 5 },
                ],
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["word_count"], 2);

    let words = body["words"].as_array().unwrap();
    assert_eq!(words[0]["importance"], 3);
    assert_eq!(words[0]["note"], "");
    assert_eq!(words[1]["importance"], 5);
    assert_eq!(words[1]["note"], "autumn");
}

#[tokio::test]
async fn full_create_rolls_back_on_invalid_word() {
    let app = app().await;
    let token = app.login_new_user("mia").await;

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/wordbooks/full-create",
            Some(&token),
            json!({
                "title": "Broken",
                "words": [{ "word": "ok", "meaning": "좋아", "importance": 9 }],
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listed) = app.send(get_request("/api/wordbooks/", Some(&token))).await;
    assert!(listed.as_array().unwrap().is_empty());
    assert_eq!(app.word_count().await, 0);
}

#[tokio::test]
async fn add_words_by_title_appends_and_reports_count() {
    let app = app().await;
    let token = app.login_new_user("noah").await;
    let (_, created) = app.create_wordbook(&token, "Daily").await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/wordbooks/add-words-by-title?title=Daily",
            Some(&token),
            json!([{ "word": "coffee", "meaning": "커피" }]),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["saved_count"], 1);
    assert_eq!(
        body["message"],
        format!("1 words added to wordbook {}", created["id"])
    );

    let uri = format!("/api/wordbooks/{}/words", created["id"]);
    let (status, words) = app.send(get_request(&uri, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(words.as_array().unwrap()[0]["word"], "coffee");
}

#[tokio::test]
async fn add_words_by_unknown_title_is_not_found() {
    let app = app().await;
    let token = app.login_new_user("olive").await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/wordbooks/add-words-by-title?title=Missing",
            Some(&token),
            json!([{ "word": "tea", "meaning": "차" }]),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(app.word_count().await, 0);
}

#[tokio::test]
async fn words_of_another_owners_wordbook_are_hidden() {
    let app = app().await;
    let owner = app.login_new_user("paul").await;
    let stranger = app.login_new_user("quinn").await;
    let (_, created) = app.create_wordbook(&owner, "Private").await;

    let uri = format!("/api/wordbooks/{}/words", created["id"]);
    let (status, _) = app.send(get_request(&uri, Some(&stranger))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(json_request("POST", &uri, Some(&stranger), json!([{ "word": "x", "meaning": "y" }])))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wordbook_routes_require_authentication() {
    let app = app().await;

    let (status, _) = app.send(get_request("/api/wordbooks/", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wordbook_detail_includes_its_words() {
    let app = app().await;
    let token = app.login_new_user("rita").await;
    let created = app.create_wordbook_with_words(&token, "Colours", &["red", "blue"]).await;

    let uri = format!("/api/wordbooks/{}", created["id"]);
    let (status, body) = app.send(get_request(&uri, Some(&token))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["title"], "Colours");
    assert_eq!(body["word_count"], 2);
    let words: Vec<&str> = body["words"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["word"].as_str().unwrap())
        .collect();
    assert_eq!(words, vec!["red", "blue"]);
}

#[tokio::test]
async fn update_wordbook_changes_only_given_fields() {
    let app = app().await;
    let token = app.login_new_user("sara").await;
    let (_, created) = app.create_wordbook(&token, "Draft").await;
    let uri = format!("/api/wordbooks/{}", created["id"]);

    let (status, body) = app
        .send(json_request("PUT", &uri, Some(&token), json!({ "title": "Final" })))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["title"], "Final");
    assert_eq!(body["description"], "from tests");

    let (status, _) = app
        .send(json_request("PUT", &uri, Some(&token), json!({ "title": "  " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn renaming_onto_an_existing_title_conflicts() {
    let app = app().await;
    let token = app.login_new_user("tom").await;
    app.create_wordbook(&token, "Taken").await;
    let (_, other) = app.create_wordbook(&token, "Free").await;

    let uri = format!("/api/wordbooks/{}", other["id"]);
    let (status, body) = app
        .send(json_request("PUT", &uri, Some(&token), json!({ "title": "Taken" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn deleting_a_wordbook_removes_its_words() {
    let app = app().await;
    let token = app.login_new_user("ursula").await;
    let created = app.create_wordbook_with_words(&token, "Temporary", &["one", "two", "three"]).await;
    assert_eq!(app.word_count().await, 3);

    let uri = format!("/api/wordbooks/{}", created["id"]);
    let (status, _) = app.send(empty_request("DELETE", &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.word_count().await, 0);

    let (status, _) = app.send(get_request(&uri, Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(empty_request("DELETE", &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn another_owner_cannot_read_edit_or_delete_a_wordbook() {
    let app = app().await;
    let owner = app.login_new_user("vera").await;
    let stranger = app.login_new_user("walt").await;
    let created = app.create_wordbook_with_words(&owner, "Mine only", &["secret"]).await;
    let uri = format!("/api/wordbooks/{}", created["id"]);

    let (status, _) = app.send(get_request(&uri, Some(&stranger))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .send(json_request("PUT", &uri, Some(&stranger), json!({ "title": "Stolen" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(empty_request("DELETE", &uri, Some(&stranger))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let word_uri = format!("{uri}/words/{}", created["words"][0]["id"]);
    let (status, _) = app.send(empty_request("DELETE", &word_uri, Some(&stranger))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.word_count().await, 1);
}

#[tokio::test]
async fn update_word_merges_fields_and_validates() {
    let app = app().await;
    let token = app.login_new_user("xavier").await;
    let created = app.create_wordbook_with_words(&token, "Edits", &["hous"]).await;
    let uri = format!(
        "/api/wordbooks/{}/words/{}",
        created["id"], created["words"][0]["id"]
    );

    let (status, body) = app
        .send(json_request(
            "PUT",
            &uri,
            Some(&token),
            json!({ "word": "house", "importance": 5 }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["word"], "house");
    assert_eq!(body["meaning"], "hous 뜻");
    assert_eq!(body["importance"], 5);

    let (status, _) = app
        .send(json_request("PUT", &uri, Some(&token), json!({ "importance": 0 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = format!("/api/wordbooks/{}/words/999999", created["id"]);
    let (status, body) = app
        .send(json_request("PUT", &missing, Some(&token), json!({ "word": "x" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Word not found");
}

#[tokio::test]
async fn delete_word_removes_one_entry() {
    let app = app().await;
    let token = app.login_new_user("yara").await;
    let created = app.create_wordbook_with_words(&token, "Trim", &["keep", "drop"]).await;
    let uri = format!(
        "/api/wordbooks/{}/words/{}",
        created["id"], created["words"][1]["id"]
    );

    let (status, _) = app.send(empty_request("DELETE", &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send(empty_request("DELETE", &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, words) = app
        .send(get_request(&format!("/api/wordbooks/{}/words", created["id"]), Some(&token)))
        .await;
    let words = words.as_array().unwrap();
    assert_eq!(words.len(), 1);
    assert_eq!(words[0]["word"], "keep");
}

#[tokio::test]
async fn move_words_between_own_wordbooks() {
    let app = app().await;
    let token = app.login_new_user("zane").await;
    let source = app.create_wordbook_with_words(&token, "Inbox", &["alpha", "beta", "gamma"]).await;
    let (_, destination) = app.create_wordbook(&token, "Archive").await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/wordbooks/move-words",
            Some(&token),
            json!({
                "source_wordbook_id": source["id"],
                "destination_wordbook_id": destination["id"],
                "word_ids": [source["words"][0]["id"], source["words"][2]["id"], 999999],
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["moved_count"], 2);

    let (_, archive) = app
        .send(get_request(&format!("/api/wordbooks/{}", destination["id"]), Some(&token)))
        .await;
    assert_eq!(archive["word_count"], 2);
    let (_, inbox) = app
        .send(get_request(&format!("/api/wordbooks/{}", source["id"]), Some(&token)))
        .await;
    assert_eq!(inbox["words"][0]["word"], "beta");
}

#[tokio::test]
async fn move_words_requires_two_owned_wordbooks() {
    let app = app().await;
    let owner = app.login_new_user("abel").await;
    let stranger = app.login_new_user("bea").await;
    let source = app.create_wordbook_with_words(&owner, "From", &["word"]).await;
    let (_, foreign) = app.create_wordbook(&stranger, "Theirs").await;
    let word_id = source["words"][0]["id"].clone();

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/wordbooks/move-words",
            Some(&owner),
            json!({
                "source_wordbook_id": source["id"],
                "destination_wordbook_id": foreign["id"],
                "word_ids": [word_id],
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/wordbooks/move-words",
            Some(&owner),
            json!({
                "source_wordbook_id": source["id"],
                "destination_wordbook_id": source["id"],
                "word_ids": [word_id],
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/wordbooks/move-words",
            Some(&owner),
            json!({
                "source_wordbook_id": source["id"],
                "destination_wordbook_id": foreign["id"],
                "word_ids": [],
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, from) = app
        .send(get_request(&format!("/api/wordbooks/{}", source["id"]), Some(&owner)))
        .await;
    assert_eq!(from["word_count"], 1);
}
