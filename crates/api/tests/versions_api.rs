//! HTTP-level integration tests for content version endpoints.
//!
//! Collections are set up through the repository layer to keep the tests
//! focused on HTTP behaviour.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, delete_auth, get_auth, patch_json_auth, post_auth, post_json_auth, put_json_auth,
    token_for,
};
use serde_json::json;
use sqlx::PgPool;
use versionflow_db::models::collection::UpsertCollection;
use versionflow_db::repositories::{CollectionRepo, ContentVersionRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn setup_collection(pool: &PgPool, name: &str, restricted: bool) {
    CollectionRepo::upsert(
        pool,
        name,
        &UpsertCollection {
            versioning: Some(true),
            versioning_restrictions: Some(restricted),
        },
    )
    .await
    .unwrap();
}

/// Create a version through the API and return its id.
async fn create_version(pool: &PgPool, token: &str, collection: &str, key: &str) -> String {
    let app = common::build_test_app(pool.clone());
    let body = json!({
        "key": key,
        "name": "Draft",
        "collection": collection,
        "item": "1",
        "delta": { "title": "Hello" },
    });
    let response = post_json_auth(app, "/api/v1/versions", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["id"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Create / read / delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_version_starts_unreviewed(pool: PgPool) {
    setup_collection(&pool, "articles", false).await;
    let (user_id, token) = token_for("editor");

    let id = create_version(&pool, &token, "articles", "draft").await;

    let app = common::build_test_app(pool);
    let response = get_auth(app, &format!("/api/v1/versions/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["key"], "draft");
    assert_eq!(data["review_requested"], false);
    assert_eq!(data["reviewed"], false);
    assert_eq!(data["approved"], false);
    assert!(data["reject_reason"].is_null());
    assert_eq!(data["user_created"], user_id.to_string());
    assert_eq!(data["delta"]["title"], "Hello");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_version_requires_versioning_enabled(pool: PgPool) {
    CollectionRepo::upsert(
        &pool,
        "pages",
        &UpsertCollection {
            versioning: Some(false),
            versioning_restrictions: None,
        },
    )
    .await
    .unwrap();
    let (_, token) = token_for("editor");

    let app = common::build_test_app(pool);
    let body = json!({ "key": "draft", "collection": "pages", "item": "1" });
    let response = post_json_auth(app, "/api/v1/versions", body, &token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_version_unknown_collection_returns_404(pool: PgPool) {
    let (_, token) = token_for("editor");

    let app = common::build_test_app(pool);
    let body = json!({ "key": "draft", "collection": "missing", "item": "1" });
    let response = post_json_auth(app, "/api/v1/versions", body, &token).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_version_rejects_bad_key(pool: PgPool) {
    setup_collection(&pool, "articles", false).await;
    let (_, token) = token_for("editor");

    let app = common::build_test_app(pool);
    let body = json!({ "key": "has spaces", "collection": "articles", "item": "1" });
    let response = post_json_auth(app, "/api/v1/versions", body, &token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_key_returns_409(pool: PgPool) {
    setup_collection(&pool, "articles", false).await;
    let (_, token) = token_for("editor");
    create_version(&pool, &token, "articles", "draft").await;

    let app = common::build_test_app(pool);
    let body = json!({ "key": "draft", "collection": "articles", "item": "1" });
    let response = post_json_auth(app, "/api/v1/versions", body, &token).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_versions_for_item(pool: PgPool) {
    setup_collection(&pool, "articles", false).await;
    let (_, token) = token_for("editor");
    create_version(&pool, &token, "articles", "one").await;
    create_version(&pool, &token, "articles", "two").await;

    let app = common::build_test_app(pool);
    let response = get_auth(
        app,
        "/api/v1/versions?collection=articles&item=1",
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_save_delta_recomputes_hash(pool: PgPool) {
    setup_collection(&pool, "articles", false).await;
    let (_, token) = token_for("editor");
    let id = create_version(&pool, &token, "articles", "draft").await;

    let app = common::build_test_app(pool.clone());
    let before = body_json(get_auth(app, &format!("/api/v1/versions/{id}"), &token).await).await;

    let app = common::build_test_app(pool);
    let response = patch_json_auth(
        app,
        &format!("/api/v1/versions/{id}/delta"),
        json!({ "delta": { "title": "Changed" } }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["delta"]["title"], "Changed");
    assert_ne!(json["data"]["hash"], before["data"]["hash"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_save_delta_rejects_non_object(pool: PgPool) {
    setup_collection(&pool, "articles", false).await;
    let (_, token) = token_for("editor");
    let id = create_version(&pool, &token, "articles", "draft").await;

    let app = common::build_test_app(pool);
    let response = patch_json_auth(
        app,
        &format!("/api/v1/versions/{id}/delta"),
        json!({ "delta": [1, 2, 3] }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_version(pool: PgPool) {
    setup_collection(&pool, "articles", false).await;
    let (_, token) = token_for("editor");
    let id = create_version(&pool, &token, "articles", "draft").await;

    let app = common::build_test_app(pool.clone());
    let response = delete_auth(app, &format!("/api/v1/versions/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = common::build_test_app(pool);
    let response = get_auth(app, &format!("/api/v1/versions/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_get_unknown_version_returns_404(pool: PgPool) {
    let (_, token) = token_for("editor");

    let app = common::build_test_app(pool);
    let response = get_auth(
        app,
        &format!("/api/v1/versions/{}", uuid::Uuid::now_v7()),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Review workflow
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approve_workflow_and_approval_state(pool: PgPool) {
    setup_collection(&pool, "articles", true).await;
    let (_, editor) = token_for("editor");
    let (_, reviewer) = token_for("reviewer");
    let id = create_version(&pool, &editor, "articles", "draft").await;

    let app = common::build_test_app(pool.clone());
    let response = post_auth(app, &format!("/api/v1/versions/{id}/request-review"), &editor).await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool.clone());
    let state = body_json(
        get_auth(app, &format!("/api/v1/versions/{id}/approval-state"), &editor).await,
    )
    .await;
    assert_eq!(state["data"]["isReviewing"], true);
    assert_eq!(state["data"]["isReviewed"], false);

    let app = common::build_test_app(pool.clone());
    let response = post_auth(app, &format!("/api/v1/versions/{id}/approve"), &reviewer).await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool);
    let state = body_json(
        get_auth(app, &format!("/api/v1/versions/{id}/approval-state"), &editor).await,
    )
    .await;
    assert_eq!(
        state["data"],
        json!({
            "isReviewing": true,
            "isReviewed": true,
            "isApproved": true,
            "isRejected": false,
            "rejectedReason": "",
        })
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reject_records_reason(pool: PgPool) {
    setup_collection(&pool, "articles", true).await;
    let (_, editor) = token_for("editor");
    let (_, reviewer) = token_for("admin");
    let id = create_version(&pool, &editor, "articles", "draft").await;

    let app = common::build_test_app(pool.clone());
    post_auth(app, &format!("/api/v1/versions/{id}/request-review"), &editor).await;

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        &format!("/api/v1/versions/{id}/reject"),
        json!({ "reason": "  Wrong title  " }),
        &reviewer,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["reject_reason"], "Wrong title");

    let app = common::build_test_app(pool);
    let state = body_json(
        get_auth(app, &format!("/api/v1/versions/{id}/approval-state"), &editor).await,
    )
    .await;
    assert_eq!(state["data"]["isReviewed"], true);
    assert_eq!(state["data"]["isRejected"], true);
    assert_eq!(state["data"]["rejectedReason"], "Wrong title");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_decision_without_request_returns_409(pool: PgPool) {
    setup_collection(&pool, "articles", false).await;
    let (_, editor) = token_for("editor");
    let (_, reviewer) = token_for("reviewer");
    let id = create_version(&pool, &editor, "articles", "draft").await;

    let app = common::build_test_app(pool);
    let response = post_auth(app, &format!("/api/v1/versions/{id}/approve"), &reviewer).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_editor_cannot_approve(pool: PgPool) {
    setup_collection(&pool, "articles", false).await;
    let (_, editor) = token_for("editor");
    let id = create_version(&pool, &editor, "articles", "draft").await;

    let app = common::build_test_app(pool.clone());
    post_auth(app, &format!("/api/v1/versions/{id}/request-review"), &editor).await;

    let app = common::build_test_app(pool);
    let response = post_auth(app, &format!("/api/v1/versions/{id}/approve"), &editor).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_blank_reject_reason_returns_400(pool: PgPool) {
    setup_collection(&pool, "articles", false).await;
    let (_, editor) = token_for("editor");
    let (_, reviewer) = token_for("reviewer");
    let id = create_version(&pool, &editor, "articles", "draft").await;

    let app = common::build_test_app(pool.clone());
    post_auth(app, &format!("/api/v1/versions/{id}/request-review"), &editor).await;

    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        &format!("/api/v1/versions/{id}/reject"),
        json!({ "reason": "   " }),
        &reviewer,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Promotion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_promote_unapproved_under_restrictions_returns_403(pool: PgPool) {
    setup_collection(&pool, "articles", true).await;
    let (_, editor) = token_for("editor");
    let id = create_version(&pool, &editor, "articles", "draft").await;

    let app = common::build_test_app(pool.clone());
    let response = post_auth(app, &format!("/api/v1/versions/{id}/promote"), &editor).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNPROMOTEABLE_VERSION");
    assert_eq!(json["error"], "Can't promote version. Version not approved.");
    assert_eq!(json["extensions"]["reason"], "Version not approved");

    // The refused version is still there.
    let version_id = id.parse().unwrap();
    assert!(ContentVersionRepo::find_by_id(&pool, version_id)
        .await
        .unwrap()
        .is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_promote_without_restrictions_returns_delta(pool: PgPool) {
    setup_collection(&pool, "articles", false).await;
    let (_, editor) = token_for("editor");
    let id = create_version(&pool, &editor, "articles", "draft").await;

    let app = common::build_test_app(pool.clone());
    let response = post_auth(app, &format!("/api/v1/versions/{id}/promote"), &editor).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], id);
    assert_eq!(json["data"]["item"], "1");
    assert_eq!(json["data"]["delta"]["title"], "Hello");

    let version_id = id.parse().unwrap();
    assert!(ContentVersionRepo::find_by_id(&pool, version_id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_promote_approved_under_restrictions(pool: PgPool) {
    setup_collection(&pool, "articles", true).await;
    let (_, editor) = token_for("editor");
    let (_, reviewer) = token_for("reviewer");
    let id = create_version(&pool, &editor, "articles", "draft").await;

    let app = common::build_test_app(pool.clone());
    post_auth(app, &format!("/api/v1/versions/{id}/request-review"), &editor).await;
    let app = common::build_test_app(pool.clone());
    post_auth(app, &format!("/api/v1/versions/{id}/approve"), &reviewer).await;

    let app = common::build_test_app(pool);
    let response = post_auth(app, &format!("/api/v1/versions/{id}/promote"), &editor).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_promote_rejected_under_restrictions_returns_403(pool: PgPool) {
    setup_collection(&pool, "articles", true).await;
    let (_, editor) = token_for("editor");
    let (_, reviewer) = token_for("reviewer");
    let id = create_version(&pool, &editor, "articles", "draft").await;

    let app = common::build_test_app(pool.clone());
    post_auth(app, &format!("/api/v1/versions/{id}/request-review"), &editor).await;
    let app = common::build_test_app(pool.clone());
    post_json_auth(
        app,
        &format!("/api/v1/versions/{id}/reject"),
        json!({ "reason": "No" }),
        &reviewer,
    )
    .await;

    let app = common::build_test_app(pool);
    let response = post_auth(app, &format!("/api/v1/versions/{id}/promote"), &editor).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_editing_approved_version_blocks_promotion(pool: PgPool) {
    setup_collection(&pool, "articles", true).await;
    let (_, editor) = token_for("editor");
    let (_, reviewer) = token_for("reviewer");
    let id = create_version(&pool, &editor, "articles", "draft").await;

    let app = common::build_test_app(pool.clone());
    post_auth(app, &format!("/api/v1/versions/{id}/request-review"), &editor).await;
    let app = common::build_test_app(pool.clone());
    let response = post_auth(app, &format!("/api/v1/versions/{id}/approve"), &reviewer).await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool.clone());
    let response = patch_json_auth(
        app,
        &format!("/api/v1/versions/{id}/delta"),
        json!({ "delta": { "title": "Changed after approval" } }),
        &editor,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["approved"], false);
    assert_eq!(json["data"]["reviewed"], false);
    assert_eq!(json["data"]["review_requested"], false);

    let app = common::build_test_app(pool.clone());
    let response = post_auth(app, &format!("/api/v1/versions/{id}/promote"), &editor).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNPROMOTEABLE_VERSION");

    let version_id = id.parse().unwrap();
    assert!(ContentVersionRepo::find_by_id(&pool, version_id)
        .await
        .unwrap()
        .is_some());
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_upserts_collection_settings(pool: PgPool) {
    let (_, admin) = token_for("admin");

    let app = common::build_test_app(pool.clone());
    let response = put_json_auth(
        app,
        "/api/v1/collections/articles",
        json!({ "versioning": true }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["versioning"], true);
    assert_eq!(json["data"]["versioning_restrictions"], false);

    let app = common::build_test_app(pool.clone());
    let response = put_json_auth(
        app,
        "/api/v1/collections/articles",
        json!({ "versioning_restrictions": true }),
        &admin,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["versioning"], true);
    assert_eq!(json["data"]["versioning_restrictions"], true);

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/collections/articles", &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_editor_cannot_change_collection_settings(pool: PgPool) {
    let (_, editor) = token_for("editor");

    let app = common::build_test_app(pool);
    let response = put_json_auth(
        app,
        "/api/v1/collections/articles",
        json!({ "versioning_restrictions": false }),
        &editor,
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
