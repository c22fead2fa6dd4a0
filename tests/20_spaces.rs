mod common;

use anyhow::Result;
use axum::http::StatusCode;
use axum::Router;
use serde_json::{json, Value};

struct Seed {
    token: String,
    park_type: String,
    recreational: String,
    natural: String,
    playground: String,
    seating: String,
}

async fn seed(app: &Router) -> Result<Seed> {
    let (token, _) = common::register_and_login(app, "casey").await?;
    let park_type = common::create_entry(app, &token, "/api/types", "Park").await?;
    let recreational = common::create_entry(app, &token, "/api/categories", "Recreational").await?;
    let natural = common::create_entry(app, &token, "/api/categories", "Natural").await?;
    let playground = common::create_entry(app, &token, "/api/features", "Playground").await?;
    let seating = common::create_entry(app, &token, "/api/features", "Seating").await?;
    Ok(Seed {
        token,
        park_type,
        recreational,
        natural,
        playground,
        seating,
    })
}

fn park_payload(seed: &Seed) -> Value {
    json!({
        "name": "City Central Park",
        "typeId": seed.park_type,
        "categoryIds": [seed.recreational, seed.natural],
        "featureIds": [seed.playground, seed.seating],
        "descriptions": "A large urban park",
        "activities": ["walking", "picnics"]
    })
}

async fn create_park(app: &Router, seed: &Seed) -> Result<(String, String)> {
    let (status, body) = common::request(
        app,
        "POST",
        "/api/spaces",
        Some(&seed.token),
        Some(park_payload(seed)),
    )
    .await?;
    anyhow::ensure!(
        status == StatusCode::CREATED,
        "create space failed: {} {}",
        status,
        body
    );
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let slug = body["data"]["slug"].as_str().unwrap().to_string();
    Ok((id, slug))
}

fn names(value: &Value) -> Vec<String> {
    let mut out: Vec<String> = value
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    out.sort();
    out
}

#[tokio::test]
async fn create_returns_slug_and_detail_resolves_names() -> Result<()> {
    let app = common::test_app();
    let seed = seed(&app).await?;

    let (id, slug) = create_park(&app, &seed).await?;
    assert_eq!(slug, "city-central-park");

    let (status, body) =
        common::request(&app, "GET", &format!("/api/spaces/{}", id), None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "City Central Park");
    assert_eq!(body["data"]["typeName"], "Park");
    assert_eq!(names(&body["data"]["categories"]), vec!["Natural", "Recreational"]);
    assert_eq!(names(&body["data"]["features"]), vec!["Playground", "Seating"]);
    assert_eq!(body["data"]["descriptions"], "A large urban park");

    // Same record resolves through the slug
    let (status, by_slug) =
        common::request(&app, "GET", "/api/spaces/city-central-park", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_slug["data"]["id"], id.as_str());
    Ok(())
}

#[tokio::test]
async fn reads_are_public_and_idempotent() -> Result<()> {
    let app = common::test_app();
    let seed = seed(&app).await?;
    let (id, _) = create_park(&app, &seed).await?;

    let path = format!("/api/spaces/{}", id);
    let (_, first) = common::request(&app, "GET", &path, None, None).await?;
    let (_, second) = common::request(&app, "GET", &path, None, None).await?;
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn name_collisions_get_numbered_slugs() -> Result<()> {
    let app = common::test_app();
    let seed = seed(&app).await?;

    let (_, first) = create_park(&app, &seed).await?;
    let (_, second) = create_park(&app, &seed).await?;
    let (_, third) = create_park(&app, &seed).await?;

    assert_eq!(first, "city-central-park");
    assert_eq!(second, "city-central-park-1");
    assert_eq!(third, "city-central-park-2");
    Ok(())
}

#[tokio::test]
async fn mutations_require_a_token() -> Result<()> {
    let app = common::test_app();
    let seed = seed(&app).await?;
    let (id, _) = create_park(&app, &seed).await?;

    let (status, _) =
        common::request(&app, "POST", "/api/spaces", None, Some(park_payload(&seed))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let path = format!("/api/spaces/{}", id);
    let (status, _) = common::request(&app, "PUT", &path, None, Some(json!({}))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::request(&app, "DELETE", &path, None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn unknown_taxonomy_ids_fail_the_whole_create() -> Result<()> {
    let app = common::test_app();
    let seed = seed(&app).await?;
    let bogus = "11111111-2222-3333-4444-555555555555";

    let mut payload = park_payload(&seed);
    payload["featureIds"] = json!([seed.playground, bogus]);

    let (status, body) =
        common::request(&app, "POST", "/api/spaces", Some(&seed.token), Some(payload)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"].as_str().is_some_and(|m| m.contains(bogus)),
        "missing id not named: {}",
        body
    );

    // Atomicity: nothing was persisted
    let (_, list) = common::request(&app, "GET", "/api/spaces", None, None).await?;
    assert_eq!(list["data"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn unknown_type_id_is_rejected() -> Result<()> {
    let app = common::test_app();
    let seed = seed(&app).await?;

    let mut payload = park_payload(&seed);
    payload["typeId"] = json!("11111111-2222-3333-4444-555555555555");

    let (status, body) =
        common::request(&app, "POST", "/api/spaces", Some(&seed.token), Some(payload)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn malformed_space_body_is_a_validation_error() -> Result<()> {
    let app = common::test_app();
    let seed = seed(&app).await?;

    let (status, body) = common::request(
        &app,
        "POST",
        "/api/spaces",
        Some(&seed.token),
        Some(json!({ "name": 42 })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .is_some_and(|m| m.starts_with("Invalid request body")),
        "unexpected message: {}",
        body
    );
    Ok(())
}

#[tokio::test]
async fn list_contains_every_created_space() -> Result<()> {
    let app = common::test_app();
    let seed = seed(&app).await?;

    create_park(&app, &seed).await?;
    let mut payload = park_payload(&seed);
    payload["name"] = json!("Riverside Gardens");
    let (status, _) =
        common::request(&app, "POST", "/api/spaces", Some(&seed.token), Some(payload)).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = common::request(&app, "GET", "/api/spaces", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    let listed: Vec<String> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(listed.len(), 2);
    assert!(listed.contains(&"City Central Park".to_string()));
    assert!(listed.contains(&"Riverside Gardens".to_string()));
    Ok(())
}

#[tokio::test]
async fn descriptions_only_update_keeps_slug_and_links() -> Result<()> {
    let app = common::test_app();
    let seed = seed(&app).await?;
    let (id, _) = create_park(&app, &seed).await?;

    let (status, body) = common::request(
        &app,
        "PUT",
        &format!("/api/spaces/{}", id),
        Some(&seed.token),
        Some(json!({ "descriptions": "Rewritten text" })),
    )
    .await?;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["data"]["descriptions"], "Rewritten text");
    assert_eq!(body["data"]["slug"], "city-central-park");
    assert_eq!(names(&body["data"]["categories"]), vec!["Natural", "Recreational"]);
    assert_eq!(names(&body["data"]["features"]), vec!["Playground", "Seating"]);
    Ok(())
}

#[tokio::test]
async fn empty_id_list_clears_links_absent_key_leaves_them() -> Result<()> {
    let app = common::test_app();
    let seed = seed(&app).await?;
    let (id, _) = create_park(&app, &seed).await?;
    let path = format!("/api/spaces/{}", id);

    let (status, body) = common::request(
        &app,
        "PUT",
        &path,
        Some(&seed.token),
        Some(json!({ "categoryIds": [] })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body["data"]["categories"]), Vec::<String>::new());
    assert_eq!(names(&body["data"]["features"]), vec!["Playground", "Seating"]);

    // A later update without the keys must not touch either set
    let (status, body) = common::request(
        &app,
        "PUT",
        &path,
        Some(&seed.token),
        Some(json!({ "activities": ["jogging"] })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body["data"]["categories"]), Vec::<String>::new());
    assert_eq!(names(&body["data"]["features"]), vec!["Playground", "Seating"]);
    assert_eq!(body["data"]["activities"], json!(["jogging"]));
    Ok(())
}

#[tokio::test]
async fn renaming_regenerates_the_slug() -> Result<()> {
    let app = common::test_app();
    let seed = seed(&app).await?;
    let (id, _) = create_park(&app, &seed).await?;

    let (status, body) = common::request(
        &app,
        "PUT",
        &format!("/api/spaces/{}", id),
        Some(&seed.token),
        Some(json!({ "name": "Riverside Gardens" })),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Riverside Gardens");
    assert_eq!(body["data"]["slug"], "riverside-gardens");

    // Old slug no longer resolves, new one does
    let (status, _) =
        common::request(&app, "GET", "/api/spaces/city-central-park", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) =
        common::request(&app, "GET", "/api/spaces/riverside-gardens", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn null_clears_a_field_but_absent_leaves_it() -> Result<()> {
    let app = common::test_app();
    let seed = seed(&app).await?;
    let (id, _) = create_park(&app, &seed).await?;
    let path = format!("/api/spaces/{}", id);

    let (status, body) = common::request(
        &app,
        "PUT",
        &path,
        Some(&seed.token),
        Some(json!({ "descriptions": null })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["descriptions"], Value::Null);

    let (status, body) = common::request(
        &app,
        "PUT",
        &path,
        Some(&seed.token),
        Some(json!({ "activities": ["reading"] })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["descriptions"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn only_the_submitter_can_update_or_delete() -> Result<()> {
    let app = common::test_app();
    let seed = seed(&app).await?;
    let (id, _) = create_park(&app, &seed).await?;
    let (other_token, _) = common::register_and_login(&app, "riley").await?;
    let path = format!("/api/spaces/{}", id);

    let (status, body) = common::request(
        &app,
        "PUT",
        &path,
        Some(&other_token),
        Some(json!({ "name": "Hijacked" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = common::request(&app, "DELETE", &path, Some(&other_token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Untouched by the failed attempts
    let (_, body) = common::request(&app, "GET", &path, None, None).await?;
    assert_eq!(body["data"]["name"], "City Central Park");
    Ok(())
}

#[tokio::test]
async fn delete_returns_identity_and_removes_the_space() -> Result<()> {
    let app = common::test_app();
    let seed = seed(&app).await?;
    let (id, _) = create_park(&app, &seed).await?;
    let path = format!("/api/spaces/{}", id);

    let (status, body) = common::request(&app, "DELETE", &path, Some(&seed.token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());
    assert_eq!(body["data"]["slug"], "city-central-park");

    let (status, _) = common::request(&app, "GET", &path, None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::request(&app, "DELETE", &path, Some(&seed.token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn missing_spaces_are_not_found() -> Result<()> {
    let app = common::test_app();
    let seed = seed(&app).await?;
    let path = "/api/spaces/11111111-2222-3333-4444-555555555555";

    let (status, _) = common::request(&app, "GET", path, None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        common::request(&app, "PUT", path, Some(&seed.token), Some(json!({}))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::request(&app, "DELETE", path, Some(&seed.token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::request(&app, "GET", "/api/spaces/no-such-slug", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
