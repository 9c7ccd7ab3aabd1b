//! Black-box tests of the auth layer through the router.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header::AUTHORIZATION};
use axum::response::Response;
use serde_json::{Value, json};
use tower::ServiceExt;

use tollgate_api::app::build_app;
use tollgate_auth::{OrgRoleEntry, OrgRoles, Role, Service, User, build_permissions};
use tollgate_core::{AuthError, ClaimValue};
use tollgate_infra::testing::FnParser;

fn user_for(header: &str) -> User {
    let groups = ClaimValue::from_json(json!([
        { "c": "G", "t": "org", "p": { "hotels": { "booking": ["r1"] } } }
    ]))
    .expect("valid claim");
    User {
        authorization: header.to_string(),
        permissions: build_permissions([&groups], None),
        orgs: OrgRoles::new(vec![
            OrgRoleEntry::new("org1", Role::Editor).with_service(Service::ENTITIES, Role::Owner),
        ]),
        member_ids: vec!["m-1".to_string()],
        ..Default::default()
    }
}

fn app() -> axum::Router {
    let parser = FnParser::new(|header: &str| match header {
        "Bearer good" => Ok(user_for(header)),
        "Bearer dummy" => Ok(User::dummy(header)),
        _ => Err(AuthError::invalid_credential("signature mismatch")),
    });
    build_app(Arc::new(parser))
}

async fn get(uri: &str, authorization: Option<&str>) -> Response {
    let mut req = Request::builder().uri(uri);
    if let Some(value) = authorization {
        req = req.header(AUTHORIZATION, value);
    }
    app()
        .oneshot(req.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(res: Response) -> String {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(res: Response) -> Value {
    serde_json::from_str(&body_text(res).await).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let res = get("/health", None).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_header_is_rejected() {
    let res = get("/me", None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(res).await, "Authorization header required");
}

#[tokio::test]
async fn parser_errors_are_returned_as_401_text() {
    let res = get("/me", Some("Bearer forged")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(res).await.contains("signature mismatch"));
}

#[tokio::test]
async fn authenticated_user_reaches_the_handler() {
    let res = get("/me", Some("Bearer good")).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    assert_eq!(body["member_ids"], json!(["m-1"]));
    assert_eq!(body["is_dummy"], json!(false));
    assert_eq!(body["groups"]["org"], json!(["G"]));
    assert_eq!(body["orgs"][0]["org"], json!("org1"));
}

#[tokio::test]
async fn permission_check_uses_the_parsed_user() {
    let res = get("/permissions/check?product=hotels&object=booking&kind=r", Some("Bearer good")).await;
    assert_eq!(body_json(res).await, json!({ "granted": true, "groups": ["G"] }));

    let res = get("/permissions/check?product=hotels&object=booking&kind=d", Some("Bearer good")).await;
    assert_eq!(body_json(res).await, json!({ "granted": false, "groups": [] }));

    let res = get(
        "/permissions/check?product=hotels&object=booking&kind=r&groups=X,G",
        Some("Bearer good"),
    )
    .await;
    assert_eq!(body_json(res).await, json!({ "granted": true, "groups": ["G"] }));

    let res = get("/permissions/check?product=hotels&object=booking&kind=rw", Some("Bearer good")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dummy_user_is_authenticated_but_entitled_to_nothing() {
    let res = get("/permissions/check?product=hotels&object=booking&kind=r", Some("Bearer dummy")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await, json!({ "granted": false, "groups": [] }));
}

#[tokio::test]
async fn orgs_honour_role_and_service_filters() {
    let res = get("/orgs?role=OWNER", Some("Bearer good")).await;
    assert_eq!(body_json(res).await["orgs"], json!([]));

    let res = get("/orgs?role=OWNER&service=ENTITIES", Some("Bearer good")).await;
    assert_eq!(body_json(res).await["orgs"], json!(["org1"]));

    let res = get("/orgs", Some("Bearer good")).await;
    let body = body_json(res).await;
    assert_eq!(body["role"], json!("VIEWER"));
    assert_eq!(body["orgs"], json!(["org1"]));
}
