//! Status mapping, envelope rendering, and extractor error handlers.

use super::*;
use actix_web::body::to_bytes;
use actix_web::{App, test as actix_test, web as aweb};
use rstest::{fixture, rstest};
use serde::Deserialize;
use serde_json::{Value, json};

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn internal_with_details() -> Error {
    Error::internal("Failed to generate emoji")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"provider": "upstream said no"}))
}

async fn render(error: &Error) -> (StatusCode, Option<String>, Value) {
    let response = ResponseError::error_response(error);
    let status = response.status();
    let trace = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = to_bytes(response.into_body())
        .await
        .expect("body is readable");
    let body = serde_json::from_slice(&bytes).expect("envelope is JSON");
    (status, trace, body)
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("Authentication required"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("Emoji not found"), StatusCode::NOT_FOUND)]
#[case(Error::internal("Failed to fetch emojis"), StatusCode::INTERNAL_SERVER_ERROR)]
fn codes_map_to_statuses(#[case] error: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), status);
}

#[rstest]
#[actix_web::test]
async fn internal_errors_keep_message_but_drop_details(internal_with_details: Error) {
    let (status, trace, body) = render(&internal_with_details).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(trace.as_deref(), Some(TRACE_ID));
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Failed to generate emoji"));
    assert_eq!(body["code"], json!("internal_error"));
    assert_eq!(body["traceId"], json!(TRACE_ID));
    assert!(body.get("details").is_none());
}

#[rstest]
#[actix_web::test]
async fn client_errors_keep_details() {
    let error = Error::invalid_request("prompt must not be empty")
        .with_details(json!({"field": "prompt"}));

    let (status, trace, body) = render(&error).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(trace.is_none());
    assert_eq!(body["details"], json!({"field": "prompt"}));
    assert!(body.get("traceId").is_none());
}

#[rstest]
fn actix_errors_become_redacted_internal_errors() {
    let err: Error = actix_web::error::ErrorBadRequest("boom").into();

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), REDACTED_MESSAGE);
    assert!(err.details().is_none());
}

#[derive(Deserialize)]
struct Body {
    #[expect(dead_code, reason = "only deserialisation is exercised")]
    prompt: String,
}

#[derive(Deserialize)]
struct Query {
    #[expect(dead_code, reason = "only deserialisation is exercised")]
    limit: u8,
}

#[rstest]
#[case::json(
    actix_test::TestRequest::post()
        .uri("/body")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
)]
#[case::query(actix_test::TestRequest::get().uri("/query?limit=lots"))]
#[actix_web::test]
async fn extractor_failures_render_invalid_request(#[case] request: actix_test::TestRequest) {
    let app = actix_test::init_service(
        App::new()
            .configure(extractor_config)
            .route(
                "/body",
                aweb::post().to(|_body: aweb::Json<Body>| async { HttpResponse::Ok() }),
            )
            .route(
                "/query",
                aweb::get().to(|_query: aweb::Query<Query>| async { HttpResponse::Ok() }),
            ),
    )
    .await;

    let response = actix_test::call_service(&app, request.to_request()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], json!("invalid_request"));
    assert_eq!(body["success"], json!(false));
}
