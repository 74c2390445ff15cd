//! Transport binding tests: in-process router and a served listener.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request, StatusCode};
use tower::ServiceExt;

use common::start_mock_backend;
use urlfetcher::transport::MSGPACK_CONTENT_TYPE;
use urlfetcher::wire::{
    decode_response, encode_request, DecodedRequest, GetRequest, RequestOptions, ResponseTuple,
    UNEXPECTED_RESPONSE,
};
use urlfetcher::{Shutdown, WorkerServer};

fn server() -> WorkerServer {
    WorkerServer::new(Arc::new(common::worker()))
}

fn get_payload(url: String) -> Vec<u8> {
    encode_request(&DecodedRequest::Get(GetRequest {
        url,
        timeout_ms: 5000,
        options: RequestOptions::default(),
    }))
    .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn test_get_route_answers_with_tuple() {
    let addr = start_mock_backend(200, "hello").await;

    let response = server()
        .router()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/get")
                .body(Body::from(get_payload(format!("http://{addr}/"))))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        MSGPACK_CONTENT_TYPE
    );

    let tuple = decode_response(&body_bytes(response).await).unwrap();
    assert!(tuple.success);
    assert_eq!(tuple.code, 200);
    assert_eq!(tuple.body, b"hello");
}

#[tokio::test]
async fn test_garbage_body_answers_unexpected() {
    let response = server()
        .router()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/post")
                .body(Body::from("garbage"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    assert_eq!(body, UNEXPECTED_RESPONSE.to_vec());
    assert_eq!(decode_response(&body).unwrap(), ResponseTuple::unexpected());
}

#[tokio::test]
async fn test_unknown_verb_is_not_found() {
    let response = server()
        .router()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/put")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wrong_method_is_rejected() {
    let response = server()
        .router()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/get")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_served_listener_handles_call_and_shuts_down() {
    let backend = start_mock_backend(200, "served").await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server().run(listener, shutdown.subscribe()));

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let response = client
        .post(format!("http://{addr}/get"))
        .header(CONTENT_TYPE, MSGPACK_CONTENT_TYPE)
        .body(get_payload(format!("http://{backend}/")))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let tuple = decode_response(&response.bytes().await.unwrap()).unwrap();
    assert!(tuple.success);
    assert_eq!(tuple.body, b"served");

    drop(client);
    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
