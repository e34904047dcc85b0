use std::sync::Arc;

use machine_learning::dataset::Dataset;
use mystery_solver::{
    ModelService,
    classifier::{INPUT_DIM, NUM_CLASSES},
    http,
};
use serde_json::{Value, json};
use tokio::io::{self, AsyncReadExt, AsyncWriteExt};

fn service(loaded: bool) -> Arc<ModelService> {
    let dataset = loaded.then(|| {
        let features = (0..10 * INPUT_DIM).map(|i| (i % 7) as f32 / 7.).collect();
        let labels = (0..10).map(|i| i % NUM_CLASSES).collect();
        Dataset::new(features, labels, INPUT_DIM).unwrap()
    });

    Arc::new(ModelService::new(dataset, Some(3)).unwrap())
}

/// Sends `raw` through a fresh connection and returns everything the server wrote back.
async fn exchange(service: &Arc<ModelService>, raw: &str) -> String {
    let (mut client, server) = io::duplex(1 << 16);
    let conn = tokio::spawn(http::serve_connection(server, Arc::clone(service)));

    client.write_all(raw.as_bytes()).await.unwrap();
    client.shutdown().await.unwrap();

    let mut buf = String::new();
    client.read_to_string(&mut buf).await.unwrap();
    conn.await.unwrap().unwrap();
    buf
}

/// Sends a single request and splits the response into its status code, headers and JSON body.
async fn request(service: &Arc<ModelService>, method: &str, target: &str) -> (u16, String, Value) {
    let raw = format!("{method} {target} HTTP/1.1\r\nHost: localhost\r\n\r\n");
    let res = exchange(service, &raw).await;

    let (head, body) = res.split_once("\r\n\r\n").unwrap();
    let status = head.split_whitespace().nth(1).unwrap().parse().unwrap();
    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body).unwrap()
    };

    (status, head.to_string(), body)
}

#[tokio::test]
async fn liveness() {
    let (status, head, body) = request(&service(true), "GET", "/").await;

    assert_eq!(status, 200);
    assert!(head.contains("Access-Control-Allow-Origin: *"));
    assert_eq!(
        body,
        json!({"status": "ok", "message": "Mystery Solver Backend", "data_loaded": true})
    );

    let (_, _, body) = request(&service(false), "GET", "/").await;
    assert_eq!(body["data_loaded"], false);
}

#[tokio::test]
async fn architecture() {
    let (status, _, body) = request(&service(false), "GET", "/model/architecture").await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({"layers": [205, 512, 512, 5]}));
}

#[tokio::test]
async fn weights() {
    let (status, _, body) = request(&service(true), "GET", "/model/weights").await;
    assert_eq!(status, 200);

    let rows = |layer: &str| body[layer]["weights"].as_array().unwrap().len();
    let cols = |layer: &str| body[layer]["weights"][0].as_array().unwrap().len();
    let bias = |layer: &str| body[layer]["bias"].as_array().unwrap().len();

    assert_eq!((rows("layer1"), cols("layer1"), bias("layer1")), (32, 32, 32));
    assert_eq!((rows("layer2"), cols("layer2"), bias("layer2")), (32, 32, 32));
    assert_eq!((rows("output"), cols("output"), bias("output")), (5, 32, 5));
    assert!(body.get("updates").is_none());
}

#[tokio::test]
async fn train_step_defaults() {
    let service = service(true);
    let (status, _, body) = request(&service, "POST", "/train/step").await;

    assert_eq!(status, 200);
    assert!(body["loss"].as_f64().unwrap() > 0.);
    assert!((0. ..=1.).contains(&body["accuracy"].as_f64().unwrap()));
    assert_eq!(service.updates(), 1);
    assert_eq!(service.learning_rate(), 0.001);
}

#[tokio::test]
async fn train_step_with_params() {
    let service = service(true);
    let (status, _, _) = request(&service, "POST", "/train/step?epochs=3&lr=0.05").await;

    assert_eq!(status, 200);
    assert_eq!(service.updates(), 3);
    assert_eq!(service.learning_rate(), 0.05);
}

#[tokio::test]
async fn train_step_without_data() {
    let (status, _, body) = request(&service(false), "POST", "/train/step").await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({"error": "Data not loaded"}));
}

#[tokio::test]
async fn train_step_rejects_invalid_params() {
    let service = service(true);

    for target in [
        "/train/step?epochs=0",
        "/train/step?epochs=-2",
        "/train/step?epochs=many",
        "/train/step?lr=0",
        "/train/step?lr=-0.1",
        "/train/step?lr=fast",
    ] {
        let (status, _, body) = request(&service, "POST", target).await;
        assert_eq!(status, 422, "{target}");
        assert!(body["error"].is_string(), "{target}");
    }

    assert_eq!(service.updates(), 0);
}

#[tokio::test]
async fn reset() {
    let service = service(true);
    request(&service, "POST", "/train/step?epochs=2").await;

    let (status, _, body) = request(&service, "POST", "/reset").await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({"message": "Model reset"}));
    assert_eq!(service.updates(), 0);
}

#[tokio::test]
async fn unknown_routes_and_methods() {
    let service = service(true);

    let (status, _, _) = request(&service, "GET", "/model/gradients").await;
    assert_eq!(status, 404);

    let (status, _, _) = request(&service, "GET", "/reset").await;
    assert_eq!(status, 405);

    let (status, _, _) = request(&service, "DELETE", "/model/weights").await;
    assert_eq!(status, 405);
    assert_eq!(service.updates(), 0);
}

#[tokio::test]
async fn preflight() {
    let (status, head, body) = request(&service(true), "OPTIONS", "/train/step").await;

    assert_eq!(status, 204);
    assert!(head.contains("Access-Control-Allow-Methods: GET, POST, OPTIONS"));
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn keeps_the_connection_alive() {
    let service = service(true);
    let raw = "POST /train/step HTTP/1.1\r\n\r\n\
               POST /train/step HTTP/1.1\r\nContent-Length: 2\r\n\r\n{}\
               GET /model/architecture HTTP/1.1\r\n\r\n";

    let res = exchange(&service, raw).await;

    assert_eq!(res.matches("HTTP/1.1 200 OK").count(), 3);
    assert!(res.ends_with(r#"{"layers":[205,512,512,5]}"#));
    assert_eq!(service.updates(), 2);
}

#[tokio::test]
async fn malformed_request() {
    let res = exchange(&service(true), "nonsense\r\n\r\n").await;
    assert!(res.starts_with("HTTP/1.1 400 Bad Request\r\n"));
}
