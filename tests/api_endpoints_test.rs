use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};

use housing_classifier::artifacts::{
    Activation, ArtifactBundle, Imputer, LayerSpec, Network, NetworkSpec, Scaler,
};
use housing_classifier::io_struct::{ErrorBody, PredictResponse};
use housing_classifier::pipeline::InferencePipeline;
use housing_classifier::server::{self, AppState};
use serde_json::json;

/// Stub bundle with identity preprocessing and one softmax layer whose
/// logits are `[Rooms, Distance, 0]`: predictions are deterministic and the
/// winning class follows the larger of the first two features.
fn stub_state() -> web::Data<AppState> {
    let mut weights = vec![vec![0.0, 0.0, 0.0]; 5];
    weights[0] = vec![1.0, 0.0, 0.0];
    weights[1] = vec![0.0, 1.0, 0.0];
    let bundle = ArtifactBundle {
        imputer: Imputer {
            strategy: "mean".to_owned(),
            statistics: vec![3.0, 10.0, 1.0, 1.0, 450.0],
        },
        scaler: Scaler {
            mean: vec![0.0; 5],
            scale: vec![1.0; 5],
        },
        network: Network::from_spec(NetworkSpec {
            layers: vec![LayerSpec {
                weights,
                bias: vec![0.0, 0.0, 0.0],
                activation: Activation::Softmax,
            }],
        })
        .unwrap(),
    };
    web::Data::new(AppState {
        pipeline: InferencePipeline::new(bundle),
    })
}

macro_rules! test_app {
    () => {
        test::init_service(
            App::new()
                .app_data(stub_state())
                .configure(server::configure),
        )
        .await
    };
}

fn content_type(resp: &actix_web::dev::ServiceResponse) -> String {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, value) in values.iter().enumerate().skip(1) {
        if *value > values[best] {
            best = i;
        }
    }
    best
}

#[actix_web::test]
async fn root_serves_the_input_form() {
    let app = test_app!();
    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(content_type(&resp).starts_with("text/html"));
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    for field in ["Rooms", "Distance", "Bathroom", "Car", "Landsize"] {
        assert!(body.contains(&format!(r#"name="{field}""#)));
    }
}

#[actix_web::test]
async fn predict_path_serves_the_same_form() {
    let app = test_app!();
    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/predict").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(content_type(&resp).starts_with("text/html"));
}

#[actix_web::test]
async fn health_returns_ok() {
    let app = test_app!();
    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(body, "Ok");
}

#[actix_web::test]
async fn unknown_path_is_plain_text_404() {
    let app = test_app!();
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/metrics/all").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(content_type(&resp).starts_with("text/plain"));
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert_eq!(body, "Endpoint not found");
}

#[actix_web::test]
async fn json_single_record_predicts() {
    let app = test_app!();
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/predict")
            .set_json(json!({
                "Rooms": 3, "Distance": 5.2, "Bathroom": 1, "Car": 1, "Landsize": 120.0
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let response: PredictResponse = test::read_body_json(resp).await;
    assert_eq!(response.classes.len(), 1);
    assert_eq!(response.probabilities.len(), 1);
    let probs = &response.probabilities[0];
    assert_eq!(probs.len(), 3);
    assert!(probs.iter().all(|p| *p >= 0.0));
    assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-6);
    assert_eq!(response.classes[0], argmax(probs));
}

#[actix_web::test]
async fn json_batch_is_order_preserving() {
    let app = test_app!();
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/predict")
            .set_json(json!([
                {"Rooms": 2, "Distance": 10.0, "Bathroom": 1, "Car": 0, "Landsize": 300},
                {"Rooms": 4, "Distance": 1.0, "Bathroom": 2, "Car": 2, "Landsize": 50}
            ]))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let response: PredictResponse = test::read_body_json(resp).await;
    assert_eq!(response.classes.len(), 2);
    assert_eq!(response.probabilities.len(), 2);
    assert!(response.probabilities.iter().all(|p| p.len() == 3));
    // first record: Distance dominates; second: Rooms dominates
    assert_eq!(response.classes, vec![1, 0]);
}

#[actix_web::test]
async fn json_missing_keys_get_a_json_error() {
    let app = test_app!();
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/predict")
            .set_json(json!({"Rooms": 3, "Bathroom": 1}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(content_type(&resp).starts_with("application/json"));
    let body: ErrorBody = test::read_body_json(resp).await;
    assert!(body.error.contains("Distance"));
    assert!(body.error.contains("Car"));
    assert!(body.error.contains("Landsize"));
    assert!(!body.error.contains("Rooms"));
}

#[actix_web::test]
async fn json_request_twice_is_idempotent() {
    let app = test_app!();
    let payload = json!({
        "Rooms": 3, "Distance": 5.2, "Bathroom": 1, "Car": 1, "Landsize": 120.0
    });
    let mut bodies = Vec::new();
    for _ in 0..2 {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/predict")
                .set_json(payload.clone())
                .to_request(),
        )
        .await;
        let response: PredictResponse = test::read_body_json(resp).await;
        bodies.push(response.probabilities);
    }
    assert_eq!(bodies[0], bodies[1]);
}

#[actix_web::test]
async fn form_submit_renders_a_prediction_page() {
    let app = test_app!();
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/predict")
            .insert_header((header::CONTENT_TYPE, "application/x-www-form-urlencoded"))
            .set_payload("Rooms=3&Distance=5.2&Bathroom=1&Car=1&Landsize=120.0")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(content_type(&resp).starts_with("text/html"));
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(["Barata", "Media", "Cara"].iter().any(|l| body.contains(l)));

    let total: f64 = ["Barata (0): ", "Media (1): ", "Cara (2): "]
        .iter()
        .map(|prefix| {
            let start = body.find(prefix).expect("probability line present") + prefix.len();
            body[start..].split('<').next().unwrap().trim().parse::<f64>().unwrap()
        })
        .sum();
    assert!((total - 1.0).abs() < 0.005);

    // the submitted record is echoed back
    assert!(body.contains("Rooms: 3"));
    assert!(body.contains("Distance: 5.2"));
}

#[actix_web::test]
async fn form_missing_field_renders_html_error() {
    let app = test_app!();
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/predict")
            .insert_header((header::CONTENT_TYPE, "application/x-www-form-urlencoded"))
            .set_payload("Rooms=3&Distance=5.2&Bathroom=1&Car=1")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(content_type(&resp).starts_with("text/html"));
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("Landsize"));
}

#[actix_web::test]
async fn form_non_numeric_rooms_renders_html_error() {
    let app = test_app!();
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/predict")
            .insert_header((header::CONTENT_TYPE, "application/x-www-form-urlencoded"))
            .set_payload("Rooms=abc&Distance=5.2&Bathroom=1&Car=1&Landsize=120.0")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(content_type(&resp).starts_with("text/html"));
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("Rooms"));
    assert!(body.contains("abc"));
}
