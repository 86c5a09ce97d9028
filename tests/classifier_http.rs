use deskserver::classifier::{Classifier, ClassifierError, HttpClassifier};
use deskserver::core::shared::models::CategorySample;
use mockito::Matcher;
use serde_json::json;

#[tokio::test]
async fn test_classify_parses_label() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/classify")
        .match_body(Matcher::Json(json!({ "Text": "leaking pipe" })))
        .with_status(202)
        .with_header("content-type", "application/json")
        .with_body("\"3\"")
        .create_async()
        .await;

    let classifier = HttpClassifier::new(&server.url());
    assert_eq!(classifier.classify("leaking pipe").await.unwrap(), 3);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_classify_rejects_unexpected_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/classify")
        .with_status(200)
        .with_body("\"3\"")
        .create_async()
        .await;

    let classifier = HttpClassifier::new(&server.url());
    assert!(matches!(
        classifier.classify("leaking pipe").await,
        Err(ClassifierError::UnexpectedStatus(200))
    ));
}

#[tokio::test]
async fn test_classify_rejects_non_numeric_label() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/classify")
        .with_status(202)
        .with_body("\"plumbing\"")
        .create_async()
        .await;

    let classifier = HttpClassifier::new(&server.url());
    assert!(matches!(
        classifier.classify("leaking pipe").await,
        Err(ClassifierError::InvalidLabel(_))
    ));
}

#[tokio::test]
async fn test_train_sends_labelled_samples() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/train")
        .match_body(Matcher::Json(json!([
            { "Text": "no hot water", "Class": "4" },
            { "Text": "broken elevator", "Class": "9" }
        ])))
        .with_status(202)
        .create_async()
        .await;

    let classifier = HttpClassifier::new(&format!("{}/", server.url()));
    let samples = vec![
        CategorySample {
            category_id: 4,
            text: "no hot water".into(),
        },
        CategorySample {
            category_id: 9,
            text: "broken elevator".into(),
        },
    ];
    classifier.train(&samples).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_training_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/training")
        .with_status(200)
        .with_body("true")
        .create_async()
        .await;

    let classifier = HttpClassifier::new(&server.url());
    assert!(classifier.is_training().await.unwrap());
}

#[tokio::test]
async fn test_unreachable_classifier_is_a_transport_error() {
    let classifier = HttpClassifier::new("http://127.0.0.1:9");
    assert!(matches!(
        classifier.classify("leaking pipe").await,
        Err(ClassifierError::Transport(_))
    ));
}
