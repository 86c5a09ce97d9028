//! Client side of the external text classifier.
//!
//! The service learns from labelled samples and answers with a class label
//! for free text. Labels are the decimal form of a category id.

use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use serde::Serialize;

use crate::core::shared::models::CategorySample;

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Unexpected status code: {0}")]
    UnexpectedStatus(u16),
    #[error("Class label is not a category id: {0:?}")]
    InvalidLabel(String),
}

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Submits a training job. The service accepts it and trains in the
    /// background.
    async fn train(&self, samples: &[CategorySample]) -> Result<(), ClassifierError>;

    async fn is_training(&self) -> Result<bool, ClassifierError>;

    async fn classify(&self, text: &str) -> Result<i32, ClassifierError>;
}

pub fn category_label(category_id: i32) -> String {
    category_id.to_string()
}

pub fn parse_category_label(label: &str) -> Result<i32, ClassifierError> {
    label
        .trim()
        .parse()
        .map_err(|_| ClassifierError::InvalidLabel(label.to_string()))
}

#[derive(Debug, Serialize)]
struct TrainingDocument<'a> {
    #[serde(rename = "Text")]
    text: &'a str,
    #[serde(rename = "Class")]
    class: String,
}

#[derive(Debug, Serialize)]
struct ClassifyDocument<'a> {
    #[serde(rename = "Text")]
    text: &'a str,
}

pub struct HttpClassifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClassifier {
    const TRAIN_PATH: &'static str = "/train";
    const TRAINING_PATH: &'static str = "/training";
    const CLASSIFY_PATH: &'static str = "/classify";

    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn train(&self, samples: &[CategorySample]) -> Result<(), ClassifierError> {
        let docs: Vec<TrainingDocument<'_>> = samples
            .iter()
            .map(|s| TrainingDocument {
                text: &s.text,
                class: category_label(s.category_id),
            })
            .collect();

        let response = self
            .client
            .post(self.url(Self::TRAIN_PATH))
            .json(&docs)
            .send()
            .await?;

        if response.status() != StatusCode::ACCEPTED {
            return Err(ClassifierError::UnexpectedStatus(response.status().as_u16()));
        }

        debug!("Classifier accepted {} training samples", docs.len());
        Ok(())
    }

    async fn is_training(&self) -> Result<bool, ClassifierError> {
        let response = self.client.get(self.url(Self::TRAINING_PATH)).send().await?;

        if response.status() != StatusCode::OK {
            return Err(ClassifierError::UnexpectedStatus(response.status().as_u16()));
        }

        Ok(response.json::<bool>().await?)
    }

    async fn classify(&self, text: &str) -> Result<i32, ClassifierError> {
        let response = self
            .client
            .post(self.url(Self::CLASSIFY_PATH))
            .json(&ClassifyDocument { text })
            .send()
            .await?;

        if response.status() != StatusCode::ACCEPTED {
            return Err(ClassifierError::UnexpectedStatus(response.status().as_u16()));
        }

        let label: String = response.json().await?;
        parse_category_label(&label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip() {
        assert_eq!(parse_category_label(&category_label(17)).unwrap(), 17);
    }

    #[test]
    fn test_invalid_label() {
        assert!(matches!(
            parse_category_label("plumbing"),
            Err(ClassifierError::InvalidLabel(label)) if label == "plumbing"
        ));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let classifier = HttpClassifier::new("http://classifier:8090/");
        assert_eq!(
            classifier.url(HttpClassifier::CLASSIFY_PATH),
            "http://classifier:8090/classify"
        );
    }

    #[test]
    fn test_training_document_shape() {
        let doc = TrainingDocument {
            text: "no hot water",
            class: category_label(4),
        };
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            serde_json::json!({ "Text": "no hot water", "Class": "4" })
        );
    }
}
