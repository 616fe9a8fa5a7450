// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the external road-image classification service.
//!
//! The service exposes `POST /predict` taking a multipart `image` field and
//! answering `{"class": "Road" | "Not Road", "confidence": 0.0..1.0}`.
//! Any transport failure, timeout, non-success status or malformed body is
//! reported as `AppError::ClassificationUnavailable`.

use crate::error::AppError;
use crate::workflow::ClassificationResult;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Labels an image.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        image_name: &str,
        image: Vec<u8>,
    ) -> Result<ClassificationResult, AppError>;
}

/// Raw `/predict` response body.
#[derive(Debug, Deserialize)]
struct Prediction {
    class: String,
    confidence: f64,
}

/// HTTP classifier client.
#[derive(Clone)]
pub struct HttpClassifier {
    http: reqwest::Client,
    base_url: String,
}

impl HttpClassifier {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(
        &self,
        image_name: &str,
        image: Vec<u8>,
    ) -> Result<ClassificationResult, AppError> {
        let url = format!("{}/predict", self.base_url);
        let size = image.len();

        let part = reqwest::multipart::Part::bytes(image).file_name(image_name.to_string());
        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                };
                AppError::ClassificationUnavailable(reason)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ClassificationUnavailable(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let prediction: Prediction = response.json().await.map_err(|e| {
            AppError::ClassificationUnavailable(format!("Malformed response: {}", e))
        })?;

        if !prediction.confidence.is_finite() || !(0.0..=1.0).contains(&prediction.confidence) {
            return Err(AppError::ClassificationUnavailable(format!(
                "Confidence {} outside [0, 1]",
                prediction.confidence
            )));
        }

        tracing::debug!(
            image_name,
            size,
            label = %prediction.class,
            confidence = prediction.confidence,
            "Image classified"
        );

        Ok(ClassificationResult {
            label: prediction.class,
            confidence: prediction.confidence,
        })
    }
}
