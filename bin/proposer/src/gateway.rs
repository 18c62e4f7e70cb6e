//! HTTP contract against the external prover service.
//!
//! Proof bytes cross the wire base64-encoded inside JSON.  Status strings
//! are the prover's own vocabulary and stay opaque here; the driver matches
//! the two it cares about.

use std::time::Duration;

use async_trait::async_trait;
use pylon_primitives::Bytes32;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::*;

pub const PROOF_STATUS_FULFILLED: &str = "PROOF_FULFILLED";
pub const PROOF_STATUS_UNCLAIMED: &str = "PROOF_UNCLAIMED";

/// Proof requests kick off witness generation server-side, so the deadline
/// is generous.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(3 * 60);
const STATUS_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The call hit its deadline.  The request may still land server-side;
    /// callers must not fail the record off this alone.
    #[error("prover request timed out")]
    Timeout,

    #[error("http: {0}")]
    Http(reqwest::Error),

    #[error("bad prover response: {0}")]
    BadResponse(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize_vecs<S: Serializer>(
        subproofs: &[Vec<u8>],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let encoded: Vec<String> = subproofs.iter().map(|p| STANDARD.encode(p)).collect();
        encoded.serialize(serializer)
    }

    /// Accepts a base64 string, `null`, or an absent field.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) if !s.is_empty() => STANDARD.decode(&s).map_err(serde::de::Error::custom),
            _ => Ok(Vec::new()),
        }
    }
}

#[derive(Debug, Serialize)]
struct SpanProofRequest {
    start: u64,
    end: u64,
}

#[derive(Debug, Serialize)]
struct AggProofRequest {
    #[serde(serialize_with = "base64_bytes::serialize_vecs")]
    subproofs: Vec<Vec<u8>>,
    head: String,
}

#[derive(Debug, Deserialize)]
struct ProofResponse {
    proof_id: String,
}

#[derive(Debug, Deserialize)]
struct ProofStatusResponse {
    status: String,
    #[serde(default, deserialize_with = "base64_bytes::deserialize")]
    proof: Vec<u8>,
}

/// Request/poll contract against the prover.  Mockable for driver tests.
#[async_trait]
pub trait ProverGateway: Sync + Send + 'static {
    async fn request_span_proof(&self, start: u64, end: u64) -> Result<String, GatewayError>;

    async fn request_agg_proof(
        &self,
        subproofs: Vec<Vec<u8>>,
        l1_head: Bytes32,
    ) -> Result<String, GatewayError>;

    /// Returns the raw status string and the proof bytes, which are empty
    /// until fulfillment.
    async fn get_proof_status(&self, proof_id: &str)
        -> Result<(String, Vec<u8>), GatewayError>;
}

pub struct HttpProverGateway {
    base_url: String,
    request_client: reqwest::Client,
    status_client: reqwest::Client,
}

impl HttpProverGateway {
    pub fn new(base_url: String) -> Self {
        let request_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build prover request client!");
        let status_client = reqwest::Client::builder()
            .timeout(STATUS_TIMEOUT)
            .build()
            .expect("Failed to build prover status client!");

        Self {
            base_url,
            request_client,
            status_client,
        }
    }

    async fn post_proof_request<T: Serialize>(
        &self,
        url_path: &str,
        body: &T,
    ) -> Result<String, GatewayError> {
        let url = format!("{}/{}", self.base_url, url_path);
        let resp = self.request_client.post(&url).json(body).send().await?;
        let response: ProofResponse = resp
            .json()
            .await
            .map_err(|e| GatewayError::BadResponse(e.to_string()))?;
        info!(proof_id = %response.proof_id, "successfully submitted proof request");
        Ok(response.proof_id)
    }
}

#[async_trait]
impl ProverGateway for HttpProverGateway {
    async fn request_span_proof(&self, start: u64, end: u64) -> Result<String, GatewayError> {
        info!(%start, %end, "requesting span proof");
        self.post_proof_request("request_span_proof", &SpanProofRequest { start, end })
            .await
    }

    async fn request_agg_proof(
        &self,
        subproofs: Vec<Vec<u8>>,
        l1_head: Bytes32,
    ) -> Result<String, GatewayError> {
        info!(count = subproofs.len(), head = %l1_head, "requesting agg proof");
        let body = AggProofRequest {
            subproofs,
            head: l1_head.to_string(),
        };
        self.post_proof_request("request_agg_proof", &body).await
    }

    async fn get_proof_status(
        &self,
        proof_id: &str,
    ) -> Result<(String, Vec<u8>), GatewayError> {
        let url = format!("{}/status/{}", self.base_url, proof_id);
        let resp = self.status_client.get(&url).send().await?;
        let response: ProofStatusResponse = resp
            .json()
            .await
            .map_err(|e| GatewayError::BadResponse(e.to_string()))?;
        Ok((response.status, response.proof))
    }
}
