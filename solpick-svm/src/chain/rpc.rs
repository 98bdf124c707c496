//! A JSON-RPC client for the handful of Solana methods the payment flow uses.
//!
//! - `getSignaturesForAddress` - recent activity on an account
//! - `getTransaction` (with `jsonParsed` encoding) - instruction-level detail
//! - `getLatestBlockhash` - recency anchor for new transactions
//!
//! HTTP 429 and JSON-RPC code 429 both surface as
//! [`ProviderError::RateLimited`], so callers can wrap calls in
//! [`solpick::with_retry`].

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use solana_commitment_config::CommitmentConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use super::{
    Address, LatestBlockhash, LedgerHistory, ParsedTransaction, ProviderError, SignatureInfo,
};

#[derive(Debug, Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

/// HTTP client for a Solana JSON-RPC endpoint.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct RpcClient {
    url: Url,
    client: Client,
    headers: HeaderMap,
    timeout: Option<Duration>,
    commitment: CommitmentConfig,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    /// Creates a client for `url` reading at `confirmed` commitment.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            url,
            client: Client::new(),
            headers: HeaderMap::new(),
            timeout: None,
            commitment: CommitmentConfig::confirmed(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Attaches custom headers to all future requests.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets a timeout for all future requests.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the commitment level for all future reads.
    #[must_use]
    pub const fn with_commitment(mut self, commitment: CommitmentConfig) -> Self {
        self.commitment = commitment;
        self
    }

    /// Endpoint this client talks to.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Commitment used for reads.
    #[must_use]
    pub const fn commitment(&self) -> CommitmentConfig {
        self.commitment
    }

    /// Up to `limit` signatures for transactions involving `address`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport, status or decode failures.
    pub async fn get_signatures_for_address(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, ProviderError> {
        const METHOD: &str = "getSignaturesForAddress";
        let params = json!([
            address.to_string(),
            { "limit": limit, "commitment": self.commitment.commitment }
        ]);
        self.call(METHOD, params)
            .await?
            .ok_or(ProviderError::MissingResult { context: METHOD })
    }

    /// The transaction for `signature` in `jsonParsed` encoding, `None` if the
    /// node does not know it.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport, status or decode failures.
    pub async fn get_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<ParsedTransaction>, ProviderError> {
        let params = json!([
            signature,
            {
                "encoding": "jsonParsed",
                "commitment": self.commitment.commitment,
                "maxSupportedTransactionVersion": 0
            }
        ]);
        self.call("getTransaction", params).await
    }

    /// The most recent blockhash at the configured commitment.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport, status or decode failures.
    pub async fn get_latest_blockhash(&self) -> Result<LatestBlockhash, ProviderError> {
        const METHOD: &str = "getLatestBlockhash";
        let params = json!([{ "commitment": self.commitment.commitment }]);
        self.call::<WithContext<LatestBlockhash>>(METHOD, params)
            .await?
            .map(|response| response.value)
            .ok_or(ProviderError::MissingResult { context: METHOD })
    }

    /// Sends one JSON-RPC request and unwraps the envelope.
    ///
    /// A `null` result comes back as `Ok(None)`.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "solpick.rpc.call", skip(self, params), err)
    )]
    async fn call<R>(&self, method: &'static str, params: Value) -> Result<Option<R>, ProviderError>
    where
        R: DeserializeOwned,
    {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });
        let mut req = self.client.post(self.url.clone()).json(&body);
        for (key, value) in &self.headers {
            req = req.header(key, value);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let http_response = req.send().await.map_err(|e| ProviderError::Http {
            context: method,
            source: Box::new(e),
        })?;

        let status = http_response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited { context: method });
        }
        let bytes = http_response
            .bytes()
            .await
            .map_err(|e| ProviderError::Http {
                context: method,
                source: Box::new(e),
            })?;
        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                context: method,
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let envelope: RpcResponse<R> = serde_json::from_slice(&bytes)
            .map_err(|e| ProviderError::JsonDeserialization {
                context: method,
                source: e,
            })?;
        match envelope.error {
            Some(error) if error.code == 429 => Err(ProviderError::RateLimited { context: method }),
            Some(error) => Err(ProviderError::Rpc {
                context: method,
                code: error.code,
                message: error.message,
            }),
            None => Ok(envelope.result),
        }
    }
}

#[async_trait]
impl LedgerHistory for RpcClient {
    async fn list_recent_signatures(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, ProviderError> {
        self.get_signatures_for_address(address, limit).await
    }

    async fn fetch_parsed_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<ParsedTransaction>, ProviderError> {
        self.get_transaction(signature).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> RpcClient {
        RpcClient::new(server.uri().parse::<Url>().unwrap())
    }

    #[tokio::test]
    async fn test_signatures_request_shape() {
        let server = MockServer::start().await;
        let address = Address::from_bytes([4; 32]);

        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "getSignaturesForAddress",
                "params": [address.to_string(), {"limit": 10, "commitment": "confirmed"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": [
                    {"signature": "sigA", "slot": 10, "err": null},
                    {"signature": "sigB", "slot": 9, "err": {"InstructionError": [0, "Custom"]}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let signatures = client_for(&server)
            .await
            .get_signatures_for_address(&address, 10)
            .await
            .unwrap();
        assert_eq!(signatures.len(), 2);
        assert_eq!(signatures[0].signature, "sigA");
        assert!(signatures[1].is_failed());
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "getTransaction",
                "params": ["sigX", {"encoding": "jsonParsed", "maxSupportedTransactionVersion": 0}]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": null})),
            )
            .mount(&server)
            .await;

        let tx = client_for(&server).await.get_transaction("sigX").await.unwrap();
        assert!(tx.is_none());
    }

    #[tokio::test]
    async fn test_http_429_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .get_transaction("sig")
            .await
            .unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_rpc_error_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32602, "message": "Invalid param: WrongSize"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .get_signatures_for_address(&Address::from_bytes([1; 32]), 5)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Rpc { code: -32602, ref message, .. } if message.contains("WrongSize")
        ));
        assert!(!err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_server_error_keeps_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .get_latest_blockhash()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::HttpStatus { status: 503, ref body, .. } if body == "maintenance"
        ));
    }

    #[tokio::test]
    async fn test_latest_blockhash() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "getLatestBlockhash"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "context": {"slot": 2792},
                    "value": {
                        "blockhash": "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N",
                        "lastValidBlockHeight": 3090
                    }
                }
            })))
            .mount(&server)
            .await;

        let latest = client_for(&server)
            .await
            .get_latest_blockhash()
            .await
            .unwrap();
        assert_eq!(
            latest.blockhash,
            "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N"
        );
        assert_eq!(latest.last_valid_block_height, 3090);
    }

    #[tokio::test]
    async fn test_garbage_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .get_transaction("sig")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::JsonDeserialization { .. }));
    }
}
