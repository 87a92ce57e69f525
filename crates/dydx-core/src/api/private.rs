//! Authenticated client for the private `/v3` REST endpoints.

use dydx_auth::{canonicalize_body, ApiKeyCredentials, Clock, RequestAuthenticator, SystemClock};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use std::time::Duration as StdDuration;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;
use crate::types::order::CreateOrderBody;
use crate::{Error, Result};

/// Private API client for one account.
///
/// Every request is signed with the account's API key. Nothing is retried:
/// a resent order must be re-signed by the caller with a fresh timestamp.
pub struct PrivateClient<C: Clock = SystemClock> {
    config: ApiConfig,
    authenticator: RequestAuthenticator<C>,
    http_client: reqwest::Client,
}

impl PrivateClient<SystemClock> {
    pub fn new(config: ApiConfig, credentials: &ApiKeyCredentials) -> Result<Self> {
        let authenticator = RequestAuthenticator::new(credentials)?;
        Self::with_authenticator(config, authenticator)
    }
}

impl<C: Clock> PrivateClient<C> {
    /// Create a client around an existing authenticator.
    pub fn with_authenticator(
        config: ApiConfig,
        authenticator: RequestAuthenticator<C>,
    ) -> Result<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(config.timeout_secs))
            .connect_timeout(StdDuration::from_secs(10))
            .build()?;

        Ok(Self {
            config,
            authenticator,
            http_client,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Path of `endpoint` as sent and signed, e.g. `/v3/orders?market=ETH-USD`.
    ///
    /// Query parameters are form encoded and sorted by key so the signed
    /// path does not depend on the caller's parameter order.
    pub fn request_path(endpoint: &str, params: &[(&str, &str)]) -> String {
        let mut path = format!("/v3/{}", endpoint.trim_start_matches('/'));

        if !params.is_empty() {
            let mut sorted = params.to_vec();
            sorted.sort();

            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(sorted)
                .finish();
            path.push('?');
            path.push_str(&query);
        }

        path
    }

    /// Build a signed request without sending it.
    ///
    /// The body goes out in canonical form (sorted keys, nulls stripped),
    /// byte for byte what was signed.
    pub fn build_request(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, &str)],
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Request> {
        let path = Self::request_path(endpoint, params);

        let canonical_body = match body {
            Some(value) => Some(canonicalize_body(&serde_json::to_vec(value)?)?),
            None => None,
        };

        let headers = self.authenticator.build_headers(
            method.as_str(),
            &path,
            canonical_body.as_deref().map(str::as_bytes),
        )?;

        let url = format!("{}{}", self.config.host.trim_end_matches('/'), path);
        let mut builder = self.http_client.request(method, &url);

        for (name, value) in headers.header_pairs(&self.config.header_prefix) {
            builder = builder.header(name, value);
        }
        if let Some(body) = canonical_body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        Ok(builder.build()?)
    }

    /// Send a request built by [`Self::build_request`] and decode its JSON response.
    pub async fn send(&self, request: reqwest::Request) -> Result<serde_json::Value> {
        let method = request.method().clone();
        let path = request.url().path().to_string();

        debug!(method = %method, path = %path, "Sending private API request");

        let response = self.http_client.execute(request).await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    debug!(
                        method = %method,
                        path = %path,
                        error = %e,
                        "Failed to read error response body"
                    );
                    format!("<unreadable body: {}>", e)
                }
            };
            warn!(method = %method, path = %path, status = status, "Private API request failed");
            return Err(Error::Api {
                message: format!("{} {} failed: {} - {}", method, path, status, text),
                status: Some(status),
            });
        }

        Ok(response.json().await?)
    }

    /// Submit a signed order with `POST /v3/orders`.
    pub async fn create_order(&self, order: &CreateOrderBody) -> Result<serde_json::Value> {
        let body = serde_json::to_value(order)?;
        let request = self.build_request(Method::POST, "orders", &[], Some(&body))?;

        let result = self.send(request).await?;
        info!(
            market = %order.market,
            side = %order.side,
            client_id = %order.client_id,
            "Order posted successfully"
        );

        Ok(result)
    }
}

impl<C> std::fmt::Debug for PrivateClient<C>
where
    C: Clock,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateClient")
            .field("config", &self.config)
            .field("authenticator", &self.authenticator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::types::order::{OrderSide, OrderSigningRequest, OrderType, TimeInForce};
    use chrono::{TimeZone, Utc};
    use dydx_auth::FixedClock;

    const TEST_SECRET: &str = "dGVzdC1zZWNyZXQta2V5LW1hdGVyaWFsLTAxMjM0NTY=";

    fn test_client() -> PrivateClient<FixedClock> {
        let credentials =
            ApiKeyCredentials::new("test-key", "test-passphrase", TEST_SECRET).unwrap();
        let instant = Utc.with_ymd_and_hms(2022, 1, 2, 3, 4, 5).unwrap()
            + chrono::Duration::milliseconds(678);
        let clock = FixedClock(instant);
        let authenticator = RequestAuthenticator::with_clock(&credentials, clock).unwrap();
        PrivateClient::with_authenticator(Config::test_config().api, authenticator).unwrap()
    }

    fn header<'a>(request: &'a reqwest::Request, name: &str) -> &'a str {
        request.headers().get(name).unwrap().to_str().unwrap()
    }

    #[test]
    fn test_request_path_sorts_and_encodes_params() {
        assert_eq!(
            PrivateClient::<SystemClock>::request_path("orders", &[]),
            "/v3/orders"
        );
        assert_eq!(
            PrivateClient::<SystemClock>::request_path(
                "/orders",
                &[("status", "OPEN"), ("market", "ETH-USD")]
            ),
            "/v3/orders?market=ETH-USD&status=OPEN"
        );
        assert_eq!(
            PrivateClient::<SystemClock>::request_path("fills", &[("createdBeforeOrAt", "a b&c")]),
            "/v3/fills?createdBeforeOrAt=a+b%26c"
        );
    }

    #[test]
    fn test_get_request_signed_with_query() {
        let client = test_client();
        let request = client
            .build_request(Method::GET, "orders", &[("market", "ETH-USD")], None)
            .unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(
            request.url().as_str(),
            "http://localhost:8080/v3/orders?market=ETH-USD"
        );
        assert_eq!(
            header(&request, "DYDX-SIGNATURE"),
            "74W7Q_l7v0h0oVxS_ai6IeZzTzR4lRmkvUX7qfdayL0="
        );
        assert_eq!(header(&request, "DYDX-API-KEY"), "test-key");
        assert_eq!(header(&request, "DYDX-TIMESTAMP"), "2022-01-02T03:04:05.678Z");
        assert_eq!(header(&request, "DYDX-PASSPHRASE"), "test-passphrase");
        assert!(request.body().is_none());
    }

    #[test]
    fn test_post_request_sends_signed_canonical_body() {
        let client = test_client();
        let body = serde_json::json!({
            "side": "BUY",
            "price": "100",
            "cancelId": null,
            "market": "ETH-USD",
        });
        let request = client
            .build_request(Method::POST, "orders", &[], Some(&body))
            .unwrap();

        assert_eq!(
            header(&request, "DYDX-SIGNATURE"),
            "0BG-H4VSbxY0Hvg5UjS3RivQAY2dN1iyJHQWy9Y5MfY="
        );
        assert_eq!(header(&request, "content-type"), "application/json");

        let sent = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(
            std::str::from_utf8(sent).unwrap(),
            r#"{"market":"ETH-USD","price":"100","side":"BUY"}"#
        );
    }

    #[test]
    fn test_custom_header_prefix() {
        let credentials =
            ApiKeyCredentials::new("test-key", "test-passphrase", TEST_SECRET).unwrap();
        let config = ApiConfig {
            header_prefix: String::new(),
            ..Config::test_config().api
        };
        let client = PrivateClient::new(config, &credentials).unwrap();
        let request = client
            .build_request(Method::GET, "accounts", &[], None)
            .unwrap();

        assert!(request.headers().contains_key("SIGNATURE"));
        assert!(request.headers().contains_key("API-KEY"));
        assert!(!request.headers().contains_key("DYDX-SIGNATURE"));
    }

    #[test]
    fn test_non_object_body_rejected() {
        let client = test_client();
        let err = client
            .build_request(Method::POST, "orders", &[], Some(&serde_json::json!([1, 2])))
            .unwrap_err();

        assert!(matches!(err, Error::Auth(_)));
        assert!(!err.is_retriable());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let credentials =
            ApiKeyCredentials::new("test-key", "test-passphrase", TEST_SECRET).unwrap();
        let config = ApiConfig {
            host: "localhost".to_string(),
            ..ApiConfig::default()
        };

        assert!(matches!(
            PrivateClient::new(config, &credentials),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let rendered = format!("{:?}", test_client());
        assert!(!rendered.contains("test-passphrase"));
        assert!(!rendered.contains(TEST_SECRET));
    }

    /// Serve one canned HTTP response on a local port and return the host URL.
    async fn serve_once(response: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{}", addr)
    }

    fn client_for(host: String) -> PrivateClient {
        let credentials =
            ApiKeyCredentials::new("test-key", "test-passphrase", TEST_SECRET).unwrap();
        let config = ApiConfig {
            host,
            timeout_secs: 5,
            ..ApiConfig::default()
        };
        PrivateClient::new(config, &credentials).unwrap()
    }

    #[tokio::test]
    async fn test_rejected_request_carries_response_body() {
        let host = serve_once(
            "HTTP/1.1 400 Bad Request\r\nContent-Length: 9\r\nConnection: close\r\n\r\nbad order",
        )
        .await;
        let client = client_for(host);

        let request = client.build_request(Method::GET, "accounts", &[], None).unwrap();
        let err = client.send(request).await.unwrap_err();

        match &err {
            Error::Api { message, status } => {
                assert_eq!(*status, Some(400));
                assert!(message.contains("bad order"), "{}", message);
            }
            other => panic!("expected Api error, got {:?}", other),
        }
        assert!(!err.is_retriable());
    }

    #[tokio::test]
    async fn test_unreadable_error_body_is_reported() {
        // Promises 100 bytes, sends 7, then closes.
        let host = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\n\r\npartial",
        )
        .await;
        let client = client_for(host);

        let request = client.build_request(Method::GET, "accounts", &[], None).unwrap();
        let err = client.send(request).await.unwrap_err();

        match &err {
            Error::Api { message, status } => {
                assert_eq!(*status, Some(500));
                assert!(message.contains("<unreadable body"), "{}", message);
            }
            other => panic!("expected Api error, got {:?}", other),
        }
        assert!(err.is_retriable());
    }

    #[tokio::test]
    async fn test_create_order_transport_error() {
        let credentials =
            ApiKeyCredentials::new("test-key", "test-passphrase", TEST_SECRET).unwrap();
        let config = ApiConfig {
            // Nothing listens on port 1.
            host: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
            ..ApiConfig::default()
        };
        let client = PrivateClient::new(config, &credentials).unwrap();

        let request = OrderSigningRequest {
            network_id: 1,
            market: "ETH-USD".to_string(),
            side: OrderSide::Buy,
            position_id: "12345".to_string(),
            size: "1".to_string(),
            price: "100".to_string(),
            limit_fee: "0.01".to_string(),
            client_id: "client-1".to_string(),
            expiration_epoch_seconds: 1_700_000_000,
        };
        let order = CreateOrderBody::from_signing_request(
            &request,
            OrderType::Limit,
            TimeInForce::Gtt,
            false,
            "0xsignature",
        )
        .unwrap();

        let err = client.create_order(&order).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
        assert!(err.is_retriable());
    }
}
