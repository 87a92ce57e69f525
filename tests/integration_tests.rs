//! Integration tests for component interactions.
//!
//! These tests verify that payload building, order submission bodies and
//! request authentication work together correctly.

use chrono::{TimeZone, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rust_decimal::Decimal;
use std::sync::Mutex;

use dydx_auth::{ApiKeyCredentials, FixedClock, RequestAuthenticator};
use dydx_core::starkex::{
    OrderSignaturePayload, OrderSignaturePayloadBuilder, QuantumConverter, SettlementSigner,
};
use dydx_core::types::{
    AssetRegistry, CreateOrderBody, OrderSide, OrderSigningRequest, OrderType, TimeInForce,
};

const TEST_SECRET: &str = "dGVzdC1zZWNyZXQta2V5LW1hdGVyaWFsLTAxMjM0NTY=";

fn eth_order(side: OrderSide) -> OrderSigningRequest {
    OrderSigningRequest {
        network_id: 1,
        market: "ETH-USD".to_string(),
        side,
        position_id: "12345".to_string(),
        size: "0.5".to_string(),
        price: "1850.5".to_string(),
        limit_fee: "0.0015".to_string(),
        client_id: "integration-client-1".to_string(),
        expiration_epoch_seconds: 1_700_000_000,
    }
}

fn fixed_authenticator() -> RequestAuthenticator<FixedClock> {
    let credentials = ApiKeyCredentials::new("test-key", "test-passphrase", TEST_SECRET).unwrap();
    let instant =
        Utc.with_ymd_and_hms(2022, 1, 2, 3, 4, 5).unwrap() + chrono::Duration::milliseconds(678);
    RequestAuthenticator::with_clock(&credentials, FixedClock(instant)).unwrap()
}

/// Records every payload it is asked to sign.
#[derive(Default)]
struct RecordingSigner {
    seen: Mutex<Vec<OrderSignaturePayload>>,
}

impl SettlementSigner for RecordingSigner {
    fn sign_order(&self, payload: &OrderSignaturePayload) -> dydx_core::Result<String> {
        self.seen.lock().unwrap().push(payload.clone());
        Ok(format!("0x{:064x}", payload.quantums_amount_collateral))
    }
}

/// Test a full order: payload, settlement signature, submission body, request headers.
#[test]
fn test_order_to_signed_request() {
    let builder = OrderSignaturePayloadBuilder::default();
    let signer = RecordingSigner::default();
    let request = eth_order(OrderSide::Buy);

    let body = builder
        .build_signed_order(&request, &signer, OrderType::Limit, TimeInForce::Gtt, true)
        .unwrap();

    let seen = signer.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let payload = &seen[0];

    // 1850.5 * 0.5 = 925.25 USDC
    assert_eq!(payload.quantums_amount_collateral, 925_250_000);
    // 925250000 * 0.0015 = 1387875
    assert_eq!(payload.quantums_amount_fee, 1_387_875);
    assert_eq!(payload.quantums_amount_synthetic, 1_850_500_000_000);
    assert_eq!(payload.asset_id_fee, payload.asset_id_collateral);
    assert_eq!(body.signature, format!("0x{:064x}", 925_250_000u64));
    assert!(body.post_only);

    let authenticator = fixed_authenticator();
    let bytes = serde_json::to_vec(&body).unwrap();
    let headers = authenticator
        .build_headers("POST", "/v3/orders", Some(bytes.as_slice()))
        .unwrap();

    // Null optional fields are stripped before signing.
    let without_nulls = {
        let mut value = serde_json::to_value(&body).unwrap();
        value.as_object_mut().unwrap().retain(|_, v| !v.is_null());
        serde_json::to_vec(&value).unwrap()
    };
    let expected = authenticator
        .sign("POST", "/v3/orders", &headers.timestamp, Some(without_nulls.as_slice()))
        .unwrap();

    assert_eq!(headers.signature, expected);
    assert_eq!(headers.timestamp, "2022-01-02T03:04:05.678Z");
}

/// Test that the two sides of the same order round collateral in opposite directions.
#[test]
fn test_buy_and_sell_payloads_differ_only_where_expected() {
    let builder = OrderSignaturePayloadBuilder::default();
    let mut buy = eth_order(OrderSide::Buy);
    let mut sell = eth_order(OrderSide::Sell);
    buy.price = "1850.123456789".to_string();
    sell.price = buy.price.clone();

    let buy = builder.build(&buy).unwrap();
    let sell = builder.build(&sell).unwrap();

    // 1850.123456789 * 0.5 = 925.0617283945 USDC
    assert_eq!(buy.quantums_amount_collateral, 925_061_729);
    assert_eq!(sell.quantums_amount_collateral, 925_061_728);
    assert_eq!(buy.nonce, sell.nonce);
    assert_eq!(buy.expiration_epoch_hours, sell.expiration_epoch_hours);
    assert_ne!(buy.is_buying_synthetic, sell.is_buying_synthetic);
}

/// Test that a custom registry drives payload building.
#[test]
fn test_custom_registry() {
    let registry = AssetRegistry::builder()
        .collateral("USDC", 6)
        .network(5, "0x1234")
        .synthetic("FOO", 3, "0x464f4f2d33")
        .market("FOO-USD", "FOO")
        .build()
        .unwrap();
    let builder = OrderSignaturePayloadBuilder::new(registry);

    let request = OrderSigningRequest {
        network_id: 5,
        market: "FOO-USD".to_string(),
        side: OrderSide::Sell,
        position_id: "7".to_string(),
        size: "2".to_string(),
        price: "1.5".to_string(),
        limit_fee: "0".to_string(),
        client_id: "foo".to_string(),
        expiration_epoch_seconds: 3600,
    };
    let payload = builder.build(&request).unwrap();

    assert_eq!(payload.asset_id_synthetic, "0x464f4f2d33");
    assert_eq!(payload.asset_id_collateral, "0x1234");
    assert_eq!(payload.quantums_amount_synthetic, 1_500);
    assert_eq!(payload.quantums_amount_collateral, 3_000_000);
    assert_eq!(payload.quantums_amount_fee, 0);
    assert_eq!(payload.expiration_epoch_hours, 1 + 168);

    // The default markets are not part of a custom registry.
    let mut eth = eth_order(OrderSide::Buy);
    eth.network_id = 5;
    assert!(builder.build(&eth).is_err());
}

/// Test the submission body wire format for a signed order.
#[test]
fn test_create_order_body_wire_format() {
    let body = CreateOrderBody::from_signing_request(
        &eth_order(OrderSide::Sell),
        OrderType::Limit,
        TimeInForce::Ioc,
        false,
        "0xabc",
    )
    .unwrap()
    .with_cancel_id("previous-order");

    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["side"], "SELL");
    assert_eq!(json["timeInForce"], "IOC");
    assert_eq!(json["cancelId"], "previous-order");
    assert_eq!(json["expiration"], "2023-11-14T22:13:20.000Z");
    assert!(json["triggerPrice"].is_null());
}

/// Property: rounding up never yields less than rounding down, and they
/// differ by at most one quantum.
#[test]
fn test_rounding_bounds_on_random_amounts() {
    let registry = AssetRegistry::default();
    let converter = QuantumConverter::new(&registry);
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..1_000 {
        let mantissa: i64 = rng.gen_range(0..10_000_000_000_000);
        let scale: u32 = rng.gen_range(0..16);
        let amount = Decimal::new(mantissa, scale);

        let up = converter.to_quantum_round_up(amount, "USDC").unwrap();
        let down = converter.to_quantum_round_down(amount, "USDC").unwrap();

        assert!(up >= down, "{} rounded up to {} but down to {}", amount, up, down);
        assert!(up - down <= 1, "{} rounds to {} and {}", amount, up, down);

        if let Ok(exact) = converter.to_quantum_exact(amount, "USDC") {
            assert_eq!(exact, up);
            assert_eq!(exact, down);
        } else {
            assert_eq!(up - down, 1);
        }
    }
}

/// Test that signing the same request twice with a fixed clock is stable,
/// and that changing any part of it changes the signature.
#[test]
fn test_request_signature_sensitivity() {
    let authenticator = fixed_authenticator();
    let timestamp = "2022-01-02T03:04:05.678Z";
    let body: &[u8] = br#"{"market":"ETH-USD","side":"BUY"}"#;

    let base = authenticator
        .sign("POST", "/v3/orders", timestamp, Some(body))
        .unwrap();
    assert_eq!(
        base,
        authenticator
            .sign("post", "/v3/orders", timestamp, Some(body))
            .unwrap()
    );

    let variants = [
        authenticator.sign("GET", "/v3/orders", timestamp, Some(body)),
        authenticator.sign("POST", "/v3/order", timestamp, Some(body)),
        authenticator.sign("POST", "/v3/orders", "2022-01-02T03:04:05.679Z", Some(body)),
        authenticator.sign(
            "POST",
            "/v3/orders",
            timestamp,
            Some(&br#"{"market":"BTC-USD","side":"BUY"}"#[..]),
        ),
    ];
    for variant in variants {
        assert_ne!(variant.unwrap(), base);
    }
}

/// Test the private client end to end against a local server that refuses connections.
#[tokio::test]
async fn test_private_client_surfaces_transport_errors() {
    use dydx_core::api::{Method, PrivateClient};
    use dydx_core::config::ApiConfig;

    let credentials = ApiKeyCredentials::new("test-key", "test-passphrase", TEST_SECRET).unwrap();
    let config = ApiConfig {
        host: "http://127.0.0.1:1".to_string(),
        timeout_secs: 2,
        ..ApiConfig::default()
    };
    let client = PrivateClient::new(config, &credentials).unwrap();

    let request = client
        .build_request(Method::GET, "accounts", &[], None)
        .unwrap();
    let err = client.send(request).await.unwrap_err();
    assert_eq!(err.kind(), dydx_core::ErrorKind::Transport);
}
