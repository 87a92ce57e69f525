//! Order Signer
//!
//! Builds StarkEx order payloads and signed private-API headers for dYdX v3,
//! and submits orders whose payload was signed elsewhere.

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use dydx_auth::{ApiKeyCredentials, RequestAuthenticator};
use dydx_core::api::PrivateClient;
use dydx_core::config::Config;
use dydx_core::starkex::OrderSignaturePayloadBuilder;
use dydx_core::types::{CreateOrderBody, OrderSide, OrderSigningRequest, OrderType, TimeInForce};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// dYdX v3 order signing tool
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via DYDX_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the settlement-layer payload for an order as JSON.
    Payload(OrderArgs),
    /// Print the signed header set for a private API request.
    Headers {
        #[arg(long, default_value = "GET")]
        method: String,
        /// Request path including any query string, e.g. /v3/orders?market=ETH-USD
        #[arg(long)]
        path: String,
        /// JSON object body.
        #[arg(long)]
        body: Option<String>,
    },
    /// Submit an order whose payload has already been signed.
    Submit {
        #[command(flatten)]
        order: OrderArgs,
        /// Settlement-layer signature over the order payload.
        #[arg(long)]
        signature: String,
        #[arg(long, default_value = "GTT", value_parser = parse_time_in_force)]
        time_in_force: TimeInForce,
        #[arg(long)]
        post_only: bool,
        /// Id of an open order to replace.
        #[arg(long)]
        cancel_id: Option<String>,
    },
}

#[derive(ClapArgs, Debug)]
struct OrderArgs {
    #[arg(long)]
    market: String,
    #[arg(long)]
    side: OrderSide,
    #[arg(long)]
    size: String,
    #[arg(long)]
    price: String,
    #[arg(long)]
    limit_fee: String,
    #[arg(long)]
    client_id: String,
    #[arg(long)]
    position_id: String,
    /// Expiration in epoch seconds.
    #[arg(long)]
    expiration: u64,
    /// Overrides the configured network id.
    #[arg(long)]
    network_id: Option<u64>,
}

impl OrderArgs {
    fn into_request(self, default_network_id: u64) -> OrderSigningRequest {
        OrderSigningRequest {
            network_id: self.network_id.unwrap_or(default_network_id),
            market: self.market,
            side: self.side,
            position_id: self.position_id,
            size: self.size,
            price: self.price,
            limit_fee: self.limit_fee,
            client_id: self.client_id,
            expiration_epoch_seconds: self.expiration,
        }
    }
}

fn parse_time_in_force(raw: &str) -> std::result::Result<TimeInForce, String> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_ascii_uppercase()))
        .map_err(|_| format!("time in force must be GTT, FOK or IOC, got {:?}", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Logs go to stderr so stdout stays machine readable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "order_signer=info,dydx_core=info,dydx_auth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = args
        .config
        .or_else(|| std::env::var("DYDX_CONFIG").ok());
    let config = match &config_path {
        Some(path) => {
            info!(config_path = %path, "Loading configuration");
            Config::load(path)?
        }
        None => Config::from_env()?,
    };

    match args.command {
        Command::Payload(order) => {
            let request = order.into_request(config.api.network_id);
            let payload = OrderSignaturePayloadBuilder::default().build(&request)?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Command::Headers { method, path, body } => {
            let body = body
                .map(|raw| -> Result<Vec<u8>> {
                    let value: serde_json::Value =
                        serde_json::from_str(&raw).context("--body is not valid JSON")?;
                    Ok(serde_json::to_vec(&value)?)
                })
                .transpose()?;

            let credentials = ApiKeyCredentials::from_env()?;
            let authenticator = RequestAuthenticator::new(&credentials)?;
            let headers = authenticator.build_headers(&method, &path, body.as_deref())?;

            let rendered: serde_json::Map<String, serde_json::Value> = headers
                .header_pairs(&config.api.header_prefix)
                .into_iter()
                .map(|(name, value)| (name, serde_json::Value::from(value)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        }
        Command::Submit {
            order,
            signature,
            time_in_force,
            post_only,
            cancel_id,
        } => {
            let request = order.into_request(config.api.network_id);

            // Fail on bad amounts before anything goes over the wire.
            OrderSignaturePayloadBuilder::default().build(&request)?;

            let mut body = CreateOrderBody::from_signing_request(
                &request,
                OrderType::Limit,
                time_in_force,
                post_only,
                signature,
            )?;
            if let Some(cancel_id) = cancel_id {
                body = body.with_cancel_id(cancel_id);
            }

            let credentials = ApiKeyCredentials::from_env()?;
            let client = PrivateClient::new(config.api.clone(), &credentials)?;
            let response = client.create_order(&body).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
