use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use std::env;

/// Immutable process-wide configuration, loaded once at startup and passed
/// explicitly to the components that need it.
#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub razorpay: RazorpayConfig,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub db_name: String,
}

/// Razorpay gateway credentials and tuning.
///
/// `key_id` is public and is handed to the checkout frontend; `key_secret`
/// signs orders and must never be logged or echoed.
#[derive(Deserialize, Clone, Debug)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: Secret<String>,
    pub api_base_url: String,
    /// Currency code for all orders (single-currency deployment).
    pub currency: String,
    /// Upper bound on the order-creation call; a timeout is an upstream error.
    pub timeout_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("BOOKING_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("BOOKING_SERVICE_PORT")
            .unwrap_or_else(|_| "3005".to_string())
            .parse()?;

        let db_url = env::var("BOOKING_DATABASE_URL")
            .map_err(|_| anyhow!("BOOKING_DATABASE_URL must be set"))?;
        let db_name =
            env::var("BOOKING_DATABASE_NAME").unwrap_or_else(|_| "booking_db".to_string());

        let key_id =
            env::var("RAZORPAY_KEY_ID").map_err(|_| anyhow!("RAZORPAY_KEY_ID must be set"))?;
        let key_secret = env::var("RAZORPAY_KEY_SECRET")
            .map_err(|_| anyhow!("RAZORPAY_KEY_SECRET must be set"))?;
        let api_base_url = env::var("RAZORPAY_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.razorpay.com/v1".to_string());
        let currency = env::var("RAZORPAY_CURRENCY").unwrap_or_else(|_| "INR".to_string());
        let timeout_seconds = env::var("RAZORPAY_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                db_name,
            },
            razorpay: RazorpayConfig {
                key_id,
                key_secret: Secret::new(key_secret),
                api_base_url,
                currency,
                timeout_seconds,
            },
            service_name: "booking-service".to_string(),
        })
    }
}
