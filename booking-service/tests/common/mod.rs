use booking_service::config::{Config, DatabaseConfig, RazorpayConfig, ServerConfig};
use booking_service::models::{Booking, Doctor, User};
use booking_service::Application;
use hmac::{Hmac, Mac};
use secrecy::Secret;
use sha2::Sha256;
use wiremock::MockServer;

pub const TEST_KEY_ID: &str = "rzp_test_key";
pub const TEST_KEY_SECRET: &str = "test_key_secret";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: mongodb::Database,
    pub db_name: String,
    /// Wiremock server standing in for the Razorpay Orders API.
    pub gateway: MockServer,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_gateway_timeout(10).await
    }

    pub async fn spawn_with_gateway_timeout(timeout_seconds: u64) -> Self {
        let gateway = MockServer::start().await;
        let db_name = format!("booking_test_{}", uuid::Uuid::new_v4());

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
            },
            database: DatabaseConfig {
                url: Secret::new(
                    std::env::var("TEST_MONGODB_URI")
                        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
                ),
                db_name: db_name.clone(),
            },
            razorpay: RazorpayConfig {
                key_id: TEST_KEY_ID.to_string(),
                key_secret: Secret::new(TEST_KEY_SECRET.to_string()),
                api_base_url: gateway.uri(),
                currency: "INR".to_string(),
                timeout_seconds,
            },
            service_name: "booking-service-test".to_string(),
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);
        let db = app.db().clone();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            db,
            db_name,
            gateway,
        }
    }

    pub async fn seed_doctor(&self, id: &str, ticket_price: f64) {
        let doctor = Doctor {
            id: id.to_string(),
            name: "Dr. Test".to_string(),
            ticket_price,
        };
        self.db
            .collection::<Doctor>("doctors")
            .insert_one(&doctor, None)
            .await
            .expect("Failed to seed doctor");
    }

    pub async fn seed_user(&self, id: &str) {
        let user = User {
            id: id.to_string(),
            name: "Test User".to_string(),
            email: "user@example.com".to_string(),
        };
        self.db
            .collection::<User>("users")
            .insert_one(&user, None)
            .await
            .expect("Failed to seed user");
    }

    /// Insert a pending booking directly, bypassing the gateway.
    pub async fn seed_booking(&self, session: &str) -> Booking {
        let doctor = Doctor {
            id: format!("doc-{}", session),
            name: "Dr. Test".to_string(),
            ticket_price: 500.0,
        };
        let user = User {
            id: format!("user-{}", session),
            name: "Test User".to_string(),
            email: "user@example.com".to_string(),
        };
        let booking = Booking::new(&doctor, &user, session.to_string());
        self.db
            .collection::<Booking>("bookings")
            .insert_one(&booking, None)
            .await
            .expect("Failed to seed booking");
        booking
    }

    /// Cleanup test database after test completes.
    pub async fn cleanup(&self) {
        self.db
            .drop(None)
            .await
            .expect("Failed to drop test database");
    }
}

/// Compute the checkout signature the way Razorpay does, keyed with the
/// test secret.
pub fn sign(order_id: &str, payment_id: &str) -> String {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(TEST_KEY_SECRET.as_bytes()).unwrap();
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// A gateway order response body as the Orders API would return it.
pub fn gateway_order_json(order_id: &str, amount: u64) -> serde_json::Value {
    serde_json::json!({
        "id": order_id,
        "entity": "order",
        "amount": amount,
        "amount_paid": 0,
        "amount_due": amount,
        "currency": "INR",
        "receipt": "receipt_1",
        "status": "created",
        "attempts": 0,
        "notes": {},
        "created_at": 1_700_000_000u64
    })
}
