use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// An appointment booking tied to a gateway payment order.
///
/// `session` holds the Razorpay order id and is the correlation key used
/// during payment verification; at most one booking exists per session
/// (unique index).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub doctor_id: String,
    pub user_id: String,
    /// Snapshot of the doctor's price at order time; later price changes
    /// must not alter an existing booking.
    pub ticket_price: f64,
    /// Razorpay order id.
    pub session: String,
    pub status: BookingStatus,
    /// Razorpay payment id, set once by successful verification.
    pub payment_id: Option<String>,
    /// Dedup key for repeated initiation, enforced by a unique index.
    pub idempotency_key: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Paid,
}

impl Booking {
    /// Window within which repeated initiation for the same doctor/user pair
    /// collides on the dedup index.
    pub const DEDUP_WINDOW_SECS: i64 = 300;

    pub fn new(doctor: &Doctor, user: &User, session: String) -> Self {
        let now = DateTime::now();
        Self {
            id: Uuid::new_v4(),
            doctor_id: doctor.id.clone(),
            user_id: user.id.clone(),
            ticket_price: doctor.ticket_price,
            session,
            status: BookingStatus::Pending,
            payment_id: None,
            idempotency_key: Self::idempotency_key(
                &doctor.id,
                &user.id,
                chrono::Utc::now().timestamp(),
            ),
            created_at: now,
            updated_at: now,
        }
    }

    /// Derive the initiation dedup key: same doctor, user and time window
    /// hash to the same value.
    pub fn idempotency_key(doctor_id: &str, user_id: &str, unix_ts: i64) -> String {
        let window = unix_ts.div_euclid(Self::DEDUP_WINDOW_SECS);
        let digest = Sha256::digest(format!("{}|{}|{}", doctor_id, user_id, window).as_bytes());
        hex::encode(digest)
    }
}

/// Doctor record, owned by the external doctor store; this service only
/// reads it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Doctor {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub ticket_price: f64,
}

/// User record, owned by the external user store.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}
