//! Checkout handlers: order initiation and payment verification.
//!
//! Order initiation creates a Razorpay order and a pending booking keyed by
//! the order id. Verification authenticates the client-submitted signature
//! and applies the single pending-to-paid transition.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::AppError,
    middleware::AuthenticatedUser,
    models::Booking,
    services::metrics,
    services::razorpay::{PaymentVerification, RazorpayOrder},
    services::repository::InsertOutcome,
    AppState,
};

/// Response after creating an order: the gateway order object plus the
/// public key id the frontend needs to open checkout.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub success: bool,
    pub message: String,
    pub order: RazorpayOrder,
    pub key: String,
}

/// Client-submitted payment confirmation after gateway-hosted checkout.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyPaymentRequest {
    #[validate(length(min = 1))]
    pub razorpay_order_id: String,
    #[validate(length(min = 1))]
    pub razorpay_payment_id: String,
    #[validate(length(min = 1))]
    pub razorpay_signature: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: String,
}

/// Internal verification outcome; the caller-facing response does not
/// distinguish these, the logs and metrics do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VerificationOutcome {
    Verified,
    AlreadyVerified,
    VerifiedButUnmatched,
}

impl VerificationOutcome {
    fn as_label(self) -> &'static str {
        match self {
            VerificationOutcome::Verified => "verified",
            VerificationOutcome::AlreadyVerified => "already_verified",
            VerificationOutcome::VerifiedButUnmatched => "unmatched",
        }
    }
}

/// Convert a major-unit price to the gateway's minor currency unit
/// (rupees to paise for INR).
fn to_minor_units(price: f64) -> u64 {
    (price * 100.0).round() as u64
}

/// Create a Razorpay order for a doctor appointment and persist the
/// pending booking.
///
/// `POST /order/:doctor_id` (authenticated). The doctor id is untrusted
/// path input; the user id comes from the verified identity context. The
/// booking write happens strictly after a successful gateway response so a
/// gateway failure leaves no local record.
pub async fn create_order(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(doctor_id): Path<String>,
) -> Result<Json<CheckoutResponse>, AppError> {
    tracing::info!(
        doctor_id = %doctor_id,
        user_id = %auth.user_id,
        "Creating checkout order"
    );

    // No ordering dependency between the two lookups.
    let (doctor, user) = tokio::try_join!(
        state.repository.find_doctor(&doctor_id),
        state.repository.find_user(&auth.user_id),
    )
    .map_err(AppError::DatabaseError)?;

    let (Some(doctor), Some(user)) = (doctor, user) else {
        tracing::warn!(
            doctor_id = %doctor_id,
            user_id = %auth.user_id,
            "Doctor or user not found, aborting order creation"
        );
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Doctor or user not found"
        )));
    };

    let amount = to_minor_units(doctor.ticket_price);
    let receipt = format!("receipt_{}", chrono::Utc::now().timestamp_millis());
    let notes = serde_json::json!({
        "doctor_id": doctor.id,
        "user_id": user.id,
    });

    let order = state
        .razorpay
        .create_order(amount, &state.config.razorpay.currency, Some(receipt), Some(notes))
        .await
        .map_err(|e| {
            metrics::record_order("gateway_error");
            AppError::Upstream(e)
        })?;

    let booking = Booking::new(&doctor, &user, order.id.clone());

    // A gateway order now exists; a failed write must surface as an error
    // so the correlation is not silently lost.
    match state
        .repository
        .create_booking(&booking)
        .await
        .map_err(AppError::DatabaseError)?
    {
        InsertOutcome::Inserted => {}
        InsertOutcome::Duplicate => {
            metrics::record_order("duplicate");
            tracing::warn!(
                doctor_id = %doctor.id,
                user_id = %user.id,
                order_id = %order.id,
                "Duplicate order initiation within dedup window"
            );
            return Err(AppError::Conflict(anyhow::anyhow!(
                "An order for this appointment was already created"
            )));
        }
    }

    metrics::record_order("created");
    tracing::info!(
        booking_id = %booking.id,
        order_id = %order.id,
        amount = amount,
        "Booking saved with status pending"
    );

    Ok(Json(CheckoutResponse {
        success: true,
        message: "Order created successfully".to_string(),
        order,
        key: state.config.razorpay.key_id.clone(),
    }))
}

/// Verify a payment signature and mark the matching booking paid.
///
/// `POST /verify`. All three fields are untrusted client input. A valid
/// signature gates the atomic pending-to-paid transition on the booking
/// whose session equals the order id; resubmission is a no-op. Performs no
/// outbound network calls.
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, AppError> {
    payload.validate()?;

    let verification = PaymentVerification {
        razorpay_order_id: payload.razorpay_order_id.clone(),
        razorpay_payment_id: payload.razorpay_payment_id.clone(),
        razorpay_signature: payload.razorpay_signature.clone(),
    };

    let is_valid = state.razorpay.verify_payment_signature(&verification)?;

    if !is_valid {
        metrics::record_verification("signature_mismatch");
        return Err(AppError::BadRequest(anyhow::anyhow!("Invalid signature")));
    }

    let outcome = match state
        .repository
        .mark_paid(&payload.razorpay_order_id, &payload.razorpay_payment_id)
        .await
        .map_err(AppError::DatabaseError)?
    {
        Some(booking) => {
            tracing::info!(
                booking_id = %booking.id,
                order_id = %payload.razorpay_order_id,
                payment_id = %payload.razorpay_payment_id,
                "Booking marked paid"
            );
            VerificationOutcome::Verified
        }
        None => match state
            .repository
            .find_by_session(&payload.razorpay_order_id)
            .await
            .map_err(AppError::DatabaseError)?
        {
            Some(booking) => {
                tracing::debug!(
                    booking_id = %booking.id,
                    order_id = %payload.razorpay_order_id,
                    "Booking already paid, verification is a no-op"
                );
                VerificationOutcome::AlreadyVerified
            }
            None => {
                // Valid signature with no matching booking: a
                // reconciliation anomaly (data loss or replay), logged for
                // investigation but not leaked to the caller.
                tracing::warn!(
                    order_id = %payload.razorpay_order_id,
                    payment_id = %payload.razorpay_payment_id,
                    "Valid signature but no booking matches this order"
                );
                VerificationOutcome::VerifiedButUnmatched
            }
        },
    };

    metrics::record_verification(outcome.as_label());

    Ok(Json(VerifyPaymentResponse {
        success: true,
        message: "Payment verified successfully".to_string(),
    }))
}
