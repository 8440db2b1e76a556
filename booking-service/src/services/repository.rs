use crate::models::{Booking, BookingStatus, Doctor, User};
use anyhow::Result;
use mongodb::bson::{doc, to_bson, DateTime};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Outcome of a booking insert against the dedup index.
#[derive(Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Another booking with the same idempotency key already exists.
    Duplicate,
}

#[derive(Clone)]
pub struct BookingRepository {
    bookings: Collection<Booking>,
    doctors: Collection<Doctor>,
    users: Collection<User>,
}

impl BookingRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            bookings: db.collection("bookings"),
            doctors: db.collection("doctors"),
            users: db.collection("users"),
        }
    }

    /// Initialize booking indexes.
    pub async fn init_indexes(&self) -> Result<()> {
        // One booking per gateway order id: `session` is the correlation
        // key for verification and must be unique.
        let session_index = IndexModel::builder()
            .keys(doc! { "session": 1 })
            .options(
                IndexOptions::builder()
                    .name("session_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        // Dedup index on the derived initiation key so a client retry
        // within the window cannot create a second booking.
        let dedup_index = IndexModel::builder()
            .keys(doc! { "idempotency_key": 1 })
            .options(
                IndexOptions::builder()
                    .name("initiation_dedup_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.bookings
            .create_indexes([session_index, dedup_index], None)
            .await?;

        tracing::info!("Booking service indexes initialized");
        Ok(())
    }

    pub async fn find_doctor(&self, id: &str) -> Result<Option<Doctor>> {
        let doctor = self.doctors.find_one(doc! { "_id": id }, None).await?;
        Ok(doctor)
    }

    pub async fn find_user(&self, id: &str) -> Result<Option<User>> {
        let user = self.users.find_one(doc! { "_id": id }, None).await?;
        Ok(user)
    }

    /// Persist a new pending booking.
    ///
    /// A duplicate-key violation on the dedup index is reported as
    /// `InsertOutcome::Duplicate` rather than an error so the handler can
    /// map it to a conflict.
    pub async fn create_booking(&self, booking: &Booking) -> Result<InsertOutcome> {
        match self.bookings.insert_one(booking, None).await {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(err) if is_duplicate_key(&err) => Ok(InsertOutcome::Duplicate),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn find_by_session(&self, session: &str) -> Result<Option<Booking>> {
        let booking = self
            .bookings
            .find_one(doc! { "session": session }, None)
            .await?;
        Ok(booking)
    }

    /// Atomically transition the booking for `session` from pending to paid.
    ///
    /// The filter includes `status: pending`, so concurrent verification
    /// requests for the same order commit at most one effective transition;
    /// the losing request sees `None`. Returns the updated booking when the
    /// transition was applied.
    pub async fn mark_paid(&self, session: &str, payment_id: &str) -> Result<Option<Booking>> {
        let filter = doc! {
            "session": session,
            "status": to_bson(&BookingStatus::Pending)?,
        };
        let update = doc! {
            "$set": {
                "status": to_bson(&BookingStatus::Paid)?,
                "payment_id": payment_id,
                "updated_at": DateTime::now(),
            }
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let booking = self
            .bookings
            .find_one_and_update(filter, update, options)
            .await?;
        Ok(booking)
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        _ => false,
    }
}
