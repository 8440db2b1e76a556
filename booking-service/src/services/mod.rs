pub mod metrics;
pub mod razorpay;
pub mod repository;

pub use metrics::{get_metrics, init_metrics};
pub use razorpay::RazorpayClient;
pub use repository::BookingRepository;
