pub mod registration;
pub mod service;

pub use registration::{BackfillSummary, DonorDirectory};
pub use service::CampService;
