pub mod bank;
pub mod blood_group;
pub mod camp;
pub mod donor;
pub mod health;
pub mod request;

pub use bank::{BloodBank, Inventory, InventoryItem};
pub use blood_group::BloodGroup;
pub use camp::{BloodCamp, CampLocation, CampRegistration, CampStatus, GeoPoint, NewCamp};
pub use donor::{DonorProfile, Role};
pub use health::{DonorHealthRecord, Eligibility, HealthForm, Review, ReviewStatus};
pub use request::{BloodRequest, Hospital, NewRequest, RequestStatus, Urgency};
