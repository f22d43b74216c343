use thiserror::Error;

use crate::models::BloodGroup;

#[derive(Error, Debug)]
pub enum RaktError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Donor not found: {0}")]
    DonorNotFound(String),

    #[error("Donor {donor_id} is already registered for camp {camp_id}")]
    AlreadyRegistered { camp_id: String, donor_id: String },

    #[error("Blood group {group} not found in inventory of blood bank {bank_id}")]
    InventoryGroupNotFound { bank_id: String, group: BloodGroup },

    #[error("Donor {0} already has a health form pending review")]
    PendingSubmissionExists(String),

    #[error("All consent declarations must be accepted before submitting")]
    ConsentMissing,

    #[error("Not permitted: {0}")]
    Forbidden(String),

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RaktError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        RaktError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RaktError>;
