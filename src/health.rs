use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    eligibility::EligibilityEvaluator,
    error::{RaktError, Result},
    models::{DonorHealthRecord, HealthForm, Review, ReviewStatus, Role},
    storage::Database,
};

/// Donor health forms: submission, self-update and blood-bank review.
/// Every write runs the eligibility evaluator first.
pub struct HealthService<'a> {
    db: &'a Database,
    evaluator: EligibilityEvaluator,
}

impl<'a> HealthService<'a> {
    pub fn new(db: &'a Database, evaluator: EligibilityEvaluator) -> Self {
        Self { db, evaluator }
    }

    fn validate(form: &HealthForm) -> Result<()> {
        if !form.consent.is_complete() {
            return Err(RaktError::ConsentMissing);
        }
        if form.full_name.trim().is_empty() {
            return Err(RaktError::Validation("full name is required".to_string()));
        }
        if let Some(weight) = form.weight_kg {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RaktError::Validation(format!("invalid weight: {}", weight)));
            }
        }
        Ok(())
    }

    fn persist(&self, record: &mut DonorHealthRecord, now: DateTime<Utc>) -> Result<()> {
        self.evaluator.apply_to(record, now);
        record.updated_at = now;
        self.db.save_health_record(record)
    }

    pub fn submit(&self, donor_id: &str, form: HealthForm, now: DateTime<Utc>) -> Result<DonorHealthRecord> {
        let donor = self
            .db
            .get_donor(donor_id)?
            .ok_or_else(|| RaktError::DonorNotFound(donor_id.to_string()))?;
        if donor.role != Role::Donor {
            return Err(RaktError::Forbidden(
                "only donor accounts can submit health forms".to_string(),
            ));
        }
        Self::validate(&form)?;

        let existing = self.db.health_records_for_donor(donor_id)?;
        if existing.iter().any(|r| r.is_pending()) {
            return Err(RaktError::PendingSubmissionExists(donor_id.to_string()));
        }

        let mut record = DonorHealthRecord::new(donor_id, form, now);
        self.persist(&mut record, now)?;

        info!(
            "Health form {} submitted by {} (eligible: {})",
            record.id, donor_id, record.eligibility.is_eligible
        );
        Ok(record)
    }

    /// Donor edits their own form; review goes back to pending
    pub fn update(
        &self,
        donor_id: &str,
        record_id: &str,
        form: HealthForm,
        now: DateTime<Utc>,
    ) -> Result<DonorHealthRecord> {
        let mut record = self.get(record_id)?;
        if record.donor_id != donor_id {
            return Err(RaktError::Forbidden(format!(
                "health form {} belongs to another donor",
                record_id
            )));
        }
        Self::validate(&form)?;

        record.form = form;
        record.review = Review::default();
        self.persist(&mut record, now)?;

        info!("Health form {} updated, review reset to pending", record.id);
        Ok(record)
    }

    pub fn review(
        &self,
        bank_id: &str,
        record_id: &str,
        status: ReviewStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<DonorHealthRecord> {
        if self.db.get_bank(bank_id)?.is_none() {
            return Err(RaktError::Forbidden(
                "only blood banks can review health forms".to_string(),
            ));
        }

        let mut record = self.get(record_id)?;
        record.review = Review {
            status,
            reviewed_by: Some(bank_id.to_string()),
            reviewed_at: Some(now),
            notes,
        };
        self.db.save_health_record(&record)?;

        info!("Health form {} reviewed by {}: {}", record.id, bank_id, status);
        Ok(record)
    }

    pub fn get(&self, record_id: &str) -> Result<DonorHealthRecord> {
        self.db
            .get_health_record(record_id)?
            .ok_or_else(|| RaktError::not_found("Health form", record_id))
    }

    pub fn latest_for_donor(&self, donor_id: &str) -> Result<Option<DonorHealthRecord>> {
        Ok(self
            .db
            .health_records_for_donor(donor_id)?
            .into_iter()
            .max_by_key(|r| r.submitted_at))
    }

    pub fn list_by_status(&self, status: ReviewStatus) -> Result<Vec<DonorHealthRecord>> {
        Ok(self
            .db
            .list_health_records()?
            .into_iter()
            .filter(|r| r.review.status == status)
            .collect())
    }
}
