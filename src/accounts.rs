use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    error::{RaktError, Result},
    models::{BloodBank, DonorProfile},
    storage::Database,
};

fn check_email(email: &str) -> Result<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(RaktError::Validation(format!("invalid email address: {}", email))),
    }
}

/// Donor/patient and blood-bank sign-up
pub struct AccountService<'a> {
    db: &'a Database,
}

impl<'a> AccountService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn register_donor(&self, profile: DonorProfile) -> Result<DonorProfile> {
        if profile.name.trim().is_empty() {
            return Err(RaktError::Validation("name is required".to_string()));
        }
        check_email(&profile.email)?;
        if self.db.find_donor_by_email(&profile.email)?.is_some() {
            return Err(RaktError::Validation(format!(
                "an account already exists for {}",
                profile.email
            )));
        }

        self.db.save_donor(&profile)?;
        info!("Registered {:?} account {}", profile.role, profile.id);
        Ok(profile)
    }

    /// New bank starts with a zero row for every blood group in its
    /// embedded inventory.
    pub fn register_bank(
        &self,
        name: &str,
        email: &str,
        city: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<BloodBank> {
        if name.trim().is_empty() {
            return Err(RaktError::Validation("blood bank name is required".to_string()));
        }
        check_email(email)?;
        if self.db.find_bank_by_email(email)?.is_some() {
            return Err(RaktError::Validation(format!(
                "a blood bank already exists for {}",
                email
            )));
        }

        let mut bank = BloodBank::new(name, email, now);
        bank.city = city;
        self.db.save_bank(&bank)?;
        info!("Registered blood bank {} ({})", bank.name, bank.id);
        Ok(bank)
    }

    pub fn donor(&self, id: &str) -> Result<DonorProfile> {
        self.db
            .get_donor(id)?
            .ok_or_else(|| RaktError::DonorNotFound(id.to_string()))
    }

    pub fn bank(&self, id: &str) -> Result<BloodBank> {
        self.db
            .get_bank(id)?
            .ok_or_else(|| RaktError::not_found("Blood bank", id))
    }

    pub fn list_banks(&self, city: Option<&str>) -> Result<Vec<BloodBank>> {
        Ok(self
            .db
            .list_banks()?
            .into_iter()
            .filter(|bank| match (city, bank.city.as_deref()) {
                (None, _) => true,
                (Some(wanted), Some(actual)) => actual.eq_ignore_ascii_case(wanted.trim()),
                (Some(_), None) => false,
            })
            .collect())
    }
}
