use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::{
    camps::registration::{self, BackfillSummary},
    error::{RaktError, Result},
    models::{BloodCamp, CampRegistration, CampStatus, NewCamp},
    storage::Database,
};

/// Camp lifecycle on top of the document store
pub struct CampService<'a> {
    db: &'a Database,
}

impl<'a> CampService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create(&self, organizer_id: &str, details: NewCamp, now: DateTime<Utc>) -> Result<BloodCamp> {
        let bank = self.db.get_bank(organizer_id)?.ok_or_else(|| {
            RaktError::Forbidden("only registered blood banks can organize camps".to_string())
        })?;

        if details.name.trim().is_empty() {
            return Err(RaktError::Validation("camp name is required".to_string()));
        }
        if details.target_units < 1 {
            return Err(RaktError::Validation("target units must be at least 1".to_string()));
        }
        if details.location.venue.trim().is_empty() {
            return Err(RaktError::Validation("camp venue is required".to_string()));
        }

        let camp = BloodCamp::new(details, &bank.id, &bank.name, now);
        self.db.save_camp(&camp)?;
        info!("Blood bank {} created camp {} on {}", bank.id, camp.id, camp.date);
        Ok(camp)
    }

    pub fn get(&self, camp_id: &str) -> Result<BloodCamp> {
        self.db
            .get_camp(camp_id)?
            .ok_or_else(|| RaktError::not_found("Camp", camp_id))
    }

    pub fn list(&self, city: Option<&str>, status: Option<CampStatus>) -> Result<Vec<BloodCamp>> {
        let camps = self.db.list_camps()?;
        Ok(camps
            .into_iter()
            .filter(|c| {
                city.map(|city| c.location.city.eq_ignore_ascii_case(city.trim()))
                    .unwrap_or(true)
            })
            .filter(|c| status.map(|s| c.status == s).unwrap_or(true))
            .collect())
    }

    pub fn list_for_organizer(&self, organizer_id: &str) -> Result<Vec<BloodCamp>> {
        self.db.camps_by_organizer(organizer_id)
    }

    fn owned(&self, organizer_id: &str, camp_id: &str) -> Result<BloodCamp> {
        let camp = self.get(camp_id)?;
        if camp.organizer_id != organizer_id {
            return Err(RaktError::Forbidden(format!(
                "camp {} is organized by another blood bank",
                camp_id
            )));
        }
        Ok(camp)
    }

    pub fn update_status(&self, organizer_id: &str, camp_id: &str, status: CampStatus) -> Result<BloodCamp> {
        let mut camp = self.owned(organizer_id, camp_id)?;
        let previous = camp.status;
        camp.status = status;
        self.db.save_camp(&camp)?;
        info!("Camp {} status {} -> {}", camp.id, previous, status);
        Ok(camp)
    }

    /// Organizer-reported running total; not derived from attendance
    pub fn record_collection(&self, organizer_id: &str, camp_id: &str, units: u32) -> Result<BloodCamp> {
        let mut camp = self.owned(organizer_id, camp_id)?;
        camp.collected_units = units;
        self.db.save_camp(&camp)?;
        info!(
            "Camp {} collected {}/{} units",
            camp.id, camp.collected_units, camp.target_units
        );
        Ok(camp)
    }

    pub fn mark_attendance(
        &self,
        organizer_id: &str,
        camp_id: &str,
        donor_id: &str,
        attended: bool,
    ) -> Result<CampRegistration> {
        let mut camp = self.owned(organizer_id, camp_id)?;
        let entry = camp
            .registered_donors
            .iter_mut()
            .find(|r| r.donor_id == donor_id)
            .ok_or_else(|| RaktError::not_found("Registration", donor_id))?;
        entry.attended = attended;
        let entry = entry.clone();

        self.db.save_camp(&camp)?;
        Ok(entry)
    }

    pub fn register_donor(&self, camp_id: &str, donor_id: &str, now: DateTime<Utc>) -> Result<CampRegistration> {
        let mut camp = self.get(camp_id)?;
        let entry = registration::register(&mut camp, donor_id, self.db, now)?;
        self.db.save_camp(&camp)?;
        Ok(entry)
    }

    pub fn unregister_donor(&self, camp_id: &str, donor_id: &str) -> Result<()> {
        let mut camp = self.get(camp_id)?;
        let before = camp.registered_donors.len();
        camp.registered_donors.retain(|r| r.donor_id != donor_id);
        if camp.registered_donors.len() == before {
            return Err(RaktError::not_found("Registration", donor_id));
        }
        self.db.save_camp(&camp)?;
        info!("Donor {} left camp {}", donor_id, camp.id);
        Ok(())
    }

    /// Removes the camp together with its roster
    pub fn delete(&self, organizer_id: &str, camp_id: &str) -> Result<()> {
        let camp = self.owned(organizer_id, camp_id)?;
        self.db.delete_camp(&camp.id)?;
        info!(
            "Deleted camp {} with {} registrations",
            camp.id,
            camp.registered_donors.len()
        );
        Ok(())
    }

    /// Administrative pass: refresh placeholder snapshots in every camp
    pub fn backfill_all(&self) -> Result<BackfillSummary> {
        let mut camps = self.db.list_camps()?;
        let summary = registration::backfill(&mut camps, self.db)?;

        for camp in camps.iter().filter(|c| summary.changed_camps.contains(&c.id)) {
            self.db.save_camp(camp)?;
        }

        info!(
            "Backfill updated {} of {} registrations across {} camps",
            summary.entries_updated, summary.entries_scanned, summary.camps_scanned
        );
        if summary.unresolved > 0 {
            warn!("{} registrations reference donors with no profile", summary.unresolved);
        }
        Ok(summary)
    }

    /// Administrative pass: drop invalid registrations from every camp.
    /// Returns the number of removed entries.
    pub fn cleanup_all(&self) -> Result<usize> {
        let mut removed = 0;
        for mut camp in self.db.list_camps()? {
            let dropped = registration::cleanup(&mut camp);
            if !dropped.is_empty() {
                removed += dropped.len();
                self.db.save_camp(&camp)?;
            }
        }
        Ok(removed)
    }
}
