use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::{RaktError, Result},
    models::{BloodCamp, CampRegistration, DonorProfile, Role},
    storage::Database,
};

pub const UNKNOWN_NAME: &str = "Unknown";
pub const PHONE_NOT_PROVIDED: &str = "Not provided";
pub const GROUP_NOT_SPECIFIED: &str = "Not specified";

/// Resolves donor ids to their current profile
#[cfg_attr(test, mockall::automock)]
pub trait DonorDirectory {
    fn find_donor(&self, donor_id: &str) -> Result<Option<DonorProfile>>;
}

impl DonorDirectory for Database {
    fn find_donor(&self, donor_id: &str) -> Result<Option<DonorProfile>> {
        self.get_donor(donor_id)
    }
}

fn or_sentinel(value: Option<&str>, sentinel: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => sentinel.to_string(),
    }
}

fn is_placeholder(value: &str, sentinel: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == sentinel
}

/// Snapshot of a donor's contact fields, with sentinels for blanks
pub fn snapshot(donor: &DonorProfile, now: DateTime<Utc>) -> CampRegistration {
    CampRegistration {
        donor_id: donor.id.clone(),
        name: or_sentinel(Some(&donor.name), UNKNOWN_NAME),
        phone: or_sentinel(donor.phone.as_deref(), PHONE_NOT_PROVIDED),
        blood_group: donor
            .blood_group
            .map(|g| g.to_string())
            .unwrap_or_else(|| GROUP_NOT_SPECIFIED.to_string()),
        registered_at: now,
        attended: false,
    }
}

/// Add a donor to a camp's roster.
///
/// Fails with `DonorNotFound` when the directory has no such donor,
/// `Forbidden` for patient accounts and `AlreadyRegistered` when the donor is
/// on the roster. The camp is left untouched on any error.
pub fn register<D: DonorDirectory + ?Sized>(
    camp: &mut BloodCamp,
    donor_id: &str,
    directory: &D,
    now: DateTime<Utc>,
) -> Result<CampRegistration> {
    let donor = directory
        .find_donor(donor_id)?
        .ok_or_else(|| RaktError::DonorNotFound(donor_id.to_string()))?;

    if donor.role != Role::Donor {
        return Err(RaktError::Forbidden(format!(
            "{} is not a donor account",
            donor.id
        )));
    }

    if camp.is_registered(&donor.id) {
        return Err(RaktError::AlreadyRegistered {
            camp_id: camp.id.clone(),
            donor_id: donor.id,
        });
    }

    let entry = snapshot(&donor, now);
    camp.registered_donors.push(entry.clone());
    info!("Registered donor {} for camp {}", donor.id, camp.id);
    Ok(entry)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BackfillSummary {
    pub camps_scanned: usize,
    pub entries_scanned: usize,
    pub entries_updated: usize,
    pub unresolved: usize,
    /// Ids of camps with at least one updated entry
    pub changed_camps: Vec<String>,
}

fn needs_backfill(entry: &CampRegistration) -> bool {
    is_placeholder(&entry.name, UNKNOWN_NAME)
        || is_placeholder(&entry.phone, PHONE_NOT_PROVIDED)
        || is_placeholder(&entry.blood_group, GROUP_NOT_SPECIFIED)
}

/// Re-copy contact fields from donor profiles wherever the stored snapshot
/// is blank or a sentinel. Fields that already hold real values are kept.
pub fn backfill<D: DonorDirectory + ?Sized>(
    camps: &mut [BloodCamp],
    directory: &D,
) -> Result<BackfillSummary> {
    let mut summary = BackfillSummary::default();

    for camp in camps.iter_mut() {
        summary.camps_scanned += 1;
        let mut changed = false;

        for entry in camp.registered_donors.iter_mut() {
            summary.entries_scanned += 1;
            if !needs_backfill(entry) {
                continue;
            }

            let donor = match directory.find_donor(&entry.donor_id)? {
                Some(donor) => donor,
                None => {
                    debug!("No profile for donor {} in camp {}", entry.donor_id, camp.id);
                    summary.unresolved += 1;
                    continue;
                }
            };

            let fresh = snapshot(&donor, entry.registered_at);
            let mut updated = false;

            if is_placeholder(&entry.name, UNKNOWN_NAME) && fresh.name != UNKNOWN_NAME {
                entry.name = fresh.name;
                updated = true;
            }
            if is_placeholder(&entry.phone, PHONE_NOT_PROVIDED) && fresh.phone != PHONE_NOT_PROVIDED {
                entry.phone = fresh.phone;
                updated = true;
            }
            if is_placeholder(&entry.blood_group, GROUP_NOT_SPECIFIED)
                && fresh.blood_group != GROUP_NOT_SPECIFIED
            {
                entry.blood_group = fresh.blood_group;
                updated = true;
            }

            if updated {
                summary.entries_updated += 1;
                changed = true;
            }
        }

        if changed {
            summary.changed_camps.push(camp.id.clone());
        }
    }

    Ok(summary)
}

/// Remove roster entries whose donor id is not a valid identifier or whose
/// name is blank or the sentinel. Removed entries are returned and gone for
/// good.
pub fn cleanup(camp: &mut BloodCamp) -> Vec<CampRegistration> {
    let (keep, removed): (Vec<_>, Vec<_>) = camp
        .registered_donors
        .drain(..)
        .partition(|entry| {
            Uuid::parse_str(entry.donor_id.trim()).is_ok()
                && !is_placeholder(&entry.name, UNKNOWN_NAME)
        });

    camp.registered_donors = keep;
    if !removed.is_empty() {
        info!("Removed {} invalid registrations from camp {}", removed.len(), camp.id);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BloodGroup, CampLocation, NewCamp, Role};
    use chrono::NaiveDate;

    fn camp() -> BloodCamp {
        BloodCamp::new(
            NewCamp {
                name: "Sunday Drive".to_string(),
                description: None,
                date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
                start_time: "09:00".to_string(),
                end_time: "15:00".to_string(),
                location: CampLocation {
                    venue: "Town Hall".to_string(),
                    city: "Pune".to_string(),
                    ..Default::default()
                },
                target_units: 50,
            },
            "bank-1",
            "Red Drop",
            Utc::now(),
        )
    }

    fn donor() -> DonorProfile {
        DonorProfile::new("Nisha", "nisha@example.com", Role::Donor)
            .with_phone("98200 00000")
            .with_blood_group(BloodGroup::BPos)
    }

    #[test]
    fn test_register_snapshots_profile() {
        let donor = donor();
        let mut directory = MockDonorDirectory::new();
        let found = donor.clone();
        let expected = donor.id.clone();
        directory
            .expect_find_donor()
            .withf(move |id| id == expected)
            .returning(move |_| Ok(Some(found.clone())));

        let mut camp = camp();
        let entry = register(&mut camp, &donor.id, &directory, Utc::now()).unwrap();

        assert_eq!(entry.name, "Nisha");
        assert_eq!(entry.phone, "98200 00000");
        assert_eq!(entry.blood_group, "B+");
        assert!(!entry.attended);
        assert_eq!(camp.registered_donors.len(), 1);
    }

    #[test]
    fn test_register_substitutes_sentinels() {
        let mut donor = DonorProfile::new("  ", "blank@example.com", Role::Donor);
        donor.phone = Some(String::new());
        let found = donor.clone();
        let mut directory = MockDonorDirectory::new();
        directory
            .expect_find_donor()
            .returning(move |_| Ok(Some(found.clone())));

        let mut camp = camp();
        let entry = register(&mut camp, &donor.id, &directory, Utc::now()).unwrap();

        assert_eq!(entry.name, UNKNOWN_NAME);
        assert_eq!(entry.phone, PHONE_NOT_PROVIDED);
        assert_eq!(entry.blood_group, GROUP_NOT_SPECIFIED);
    }

    #[test]
    fn test_register_twice_is_rejected() {
        let donor = donor();
        let found = donor.clone();
        let mut directory = MockDonorDirectory::new();
        directory
            .expect_find_donor()
            .times(2)
            .returning(move |_| Ok(Some(found.clone())));

        let mut camp = camp();
        register(&mut camp, &donor.id, &directory, Utc::now()).unwrap();
        let err = register(&mut camp, &donor.id, &directory, Utc::now()).unwrap_err();

        assert!(matches!(err, RaktError::AlreadyRegistered { .. }));
        assert_eq!(camp.registered_donors.len(), 1);
    }

    #[test]
    fn test_register_patient_is_forbidden() {
        let patient = DonorProfile::new("Ravi", "ravi@example.com", Role::Patient);
        let found = patient.clone();
        let mut directory = MockDonorDirectory::new();
        directory
            .expect_find_donor()
            .returning(move |_| Ok(Some(found.clone())));

        let mut camp = camp();
        let err = register(&mut camp, &patient.id, &directory, Utc::now()).unwrap_err();

        assert!(matches!(err, RaktError::Forbidden(_)));
        assert!(camp.registered_donors.is_empty());
    }

    #[test]
    fn test_register_unknown_donor() {
        let mut directory = MockDonorDirectory::new();
        directory.expect_find_donor().returning(|_| Ok(None));

        let mut camp = camp();
        let err = register(&mut camp, "ghost", &directory, Utc::now()).unwrap_err();

        assert!(matches!(err, RaktError::DonorNotFound(id) if id == "ghost"));
        assert!(camp.registered_donors.is_empty());
    }

    #[test]
    fn test_backfill_replaces_only_placeholders() {
        let donor = donor();
        let found = donor.clone();
        let mut directory = MockDonorDirectory::new();
        directory
            .expect_find_donor()
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));

        let mut first = camp();
        first.registered_donors.push(CampRegistration {
            donor_id: donor.id.clone(),
            name: "Nisha K".to_string(),
            phone: PHONE_NOT_PROVIDED.to_string(),
            blood_group: String::new(),
            registered_at: Utc::now(),
            attended: true,
        });
        let mut second = camp();
        second.registered_donors.push(snapshot(&donor, Utc::now()));

        let mut camps = vec![first, second];
        let summary = backfill(&mut camps, &directory).unwrap();

        assert_eq!(summary.camps_scanned, 2);
        assert_eq!(summary.entries_scanned, 2);
        assert_eq!(summary.entries_updated, 1);
        assert_eq!(summary.changed_camps, vec![camps[0].id.clone()]);

        let fixed = &camps[0].registered_donors[0];
        assert_eq!(fixed.name, "Nisha K");
        assert_eq!(fixed.phone, "98200 00000");
        assert_eq!(fixed.blood_group, "B+");
        assert!(fixed.attended);
    }

    #[test]
    fn test_backfill_counts_unresolved() {
        let mut directory = MockDonorDirectory::new();
        directory.expect_find_donor().returning(|_| Ok(None));

        let mut c = camp();
        c.registered_donors.push(CampRegistration {
            donor_id: Uuid::new_v4().to_string(),
            name: UNKNOWN_NAME.to_string(),
            phone: PHONE_NOT_PROVIDED.to_string(),
            blood_group: GROUP_NOT_SPECIFIED.to_string(),
            registered_at: Utc::now(),
            attended: false,
        });

        let mut camps = vec![c];
        let summary = backfill(&mut camps, &directory).unwrap();
        assert_eq!(summary.unresolved, 1);
        assert_eq!(summary.entries_updated, 0);
        assert!(summary.changed_camps.is_empty());
    }

    #[test]
    fn test_cleanup_removes_invalid_entries() {
        let good = snapshot(&donor(), Utc::now());
        let mut bad_id = good.clone();
        bad_id.donor_id = "undefined".to_string();
        let mut no_name = snapshot(&donor(), Utc::now());
        no_name.name = UNKNOWN_NAME.to_string();

        let mut blank_name = snapshot(&donor(), Utc::now());
        blank_name.name = "   ".to_string();
        let mut empty_name = snapshot(&donor(), Utc::now());
        empty_name.name = String::new();

        let mut c = camp();
        c.registered_donors = vec![bad_id, good.clone(), no_name, blank_name, empty_name];

        let removed = cleanup(&mut c);
        assert_eq!(removed.len(), 4);
        assert_eq!(c.registered_donors, vec![good]);
    }
}
