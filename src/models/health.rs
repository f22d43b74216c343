use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::blood_group::{declared, BloodGroup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicalConditions {
    pub heart_disease: bool,
    pub diabetes: bool,
    pub high_blood_pressure: bool,
    pub low_blood_pressure: bool,
    pub cancer: bool,
    pub hiv_aids: bool,
    pub hepatitis_bc: bool,
    pub malaria: bool,
    pub tuberculosis: bool,
    pub epilepsy: bool,
    pub asthma: bool,
    pub bleeding_disorder: bool,
    pub kidney_disease: bool,
    pub liver_disease: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentActivities {
    pub tattoo_or_piercing: bool,
    pub surgery_or_transfusion: bool,
    pub dental_work: bool,
    pub vaccination: bool,
    pub travel_to_malaria_area: bool,
    pub pregnancy_or_breastfeeding: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentHealth {
    pub recent_fever_or_illness: bool,
    pub on_medication: bool,
    pub medication_details: Option<String>,
    pub recent_alcohol_consumption: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lifestyle {
    pub smoker: bool,
    pub regular_alcohol: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DonationHistory {
    pub previously_donated: bool,
    pub last_donation_date: Option<DateTime<Utc>>,
    pub total_donations: u32,
    pub adverse_reactions: bool,
    pub adverse_reaction_details: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Consent {
    pub information_accurate: bool,
    pub consent_to_donate: bool,
    pub understands_process: bool,
}

impl Consent {
    pub fn is_complete(&self) -> bool {
        self.information_accurate && self.consent_to_donate && self.understands_process
    }
}

/// Fields a donor fills in. Missing booleans read as `false`; a missing
/// weight stays `None` and is treated as disqualifying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthForm {
    pub full_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(with = "declared", default)]
    pub blood_group: Option<BloodGroup>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub medical_conditions: MedicalConditions,
    #[serde(default)]
    pub recent_activities: RecentActivities,
    #[serde(default)]
    pub current_health: CurrentHealth,
    #[serde(default)]
    pub lifestyle: Lifestyle,
    #[serde(default)]
    pub donation_history: DonationHistory,
    #[serde(default)]
    pub consent: Consent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Eligibility {
    pub is_eligible: bool,
    pub reasons: Vec<String>,
    /// Stored for future re-eligibility dates; never computed.
    pub eligibility_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
    RequiresReview,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
            ReviewStatus::RequiresReview => "requires_review",
        }
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(ReviewStatus::Pending),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            "requires_review" => Ok(ReviewStatus::RequiresReview),
            other => Err(format!("Unknown review status: {}", other)),
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub status: ReviewStatus,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Default for Review {
    fn default() -> Self {
        Self {
            status: ReviewStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorHealthRecord {
    pub id: String,
    pub donor_id: String,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub form: HealthForm,
    pub eligibility: Eligibility,
    pub review: Review,
}

impl DonorHealthRecord {
    /// New pending record. The eligibility verdict is left empty until the
    /// evaluator runs on persist.
    pub fn new(donor_id: &str, form: HealthForm, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            donor_id: donor_id.to_string(),
            submitted_at: now,
            updated_at: now,
            form,
            eligibility: Eligibility::default(),
            review: Review::default(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.review.status == ReviewStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_flags_default_false() {
        let form: HealthForm = serde_json::from_str(
            r#"{
                "full_name": "Asha Rao",
                "blood_group": "unknown",
                "medical_conditions": { "hiv_aids": true },
                "consent": { "information_accurate": true }
            }"#,
        )
        .unwrap();

        assert!(form.medical_conditions.hiv_aids);
        assert!(!form.medical_conditions.cancer);
        assert!(!form.recent_activities.tattoo_or_piercing);
        assert!(form.weight_kg.is_none());
        assert!(form.blood_group.is_none());
        assert!(!form.consent.is_complete());
    }

    #[test]
    fn test_record_round_trips_flattened_form() {
        let form: HealthForm =
            serde_json::from_str(r#"{"full_name":"Ravi","weight_kg":72.5,"blood_group":"B+"}"#).unwrap();
        let record = DonorHealthRecord::new("donor-1", form, Utc::now());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["full_name"], "Ravi");
        assert_eq!(value["review"]["status"], "pending");

        let back: DonorHealthRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_review_status_parse() {
        assert_eq!("requires-review".parse::<ReviewStatus>().unwrap(), ReviewStatus::RequiresReview);
        assert!("maybe".parse::<ReviewStatus>().is_err());
    }
}
