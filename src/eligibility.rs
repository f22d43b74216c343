use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{DonorHealthRecord, Eligibility, HealthForm};

const SECONDS_PER_DAY: i64 = 86_400;

/// Numeric thresholds used by the donor rule set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityRules {
    pub min_weight_kg: f64,
    pub min_days_between_donations: i64,
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self {
            min_weight_kg: 50.0,
            min_days_between_donations: 56,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EligibilityVerdict {
    pub is_eligible: bool,
    pub reasons: Vec<String>,
}

/// Derives a donor's eligibility verdict from a health form.
///
/// Only a fixed subset of the collected signals disqualify: HIV/AIDS,
/// hepatitis B/C, cancer, heart disease, bleeding disorders, a recent tattoo
/// or piercing, travel to a malaria area, a recent fever, recent alcohol,
/// low or missing weight, and a donation inside the waiting window. Reasons
/// are reported in that order.
#[derive(Debug, Clone, Default)]
pub struct EligibilityEvaluator {
    rules: EligibilityRules,
}

impl EligibilityEvaluator {
    pub fn new(rules: EligibilityRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &EligibilityRules {
        &self.rules
    }

    pub fn evaluate(&self, form: &HealthForm, now: DateTime<Utc>) -> EligibilityVerdict {
        let mut reasons = Vec::new();

        let conditions = &form.medical_conditions;
        if conditions.hiv_aids {
            reasons.push("HIV/AIDS".to_string());
        }
        if conditions.hepatitis_bc {
            reasons.push("Hepatitis B/C".to_string());
        }
        if conditions.cancer {
            reasons.push("Cancer history".to_string());
        }
        if conditions.heart_disease {
            reasons.push("Heart disease".to_string());
        }
        if conditions.bleeding_disorder {
            reasons.push("Bleeding disorder".to_string());
        }

        let activities = &form.recent_activities;
        if activities.tattoo_or_piercing {
            reasons.push("Recent tattoo/piercing (wait 6 months)".to_string());
        }
        if activities.travel_to_malaria_area {
            reasons.push("Travel to malaria-endemic area (wait 3 months)".to_string());
        }

        let health = &form.current_health;
        if health.recent_fever_or_illness {
            reasons.push("Recent fever or illness".to_string());
        }
        if health.recent_alcohol_consumption {
            reasons.push("Recent alcohol consumption (wait 24 hours)".to_string());
        }

        // Missing or non-numeric weight fails closed
        let weight_ok = form
            .weight_kg
            .map(|w| w.is_finite() && w >= self.rules.min_weight_kg)
            .unwrap_or(false);
        if !weight_ok {
            reasons.push(format!("Weight below {}kg", self.rules.min_weight_kg));
        }

        if let Some(last) = form.donation_history.last_donation_date {
            let days = Self::days_since(last, now);
            debug!("Last donation {} whole days ago", days);
            if days < self.rules.min_days_between_donations {
                reasons.push(format!(
                    "Less than {} days since last donation",
                    self.rules.min_days_between_donations
                ));
            }
        }

        EligibilityVerdict {
            is_eligible: reasons.is_empty(),
            reasons,
        }
    }

    /// Overwrite the stored verdict on a record. Every persist path calls this.
    pub fn apply_to(&self, record: &mut DonorHealthRecord, now: DateTime<Utc>) {
        let verdict = self.evaluate(&record.form, now);
        record.eligibility = Eligibility {
            is_eligible: verdict.is_eligible,
            reasons: verdict.reasons,
            eligibility_date: record.eligibility.eligibility_date,
        };
    }

    /// Whole days elapsed, floored
    fn days_since(last: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        (now - last).num_seconds().div_euclid(SECONDS_PER_DAY)
    }
}
