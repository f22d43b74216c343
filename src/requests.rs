use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    error::{RaktError, Result},
    inventory::InventoryLedger,
    models::{BloodRequest, InventoryItem, NewRequest, RequestStatus},
    storage::Database,
};

/// Result of a blood bank approving a request
#[derive(Debug, Clone)]
pub struct Approval {
    pub request: BloodRequest,
    pub inventory_item: InventoryItem,
}

pub struct RequestService<'a> {
    db: &'a Database,
}

impl<'a> RequestService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create(&self, requester_id: &str, details: NewRequest, now: DateTime<Utc>) -> Result<BloodRequest> {
        if self.db.get_donor(requester_id)?.is_none() {
            return Err(RaktError::not_found("User", requester_id));
        }
        if details.units < 1 {
            return Err(RaktError::Validation("at least one unit must be requested".to_string()));
        }
        if details.patient_name.trim().is_empty() {
            return Err(RaktError::Validation("patient name is required".to_string()));
        }
        if details.hospital.name.trim().is_empty() {
            return Err(RaktError::Validation("hospital name is required".to_string()));
        }

        let request = BloodRequest::new(details, requester_id, now);
        self.db.save_request(&request)?;
        info!(
            "Request {} for {} unit(s) of {} ({})",
            request.id, request.units, request.blood_group, request.urgency
        );
        Ok(request)
    }

    pub fn get(&self, request_id: &str) -> Result<BloodRequest> {
        self.db
            .get_request(request_id)?
            .ok_or_else(|| RaktError::not_found("Request", request_id))
    }

    fn pending(&self, request_id: &str) -> Result<BloodRequest> {
        let request = self.get(request_id)?;
        if !request.is_pending() {
            return Err(RaktError::InvalidTransition(format!(
                "request {} is already {}",
                request.id, request.status
            )));
        }
        Ok(request)
    }

    /// Only the requester, only while pending
    pub fn cancel(&self, requester_id: &str, request_id: &str) -> Result<BloodRequest> {
        let mut request = self.get(request_id)?;
        if request.requested_by != requester_id {
            return Err(RaktError::Forbidden(
                "only the requester can cancel a request".to_string(),
            ));
        }
        if !request.is_pending() {
            return Err(RaktError::InvalidTransition(format!(
                "request {} is already {}",
                request.id, request.status
            )));
        }

        request.status = RequestStatus::Cancelled;
        self.db.save_request(&request)?;
        info!("Request {} cancelled by requester", request.id);
        Ok(request)
    }

    /// Fulfil a pending request and take its units out of the bank's stock.
    /// Stock is floored at zero; approval is not gated on sufficiency.
    pub fn approve(&self, bank_id: &str, request_id: &str, now: DateTime<Utc>) -> Result<Approval> {
        let mut request = self.pending(request_id)?;

        let item = InventoryLedger::new(self.db).adjust_units(
            bank_id,
            request.blood_group,
            -(request.units as i64),
            now,
        )?;

        request.status = RequestStatus::Fulfilled;
        request.fulfilled_by = Some(bank_id.to_string());
        request.fulfilled_at = Some(now);
        self.db.save_request(&request)?;

        info!(
            "Blood bank {} fulfilled request {}; {} now at {} units",
            bank_id, request.id, item.blood_group, item.units
        );
        Ok(Approval {
            request,
            inventory_item: item,
        })
    }

    /// The bank declines; the request stays pending for other banks
    pub fn reject(&self, bank_id: &str, request_id: &str) -> Result<BloodRequest> {
        if self.db.get_bank(bank_id)?.is_none() {
            return Err(RaktError::not_found("Blood bank", bank_id));
        }
        let mut request = self.pending(request_id)?;

        if !request.declined_by.iter().any(|id| id == bank_id) {
            request.declined_by.push(bank_id.to_string());
            self.db.save_request(&request)?;
        }
        info!("Blood bank {} declined request {}", bank_id, request.id);
        Ok(request)
    }

    /// Pending requests the bank has not declined, most urgent first
    pub fn list_pending_for_bank(&self, bank_id: &str) -> Result<Vec<BloodRequest>> {
        let mut requests: Vec<BloodRequest> = self
            .db
            .list_requests()?
            .into_iter()
            .filter(|r| r.is_pending() && !r.declined_by.iter().any(|id| id == bank_id))
            .collect();
        requests.sort_by(|a, b| a.urgency.cmp(&b.urgency).then(a.required_by.cmp(&b.required_by)));
        Ok(requests)
    }

    pub fn list_for_requester(&self, requester_id: &str) -> Result<Vec<BloodRequest>> {
        self.db.requests_by_requester(requester_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BloodBank, BloodGroup, DonorProfile, Hospital, Role, Urgency};
    use chrono::NaiveDate;

    fn new_request(group: BloodGroup, units: u32, urgency: Urgency) -> NewRequest {
        NewRequest {
            patient_name: "Latha".to_string(),
            blood_group: group,
            units,
            urgency,
            hospital: Hospital {
                name: "General Hospital".to_string(),
                address: "Ring Road".to_string(),
                geo: None,
            },
            contact_number: "99887 76655".to_string(),
            required_by: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            description: None,
        }
    }

    fn setup() -> (Database, DonorProfile, BloodBank) {
        let db = Database::in_memory().unwrap();
        let patient = DonorProfile::new("Latha", "latha@example.com", Role::Patient);
        db.save_donor(&patient).unwrap();
        let bank = BloodBank::new("Prana", "prana@example.org", Utc::now());
        db.save_bank(&bank).unwrap();
        (db, patient, bank)
    }

    #[test]
    fn test_create_validates_units() {
        let (db, patient, _) = setup();
        let service = RequestService::new(&db);

        let err = service
            .create(&patient.id, new_request(BloodGroup::APos, 0, Urgency::Normal), Utc::now())
            .unwrap_err();
        assert!(matches!(err, RaktError::Validation(_)));

        let request = service
            .create(&patient.id, new_request(BloodGroup::APos, 2, Urgency::Normal), Utc::now())
            .unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
    }

    #[test]
    fn test_approve_decrements_and_clamps() {
        let (db, patient, bank) = setup();
        InventoryLedger::new(&db)
            .set_units(&bank.id, BloodGroup::BPos, 3, Utc::now())
            .unwrap();
        let service = RequestService::new(&db);
        let request = service
            .create(&patient.id, new_request(BloodGroup::BPos, 5, Urgency::Critical), Utc::now())
            .unwrap();

        let approval = service.approve(&bank.id, &request.id, Utc::now()).unwrap();
        assert_eq!(approval.inventory_item.units, 0);
        assert_eq!(approval.request.status, RequestStatus::Fulfilled);
        assert_eq!(approval.request.fulfilled_by.as_deref(), Some(bank.id.as_str()));

        let err = service.approve(&bank.id, &request.id, Utc::now()).unwrap_err();
        assert!(matches!(err, RaktError::InvalidTransition(_)));
    }

    #[test]
    fn test_approve_partial_stock() {
        let (db, patient, bank) = setup();
        let ledger = InventoryLedger::new(&db);
        ledger.set_units(&bank.id, BloodGroup::ONeg, 10, Utc::now()).unwrap();
        let service = RequestService::new(&db);
        let request = service
            .create(&patient.id, new_request(BloodGroup::ONeg, 4, Urgency::Urgent), Utc::now())
            .unwrap();

        service.approve(&bank.id, &request.id, Utc::now()).unwrap();
        let stock = ledger.read(&bank.id, Utc::now()).unwrap();
        let row = stock.items.iter().find(|i| i.blood_group == BloodGroup::ONeg).unwrap();
        assert_eq!(row.units, 6);
    }

    #[test]
    fn test_approve_missing_group_leaves_request_pending() {
        let (db, patient, mut bank) = setup();
        bank.inventory.retain(|i| i.blood_group != BloodGroup::AbNeg);
        db.save_bank(&bank).unwrap();
        let service = RequestService::new(&db);
        let request = service
            .create(&patient.id, new_request(BloodGroup::AbNeg, 1, Urgency::Normal), Utc::now())
            .unwrap();

        let err = service.approve(&bank.id, &request.id, Utc::now()).unwrap_err();
        assert!(matches!(err, RaktError::InventoryGroupNotFound { .. }));
        assert!(service.get(&request.id).unwrap().is_pending());
    }

    #[test]
    fn test_cancel_rules() {
        let (db, patient, bank) = setup();
        let service = RequestService::new(&db);
        let request = service
            .create(&patient.id, new_request(BloodGroup::APos, 1, Urgency::Normal), Utc::now())
            .unwrap();

        let err = service.cancel(&bank.id, &request.id).unwrap_err();
        assert!(matches!(err, RaktError::Forbidden(_)));

        let cancelled = service.cancel(&patient.id, &request.id).unwrap();
        assert_eq!(cancelled.status, RequestStatus::Cancelled);

        let err = service.cancel(&patient.id, &request.id).unwrap_err();
        assert!(matches!(err, RaktError::InvalidTransition(_)));
        let err = service.approve(&bank.id, &request.id, Utc::now()).unwrap_err();
        assert!(matches!(err, RaktError::InvalidTransition(_)));
    }

    #[test]
    fn test_reject_hides_from_that_bank_only() {
        let (db, patient, bank) = setup();
        let other = BloodBank::new("Other", "other@example.org", Utc::now());
        db.save_bank(&other).unwrap();
        let service = RequestService::new(&db);
        let request = service
            .create(&patient.id, new_request(BloodGroup::APos, 1, Urgency::Normal), Utc::now())
            .unwrap();

        let declined = service.reject(&bank.id, &request.id).unwrap();
        assert_eq!(declined.status, RequestStatus::Pending);
        assert!(service.list_pending_for_bank(&bank.id).unwrap().is_empty());
        assert_eq!(service.list_pending_for_bank(&other.id).unwrap().len(), 1);
    }

    #[test]
    fn test_pending_list_sorted_by_urgency() {
        let (db, patient, bank) = setup();
        let service = RequestService::new(&db);
        service
            .create(&patient.id, new_request(BloodGroup::APos, 1, Urgency::Normal), Utc::now())
            .unwrap();
        service
            .create(&patient.id, new_request(BloodGroup::APos, 1, Urgency::Critical), Utc::now())
            .unwrap();

        let pending = service.list_pending_for_bank(&bank.id).unwrap();
        assert_eq!(pending[0].urgency, Urgency::Critical);
        assert_eq!(service.list_for_requester(&patient.id).unwrap().len(), 2);
    }
}
