use chrono::Utc;
use rusqlite::{params, Connection};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::{
    error::{RaktError, Result},
    models::{BloodBank, BloodCamp, BloodRequest, DonorHealthRecord, DonorProfile, Inventory},
};

/// Document collections. Each one is a table holding JSON bodies keyed by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Donors,
    BloodBanks,
    Inventories,
    HealthRecords,
    Camps,
    Requests,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Donors,
        Collection::BloodBanks,
        Collection::Inventories,
        Collection::HealthRecords,
        Collection::Camps,
        Collection::Requests,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Collection::Donors => "donors",
            Collection::BloodBanks => "blood_banks",
            Collection::Inventories => "inventories",
            Collection::HealthRecords => "health_records",
            Collection::Camps => "camps",
            Collection::Requests => "requests",
        }
    }
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        for collection in Collection::ALL {
            let table = collection.table();
            self.conn.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {table} (
                        id TEXT PRIMARY KEY,
                        owner TEXT,
                        body TEXT NOT NULL,
                        updated_at TEXT NOT NULL
                    )"
                ),
                [],
            )?;

            self.conn.execute(
                &format!("CREATE INDEX IF NOT EXISTS idx_{table}_owner ON {table}(owner)"),
                [],
            )?;
        }

        Ok(())
    }

    /// Insert or overwrite a document. Last write wins.
    pub fn put<T: Serialize>(
        &self,
        collection: Collection,
        id: &str,
        owner: Option<&str>,
        doc: &T,
    ) -> Result<()> {
        let body = serde_json::to_string(doc)?;
        self.conn.execute(
            &format!(
                "INSERT INTO {} (id, owner, body, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    owner = excluded.owner,
                    body = excluded.body,
                    updated_at = excluded.updated_at",
                collection.table()
            ),
            params![id, owner, body, Utc::now().to_rfc3339()],
        )?;
        debug!("Saved {} document {}", collection.table(), id);
        Ok(())
    }

    pub fn fetch<T: DeserializeOwned>(&self, collection: Collection, id: &str) -> Result<Option<T>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT body FROM {} WHERE id = ?1",
            collection.table()
        ))?;

        let mut rows = stmt.query_map([id], |row| row.get::<_, String>(0))?;

        match rows.next().transpose()? {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    pub fn fetch_all<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT body FROM {} ORDER BY rowid",
            collection.table()
        ))?;

        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(RaktError::from))
            .collect()
    }

    pub fn fetch_by_owner<T: DeserializeOwned>(
        &self,
        collection: Collection,
        owner: &str,
    ) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT body FROM {} WHERE owner = ?1 ORDER BY rowid",
            collection.table()
        ))?;

        let bodies = stmt
            .query_map([owner], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(RaktError::from))
            .collect()
    }

    /// Returns true when a document was removed
    pub fn remove(&self, collection: Collection, id: &str) -> Result<bool> {
        let affected = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", collection.table()),
            [id],
        )?;
        Ok(affected > 0)
    }

    pub fn count(&self, collection: Collection) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", collection.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    // Donors are owned by their email so lookups by email stay indexed.

    pub fn save_donor(&self, donor: &DonorProfile) -> Result<()> {
        self.put(Collection::Donors, &donor.id, Some(&donor.email), donor)
    }

    pub fn get_donor(&self, id: &str) -> Result<Option<DonorProfile>> {
        self.fetch(Collection::Donors, id)
    }

    pub fn find_donor_by_email(&self, email: &str) -> Result<Option<DonorProfile>> {
        let email = email.trim().to_lowercase();
        Ok(self
            .fetch_by_owner::<DonorProfile>(Collection::Donors, &email)?
            .into_iter()
            .next())
    }

    pub fn save_bank(&self, bank: &BloodBank) -> Result<()> {
        self.put(Collection::BloodBanks, &bank.id, Some(&bank.email), bank)
    }

    pub fn get_bank(&self, id: &str) -> Result<Option<BloodBank>> {
        self.fetch(Collection::BloodBanks, id)
    }

    pub fn find_bank_by_email(&self, email: &str) -> Result<Option<BloodBank>> {
        let email = email.trim().to_lowercase();
        Ok(self
            .fetch_by_owner::<BloodBank>(Collection::BloodBanks, &email)?
            .into_iter()
            .next())
    }

    pub fn list_banks(&self) -> Result<Vec<BloodBank>> {
        self.fetch_all(Collection::BloodBanks)
    }

    pub fn save_inventory(&self, inventory: &Inventory) -> Result<()> {
        self.put(
            Collection::Inventories,
            &inventory.blood_bank_id,
            Some(&inventory.blood_bank_id),
            inventory,
        )
    }

    pub fn get_inventory(&self, bank_id: &str) -> Result<Option<Inventory>> {
        self.fetch(Collection::Inventories, bank_id)
    }

    pub fn save_health_record(&self, record: &DonorHealthRecord) -> Result<()> {
        self.put(Collection::HealthRecords, &record.id, Some(&record.donor_id), record)
    }

    pub fn get_health_record(&self, id: &str) -> Result<Option<DonorHealthRecord>> {
        self.fetch(Collection::HealthRecords, id)
    }

    pub fn health_records_for_donor(&self, donor_id: &str) -> Result<Vec<DonorHealthRecord>> {
        self.fetch_by_owner(Collection::HealthRecords, donor_id)
    }

    pub fn list_health_records(&self) -> Result<Vec<DonorHealthRecord>> {
        self.fetch_all(Collection::HealthRecords)
    }

    pub fn save_camp(&self, camp: &BloodCamp) -> Result<()> {
        self.put(Collection::Camps, &camp.id, Some(&camp.organizer_id), camp)
    }

    pub fn get_camp(&self, id: &str) -> Result<Option<BloodCamp>> {
        self.fetch(Collection::Camps, id)
    }

    pub fn list_camps(&self) -> Result<Vec<BloodCamp>> {
        self.fetch_all(Collection::Camps)
    }

    pub fn camps_by_organizer(&self, organizer_id: &str) -> Result<Vec<BloodCamp>> {
        self.fetch_by_owner(Collection::Camps, organizer_id)
    }

    pub fn delete_camp(&self, id: &str) -> Result<bool> {
        self.remove(Collection::Camps, id)
    }

    pub fn save_request(&self, request: &BloodRequest) -> Result<()> {
        self.put(Collection::Requests, &request.id, Some(&request.requested_by), request)
    }

    pub fn get_request(&self, id: &str) -> Result<Option<BloodRequest>> {
        self.fetch(Collection::Requests, id)
    }

    pub fn list_requests(&self) -> Result<Vec<BloodRequest>> {
        self.fetch_all(Collection::Requests)
    }

    pub fn requests_by_requester(&self, user_id: &str) -> Result<Vec<BloodRequest>> {
        self.fetch_by_owner(Collection::Requests, user_id)
    }

    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let requests = self.list_requests()?;
        let pending_requests = requests.iter().filter(|r| r.is_pending()).count();

        let camps = self.list_camps()?;
        let total_registrations = camps.iter().map(|c| c.registered_donors.len()).sum();
        let units_collected = camps.iter().map(|c| c.collected_units as u64).sum();

        Ok(DatabaseStats {
            donors: self.count(Collection::Donors)?,
            blood_banks: self.count(Collection::BloodBanks)?,
            health_records: self.count(Collection::HealthRecords)?,
            camps: camps.len(),
            camp_registrations: total_registrations,
            camp_units_collected: units_collected,
            requests: requests.len(),
            pending_requests,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub donors: usize,
    pub blood_banks: usize,
    pub health_records: usize,
    pub camps: usize,
    pub camp_registrations: usize,
    pub camp_units_collected: u64,
    pub requests: usize,
    pub pending_requests: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BloodGroup, Role};

    #[test]
    fn test_put_and_fetch_document() {
        let db = Database::in_memory().unwrap();
        let donor = DonorProfile::new("Meera", "Meera@Example.com", Role::Donor)
            .with_blood_group(BloodGroup::OPos);
        db.save_donor(&donor).unwrap();

        let loaded = db.get_donor(&donor.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Meera");
        assert_eq!(loaded.blood_group, Some(BloodGroup::OPos));

        let by_email = db.find_donor_by_email("meera@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, donor.id);
        assert!(db.get_donor("missing").unwrap().is_none());
    }

    #[test]
    fn test_overwrite_keeps_insertion_order() {
        let db = Database::in_memory().unwrap();
        let mut first = DonorProfile::new("First", "first@example.com", Role::Donor);
        let second = DonorProfile::new("Second", "second@example.com", Role::Patient);
        db.save_donor(&first).unwrap();
        db.save_donor(&second).unwrap();

        first.name = "First Renamed".to_string();
        db.save_donor(&first).unwrap();

        let all: Vec<DonorProfile> = db.fetch_all(Collection::Donors).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "First Renamed");
        assert_eq!(all[1].name, "Second");
        assert_eq!(db.count(Collection::Donors).unwrap(), 2);
    }

    #[test]
    fn test_file_backed_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rakt.db");
        let path = path.to_str().unwrap();

        let bank = BloodBank::new("Lifeline", "desk@lifeline.org", Utc::now());
        {
            let db = Database::new(path).unwrap();
            db.save_bank(&bank).unwrap();
        }

        let db = Database::new(path).unwrap();
        let loaded = db.get_bank(&bank.id).unwrap().unwrap();
        assert_eq!(loaded.inventory.len(), 8);
        assert!(db.remove(Collection::BloodBanks, &bank.id).unwrap());
        assert!(!db.remove(Collection::BloodBanks, &bank.id).unwrap());
    }
}
