use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::{
    error::{RaktError, Result},
    inventory::reconciliation::{InventoryReconciler, Reconciled},
    models::{BloodBank, BloodGroup, Inventory, InventoryItem},
    storage::Database,
};

/// Reads and writes a blood bank's stock across both stores. The standalone
/// record is written first and is authoritative; the embedded list on the
/// bank is kept in step on a best-effort basis.
pub struct InventoryLedger<'a> {
    db: &'a Database,
}

impl<'a> InventoryLedger<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn load_bank(&self, bank_id: &str) -> Result<BloodBank> {
        self.db
            .get_bank(bank_id)?
            .ok_or_else(|| RaktError::not_found("Blood bank", bank_id))
    }

    /// Serve the reconciled inventory for a bank. When the answer did not
    /// come from the standalone record it is written back there so later
    /// reads converge; a failed write-back is logged, not returned.
    pub fn read(&self, bank_id: &str, now: DateTime<Utc>) -> Result<Reconciled> {
        let bank = self.load_bank(bank_id)?;
        self.read_for(&bank, now)
    }

    fn read_for(&self, bank: &BloodBank, now: DateTime<Utc>) -> Result<Reconciled> {
        let standalone = self.db.get_inventory(&bank.id)?;
        let secondary = standalone.as_ref().map(|inv| inv.items.as_slice()).unwrap_or(&[]);

        let reconciled = InventoryReconciler::reconcile(&bank.inventory, secondary, now);

        if reconciled.needs_write_back() {
            debug!(
                "Writing {:?} inventory back to standalone store for {}",
                reconciled.source, bank.id
            );
            let inventory = Inventory::new(bank, reconciled.items.clone(), now);
            if let Err(e) = self.db.save_inventory(&inventory) {
                warn!("Inventory write-back failed for bank {}: {}", bank.id, e);
            }
        }

        Ok(reconciled)
    }

    /// Apply a signed change to one group, floored at zero
    pub fn adjust_units(
        &self,
        bank_id: &str,
        group: BloodGroup,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<InventoryItem> {
        let bank = self.load_bank(bank_id)?;
        let mut items = self.read_for(&bank, now)?.items;

        InventoryReconciler::adjust(&mut items, group, delta, now).ok_or_else(|| {
            RaktError::InventoryGroupNotFound {
                bank_id: bank.id.clone(),
                group,
            }
        })?;

        let updated = Self::row(&items, group);
        self.persist(bank, items, now)?;
        Ok(updated)
    }

    /// Replace one group's count, floored at zero
    pub fn set_units(
        &self,
        bank_id: &str,
        group: BloodGroup,
        units: i64,
        now: DateTime<Utc>,
    ) -> Result<InventoryItem> {
        let bank = self.load_bank(bank_id)?;
        let mut items = self.read_for(&bank, now)?.items;

        InventoryReconciler::set(&mut items, group, units, now).ok_or_else(|| {
            RaktError::InventoryGroupNotFound {
                bank_id: bank.id.clone(),
                group,
            }
        })?;

        let updated = Self::row(&items, group);
        self.persist(bank, items, now)?;
        Ok(updated)
    }

    /// Full-inventory save. Listed groups are set outright; a listed group
    /// missing from the stored rows is added. Rows come back in canonical
    /// blood-group order.
    pub fn save_all(
        &self,
        bank_id: &str,
        counts: &[(BloodGroup, i64)],
        now: DateTime<Utc>,
    ) -> Result<Vec<InventoryItem>> {
        let bank = self.load_bank(bank_id)?;
        let mut items = self.read_for(&bank, now)?.items;

        for (group, units) in counts {
            if InventoryReconciler::set(&mut items, *group, *units, now).is_none() {
                items.push(InventoryItem::new(
                    *group,
                    InventoryReconciler::set_absolute(*units),
                    now,
                ));
            }
        }
        items.sort_by_key(|item| item.blood_group);

        self.persist(bank, items.clone(), now)?;
        info!("Saved full inventory for {} ({} groups)", bank_id, items.len());
        Ok(items)
    }

    fn row(items: &[InventoryItem], group: BloodGroup) -> InventoryItem {
        items
            .iter()
            .find(|item| item.blood_group == group)
            .cloned()
            .unwrap_or_else(|| InventoryItem::new(group, 0, Utc::now()))
    }

    fn persist(&self, mut bank: BloodBank, items: Vec<InventoryItem>, now: DateTime<Utc>) -> Result<()> {
        let inventory = Inventory::new(&bank, items.clone(), now);
        self.db.save_inventory(&inventory)?;

        bank.inventory = items;
        if let Err(e) = self.db.save_bank(&bank) {
            warn!("Embedded inventory sync failed for bank {}: {}", bank.id, e);
        }
        Ok(())
    }
}
