use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::models::{BloodGroup, InventoryItem};

/// Which representation a reconciled read was served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InventorySource {
    /// Standalone inventory record
    Standalone,
    /// Embedded list on the blood bank
    Embedded,
    /// Neither store had rows; all groups at zero
    Synthesized,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciled {
    pub items: Vec<InventoryItem>,
    pub source: InventorySource,
}

impl Reconciled {
    /// The standalone store did not supply this answer and should be
    /// brought up to date.
    pub fn needs_write_back(&self) -> bool {
        self.source != InventorySource::Standalone
    }
}

/// Unit-count rules for one inventory bucket, plus the merge rule between
/// the embedded and standalone stock lists.
pub struct InventoryReconciler;

impl InventoryReconciler {
    /// `max(0, current + delta)`
    pub fn apply_delta(current: u32, delta: i64) -> u32 {
        Self::clamp((current as i64).saturating_add(delta))
    }

    /// Replace the count outright, floored at zero
    pub fn set_absolute(new_units: i64) -> u32 {
        Self::clamp(new_units)
    }

    fn clamp(units: i64) -> u32 {
        units.clamp(0, u32::MAX as i64) as u32
    }

    /// Adjust one bucket in place. Returns the new unit count, or `None` when
    /// the group has no row (no silent insert).
    pub fn adjust(
        items: &mut [InventoryItem],
        group: BloodGroup,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Option<u32> {
        let item = items.iter_mut().find(|item| item.blood_group == group)?;
        let before = item.units;
        item.units = Self::apply_delta(before, delta);
        item.last_updated = now;
        debug!("{} units {} -> {} (delta {})", group, before, item.units, delta);
        Some(item.units)
    }

    /// Set one bucket in place; `None` when the group has no row.
    pub fn set(
        items: &mut [InventoryItem],
        group: BloodGroup,
        units: i64,
        now: DateTime<Utc>,
    ) -> Option<u32> {
        let item = items.iter_mut().find(|item| item.blood_group == group)?;
        item.units = Self::set_absolute(units);
        item.last_updated = now;
        debug!("{} units set to {}", group, item.units);
        Some(item.units)
    }

    /// Pick the representation to serve: standalone when it has rows, else
    /// embedded, else eight zero rows.
    pub fn reconcile(
        primary: &[InventoryItem],
        secondary: &[InventoryItem],
        now: DateTime<Utc>,
    ) -> Reconciled {
        if !secondary.is_empty() {
            return Reconciled {
                items: secondary.to_vec(),
                source: InventorySource::Standalone,
            };
        }

        if !primary.is_empty() {
            debug!("Standalone inventory empty, serving {} embedded rows", primary.len());
            return Reconciled {
                items: primary.to_vec(),
                source: InventorySource::Embedded,
            };
        }

        debug!("No inventory rows in either store, synthesizing zero stock");
        Reconciled {
            items: InventoryItem::empty_set(now),
            source: InventorySource::Synthesized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_delta_clamps() {
        assert_eq!(InventoryReconciler::apply_delta(5, -10), 0);
        assert_eq!(InventoryReconciler::apply_delta(5, 3), 8);
        assert_eq!(InventoryReconciler::apply_delta(0, -1), 0);
        assert_eq!(InventoryReconciler::apply_delta(7, 0), 7);
    }

    #[test]
    fn test_apply_delta_saturates_at_extremes() {
        assert_eq!(InventoryReconciler::apply_delta(5, i64::MAX), u32::MAX);
        assert_eq!(InventoryReconciler::apply_delta(5, i64::MIN), 0);
        assert_eq!(InventoryReconciler::apply_delta(u32::MAX, 1), u32::MAX);
    }

    #[test]
    fn test_set_absolute_clamps() {
        assert_eq!(InventoryReconciler::set_absolute(12), 12);
        assert_eq!(InventoryReconciler::set_absolute(-4), 0);
    }

    #[test]
    fn test_adjust_stamps_last_updated() {
        let earlier = Utc::now() - chrono::Duration::hours(3);
        let now = Utc::now();
        let mut items = InventoryItem::empty_set(earlier);

        let units = InventoryReconciler::adjust(&mut items, BloodGroup::BNeg, 4, now);
        assert_eq!(units, Some(4));

        let row = items.iter().find(|i| i.blood_group == BloodGroup::BNeg).unwrap();
        assert_eq!(row.last_updated, now);
        let untouched = items.iter().find(|i| i.blood_group == BloodGroup::APos).unwrap();
        assert_eq!(untouched.last_updated, earlier);
    }

    #[test]
    fn test_adjust_missing_group() {
        let now = Utc::now();
        let mut items = vec![InventoryItem::new(BloodGroup::OPos, 3, now)];
        assert_eq!(InventoryReconciler::adjust(&mut items, BloodGroup::ONeg, -1, now), None);
        assert_eq!(InventoryReconciler::set(&mut items, BloodGroup::ONeg, 9, now), None);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_reconcile_both_empty_synthesizes() {
        let reconciled = InventoryReconciler::reconcile(&[], &[], Utc::now());
        assert_eq!(reconciled.source, InventorySource::Synthesized);
        assert_eq!(reconciled.items.len(), 8);
        assert!(reconciled.items.iter().all(|i| i.units == 0));
        assert!(reconciled.needs_write_back());
    }

    #[test]
    fn test_reconcile_prefers_standalone() {
        let now = Utc::now();
        let primary = vec![InventoryItem::new(BloodGroup::APos, 1, now)];
        let secondary = vec![InventoryItem::new(BloodGroup::APos, 9, now)];

        let reconciled = InventoryReconciler::reconcile(&primary, &secondary, now);
        assert_eq!(reconciled.items, secondary);
        assert!(!reconciled.needs_write_back());
    }

    #[test]
    fn test_reconcile_falls_back_to_embedded() {
        let now = Utc::now();
        let primary = vec![InventoryItem::new(BloodGroup::AbNeg, 6, now)];

        let reconciled = InventoryReconciler::reconcile(&primary, &[], now);
        assert_eq!(reconciled.items, primary);
        assert_eq!(reconciled.source, InventorySource::Embedded);
        assert!(reconciled.needs_write_back());
    }
}
