use std::collections::HashMap;

use super::ClassCapacity;
use crate::workflows::admissions::domain::{ApplicationRecord, ApplicationStatus, ClassId};

/// Seats taken per class, derived from application records on every read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupancyLedger {
    counts: HashMap<ClassId, u32>,
}

impl OccupancyLedger {
    /// Counts assigned applications per class id.
    pub fn derive<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ApplicationRecord>,
    {
        let mut ledger = Self::default();
        for record in records {
            if record.status != ApplicationStatus::Assigned {
                continue;
            }
            if let Some(class_id) = &record.class_id {
                ledger.increment(class_id);
            }
        }
        ledger
    }

    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (ClassId, u32)>,
    {
        Self {
            counts: counts.into_iter().collect(),
        }
    }

    pub fn seats_taken(&self, class_id: &ClassId) -> u32 {
        self.counts.get(class_id).copied().unwrap_or(0)
    }

    /// A class with `max_size == 0` never has room.
    pub fn has_room(&self, class: &ClassCapacity) -> bool {
        self.seats_taken(&class.class_id) < class.max_size
    }

    pub(crate) fn increment(&mut self, class_id: &ClassId) {
        *self.counts.entry(class_id.clone()).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(id: &str, max_size: u32) -> ClassCapacity {
        ClassCapacity {
            class_id: ClassId(id.to_string()),
            max_size,
        }
    }

    #[test]
    fn zero_capacity_class_is_always_full() {
        let ledger = OccupancyLedger::default();
        assert!(!ledger.has_room(&class("1A", 0)));
        assert!(ledger.has_room(&class("1B", 1)));
    }

    #[test]
    fn increments_until_capacity() {
        let mut ledger = OccupancyLedger::from_counts([(ClassId("1A".to_string()), 1)]);
        let target = class("1A", 2);
        assert!(ledger.has_room(&target));
        ledger.increment(&target.class_id);
        assert_eq!(ledger.seats_taken(&target.class_id), 2);
        assert!(!ledger.has_room(&target));
    }
}
