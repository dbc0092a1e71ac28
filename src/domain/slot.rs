//! Slot identifier scheme
//!
//! Slots are not stored. A location with `total_slots = n` has the slot
//! space `{prefix}1 ..= {prefix}n`, where the prefix is `C` for EV
//! charging and `P` for parking. Identifiers compare case-insensitively:
//! every `SlotId` is held in canonical upper case.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::location::LocationKind;

/// Canonical (upper-case) slot identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotId(String);

impl SlotId {
    /// Trim and canonicalise a raw value. Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_ascii_uppercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a raw stored value.
    pub fn matches(&self, raw: &str) -> bool {
        self.0.eq_ignore_ascii_case(raw.trim())
    }

    /// The 1-based ordinal if this id lives in `kind`'s slot space.
    pub fn ordinal_for(&self, kind: LocationKind) -> Option<u32> {
        let rest = self.0.strip_prefix(kind.slot_prefix())?;
        if rest.starts_with('0') {
            return None;
        }
        rest.parse().ok()
    }

    /// Whether this id names one of the `total` slots of a `kind` location.
    pub fn belongs_to(&self, kind: LocationKind, total: u32) -> bool {
        matches!(self.ordinal_for(kind), Some(n) if n >= 1 && n <= total)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SlotId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SlotId::parse(&value).ok_or_else(|| "slot id must not be blank".to_string())
    }
}

impl From<SlotId> for String {
    fn from(id: SlotId) -> Self {
        id.0
    }
}

/// Slot id for `ordinal` (1-based) at a location of `kind`.
pub fn slot_id(kind: LocationKind, ordinal: u32) -> SlotId {
    SlotId(format!("{}{}", kind.slot_prefix(), ordinal))
}

/// The whole slot space of a location, in ordinal order.
pub fn slot_ids(kind: LocationKind, total: u32) -> Vec<SlotId> {
    (1..=total).map(|n| slot_id(kind, n)).collect()
}

/// Set of slot ids currently held by active bookings.
///
/// Built from raw `selected_slot` values: nulls and blanks are dropped and
/// duplicates collapse case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupiedSlots(HashSet<SlotId>);

impl OccupiedSlots {
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        Self(
            values
                .into_iter()
                .flatten()
                .filter_map(|v| SlotId::parse(v.as_ref()))
                .collect(),
        )
    }

    pub fn contains(&self, slot: &SlotId) -> bool {
        self.0.contains(slot)
    }

    /// Membership check for an unnormalised value.
    pub fn contains_raw(&self, raw: &str) -> bool {
        SlotId::parse(raw).is_some_and(|id| self.0.contains(&id))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sorted(&self) -> Vec<SlotId> {
        let mut v: Vec<SlotId> = self.0.iter().cloned().collect();
        v.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.cmp(b)));
        v
    }
}

/// One cell of a location's slot grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotCell {
    pub id: SlotId,
    pub ordinal: u32,
    pub occupied: bool,
}

pub fn slot_grid(kind: LocationKind, total: u32, occupied: &OccupiedSlots) -> Vec<SlotCell> {
    (1..=total)
        .map(|n| {
            let id = slot_id(kind, n);
            let occupied = occupied.contains(&id);
            SlotCell {
                id,
                ordinal: n,
                occupied,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_follows_location_kind() {
        assert_eq!(slot_id(LocationKind::Parking, 1).as_str(), "P1");
        assert_eq!(slot_id(LocationKind::Ev, 4).as_str(), "C4");
    }

    #[test]
    fn slot_space_is_one_based_and_complete() {
        let ids: Vec<String> = slot_ids(LocationKind::Parking, 3)
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(ids, vec!["P1", "P2", "P3"]);
        assert!(slot_ids(LocationKind::Ev, 0).is_empty());
    }

    #[test]
    fn lower_case_stored_value_matches_generated_id() {
        let occupied = OccupiedSlots::from_values(vec![Some("p1")]);
        assert!(occupied.contains(&slot_id(LocationKind::Parking, 1)));
        assert!(slot_id(LocationKind::Parking, 1).matches("p1"));
        assert!(occupied.contains_raw(" P1 "));
    }

    #[test]
    fn duplicates_nulls_and_blanks_collapse() {
        let occupied =
            OccupiedSlots::from_values(vec![Some("P1"), Some("P3"), Some("p3"), None, Some("  ")]);
        assert_eq!(occupied.len(), 2);
        let sorted: Vec<String> = occupied.sorted().into_iter().map(String::from).collect();
        assert_eq!(sorted, vec!["P1", "P3"]);
    }

    #[test]
    fn sorted_orders_numerically() {
        let occupied = OccupiedSlots::from_values(vec![Some("P10"), Some("P2")]);
        let sorted: Vec<String> = occupied.sorted().into_iter().map(String::from).collect();
        assert_eq!(sorted, vec!["P2", "P10"]);
    }

    #[test]
    fn belongs_to_checks_prefix_and_range() {
        let p2 = SlotId::parse("p2").unwrap();
        assert!(p2.belongs_to(LocationKind::Parking, 2));
        assert!(!p2.belongs_to(LocationKind::Parking, 1));
        assert!(!p2.belongs_to(LocationKind::Ev, 5));
        assert!(!SlotId::parse("P0").unwrap().belongs_to(LocationKind::Parking, 5));
        assert!(!SlotId::parse("P01").unwrap().belongs_to(LocationKind::Parking, 5));
        assert!(!SlotId::parse("Px").unwrap().belongs_to(LocationKind::Parking, 5));
    }

    #[test]
    fn grid_marks_occupied_cells() {
        let occupied = OccupiedSlots::from_values(vec![Some("c2")]);
        let grid = slot_grid(LocationKind::Ev, 3, &occupied);
        assert_eq!(grid.len(), 3);
        assert!(!grid[0].occupied);
        assert!(grid[1].occupied);
        assert_eq!(grid[1].id.as_str(), "C2");
    }

    #[test]
    fn deserialize_canonicalises() {
        let id: SlotId = serde_json::from_str("\"p7\"").unwrap();
        assert_eq!(id.as_str(), "P7");
        assert!(serde_json::from_str::<SlotId>("\"  \"").is_err());
    }
}
