//! Sample location catalogue
//!
//! Twelve demonstration locations that ship with the service. They are
//! served read-only when absent from the store, and can be written into
//! the store at startup (`demo.seed_database`).

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::domain::{DomainError, DomainResult, Location, LocationKind, RepositoryProvider};

struct SeedLocation {
    id: u128,
    name: &'static str,
    address: &'static str,
    city: &'static str,
    kind: LocationKind,
    price_per_hour: i64,
    total_slots: u32,
}

const SEED_LOCATIONS: [SeedLocation; 12] = [
    SeedLocation {
        id: 0xe4d7a8b3_1c3a_4e5f_9a1b_2c3d4e5f6a7b,
        name: "MG Road Parking Hub",
        address: "MG Road, Fort",
        city: "Mumbai",
        kind: LocationKind::Parking,
        price_per_hour: 40,
        total_slots: 12,
    },
    SeedLocation {
        id: 0xf5e8b9c4_2d4b_5f6a_0b2c_3d4e5f6a7b8c,
        name: "Andheri Metro Parking",
        address: "Andheri East Station",
        city: "Mumbai",
        kind: LocationKind::Parking,
        price_per_hour: 30,
        total_slots: 8,
    },
    SeedLocation {
        id: 0xa6f9c0d5_3e5c_6a7b_1c3d_4e5f6a7b8c9d,
        name: "Bandra Station Parking",
        address: "Bandra West",
        city: "Mumbai",
        kind: LocationKind::Parking,
        price_per_hour: 50,
        total_slots: 10,
    },
    SeedLocation {
        id: 0xb7a0d1e6_4f6d_7b8c_2d4e_5f6a7b8c9d0e,
        name: "Powai Lake Parking",
        address: "Powai Promenade",
        city: "Mumbai",
        kind: LocationKind::Parking,
        price_per_hour: 35,
        total_slots: 15,
    },
    SeedLocation {
        id: 0xc8b1e2f7_5a7e_8c9d_3e5f_6a7b8c9d0e1f,
        name: "Lower Parel Mall Parking",
        address: "Phoenix Mills",
        city: "Mumbai",
        kind: LocationKind::Parking,
        price_per_hour: 60,
        total_slots: 20,
    },
    SeedLocation {
        id: 0xd9c2f3a8_6b8f_9d0e_4f6a_7b8c9d0e1f2a,
        name: "Dadar Plaza Parking",
        address: "Dadar TT Circle",
        city: "Mumbai",
        kind: LocationKind::Parking,
        price_per_hour: 25,
        total_slots: 6,
    },
    SeedLocation {
        id: 0xe0d3a4b9_7c9f_0e1f_5a7b_8c9d0e1f2a3b,
        name: "Andheri EV Station",
        address: "Andheri West link road",
        city: "Mumbai",
        kind: LocationKind::Ev,
        price_per_hour: 70,
        total_slots: 6,
    },
    SeedLocation {
        id: 0xf1e4b5c0_8d0a_1f2e_6b8c_9d0e1f2a3b4c,
        name: "Powai Tech Park Charging",
        address: "Hiranandani Gardens",
        city: "Mumbai",
        kind: LocationKind::Ev,
        price_per_hour: 80,
        total_slots: 8,
    },
    SeedLocation {
        id: 0xa2f5c6d1_9e1b_2c3d_7c9d_0e1f2a3b4c5d,
        name: "BKC Fast Charge Zone",
        address: "G Block BKC",
        city: "Mumbai",
        kind: LocationKind::Ev,
        price_per_hour: 90,
        total_slots: 10,
    },
    SeedLocation {
        id: 0xb3c6d7e2_0f2a_3b4c_8d0e_1f2a3b4c5d6e,
        name: "Navi Mumbai EV Hub",
        address: "Vashi Sector 17",
        city: "Navi Mumbai",
        kind: LocationKind::Ev,
        price_per_hour: 65,
        total_slots: 12,
    },
    SeedLocation {
        id: 0xc4d7e8f3_1a3b_4c5d_9e1f_2a3b4c5d6e7f,
        name: "Thane EV Station",
        address: "Viviana Mall",
        city: "Thane",
        kind: LocationKind::Ev,
        price_per_hour: 60,
        total_slots: 5,
    },
    SeedLocation {
        id: 0xd5e8f9a4_2b4c_5d6e_0f2a_3a4b5c6d7e8f,
        name: "Worli SeaLink EV Point",
        address: "Worli Seaface",
        city: "Mumbai",
        kind: LocationKind::Ev,
        price_per_hour: 85,
        total_slots: 7,
    },
];

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).single().unwrap_or_else(Utc::now)
}

impl SeedLocation {
    fn to_location(&self) -> Location {
        Location {
            id: Uuid::from_u128(self.id),
            owner_id: None,
            name: self.name.to_string(),
            address: self.address.to_string(),
            city: self.city.to_string(),
            kind: self.kind,
            price_per_hour: Decimal::from(self.price_per_hour),
            total_slots: self.total_slots,
            available_slots: self.total_slots,
            description: None,
            image_url: None,
            created_at: epoch(),
            updated_at: epoch(),
        }
    }
}

/// The whole catalogue, fully available
pub fn seed_locations() -> Vec<Location> {
    SEED_LOCATIONS.iter().map(SeedLocation::to_location).collect()
}

pub fn find_seed_location(id: Uuid) -> Option<Location> {
    SEED_LOCATIONS
        .iter()
        .find(|s| Uuid::from_u128(s.id) == id)
        .map(SeedLocation::to_location)
}

pub fn is_seed_location(id: Uuid) -> bool {
    SEED_LOCATIONS.iter().any(|s| Uuid::from_u128(s.id) == id)
}

/// Write missing catalogue rows into the store. Returns how many were added.
pub async fn seed_database(repos: &dyn RepositoryProvider) -> DomainResult<usize> {
    let mut added = 0;
    for location in seed_locations() {
        if repos.locations().find_by_id(location.id).await?.is_some() {
            continue;
        }
        match repos.locations().insert(location).await {
            Ok(()) => added += 1,
            Err(DomainError::Conflict(_)) => {}
            Err(e) => return Err(e),
        }
    }
    if added > 0 {
        info!(added, "Seeded sample locations");
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    #[test]
    fn catalogue_has_six_of_each_kind() {
        let all = seed_locations();
        assert_eq!(all.len(), 12);
        assert_eq!(all.iter().filter(|l| l.kind == LocationKind::Ev).count(), 6);
        assert!(all.iter().all(|l| l.available_slots == l.total_slots));
    }

    #[test]
    fn lookup_by_published_id() {
        let id = Uuid::parse_str("e0d3a4b9-7c9f-0e1f-5a7b-8c9d0e1f2a3b").unwrap();
        let loc = find_seed_location(id).unwrap();
        assert_eq!(loc.name, "Andheri EV Station");
        assert_eq!(loc.ev_chargers(), 6);
        assert!(is_seed_location(id));
        assert!(!is_seed_location(Uuid::new_v4()));
    }

    #[tokio::test]
    async fn seeding_is_repeatable() {
        let repos = InMemoryRepositoryProvider::new();
        assert_eq!(seed_database(&repos).await.unwrap(), 12);
        assert_eq!(seed_database(&repos).await.unwrap(), 0);
        assert_eq!(repos.locations().count().await.unwrap(), 12);
    }
}
