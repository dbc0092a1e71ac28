//! Admin console DTOs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::application::services::{AdminOverview, DeleteSummary, OwnerSummary};
use crate::domain::{BookingStatus, DomainError, DomainResult};

use super::super::auth::ProfileDto;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminOverviewDto {
    pub total_users: u64,
    pub total_owners: u64,
    pub pending_owners: u64,
    pub total_locations: u64,
    pub total_bookings: u64,
}

impl From<AdminOverview> for AdminOverviewDto {
    fn from(o: AdminOverview) -> Self {
        Self {
            total_users: o.total_users,
            total_owners: o.total_owners,
            pending_owners: o.pending_owners,
            total_locations: o.total_locations,
            total_bookings: o.total_bookings,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OwnerSummaryDto {
    pub profile: ProfileDto,
    /// From the owner business profile, when one exists
    pub company_name: Option<String>,
    pub city: Option<String>,
    pub properties: usize,
    pub bookings: usize,
}

impl From<OwnerSummary> for OwnerSummaryDto {
    fn from(s: OwnerSummary) -> Self {
        let (company_name, city) = match s.business {
            Some(b) => (Some(b.company_name), Some(b.city)),
            None => (None, None),
        };
        Self {
            profile: s.profile.into(),
            company_name,
            city,
            properties: s.properties,
            bookings: s.bookings,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteSummaryDto {
    pub locations: usize,
    pub bookings: u64,
}

impl From<DeleteSummary> for DeleteSummaryDto {
    fn from(d: DeleteSummary) -> Self {
        Self {
            locations: d.locations,
            bookings: d.bookings,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingFilterParams {
    /// `scheduled`, `started`, `completed`, `cancelled`, or `all`
    pub status: Option<String>,
}

impl BookingFilterParams {
    pub fn status(&self) -> DomainResult<Option<BookingStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(s) => BookingStatus::parse(s)
                .map(Some)
                .ok_or_else(|| DomainError::Validation(format!("Unknown booking status '{s}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_accepts_any_case_and_all() {
        let p = |s: &str| BookingFilterParams {
            status: Some(s.to_string()),
        };
        assert_eq!(p("all").status().unwrap(), None);
        assert_eq!(BookingFilterParams::default().status().unwrap(), None);
        assert_eq!(p("Started").status().unwrap(), Some(BookingStatus::Started));
        assert_eq!(p("cancelled").status().unwrap(), Some(BookingStatus::Cancelled));
        assert!(p("parked").status().is_err());
    }
}
