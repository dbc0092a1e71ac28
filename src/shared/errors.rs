use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Another active booking already holds this slot.
    #[error("Slot {slot} at location {location_id} is already booked")]
    SlotTaken { location_id: Uuid, slot: String },

    /// The booking references a user without a profile row.
    #[error("Your user profile is missing. Please sign out and sign up with a new email address.")]
    MissingProfile { user_id: Uuid },

    /// The booking references a location that is not in the durable store.
    #[error("Location {0} does not exist in the store")]
    MissingLocation(Uuid),

    /// The store does not offer the atomic create-booking procedure.
    #[error("Store procedure {0} is unavailable")]
    ProcedureUnavailable(&'static str),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            field: "id",
            value: id.to_string(),
        }
    }

    /// Whether this error is likely transient (e.g. DB connection lost)
    /// and the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Storage(_))
    }
}

/// Occupancy could not be determined. Callers must treat occupancy as
/// unknown, never as empty.
#[derive(Debug, Clone, Error)]
#[error("Could not resolve occupied slots for location {location_id}: {reason}")]
pub struct ResolutionError {
    pub location_id: Uuid,
    pub reason: String,
}

impl From<ResolutionError> for DomainError {
    fn from(e: ResolutionError) -> Self {
        DomainError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_storage_errors_are_transient() {
        assert!(DomainError::Storage("connection reset".into()).is_transient());
        assert!(!DomainError::Validation("bad".into()).is_transient());
        assert!(!DomainError::SlotTaken {
            location_id: Uuid::nil(),
            slot: "P1".into()
        }
        .is_transient());
    }

    #[test]
    fn missing_profile_message_is_user_facing() {
        let e = DomainError::MissingProfile { user_id: Uuid::nil() };
        assert!(e.to_string().starts_with("Your user profile is missing"));
    }
}
