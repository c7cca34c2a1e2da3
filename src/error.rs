use actix_web::http::StatusCode;

/// Tagged failure taxonomy for every core operation. The HTTP adapter maps
/// these onto status codes; nothing in the crate matches on message strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("start time must be before end time")]
    InvalidRange,
    #[error("start time is in the past")]
    PastTime,
    #[error("reschedule shifts the start time too far for booked candidates")]
    ExcessiveShift,
    #[error("schedule conflict with an existing slot")]
    ScheduleConflict,
    #[error("slot is full")]
    SlotFull,
    #[error("already booked this slot")]
    AlreadyBooked,
    #[error("already on the waitlist for this slot")]
    AlreadyWaitlisted,
    #[error("not found or unauthorized")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("transient storage failure: {0}")]
    Transient(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl CoreError {
    /// Business-rule rejections that may succeed once the underlying
    /// condition changes.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CoreError::ExcessiveShift
                | CoreError::ScheduleConflict
                | CoreError::SlotFull
                | CoreError::AlreadyBooked
                | CoreError::AlreadyWaitlisted
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CoreError::InvalidRange | CoreError::PastTime | CoreError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            _ if self.is_conflict() => StatusCode::CONFLICT,
            CoreError::NotFound => StatusCode::NOT_FOUND,
            CoreError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<diesel::result::Error> for CoreError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match err {
            Error::NotFound => CoreError::NotFound,
            Error::DatabaseError(DatabaseErrorKind::SerializationFailure, info) => {
                CoreError::Transient(info.message().to_owned())
            }
            Error::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
                CoreError::Transient(info.message().to_owned())
            }
            other => CoreError::Storage(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for CoreError {
    fn from(err: r2d2::Error) -> Self {
        CoreError::Transient(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_map_to_409() {
        for err in [
            CoreError::SlotFull,
            CoreError::AlreadyBooked,
            CoreError::ScheduleConflict,
            CoreError::AlreadyWaitlisted,
            CoreError::ExcessiveShift,
        ] {
            assert!(err.is_conflict());
            assert_eq!(err.status(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn validation_and_lookup_statuses() {
        assert_eq!(CoreError::InvalidRange.status(), StatusCode::BAD_REQUEST);
        assert_eq!(CoreError::PastTime.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            CoreError::Validation("capacity must be positive".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(CoreError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            CoreError::Transient("timeout".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            CoreError::Storage("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_message_stays_generic() {
        assert_eq!(CoreError::NotFound.to_string(), "not found or unauthorized");
    }
}
