use std::error::Error;

use utility::geo::InvalidCoordinate;

pub mod client;
pub mod database;
pub mod geolocate;
pub mod lifecycle;
pub mod proximity;
pub mod reminder;
pub mod slots;

/// Errors surfaced by the coordination core. Every operation returns these
/// explicitly; nothing is reported through a side channel.
#[derive(Debug)]
pub enum RequestError {
    /// A referenced donor, blood bank or schedule does not exist.
    NotFound,
    /// A lifecycle operation was attempted from a disallowed state, or a
    /// create/edit targeted an already occupied slot.
    PreconditionFailed(String),
    InvalidCoordinate(InvalidCoordinate),
    /// The backing store or another remote collaborator failed.
    Upstream(Box<dyn Error + Send + Sync>),
}

impl RequestError {
    pub fn precondition<S: Into<String>>(reason: S) -> Self {
        Self::PreconditionFailed(reason.into())
    }

    pub fn upstream<E: Error + Send + Sync + 'static>(why: E) -> Self {
        Self::Upstream(Box::new(why))
    }
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::NotFound => write!(f, "the requested item does not exist"),
            RequestError::PreconditionFailed(reason) => {
                write!(f, "precondition failed: {}", reason)
            }
            RequestError::InvalidCoordinate(why) => write!(f, "{}", why),
            RequestError::Upstream(why) => {
                write!(f, "upstream service failed: {}", why)
            }
        }
    }
}

impl Error for RequestError {}

impl From<InvalidCoordinate> for RequestError {
    fn from(value: InvalidCoordinate) -> Self {
        Self::InvalidCoordinate(value)
    }
}

impl From<database::DatabaseError> for RequestError {
    fn from(value: database::DatabaseError) -> Self {
        match value {
            database::DatabaseError::NotFound => Self::NotFound,
            database::DatabaseError::SlotConflict => Self::PreconditionFailed(
                "the requested time slot is already booked".to_owned(),
            ),
            database::DatabaseError::Other(why) => Self::Upstream(why),
        }
    }
}

pub type RequestResult<O> = Result<O, RequestError>;

pub fn not_found_to_none<O>(result: RequestResult<O>) -> RequestResult<Option<O>> {
    if let Err(RequestError::NotFound) = result {
        Ok(None)
    } else {
        result.map(Some)
    }
}
