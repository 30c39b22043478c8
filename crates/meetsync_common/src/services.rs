// --- File: crates/meetsync_common/src/services.rs ---
//! Service abstractions for external services.
//!
//! This module provides trait definitions for external services used by the
//! application. These traits allow for dependency injection and easier testing
//! by decoupling the application logic from specific implementations.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A wrapper error type that implements std::error::Error for Box<dyn std::error::Error + Send + Sync>
#[derive(Debug)]
pub struct BoxedError(pub Box<dyn StdError + Send + Sync>);

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for BoxedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BoxedError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        BoxedError(err)
    }
}

/// A trait for external meeting provider operations.
///
/// Implementations mirror local bookings into a provider calendar and expose
/// the current provider-side state for reconciliation. All calls are network
/// I/O bounded by the implementation's timeout.
pub trait MeetingService: Send + Sync {
    /// Error type returned by meeting service operations.
    type Error: StdError + Send + Sync + 'static;

    /// Create a provider meeting and return its handle.
    ///
    /// Failure (provider error or timeout) means the caller falls back to a
    /// local-only meeting; it is never a fatal booking error.
    fn create_meeting(
        &self,
        organizer_email: &str,
        attendee_email: &str,
        subject: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> BoxFuture<'_, MeetingHandle, Self::Error>;

    /// Cancel a provider meeting.
    ///
    /// Cancelling an already-cancelled or unknown id is a success, so the
    /// call is safe as a compensating action.
    fn cancel_meeting(
        &self,
        organizer_email: &str,
        external_id: &str,
    ) -> BoxFuture<'_, (), Self::Error>;

    /// Fetch the current provider-side state of a meeting.
    fn get_meeting(
        &self,
        organizer_email: &str,
        external_id: &str,
    ) -> BoxFuture<'_, MeetingDetail, Self::Error>;
}

/// Shared, type-erased handle to whatever meeting provider is configured.
pub type SharedMeetingService = Arc<dyn MeetingService<Error = BoxedError>>;

/// Result of creating a provider meeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingHandle {
    /// The provider's id for the created event.
    pub external_id: String,
    /// Join link for the online meeting, when the provider issued one.
    pub join_url: Option<String>,
}

/// Current provider-side state of a meeting, used for reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingDetail {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub join_url: Option<String>,
    pub cancelled: bool,
}

/// Adapter erasing a concrete service's error type to [`BoxedError`] so the
/// service can be stored as a [`SharedMeetingService`].
pub struct ErasedMeetingService<S>(pub S);

impl<S: MeetingService> MeetingService for ErasedMeetingService<S> {
    type Error = BoxedError;

    fn create_meeting(
        &self,
        organizer_email: &str,
        attendee_email: &str,
        subject: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> BoxFuture<'_, MeetingHandle, Self::Error> {
        let organizer_email = organizer_email.to_string();
        let attendee_email = attendee_email.to_string();
        let subject = subject.to_string();
        let inner = &self.0;

        Box::pin(async move {
            inner
                .create_meeting(&organizer_email, &attendee_email, &subject, start, end)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }

    fn cancel_meeting(
        &self,
        organizer_email: &str,
        external_id: &str,
    ) -> BoxFuture<'_, (), Self::Error> {
        let organizer_email = organizer_email.to_string();
        let external_id = external_id.to_string();
        let inner = &self.0;

        Box::pin(async move {
            inner
                .cancel_meeting(&organizer_email, &external_id)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }

    fn get_meeting(
        &self,
        organizer_email: &str,
        external_id: &str,
    ) -> BoxFuture<'_, MeetingDetail, Self::Error> {
        let organizer_email = organizer_email.to_string();
        let external_id = external_id.to_string();
        let inner = &self.0;

        Box::pin(async move {
            inner
                .get_meeting(&organizer_email, &external_id)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }
}

/// A clock abstraction so time-dependent logic can be tested with doubles.
///
/// All times are local wall-clock; the system performs no timezone
/// conversion.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The process-local wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// A clock frozen at a fixed instant. Test double.
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
