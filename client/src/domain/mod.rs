//! Domain primitives, form validation and ports.
//!
//! Purpose: define the strongly typed records the client exchanges with the
//! SkillSwap API and the ports through which it does so. Form constructors
//! validate raw input and report field-level errors; wire types document
//! their serde contract in place.
//!
//! Public surface:
//! - `SessionState`/`SessionUser` - authentication state.
//! - `Profile`, `Listing`, `Notification` - API records.
//! - `LoginCredentials`, `Registration`, `ProfileUpdate`, `ListingDraft` -
//!   validated forms.
//! - `NotificationFeed`, `Toasts`, `ReconnectPolicy` - client-side state
//!   helpers.

mod auth;
mod listing;
mod notification;
pub mod ports;
mod profile;
mod reconnect;
mod session;
mod toast;
mod validation;

pub use self::auth::{
    LoginCredentials, NAME_MAX, PASSWORD_MIN, Registration, RegistrationForm,
};
pub use self::listing::{
    Listing, ListingDraft, ListingForm, ListingId, ListingKind, ListingQuery, SessionMode,
    SkillLevel,
};
pub use self::notification::{Notification, NotificationFeed};
pub use self::profile::{Profile, ProfileForm, ProfilePicture, ProfileUpdate};
pub use self::reconnect::ReconnectPolicy;
pub use self::session::{SessionState, SessionUser};
pub use self::toast::{DEFAULT_TOAST_TTL, Toast, ToastLevel, Toasts};
pub use self::validation::{FieldError, FieldErrors};
