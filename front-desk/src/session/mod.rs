//! Guest and staff sessions, persisted in a local redb file

pub mod admin;
pub mod guest;
pub mod store;

pub use admin::{AdminSession, PasswordStrength, SignedIn, StaffRoute, password_strength};
pub use guest::{
    DEFAULT_PARTY_SIZE, FieldErrors, GuestDetails, GuestRoute, GuestSession, ReservationStatus,
};
pub use store::{LocalStore, StoreError, StoreResult};
