//! Guest reservation session
//!
//! Flow: restaurant resolved from the URL slug → party size → contact
//! details → submit → status page. The reservation id survives restarts
//! through the [`LocalStore`].

use super::store::{LocalStore, RESERVATION_KEY};
use crate::queue::position::{QueueEstimate, WaitEstimator, estimate_for};
use crate::utils::time::{day_bounds, local_date};
use crate::utils::validation::{
    MAX_NAME_LEN, validate_email, validate_phone, validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};
use chrono_tz::Tz;
use desk_client::{QueueFilter, RemoteGateway};
use serde::{Deserialize, Serialize};
use shared::models::{
    MAX_PARTY_SIZE, MIN_PARTY_SIZE, QueueEntry, QueueEntryCreate, QueueEntryUpdate, QueueStatus,
    Restaurant,
};
use shared::util::normalize_slug;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Party size preselected on the first step
pub const DEFAULT_PARTY_SIZE: i32 = 2;

/// Guest-facing pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum GuestRoute {
    VendorSelection,
    PartySize { slug: String },
    Details { slug: String },
    Result { slug: String },
}

impl GuestRoute {
    pub fn path(&self) -> String {
        match self {
            GuestRoute::VendorSelection => "/vendor".to_string(),
            GuestRoute::PartySize { slug } => format!("/rest/{}", slug),
            GuestRoute::Details { slug } => format!("/rest/{}/step1", slug),
            GuestRoute::Result { slug } => format!("/rest/{}/result", slug),
        }
    }

    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path
            .trim()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        match segments.as_slice() {
            ["vendor"] => Some(GuestRoute::VendorSelection),
            ["rest", slug] => Some(GuestRoute::PartySize {
                slug: normalize_slug(slug),
            }),
            ["rest", slug, "step1"] => Some(GuestRoute::Details {
                slug: normalize_slug(slug),
            }),
            ["rest", slug, "result"] => Some(GuestRoute::Result {
                slug: normalize_slug(slug),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for GuestRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Contact details entered on the second step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestDetails {
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl GuestDetails {
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: email.into(),
        }
    }

    /// Per-field validation; every failing field is reported
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if let Err(e) = validate_required_text(&self.name, "name", MAX_NAME_LEN) {
            errors.insert("name", e.message);
        }
        if let Err(e) = validate_phone(&self.phone) {
            errors.insert("phone", e.message);
        }
        if let Err(e) = validate_email(&self.email) {
            errors.insert("email", e.message);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Field name → message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        errors.0.into_iter().fold(
            AppError::validation("Please correct the highlighted fields"),
            |err, (field, message)| err.with_detail(field, message),
        )
    }
}

/// Reservation plus its place in line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservationStatus {
    pub entry: QueueEntry,
    /// Only while waiting
    pub estimate: Option<QueueEstimate>,
}

/// Reservation remembered across restarts, bound to the restaurant that took it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredReservation {
    restaurant_slug: String,
    entry_id: i64,
}

/// One guest's reservation flow at one restaurant
pub struct GuestSession {
    gateway: Arc<dyn RemoteGateway>,
    store: LocalStore,
    restaurant: Restaurant,
    tz: Tz,
    estimator: Arc<dyn WaitEstimator>,
    guest_count: i32,
    details: GuestDetails,
    reservation_id: Option<i64>,
}

impl fmt::Debug for GuestSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuestSession")
            .field("restaurant", &self.restaurant.slug)
            .field("guest_count", &self.guest_count)
            .field("reservation_id", &self.reservation_id)
            .finish()
    }
}

impl GuestSession {
    /// Resolve the restaurant from a URL slug and restore any saved reservation
    pub async fn start(
        gateway: Arc<dyn RemoteGateway>,
        store: LocalStore,
        slug: &str,
        tz: Tz,
        estimator: Arc<dyn WaitEstimator>,
    ) -> AppResult<Self> {
        let slug = normalize_slug(slug);
        if slug.is_empty() {
            return Err(AppError::new(ErrorCode::TenantNotSelected)
                .with_detail("route", GuestRoute::VendorSelection.path()));
        }
        let restaurant = gateway.get_restaurant(&slug).await?.ok_or_else(|| {
            tracing::warn!(slug = %slug, "Unknown restaurant slug");
            AppError::new(ErrorCode::TenantNotFound)
                .with_detail("slug", slug.clone())
                .with_detail("route", GuestRoute::VendorSelection.path())
        })?;
        // another restaurant's reservation stays stored but is not ours to show
        let reservation_id = store
            .get::<StoredReservation>(RESERVATION_KEY)?
            .filter(|stored| stored.restaurant_slug == restaurant.slug)
            .map(|stored| stored.entry_id);
        tracing::debug!(restaurant = %restaurant.slug, ?reservation_id, "Guest session started");

        Ok(Self {
            gateway,
            store,
            restaurant,
            tz,
            estimator,
            guest_count: DEFAULT_PARTY_SIZE,
            details: GuestDetails::default(),
            reservation_id,
        })
    }

    pub fn restaurant(&self) -> &Restaurant {
        &self.restaurant
    }

    pub fn reservation_id(&self) -> Option<i64> {
        self.reservation_id
    }

    /// Where the guest should be
    pub fn route(&self) -> GuestRoute {
        let slug = self.restaurant.slug.clone();
        if self.reservation_id.is_some() {
            GuestRoute::Result { slug }
        } else {
            GuestRoute::PartySize { slug }
        }
    }

    // ========== Party size ==========

    pub fn guest_count(&self) -> i32 {
        self.guest_count
    }

    pub fn increment(&mut self) -> i32 {
        self.guest_count = (self.guest_count + 1).min(MAX_PARTY_SIZE);
        self.guest_count
    }

    pub fn decrement(&mut self) -> i32 {
        self.guest_count = (self.guest_count - 1).max(MIN_PARTY_SIZE);
        self.guest_count
    }

    pub fn set_guest_count(&mut self, count: i32) -> AppResult<()> {
        if !(MIN_PARTY_SIZE..=MAX_PARTY_SIZE).contains(&count) {
            return Err(AppError::new(ErrorCode::InvalidPartySize).with_detail("guests_count", count));
        }
        self.guest_count = count;
        Ok(())
    }

    // ========== Details ==========

    pub fn details(&self) -> &GuestDetails {
        &self.details
    }

    pub fn set_details(&mut self, details: GuestDetails) {
        self.details = details;
    }

    // ========== Reservation ==========

    /// Join the queue; refuses a second active reservation
    pub async fn submit(&mut self) -> AppResult<QueueEntry> {
        if let Some(id) = self.reservation_id {
            match self.gateway.get_queue_entry(id).await? {
                Some(existing) if existing.status.is_active() => {
                    return Err(AppError::new(ErrorCode::ReservationExists)
                        .with_detail("entry_id", id)
                        .with_detail("route", self.route().path()));
                }
                _ => {
                    tracing::debug!(entry_id = id, "Dropping finished reservation before new submit");
                    self.forget_reservation()?;
                }
            }
        }

        self.details.validate()?;
        let create = QueueEntryCreate::waiting(
            self.restaurant.slug.clone(),
            self.guest_count,
            self.details.name.trim(),
            self.details.phone.trim(),
            self.details.email.trim(),
        );
        create.validate()?;

        let entry = self.gateway.insert_queue_entry(&create).await?;
        self.store.put(
            RESERVATION_KEY,
            &StoredReservation {
                restaurant_slug: entry.restaurant_slug.clone(),
                entry_id: entry.id,
            },
        )?;
        self.reservation_id = Some(entry.id);
        tracing::info!(
            entry_id = entry.id,
            restaurant = %entry.restaurant_slug,
            guests = entry.guests_count,
            "Guest joined the queue"
        );
        Ok(entry)
    }

    /// Current state of the saved reservation
    pub async fn status(&self) -> AppResult<ReservationStatus> {
        let entry = self.current_entry().await?;
        let estimate = if entry.is_waiting() {
            let day = local_date(entry.created_at, self.tz);
            let (from, before) = day_bounds(day, self.tz);
            let filter = QueueFilter::new()
                .restaurant(entry.restaurant_slug.clone())
                .statuses([QueueStatus::Waiting])
                .created_between(from, before);
            let waiting = self.gateway.list_queue_entries(&filter).await?;
            estimate_for(&waiting, &entry, self.tz, self.estimator.as_ref())
        } else {
            None
        };
        Ok(ReservationStatus { entry, estimate })
    }

    /// Leave the queue while still waiting
    pub async fn cancel(&mut self) -> AppResult<QueueEntry> {
        let entry = self.current_entry().await?;
        if !entry.is_waiting() {
            return Err(AppError::new(ErrorCode::QueueEntryNotWaiting)
                .with_detail("entry_id", entry.id)
                .with_detail("status", entry.status.as_str()));
        }
        let cancelled = self
            .gateway
            .update_queue_entry(entry.id, &QueueEntryUpdate::status(QueueStatus::Cancelled))
            .await?;
        tracing::info!(entry_id = entry.id, "Guest left the queue");
        self.acknowledge()?;
        Ok(cancelled)
    }

    /// Clear the reservation and reset the form
    pub fn acknowledge(&mut self) -> AppResult<()> {
        self.forget_reservation()?;
        self.details = GuestDetails::default();
        self.guest_count = DEFAULT_PARTY_SIZE;
        Ok(())
    }

    async fn current_entry(&self) -> AppResult<QueueEntry> {
        let id = self
            .reservation_id
            .ok_or_else(|| AppError::new(ErrorCode::ReservationNotFound))?;
        self.gateway
            .get_queue_entry(id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::ReservationNotFound).with_detail("entry_id", id))
    }

    fn forget_reservation(&mut self) -> AppResult<()> {
        self.store.remove(RESERVATION_KEY)?;
        self.reservation_id = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::position::LinearEstimator;
    use chrono::Utc;
    use desk_client::InMemoryGateway;

    const SLUG: &str = "spice-house";

    fn gateway() -> InMemoryGateway {
        let gateway = InMemoryGateway::new();
        gateway.seed_restaurant(Restaurant {
            id: 1,
            name: "Spice House".into(),
            slug: SLUG.into(),
        });
        gateway
    }

    async fn session(gateway: &InMemoryGateway, store: &LocalStore) -> GuestSession {
        GuestSession::start(
            Arc::new(gateway.clone()),
            store.clone(),
            "/Spice-House",
            chrono_tz::UTC,
            Arc::new(LinearEstimator::default()),
        )
        .await
        .unwrap()
    }

    fn valid_details() -> GuestDetails {
        GuestDetails::new("Asha", "+65 9123 4567", "asha@example.com")
    }

    #[test]
    fn test_route_paths() {
        let slug = "spice-house".to_string();
        for route in [
            GuestRoute::VendorSelection,
            GuestRoute::PartySize { slug: slug.clone() },
            GuestRoute::Details { slug: slug.clone() },
            GuestRoute::Result { slug },
        ] {
            assert_eq!(GuestRoute::parse(&route.path()), Some(route));
        }
        assert_eq!(GuestRoute::parse("/rest/x/unknown"), None);
    }

    #[test]
    fn test_details_validation_reports_every_field() {
        let errors = GuestDetails::new("", "12", "nope").validate().unwrap_err();
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["email", "name", "phone"]);

        let app: AppError = errors.into();
        assert_eq!(app.code, ErrorCode::ValidationFailed);
        assert!(app.detail("phone").is_some());

        assert!(valid_details().validate().is_ok());
    }

    #[tokio::test]
    async fn test_unknown_restaurant_routes_to_vendor() {
        let err = GuestSession::start(
            Arc::new(gateway()),
            LocalStore::open_in_memory().unwrap(),
            "noodle-bar",
            chrono_tz::UTC,
            Arc::new(LinearEstimator::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::TenantNotFound);
        assert_eq!(err.detail("route"), Some(&serde_json::Value::from("/vendor")));
    }

    #[tokio::test]
    async fn test_party_size_clamped() {
        let gateway = gateway();
        let store = LocalStore::open_in_memory().unwrap();
        let mut session = session(&gateway, &store).await;
        assert_eq!(session.guest_count(), 2);
        session.decrement();
        assert_eq!(session.decrement(), 1);
        session.set_guest_count(16).unwrap();
        assert_eq!(session.increment(), 16);
        assert!(session.set_guest_count(17).is_err());
        assert!(session.set_guest_count(0).is_err());
    }

    #[tokio::test]
    async fn test_invalid_details_block_submit() {
        let gateway = gateway();
        let store = LocalStore::open_in_memory().unwrap();
        let mut session = session(&gateway, &store).await;
        session.set_details(GuestDetails::new("Asha", "abc", "asha@example.com"));

        let err = session.submit().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(gateway.write_calls(), 0);
        assert_eq!(session.reservation_id(), None);
    }

    #[tokio::test]
    async fn test_submit_status_and_single_reservation() {
        let gateway = gateway();
        let store = LocalStore::open_in_memory().unwrap();
        let mut session = session(&gateway, &store).await;
        session.set_guest_count(4).unwrap();
        session.set_details(valid_details());

        let entry = session.submit().await.unwrap();
        assert_eq!(entry.status, QueueStatus::Waiting);
        assert_eq!(entry.guests_count, 4);
        assert_eq!(entry.restaurant_slug, SLUG);
        assert_eq!(
            store.get::<StoredReservation>(RESERVATION_KEY).unwrap(),
            Some(StoredReservation {
                restaurant_slug: SLUG.into(),
                entry_id: entry.id,
            })
        );
        assert_eq!(
            session.route(),
            GuestRoute::Result {
                slug: SLUG.to_string()
            }
        );

        let status = session.status().await.unwrap();
        let estimate = status.estimate.unwrap();
        assert_eq!(estimate.position, 1);
        assert_eq!(estimate.wait_minutes(), 10);

        let err = session.submit().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ReservationExists);
    }

    #[tokio::test]
    async fn test_reservation_restored_from_store() {
        let gateway = gateway();
        let store = LocalStore::open_in_memory().unwrap();
        let id = {
            let mut first = session(&gateway, &store).await;
            first.set_details(valid_details());
            first.submit().await.unwrap().id
        };

        let restored = session(&gateway, &store).await;
        assert_eq!(restored.reservation_id(), Some(id));
        assert_eq!(restored.status().await.unwrap().entry.id, id);
    }

    #[tokio::test]
    async fn test_reservation_stays_with_its_restaurant() {
        let gateway = gateway();
        gateway.seed_restaurant(Restaurant {
            id: 2,
            name: "Noodle Bar".into(),
            slug: "noodle-bar".into(),
        });
        let store = LocalStore::open_in_memory().unwrap();
        let id = {
            let mut first = session(&gateway, &store).await;
            first.set_details(valid_details());
            first.submit().await.unwrap().id
        };

        let elsewhere = GuestSession::start(
            Arc::new(gateway.clone()),
            store.clone(),
            "noodle-bar",
            chrono_tz::UTC,
            Arc::new(LinearEstimator::default()),
        )
        .await
        .unwrap();
        assert_eq!(elsewhere.reservation_id(), None);
        assert_eq!(
            elsewhere.route(),
            GuestRoute::PartySize {
                slug: "noodle-bar".to_string()
            }
        );
        let err = elsewhere.status().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ReservationNotFound);

        let back = session(&gateway, &store).await;
        assert_eq!(back.reservation_id(), Some(id));
    }

    #[tokio::test]
    async fn test_cancel_clears_reservation() {
        let gateway = gateway();
        let store = LocalStore::open_in_memory().unwrap();
        let mut session = session(&gateway, &store).await;
        session.set_details(valid_details());
        let entry = session.submit().await.unwrap();

        let cancelled = session.cancel().await.unwrap();
        assert_eq!(cancelled.status, QueueStatus::Cancelled);
        assert_eq!(gateway.entry(entry.id).unwrap().status, QueueStatus::Cancelled);
        assert_eq!(session.reservation_id(), None);
        assert!(!store.contains(RESERVATION_KEY).unwrap());
        assert_eq!(session.details(), &GuestDetails::default());

        let err = session.status().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ReservationNotFound);
    }

    #[tokio::test]
    async fn test_finished_reservation_allows_new_submit() {
        let gateway = gateway();
        let store = LocalStore::open_in_memory().unwrap();
        let mut session = session(&gateway, &store).await;
        session.set_details(valid_details());
        let first = session.submit().await.unwrap();

        // staff declined it
        gateway
            .update_queue_entry(first.id, &QueueEntryUpdate::status(QueueStatus::Cancelled))
            .await
            .unwrap();
        let status = session.status().await.unwrap();
        assert_eq!(status.entry.status, QueueStatus::Cancelled);
        assert!(status.estimate.is_none());

        let second = session.submit().await.unwrap();
        assert_ne!(second.id, first.id);
        assert!(second.created_at <= Utc::now());
    }
}
