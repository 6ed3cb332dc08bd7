//! # Tracking Service
//!
//! Typed domain operations over a [`DocumentStore`].
//!
//! ## Design Principles
//!
//! 1. **Explicit Ownership**: The service owns an `Arc<dyn DocumentStore>`
//!    handed to it at construction; there is no global client.
//! 2. **Reads Degrade**: Read-only queries log store failures and return empty
//!    or neutral values. Writes return `StoreResult` so the handler can build
//!    a failure envelope.
//! 3. **Keys Are Ids**: A record's store key is authoritative and overwrites
//!    whatever `id` the stored document carries.
//!
//! ## Notes
//! - `register_user` and every read-modify-write of predefined trips or trip
//!   plans run under an in-process lock. This only serializes sessions of
//!   this process; the store gives no multi-record transactions, so another
//!   server instance can still interleave.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use trk_common::{
    Feedback, Location, Notification, PredefinedTrip, Statistics, Trip, TripPlan, User,
};
use trk_store::{
    DocumentStore, FEEDBACKS, NOTIFICATIONS, PREDEFINED_TRIPS, StoreResult, TRIP_PLANS, USERS,
};

/// Maximum number of notifications or feedbacks returned by list queries.
pub const RECENT_LIMIT: usize = 50;

/// Users updated within this window count as active.
const ACTIVE_WINDOW_HOURS: i64 = 1;

/// Outcome of a registration attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Registered {
    Created(User),
    NameTaken,
}

/// Outcome of selecting the active trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Activated,
    UnknownTrip,
}

/// Domain facade shared by every session.
pub struct TrackingService {
    store: Arc<dyn DocumentStore>,
    registration: Mutex<()>,
    trips: Mutex<()>,
}

impl TrackingService {
    /// Creates a service over `store`.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        TrackingService {
            store,
            registration: Mutex::new(()),
            trips: Mutex::new(()),
        }
    }

    // ---- users ----

    /// Returns every user, or an empty list if the store fails.
    pub async fn users(&self) -> Vec<User> {
        or_empty(USERS, self.load_users().await)
    }

    /// Creates `candidate` unless a user with the same name exists.
    pub async fn register_user(&self, candidate: User) -> StoreResult<Registered> {
        let _guard = self.registration.lock().await;

        let existing = self.load_users().await?;
        if existing.iter().any(|user| user.name == candidate.name) {
            return Ok(Registered::NameTaken);
        }

        self.store
            .put(USERS, &candidate.id, to_record(&candidate)?)
            .await?;
        Ok(Registered::Created(candidate))
    }

    /// Merges `location` into the user's record.
    ///
    /// Returns `Ok(false)` if the user does not exist.
    pub async fn update_user_location(&self, user_id: &str, location: Location) -> StoreResult<bool> {
        let Some(record) = self.store.get(USERS, user_id).await? else {
            return Ok(false);
        };
        let mut user: User = serde_json::from_value(record)?;
        user.id = user_id.to_string();
        user.current_location = location;
        user.last_updated = Utc::now();

        self.store.put(USERS, user_id, to_record(&user)?).await?;
        Ok(true)
    }

    async fn load_users(&self) -> StoreResult<Vec<User>> {
        let users = self
            .load::<User>(USERS)
            .await?
            .into_iter()
            .map(|(id, mut user)| {
                user.id = id;
                user
            })
            .collect();
        Ok(users)
    }

    // ---- trips ----

    /// Returns every predefined trip, or an empty list if the store fails.
    pub async fn predefined_trips(&self) -> Vec<PredefinedTrip> {
        or_empty(PREDEFINED_TRIPS, self.load_trips().await)
    }

    /// Returns the active trip with its plan applied, or an inactive
    /// placeholder when no trip is active or the store fails.
    pub async fn active_trip(&self) -> Trip {
        let trips = self.predefined_trips().await;
        let Some(active) = trips.iter().find(|trip| trip.is_active) else {
            return Trip::default();
        };
        let plan = self.trip_plan(&active.id).await;
        Trip::from_parts(active, plan.as_ref())
    }

    /// Clears the active flag on every other trip, then sets it on `trip_id`.
    ///
    /// Nothing is written when `trip_id` does not exist.
    pub async fn set_active_trip(&self, trip_id: &str) -> StoreResult<Activation> {
        let _guard = self.trips.lock().await;

        let trips = self.load_trips().await?;
        let Some(selected) = trips.iter().find(|trip| trip.id == trip_id).cloned() else {
            return Ok(Activation::UnknownTrip);
        };

        for mut trip in trips.into_iter().filter(|t| t.is_active && t.id != trip_id) {
            trip.is_active = false;
            debug!(trip_id = %trip.id, "deactivating trip");
            self.store
                .put(PREDEFINED_TRIPS, &trip.id, to_record(&trip)?)
                .await?;
        }

        let selected = PredefinedTrip {
            is_active: true,
            ..selected
        };
        self.store
            .put(PREDEFINED_TRIPS, &selected.id, to_record(&selected)?)
            .await?;
        Ok(Activation::Activated)
    }

    /// Upserts a predefined trip.
    ///
    /// An existing record matches when `trip.id` names it, otherwise when its
    /// name equals `trip.name`. A match keeps its id and active flag; a new
    /// record is always inactive. Only [`TrackingService::set_active_trip`]
    /// raises the flag.
    pub async fn save_predefined_trip(&self, mut trip: PredefinedTrip) -> StoreResult<PredefinedTrip> {
        let _guard = self.trips.lock().await;

        let trips = self.load_trips().await?;
        let existing = trips
            .iter()
            .find(|stored| !trip.id.is_empty() && stored.id == trip.id)
            .or_else(|| trips.iter().find(|stored| stored.name == trip.name));

        match existing {
            Some(stored) => {
                trip.id = stored.id.clone();
                trip.is_active = stored.is_active;
            }
            None => {
                if trip.id.is_empty() {
                    trip.id = uuid::Uuid::new_v4().to_string();
                }
                trip.is_active = false;
            }
        }
        trip.created_at = Utc::now();

        self.store
            .put(PREDEFINED_TRIPS, &trip.id, to_record(&trip)?)
            .await?;
        Ok(trip)
    }

    async fn load_trips(&self) -> StoreResult<Vec<PredefinedTrip>> {
        let trips = self
            .load::<PredefinedTrip>(PREDEFINED_TRIPS)
            .await?
            .into_iter()
            .map(|(id, mut trip)| {
                trip.id = id;
                trip
            })
            .collect();
        Ok(trips)
    }

    // ---- trip plans ----

    /// Returns the plan for `trip_id`, if one exists and the store answers.
    pub async fn trip_plan(&self, trip_id: &str) -> Option<TripPlan> {
        or_empty(TRIP_PLANS, self.load::<TripPlan>(TRIP_PLANS).await)
            .into_iter()
            .map(|(id, mut plan)| {
                plan.id = id;
                plan
            })
            .find(|plan| plan.trip_id == trip_id)
    }

    /// Upserts `plan` by its `trip_id` and stamps `last_updated`.
    pub async fn save_trip_plan(&self, mut plan: TripPlan) -> StoreResult<TripPlan> {
        let _guard = self.trips.lock().await;
        plan.last_updated = Utc::now();

        let existing = self
            .load::<TripPlan>(TRIP_PLANS)
            .await?
            .into_iter()
            .find(|(_, stored)| stored.trip_id == plan.trip_id);

        match existing {
            Some((id, _)) => {
                plan.id = id;
                self.store.put(TRIP_PLANS, &plan.id, to_record(&plan)?).await?;
            }
            None => {
                // the key is the id; the stored document carries none
                plan.id.clear();
                plan.id = self.store.append(TRIP_PLANS, to_record(&plan)?).await?;
            }
        }
        Ok(plan)
    }

    // ---- notifications & feedback ----

    /// Returns the most recent notifications, newest first.
    pub async fn notifications(&self) -> Vec<Notification> {
        let mut recent: Vec<Notification> = latest(or_empty(
            NOTIFICATIONS,
            self.load::<Notification>(NOTIFICATIONS).await,
        ))
        .map(|(_, notification)| notification)
        .collect();
        recent.sort_by(|a, b| b.time.cmp(&a.time));
        recent
    }

    /// Stores `notification` under a generated key.
    pub async fn add_notification(&self, notification: &Notification) -> StoreResult<String> {
        self.store
            .append(NOTIFICATIONS, to_record(notification)?)
            .await
    }

    /// Returns the most recent feedbacks, newest first.
    pub async fn feedbacks(&self) -> Vec<Feedback> {
        let mut recent: Vec<Feedback> =
            latest(or_empty(FEEDBACKS, self.load::<Feedback>(FEEDBACKS).await))
                .map(|(id, mut feedback)| {
                    feedback.id = id;
                    feedback
                })
                .collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent
    }

    /// Stores `feedback` under its id.
    pub async fn add_feedback(&self, feedback: &Feedback) -> StoreResult<()> {
        self.store
            .put(FEEDBACKS, &feedback.id, to_record(feedback)?)
            .await
    }

    // ---- statistics ----

    /// Aggregates counters across collections. Never fails.
    pub async fn statistics(&self) -> Statistics {
        let users = self.users().await;
        let notifications = self.notifications().await;
        let feedbacks = self.feedbacks().await;
        let trip = self.active_trip().await;

        let active_since = Utc::now() - Duration::hours(ACTIVE_WINDOW_HOURS);
        let average_rating = if feedbacks.is_empty() {
            0.0
        } else {
            let sum: f64 = feedbacks.iter().map(|f| f64::from(f.rating)).sum();
            (sum / feedbacks.len() as f64 * 10.0).round() / 10.0
        };

        Statistics {
            total_users: users.len(),
            active_users: users
                .iter()
                .filter(|user| user.last_updated > active_since)
                .count(),
            total_notifications: notifications.len(),
            total_feedbacks: feedbacks.len(),
            average_rating,
            route_points: trip.route.len(),
            leaders: users.iter().filter(|user| user.is_leader).count(),
        }
    }

    // ---- helpers ----

    async fn load<T: DeserializeOwned>(&self, collection: &str) -> StoreResult<Vec<(String, T)>> {
        let entries = self.store.list(collection).await?;
        let records = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<T>(entry.record) {
                Ok(record) => Some((entry.id, record)),
                Err(err) => {
                    warn!(collection, id = %entry.id, error = %err, "skipping malformed record");
                    None
                }
            })
            .collect();
        Ok(records)
    }
}

fn to_record<T: Serialize>(value: &T) -> StoreResult<Value> {
    Ok(serde_json::to_value(value)?)
}

fn or_empty<T>(collection: &str, result: StoreResult<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|err| {
        warn!(collection, error = %err, "store read failed; returning empty result");
        Vec::new()
    })
}

/// Keeps the last [`RECENT_LIMIT`] entries of a key-ordered listing.
fn latest<T>(entries: Vec<(String, T)>) -> impl Iterator<Item = (String, T)> {
    let skip = entries.len().saturating_sub(RECENT_LIMIT);
    entries.into_iter().skip(skip)
}
