//! # Command Handlers
//!
//! One async function per command. Each receives its typed payload, validates
//! it, calls the [`TrackingService`], and returns an [`Envelope`]. No handler
//! returns an error: validation problems and store failures both become
//! failure envelopes here, so the router and session never see a fault.

use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use trk_common::{
    Envelope, ErrorCode, Feedback, Location, LocationUpdate, NewFeedback, NewNotification,
    Notification, PredefinedTrip, Registration, TripPlan, TripPlanUpdate, TripSelection, User,
    UserStatus,
};
use trk_store::StoreError;

use crate::service::{Activation, Registered, TrackingService};

/// Where newly registered users start.
pub const DEFAULT_LOCATION: Location = Location::new(49.842957, 24.031111);

/// Rating given to feedback that does not carry one.
pub const DEFAULT_RATING: u8 = 3;

/// Inclusive rating scale.
pub const RATING_RANGE: std::ops::RangeInclusive<i64> = 1..=5;

/// Trip name recorded on feedback that does not name one.
pub const UNKNOWN_TRIP: &str = "Unknown trip";

/// Author name on notifications the server emits itself.
pub const SYSTEM_USER: &str = "System";

pub fn ping() -> Envelope {
    let data = json!({
        "message": "Server is running",
        "timestamp": Utc::now(),
        "serverVersion": env!("CARGO_PKG_VERSION"),
        "storeConnected": true,
    });
    Envelope::success(data, "Pong")
}

pub async fn get_users(service: &TrackingService) -> Envelope {
    let users: Vec<User> = service.users().await.iter().map(User::redacted).collect();
    let message = format!("Fetched {} users", users.len());
    success(&users, message)
}

pub async fn get_active_trip(service: &TrackingService) -> Envelope {
    let trip = service.active_trip().await;
    success(&trip, "Active trip fetched")
}

pub async fn get_notifications(service: &TrackingService) -> Envelope {
    let notifications = service.notifications().await;
    let message = format!("Fetched {} notifications", notifications.len());
    success(&notifications, message)
}

pub async fn get_feedbacks(service: &TrackingService) -> Envelope {
    let feedbacks = service.feedbacks().await;
    let message = format!("Fetched {} feedbacks", feedbacks.len());
    success(&feedbacks, message)
}

pub async fn get_predefined_trips(service: &TrackingService) -> Envelope {
    let trips = service.predefined_trips().await;
    let message = format!("Fetched {} trips", trips.len());
    success(&trips, message)
}

pub async fn get_statistics(service: &TrackingService) -> Envelope {
    let statistics = service.statistics().await;
    success(&statistics, "Statistics fetched")
}

/// Moves a user. Requires `userId` and `location`.
pub async fn update_location(service: &TrackingService, update: LocationUpdate) -> Envelope {
    if update.user_id.is_empty() {
        return invalid("Invalid location data: userId is required");
    }
    let Some(location) = update.location else {
        return invalid("Invalid location data: location is required");
    };

    match service.update_user_location(&update.user_id, location).await {
        Ok(true) => Envelope::success(Value::Bool(true), "Location updated"),
        Ok(false) => Envelope::failure(
            ErrorCode::NotFound,
            format!("User {} not found", update.user_id),
        ),
        Err(err) => store_failure("Location update failed", &err),
    }
}

/// Broadcasts a message. The timestamp is always the server's clock.
pub async fn add_notification(service: &TrackingService, input: NewNotification) -> Envelope {
    if input.message.is_empty() {
        return invalid("Invalid notification data: message is required");
    }

    let notification = Notification {
        time: Utc::now(),
        message: input.message,
        user_id: input.user_id,
        user_name: input.user_name,
        is_read: false,
    };
    match service.add_notification(&notification).await {
        Ok(_) => Envelope::success(Value::Bool(true), "Notification added"),
        Err(err) => store_failure("Adding notification failed", &err),
    }
}

/// Creates a user with a unique name and announces it with a notification.
pub async fn register_user(service: &TrackingService, input: Registration) -> Envelope {
    if input.name.is_empty() || input.password.is_empty() {
        return invalid("Invalid registration data: name and password are required");
    }

    let candidate = User {
        id: uuid::Uuid::new_v4().to_string(),
        name: input.name,
        email: input.email,
        password: input.password,
        current_location: DEFAULT_LOCATION,
        is_leader: input.is_leader,
        status: UserStatus::None,
        trip_type: input.trip_type,
        last_updated: Utc::now(),
    };

    let user = match service.register_user(candidate).await {
        Ok(Registered::Created(user)) => user,
        Ok(Registered::NameTaken) => {
            return Envelope::failure(ErrorCode::AlreadyExists, "User already exists");
        }
        Err(err) => return store_failure("Registration failed", &err),
    };

    let announcement = Notification {
        time: Utc::now(),
        message: format!("New user: {}", user.name),
        user_id: user.id.clone(),
        user_name: SYSTEM_USER.to_string(),
        is_read: false,
    };
    if let Err(err) = service.add_notification(&announcement).await {
        warn!(user_id = %user.id, error = %err, "registration notification was not stored");
    }

    info!(user_id = %user.id, name = %user.name, "user registered");
    success(&user.redacted(), "User registered")
}

/// Stores a review with a fresh id and server timestamp.
pub async fn add_feedback(service: &TrackingService, input: NewFeedback) -> Envelope {
    if input.message.is_empty() {
        return invalid("Invalid feedback data: message is required");
    }
    let rating = match input.rating {
        None => DEFAULT_RATING,
        Some(value) => match u8::try_from(value) {
            Ok(rating) if RATING_RANGE.contains(&value) => rating,
            _ => return invalid("Invalid feedback data: rating must be between 1 and 5"),
        },
    };

    let feedback = Feedback {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: input.user_id,
        user_name: input.user_name,
        message: input.message,
        rating,
        created_at: Utc::now(),
        trip_name: input
            .trip_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_TRIP.to_string()),
    };

    match service.add_feedback(&feedback).await {
        Ok(()) => {
            info!(user = %feedback.user_name, rating = feedback.rating, "feedback added");
            Envelope::success(Value::Bool(true), "Feedback added")
        }
        Err(err) => store_failure("Adding feedback failed", &err),
    }
}

/// Makes `tripId` the only active trip.
pub async fn set_active_trip(service: &TrackingService, selection: TripSelection) -> Envelope {
    if selection.trip_id.is_empty() {
        return invalid("Invalid trip data: tripId is required");
    }

    match service.set_active_trip(&selection.trip_id).await {
        Ok(Activation::Activated) => {
            info!(trip_id = %selection.trip_id, "active trip changed");
            Envelope::success(Value::Bool(true), "Active trip set")
        }
        Ok(Activation::UnknownTrip) => Envelope::failure(
            ErrorCode::NotFound,
            format!("Trip {} not found", selection.trip_id),
        ),
        Err(err) => store_failure("Setting active trip failed", &err),
    }
}

/// Upserts the plan for `tripId`.
pub async fn update_trip_plan(service: &TrackingService, update: TripPlanUpdate) -> Envelope {
    if update.trip_id.is_empty() {
        return invalid("Invalid trip plan data: tripId is required");
    }

    let plan = TripPlan {
        id: String::new(),
        trip_id: update.trip_id,
        duration: update.duration,
        break_schedule: update.break_schedule,
        rest_places: update.rest_places,
        points_of_interest: update.points_of_interest,
        last_updated: Utc::now(),
        updated_by: update.updated_by,
    };
    match service.save_trip_plan(plan).await {
        Ok(plan) => {
            info!(trip_id = %plan.trip_id, updated_by = %plan.updated_by, "trip plan updated");
            Envelope::success(Value::Bool(true), "Trip plan updated")
        }
        Err(err) => store_failure("Updating trip plan failed", &err),
    }
}

/// Upserts a route by id or name.
pub async fn save_predefined_trip(service: &TrackingService, trip: PredefinedTrip) -> Envelope {
    if trip.name.is_empty() {
        return invalid("Invalid trip data: name is required");
    }

    match service.save_predefined_trip(trip).await {
        Ok(saved) => {
            info!(trip_id = %saved.id, name = %saved.name, "predefined trip saved");
            Envelope::success(Value::Bool(true), "Trip saved")
        }
        Err(err) => store_failure("Saving trip failed", &err),
    }
}

fn success<T: Serialize>(data: &T, message: impl Into<String>) -> Envelope {
    match serde_json::to_value(data) {
        Ok(value) => Envelope::success(value, message),
        Err(err) => Envelope::failure(
            ErrorCode::InternalError,
            format!("Response could not be encoded: {err}"),
        ),
    }
}

fn invalid(message: &str) -> Envelope {
    debug!(reason = message, "payload rejected");
    Envelope::failure(ErrorCode::InvalidPayload, message)
}

fn store_failure(context: &str, err: &StoreError) -> Envelope {
    warn!(error = %err, "{context}");
    Envelope::failure(ErrorCode::StoreError, format!("{context}: {err}"))
}
