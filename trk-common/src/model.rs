//! # Domain Records
//!
//! Records stored in the document store and returned in envelope payloads.
//! Field names are lowerCamelCase on the wire. Every record deserializes from
//! partial JSON (missing fields take their defaults) because the store holds
//! documents written by older clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Location {
            latitude,
            longitude,
        }
    }
}

/// Help/stop signal a user can raise. Encoded as an integer on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum UserStatus {
    #[default]
    None = 0,
    Help = 1,
    Stop = 2,
}

impl TryFrom<u8> for UserStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Help),
            2 => Ok(Self::Stop),
            other => Err(format!("unknown user status {other}")),
        }
    }
}

impl From<UserStatus> for u8 {
    fn from(status: UserStatus) -> Self {
        status as u8
    }
}

/// How a user travels. Encoded as an integer on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TripType {
    #[default]
    Walking = 0,
    Cycling = 1,
    Excursion = 2,
}

impl TryFrom<u8> for TripType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Walking),
            1 => Ok(Self::Cycling),
            2 => Ok(Self::Excursion),
            other => Err(format!("unknown trip type {other}")),
        }
    }
}

impl From<TripType> for u8 {
    fn from(kind: TripType) -> Self {
        kind as u8
    }
}

/// A registered participant (collection `users`, keyed by `id`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Stored as received; omitted from serialized output once redacted.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    pub current_location: Location,
    pub is_leader: bool,
    pub status: UserStatus,
    pub trip_type: TripType,
    pub last_updated: DateTime<Utc>,
}

impl User {
    /// Returns a copy safe to send to clients.
    pub fn redacted(&self) -> Self {
        User {
            password: String::new(),
            ..self.clone()
        }
    }
}

/// A named route the group can follow (collection `predefined_trips`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PredefinedTrip {
    pub id: String,
    pub name: String,
    pub description: String,
    pub route: Vec<Location>,
    pub duration: String,
    pub break_schedule: String,
    pub rest_places: Vec<String>,
    pub points_of_interest: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub is_predefined: bool,
}

impl Default for PredefinedTrip {
    fn default() -> Self {
        PredefinedTrip {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            route: Vec::new(),
            duration: String::new(),
            break_schedule: String::new(),
            rest_places: Vec::new(),
            points_of_interest: Vec::new(),
            created_at: DateTime::<Utc>::default(),
            is_active: false,
            is_predefined: true,
        }
    }
}

/// Leader-edited overrides for one trip (collection `trip_plans`, natural key `tripId`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TripPlan {
    pub id: String,
    pub trip_id: String,
    pub duration: String,
    pub break_schedule: String,
    pub rest_places: Vec<String>,
    pub points_of_interest: Vec<String>,
    pub last_updated: DateTime<Utc>,
    pub updated_by: String,
}

/// The active trip as clients see it: the predefined route with its plan applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Trip {
    pub trip_name: String,
    pub route: Vec<Location>,
    pub duration: String,
    pub break_schedule: String,
    pub rest_places: Vec<String>,
    pub points_of_interest: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Default for Trip {
    fn default() -> Self {
        Trip {
            trip_name: "Trip".to_string(),
            route: Vec::new(),
            duration: "3 hours".to_string(),
            break_schedule: "Break from 12:00 to 13:00".to_string(),
            rest_places: Vec::new(),
            points_of_interest: Vec::new(),
            is_active: false,
            created_at: DateTime::<Utc>::default(),
        }
    }
}

impl Trip {
    /// Builds the client view of `trip`, preferring non-empty fields from `plan`.
    pub fn from_parts(trip: &PredefinedTrip, plan: Option<&TripPlan>) -> Self {
        let pick = |planned: Option<&String>, fallback: &String| match planned {
            Some(value) if !value.is_empty() => value.clone(),
            _ => fallback.clone(),
        };
        let pick_list = |planned: Option<&Vec<String>>, fallback: &Vec<String>| match planned {
            Some(list) if !list.is_empty() => list.clone(),
            _ => fallback.clone(),
        };

        Trip {
            trip_name: trip.name.clone(),
            route: trip.route.clone(),
            duration: pick(plan.map(|p| &p.duration), &trip.duration),
            break_schedule: pick(plan.map(|p| &p.break_schedule), &trip.break_schedule),
            rest_places: pick_list(plan.map(|p| &p.rest_places), &trip.rest_places),
            points_of_interest: pick_list(
                plan.map(|p| &p.points_of_interest),
                &trip.points_of_interest,
            ),
            is_active: true,
            created_at: trip.created_at,
        }
    }
}

/// A broadcast message (collection `notifications`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Notification {
    pub time: DateTime<Utc>,
    pub message: String,
    pub user_id: String,
    pub user_name: String,
    pub is_read: bool,
}

/// A post-trip review (collection `feedbacks`, keyed by `id`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Feedback {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub message: String,
    pub rating: u8,
    pub created_at: DateTime<Utc>,
    pub trip_name: String,
}

/// Aggregate counters returned by `get_statistics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_users: usize,
    pub active_users: usize,
    pub total_notifications: usize,
    pub total_feedbacks: usize,
    pub average_rating: f64,
    pub route_points: usize,
    pub leaders: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn enums_travel_as_integers() {
        let user = User {
            status: UserStatus::Help,
            trip_type: TripType::Excursion,
            ..User::default()
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["status"], json!(1));
        assert_eq!(value["tripType"], json!(2));
        assert!(serde_json::from_value::<UserStatus>(json!(7)).is_err());
    }

    #[test]
    fn redacted_user_omits_password() {
        let user = User {
            name: "olena".to_string(),
            password: "secret".to_string(),
            ..User::default()
        };
        let value = serde_json::to_value(user.redacted()).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(value["name"], json!("olena"));
    }

    #[test]
    fn partial_documents_take_defaults() {
        let trip: PredefinedTrip = serde_json::from_value(json!({"name": "Lviv"})).unwrap();
        assert_eq!(trip.name, "Lviv");
        assert!(trip.is_predefined);
        assert!(!trip.is_active);
        assert!(trip.route.is_empty());
    }

    #[test]
    fn plan_fields_override_trip_when_present() {
        let trip = PredefinedTrip {
            name: "Lviv".to_string(),
            duration: "3 hours".to_string(),
            break_schedule: "noon".to_string(),
            rest_places: vec!["Park".to_string()],
            ..PredefinedTrip::default()
        };
        let plan = TripPlan {
            duration: "5 hours".to_string(),
            rest_places: Vec::new(),
            ..TripPlan::default()
        };

        let view = Trip::from_parts(&trip, Some(&plan));
        assert_eq!(view.trip_name, "Lviv");
        assert_eq!(view.duration, "5 hours");
        assert_eq!(view.break_schedule, "noon");
        assert_eq!(view.rest_places, vec!["Park".to_string()]);
        assert!(view.is_active);
    }
}
