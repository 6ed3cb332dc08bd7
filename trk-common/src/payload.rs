//! # Command Payloads
//!
//! One concrete payload type per command that takes input. Every field
//! defaults when absent so that "missing" and "empty" reach the handler the
//! same way and validation stays in one place.
//!
//! Field names are matched in their canonical camelCase spelling; run the
//! payload through [`canonicalize_keys`](crate::canonicalize_keys) first to
//! accept any ASCII casing.

use serde::{Deserialize, Serialize};

use crate::model::{Location, TripType};

/// Payload of `update_location`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocationUpdate {
    pub user_id: String,
    pub location: Option<Location>,
}

/// Payload of `add_notification`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewNotification {
    pub message: String,
    pub user_id: String,
    pub user_name: String,
}

/// Payload of `register_user`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub is_leader: bool,
    pub trip_type: TripType,
}

/// Payload of `add_feedback`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewFeedback {
    pub user_id: String,
    pub user_name: String,
    pub message: String,
    /// `None` takes the default rating.
    pub rating: Option<i64>,
    pub trip_name: Option<String>,
}

/// Payload of `set_active_trip`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TripSelection {
    pub trip_id: String,
}

/// Payload of `update_trip_plan`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TripPlanUpdate {
    pub trip_id: String,
    pub duration: String,
    pub break_schedule: String,
    pub rest_places: Vec<String>,
    pub points_of_interest: Vec<String>,
    pub updated_by: String,
}
