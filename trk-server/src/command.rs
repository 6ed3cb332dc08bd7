//! # Command Table
//!
//! The static, process-wide mapping from lowercase command names to commands,
//! and the typed request union the router decodes once before dispatch.
//!
//! ## Design Principles
//!
//! 1. **Closed Set**: Commands are an enum; adding one is a compile-time
//!    exhaustive change across the table, decoder and router.
//! 2. **Decode Once**: The generic `data` field is turned into one concrete
//!    payload type here, so handlers receive typed input.
//! 3. **Unknown Is Data**: An unrecognized name is a value
//!    ([`Lookup::Unknown`]), not an error path.

use serde::de::DeserializeOwned;
use serde_json::Value;

use trk_common::{
    LocationUpdate, NewFeedback, NewNotification, PredefinedTrip, Registration, TripPlanUpdate,
    TripSelection, canonicalize_keys,
};

/// Every command the server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Ping,
    GetUsers,
    GetActiveTrip,
    GetNotifications,
    UpdateLocation,
    AddNotification,
    GetStatistics,
    RegisterUser,
    AddFeedback,
    GetFeedbacks,
    GetPredefinedTrips,
    SetActiveTrip,
    UpdateTripPlan,
    SavePredefinedTrip,
}

/// Result of looking a name up in the command table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Known(Command),
    Unknown(String),
}

impl Command {
    /// Every command, in wire-table order.
    pub const ALL: [Command; 14] = [
        Command::Ping,
        Command::GetUsers,
        Command::GetActiveTrip,
        Command::GetNotifications,
        Command::UpdateLocation,
        Command::AddNotification,
        Command::GetStatistics,
        Command::RegisterUser,
        Command::AddFeedback,
        Command::GetFeedbacks,
        Command::GetPredefinedTrips,
        Command::SetActiveTrip,
        Command::UpdateTripPlan,
        Command::SavePredefinedTrip,
    ];

    /// Returns the canonical lowercase wire name.
    pub const fn name(self) -> &'static str {
        match self {
            Command::Ping => "ping",
            Command::GetUsers => "get_users",
            Command::GetActiveTrip => "get_active_trip",
            Command::GetNotifications => "get_notifications",
            Command::UpdateLocation => "update_location",
            Command::AddNotification => "add_notification",
            Command::GetStatistics => "get_statistics",
            Command::RegisterUser => "register_user",
            Command::AddFeedback => "add_feedback",
            Command::GetFeedbacks => "get_feedbacks",
            Command::GetPredefinedTrips => "get_predefined_trips",
            Command::SetActiveTrip => "set_active_trip",
            Command::UpdateTripPlan => "update_trip_plan",
            Command::SavePredefinedTrip => "save_predefined_trip",
        }
    }

    /// Looks up `name` case-insensitively.
    pub fn lookup(name: &str) -> Lookup {
        let normalized = name.to_lowercase();
        match Self::ALL
            .into_iter()
            .find(|command| command.name() == normalized)
        {
            Some(command) => Lookup::Known(command),
            None => Lookup::Unknown(name.to_string()),
        }
    }
}

/// A request with its payload decoded for the matching command.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Ping,
    GetUsers,
    GetActiveTrip,
    GetNotifications,
    UpdateLocation(LocationUpdate),
    AddNotification(NewNotification),
    GetStatistics,
    RegisterUser(Registration),
    AddFeedback(NewFeedback),
    GetFeedbacks,
    GetPredefinedTrips,
    SetActiveTrip(TripSelection),
    UpdateTripPlan(TripPlanUpdate),
    SavePredefinedTrip(PredefinedTrip),
}

impl Request {
    /// Decodes `data` into the payload type of `command`.
    ///
    /// `null` decodes to the payload's defaults; commands without a payload
    /// ignore `data` entirely. Fails only when `data` has the wrong shape.
    pub fn decode(command: Command, data: Value) -> Result<Self, serde_json::Error> {
        let request = match command {
            Command::Ping => Request::Ping,
            Command::GetUsers => Request::GetUsers,
            Command::GetActiveTrip => Request::GetActiveTrip,
            Command::GetNotifications => Request::GetNotifications,
            Command::GetStatistics => Request::GetStatistics,
            Command::GetFeedbacks => Request::GetFeedbacks,
            Command::GetPredefinedTrips => Request::GetPredefinedTrips,
            Command::UpdateLocation => Request::UpdateLocation(payload(data)?),
            Command::AddNotification => Request::AddNotification(payload(data)?),
            Command::RegisterUser => Request::RegisterUser(payload(data)?),
            Command::AddFeedback => Request::AddFeedback(payload(data)?),
            Command::SetActiveTrip => Request::SetActiveTrip(payload(data)?),
            Command::UpdateTripPlan => Request::UpdateTripPlan(payload(data)?),
            Command::SavePredefinedTrip => Request::SavePredefinedTrip(payload(data)?),
        };
        Ok(request)
    }
}

fn payload<T: DeserializeOwned + Default>(mut data: Value) -> Result<T, serde_json::Error> {
    if data.is_null() {
        return Ok(T::default());
    }
    canonicalize_keys(&mut data);
    serde_json::from_value(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_name_round_trips_through_lookup() {
        for command in Command::ALL {
            assert_eq!(Command::lookup(command.name()), Lookup::Known(command));
        }
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(Command::lookup("PING"), Lookup::Known(Command::Ping));
        assert_eq!(
            Command::lookup("Set_Active_Trip"),
            Lookup::Known(Command::SetActiveTrip)
        );
    }

    #[test]
    fn unknown_names_keep_their_spelling() {
        assert_eq!(
            Command::lookup("Fly_Away"),
            Lookup::Unknown("Fly_Away".to_string())
        );
        assert_eq!(Command::lookup(""), Lookup::Unknown(String::new()));
    }

    #[test]
    fn null_payload_decodes_to_defaults() {
        let request = Request::decode(Command::UpdateLocation, Value::Null).unwrap();
        assert_eq!(request, Request::UpdateLocation(LocationUpdate::default()));
    }

    #[test]
    fn payload_is_decoded_per_command() {
        let data = json!({"userId": "u1", "location": {"latitude": 1.5, "longitude": 2.5}});
        let Request::UpdateLocation(update) = Request::decode(Command::UpdateLocation, data).unwrap()
        else {
            panic!("wrong variant");
        };
        assert_eq!(update.user_id, "u1");
        assert_eq!(update.location.map(|l| l.latitude), Some(1.5));
    }

    #[test]
    fn payload_fields_match_in_any_case() {
        let data = json!({"userid": "u1", "Location": {"LATITUDE": 1.5, "longitude": 2.5}});
        let Request::UpdateLocation(update) = Request::decode(Command::UpdateLocation, data).unwrap()
        else {
            panic!("wrong variant");
        };
        assert_eq!(update.user_id, "u1");
        assert_eq!(update.location.map(|l| l.latitude), Some(1.5));

        let data = json!({"NAME": "Ridge", "isactive": true, "RestPlaces": ["hut"]});
        let Request::SavePredefinedTrip(trip) = Request::decode(Command::SavePredefinedTrip, data).unwrap()
        else {
            panic!("wrong variant");
        };
        assert_eq!(trip.name, "Ridge");
        assert!(trip.is_active);
        assert_eq!(trip.rest_places, ["hut"]);
    }

    #[test]
    fn wrong_shape_fails_to_decode() {
        assert!(Request::decode(Command::RegisterUser, json!("alice")).is_err());
        assert!(Request::decode(Command::AddFeedback, json!({"rating": "five"})).is_err());
    }

    #[test]
    fn payloadless_commands_ignore_data() {
        let request = Request::decode(Command::Ping, json!({"anything": true})).unwrap();
        assert_eq!(request, Request::Ping);
    }
}
