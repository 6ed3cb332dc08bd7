//! # Command Router
//!
//! Lookup + call: parse a frame into a request, find the command, decode its
//! payload once, and hand it to the matching handler. The router holds no
//! locks and never retries; every path ends in an [`Envelope`].

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use trk_common::{Envelope, ErrorCode, WireRequest, canonicalize_keys};

use crate::command::{Command, Lookup, Request};
use crate::handlers;
use crate::service::TrackingService;

/// Routes requests to handlers. Cheap to clone; one per session.
#[derive(Clone)]
pub struct Router {
    service: Arc<TrackingService>,
}

impl Router {
    pub fn new(service: Arc<TrackingService>) -> Self {
        Router { service }
    }

    /// Handles one framed message.
    ///
    /// Returns `None` when the text is not JSON at all; such frames are
    /// dropped without a response. JSON that is not a request object gets an
    /// `INVALID_REQUEST` envelope.
    pub async fn handle_frame(&self, text: &str) -> Option<Envelope> {
        let mut value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(err) => {
                debug!(error = %err, "dropping unparseable frame");
                return None;
            }
        };

        canonicalize_keys(&mut value);
        let envelope = match serde_json::from_value::<WireRequest>(value) {
            Ok(request) => self.dispatch(request).await,
            Err(err) => Envelope::failure(
                ErrorCode::InvalidRequest,
                format!("Invalid request format: {err}"),
            ),
        };
        Some(envelope)
    }

    /// Dispatches a parsed request.
    pub async fn dispatch(&self, request: WireRequest) -> Envelope {
        let command = match Command::lookup(&request.command) {
            Lookup::Known(command) => command,
            Lookup::Unknown(name) => {
                debug!(command = %name, "unknown command");
                return Envelope::failure(
                    ErrorCode::UnknownCommand,
                    format!("Unknown command: {name}"),
                );
            }
        };

        match Request::decode(command, request.data) {
            Ok(decoded) => self.call(decoded).await,
            Err(err) => Envelope::failure(
                ErrorCode::InvalidPayload,
                format!("Invalid data for {}: {err}", command.name()),
            ),
        }
    }

    async fn call(&self, request: Request) -> Envelope {
        let service = self.service.as_ref();
        match request {
            Request::Ping => handlers::ping(),
            Request::GetUsers => handlers::get_users(service).await,
            Request::GetActiveTrip => handlers::get_active_trip(service).await,
            Request::GetNotifications => handlers::get_notifications(service).await,
            Request::GetStatistics => handlers::get_statistics(service).await,
            Request::GetFeedbacks => handlers::get_feedbacks(service).await,
            Request::GetPredefinedTrips => handlers::get_predefined_trips(service).await,
            Request::UpdateLocation(update) => handlers::update_location(service, update).await,
            Request::AddNotification(input) => handlers::add_notification(service, input).await,
            Request::RegisterUser(input) => handlers::register_user(service, input).await,
            Request::AddFeedback(input) => handlers::add_feedback(service, input).await,
            Request::SetActiveTrip(selection) => {
                handlers::set_active_trip(service, selection).await
            }
            Request::UpdateTripPlan(update) => handlers::update_trip_plan(service, update).await,
            Request::SavePredefinedTrip(trip) => {
                handlers::save_predefined_trip(service, trip).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trk_store::MemoryStore;

    fn router() -> Router {
        let store = Arc::new(MemoryStore::new());
        Router::new(Arc::new(TrackingService::new(store)))
    }

    #[tokio::test]
    async fn unknown_command_names_itself() {
        let envelope = router()
            .dispatch(WireRequest::new("teleport", Value::Null))
            .await;
        assert!(!envelope.success);
        assert!(envelope.message.contains("teleport"));
        assert_eq!(envelope.code(), Some(ErrorCode::UnknownCommand));
    }

    #[tokio::test]
    async fn command_match_is_case_insensitive() {
        let envelope = router().dispatch(WireRequest::new("PiNg", Value::Null)).await;
        assert!(envelope.success);
    }

    #[tokio::test]
    async fn non_json_frame_gets_no_response() {
        assert_eq!(router().handle_frame("{not json}").await, None);
    }

    #[tokio::test]
    async fn request_keys_match_in_any_case() {
        let envelope = router()
            .handle_frame(r#"{"COMMAND":"set_active_trip","Data":{"tripid":"t9"}}"#)
            .await
            .unwrap();
        // an unread `tripid` would fail validation instead of the lookup
        assert_eq!(envelope.code(), Some(ErrorCode::NotFound));
        assert!(envelope.message.contains("t9"));

        let envelope = router().handle_frame(r#"{"Command":"ping"}"#).await.unwrap();
        assert!(envelope.success);
    }

    #[tokio::test]
    async fn json_without_command_is_rejected() {
        let envelope = router().handle_frame(r#"{"data":1}"#).await.unwrap();
        assert_eq!(envelope.code(), Some(ErrorCode::InvalidRequest));
    }

    #[tokio::test]
    async fn malformed_payload_is_rejected() {
        let envelope = router()
            .dispatch(WireRequest::new("set_active_trip", json!([1, 2, 3])))
            .await;
        assert_eq!(envelope.code(), Some(ErrorCode::InvalidPayload));
        assert!(envelope.message.contains("set_active_trip"));
    }

    #[tokio::test]
    async fn missing_required_field_is_a_failure_envelope() {
        let envelope = router()
            .handle_frame(r#"{"command":"update_location","data":{"userId":"","location":{"latitude":1,"longitude":2}}}"#)
            .await
            .unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.code(), Some(ErrorCode::InvalidPayload));
    }
}
