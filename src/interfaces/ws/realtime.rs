//! Realtime change stream for UI clients
//!
//! `GET /api/v1/realtime/ws?table=bookings&location_id=...` upgrades to a
//! WebSocket that carries every matching [`ChangeMessage`] as JSON, plus
//! `{"type":"refresh"}` whenever the subscription watchdog fires. Browsers
//! cannot set headers on an upgrade, so the bearer token may also be passed
//! as `?token=`.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, Request, State,
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::select;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::events::{ChangeFilter, ChangeMessage, ChangeOp, Table};
use crate::application::{AuthContext, SyncTrigger, WatchedSubscription};
use crate::domain::access::Actor;
use crate::interfaces::http::common::ApiError;
use crate::interfaces::http::middleware::bearer_token;
use crate::interfaces::http::ApiState;

#[derive(Debug, Default, Deserialize)]
pub struct RealtimeParams {
    pub table: Option<Table>,
    pub op: Option<ChangeOp>,
    pub location_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub token: Option<String>,
}

impl RealtimeParams {
    fn filter(&self) -> ChangeFilter {
        ChangeFilter {
            table: self.table,
            op: self.op,
            location_id: self.location_id,
            owner_id: self.owner_id,
            user_id: self.user_id,
        }
    }
}

/// Strip row payloads the caller has no business reading. Admins see
/// everything; others see records about themselves or their properties.
fn redact(actor: &Actor, mut msg: ChangeMessage) -> ChangeMessage {
    let event = &msg.event;
    let own = event.user_id == Some(actor.user_id) || event.owner_id == Some(actor.user_id);
    let public = event.table == Table::Locations;
    if !(actor.is_admin() || own || public) {
        msg.event.record = serde_json::Value::Null;
    }
    msg
}

pub async fn realtime_ws_handler(
    State(state): State<ApiState>,
    Query(params): Query<RealtimeParams>,
    ws: WebSocketUpgrade,
    request: Request,
) -> Response {
    let token = bearer_token(&request)
        .map(str::to_owned)
        .or_else(|| params.token.clone());
    let Some(token) = token else {
        return ApiError::unauthorized("Missing authentication token").into_response();
    };
    let ctx = match state.auth.authenticate(&token).await {
        Ok(ctx) => ctx,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let filter = params.filter();
    info!(user_id = %ctx.profile.id, ?filter, "Realtime subscription opened");
    ws.on_upgrade(move |socket| stream_changes(socket, state, ctx, filter))
}

async fn stream_changes(socket: WebSocket, state: ApiState, ctx: AuthContext, filter: ChangeFilter) {
    let (mut sender, mut receiver) = socket.split();
    let actor = ctx.actor();
    let mut watch = WatchedSubscription::new(&state.events, filter.clone(), state.poll_interval);

    let welcome = serde_json::json!({ "type": "connected", "filter": filter });
    if sender
        .send(Message::Text(welcome.to_string().into()))
        .await
        .is_err()
    {
        return;
    }

    loop {
        select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Ping(data))) => {
                    if sender.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    warn!(error = %e, "Realtime socket error");
                    break;
                }
                Some(Ok(_)) => {}
            },

            trigger = watch.next() => {
                let payload = match trigger {
                    Some(SyncTrigger::Changed(msg)) => serde_json::to_string(&redact(&actor, msg)),
                    Some(SyncTrigger::Stale) => Ok(r#"{"type":"refresh"}"#.to_string()),
                    None => {
                        warn!("Change bus closed");
                        break;
                    }
                };
                match payload {
                    Ok(json) => {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => debug!(error = %e, "Failed to serialize change"),
                }
            }
        }
    }

    info!(user_id = %actor.user_id, "Realtime subscription closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::ChangeEvent;
    use crate::domain::access::SessionRole;
    use crate::domain::{ApprovalStatus, UserRole};

    fn actor(role: UserRole) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            session: SessionRole {
                role,
                approval_status: ApprovalStatus::None,
            },
        }
    }

    fn booking_event(user_id: Uuid) -> ChangeMessage {
        ChangeMessage::new(ChangeEvent {
            table: Table::Bookings,
            op: ChangeOp::Insert,
            row_id: Uuid::new_v4(),
            location_id: Some(Uuid::new_v4()),
            owner_id: None,
            user_id: Some(user_id),
            record: serde_json::json!({ "selected_slot": "P1" }),
        })
    }

    #[test]
    fn other_drivers_bookings_are_redacted() {
        let driver = actor(UserRole::User);
        let theirs = redact(&driver, booking_event(Uuid::new_v4()));
        assert!(theirs.event.record.is_null());
        assert!(theirs.event.location_id.is_some());

        let mine = redact(&driver, booking_event(driver.user_id));
        assert!(!mine.event.record.is_null());

        let admin = actor(UserRole::Admin);
        assert!(!redact(&admin, booking_event(Uuid::new_v4())).event.record.is_null());
    }

    #[test]
    fn params_map_onto_filter() {
        let loc = Uuid::new_v4();
        let params = RealtimeParams {
            table: Some(Table::Bookings),
            location_id: Some(loc),
            ..Default::default()
        };
        assert_eq!(
            params.filter(),
            ChangeFilter::table(Table::Bookings).with_location(loc)
        );
    }
}
