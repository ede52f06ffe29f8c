//! Collaborators served by the platform adapter connection.
//!
//! The adapter is a WebSocket client that registers itself with the
//! `register_adapter` command. Platform requests (posts, DMs, channel
//! groupings, broadcasts) are queued to that one connection only, and
//! each request waits for the adapter's `ack`. Without a registered
//! adapter every request fails with [`CollaboratorError::Unavailable`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc, oneshot};
use uuid::Uuid;

use super::{CollaboratorError, Notice, Notifier, Presenter, SpaceLayout, SpaceManager};
use crate::domain::{PresentationHandle, SpaceHandle, UserId, VzpId};
use crate::render::RenderedVzp;

/// Requests buffered for the adapter before senders wait.
const REQUEST_QUEUE: usize = 256;

/// Work the adapter must carry out on the chat platform.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum PlatformRequest {
    /// Create the event post, or edit it when `handle` is set.
    Present {
        /// Event identifier.
        vzp_id: VzpId,
        /// Post to edit.
        handle: Option<PresentationHandle>,
        /// `true` for a new post, which mentions `@everyone`.
        mention_everyone: bool,
        /// Payload to display.
        rendered: RenderedVzp,
    },
    /// DM a member.
    DirectMessage {
        /// Recipient.
        user_id: UserId,
        /// Message to deliver.
        notice: Notice,
    },
    /// Create a channel grouping. The ack carries its handle.
    OpenSpace {
        /// Event identifier.
        vzp_id: VzpId,
        /// Channels to create.
        layout: SpaceLayout,
        /// Members to grant access and move into voice.
        members: Vec<UserId>,
    },
    /// Delete a channel grouping. The ack carries the channel count.
    ReleaseSpace {
        /// Event identifier.
        vzp_id: VzpId,
        /// Grouping to delete.
        handle: SpaceHandle,
    },
    /// Grant or revoke a member's access to a grouping.
    SetSpaceAccess {
        /// Event identifier.
        vzp_id: VzpId,
        /// Grouping concerned.
        handle: SpaceHandle,
        /// Member concerned.
        user_id: UserId,
        /// `true` to grant, `false` to revoke and disconnect.
        granted: bool,
    },
    /// Post a message in the command channel.
    Broadcast {
        /// Text to post.
        text: String,
    },
}

impl PlatformRequest {
    /// Returns the request kind as a static string slice.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Present { .. } => "present",
            Self::DirectMessage { .. } => "direct_message",
            Self::OpenSpace { .. } => "open_space",
            Self::ReleaseSpace { .. } => "release_space",
            Self::SetSpaceAccess { .. } => "set_space_access",
            Self::Broadcast { .. } => "broadcast",
        }
    }
}

/// A request queued for the adapter, tagged for acknowledgement.
#[derive(Debug, Clone)]
pub struct AdapterRequest {
    /// Identifier the adapter must echo in its ack.
    pub request_id: Uuid,
    /// Work to carry out.
    pub request: PlatformRequest,
}

/// The adapter's answer to one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterAck {
    /// Request being answered.
    pub request_id: Uuid,
    /// Failure reason; absent on success.
    #[serde(default)]
    pub error: Option<String>,
    /// Platform reference of a created post or grouping.
    #[serde(default)]
    pub handle: Option<String>,
    /// Channels deleted by a release.
    #[serde(default)]
    pub released: Option<usize>,
}

impl AdapterAck {
    /// Builds a successful ack with no result fields.
    #[must_use]
    pub fn ok(request_id: Uuid) -> Self {
        Self {
            request_id,
            error: None,
            handle: None,
            released: None,
        }
    }
}

/// The request queue of a registered adapter connection.
#[derive(Debug)]
pub struct AdapterSession {
    /// Identifies this registration; acks are only accepted under it.
    pub link_id: Uuid,
    /// Requests to forward to the adapter.
    pub requests: mpsc::Receiver<AdapterRequest>,
}

#[derive(Debug, Default)]
struct HubState {
    link: Option<(Uuid, mpsc::Sender<AdapterRequest>)>,
    pending: HashMap<Uuid, oneshot::Sender<AdapterAck>>,
}

/// Routes platform requests to the registered adapter and matches its acks.
///
/// Implements [`Notifier`], [`SpaceManager`] and [`Presenter`]. At most one
/// adapter is registered; a new registration replaces the previous one and
/// fails its outstanding requests.
#[derive(Debug)]
pub struct AdapterHub {
    state: Mutex<HubState>,
    timeout: Duration,
    token: Option<String>,
}

impl AdapterHub {
    /// Creates a hub waiting `timeout` for each ack. When `token` is set,
    /// registrations must present it.
    #[must_use]
    pub fn new(timeout: Duration, token: Option<String>) -> Self {
        Self {
            state: Mutex::new(HubState::default()),
            timeout,
            token,
        }
    }

    /// Registers the calling connection as the adapter. Returns `None` if
    /// the token does not match.
    pub async fn register(&self, token: Option<&str>) -> Option<AdapterSession> {
        if let Some(expected) = &self.token
            && token != Some(expected.as_str())
        {
            tracing::warn!("adapter registration rejected");
            return None;
        }
        let link_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(REQUEST_QUEUE);
        let mut state = self.state.lock().await;
        if state.link.replace((link_id, tx)).is_some() {
            tracing::warn!(%link_id, "platform adapter replaced");
            state.pending.clear();
        } else {
            tracing::info!(%link_id, "platform adapter registered");
        }
        Some(AdapterSession {
            link_id,
            requests: rx,
        })
    }

    /// Drops the registration `link_id` if it is still current. Requests
    /// awaiting its ack fail with [`CollaboratorError::Unavailable`].
    pub async fn unregister(&self, link_id: Uuid) {
        let mut state = self.state.lock().await;
        if state.link.as_ref().is_some_and(|(id, _)| *id == link_id) {
            state.link = None;
            state.pending.clear();
            tracing::info!(%link_id, "platform adapter disconnected");
        }
    }

    /// Returns `true` while an adapter is registered.
    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.link.is_some()
    }

    /// Delivers an ack from the registration `link_id`. Returns `false`
    /// if that registration is stale or the request is not outstanding.
    pub async fn acknowledge(&self, link_id: Uuid, ack: AdapterAck) -> bool {
        let mut state = self.state.lock().await;
        if !state.link.as_ref().is_some_and(|(id, _)| *id == link_id) {
            return false;
        }
        match state.pending.remove(&ack.request_id) {
            Some(waiter) => waiter.send(ack).is_ok(),
            None => false,
        }
    }

    async fn request(
        &self,
        service: &'static str,
        request: PlatformRequest,
    ) -> Result<AdapterAck, CollaboratorError> {
        let kind = request.kind();
        let request_id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        let sender = {
            let mut state = self.state.lock().await;
            let Some((_, sender)) = &state.link else {
                tracing::warn!(request = kind, "no platform adapter connected");
                return Err(CollaboratorError::Unavailable);
            };
            let sender = sender.clone();
            state.pending.insert(request_id, tx);
            sender
        };

        if sender
            .send(AdapterRequest {
                request_id,
                request,
            })
            .await
            .is_err()
        {
            self.state.lock().await.pending.remove(&request_id);
            return Err(CollaboratorError::Unavailable);
        }

        let ack = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(ack)) => ack,
            Ok(Err(_)) => return Err(CollaboratorError::Unavailable),
            Err(_) => {
                self.state.lock().await.pending.remove(&request_id);
                tracing::warn!(request = kind, %request_id, "adapter ack timed out");
                return Err(CollaboratorError::Failed {
                    service,
                    reason: format!("no ack within {} ms", self.timeout.as_millis()),
                });
            }
        };
        match ack.error {
            Some(reason) => Err(CollaboratorError::Failed { service, reason }),
            None => Ok(ack),
        }
    }
}

#[async_trait]
impl Notifier for AdapterHub {
    async fn send_direct(&self, user: UserId, notice: &Notice) -> Result<(), CollaboratorError> {
        self.request(
            "notifier",
            PlatformRequest::DirectMessage {
                user_id: user,
                notice: notice.clone(),
            },
        )
        .await
        .map(|_| ())
    }

    async fn broadcast(&self, text: &str) -> Result<(), CollaboratorError> {
        self.request(
            "notifier",
            PlatformRequest::Broadcast {
                text: text.to_string(),
            },
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl SpaceManager for AdapterHub {
    async fn open(
        &self,
        vzp_id: &VzpId,
        members: &[UserId],
    ) -> Result<SpaceHandle, CollaboratorError> {
        let ack = self
            .request(
                "spaces",
                PlatformRequest::OpenSpace {
                    vzp_id: vzp_id.clone(),
                    layout: SpaceLayout::for_vzp(vzp_id),
                    members: members.to_vec(),
                },
            )
            .await?;
        ack.handle
            .map(SpaceHandle::new)
            .ok_or_else(|| CollaboratorError::Failed {
                service: "spaces",
                reason: "adapter returned no space handle".to_string(),
            })
    }

    async fn close(
        &self,
        vzp_id: &VzpId,
        handle: &SpaceHandle,
    ) -> Result<usize, CollaboratorError> {
        let ack = self
            .request(
                "spaces",
                PlatformRequest::ReleaseSpace {
                    vzp_id: vzp_id.clone(),
                    handle: handle.clone(),
                },
            )
            .await?;
        ack.released.ok_or_else(|| CollaboratorError::Failed {
            service: "spaces",
            reason: "adapter returned no release count".to_string(),
        })
    }

    async fn set_access(
        &self,
        vzp_id: &VzpId,
        handle: &SpaceHandle,
        user: UserId,
        granted: bool,
    ) -> Result<(), CollaboratorError> {
        self.request(
            "spaces",
            PlatformRequest::SetSpaceAccess {
                vzp_id: vzp_id.clone(),
                handle: handle.clone(),
                user_id: user,
                granted,
            },
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl Presenter for AdapterHub {
    async fn present(
        &self,
        vzp_id: &VzpId,
        rendered: &RenderedVzp,
        handle: Option<&PresentationHandle>,
    ) -> Result<PresentationHandle, CollaboratorError> {
        let ack = self
            .request(
                "presenter",
                PlatformRequest::Present {
                    vzp_id: vzp_id.clone(),
                    handle: handle.cloned(),
                    mention_everyone: handle.is_none(),
                    rendered: rendered.clone(),
                },
            )
            .await?;
        match (ack.handle, handle) {
            (Some(raw), _) => Ok(PresentationHandle::new(raw)),
            (None, Some(existing)) => Ok(existing.clone()),
            (None, None) => Err(CollaboratorError::Failed {
                service: "presenter",
                reason: "adapter returned no post handle".to_string(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::{EventBus, Status, VzpEvent};

    fn hub() -> Arc<AdapterHub> {
        Arc::new(AdapterHub::new(Duration::from_secs(2), None))
    }

    /// Answers every request with `answer` until the queue closes.
    fn spawn_adapter(
        hub: &Arc<AdapterHub>,
        mut session: AdapterSession,
        answer: fn(&AdapterRequest) -> AdapterAck,
    ) -> tokio::task::JoinHandle<Vec<PlatformRequest>> {
        let hub = Arc::clone(hub);
        tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(req) = session.requests.recv().await {
                hub.acknowledge(session.link_id, answer(&req)).await;
                seen.push(req.request);
            }
            seen
        })
    }

    #[tokio::test]
    async fn request_without_adapter_is_unavailable() {
        let hub = hub();
        assert_eq!(
            hub.broadcast("@everyone").await,
            Err(CollaboratorError::Unavailable)
        );
    }

    #[tokio::test]
    async fn bus_viewers_do_not_count_as_adapter() {
        let bus = EventBus::new(16);
        let mut viewer = bus.subscribe();
        let hub = hub();
        let id = VzpId::generate();

        let result = hub.open(&id, &[UserId::new(1)]).await;
        assert_eq!(result, Err(CollaboratorError::Unavailable));

        bus.publish(VzpEvent::StatusChanged {
            vzp_id: id.clone(),
            from: Status::Open,
            to: Status::ListLocked,
            timestamp: chrono::Utc::now(),
        });
        let Ok(event) = viewer.recv().await else {
            panic!("viewer should still see domain events");
        };
        assert_eq!(event.event_type_str(), "status_changed");
    }

    #[tokio::test]
    async fn open_returns_the_adapter_handle() {
        let hub = hub();
        let Some(session) = hub.register(None).await else {
            panic!("registration refused");
        };
        let link_id = session.link_id;
        let adapter = spawn_adapter(&hub, session, |req| AdapterAck {
            handle: Some("category-7781".to_string()),
            ..AdapterAck::ok(req.request_id)
        });
        let id = VzpId::generate();

        let Ok(handle) = hub.open(&id, &[UserId::new(1), UserId::new(2)]).await else {
            panic!("open failed");
        };
        assert_eq!(handle, SpaceHandle::new("category-7781"));

        hub.unregister(link_id).await;
        let Ok(seen) = adapter.await else {
            panic!("adapter task");
        };
        let Some(PlatformRequest::OpenSpace { members, layout, .. }) = seen.first() else {
            panic!("expected an open request");
        };
        assert_eq!(members.len(), 2);
        assert_eq!(layout.voice, "vzp voice");
    }

    #[tokio::test]
    async fn close_reports_the_adapter_count() {
        let hub = hub();
        let Some(session) = hub.register(None).await else {
            panic!("registration refused");
        };
        let _adapter = spawn_adapter(&hub, session, |req| AdapterAck {
            released: Some(3),
            ..AdapterAck::ok(req.request_id)
        });
        let released = hub
            .close(&VzpId::generate(), &SpaceHandle::new("category-1"))
            .await;
        assert_eq!(released, Ok(3));
    }

    #[tokio::test]
    async fn adapter_error_fails_the_request() {
        let hub = hub();
        let Some(session) = hub.register(None).await else {
            panic!("registration refused");
        };
        let _adapter = spawn_adapter(&hub, session, |req| AdapterAck {
            error: Some("DMs closed".to_string()),
            ..AdapterAck::ok(req.request_id)
        });
        let result = hub
            .send_direct(UserId::new(5), &Notice::new("Removed", "bye"))
            .await;
        assert!(matches!(
            result,
            Err(CollaboratorError::Failed { service: "notifier", .. })
        ));
    }

    #[tokio::test]
    async fn missing_ack_times_out() {
        let hub = Arc::new(AdapterHub::new(Duration::from_millis(20), None));
        let Some(_session) = hub.register(None).await else {
            panic!("registration refused");
        };
        let result = hub.broadcast("@everyone").await;
        assert!(matches!(result, Err(CollaboratorError::Failed { .. })));
    }

    #[tokio::test]
    async fn disconnect_fails_outstanding_requests() {
        let hub = hub();
        let Some(mut session) = hub.register(None).await else {
            panic!("registration refused");
        };
        let pending = {
            let hub = Arc::clone(&hub);
            tokio::spawn(async move { hub.broadcast("@everyone").await })
        };
        let Some(_request) = session.requests.recv().await else {
            panic!("request not forwarded");
        };
        hub.unregister(session.link_id).await;

        let Ok(result) = pending.await else {
            panic!("request task");
        };
        assert_eq!(result, Err(CollaboratorError::Unavailable));
        assert!(!hub.is_connected().await);
    }

    #[tokio::test]
    async fn token_guards_registration_and_replacement_revokes_acks() {
        let hub = AdapterHub::new(Duration::from_secs(1), Some("s3cret".to_string()));
        assert!(hub.register(None).await.is_none());
        assert!(hub.register(Some("wrong")).await.is_none());

        let Some(first) = hub.register(Some("s3cret")).await else {
            panic!("registration refused");
        };
        let Some(_second) = hub.register(Some("s3cret")).await else {
            panic!("registration refused");
        };
        let stale = AdapterAck::ok(Uuid::new_v4());
        assert!(!hub.acknowledge(first.link_id, stale).await);
    }

    #[test]
    fn requests_serialize_with_kind_tag() {
        let request = PlatformRequest::Broadcast {
            text: "hi".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap_or_default();
        assert_eq!(json["request"], "broadcast");
        assert_eq!(request.kind(), "broadcast");
    }
}
