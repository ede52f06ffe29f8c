//! Seams to the chat platform.
//!
//! The service never talks to the platform directly. It resolves roles
//! through a [`RoleDirectory`], sends DMs and broadcasts through a
//! [`Notifier`], opens and releases channel groupings through a
//! [`SpaceManager`] and publishes posts through a [`Presenter`].
//! [`MemberDirectory`] and [`AdapterHub`] are the implementations wired by
//! the server binary.

pub mod adapter;
pub mod directory;
pub mod notice;

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{PresentationHandle, RoleId, SpaceHandle, UserId, VzpId};
use crate::render::RenderedVzp;

pub use adapter::{AdapterAck, AdapterHub, AdapterRequest, AdapterSession, PlatformRequest};
pub use directory::MemberDirectory;
pub use notice::{Notice, NoticeField, SpaceLayout};

/// Failure reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// No platform adapter is connected to carry out the request.
    #[error("no platform adapter is connected")]
    Unavailable,

    /// The collaborator refused or failed the request.
    #[error("{service} failed: {reason}")]
    Failed {
        /// Collaborator that failed (e.g. `"notifier"`).
        service: &'static str,
        /// Human-readable reason.
        reason: String,
    },
}

/// Role and display-name information about a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberProfile {
    /// Name shown in rendered posts.
    pub display_name: String,
    /// Roles the member currently holds.
    pub roles: Vec<RoleId>,
}

/// Resolves members to their roles.
#[async_trait]
pub trait RoleDirectory: std::fmt::Debug + Send + Sync {
    /// Looks up a member. `Ok(None)` means the member is unknown.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] if the lookup itself failed.
    async fn member(&self, user: UserId) -> Result<Option<MemberProfile>, CollaboratorError>;
}

/// Delivers messages to members.
#[async_trait]
pub trait Notifier: std::fmt::Debug + Send + Sync {
    /// Sends a direct message.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] if the message was not delivered.
    async fn send_direct(&self, user: UserId, notice: &Notice) -> Result<(), CollaboratorError>;

    /// Posts a message in the command channel.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] if the message was not posted.
    async fn broadcast(&self, text: &str) -> Result<(), CollaboratorError>;
}

/// Manages the temporary channel grouping of a running event.
#[async_trait]
pub trait SpaceManager: std::fmt::Debug + Send + Sync {
    /// Creates a grouping visible to `members` and moves them into voice.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] if the grouping was not created.
    async fn open(
        &self,
        vzp_id: &VzpId,
        members: &[UserId],
    ) -> Result<SpaceHandle, CollaboratorError>;

    /// Deletes a grouping. Returns the number of channels released.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] if the grouping was not deleted.
    async fn close(&self, vzp_id: &VzpId, handle: &SpaceHandle)
    -> Result<usize, CollaboratorError>;

    /// Grants or revokes a member's access to a grouping.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] if the permission change failed.
    async fn set_access(
        &self,
        vzp_id: &VzpId,
        handle: &SpaceHandle,
        user: UserId,
        granted: bool,
    ) -> Result<(), CollaboratorError>;
}

/// Publishes the rendered event post.
#[async_trait]
pub trait Presenter: std::fmt::Debug + Send + Sync {
    /// Creates the post when `handle` is `None`, edits it otherwise.
    /// Returns the handle of the post.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] if the post was not updated.
    async fn present(
        &self,
        vzp_id: &VzpId,
        rendered: &RenderedVzp,
        handle: Option<&PresentationHandle>,
    ) -> Result<PresentationHandle, CollaboratorError>;
}

/// The full set of collaborators the service depends on.
#[derive(Debug, Clone)]
pub struct Collaborators {
    /// Role resolution.
    pub directory: Arc<dyn RoleDirectory>,
    /// DMs and broadcasts.
    pub notifier: Arc<dyn Notifier>,
    /// Temporary channel groupings.
    pub spaces: Arc<dyn SpaceManager>,
    /// Event posts.
    pub presenter: Arc<dyn Presenter>,
}

impl Collaborators {
    /// Wires a role directory with the adapter hub serving the three
    /// outbound seams.
    #[must_use]
    pub fn over_adapter(directory: Arc<dyn RoleDirectory>, hub: Arc<AdapterHub>) -> Self {
        Self {
            directory,
            notifier: Arc::clone(&hub) as Arc<dyn Notifier>,
            spaces: Arc::clone(&hub) as Arc<dyn SpaceManager>,
            presenter: hub,
        }
    }
}
