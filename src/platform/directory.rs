//! In-memory role directory kept in sync by the platform adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CollaboratorError, MemberProfile, RoleDirectory};
use crate::domain::UserId;

/// Member roles and names as last reported by the adapter.
///
/// The adapter pushes a profile whenever a member's roles or name change
/// (and before forwarding an interaction from an unseen member).
#[derive(Debug, Default)]
pub struct MemberDirectory {
    members: RwLock<HashMap<UserId, MemberProfile>>,
}

impl MemberDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a member profile. Returns `true` if the member
    /// was not known before.
    pub async fn upsert(&self, user: UserId, profile: MemberProfile) -> bool {
        self.members.write().await.insert(user, profile).is_none()
    }

    /// Forgets a member. Returns `true` if the member was known.
    pub async fn remove(&self, user: UserId) -> bool {
        self.members.write().await.remove(&user).is_some()
    }

    /// Returns the number of known members.
    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    /// Returns `true` if no member is known.
    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }
}

#[async_trait]
impl RoleDirectory for MemberDirectory {
    async fn member(&self, user: UserId) -> Result<Option<MemberProfile>, CollaboratorError> {
        Ok(self.members.read().await.get(&user).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::RoleId;

    fn profile(name: &str, roles: &[u64]) -> MemberProfile {
        MemberProfile {
            display_name: name.to_string(),
            roles: roles.iter().copied().map(RoleId::new).collect(),
        }
    }

    #[tokio::test]
    async fn upsert_then_lookup() {
        let dir = MemberDirectory::new();
        assert!(dir.upsert(UserId::new(1), profile("alpha", &[10])).await);
        assert!(!dir.upsert(UserId::new(1), profile("alpha", &[10, 11])).await);

        let Ok(Some(found)) = dir.member(UserId::new(1)).await else {
            panic!("member not found");
        };
        assert_eq!(found.roles.len(), 2);
        assert_eq!(dir.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_member_is_none() {
        let dir = MemberDirectory::new();
        assert!(matches!(dir.member(UserId::new(9)).await, Ok(None)));
        assert!(dir.is_empty().await);
    }

    #[tokio::test]
    async fn remove_forgets_member() {
        let dir = MemberDirectory::new();
        dir.upsert(UserId::new(1), profile("alpha", &[])).await;
        assert!(dir.remove(UserId::new(1)).await);
        assert!(!dir.remove(UserId::new(1)).await);
    }
}
