//! Outbound message payloads.

use serde::Serialize;

use crate::domain::VzpId;

/// Name/value line of a [`Notice`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticeField {
    /// Field label.
    pub name: String,
    /// Field value.
    pub value: String,
}

/// A direct message to a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Message title.
    pub title: String,
    /// Message body.
    pub body: String,
    /// Event the message is about, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vzp_id: Option<VzpId>,
    /// Extra name/value lines.
    pub fields: Vec<NoticeField>,
}

impl Notice {
    /// Creates a notice without fields.
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            vzp_id: None,
            fields: Vec::new(),
        }
    }

    /// Scopes the notice to an event.
    #[must_use]
    pub fn for_vzp(mut self, id: &VzpId) -> Self {
        self.vzp_id = Some(id.clone());
        self
    }

    /// Appends a name/value line.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(NoticeField {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

/// Channels created for a running event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpaceLayout {
    /// Category name.
    pub category: String,
    /// Voice channel name.
    pub voice: String,
    /// Text channel names.
    pub text: Vec<String>,
}

impl SpaceLayout {
    /// Standard layout: one voice channel and two text channels.
    #[must_use]
    pub fn for_vzp(id: &VzpId) -> Self {
        Self {
            category: format!("VZP ID - {id}"),
            voice: "vzp voice".to_string(),
            text: vec!["vzp flood".to_string(), "vzp call".to_string()],
        }
    }

    /// Number of platform objects the layout creates, category included.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.text.len() + 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_fields() {
        let id = VzpId::generate();
        let notice = Notice::new("Started", "Join voice")
            .for_vzp(&id)
            .field("Time", "20:00");
        assert_eq!(notice.vzp_id, Some(id));
        assert_eq!(notice.fields.len(), 1);
    }

    #[test]
    fn standard_layout_counts_category() {
        let layout = SpaceLayout::for_vzp(&VzpId::generate());
        assert_eq!(layout.channel_count(), 4);
        assert!(layout.category.starts_with("VZP ID - "));
    }
}
