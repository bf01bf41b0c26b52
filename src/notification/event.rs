use std::fmt::Display;

/// Kind of operation that produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Created,
    Retrieved,
    Updated,
    Deleted,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Created => "Created",
            ActionKind::Retrieved => "Retrieved",
            ActionKind::Updated => "Updated",
            ActionKind::Deleted => "Deleted",
        }
    }
}

impl Display for ActionKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single user-facing notification.
///
/// `subject` is the email of the created record for `Created`, and the
/// identifier exactly as the caller supplied it for every other action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationEvent {
    pub subject: String,
    pub action: ActionKind,
}

impl MutationEvent {
    pub fn new(
        subject: impl Into<String>,
        action: ActionKind,
    ) -> Self {
        Self {
            subject: subject.into(),
            action,
        }
    }
}

/// Renders the text delivered to subscribers.
impl Display for MutationEvent {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "User action performed: {} - {}", self.subject, self.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_rendering() {
        let event = MutationEvent::new("a@a.com", ActionKind::Created);
        assert_eq!(event.to_string(), "User action performed: a@a.com - Created");

        let event = MutationEvent::new("65a1f0c2b3d4e5f601234567", ActionKind::Deleted);
        assert_eq!(
            event.to_string(),
            "User action performed: 65a1f0c2b3d4e5f601234567 - Deleted"
        );
    }

    #[test]
    fn test_action_kind_names() {
        assert_eq!(ActionKind::Retrieved.to_string(), "Retrieved");
        assert_eq!(ActionKind::Updated.as_str(), "Updated");
    }
}
