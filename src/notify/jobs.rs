use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::registry::models::RegistryEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewBox,
    DeadlineReminder,
}

/// One outbound announcement, ready to be sent to every subscriber.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationJob {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub box_name: String,
    pub location: String,
    pub deadline_text: Option<String>,
    pub payment_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NotificationJob {
    pub fn new_box(entry: &RegistryEntry) -> Self {
        Self::from_entry(NotificationKind::NewBox, entry)
    }

    pub fn deadline_reminder(entry: &RegistryEntry) -> Self {
        Self::from_entry(NotificationKind::DeadlineReminder, entry)
    }

    fn from_entry(kind: NotificationKind, entry: &RegistryEntry) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            box_name: entry.name.clone(),
            location: entry.location.clone(),
            deadline_text: entry.deadline_text.clone(),
            payment_instructions: entry.payment_instructions.clone(),
            created_at: Utc::now(),
        }
    }

    /// The dedup key this job was recorded under.
    pub fn dedup_key(&self) -> String {
        match self.kind {
            NotificationKind::NewBox => format!("{}|{}", self.box_name, self.location),
            NotificationKind::DeadlineReminder => {
                format!("{}|{}|reminder", self.box_name, self.location)
            }
        }
    }

    /// Message text shown to subscribers.
    pub fn message_text(&self) -> String {
        let mut text = match self.kind {
            NotificationKind::NewBox => format!("📦 New box is open: {}", self.box_name),
            NotificationKind::DeadlineReminder => {
                format!("⏰ Payment deadline is close for: {}", self.box_name)
            }
        };

        if let Some(deadline) = &self.deadline_text {
            text.push_str(&format!("\nDeadline: {deadline}"));
        }
        if let Some(instructions) = &self.payment_instructions {
            text.push_str(&format!("\nPay to: {instructions}"));
        }

        text
    }
}
