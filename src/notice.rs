//! Dismissible banners shown to the user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub id: Uuid,
    pub level: NoticeLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Banners waiting to be dismissed, oldest first.
#[derive(Debug, Clone, Default)]
pub struct NoticeBoard {
    notices: Vec<Notice>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) -> Uuid {
        self.push(NoticeLevel::Warning, message.into())
    }

    pub fn error(&mut self, message: impl Into<String>) -> Uuid {
        self.push(NoticeLevel::Error, message.into())
    }

    fn push(&mut self, level: NoticeLevel, message: String) -> Uuid {
        let id = Uuid::new_v4();
        self.notices.push(Notice {
            id,
            level,
            message,
            created_at: Utc::now(),
        });
        id
    }

    /// Removes a banner; returns false if it was already gone.
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() != before
    }

    pub fn active(&self) -> &[Notice] {
        &self.notices
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }
}
