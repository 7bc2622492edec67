use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::domain::item::OwnerId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// User-facing message emitted alongside the structured result of an
/// operation. Transport is up to the sink (toast, log line, push).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub owner_id: OwnerId,
    pub level: NoticeLevel,
    pub code: String,
    pub message: String,
}

impl Notice {
    pub fn new(
        owner_id: &OwnerId,
        level: NoticeLevel,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self { owner_id: owner_id.clone(), level, code: code.into(), message: message.into() }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Forwards notices to the tracing subscriber.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => tracing::error!(
                event_name = "notice.emitted",
                owner_id = %notice.owner_id,
                code = %notice.code,
                "{}",
                notice.message
            ),
            NoticeLevel::Warning => tracing::warn!(
                event_name = "notice.emitted",
                owner_id = %notice.owner_id,
                code = %notice.code,
                "{}",
                notice.message
            ),
            NoticeLevel::Info | NoticeLevel::Success => tracing::info!(
                event_name = "notice.emitted",
                owner_id = %notice.owner_id,
                code = %notice.code,
                "{}",
                notice.message
            ),
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl InMemoryNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(notices) => notices.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn codes(&self) -> Vec<String> {
        self.notices().into_iter().map(|notice| notice.code).collect()
    }
}

impl Notifier for InMemoryNotifier {
    fn notify(&self, notice: Notice) {
        match self.notices.lock() {
            Ok(mut notices) => notices.push(notice),
            Err(poisoned) => poisoned.into_inner().push(notice),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryNotifier, Notice, NoticeLevel, Notifier};
    use crate::domain::item::OwnerId;

    #[test]
    fn in_memory_notifier_records_notices_in_order() {
        let notifier = InMemoryNotifier::default();
        let owner = OwnerId("owner-1".to_owned());
        notifier.notify(Notice::new(&owner, NoticeLevel::Info, "plan.in_progress", "busy"));
        notifier.notify(Notice::new(&owner, NoticeLevel::Success, "plan.generated", "done"));

        assert_eq!(notifier.codes(), vec!["plan.in_progress", "plan.generated"]);
        assert_eq!(notifier.notices()[1].level, NoticeLevel::Success);
    }
}
