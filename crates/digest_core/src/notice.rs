pub type NoticeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Danger,
}

/// A dismissible banner shown at the top of the main view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: NoticeId,
    pub severity: Severity,
    pub message: String,
}

/// Stack of live notices, newest first. Each notice is removed on its own,
/// either by the user or by its expiry timer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct NoticeBoard {
    next_id: NoticeId,
    notices: Vec<Notice>,
}

impl NoticeBoard {
    pub(crate) fn push(&mut self, severity: Severity, message: String) -> NoticeId {
        self.next_id += 1;
        let id = self.next_id;
        self.notices.insert(
            0,
            Notice {
                id,
                severity,
                message,
            },
        );
        id
    }

    pub(crate) fn remove(&mut self, id: NoticeId) -> bool {
        let before = self.notices.len();
        self.notices.retain(|notice| notice.id != id);
        self.notices.len() != before
    }

    pub(crate) fn as_slice(&self) -> &[Notice] {
        &self.notices
    }
}
