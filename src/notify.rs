use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_TOAST_SECONDS: i64 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
    Warning,
}

impl Severity {
    pub fn icon(self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Error => "✕",
            Self::Info => "ℹ",
            Self::Warning => "⚠",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub severity: Severity,
    pub message: String,
    pub shown_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Notice queue. Each toast carries its own deadline, fixed when it is
/// pushed; stale toasts are hidden on read and evicted on the next push.
#[derive(Clone, Debug)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    next_id: u64,
    lifetime: Duration,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TOAST_SECONDS))
    }
}

impl ToastQueue {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            next_id: 1,
            lifetime,
        }
    }

    pub fn push(&mut self, severity: Severity, message: String) -> u64 {
        self.push_at(severity, message, Utc::now())
    }

    pub fn push_at(&mut self, severity: Severity, message: String, now: DateTime<Utc>) -> u64 {
        self.expire(now);
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            severity,
            message,
            shown_at: now,
            expires_at: now
                .checked_add_signed(self.lifetime)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        });
        id
    }

    /// Toasts still on screen at `now`, oldest first.
    pub fn visible(&self, now: DateTime<Utc>) -> Vec<Toast> {
        self.toasts
            .iter()
            .filter(|toast| toast.expires_at > now)
            .cloned()
            .collect()
    }

    /// Removes and returns every toast whose deadline has passed.
    pub fn expire(&mut self, now: DateTime<Utc>) -> Vec<Toast> {
        let (expired, kept): (Vec<Toast>, Vec<Toast>) = std::mem::take(&mut self.toasts)
            .into_iter()
            .partition(|toast| toast.expires_at <= now);
        self.toasts = kept;
        expired
    }
}
