//! 通知（toast）分发 / Toast notification sink
//!
//! 显式构造并注入的通知通道：有界队列，超出上限时淘汰最旧的通知；
//! `shutdown` 之后的通知被忽略。
//! An explicitly constructed notification sink with a bounded queue (oldest
//! evicted first); raises after `shutdown` are ignored.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_MAX_VISIBLE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
    Warning,
    Loading,
}

impl ToastKind {
    /// Bootstrap 配色 / Bootstrap contextual variant
    pub fn variant(&self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "danger",
            ToastKind::Info => "info",
            ToastKind::Warning => "warning",
            ToastKind::Loading => "secondary",
        }
    }

    pub fn default_title(&self) -> &'static str {
        match self {
            ToastKind::Success => "Success",
            ToastKind::Error => "Error",
            ToastKind::Info => "Info",
            ToastKind::Warning => "Warning",
            ToastKind::Loading => "Working",
        }
    }
}

/// 各类通知默认停留时长（毫秒） / Default display time per kind, in ms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Durations {
    pub success_ms: u64,
    pub error_ms: u64,
    pub info_ms: u64,
    pub warning_ms: u64,
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            success_ms: 2000,
            error_ms: 4000,
            info_ms: 3000,
            warning_ms: 3000,
        }
    }
}

impl Durations {
    /// loading 类型常驻直到关闭 / Loading toasts stay until closed
    fn for_kind(&self, kind: ToastKind) -> Option<u64> {
        match kind {
            ToastKind::Success => Some(self.success_ms),
            ToastKind::Error => Some(self.error_ms),
            ToastKind::Info => Some(self.info_ms),
            ToastKind::Warning => Some(self.warning_ms),
            ToastKind::Loading => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ToastOptions {
    pub key: Option<String>,
    pub duration_ms: Option<u64>,
    pub title: Option<String>,
}

impl ToastOptions {
    pub fn keyed(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub key: String,
    pub kind: ToastKind,
    pub title: String,
    pub body: String,
    pub raised_at: Instant,
    /// `None` 表示常驻 / `None` means sticky
    pub duration: Option<Duration>,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        match self.duration {
            Some(d) => now.saturating_duration_since(self.raised_at) >= d,
            None => false,
        }
    }

    pub fn autohide(&self) -> bool {
        self.duration.is_some()
    }

    pub fn delay_ms(&self) -> u64 {
        self.duration.map(|d| d.as_millis() as u64).unwrap_or(0)
    }
}

struct NotifierInner {
    queue: VecDeque<Toast>,
    max_visible: usize,
    durations: Durations,
    shut_down: bool,
}

/// 可克隆的通知句柄，克隆体共享同一队列
/// Cloneable handle; clones share one queue
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Mutex<NotifierInner>>,
    counter: Arc<AtomicU64>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VISIBLE)
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Notifier")
            .field("queued", &inner.queue.len())
            .field("max_visible", &inner.max_visible)
            .field("shut_down", &inner.shut_down)
            .finish()
    }
}

impl Notifier {
    pub fn new(max_visible: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(NotifierInner {
                queue: VecDeque::new(),
                max_visible: max_visible.max(1),
                durations: Durations::default(),
                shut_down: false,
            })),
            counter: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn set_durations(&self, durations: Durations) {
        self.inner.lock().durations = durations;
    }

    pub fn durations(&self) -> Durations {
        self.inner.lock().durations
    }

    pub fn success(&self, body: impl Into<String>, opts: ToastOptions) -> Option<String> {
        self.raise(ToastKind::Success, body.into(), opts)
    }

    pub fn error(&self, body: impl Into<String>, opts: ToastOptions) -> Option<String> {
        self.raise(ToastKind::Error, body.into(), opts)
    }

    pub fn info(&self, body: impl Into<String>, opts: ToastOptions) -> Option<String> {
        self.raise(ToastKind::Info, body.into(), opts)
    }

    pub fn warning(&self, body: impl Into<String>, opts: ToastOptions) -> Option<String> {
        self.raise(ToastKind::Warning, body.into(), opts)
    }

    /// 常驻通知，返回用于关闭的 key / Sticky toast; returns the key to close it with
    pub fn loading(&self, body: impl Into<String>, opts: ToastOptions) -> Option<String> {
        self.raise(ToastKind::Loading, body.into(), opts)
    }

    /// 同 key 的通知原位替换 / A toast with an existing key is replaced in place
    pub fn raise(&self, kind: ToastKind, body: String, opts: ToastOptions) -> Option<String> {
        let mut inner = self.inner.lock();
        if inner.shut_down {
            tracing::debug!(?kind, "notifier shut down, dropping toast");
            return None;
        }
        let key = opts.key.unwrap_or_else(|| self.gen_key());
        let duration = opts
            .duration_ms
            .or_else(|| inner.durations.for_kind(kind))
            .map(Duration::from_millis);
        let toast = Toast {
            key: key.clone(),
            kind,
            title: opts
                .title
                .unwrap_or_else(|| kind.default_title().to_string()),
            body,
            raised_at: Instant::now(),
            duration,
        };

        if let Some(slot) = inner.queue.iter_mut().find(|t| t.key == key) {
            *slot = toast;
            return Some(key);
        }
        inner.queue.push_back(toast);
        while inner.queue.len() > inner.max_visible {
            if let Some(evicted) = inner.queue.pop_front() {
                tracing::debug!(key = %evicted.key, "evicting oldest toast");
            }
        }
        Some(key)
    }

    pub fn close(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.queue.len();
        inner.queue.retain(|t| t.key != key);
        inner.queue.len() != before
    }

    /// 当前可见通知（顺带清理过期项） / Visible toasts, pruning expired ones
    pub fn visible(&self) -> Vec<Toast> {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        inner.queue.retain(|t| !t.is_expired(now));
        inner.queue.iter().cloned().collect()
    }

    /// 取出全部可见通知并清空 / Take all visible toasts, leaving the queue empty
    pub fn drain(&self) -> Vec<Toast> {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        inner.queue.drain(..).filter(|t| !t.is_expired(now)).collect()
    }

    /// 结束生命周期：清空队列并拒绝后续通知
    /// End the lifecycle: clear the queue and refuse further raises
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock();
        inner.shut_down = true;
        inner.queue.clear();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.lock().shut_down
    }

    fn gen_key(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("toast_{}_{}", chrono::Utc::now().timestamp_millis(), n)
    }
}
