//! Intervention log and the on-screen intervention bubble.

use crate::biometrics::CognitiveState;
use crate::protocol::{InterventionMessage, Outbound};
use crate::timer::Deferred;
use crate::Color;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use tracing::debug;

/// Intervention urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Informational
    Low,
    /// Normal
    #[default]
    Medium,
    /// Important
    High,
    /// Needs immediate attention; gets full-screen treatment
    Critical,
}

impl Priority {
    /// Log entry accent color.
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Critical => Color::ALARM,
            Self::High => Color::CAUTION,
            Self::Medium => Color::CALM,
            Self::Low => Color::DIM,
        }
    }

    /// Upper-case label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

/// A received intervention.
#[derive(Debug, Clone, PartialEq)]
pub struct Intervention {
    /// Text shown to the user
    pub message: String,
    /// Urgency
    pub priority: Priority,
    /// State at emission time, if recognized
    pub state: Option<CognitiveState>,
    /// Response button labels
    pub buttons: Vec<String>,
    /// Biometric snapshot
    pub biometric: Map<String, Value>,
    /// Attached code snippet
    pub code_suggestion: Option<String>,
    /// Server-side emission time, as sent
    pub timestamp: Option<String>,
    /// Local receive time (monotonic ms)
    pub received_ms: u64,
}

impl Intervention {
    /// Build from a wire message received at `now_ms`.
    #[must_use]
    pub fn from_message(message: InterventionMessage, now_ms: u64) -> Self {
        let state = message.state.as_deref().and_then(|s| s.parse().ok());
        Self {
            message: message.message,
            priority: message.priority,
            state,
            buttons: message.buttons,
            biometric: message.biometric,
            code_suggestion: message.code_suggestion,
            timestamp: message.timestamp,
            received_ms: now_ms,
        }
    }

    /// Whether this needs full-screen treatment.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.priority == Priority::Critical
    }
}

/// Newest-first log of recent interventions with a lifetime counter.
#[derive(Debug, Clone)]
pub struct InterventionLog {
    entries: VecDeque<Intervention>,
    capacity: usize,
    total: u64,
}

impl InterventionLog {
    /// Default number of retained entries.
    pub const DEFAULT_CAPACITY: usize = 8;

    /// Create an empty log.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            total: 0,
        }
    }

    /// Prepend an entry, evicting the oldest when full.
    pub fn push(&mut self, intervention: Intervention) {
        self.entries.push_front(intervention);
        self.entries.truncate(self.capacity);
        self.total += 1;
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Intervention> {
        self.entries.iter()
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Interventions received over the log's lifetime.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }
}

impl Default for InterventionLog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// The intervention currently shown as a speech bubble.
///
/// Non-critical bubbles dismiss themselves after the auto-dismiss delay;
/// critical ones stay until the user responds.
#[derive(Debug, Clone)]
pub struct InterventionBubble {
    current: Option<Intervention>,
    auto_dismiss: Deferred,
}

impl InterventionBubble {
    /// Create an empty bubble with the given auto-dismiss delay.
    #[must_use]
    pub const fn new(auto_dismiss_ms: u64) -> Self {
        Self {
            current: None,
            auto_dismiss: Deferred::new("bubble-auto-dismiss", auto_dismiss_ms),
        }
    }

    /// Show an intervention, replacing any current one.
    pub fn show(&mut self, intervention: Intervention, now_ms: u64) {
        if intervention.is_critical() {
            self.auto_dismiss.cancel();
        } else {
            self.auto_dismiss.schedule(now_ms);
        }
        self.current = Some(intervention);
    }

    /// Run the auto-dismiss timer. Returns the dismissed intervention, if any.
    pub fn poll(&mut self, now_ms: u64) -> Option<Intervention> {
        if self.auto_dismiss.fire(now_ms) {
            debug!("intervention bubble auto-dismissed");
            return self.current.take();
        }
        None
    }

    /// Respond with button `index`. Returns the feedback to send.
    pub fn press(&mut self, index: usize, timestamp: String) -> Option<Outbound> {
        let label = self.current.as_ref()?.buttons.get(index)?.clone();
        self.dismiss();
        Some(Outbound::feedback(label, timestamp))
    }

    /// Hide the bubble and cancel its timer.
    pub fn dismiss(&mut self) -> Option<Intervention> {
        self.auto_dismiss.cancel();
        self.current.take()
    }

    /// The shown intervention.
    #[must_use]
    pub const fn current(&self) -> Option<&Intervention> {
        self.current.as_ref()
    }

    /// Whether a critical intervention is on screen.
    #[must_use]
    pub fn is_critical_active(&self) -> bool {
        self.current.as_ref().is_some_and(Intervention::is_critical)
    }

    /// Whether the auto-dismiss timer is armed.
    #[must_use]
    pub const fn has_pending_timer(&self) -> bool {
        self.auto_dismiss.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intervention(message: &str, priority: Priority) -> Intervention {
        Intervention {
            message: message.to_string(),
            priority,
            state: None,
            buttons: vec!["I Understand".to_string(), "Snooze".to_string()],
            biometric: Map::new(),
            code_suggestion: None,
            timestamp: None,
            received_ms: 0,
        }
    }

    #[test]
    fn test_log_newest_first_and_capped() {
        let mut log = InterventionLog::default();
        for i in 0..10 {
            log.push(intervention(&format!("m{i}"), Priority::Low));
        }
        assert_eq!(log.len(), 8);
        assert_eq!(log.total(), 10);
        assert_eq!(log.iter().next().unwrap().message, "m9");
        assert_eq!(log.iter().last().unwrap().message, "m2");
    }

    #[test]
    fn test_from_message_parses_state() {
        let msg = InterventionMessage {
            message: "Take a break".to_string(),
            priority: Priority::High,
            state: Some("FATIGUED".to_string()),
            buttons: vec![],
            biometric: Map::new(),
            code_suggestion: None,
            timestamp: Some("2025-01-01T12:00:00Z".to_string()),
        };
        let i = Intervention::from_message(msg, 42);
        assert_eq!(i.state, Some(CognitiveState::Fatigued));
        assert_eq!(i.timestamp.as_deref(), Some("2025-01-01T12:00:00Z"));
        assert_eq!(i.received_ms, 42);
    }

    #[test]
    fn test_bubble_auto_dismiss_non_critical() {
        let mut bubble = InterventionBubble::new(15_000);
        bubble.show(intervention("hi", Priority::Medium), 1000);
        assert!(bubble.has_pending_timer());
        assert!(bubble.poll(15_999).is_none());
        assert_eq!(bubble.poll(16_000).unwrap().message, "hi");
        assert!(bubble.current().is_none());
    }

    #[test]
    fn test_bubble_critical_stays() {
        let mut bubble = InterventionBubble::new(15_000);
        bubble.show(intervention("low", Priority::Low), 0);
        bubble.show(intervention("alert", Priority::Critical), 100);
        assert!(!bubble.has_pending_timer());
        assert!(bubble.poll(1_000_000).is_none());
        assert!(bubble.is_critical_active());
    }

    #[test]
    fn test_bubble_press_sends_feedback_and_cancels_timer() {
        let mut bubble = InterventionBubble::new(15_000);
        bubble.show(intervention("hi", Priority::Medium), 0);
        let out = bubble.press(1, "t".to_string());
        assert_eq!(
            out,
            Some(Outbound::Feedback {
                action: "Snooze".to_string(),
                timestamp: "t".to_string()
            })
        );
        assert!(!bubble.has_pending_timer());
        assert!(bubble.press(0, "t".to_string()).is_none());
    }

    #[test]
    fn test_bubble_press_out_of_range_keeps_bubble() {
        let mut bubble = InterventionBubble::new(15_000);
        bubble.show(intervention("hi", Priority::Medium), 0);
        assert!(bubble.press(5, "t".to_string()).is_none());
        assert!(bubble.current().is_some());
    }

    #[test]
    fn test_priority_wire_and_colors() {
        let p: Priority = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(p, Priority::Critical);
        assert_eq!(Priority::Low.color(), Color::DIM);
        assert_eq!(Priority::Medium.color(), Color::CALM);
    }
}
