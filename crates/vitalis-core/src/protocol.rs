//! Wire protocol: JSON envelopes discriminated by a `type` field.
//!
//! Inbound messages are decoded in two steps so that an unknown `type` can be
//! told apart from a known one with bad fields; both are dropped by the
//! transport, but they are logged differently.

use crate::biometrics::CognitiveState;
use crate::error::ProtocolError;
use crate::interventions::Priority;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Partial biometric reading as sent by the server.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BiometricUpdate {
    /// Data source (e.g. `whoop`, `mock`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Beats per minute
    #[serde(
        default,
        rename = "heartRate",
        alias = "heart_rate",
        skip_serializing_if = "Option::is_none"
    )]
    pub heart_rate: Option<f64>,
    /// Heart-rate variability (ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrv: Option<f64>,
    /// Recovery score (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery: Option<f64>,
    /// Day strain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strain: Option<f64>,
    /// Estimated stress (0-3)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_stress: Option<f64>,
    /// Cognitive state name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Sleep performance (%)
    #[serde(
        default,
        rename = "sleepPerformance",
        skip_serializing_if = "Option::is_none"
    )]
    pub sleep_performance: Option<f64>,
    /// Blood oxygen saturation (%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spo2: Option<f64>,
    /// Skin temperature (°C)
    #[serde(default, rename = "skinTemp", skip_serializing_if = "Option::is_none")]
    pub skin_temp: Option<f64>,
}

impl BiometricUpdate {
    /// Parsed cognitive state, if present and recognized.
    #[must_use]
    pub fn cognitive_state(&self) -> Option<CognitiveState> {
        self.state.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Intervention payload as sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionMessage {
    /// Text shown to the user
    pub message: String,
    /// Urgency
    #[serde(default)]
    pub priority: Priority,
    /// Cognitive state that prompted the intervention
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Response button labels
    #[serde(default)]
    pub buttons: Vec<String>,
    /// Biometric snapshot at emission time
    #[serde(default)]
    pub biometric: Map<String, Value>,
    /// Optional code snippet attached to the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_suggestion: Option<String>,
    /// Server-side timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Messages received from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    /// Handshake acknowledgement
    ConnectionEstablished {
        /// Server-assigned session id
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        /// State the server currently believes the user is in
        #[serde(default, skip_serializing_if = "Option::is_none")]
        current_state: Option<String>,
    },
    /// New biometric reading
    BiometricUpdate(BiometricUpdate),
    /// Discrete cognitive-state transition
    StateChange {
        /// Previous state
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<CognitiveState>,
        /// New state
        to: CognitiveState,
        /// Why the classifier switched
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        /// Stress estimate accompanying the transition
        #[serde(default, skip_serializing_if = "Option::is_none")]
        estimated_stress: Option<f64>,
    },
    /// Coaching message for the user
    Intervention(InterventionMessage),
    /// Sleep mode toggled
    SleepMode {
        /// Whether sleep mode is now on
        active: bool,
    },
    /// Plant health change
    PlantUpdate {
        /// Absolute health (0-100)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        health: Option<f64>,
        /// Relative adjustment
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delta: Option<f64>,
    },
    /// Another client changed focus
    AppFocusChange {
        /// Focused app, if any
        #[serde(default, skip_serializing_if = "Option::is_none")]
        app_type: Option<String>,
    },
}

impl Inbound {
    /// Every `type` value this client understands.
    pub const KNOWN_TYPES: [&'static str; 7] = [
        "connection_established",
        "biometric_update",
        "state_change",
        "intervention",
        "sleep_mode",
        "plant_update",
        "app_focus_change",
    ];

    /// Decode an envelope.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingType)?
            .to_string();
        if !Self::KNOWN_TYPES.contains(&kind.as_str()) {
            return Err(ProtocolError::UnknownType(kind));
        }
        serde_json::from_value(value).map_err(|source| ProtocolError::Malformed { kind, source })
    }

    /// Wire `type` of this message.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionEstablished { .. } => "connection_established",
            Self::BiometricUpdate(_) => "biometric_update",
            Self::StateChange { .. } => "state_change",
            Self::Intervention(_) => "intervention",
            Self::SleepMode { .. } => "sleep_mode",
            Self::PlantUpdate { .. } => "plant_update",
            Self::AppFocusChange { .. } => "app_focus_change",
        }
    }
}

/// Messages sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    /// Edited document content (debounced)
    ContentUpdate {
        /// Document key
        app_type: String,
        /// Full content
        content: String,
        /// Extra fields spread into the envelope
        #[serde(flatten)]
        metadata: Map<String, Value>,
        /// RFC 3339 timestamp
        timestamp: String,
    },
    /// User pressed an intervention button
    Feedback {
        /// Button label
        action: String,
        /// RFC 3339 timestamp
        timestamp: String,
    },
    /// Force a cognitive state (demo presets 1-5)
    MockState {
        /// Preset number
        state: u8,
    },
    /// Local focus changed
    AppFocus {
        /// Focused app, `null` when none
        app_type: Option<String>,
        /// RFC 3339 timestamp
        timestamp: String,
    },
    /// Live reading from a heart-rate strap
    LiveHr {
        /// Beats per minute
        heart_rate: u16,
    },
    /// Heart-rate strap came back
    BleReconnected,
    /// Heart-rate strap went away
    BleDisconnected,
}

impl Outbound {
    /// Envelope keys metadata may not override.
    const RESERVED_KEYS: [&'static str; 4] = ["type", "app_type", "content", "timestamp"];

    /// Lowest heart rate the server accepts as live.
    pub const LIVE_HR_MIN: u16 = 31;
    /// Highest heart rate the server accepts as live.
    pub const LIVE_HR_MAX: u16 = 219;

    /// Content update with reserved metadata keys stripped.
    #[must_use]
    pub fn content_update(
        document: impl Into<String>,
        content: impl Into<String>,
        mut metadata: Map<String, Value>,
        timestamp: String,
    ) -> Self {
        metadata.retain(|key, _| !Self::RESERVED_KEYS.contains(&key.as_str()));
        Self::ContentUpdate {
            app_type: document.into(),
            content: content.into(),
            metadata,
            timestamp,
        }
    }

    /// Button press.
    #[must_use]
    pub fn feedback(action: impl Into<String>, timestamp: String) -> Self {
        Self::Feedback {
            action: action.into(),
            timestamp,
        }
    }

    /// Forced state switch.
    #[must_use]
    pub const fn mock_state(state: CognitiveState) -> Self {
        Self::MockState {
            state: state.preset(),
        }
    }

    /// Focus change.
    #[must_use]
    pub fn app_focus(app_type: Option<&str>, timestamp: String) -> Self {
        Self::AppFocus {
            app_type: app_type.map(str::to_string),
            timestamp,
        }
    }

    /// Live heart rate, or `None` when outside the range the server accepts.
    #[must_use]
    pub fn live_hr(bpm: u16) -> Option<Self> {
        (Self::LIVE_HR_MIN..=Self::LIVE_HR_MAX)
            .contains(&bpm)
            .then_some(Self::LiveHr { heart_rate: bpm })
    }

    /// Wire `type` of this message.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ContentUpdate { .. } => "content_update",
            Self::Feedback { .. } => "feedback",
            Self::MockState { .. } => "mock_state",
            Self::AppFocus { .. } => "app_focus",
            Self::LiveHr { .. } => "live_hr",
            Self::BleReconnected => "ble_reconnected",
            Self::BleDisconnected => "ble_disconnected",
        }
    }

    /// Encode to JSON text.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

/// Current UTC time formatted for outbound envelopes.
#[must_use]
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_biometric_update() {
        let msg = Inbound::parse(
            r#"{"type":"biometric_update","heartRate":140,"hrv":42.5,"recovery":61,
                "strain":9.1,"estimated_stress":1.4,"state":"WIRED","spo2":97}"#,
        )
        .unwrap();
        let Inbound::BiometricUpdate(update) = msg else {
            panic!("Expected BiometricUpdate");
        };
        assert_eq!(update.heart_rate, Some(140.0));
        assert_eq!(update.cognitive_state(), Some(CognitiveState::Wired));
        assert_eq!(update.spo2, Some(97.0));
        assert_eq!(update.skin_temp, None);
    }

    #[test]
    fn test_parse_state_change() {
        let msg = Inbound::parse(r#"{"type":"state_change","from":"RELAXED","to":"STRESSED"}"#)
            .unwrap();
        assert_eq!(
            msg,
            Inbound::StateChange {
                from: Some(CognitiveState::Relaxed),
                to: CognitiveState::Stressed,
                reason: None,
                estimated_stress: None,
            }
        );
        assert_eq!(msg.kind(), "state_change");
    }

    #[test]
    fn test_parse_intervention_defaults() {
        let msg = Inbound::parse(r#"{"type":"intervention","message":"Breathe"}"#).unwrap();
        let Inbound::Intervention(i) = msg else {
            panic!("Expected Intervention");
        };
        assert_eq!(i.priority, Priority::Medium);
        assert!(i.buttons.is_empty());
    }

    #[test]
    fn test_parse_errors_are_classified() {
        assert!(matches!(
            Inbound::parse("not json"),
            Err(ProtocolError::InvalidJson(_))
        ));
        assert!(matches!(
            Inbound::parse(r#"{"heartRate":70}"#),
            Err(ProtocolError::MissingType)
        ));
        assert!(matches!(
            Inbound::parse(r#"{"type":"weather","temp":21}"#),
            Err(ProtocolError::UnknownType(t)) if t == "weather"
        ));
        assert!(matches!(
            Inbound::parse(r#"{"type":"sleep_mode","active":"yes"}"#),
            Err(ProtocolError::Malformed { kind, .. }) if kind == "sleep_mode"
        ));
        assert!(matches!(
            Inbound::parse(r#"{"type":"state_change","to":"CALM"}"#),
            Err(ProtocolError::Malformed { .. })
        ));
    }

    #[test]
    fn test_content_update_spreads_metadata() {
        let mut metadata = Map::new();
        metadata.insert("language".to_string(), json!("rust"));
        metadata.insert("content".to_string(), json!("hijack"));
        let msg = Outbound::content_update("editor", "fn main() {}", metadata, "t0".to_string());
        let value: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "content_update",
                "app_type": "editor",
                "content": "fn main() {}",
                "language": "rust",
                "timestamp": "t0",
            })
        );
    }

    #[test]
    fn test_outbound_shapes() {
        let mock = serde_json::to_value(Outbound::mock_state(CognitiveState::Wired)).unwrap();
        assert_eq!(mock, json!({"type": "mock_state", "state": 5}));

        let focus = serde_json::to_value(Outbound::app_focus(None, "t".to_string())).unwrap();
        assert_eq!(focus, json!({"type": "app_focus", "app_type": null, "timestamp": "t"}));

        let ble = serde_json::to_value(Outbound::BleDisconnected).unwrap();
        assert_eq!(ble, json!({"type": "ble_disconnected"}));
    }

    #[test]
    fn test_live_hr_range() {
        assert_eq!(Outbound::live_hr(30), None);
        assert_eq!(Outbound::live_hr(220), None);
        assert_eq!(
            Outbound::live_hr(72),
            Some(Outbound::LiveHr { heart_rate: 72 })
        );
    }

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp_now();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
