//! Intent classification result types.
//!
//! Intents are plain strings rather than a closed enum: the classifier's
//! keyword/pattern rules are data-driven (new intents are added by adding
//! rules, not by extending a Rust enum), matching how the routing layer
//! treats them as opaque tokens compared against well-known constants.

use serde::{Deserialize, Serialize};

/// Well-known intent names referenced by the routing layer.
pub mod well_known {
    pub const GREETING: &str = "greeting";
    pub const HELP: &str = "help";
    pub const CREATE_CONTACT: &str = "create_contact";
    pub const UPDATE_CONTACT: &str = "update_contact";
    pub const SEARCH_CONTACT: &str = "search_contact";
    pub const CREATE_ORDER: &str = "create_order";
    pub const UPDATE_ORDER: &str = "update_order";
    pub const SEARCH_ORDER: &str = "search_order";
    pub const GET_INVENTORY: &str = "get_inventory";
    pub const UPDATE_INVENTORY: &str = "update_inventory";
    pub const GENERATE_REPORT: &str = "generate_report";
    pub const SCHEDULE_MEETING: &str = "schedule_meeting";
    pub const UNKNOWN: &str = "unknown";

    /// Intents that route directly to the tool dispatcher.
    pub const TOOL_INTENTS: &[&str] = &[
        CREATE_CONTACT,
        UPDATE_CONTACT,
        SEARCH_CONTACT,
        CREATE_ORDER,
        UPDATE_ORDER,
        SEARCH_ORDER,
        GET_INVENTORY,
        UPDATE_INVENTORY,
        GENERATE_REPORT,
        SCHEDULE_MEETING,
    ];
}

/// The outcome of classifying a single user utterance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntentResult {
    pub intent: String,
    pub confidence: f32,
    /// Other intents that scored above the noise floor, highest first.
    #[serde(default)]
    pub alternatives: Vec<IntentScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntentScore {
    pub intent: String,
    pub confidence: f32,
}

impl IntentResult {
    pub fn unknown() -> Self {
        Self {
            intent: well_known::UNKNOWN.to_string(),
            confidence: 0.0,
            alternatives: Vec::new(),
        }
    }

    pub fn is_tool_intent(&self) -> bool {
        well_known::TOOL_INTENTS.contains(&self.intent.as_str())
    }
}

/// Tracks a per-conversation exponential moving average of intent confidence,
/// used to detect when the classifier is drifting (e.g. repeated low-confidence
/// classifications for the same conversation).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceTracker {
    pub ema: f32,
    pub alpha: f32,
    pub samples: u32,
}

impl ConfidenceTracker {
    pub fn new(alpha: f32) -> Self {
        Self {
            ema: 0.0,
            alpha,
            samples: 0,
        }
    }

    /// Fold in a new confidence sample. The first sample seeds the EMA
    /// directly rather than blending against an initial 0.0.
    pub fn update(&mut self, confidence: f32) {
        if self.samples == 0 {
            self.ema = confidence;
        } else {
            self.ema = self.alpha * confidence + (1.0 - self.alpha) * self.ema;
        }
        self.samples += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_intent_detection() {
        let r = IntentResult {
            intent: well_known::CREATE_CONTACT.into(),
            confidence: 0.9,
            alternatives: vec![],
        };
        assert!(r.is_tool_intent());

        let r = IntentResult {
            intent: well_known::GREETING.into(),
            confidence: 0.9,
            alternatives: vec![],
        };
        assert!(!r.is_tool_intent());
    }

    #[test]
    fn confidence_tracker_seeds_on_first_sample() {
        let mut t = ConfidenceTracker::new(0.1);
        t.update(0.8);
        assert_eq!(t.ema, 0.8);
        assert_eq!(t.samples, 1);
    }

    #[test]
    fn confidence_tracker_blends_subsequent_samples() {
        let mut t = ConfidenceTracker::new(0.1);
        t.update(0.8);
        t.update(0.2);
        // 0.1 * 0.2 + 0.9 * 0.8 = 0.74
        assert!((t.ema - 0.74).abs() < 1e-6);
    }
}
