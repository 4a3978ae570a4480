//! IntentClassifier (C8): keyword/pattern rule scoring with an optional
//! model-based classifier fused in by higher confidence.

use std::collections::HashMap;

use regex::Regex;

use sa_domain::intent::{well_known, IntentResult, IntentScore};

/// A registered intent's matching rules.
#[derive(Debug, Clone)]
pub struct IntentDefinition {
    pub name: String,
    pub keywords: Vec<String>,
    pub patterns: Vec<Regex>,
    pub examples: Vec<String>,
    pub confidence_threshold: f32,
}

impl IntentDefinition {
    pub fn new(name: impl Into<String>, keywords: &[&str], patterns: &[&str], confidence_threshold: f32) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            patterns: patterns.iter().filter_map(|p| Regex::new(p).ok()).collect(),
            examples: Vec::new(),
            confidence_threshold,
        }
    }
}

/// A pluggable model-based classifier, kept as a trait object rather than a
/// concrete type so the rule-based path stays usable without one.
pub trait ModelIntentClassifier: Send + Sync {
    fn classify(&self, text: &str, language: &str) -> Option<(String, f32)>;
}

pub struct IntentClassifier {
    definitions: Vec<IntentDefinition>,
    model: Option<Box<dyn ModelIntentClassifier>>,
}

impl IntentClassifier {
    pub fn new(definitions: Vec<IntentDefinition>) -> Self {
        Self { definitions, model: None }
    }

    pub fn with_model(mut self, model: Box<dyn ModelIntentClassifier>) -> Self {
        self.model = Some(model);
        self
    }

    /// The registered intent definitions, for API introspection endpoints.
    pub fn definitions(&self) -> &[IntentDefinition] {
        &self.definitions
    }

    /// Classify `text`, returning the best-scoring eligible intent, or
    /// `None` if nothing clears its own threshold. `alternatives` carries
    /// every other eligible intent, highest first.
    pub fn classify(&self, text: &str, language: &str) -> Option<IntentResult> {
        let lower = text.to_lowercase();
        let mut eligible: Vec<IntentScore> = self
            .definitions
            .iter()
            .filter_map(|def| {
                let score = score_definition(def, &lower);
                (score >= def.confidence_threshold).then_some(IntentScore { intent: def.name.clone(), confidence: score })
            })
            .collect();
        eligible.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));

        let rule_best = eligible.first().cloned();
        let model_best = self.model.as_ref().and_then(|m| m.classify(text, language)).map(|(intent, confidence)| IntentScore { intent, confidence });

        let winner = match (rule_best.clone(), model_best) {
            (Some(r), Some(m)) => {
                if m.confidence > r.confidence {
                    m
                } else {
                    r
                }
            }
            (Some(r), None) => r,
            (None, Some(m)) => m,
            (None, None) => return None,
        };

        Some(IntentResult { intent: winner.intent, confidence: winner.confidence, alternatives: eligible })
    }

    /// Deterministic side-channel: extract intent-family-specific
    /// parameters (e.g. contact intents extract email/phone; order
    /// intents extract quantity), independent of the main entity extractor.
    pub fn extract_parameters(&self, intent: &str, text: &str) -> HashMap<String, String> {
        extract_parameters(intent, text)
    }
}

/// The intent set the orchestrator registers by default: greeting/help
/// plus every intent in [`well_known::TOOL_INTENTS`].
pub fn default_definitions() -> Vec<IntentDefinition> {
    vec![
        IntentDefinition::new(well_known::GREETING, &["hello", "hi", "hey", "good morning", "good afternoon"], &[r"^(hi|hello|hey)\b"], 0.3),
        IntentDefinition::new(well_known::HELP, &["help", "what can you do", "how does this work"], &[r"\bhelp\b"], 0.3),
        IntentDefinition::new(
            well_known::CREATE_CONTACT,
            &["create a contact", "add a contact", "new contact"],
            &[r"(create|add)\s+(a\s+)?(new\s+)?contact"],
            0.3,
        ),
        IntentDefinition::new(
            well_known::UPDATE_CONTACT,
            &["update contact", "edit contact", "change contact"],
            &[r"(update|edit|change)\s+(the\s+)?contact"],
            0.3,
        ),
        IntentDefinition::new(
            well_known::SEARCH_CONTACT,
            &["find contact", "search contact", "look up contact"],
            &[r"(find|search|look\s+up)\s+(a\s+|the\s+)?contact"],
            0.3,
        ),
        IntentDefinition::new(
            well_known::CREATE_ORDER,
            &["create an order", "place an order", "new order"],
            &[r"(create|place)\s+(a\s+|an\s+)?(new\s+)?order"],
            0.3,
        ),
        IntentDefinition::new(
            well_known::UPDATE_ORDER,
            &["update order", "change order", "modify order"],
            &[r"(update|change|modify)\s+(the\s+)?order"],
            0.3,
        ),
        IntentDefinition::new(
            well_known::SEARCH_ORDER,
            &["find order", "search order", "order status"],
            &[r"(find|search)\s+(an\s+|the\s+)?order"],
            0.3,
        ),
        IntentDefinition::new(
            well_known::GET_INVENTORY,
            &["check inventory", "inventory level", "stock level"],
            &[r"(check|get)\s+(the\s+)?(inventory|stock)"],
            0.3,
        ),
        IntentDefinition::new(
            well_known::UPDATE_INVENTORY,
            &["update inventory", "adjust stock", "restock"],
            &[r"(update|adjust)\s+(the\s+)?(inventory|stock)"],
            0.3,
        ),
        IntentDefinition::new(
            well_known::GENERATE_REPORT,
            &["generate a report", "create a report", "run a report"],
            &[r"(generate|create|run)\s+(a\s+)?report"],
            0.3,
        ),
        IntentDefinition::new(
            well_known::SCHEDULE_MEETING,
            &["schedule a meeting", "book a meeting", "set up a call"],
            &[r"(schedule|book)\s+(a\s+)?(meeting|call)"],
            0.3,
        ),
    ]
}

fn score_definition(def: &IntentDefinition, lower_text: &str) -> f32 {
    let mut components: Vec<(f32, f32)> = Vec::new();

    if !def.keywords.is_empty() {
        let matched = def.keywords.iter().filter(|k| lower_text.contains(k.to_lowercase().as_str())).count();
        let ratio = matched as f32 / def.keywords.len() as f32;
        components.push((0.4, ratio));
    }

    if !def.patterns.is_empty() {
        let matched = def.patterns.iter().filter(|p| p.is_match(lower_text)).count();
        let ratio = (matched as f32 / def.patterns.len() as f32).min(1.0);
        components.push((0.6, ratio));
    }

    let weight_sum: f32 = components.iter().map(|(w, _)| w).sum();
    if weight_sum == 0.0 {
        return 0.0;
    }
    components.iter().map(|(w, v)| w * v).sum::<f32>() / weight_sum
}

fn extract_parameters(intent: &str, text: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    let is_contact_family = [well_known::CREATE_CONTACT, well_known::UPDATE_CONTACT, well_known::SEARCH_CONTACT].contains(&intent);
    let is_order_family = [well_known::CREATE_ORDER, well_known::UPDATE_ORDER, well_known::SEARCH_ORDER].contains(&intent);

    if is_contact_family {
        if let Some(email) = find_first(text, r"[\w.+-]+@[\w-]+\.[\w.-]+") {
            params.insert("email".to_string(), email);
        }
        if let Some(phone) = find_first(text, r"\+?\d[\d\-\s]{7,}\d") {
            params.insert("phone".to_string(), phone.trim().to_string());
        }
    }

    if is_order_family {
        if let Some(qty) = find_first(text, r"\b\d+\b") {
            params.insert("quantity".to_string(), qty);
        }
    }

    params
}

fn find_first(text: &str, pattern: &str) -> Option<String> {
    Regex::new(pattern).ok()?.find(text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greeting_def() -> IntentDefinition {
        IntentDefinition::new("greeting", &["hello", "hi", "hey"], &[r"^(hi|hello|hey)\b"], 0.3)
    }

    fn create_contact_def() -> IntentDefinition {
        IntentDefinition::new(
            well_known::CREATE_CONTACT,
            &["add contact", "new contact", "create contact"],
            &[r"add\s+(a\s+)?(new\s+)?contact"],
            0.3,
        )
    }

    #[test]
    fn greeting_scores_above_threshold_and_wins() {
        let classifier = IntentClassifier::new(vec![greeting_def(), create_contact_def()]);
        let result = classifier.classify("Hello there!", "en").unwrap();
        assert_eq!(result.intent, "greeting");
        assert!(result.confidence > 0.3);
    }

    #[test]
    fn below_threshold_utterance_returns_none() {
        let classifier = IntentClassifier::new(vec![create_contact_def()]);
        let result = classifier.classify("The weather is nice today", "en");
        assert!(result.is_none());
    }

    #[test]
    fn model_classifier_wins_when_more_confident() {
        struct AlwaysConfident;
        impl ModelIntentClassifier for AlwaysConfident {
            fn classify(&self, _text: &str, _language: &str) -> Option<(String, f32)> {
                Some(("create_order".to_string(), 0.99))
            }
        }
        let classifier = IntentClassifier::new(vec![greeting_def()]).with_model(Box::new(AlwaysConfident));
        let result = classifier.classify("hello", "en").unwrap();
        assert_eq!(result.intent, "create_order");
    }

    #[test]
    fn contact_intent_extracts_email_and_phone() {
        let classifier = IntentClassifier::new(vec![create_contact_def()]);
        let params = classifier.extract_parameters(well_known::CREATE_CONTACT, "add contact jane@example.com 555-123-4567");
        assert_eq!(params.get("email").unwrap(), "jane@example.com");
        assert!(params.contains_key("phone"));
    }
}
