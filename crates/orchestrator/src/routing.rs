//! Deterministic routing decision and agent/tool selection (spec.md §4.11).

use std::collections::HashMap;

use sa_domain::entity::{Entity, BUSINESS_ENTITY_LABELS};
use sa_domain::intent::well_known::TOOL_INTENTS;
use sa_domain::tool::ToolSelection;

use crate::state::RoutingDecision;

const ACTION_VERBS: &[&str] = &["create", "update", "delete", "modify", "change"];

const RAG_KEYWORDS: &[&str] = &[
    "how", "what", "why", "when", "where", "explain", "tell me", "information", "details",
    "documentation", "guide", "help", "procedure", "process", "policy", "workflow",
];

const CRM_INTENTS: &[&str] = &["create_contact", "update_contact", "search_contact"];
const ERP_INTENTS: &[&str] = &["create_order", "update_order", "search_order", "get_inventory", "update_inventory"];

/// `state.error_count > max_retries` -> error; tool-intent or
/// (business-entity + action-verb) -> tools; RAG-keyword heuristic -> rag;
/// else -> direct.
pub fn decide_routing(intent: &str, entities: &[Entity], utterance: &str, error_count: u32, max_retries: u32) -> RoutingDecision {
    if error_count > max_retries {
        return RoutingDecision::Error;
    }

    if TOOL_INTENTS.contains(&intent) {
        return RoutingDecision::Tools;
    }

    let lower = utterance.to_lowercase();
    let has_business_entity = entities.iter().any(|e| BUSINESS_ENTITY_LABELS.contains(&e.label.as_str()));
    let has_action_verb = ACTION_VERBS.iter().any(|v| lower.split_whitespace().any(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == *v));
    if has_business_entity && has_action_verb {
        return RoutingDecision::Tools;
    }

    let word_count = utterance.split_whitespace().count();
    let has_rag_keyword = RAG_KEYWORDS.iter().any(|k| lower.contains(k));
    let is_greeting_or_help = intent == "greeting" || intent == "help";
    if has_rag_keyword && !is_greeting_or_help && word_count > 3 {
        return RoutingDecision::Rag;
    }

    RoutingDecision::Direct
}

/// Agent selection for response generation only.
pub fn select_agent(intent: &str, entities: &[Entity]) -> &'static str {
    if CRM_INTENTS.contains(&intent) {
        return "CRM_AGENT";
    }
    if ERP_INTENTS.contains(&intent) {
        return "ERP_AGENT";
    }
    let has_business_entity = entities.iter().any(|e| BUSINESS_ENTITY_LABELS.contains(&e.label.as_str()));
    if has_business_entity {
        return "TASK_COORDINATOR";
    }
    "GENERAL_ASSISTANT"
}

pub fn agent_description(agent: &str) -> &'static str {
    match agent {
        "CRM_AGENT" => "You handle customer relationship management requests: contacts, leads, and accounts.",
        "ERP_AGENT" => "You handle enterprise resource planning requests: orders, inventory, and reports.",
        "TASK_COORDINATOR" => "You coordinate multi-step business tasks involving people, products, or organizations.",
        _ => "You are a helpful general assistant.",
    }
}

/// Intent-conditioned tool selection, with parameters assembled from
/// entities by label.
pub fn select_tools(intent: &str, entities: &[Entity]) -> Vec<ToolSelection> {
    let tool_name = match intent {
        "create_contact" => "create_crm_contact",
        "update_contact" => "update_crm_contact",
        "search_contact" => "search_crm_contact",
        "create_order" => "create_erp_order",
        "update_order" => "update_erp_order",
        "search_order" => "search_erp_order",
        "get_inventory" => "get_erp_inventory",
        "update_inventory" => "update_erp_inventory",
        "generate_report" => "generate_erp_report",
        "schedule_meeting" => "schedule_meeting",
        _ => return Vec::new(),
    };

    let mut parameters: HashMap<String, serde_json::Value> = HashMap::new();
    for entity in entities {
        let key = match entity.label.as_str() {
            "PERSON" => "name",
            "EMAIL" => "email",
            "PHONE" => "phone",
            "ORGANIZATION" => "company",
            "PRODUCT" => "product",
            "MONEY" => "amount",
            "DATE" => "date",
            "TIME" => "time",
            "QUANTITY" => "quantity",
            _ => continue,
        };
        parameters.entry(key.to_string()).or_insert_with(|| serde_json::Value::String(entity.text.clone()));
    }

    vec![ToolSelection { tool_name: tool_name.to_string(), parameters }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use sa_domain::entity::EntitySource;

    fn entity(label: &str, text: &str) -> Entity {
        Entity { text: text.to_string(), label: label.to_string(), start: 0, end: text.len(), confidence: 0.9, source: EntitySource::Model }
    }

    #[test]
    fn error_count_over_max_retries_routes_to_error() {
        let decision = decide_routing("unknown", &[], "hello there friend", 5, 3);
        assert_eq!(decision, RoutingDecision::Error);
    }

    #[test]
    fn tool_intent_routes_to_tools() {
        let decision = decide_routing("create_contact", &[], "Create a contact for Jane", 0, 3);
        assert_eq!(decision, RoutingDecision::Tools);
    }

    #[test]
    fn business_entity_with_action_verb_routes_to_tools() {
        let entities = vec![entity("PERSON", "Jane Smith")];
        let decision = decide_routing("unknown", &entities, "Please create a record for Jane Smith", 0, 3);
        assert_eq!(decision, RoutingDecision::Tools);
    }

    #[test]
    fn rag_keyword_routes_to_rag_when_not_greeting() {
        let decision = decide_routing("unknown", &[], "How do I submit an expense report?", 0, 3);
        assert_eq!(decision, RoutingDecision::Rag);
    }

    #[test]
    fn short_greeting_routes_direct_despite_keyword() {
        let decision = decide_routing("greeting", &[], "Hello, how are you", 0, 3);
        assert_eq!(decision, RoutingDecision::Direct);
    }

    #[test]
    fn short_utterance_stays_direct() {
        let decision = decide_routing("unknown", &[], "what now", 0, 3);
        assert_eq!(decision, RoutingDecision::Direct);
    }

    #[test]
    fn tool_selection_maps_entity_labels_to_parameter_names() {
        let entities = vec![entity("PERSON", "Jane Smith"), entity("EMAIL", "jane@acme.com")];
        let selections = select_tools("create_contact", &entities);
        assert_eq!(selections.len(), 1);
        assert_eq!(selections[0].tool_name, "create_crm_contact");
        assert_eq!(selections[0].parameters.get("name").unwrap(), "Jane Smith");
        assert_eq!(selections[0].parameters.get("email").unwrap(), "jane@acme.com");
    }
}
