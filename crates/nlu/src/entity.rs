//! EntityExtractor (C9): model NER + domain pattern recognizer + generic
//! regex, merged and filtered per spec.md §4.8.

use regex::Regex;

use sa_domain::entity::{business_labels, generic_labels, Entity, EntitySource};

/// A pluggable model-based NER backend.
pub trait ModelNer: Send + Sync {
    fn recognize(&self, text: &str) -> Vec<(String, String, usize, usize)>;
}

struct DomainPattern {
    label: &'static str,
    regex: Regex,
    is_business: bool,
    confidence_boost: f32,
}

pub struct EntityExtractorConfig {
    pub min_confidence: f32,
}

impl Default for EntityExtractorConfig {
    fn default() -> Self {
        Self { min_confidence: 0.5 }
    }
}

pub struct EntityExtractor {
    config: EntityExtractorConfig,
    domain_patterns: Vec<DomainPattern>,
    generic_patterns: Vec<(&'static str, Regex)>,
    model: Option<Box<dyn ModelNer>>,
}

impl EntityExtractor {
    pub fn new(config: EntityExtractorConfig) -> Self {
        Self {
            config,
            domain_patterns: default_domain_patterns(),
            generic_patterns: default_generic_patterns(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: Box<dyn ModelNer>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn extract(&self, text: &str) -> Vec<Entity> {
        let mut candidates = Vec::new();
        candidates.extend(self.model_entities(text));
        candidates.extend(self.domain_entities(text));
        candidates.extend(self.generic_entities(text));

        let merged = merge_overlapping(candidates);
        self.filter(merged)
    }

    fn model_entities(&self, text: &str) -> Vec<Entity> {
        let Some(model) = &self.model else { return Vec::new() };
        model
            .recognize(text)
            .into_iter()
            .map(|(label, span_text, start, end)| {
                let length_bonus = (span_text.len() as f32 / 100.0).min(0.1);
                let high_confidence_family = matches!(label.as_str(), "PERSON" | "ORG" | "GPE" | "MONEY");
                let family_boost = if high_confidence_family { 0.1 } else { 0.0 };
                let confidence = (0.8 + family_boost + length_bonus).min(1.0);
                Entity { text: span_text, label, start, end, confidence, source: EntitySource::Model }
            })
            .collect()
    }

    fn domain_entities(&self, text: &str) -> Vec<Entity> {
        let mut entities = Vec::new();
        for pattern in &self.domain_patterns {
            for m in pattern.regex.find_iter(text) {
                let base = if pattern.is_business { 0.85 } else { 0.75 };
                let confidence = (base + pattern.confidence_boost).min(1.0);
                entities.push(Entity {
                    text: m.as_str().to_string(),
                    label: pattern.label.to_string(),
                    start: m.start(),
                    end: m.end(),
                    confidence,
                    source: EntitySource::DomainPattern,
                });
            }
        }
        entities
    }

    fn generic_entities(&self, text: &str) -> Vec<Entity> {
        let mut entities = Vec::new();
        for (label, regex) in &self.generic_patterns {
            for m in regex.find_iter(text) {
                entities.push(Entity {
                    text: m.as_str().to_string(),
                    label: label.to_string(),
                    start: m.start(),
                    end: m.end(),
                    confidence: 0.9,
                    source: EntitySource::GenericPattern,
                });
            }
        }
        entities
    }

    /// Drop entities below `min_confidence`, shorter than 2 characters, or
    /// that are pure-digit text unless their label is business-ID-exempt.
    fn filter(&self, entities: Vec<Entity>) -> Vec<Entity> {
        entities
            .into_iter()
            .filter(|e| e.confidence >= self.config.min_confidence)
            .filter(|e| e.text.chars().count() >= 2)
            .filter(|e| !(is_pure_digits(&e.text) && !business_labels::ALL.contains(&e.label.as_str())))
            .collect()
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new(EntityExtractorConfig::default())
    }
}

fn is_pure_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// Sort by `(start, end)`, then drop the lower-confidence half of any
/// overlapping pair (spec.md §3 span-overlap test).
fn merge_overlapping(mut entities: Vec<Entity>) -> Vec<Entity> {
    entities.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));

    let mut kept: Vec<Entity> = Vec::new();
    for entity in entities {
        if let Some(last) = kept.last() {
            if last.overlaps(&entity) {
                if entity.confidence > last.confidence {
                    kept.pop();
                    kept.push(entity);
                }
                continue;
            }
        }
        kept.push(entity);
    }
    kept
}

fn default_domain_patterns() -> Vec<DomainPattern> {
    let pat = |label, regex: &str, is_business, boost| DomainPattern { label, regex: Regex::new(regex).unwrap(), is_business, confidence_boost: boost };
    vec![
        pat(business_labels::EMPLOYEE_ID, r"\bEMP-\d{4,8}\b", true, 0.05),
        pat(business_labels::CUSTOMER_ID, r"\bCUST-\d{4,8}\b", true, 0.05),
        pat(business_labels::ORDER_ID, r"\bORD-\d{4,8}\b", true, 0.05),
        pat(business_labels::PRODUCT_CODE, r"\bPROD-[A-Z0-9]{4,10}\b", true, 0.03),
        pat(business_labels::INVOICE_NUMBER, r"\bINV-\d{4,10}\b", true, 0.05),
        pat(business_labels::PURCHASE_ORDER, r"\bPO-\d{4,10}\b", true, 0.05),
        pat(business_labels::TICKET_ID, r"\bTKT-\d{4,8}\b", true, 0.03),
        pat(business_labels::PROJECT_CODE, r"\bPROJ-[A-Z0-9]{3,10}\b", true, 0.03),
        pat(business_labels::DEPARTMENT, r"\b(?:Sales|Marketing|Engineering|Finance|HR|Human Resources|Legal|Operations|Support|IT)\s+Department\b", false, 0.02),
        pat(business_labels::JOB_TITLE, r"\b(?:Manager|Director|Engineer|Analyst|Coordinator|Specialist|Representative|Associate|Vice President|VP|President|Officer)\b", false, 0.0),
        pat(business_labels::OFFICE_LOCATION, r"\b[A-Z][a-zA-Z]+(?:\s[A-Z][a-zA-Z]+)?\s(?:Office|Headquarters|HQ|Branch)\b", false, 0.02),
        pat(business_labels::DELIVERY_DATE, r"\bdelivery\s(?:date|on|by)\s(?:\d{4}-\d{2}-\d{2}|\w+\s\d{1,2}(?:st|nd|rd|th)?)\b", true, 0.02),
        pat(business_labels::MEETING_TIME, r"\bmeeting\sat\s\d{1,2}:\d{2}(?:\s?[AaPp][Mm])?\b", true, 0.02),
    ]
}

fn default_generic_patterns() -> Vec<(&'static str, Regex)> {
    let re = |p: &str| Regex::new(p).unwrap();
    vec![
        (generic_labels::EMAIL, re(r"[\w.+-]+@[\w-]+\.[\w.-]+")),
        (generic_labels::PHONE, re(r"\+?\d[\d\-\s]{7,}\d")),
        (generic_labels::URL, re(r"https?://[^\s]+")),
        (generic_labels::MONEY, re(r"\$\s?\d+(?:,\d{3})*(?:\.\d{2})?")),
        (generic_labels::PERCENTAGE, re(r"\b\d+(?:\.\d+)?%")),
        (generic_labels::DATE, re(r"\b\d{4}-\d{2}-\d{2}\b")),
        (generic_labels::TIME, re(r"\b\d{1,2}:\d{2}(?:\s?[AaPp][Mm])?\b")),
        (generic_labels::ZIPCODE, re(r"\b\d{5}(?:-\d{4})?\b")),
        // No Luhn validation, matching the source's detection behavior.
        (generic_labels::CREDIT_CARD, re(r"\b(?:\d[ -]?){13,19}\b")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_email_and_phone_without_overlap() {
        let extractor = EntityExtractor::default();
        let entities = extractor.extract("Contact Jane at jane@example.com or 555-123-4567");
        assert!(entities.iter().any(|e| e.label == generic_labels::EMAIL));
        assert!(entities.iter().any(|e| e.label == generic_labels::PHONE));
        for pair in entities.windows(2) {
            assert!(!pair[0].overlaps(&pair[1]));
        }
    }

    #[test]
    fn business_id_survives_pure_digit_filter() {
        let extractor = EntityExtractor::default();
        let entities = extractor.extract("See order ORD-12345678 for details");
        assert!(entities.iter().any(|e| e.label == business_labels::ORDER_ID));
    }

    #[test]
    fn short_fragments_are_dropped() {
        let extractor = EntityExtractor::default();
        let entities = extractor.extract("a");
        assert!(entities.is_empty());
    }

    #[test]
    fn overlapping_domain_and_generic_matches_keep_higher_confidence() {
        let extractor = EntityExtractor::default();
        let entities = extractor.extract("Invoice INV-000123 due soon");
        let invoice_hits: Vec<_> = entities.iter().filter(|e| e.text.contains("INV-000123")).collect();
        assert_eq!(invoice_hits.len(), 1);
    }
}
