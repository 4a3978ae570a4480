//! Named-entity recognition result types.

use serde::{Deserialize, Serialize};

/// A single extracted entity span.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub text: String,
    pub label: String,
    /// Byte offset of the span start in the source text.
    pub start: usize,
    /// Byte offset of the span end (exclusive) in the source text.
    pub end: usize,
    pub confidence: f32,
    /// Which recognizer produced this entity: `"model"`, `"domain_pattern"`,
    /// or `"generic_pattern"`.
    pub source: EntitySource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitySource {
    Model,
    DomainPattern,
    GenericPattern,
}

impl Entity {
    /// Two spans overlap iff neither ends before the other starts.
    pub fn overlaps(&self, other: &Entity) -> bool {
        !(self.end <= other.start || other.end <= self.start)
    }
}

/// Business-ID entity labels recognized by the domain pattern recognizer.
/// All 13 are exempt from the generic "drop pure-digit text" filter — the
/// source upstream only allow-lists 4 of these for that rule, but spec.md
/// §4.8 enumerates the fuller 13-label set and is authoritative here (see
/// DESIGN.md Open Question 1).
pub mod business_labels {
    pub const EMPLOYEE_ID: &str = "EMPLOYEE_ID";
    pub const CUSTOMER_ID: &str = "CUSTOMER_ID";
    pub const ORDER_ID: &str = "ORDER_ID";
    pub const PRODUCT_CODE: &str = "PRODUCT_CODE";
    pub const INVOICE_NUMBER: &str = "INVOICE_NUMBER";
    pub const PURCHASE_ORDER: &str = "PURCHASE_ORDER";
    pub const TICKET_ID: &str = "TICKET_ID";
    pub const PROJECT_CODE: &str = "PROJECT_CODE";
    pub const DEPARTMENT: &str = "DEPARTMENT";
    pub const JOB_TITLE: &str = "JOB_TITLE";
    pub const OFFICE_LOCATION: &str = "OFFICE_LOCATION";
    pub const DELIVERY_DATE: &str = "DELIVERY_DATE";
    pub const MEETING_TIME: &str = "MEETING_TIME";

    pub const ALL: &[&str] = &[
        EMPLOYEE_ID,
        CUSTOMER_ID,
        ORDER_ID,
        PRODUCT_CODE,
        INVOICE_NUMBER,
        PURCHASE_ORDER,
        TICKET_ID,
        PROJECT_CODE,
        DEPARTMENT,
        JOB_TITLE,
        OFFICE_LOCATION,
        DELIVERY_DATE,
        MEETING_TIME,
    ];
}

/// Generic entity labels recognized by regex (email, phone, money, ...).
/// `CREDIT_CARD` intentionally has no Luhn check — see DESIGN.md Open
/// Question 5.
pub mod generic_labels {
    pub const EMAIL: &str = "EMAIL";
    pub const PHONE: &str = "PHONE";
    pub const MONEY: &str = "MONEY";
    pub const DATE: &str = "DATE";
    pub const TIME: &str = "TIME";
    pub const URL: &str = "URL";
    pub const PERCENTAGE: &str = "PERCENTAGE";
    /// No Luhn validation — matches any 13-19 digit run grouped by spaces/dashes.
    pub const CREDIT_CARD: &str = "CREDIT_CARD";
    pub const ZIPCODE: &str = "ZIPCODE";

    pub const ALL: &[&str] = &[
        EMAIL, PHONE, MONEY, DATE, TIME, URL, PERCENTAGE, CREDIT_CARD, ZIPCODE,
    ];
}

/// Model-NER labels treated as "business entities" by the orchestrator's
/// routing heuristic (entity-driven tool routing).
pub const BUSINESS_ENTITY_LABELS: &[&str] = &["PERSON", "ORGANIZATION", "PRODUCT", "MONEY"];

#[cfg(test)]
mod tests {
    use super::*;

    fn e(start: usize, end: usize, confidence: f32) -> Entity {
        Entity {
            text: "x".into(),
            label: "TEST".into(),
            start,
            end,
            confidence,
            source: EntitySource::GenericPattern,
        }
    }

    #[test]
    fn overlap_detection() {
        assert!(e(0, 5, 1.0).overlaps(&e(3, 8, 1.0)));
        assert!(!e(0, 5, 1.0).overlaps(&e(5, 8, 1.0)));
        assert!(!e(5, 8, 1.0).overlaps(&e(0, 5, 1.0)));
        assert!(e(0, 10, 1.0).overlaps(&e(2, 4, 1.0)));
    }
}
