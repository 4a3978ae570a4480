//! Format detection (spec.md §4.2): explicit metadata hint -> parse-as-JSON
//! probe -> source-string heuristic -> plain text.

use sa_domain::document::{DataFormat, Document};

pub fn detect(document: &Document) -> DataFormat {
    if let Some(hint) = document.metadata.get("data_format").and_then(|v| v.as_str()) {
        if let Some(format) = from_hint(hint) {
            return format;
        }
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&document.content) {
        if let Some(format) = from_json_shape(&value) {
            return format;
        }
        return DataFormat::Json;
    }

    from_source_heuristic(&document.source).unwrap_or(DataFormat::PlainText)
}

fn from_hint(hint: &str) -> Option<DataFormat> {
    match hint {
        "crm_contact" => Some(DataFormat::CrmContact),
        "crm_opportunity" => Some(DataFormat::CrmOpportunity),
        "erp_product" => Some(DataFormat::ErpProduct),
        "erp_order" => Some(DataFormat::ErpOrder),
        "erp_invoice" => Some(DataFormat::ErpInvoice),
        "generic_record" => Some(DataFormat::GenericRecord),
        "json" => Some(DataFormat::Json),
        "plain_text" => Some(DataFormat::PlainText),
        _ => None,
    }
}

/// Inspect a parsed JSON object's keys for a recognizable record shape.
fn from_json_shape(value: &serde_json::Value) -> Option<DataFormat> {
    let obj = value.as_object()?;
    let has = |keys: &[&str]| keys.iter().any(|k| obj.contains_key(*k));

    if has(&["email", "first_name", "last_name", "contact_name"]) {
        Some(DataFormat::CrmContact)
    } else if has(&["deal_name", "opportunity_name", "stage", "pipeline"]) {
        Some(DataFormat::CrmOpportunity)
    } else if has(&["sku", "product_name", "unit_price"]) {
        Some(DataFormat::ErpProduct)
    } else if has(&["order_number", "order_id", "line_items"]) {
        Some(DataFormat::ErpOrder)
    } else if has(&["invoice_number", "invoice_id", "amount_due"]) {
        Some(DataFormat::ErpInvoice)
    } else {
        None
    }
}

fn from_source_heuristic(source: &str) -> Option<DataFormat> {
    let lower = source.to_lowercase();
    if lower.contains("contact") {
        Some(DataFormat::CrmContact)
    } else if lower.contains("opportunity") || lower.contains("deal") {
        Some(DataFormat::CrmOpportunity)
    } else if lower.contains("product") || lower.contains("inventory") {
        Some(DataFormat::ErpProduct)
    } else if lower.contains("order") {
        Some(DataFormat::ErpOrder)
    } else if lower.contains("invoice") {
        Some(DataFormat::ErpInvoice)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn doc(content: &str, source: &str) -> Document {
        Document {
            id: "d1".into(),
            content: content.into(),
            source: source.into(),
            metadata: HashMap::new(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn metadata_hint_wins_over_everything() {
        let mut d = doc("not json at all", "crm_system");
        d.metadata.insert("data_format".into(), serde_json::json!("erp_product"));
        assert_eq!(detect(&d), DataFormat::ErpProduct);
    }

    #[test]
    fn json_shape_detects_contact() {
        let d = doc(r#"{"email": "a@b.com", "first_name": "A"}"#, "crm_export");
        assert_eq!(detect(&d), DataFormat::CrmContact);
    }

    #[test]
    fn json_without_recognizable_shape_falls_back_to_json() {
        let d = doc(r#"{"foo": "bar"}"#, "misc");
        assert_eq!(detect(&d), DataFormat::Json);
    }

    #[test]
    fn source_heuristic_when_not_json() {
        let d = doc("Jane Smith called about her order", "erp_orders_table");
        assert_eq!(detect(&d), DataFormat::ErpOrder);
    }

    #[test]
    fn plain_text_fallback() {
        let d = doc("just some prose", "notes");
        assert_eq!(detect(&d), DataFormat::PlainText);
    }
}
