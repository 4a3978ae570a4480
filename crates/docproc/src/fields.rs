//! Field-mapping tables: multiple accepted aliases per canonical field,
//! applied to produce a deterministic "Label: value." sentence sequence
//! (spec.md §4.2, DESIGN.md supplemented feature: full alias-table-driven
//! rendering).

use sa_domain::document::DataFormat;

/// `(canonical_label, [aliases...])`, in rendering order.
pub type FieldMap = &'static [(&'static str, &'static [&'static str])];

pub const CRM_CONTACT: FieldMap = &[
    ("Name", &["contact_name", "name", "full_name"]),
    ("First name", &["first_name", "firstname"]),
    ("Last name", &["last_name", "lastname"]),
    ("Email", &["email", "email_address"]),
    ("Phone", &["phone", "phone_number", "mobile"]),
    ("Company", &["company", "company_name", "account_name"]),
    ("Title", &["title", "job_title"]),
];

pub const CRM_OPPORTUNITY: FieldMap = &[
    ("Deal", &["deal_name", "opportunity_name", "name"]),
    ("Stage", &["stage", "pipeline_stage"]),
    ("Amount", &["amount", "deal_value", "value"]),
    ("Close date", &["close_date", "expected_close_date"]),
    ("Owner", &["owner", "owner_name", "assigned_to"]),
];

pub const ERP_PRODUCT: FieldMap = &[
    ("Product", &["product_name", "name"]),
    ("SKU", &["sku", "product_code"]),
    ("Price", &["unit_price", "price"]),
    ("Category", &["category", "product_category"]),
    ("Stock", &["stock_quantity", "quantity_on_hand", "inventory"]),
];

pub const ERP_ORDER: FieldMap = &[
    ("Order", &["order_number", "order_id"]),
    ("Customer", &["customer_name", "customer"]),
    ("Status", &["status", "order_status"]),
    ("Total", &["total", "order_total", "amount"]),
    ("Order date", &["order_date", "created_at"]),
];

pub const ERP_INVOICE: FieldMap = &[
    ("Invoice", &["invoice_number", "invoice_id"]),
    ("Customer", &["customer_name", "customer"]),
    ("Amount due", &["amount_due", "balance"]),
    ("Due date", &["due_date"]),
    ("Status", &["status", "payment_status"]),
];

pub const GENERIC_RECORD: FieldMap = &[
    ("ID", &["id", "record_id"]),
    ("Name", &["name", "title"]),
    ("Type", &["type", "record_type"]),
    ("Description", &["description", "notes", "summary"]),
];

pub fn table_for(format: DataFormat) -> Option<FieldMap> {
    match format {
        DataFormat::CrmContact => Some(CRM_CONTACT),
        DataFormat::CrmOpportunity => Some(CRM_OPPORTUNITY),
        DataFormat::ErpProduct => Some(ERP_PRODUCT),
        DataFormat::ErpOrder => Some(ERP_ORDER),
        DataFormat::ErpInvoice => Some(ERP_INVOICE),
        DataFormat::GenericRecord => Some(GENERIC_RECORD),
        DataFormat::Json | DataFormat::PlainText => None,
    }
}

/// Render a JSON object into a "Label: value." sentence sequence using the
/// first matching alias for each canonical field, skipping absent fields.
pub fn render(table: FieldMap, obj: &serde_json::Map<String, serde_json::Value>) -> String {
    let mut sentences = Vec::new();
    for (label, aliases) in table {
        let value = aliases.iter().find_map(|alias| obj.get(*alias)).and_then(value_to_string);
        if let Some(value) = value {
            if !value.is_empty() {
                sentences.push(format!("{label}: {value}."));
            }
        }
    }
    sentences.join(" ")
}

fn value_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_first_matching_alias_per_field() {
        let obj = json!({"contact_name": "Jane Smith", "email": "jane@acme.com"});
        let out = render(CRM_CONTACT, obj.as_object().unwrap());
        assert_eq!(out, "Name: Jane Smith. Email: jane@acme.com.");
    }

    #[test]
    fn missing_fields_are_skipped_deterministically() {
        let obj = json!({"sku": "SKU-1"});
        let out = render(ERP_PRODUCT, obj.as_object().unwrap());
        assert_eq!(out, "SKU: SKU-1.");
    }
}
