//! Default tool definitions registered with the [`sa_tools::ToolDispatcher`]
//! at startup, matching the tool names `sa_orchestrator::routing::select_tools`
//! emits.

use std::collections::HashMap;

use sa_domain::tool::{HttpMethod, ParameterSpec, ParameterType, ServiceType, ToolDefinition};

fn string_param(required: bool) -> ParameterSpec {
    ParameterSpec { param_type: ParameterType::String, required, enum_values: None, default: None }
}

fn def(
    name: &str,
    service_type: ServiceType,
    endpoint: &str,
    method: HttpMethod,
    required_parameters: &[&str],
    cache_ttl_secs: u64,
) -> ToolDefinition {
    let required: Vec<String> = required_parameters.iter().map(|s| s.to_string()).collect();
    let mut parameter_schema = HashMap::new();
    for name in &required {
        parameter_schema.insert(name.clone(), string_param(true));
    }
    ToolDefinition {
        name: name.to_string(),
        service_type,
        endpoint: endpoint.to_string(),
        method,
        parameter_schema,
        required_parameters: required,
        timeout_secs: 30,
        retry_count: 3,
        cache_ttl_secs,
        rate_limit_per_minute: 60,
        auth: None,
    }
}

/// The ten business-API tools `select_tools` routes to, one per CRM/ERP
/// operation plus scheduling. Endpoints assume a business-API gateway
/// reachable at the dispatcher's configured host (spec.md §1 Non-goals:
/// "CRM/ERP system internals").
pub fn default_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        def("create_crm_contact", ServiceType::Crm, "/crm/contacts", HttpMethod::Post, &["name"], 0),
        def("update_crm_contact", ServiceType::Crm, "/crm/contacts/{name}", HttpMethod::Patch, &["name"], 0),
        def("search_crm_contact", ServiceType::Crm, "/crm/contacts/search", HttpMethod::Get, &[], 60),
        def("create_erp_order", ServiceType::Erp, "/erp/orders", HttpMethod::Post, &["product"], 0),
        def("update_erp_order", ServiceType::Erp, "/erp/orders/{product}", HttpMethod::Patch, &["product"], 0),
        def("search_erp_order", ServiceType::Erp, "/erp/orders/search", HttpMethod::Get, &[], 60),
        def("get_erp_inventory", ServiceType::Erp, "/erp/inventory/{product}", HttpMethod::Get, &["product"], 30),
        def("update_erp_inventory", ServiceType::Erp, "/erp/inventory/{product}", HttpMethod::Patch, &["product"], 0),
        def("generate_erp_report", ServiceType::Erp, "/erp/reports", HttpMethod::Post, &[], 0),
        def("schedule_meeting", ServiceType::General, "/scheduling/meetings", HttpMethod::Post, &["time"], 0),
    ]
}
