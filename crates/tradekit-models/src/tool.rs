use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared type of a tool parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    /// Structural check of a JSON value against this type.
    /// Integers are accepted where a number is declared.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The executable binding behind a tool. Closed set: every variant is
/// resolved by the broker executor's dispatch table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    GetAccount,
    GetPositions,
    GetPortfolioHistory,
    PlaceMarketOrder,
    PlaceLimitOrder,
    GetOrders,
    CancelOrder,
    GetBars,
    GetLatestQuote,
    GetClock,
    GetPortfolioForAgents,
}

impl ToolKind {
    /// Read-only tools never mutate brokerage state.
    pub fn is_read_only(&self) -> bool {
        !matches!(
            self,
            ToolKind::PlaceMarketOrder | ToolKind::PlaceLimitOrder | ToolKind::CancelOrder
        )
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub description: String,
    pub required: bool,
    /// Value used when an optional parameter is omitted. `None` serializes as null.
    pub default: Option<Value>,
}

impl ToolParameter {
    pub fn required(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            description: description.to_string(),
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &str, param_type: ParamType, description: &str, default: Value) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            description: description.to_string(),
            required: false,
            default: if default.is_null() { None } else { Some(default) },
        }
    }
}

/// A named, schema-described operation an agent or HTTP client may invoke.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing)]
    pub kind: ToolKind,
    pub parameters: Vec<ToolParameter>,
    pub category: String,
    pub enabled: bool,
}

impl Tool {
    pub fn new(name: &str, description: &str, kind: ToolKind, category: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind,
            parameters: Vec::new(),
            category: category.to_string(),
            enabled: true,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<ToolParameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &ToolParameter> {
        self.parameters.iter().filter(|p| p.required)
    }

    /// Render the function-calling schema for this tool.
    pub fn schema(&self) -> ToolSchema {
        let properties = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    PropertySchema {
                        param_type: p.param_type,
                        description: p.description.clone(),
                        default: p.default.clone(),
                    },
                )
            })
            .collect();

        ToolSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: ParametersSchema {
                schema_type: "object".to_string(),
                properties,
                required: self.required_parameters().map(|p| p.name.clone()).collect(),
            },
        }
    }
}

/// Schema record handed to an LLM function-calling interface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: ParametersSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParametersSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: BTreeMap<String, PropertySchema>,
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub description: String,
    pub default: Option<Value>,
}

impl ToolSchema {
    pub fn required(&self) -> &[String] {
        &self.parameters.required
    }

    /// Parameter names not listed as required.
    pub fn optional(&self) -> Vec<&str> {
        self.parameters
            .properties
            .keys()
            .filter(|name| !self.parameters.required.contains(name))
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn limit_order_tool() -> Tool {
        Tool::new(
            "place_limit_order",
            "Place a limit order with a specific price",
            ToolKind::PlaceLimitOrder,
            "alpaca_trading",
        )
        .with_parameters(vec![
            ToolParameter::required("symbol", ParamType::String, "Ticker symbol"),
            ToolParameter::required("qty", ParamType::Number, "Share quantity"),
            ToolParameter::required("limit_price", ParamType::Number, "Limit price"),
            ToolParameter::optional("side", ParamType::String, "buy or sell", json!("buy")),
        ])
    }

    #[test]
    fn schema_partitions_required_and_optional() {
        let schema = limit_order_tool().schema();
        assert_eq!(schema.required(), ["symbol", "qty", "limit_price"]);
        assert_eq!(schema.optional(), vec!["side"]);
        assert_eq!(schema.parameters.schema_type, "object");
        assert_eq!(
            schema.parameters.properties["side"].default,
            Some(json!("buy"))
        );
    }

    #[test]
    fn schema_serializes_type_names() {
        let value = serde_json::to_value(limit_order_tool().schema()).unwrap();
        assert_eq!(value["parameters"]["properties"]["qty"]["type"], "number");
        assert_eq!(value["parameters"]["properties"]["symbol"]["default"], Value::Null);
        assert_eq!(value["parameters"]["required"][0], "symbol");
    }

    #[test]
    fn tool_info_omits_kind() {
        let value = serde_json::to_value(limit_order_tool()).unwrap();
        assert!(value.get("kind").is_none());
        assert_eq!(value["parameters"][3]["required"], false);
        assert_eq!(value["enabled"], true);
    }

    #[test]
    fn param_type_matching() {
        assert!(ParamType::Number.matches(&json!(10)));
        assert!(ParamType::Number.matches(&json!(10.5)));
        assert!(ParamType::Integer.matches(&json!(50)));
        assert!(!ParamType::Integer.matches(&json!(50.5)));
        assert!(ParamType::Array.matches(&json!(["AAPL"])));
        assert!(!ParamType::String.matches(&json!(1)));
        assert!(ParamType::Object.matches(&json!({})));
    }

    #[test]
    fn null_default_becomes_none() {
        let param = ToolParameter::optional("symbols", ParamType::Array, "filter", Value::Null);
        assert!(!param.required);
        assert!(param.default.is_none());
    }

    #[test]
    fn order_tools_are_not_read_only() {
        assert!(!ToolKind::PlaceMarketOrder.is_read_only());
        assert!(!ToolKind::CancelOrder.is_read_only());
        assert!(ToolKind::GetClock.is_read_only());
    }
}
