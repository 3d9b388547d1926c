//! Request and response shapes for the DynamoDB JSON RPC API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An item attribute in the service's tagged-union wire form, e.g.
/// `{"S": "text"}` or `{"N": "42"}`. Numbers travel as strings to keep
/// their full precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// A string.
    S(String),
    /// A number, carried as its decimal text.
    N(String),
    /// Binary data, base64 text on the wire.
    B(String),
    /// A boolean.
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// A set of strings.
    SS(Vec<String>),
    /// A set of numbers.
    NS(Vec<String>),
}

impl AttributeValue {
    /// A string attribute.
    pub fn s(v: impl Into<String>) -> Self {
        Self::S(v.into())
    }

    /// A number attribute.
    pub fn n(v: impl ToString) -> Self {
        Self::N(v.to_string())
    }
}

/// An item: attribute name to value.
pub type Item = HashMap<String, AttributeValue>;

/// Input for `ListTables`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListTablesInput {
    /// Resume listing after this table name.
    #[serde(rename = "ExclusiveStartTableName", skip_serializing_if = "Option::is_none")]
    pub exclusive_start_table_name: Option<String>,
    /// Page size.
    #[serde(rename = "Limit", skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

/// Output of `ListTables`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTablesOutput {
    /// Table names in this page.
    #[serde(rename = "TableNames", default)]
    pub table_names: Vec<String>,
    /// Set when the listing is truncated.
    #[serde(rename = "LastEvaluatedTableName", default)]
    pub last_evaluated_table_name: Option<String>,
}

/// Input for `PutItem`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PutItemInput {
    /// Target table.
    #[serde(rename = "TableName")]
    pub table_name: String,
    /// The item to write, replacing any same-keyed item.
    #[serde(rename = "Item")]
    pub item: Item,
    /// `ALL_OLD` returns the replaced item in `attributes`.
    #[serde(rename = "ReturnValues", skip_serializing_if = "Option::is_none")]
    pub return_values: Option<String>,
}

/// Output of `PutItem`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PutItemOutput {
    /// The replaced item, when `ReturnValues` asked for it.
    #[serde(rename = "Attributes", default)]
    pub attributes: Option<Item>,
}

/// Input for `GetItem`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GetItemInput {
    /// Target table.
    #[serde(rename = "TableName")]
    pub table_name: String,
    /// Primary key of the item to read.
    #[serde(rename = "Key")]
    pub key: Item,
    /// Strongly consistent read instead of the eventually consistent
    /// default.
    #[serde(rename = "ConsistentRead", skip_serializing_if = "Option::is_none")]
    pub consistent_read: Option<bool>,
}

/// Output of `GetItem`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetItemOutput {
    /// The item, absent when the key does not exist.
    #[serde(rename = "Item", default)]
    pub item: Option<Item>,
}

/// Input for `DeleteItem`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeleteItemInput {
    /// Target table.
    #[serde(rename = "TableName")]
    pub table_name: String,
    /// Primary key of the item to delete.
    #[serde(rename = "Key")]
    pub key: Item,
    /// `ALL_OLD` returns the deleted item in `attributes`.
    #[serde(rename = "ReturnValues", skip_serializing_if = "Option::is_none")]
    pub return_values: Option<String>,
}

/// Output of `DeleteItem`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteItemOutput {
    /// The deleted item, when `ReturnValues` asked for it.
    #[serde(rename = "Attributes", default)]
    pub attributes: Option<Item>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_attribute_value_wire_form() {
        assert_eq!(
            serde_json::to_string(&AttributeValue::s("hello")).unwrap(),
            r#"{"S":"hello"}"#
        );
        assert_eq!(
            serde_json::to_string(&AttributeValue::n(42)).unwrap(),
            r#"{"N":"42"}"#
        );
        assert_eq!(
            serde_json::to_string(&AttributeValue::Bool(true)).unwrap(),
            r#"{"BOOL":true}"#
        );

        let back: AttributeValue = serde_json::from_str(r#"{"SS":["a","b"]}"#).unwrap();
        assert_eq!(back, AttributeValue::SS(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_list_tables_input_omits_absent_fields() {
        let body = serde_json::to_string(&ListTablesInput {
            limit: Some(10),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, r#"{"Limit":10}"#);
    }

    #[test]
    fn test_get_item_output_without_item() {
        let out: GetItemOutput = serde_json::from_str("{}").unwrap();
        assert!(out.item.is_none());
    }
}
