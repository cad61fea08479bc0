//! Schema-less resource tree.
//!
//! A decoded response is turned into a tree of [`Node`]s once, up front.
//! Date-like fields are coerced to timestamps during construction and field
//! lookup is case-insensitive.
//!
//! Absent fields and explicit `null`s are both [`Node::Empty`], and every
//! accessor on an empty node returns another empty node, so navigation can
//! be chained without checks:
//!
//! ```rust
//! use xero_api::response::Node;
//! use serde_json::json;
//!
//! let node = Node::from_value(&json!({
//!     "Contact": {"Name": "ABC Ltd", "Addresses": [{"City": "Wellington"}]}
//! }));
//!
//! assert_eq!(node["contact"]["addresses"][0]["city"].as_str(), Some("Wellington"));
//! assert!(node["Contact"]["Phones"][3]["Number"].is_empty());
//! assert_eq!(node["Contact"]["Phones"].to_string(), "");
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

use super::timestamp::{coerce_timestamp, is_date_field};

static EMPTY: Node = Node::Empty;

/// A leaf value.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    /// A boolean.
    Bool(bool),
    /// A number, kept with its original JSON precision.
    Number(Number),
    /// A string.
    String(String),
    /// A timestamp coerced from a date-like field.
    Timestamp(DateTime<Utc>),
}

impl Scalar {
    fn to_json(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Timestamp(ts) => Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::Timestamp(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

/// One node of the resource tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Node {
    /// Absent field or explicit null.
    #[default]
    Empty,
    /// A leaf value.
    Scalar(Scalar),
    /// A map of named fields.
    Resource(Resource),
    /// An ordered list of items.
    Collection(Collection),
}

impl Node {
    /// Builds a node from an unnamed JSON value. No date coercion is applied
    /// at this level, only to named fields beneath it.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Bool(b) => Self::Scalar(Scalar::Bool(*b)),
            Value::Number(n) => Self::Scalar(Scalar::Number(n.clone())),
            Value::String(s) => Self::Scalar(Scalar::String(s.clone())),
            Value::Object(map) => Self::Resource(Resource::from_map(map)),
            Value::Array(items) => Self::Collection(Collection::from_values(items)),
        }
    }

    /// Builds a node for a named field, coercing date-like fields.
    #[must_use]
    pub fn from_field(name: &str, value: &Value) -> Self {
        if is_date_field(name) {
            if let Some(ts) = coerce_timestamp(value) {
                return Self::Scalar(Scalar::Timestamp(ts));
            }
        }
        Self::from_value(value)
    }

    /// Returns `true` for the empty placeholder.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns `true` if this node is a resource.
    #[must_use]
    pub const fn is_resource(&self) -> bool {
        matches!(self, Self::Resource(_))
    }

    /// Returns `true` if this node is a collection.
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }

    /// Looks up a field case-insensitively. Non-resources yield an empty node.
    #[must_use]
    pub fn get(&self, name: &str) -> &Self {
        match self {
            Self::Resource(resource) => resource.get(name),
            _ => &EMPTY,
        }
    }

    /// Returns the item at `index`. Non-collections yield an empty node.
    #[must_use]
    pub fn at(&self, index: usize) -> &Self {
        match self {
            Self::Collection(collection) => collection.get(index),
            _ => &EMPTY,
        }
    }

    /// Returns `true` if the named field is present and not empty.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        !self.get(name).is_empty()
    }

    /// Returns the resource, if this node is one.
    #[must_use]
    pub const fn as_resource(&self) -> Option<&Resource> {
        match self {
            Self::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    /// Returns the collection, if this node is one.
    #[must_use]
    pub const fn as_collection(&self) -> Option<&Collection> {
        match self {
            Self::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    /// Returns the string value, if this node holds one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer value, if this node holds one.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Scalar(Scalar::Number(n)) => n.as_i64(),
            _ => None,
        }
    }

    /// Returns the numeric value as a float, if this node holds a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Scalar(Scalar::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    /// Returns the boolean value, if this node holds one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Returns the timestamp, if this node was coerced to one.
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Scalar(Scalar::Timestamp(ts)) => Some(*ts),
            _ => None,
        }
    }

    /// Exports the subtree back to JSON. Timestamps become RFC 3339 strings.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Scalar(scalar) => scalar.to_json(),
            Self::Resource(resource) => resource.to_json(),
            Self::Collection(collection) => collection.to_json(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Scalar(scalar) => fmt::Display::fmt(scalar, f),
            Self::Resource(_) | Self::Collection(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl Index<&str> for Node {
    type Output = Self;

    fn index(&self, name: &str) -> &Self::Output {
        self.get(name)
    }
}

impl Index<usize> for Node {
    type Output = Self;

    fn index(&self, index: usize) -> &Self::Output {
        self.at(index)
    }
}

/// A map of named fields with case-insensitive lookup.
///
/// Field order follows the source document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resource {
    fields: Vec<(String, Node)>,
    index: HashMap<String, usize>,
}

impl Resource {
    /// Builds a resource from a JSON object.
    #[must_use]
    pub fn from_map(map: &Map<String, Value>) -> Self {
        map.iter()
            .map(|(name, value)| (name.clone(), Node::from_field(name, value)))
            .collect()
    }

    /// Looks up a field case-insensitively.
    ///
    /// Returns the empty node if the field is absent.
    #[must_use]
    pub fn get(&self, name: &str) -> &Node {
        self.index
            .get(&name.to_lowercase())
            .and_then(|&i| self.fields.get(i))
            .map_or(&EMPTY, |(_, node)| node)
    }

    /// Returns `true` if the named field is present and not empty.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        !self.get(name).is_empty()
    }

    /// Returns `true` if the field exists, even if it is null.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_lowercase())
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in source order, with original name casing.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.fields.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Exports the resource back to a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(name, node)| (name.clone(), node.to_json()))
                .collect(),
        )
    }
}

impl FromIterator<(String, Node)> for Resource {
    fn from_iter<I: IntoIterator<Item = (String, Node)>>(iter: I) -> Self {
        let mut resource = Self::default();
        for (name, node) in iter {
            let key = name.to_lowercase();
            match resource.index.get(&key) {
                Some(&i) => resource.fields[i] = (name, node),
                None => {
                    resource.index.insert(key, resource.fields.len());
                    resource.fields.push((name, node));
                }
            }
        }
        resource
    }
}

impl Index<&str> for Resource {
    type Output = Node;

    fn index(&self, name: &str) -> &Self::Output {
        self.get(name)
    }
}

/// An ordered list of nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collection {
    items: Vec<Node>,
}

impl Collection {
    /// Builds a collection from a JSON array.
    #[must_use]
    pub fn from_values(values: &[Value]) -> Self {
        Self {
            items: values.iter().map(Node::from_value).collect(),
        }
    }

    /// Builds a collection from already constructed nodes.
    #[must_use]
    pub fn from_nodes(items: Vec<Node>) -> Self {
        Self { items }
    }

    /// Returns the item at `index`, or the empty node.
    #[must_use]
    pub fn get(&self, index: usize) -> &Node {
        self.items.get(index).unwrap_or(&EMPTY)
    }

    /// Returns the first item, or the empty node.
    #[must_use]
    pub fn first(&self) -> &Node {
        self.get(0)
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns the number of items.
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if there are no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the items as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Node] {
        &self.items
    }

    /// Iterates over the items.
    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.items.iter()
    }

    /// Exports the collection back to a JSON array.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Array(self.items.iter().map(Node::to_json).collect())
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Index<usize> for Collection {
    type Output = Node;

    fn index(&self, index: usize) -> &Self::Output {
        self.get(index)
    }
}

// Verify tree types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Node>();
    assert_send_sync::<Resource>();
    assert_send_sync::<Collection>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let node = Node::from_value(&json!({"ContactID": "abc", "Name": "ABC Ltd"}));
        assert_eq!(node["contactid"].as_str(), Some("abc"));
        assert_eq!(node["CONTACTID"].as_str(), Some("abc"));
        assert_eq!(node.get("name").to_string(), "ABC Ltd");
    }

    #[test]
    fn test_absent_and_null_are_both_empty() {
        let node = Node::from_value(&json!({"Reference": null}));
        assert!(node["Reference"].is_empty());
        assert!(node["Missing"].is_empty());
        assert!(!node.has("Reference"));

        let resource = node.as_resource().unwrap();
        assert!(resource.contains("reference"));
        assert!(!resource.contains("missing"));
    }

    #[test]
    fn test_chained_navigation_through_empty_never_panics() {
        let node = Node::from_value(&json!({"A": 1}));
        assert!(node["A"]["B"][5]["C"].is_empty());
        assert!(node[0].is_empty());
        assert_eq!(node["Nope"].to_string(), "");
    }

    #[test]
    fn test_date_fields_are_coerced() {
        let node = Node::from_value(&json!({
            "UpdatedDateUTC": "/Date(1509454062181)/",
            "DueDate": "2017-01-01",
            "DateOfBirth": "1980-05-06T00:00:00",
            "Status": "2017-01-01",
            "Date": "not a date",
        }));

        assert_eq!(
            node["UpdatedDateUTC"].as_timestamp().unwrap().to_rfc3339(),
            "2017-10-31T12:47:42.181+00:00"
        );
        assert!(node["DueDate"].as_timestamp().is_some());
        assert!(node["DateOfBirth"].as_timestamp().is_some());
        assert_eq!(node["Status"].as_str(), Some("2017-01-01"));
        assert_eq!(node["Date"].as_str(), Some("not a date"));
    }

    #[test]
    fn test_collection_items_are_nested_nodes() {
        let node = Node::from_value(&json!([{"Name": "a"}, [1, 2], "x", null]));
        let collection = node.as_collection().unwrap();

        assert_eq!(collection.len(), 4);
        assert!(collection[0].is_resource());
        assert!(collection[1].is_collection());
        assert_eq!(collection[1][1].as_i64(), Some(2));
        assert_eq!(collection[2].as_str(), Some("x"));
        assert!(collection[3].is_empty());
        assert!(collection[9].is_empty());
    }

    #[test]
    fn test_scalar_accessors() {
        let node = Node::from_value(&json!({"Total": 12.5, "Count": 3, "Paid": true}));
        assert_eq!(node["Total"].as_f64(), Some(12.5));
        assert_eq!(node["Count"].as_i64(), Some(3));
        assert_eq!(node["Paid"].as_bool(), Some(true));
        assert_eq!(node["Paid"].as_str(), None);
        assert_eq!(node["Total"].to_string(), "12.5");
    }

    #[test]
    fn test_to_json_preserves_order_and_formats_timestamps() {
        let node = Node::from_value(&json!({
            "Zeta": 1,
            "Alpha": null,
            "CreatedDateUTC": "2017-11-28T12:00:00",
        }));
        let exported = node.to_json();

        let keys: Vec<&String> = exported.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["Zeta", "Alpha", "CreatedDateUTC"]);
        assert_eq!(exported["CreatedDateUTC"], "2017-11-28T12:00:00Z");
        assert_eq!(exported["Alpha"], Value::Null);
        assert_eq!(serde_json::to_value(&node).unwrap(), exported);
    }

    #[test]
    fn test_resource_iteration_keeps_original_names() {
        let node = Node::from_value(&json!({"InvoiceID": "1", "Type": "ACCREC"}));
        let names: Vec<&str> = node.as_resource().unwrap().iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["InvoiceID", "Type"]);
    }
}
