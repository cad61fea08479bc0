//! Response shape classification.
//!
//! The Xero APIs wrap their payloads in several different envelopes. A
//! [`ResponseEnvelope`] recognizes the shape, pulls the resource data out,
//! and separates pagination, problem details and metadata from it.
//!
//! # Shapes
//!
//! | [`Structure`]          | Recognized by                                         |
//! |------------------------|-------------------------------------------------------|
//! | `Empty`                | null, `{}`, `[]` or an empty string                   |
//! | `NakedCollection`      | a top-level array                                     |
//! | `OldFormat`            | `ProviderName` and `Status`                           |
//! | `ProblemDetail`        | `ProviderName` and a non-null `Problem`               |
//! | `SingleWithHeader`     | `ProviderName` with null or absent `Pagination`       |
//! | `CollectionWithHeader` | `ProviderName` and `Pagination`, or `Items` + `TotalCount` |
//! | `Message`              | a `message` field                                     |
//! | `NakedResource`        | any other object                                      |
//!
//! Field names are matched case-insensitively throughout. Unrecognized or
//! malformed shapes never fail; they produce an empty resource.
//!
//! # Example
//!
//! ```rust
//! use xero_api::response::{ResponseEnvelope, Structure};
//! use serde_json::json;
//!
//! let envelope = ResponseEnvelope::from_value(&json!({
//!     "Id": "a1b2",
//!     "Status": "OK",
//!     "ProviderName": "My App",
//!     "DateTimeUTC": "/Date(1509454062181)/",
//!     "Contacts": [{"Name": "ABC Ltd"}, {"Name": "XYZ Ltd"}]
//! }));
//!
//! assert_eq!(envelope.structure(), Structure::OldFormat);
//! assert_eq!(envelope.count(), 2);
//! assert_eq!(envelope.first()["name"].as_str(), Some("ABC Ltd"));
//! assert!(envelope.metadata()["DateTimeUTC"].as_timestamp().is_some());
//! ```

use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashMap;

use super::decode::{decode_body, XML_ATTRIBUTES_KEY};
use super::node::{Collection, Node, Resource};
use crate::clients::HttpResponse;

const PROVIDER_NAME: &str = "providername";
const STATUS: &str = "status";
const PROBLEM: &str = "problem";
const PAGINATION: &str = "pagination";
const ITEMS: &str = "items";
const TOTAL_COUNT: &str = "totalcount";
const MESSAGE: &str = "message";

/// The envelope shape a response was recognized as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Structure {
    /// No data at all.
    Empty,
    /// New format: header fields around a single resource.
    SingleWithHeader,
    /// New format: header fields and pagination around a list.
    CollectionWithHeader,
    /// Old format: `Status`/`ProviderName` header around a resource list.
    OldFormat,
    /// A bare list of resources.
    NakedCollection,
    /// A bare single resource.
    NakedResource,
    /// A simple error message.
    Message,
    /// New format structured error detail.
    ProblemDetail,
}

/// A classified response.
///
/// Read-only once built. The resource is a [`Node::Resource`], a
/// [`Node::Collection`], or [`Node::Empty`] when the response carried none.
#[derive(Clone, Debug)]
pub struct ResponseEnvelope {
    structure: Structure,
    resource: Node,
    pagination: Resource,
    problem: Resource,
    metadata: Resource,
    source: Map<String, Value>,
    source_index: HashMap<String, String>,
}

// Verify ResponseEnvelope is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResponseEnvelope>();
};

impl ResponseEnvelope {
    /// Decodes and classifies an HTTP response body.
    #[must_use]
    pub fn from_response(response: &HttpResponse) -> Self {
        Self::from_value(&decode_body(response))
    }

    /// Classifies an already decoded body.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let envelope = match value {
            Value::Array(items) if !items.is_empty() => Self {
                resource: Node::Collection(Collection::from_values(items)),
                ..Self::empty(Structure::NakedCollection)
            },
            Value::Object(map) if !map.is_empty() => Self::from_map(map),
            Value::String(message) if !message.is_empty() => {
                let mut map = Map::new();
                map.insert("message".to_string(), Value::String(message.clone()));
                Self::from_map(&map)
            }
            _ => Self::empty(Structure::Empty),
        };

        tracing::debug!(
            structure = ?envelope.structure,
            count = envelope.count(),
            "Classified response"
        );
        envelope
    }

    fn empty(structure: Structure) -> Self {
        Self {
            structure,
            resource: Node::Empty,
            pagination: Resource::default(),
            problem: Resource::default(),
            metadata: Resource::default(),
            source: Map::new(),
            source_index: HashMap::new(),
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let source_index: HashMap<String, String> = map
            .keys()
            .map(|key| (key.to_lowercase(), key.clone()))
            .collect();
        let field = |name: &str| source_index.get(name).and_then(|key| map.get(key));
        let present = |name: &str| source_index.contains_key(name);
        let non_null = |name: &str| field(name).is_some_and(|v| !v.is_null());

        let structure = if present(PROVIDER_NAME) {
            if present(STATUS) {
                Structure::OldFormat
            } else if non_null(PROBLEM) {
                Structure::ProblemDetail
            } else if non_null(PAGINATION) {
                Structure::CollectionWithHeader
            } else {
                Structure::SingleWithHeader
            }
        } else if present(ITEMS) && present(TOTAL_COUNT) {
            Structure::CollectionWithHeader
        } else if present(MESSAGE) {
            Structure::Message
        } else {
            Structure::NakedResource
        };

        let mut envelope = Self {
            source: map.clone(),
            source_index: source_index.clone(),
            ..Self::empty(structure)
        };

        match structure {
            Structure::Message => {
                envelope.metadata = Resource::from_map(map);
                return envelope;
            }
            Structure::NakedResource => {
                envelope.resource = Node::Resource(Resource::from_map(map));
                return envelope;
            }
            _ => {}
        }

        if let Some(Value::Object(pagination)) = field(PAGINATION) {
            envelope.pagination = Resource::from_map(pagination);
        }
        if let Some(Value::Object(problem)) = field(PROBLEM) {
            envelope.problem = Resource::from_map(problem);
        }

        let resource_key = map
            .iter()
            .find(|(key, value)| {
                let lower = key.to_lowercase();
                lower != PAGINATION
                    && lower != PROBLEM
                    && key.as_str() != XML_ATTRIBUTES_KEY
                    && (value.is_object() || value.is_array())
            })
            .map(|(key, _)| key.as_str());

        if let Some(key) = resource_key {
            let value = &map[key];
            envelope.resource = if structure == Structure::OldFormat {
                Node::Collection(old_format_collection(key, value))
            } else {
                Node::from_value(value)
            };
        }

        envelope.metadata = map
            .iter()
            .filter(|(key, _)| {
                let lower = key.to_lowercase();
                Some(key.as_str()) != resource_key && lower != PAGINATION && lower != PROBLEM
            })
            .map(|(key, value)| (key.clone(), Node::from_field(key, value)))
            .collect();

        envelope
    }

    /// Returns the recognized shape.
    #[must_use]
    pub const fn structure(&self) -> Structure {
        self.structure
    }

    /// Returns the resource node: a resource, a collection, or empty.
    #[must_use]
    pub const fn resource(&self) -> &Node {
        &self.resource
    }

    /// Returns the first resource: the first item of a collection, the
    /// resource itself, or the empty node.
    #[must_use]
    pub fn first(&self) -> &Node {
        match &self.resource {
            Node::Collection(collection) => collection.first(),
            other => other,
        }
    }

    /// Looks up a field on the first resource, case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> &Node {
        self.first().get(name)
    }

    /// Returns the resources as a collection.
    ///
    /// A lone resource is wrapped in a one-element collection; no resource
    /// gives an empty collection.
    #[must_use]
    pub fn collection(&self) -> Cow<'_, Collection> {
        match &self.resource {
            Node::Collection(collection) => Cow::Borrowed(collection),
            Node::Empty => Cow::Owned(Collection::default()),
            single => Cow::Owned(Collection::from_nodes(vec![single.clone()])),
        }
    }

    /// Returns the number of resources.
    #[must_use]
    pub fn count(&self) -> usize {
        match &self.resource {
            Node::Collection(collection) => collection.len(),
            Node::Empty => 0,
            _ => 1,
        }
    }

    /// Iterates over the resources. A single resource yields one item.
    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        let items: &[Node] = match &self.resource {
            Node::Collection(collection) => collection.as_slice(),
            Node::Empty => &[],
            single => std::slice::from_ref(single),
        };
        items.iter()
    }

    /// Returns `true` if the response carried no resource.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.resource.is_empty()
    }

    /// Returns `true` if the resource is a collection, even an empty one.
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        self.resource.is_collection()
    }

    /// Returns `true` if the resource is a single resource.
    #[must_use]
    pub const fn is_resource(&self) -> bool {
        self.resource.is_resource()
    }

    /// Returns the pagination details. Empty when there are none.
    #[must_use]
    pub const fn pagination(&self) -> &Resource {
        &self.pagination
    }

    /// Returns the problem details. Empty when there are none.
    #[must_use]
    pub const fn problem(&self) -> &Resource {
        &self.problem
    }

    /// Returns the top-level fields that are neither resource, pagination
    /// nor problem.
    #[must_use]
    pub const fn metadata(&self) -> &Resource {
        &self.metadata
    }

    /// Returns the error message carried by a message or problem envelope.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.metadata
            .get(MESSAGE)
            .as_str()
            .or_else(|| self.problem.get("detail").as_str())
            .or_else(|| self.problem.get("title").as_str())
    }

    /// Returns `true` if the top-level source had a field of this name.
    #[must_use]
    pub fn has_source_field(&self, name: &str) -> bool {
        self.source_index.contains_key(&name.to_lowercase())
    }

    /// Returns a raw top-level source field, case-insensitively.
    #[must_use]
    pub fn source_field(&self, name: &str) -> Option<&Value> {
        self.source_index
            .get(&name.to_lowercase())
            .and_then(|key| self.source.get(key))
    }

    /// Returns the raw top-level source fields.
    #[must_use]
    pub const fn source(&self) -> &Map<String, Value> {
        &self.source
    }
}

impl<'a> IntoIterator for &'a ResponseEnvelope {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Old-format lists are always collections. XML bodies nest the items one
/// level deeper (`{"Invoices": {"Invoice": [...]}}`), so a wrapper whose only
/// field is the singular of the list name is unwrapped first.
fn old_format_collection(name: &str, value: &Value) -> Collection {
    let value = match value {
        Value::Object(map) if map.len() == 1 => match map.iter().next() {
            Some((item, inner))
                if is_item_name(name, item) && (inner.is_object() || inner.is_array()) =>
            {
                inner
            }
            _ => value,
        },
        _ => value,
    };

    match value {
        Value::Array(items) => Collection::from_values(items),
        single => Collection::from_nodes(vec![Node::from_value(single)]),
    }
}

/// Returns `true` if `item` is the singular of the list name `list`, as
/// `Invoice` is of `Invoices` and `Category` of `Categories`.
fn is_item_name(list: &str, item: &str) -> bool {
    let list = list.to_lowercase();
    let item = item.to_lowercase();
    if item.is_empty() {
        return false;
    }
    if list == format!("{item}s") || list == format!("{item}es") {
        return true;
    }
    item.strip_suffix('y').is_some_and(|stem| list == format!("{stem}ies"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_inputs() {
        for value in [json!(null), json!({}), json!([]), json!("")] {
            let envelope = ResponseEnvelope::from_value(&value);
            assert_eq!(envelope.structure(), Structure::Empty);
            assert!(envelope.is_empty());
            assert_eq!(envelope.count(), 0);
            assert!(envelope.collection().is_empty());
            assert_eq!(envelope.iter().count(), 0);
        }
    }

    #[test]
    fn test_naked_collection() {
        let envelope = ResponseEnvelope::from_value(&json!([{"A": 1}, {"A": 2}, {"A": 3}]));
        assert_eq!(envelope.structure(), Structure::NakedCollection);
        assert!(envelope.is_collection());
        assert_eq!(envelope.count(), 3);
        assert_eq!(envelope.collection().count(), 3);
        assert_eq!(envelope.first()["a"].as_i64(), Some(1));
    }

    #[test]
    fn test_old_format_payments() {
        let envelope = ResponseEnvelope::from_value(&json!({
            "Payments": [
                {"PaymentID": "p1"},
                {"PaymentID": "p2"},
                {"PaymentID": "p3"}
            ],
            "ProviderName": "X",
            "DateTimeUTC": "/Date(1509454062181)/",
            "Status": "OK"
        }));

        assert_eq!(envelope.structure(), Structure::OldFormat);
        assert!(envelope.is_collection());
        assert_eq!(envelope.count(), 3);
        assert!(envelope.metadata().contains("ProviderName"));
        assert!(envelope.metadata().contains("DateTimeUTC"));
        assert!(!envelope.metadata().contains("Payments"));
        assert!(envelope.metadata()["DateTimeUTC"].as_timestamp().is_some());
    }

    #[test]
    fn test_old_format_single_item_is_still_a_collection() {
        let envelope = ResponseEnvelope::from_value(&json!({
            "Status": "OK",
            "ProviderName": "X",
            "Invoices": [{"InvoiceID": "i1"}]
        }));
        assert!(envelope.is_collection());
        assert!(!envelope.is_resource());
        assert_eq!(envelope.count(), 1);
        assert_eq!(envelope.first()["InvoiceID"].as_str(), Some("i1"));
    }

    #[test]
    fn test_old_format_xml_wrapper_is_unwrapped() {
        let envelope = ResponseEnvelope::from_value(&json!({
            "Status": "OK",
            "ProviderName": "X",
            "Invoices": {"Invoice": {"InvoiceID": "i1"}}
        }));
        assert!(envelope.is_collection());
        assert_eq!(envelope.count(), 1);
        assert_eq!(envelope.get("invoiceid").as_str(), Some("i1"));
    }

    #[test]
    fn test_old_format_single_resource_with_one_nested_field_is_kept() {
        let envelope = ResponseEnvelope::from_value(&json!({
            "Status": "OK",
            "ProviderName": "X",
            "Contact": {"Addresses": [{"City": "Wellington"}, {"City": "Auckland"}]}
        }));
        assert!(envelope.is_collection());
        assert_eq!(envelope.count(), 1);
        assert!(envelope.first().has("addresses"));
        assert_eq!(envelope.get("addresses").at(1)["city"].as_str(), Some("Auckland"));
    }

    #[test]
    fn test_xml_attributes_are_never_the_resource() {
        let envelope = ResponseEnvelope::from_value(&json!({
            "@attributes": {"xmlns:xsi": "http://www.w3.org/2001/XMLSchema-instance"},
            "Status": "OK",
            "ProviderName": "X",
            "Invoices": {"Invoice": [{"InvoiceID": "i1"}, {"InvoiceID": "i2"}]}
        }));
        assert_eq!(envelope.count(), 2);
        assert_eq!(envelope.first()["InvoiceID"].as_str(), Some("i1"));
        assert!(!envelope.metadata().contains("Invoices"));
    }

    #[test]
    fn test_item_names() {
        assert!(is_item_name("Invoices", "Invoice"));
        assert!(is_item_name("Addresses", "Address"));
        assert!(is_item_name("TrackingCategories", "TrackingCategory"));
        assert!(is_item_name("taxrates", "TaxRate"));
        assert!(!is_item_name("Contact", "Addresses"));
        assert!(!is_item_name("Invoices", "Invoices"));
        assert!(!is_item_name("Invoices", ""));
    }

    #[test]
    fn test_single_with_header() {
        let envelope = ResponseEnvelope::from_value(&json!({
            "Id": "x",
            "ProviderName": "X",
            "DateTimeUTC": "2017-11-28T12:00:00",
            "Pagination": null,
            "Employee": {"EmployeeID": "e1", "DateOfBirth": "1980-01-01T00:00:00"}
        }));

        assert_eq!(envelope.structure(), Structure::SingleWithHeader);
        assert!(envelope.is_resource());
        assert_eq!(envelope.count(), 1);
        assert_eq!(envelope.collection().count(), 1);
        assert!(envelope.get("dateofbirth").as_timestamp().is_some());
        assert!(envelope.pagination().is_empty());
        assert!(!envelope.metadata().contains("Pagination"));
        assert!(envelope.metadata().contains("Id"));
    }

    #[test]
    fn test_collection_with_header_and_pagination() {
        let envelope = ResponseEnvelope::from_value(&json!({
            "ProviderName": "X",
            "Pagination": {"page": 1, "pageSize": 100, "pageCount": 1, "itemCount": 2},
            "Problem": null,
            "Employees": [{"EmployeeID": "e1"}, {"EmployeeID": "e2"}]
        }));

        assert_eq!(envelope.structure(), Structure::CollectionWithHeader);
        assert_eq!(envelope.count(), 2);
        assert_eq!(envelope.pagination()["itemcount"].as_i64(), Some(2));
        assert!(!envelope.metadata().contains("Pagination"));
        assert!(!envelope.metadata().contains("Employees"));
    }

    #[test]
    fn test_files_items_with_total_count() {
        let envelope = ResponseEnvelope::from_value(&json!({"Items": [], "TotalCount": 0}));
        assert_eq!(envelope.structure(), Structure::CollectionWithHeader);
        assert!(envelope.is_collection());
        assert!(!envelope.is_empty());
        assert!(envelope.collection().is_empty());
        assert_eq!(envelope.metadata()["TotalCount"].as_i64(), Some(0));
    }

    #[test]
    fn test_problem_detail() {
        let envelope = ResponseEnvelope::from_value(&json!({
            "ProviderName": "X",
            "Problem": {"title": "Validation error", "detail": "Start date is required", "status": 400},
            "httpStatusCode": "BadRequest"
        }));

        assert_eq!(envelope.structure(), Structure::ProblemDetail);
        assert!(envelope.is_empty());
        assert_eq!(envelope.problem()["Status"].as_i64(), Some(400));
        assert_eq!(envelope.message(), Some("Start date is required"));
    }

    #[test]
    fn test_message() {
        let envelope = ResponseEnvelope::from_value(&json!({
            "message": "oauth_problem=token_rejected",
            "httpStatusCode": 401
        }));

        assert_eq!(envelope.structure(), Structure::Message);
        assert!(envelope.is_empty());
        assert_eq!(envelope.message(), Some("oauth_problem=token_rejected"));
        assert_eq!(envelope.metadata()["httpStatusCode"].as_i64(), Some(401));
    }

    #[test]
    fn test_naked_resource() {
        let envelope = ResponseEnvelope::from_value(&json!({"Foo": "Bar", "wiggly": "woo"}));

        assert_eq!(envelope.structure(), Structure::NakedResource);
        assert!(envelope.is_resource());
        assert_eq!(envelope.count(), 1);
        assert_eq!(envelope.iter().count(), 1);
        assert_eq!(envelope.get("foo").as_str(), Some("Bar"));
        assert!(envelope.metadata().is_empty());
    }

    #[test]
    fn test_source_fields_are_case_insensitive() {
        let data = json!({"Foo": "Bar", "wiggly": "woo"});
        let envelope = ResponseEnvelope::from_value(&data);

        assert!(envelope.has_source_field("foo"));
        assert!(envelope.has_source_field("FOO"));
        assert!(envelope.has_source_field("Wiggly"));
        assert!(!envelope.has_source_field("bar"));
        assert_eq!(envelope.source_field("foo"), Some(&json!("Bar")));
        assert_eq!(envelope.source_field("Wiggly"), Some(&json!("woo")));
        assert_eq!(envelope.source_field("bumblebee"), None);
        assert_eq!(&Value::Object(envelope.source().clone()), &data);
    }

    #[test]
    fn test_iteration_over_envelope() {
        let envelope = ResponseEnvelope::from_value(&json!([{"N": 1}, {"N": 2}]));
        let total: i64 = (&envelope)
            .into_iter()
            .filter_map(|node| node["n"].as_i64())
            .sum();
        assert_eq!(total, 3);
    }
}
