//! Response body decoding.
//!
//! Turns a raw response body into a [`serde_json::Value`] according to its
//! content type, so that every supported format reaches the envelope
//! classifier in the same map/list shape.
//!
//! | Content type                    | Result                                  |
//! |---------------------------------|-----------------------------------------|
//! | `application/json`              | parsed JSON                             |
//! | `text/xml`, `application/xml`   | converted XML (see [`xml_to_value`])    |
//! | anything else                   | `{"message": body, "httpStatusCode": n}`|
//!
//! JSON that fails to parse, or parses to a bare string, is wrapped into the
//! message shape too. An empty body decodes to `null`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{json, Map, Value};

use crate::clients::HttpResponse;

/// Key under which XML attributes are collected.
pub const XML_ATTRIBUTES_KEY: &str = "@attributes";

/// Key holding the text of an XML element that also carries attributes.
pub const XML_TEXT_KEY: &str = "@text";

/// Decodes the body of a response.
#[must_use]
pub fn decode_body(response: &HttpResponse) -> Value {
    decode(&response.body, response.content_type(), response.code)
}

/// Decodes a raw body given its `Content-Type` header and status code.
///
/// Any `; charset=...` suffix on the content type is ignored.
#[must_use]
pub fn decode(body: &[u8], content_type: Option<&str>, status: u16) -> Value {
    let text = String::from_utf8_lossy(body);
    if text.trim().is_empty() {
        return Value::Null;
    }

    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();

    let decoded = match mime.as_str() {
        "application/json" => match serde_json::from_str::<Value>(&text) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(status, %error, "Response body is not valid JSON");
                Value::String(text.into_owned())
            }
        },
        "text/xml" | "application/xml" => match xml_to_value(&text) {
            Some(value) => value,
            None => {
                tracing::warn!(status, "Response body is not valid XML");
                Value::String(text.into_owned())
            }
        },
        _ => Value::String(text.into_owned()),
    };

    match decoded {
        Value::String(message) => json!({
            "message": message,
            "httpStatusCode": status,
        }),
        other => other,
    }
}

/// An element being assembled while walking the XML event stream.
#[derive(Default)]
struct Element {
    name: String,
    attributes: Map<String, Value>,
    text: String,
    children: Vec<(String, Vec<Value>)>,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Self {
        let mut attributes = Map::new();
        for attr in start.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_default();
            attributes.insert(key, Value::String(value));
        }

        Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            ..Self::default()
        }
    }

    fn push_child(&mut self, name: String, value: Value) {
        match self.children.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, values)) => values.push(value),
            None => self.children.push((name, vec![value])),
        }
    }

    fn close(self) -> (String, Value) {
        if self.children.is_empty() && self.attributes.is_empty() {
            return (self.name, Value::String(self.text));
        }

        let mut map = Map::new();
        if !self.attributes.is_empty() {
            map.insert(XML_ATTRIBUTES_KEY.to_string(), Value::Object(self.attributes));
        }
        if self.children.is_empty() && !self.text.is_empty() {
            map.insert(XML_TEXT_KEY.to_string(), Value::String(self.text));
        }
        for (name, mut values) in self.children {
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                Value::Array(values)
            };
            map.insert(name, value);
        }
        (self.name, Value::Object(map))
    }
}

/// Converts an XML document to a JSON value.
///
/// The root element's name is dropped. Elements with children become
/// objects, leaf elements become strings, siblings sharing a name become an
/// array, and attributes are gathered under `@attributes`. Returns `None` if
/// the document is malformed.
#[must_use]
pub fn xml_to_value(xml: &str) -> Option<Value> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => stack.push(Element::open(&start)),
            Ok(Event::Empty(start)) => {
                let (name, value) = Element::open(&start).close();
                match stack.last_mut() {
                    Some(parent) => parent.push_child(name, value),
                    None => root = Some(value),
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape().ok()?);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                let (name, value) = stack.pop()?.close();
                match stack.last_mut() {
                    Some(parent) => parent.push_child(name, value),
                    None => root = Some(value),
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => return None,
        }
    }

    if !stack.is_empty() {
        return None;
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_is_parsed_ignoring_charset() {
        let value = decode(
            br#"{"Invoices":[{"InvoiceID":"abc"}]}"#,
            Some("application/json; charset=utf-8"),
            200,
        );
        assert_eq!(value, json!({"Invoices": [{"InvoiceID": "abc"}]}));
    }

    #[test]
    fn test_invalid_json_is_wrapped_as_message() {
        let value = decode(b"oops{", Some("application/json"), 500);
        assert_eq!(value, json!({"message": "oops{", "httpStatusCode": 500}));
    }

    #[test]
    fn test_json_string_is_wrapped_as_message() {
        let value = decode(br#""Not allowed""#, Some("application/json"), 403);
        assert_eq!(
            value,
            json!({"message": "Not allowed", "httpStatusCode": 403})
        );
    }

    #[test]
    fn test_html_is_wrapped_as_message() {
        let value = decode(
            b"oauth_problem=token_expired",
            Some("text/html; charset=utf-8"),
            401,
        );
        assert_eq!(
            value,
            json!({"message": "oauth_problem=token_expired", "httpStatusCode": 401})
        );
    }

    #[test]
    fn test_unknown_content_type_is_wrapped_as_message() {
        let value = decode(b"plain failure", None, 400);
        assert_eq!(value["message"], "plain failure");
        assert_eq!(value["httpStatusCode"], 400);
    }

    #[test]
    fn test_empty_body_is_null() {
        assert_eq!(decode(b"", Some("application/json"), 204), Value::Null);
        assert_eq!(decode(b"  \n", Some("text/html"), 200), Value::Null);
    }

    #[test]
    fn test_xml_repeated_siblings_become_array() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
            <Response xmlns:i="http://www.w3.org/2001/XMLSchema-instance">
              <Status>OK</Status>
              <ProviderName>Test</ProviderName>
              <Contacts>
                <Contact><Name>A &amp; B</Name></Contact>
                <Contact><Name>C</Name></Contact>
              </Contacts>
            </Response>"#;
        let value = decode(xml.as_bytes(), Some("text/xml; charset=utf-8"), 200);

        assert_eq!(value["Status"], "OK");
        assert_eq!(value["Contacts"]["Contact"][0]["Name"], "A & B");
        assert_eq!(value["Contacts"]["Contact"][1]["Name"], "C");
    }

    #[test]
    fn test_xml_attributes_are_collected() {
        let xml = r#"<Response><Item id="7" type="a"><Name>x</Name></Item><Note lang="en">hi</Note><Empty/></Response>"#;
        let value = xml_to_value(xml).unwrap();

        assert_eq!(value["Item"]["@attributes"]["id"], "7");
        assert_eq!(value["Item"]["Name"], "x");
        assert_eq!(value["Note"]["@attributes"]["lang"], "en");
        assert_eq!(value["Note"]["@text"], "hi");
        assert_eq!(value["Empty"], "");
    }

    #[test]
    fn test_malformed_xml_is_wrapped_as_message() {
        let value = decode(b"<Response><Open></Response>", Some("application/xml"), 400);
        assert_eq!(value["httpStatusCode"], 400);
        assert_eq!(value["message"], "<Response><Open></Response>");
    }
}
