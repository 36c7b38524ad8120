//! XML bodies to json documents.

use builtwith_core::{BuiltWithError, OutputFormat, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::map::Entry;
use serde_json::{Map, Value};

/// Elements whose children always form a list, even with zero or one child.
const LIST_ELEMENTS: &[&str] = &["Results", "LOS", "Keywords", "Errors"];

/// Attribute marking any other element as a list: `<Emails type="array">`.
pub(crate) const LIST_ATTRIBUTE: (&str, &str) = ("type", "array");

#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    list: bool,
    children: Vec<Element>,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let list = start
            .try_get_attribute(LIST_ATTRIBUTE.0)
            .map_err(|e| xml_error(e.to_string()))?
            .is_some_and(|attr| attr.value.as_ref() == LIST_ATTRIBUTE.1.as_bytes());
        Ok(Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).to_string(),
            list,
            ..Self::default()
        })
    }
}

/// Decode an XML body into the children of its root element.
pub(crate) fn decode(body: &str) -> Result<Map<String, Value>> {
    let root = parse_tree(body)?;
    match element_value(&root) {
        Value::Object(map) => Ok(map),
        other => {
            let mut map = Map::new();
            map.insert(root.name, other);
            Ok(map)
        }
    }
}

fn parse_tree(body: &str) -> Result<Element> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => stack.push(Element::open(&e)?),
            Ok(Event::Empty(e)) => {
                let element = Element::open(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| xml_error("closing tag without an opening tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|e| xml_error(e.to_string()))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(xml_error("unexpected end of document"));
    }
    root.ok_or_else(|| xml_error("document has no root element"))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(xml_error("more than one root element"))
    }
}

fn element_value(element: &Element) -> Value {
    let text = element.text.trim();

    if element.list {
        return Value::Array(element.children.iter().map(element_value).collect());
    }

    if LIST_ELEMENTS.contains(&element.name.as_str()) {
        if element.children.is_empty() && !text.is_empty() {
            return Value::String(text.to_string());
        }
        return Value::Array(element.children.iter().map(element_value).collect());
    }

    if element.children.is_empty() {
        return Value::String(text.to_string());
    }

    let mut map = Map::new();
    for child in &element.children {
        let value = element_value(child);
        match map.entry(child.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                match existing {
                    Value::Array(items) if !LIST_ELEMENTS.contains(&child.name.as_str()) => {
                        items.push(value);
                    }
                    _ => {
                        let first = existing.take();
                        *existing = Value::Array(vec![first, value]);
                    }
                }
            }
        }
    }
    Value::Object(map)
}

fn xml_error(message: impl Into<String>) -> BuiltWithError {
    BuiltWithError::parse(OutputFormat::Xml, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_repeated_children_become_lists() {
        let map = decode(
            "<META><Emails>a@x.example</Emails><Emails>b@x.example</Emails><City>Oslo</City></META>",
        )
        .expect("decode");
        assert_eq!(map.get("Emails"), Some(&json!(["a@x.example", "b@x.example"])));
        assert_eq!(map.get("City"), Some(&json!("Oslo")));
    }

    #[test]
    fn test_list_elements_stay_lists() {
        let map =
            decode("<Lists><Results><R><D>a.example</D></R></Results></Lists>").expect("decode");
        assert_eq!(map.get("Results"), Some(&json!([{ "D": "a.example" }])));
    }

    #[test]
    fn test_escapes_and_cdata() {
        let map =
            decode("<E><Msg>a &amp; b</Msg><Raw><![CDATA[<tag>]]></Raw></E>").expect("decode");
        assert_eq!(map.get("Msg"), Some(&json!("a & b")));
        assert_eq!(map.get("Raw"), Some(&json!("<tag>")));
    }

    #[test]
    fn test_marked_lists() {
        let map = decode(
            r#"<META><Emails type="array"><Item>a@x.example</Item></Emails><Tags type="array"/></META>"#,
        )
        .expect("decode");
        assert_eq!(map.get("Emails"), Some(&json!(["a@x.example"])));
        assert_eq!(map.get("Tags"), Some(&json!([])));
    }

    /// Decoder must never panic on arbitrary input.
    #[test]
    fn test_fuzz_inputs() {
        let inputs = ["", "not xml at all", "<", "<a>", "</a>", "<a></b>", "<a/><b/>", "\x00\x01"];
        for input in inputs {
            let _ = decode(input);
        }
        assert!(decode("").is_err());
        assert!(decode("<a/><b/>").is_err());
    }
}
