//! Minimal XML-RPC codec
//!
//! Encodes `<methodCall>` documents and decodes `<methodResponse>` documents,
//! including `<fault>` responses. Parsing goes through a small element tree
//! built from quick-xml events.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;

use crate::error::InventoryError;

/// An XML-RPC value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Boolean(bool),
    String(String),
    Double(f64),
    DateTime(String),
    Base64(String),
    Struct(BTreeMap<String, Value>),
    Array(Vec<Value>),
    Nil,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Struct(members) => Some(members),
            _ => None,
        }
    }

    /// Short type name for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::Double(_) => "double",
            Value::DateTime(_) => "dateTime.iso8601",
            Value::Base64(_) => "base64",
            Value::Struct(_) => "struct",
            Value::Array(_) => "array",
            Value::Nil => "nil",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<&BTreeMap<String, String>> for Value {
    fn from(map: &BTreeMap<String, String>) -> Self {
        Value::Struct(
            map.iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Render a `<methodCall>` document
pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push_str("<methodCall><methodName>");
    xml.push_str(&escape(method));
    xml.push_str("</methodName><params>");
    for param in params {
        xml.push_str("<param>");
        encode_value(param, &mut xml);
        xml.push_str("</param>");
    }
    xml.push_str("</params></methodCall>");
    xml
}

fn encode_value(value: &Value, xml: &mut String) {
    xml.push_str("<value>");
    match value {
        // <int> is 32-bit; wider values need the i8 extension
        Value::Int(i) if i32::try_from(*i).is_ok() => xml.push_str(&format!("<int>{}</int>", i)),
        Value::Int(i) => xml.push_str(&format!("<i8>{}</i8>", i)),
        Value::Boolean(b) => xml.push_str(if *b {
            "<boolean>1</boolean>"
        } else {
            "<boolean>0</boolean>"
        }),
        Value::String(s) => {
            xml.push_str("<string>");
            xml.push_str(&escape(s.as_str()));
            xml.push_str("</string>");
        }
        Value::Double(d) => xml.push_str(&format!("<double>{}</double>", d)),
        Value::DateTime(s) => {
            xml.push_str("<dateTime.iso8601>");
            xml.push_str(&escape(s.as_str()));
            xml.push_str("</dateTime.iso8601>");
        }
        Value::Base64(s) => {
            xml.push_str("<base64>");
            xml.push_str(&escape(s.as_str()));
            xml.push_str("</base64>");
        }
        Value::Struct(members) => {
            xml.push_str("<struct>");
            for (name, member) in members {
                xml.push_str("<member><name>");
                xml.push_str(&escape(name.as_str()));
                xml.push_str("</name>");
                encode_value(member, xml);
                xml.push_str("</member>");
            }
            xml.push_str("</struct>");
        }
        Value::Array(items) => {
            xml.push_str("<array><data>");
            for item in items {
                encode_value(item, xml);
            }
            xml.push_str("</data></array>");
        }
        Value::Nil => xml.push_str("<nil/>"),
    }
    xml.push_str("</value>");
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a `<methodResponse>`; a `<fault>` becomes [`InventoryError::Fault`]
pub fn decode_response(xml: &str) -> Result<Value, InventoryError> {
    let root = parse_tree(xml)?;
    if root.name != "methodResponse" {
        return Err(xml_error(format!(
            "expected <methodResponse>, found <{}>",
            root.name
        )));
    }

    if let Some(fault) = root.child("fault") {
        return Err(decode_fault(fault)?);
    }

    let value = root
        .child("params")
        .and_then(|params| params.child("param"))
        .and_then(|param| param.child("value"))
        .ok_or_else(|| xml_error("response has no <params><param><value>"))?;
    decode_value(value)
}

fn decode_fault(fault: &Element) -> Result<InventoryError, InventoryError> {
    let value = fault
        .child("value")
        .ok_or_else(|| xml_error("<fault> has no <value>"))?;
    let value = decode_value(value)?;
    let members = value
        .as_struct()
        .ok_or_else(|| xml_error("<fault> value is not a struct"))?;

    let code = members
        .get("faultCode")
        .and_then(Value::as_i64)
        .unwrap_or_default();
    let message = members
        .get("faultString")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(InventoryError::Fault { code, message })
}

fn decode_value(element: &Element) -> Result<Value, InventoryError> {
    let typed = match element.children.first() {
        // Untyped <value>text</value> is a string
        None => return Ok(Value::String(element.text.clone())),
        Some(typed) => typed,
    };

    let text = typed.text.as_str();
    match typed.name.as_str() {
        "i4" | "int" | "i8" => text
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|_| xml_error(format!("invalid integer '{}'", text.trim()))),
        "boolean" => match text.trim() {
            "1" => Ok(Value::Boolean(true)),
            "0" => Ok(Value::Boolean(false)),
            other => Err(xml_error(format!("invalid boolean '{}'", other))),
        },
        "string" => Ok(Value::String(text.to_string())),
        "double" => text
            .trim()
            .parse()
            .map(Value::Double)
            .map_err(|_| xml_error(format!("invalid double '{}'", text.trim()))),
        "dateTime.iso8601" => Ok(Value::DateTime(text.trim().to_string())),
        "base64" => Ok(Value::Base64(text.trim().to_string())),
        "nil" => Ok(Value::Nil),
        "struct" => {
            let mut members = BTreeMap::new();
            for member in typed.children_named("member") {
                let name = member
                    .child("name")
                    .ok_or_else(|| xml_error("<member> has no <name>"))?;
                let value = member
                    .child("value")
                    .ok_or_else(|| xml_error("<member> has no <value>"))?;
                members.insert(name.text.clone(), decode_value(value)?);
            }
            Ok(Value::Struct(members))
        }
        "array" => {
            let data = typed
                .child("data")
                .ok_or_else(|| xml_error("<array> has no <data>"))?;
            data.children_named("value")
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        other => Err(xml_error(format!("unsupported value type <{}>", other))),
    }
}

fn xml_error(message: impl Into<String>) -> InventoryError {
    InventoryError::Xml(message.into())
}

/// Element tree node; text is the concatenation of direct text children
#[derive(Debug)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn new(name: String) -> Self {
        Self {
            name,
            text: String::new(),
            children: Vec::new(),
        }
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

fn parse_tree(xml: &str) -> Result<Element, InventoryError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                stack.push(Element::new(name));
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                attach(&mut stack, &mut root, Element::new(name))?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| xml_error("unbalanced closing tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(xml_error("document ended inside an element"));
    }
    root.ok_or_else(|| xml_error("empty document"))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), InventoryError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(xml_error("multiple root elements")),
    }
    Ok(())
}
