//! XML-RPC response decoding.
//!
//! The reply is read into a small element tree first so the value grammar can be matched
//! structurally instead of threading reader state through every type.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flotilla_torrent_core::{CallFault, TorrentError, TorrentResult};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::value::Value;
use crate::error::CodecError;
use crate::transport::CallOutcome;

/// Outcome of a single XML-RPC method response.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    /// `<params>` carrying the returned value.
    Success(Value),
    /// Whole-response `<fault>`.
    Fault {
        /// Daemon fault code.
        code: i64,
        /// Daemon fault string.
        message: String,
    },
}

#[derive(Debug, Default)]
struct Node {
    name: String,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn open(start: &BytesStart<'_>) -> Self {
        Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            ..Self::default()
        }
    }

    fn child(&self, name: &'static str) -> Result<&Self, CodecError> {
        self.children
            .iter()
            .find(|child| child.name == name)
            .ok_or(CodecError::MissingElement { element: name })
    }

    fn children_named<'a>(&'a self, name: &'static str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }
}

fn parse_tree(body: &[u8]) -> Result<Node, CodecError> {
    let mut reader = Reader::from_reader(body);
    let mut stack: Vec<Node> = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Node::open(&start)),
            Event::Empty(start) => {
                let node = Node::open(&start);
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return Ok(node),
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(_) => {
                let Some(node) = stack.pop() else {
                    return Err(CodecError::MissingElement {
                        element: "methodResponse",
                    });
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return Ok(node),
                }
            }
            Event::Eof => {
                return Err(CodecError::MissingElement {
                    element: "methodResponse",
                });
            }
            _ => {}
        }
    }
}

/// Decode a `methodResponse` document.
pub(crate) fn decode_response(body: &[u8]) -> Result<MethodResponse, CodecError> {
    let root = parse_tree(body)?;
    if root.name != "methodResponse" {
        return Err(CodecError::UnexpectedElement {
            expected: "methodResponse",
            found: root.name,
        });
    }
    if let Ok(fault) = root.child("fault") {
        let value = decode_value(fault.child("value")?)?;
        let (code, message) = fault_fields(&value);
        return Ok(MethodResponse::Fault { code, message });
    }
    let value = root.child("params")?.child("param")?.child("value")?;
    Ok(MethodResponse::Success(decode_value(value)?))
}

fn decode_value(node: &Node) -> Result<Value, CodecError> {
    let Some(typed) = node.children.first() else {
        return Ok(Value::String(node.text.clone()));
    };
    match typed.name.as_str() {
        "string" => Ok(Value::String(typed.text.clone())),
        "i4" | "int" | "i8" => typed
            .text
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|_| invalid_scalar("int", &typed.text)),
        "boolean" => match typed.text.trim() {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            other => Err(invalid_scalar("boolean", other)),
        },
        "double" => typed
            .text
            .trim()
            .parse()
            .map(Value::Double)
            .map_err(|_| invalid_scalar("double", &typed.text)),
        "base64" => {
            let compact: String = typed
                .text
                .chars()
                .filter(|ch| !ch.is_ascii_whitespace())
                .collect();
            STANDARD
                .decode(compact.as_bytes())
                .map(Value::Base64)
                .map_err(|_| invalid_scalar("base64", &typed.text))
        }
        "array" => typed
            .child("data")?
            .children_named("value")
            .map(decode_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        "struct" => {
            let mut members = BTreeMap::new();
            for member in typed.children_named("member") {
                let name = member.child("name")?.text.clone();
                let value = decode_value(member.child("value")?)?;
                members.insert(name, value);
            }
            Ok(Value::Struct(members))
        }
        other => Err(CodecError::UnexpectedElement {
            expected: "value type",
            found: other.to_string(),
        }),
    }
}

fn invalid_scalar(kind: &'static str, value: &str) -> CodecError {
    CodecError::InvalidScalar {
        kind,
        value: value.to_string(),
    }
}

fn fault_fields(value: &Value) -> (i64, String) {
    let members = value.as_struct();
    let code = members
        .and_then(|members| members.get("faultCode"))
        .and_then(Value::as_i64)
        .unwrap_or_default();
    let message = members
        .and_then(|members| members.get("faultString"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    (code, message)
}

/// Decode a `system.multicall` reply into per-call outcomes aligned with the request.
///
/// A whole-response fault becomes a protocol error; individual call faults are returned in
/// place so the remaining entries still decode.
///
/// # Errors
///
/// Returns a decode transport error for malformed documents or misaligned replies, and a
/// protocol error when the daemon faulted the whole request.
pub fn decode_multicall(body: &[u8], expected: usize) -> TorrentResult<Vec<CallOutcome>> {
    let entries = match decode_response(body)? {
        MethodResponse::Fault { code, message } => {
            return Err(TorrentError::Protocol {
                faults: vec![CallFault {
                    index: None,
                    method: None,
                    code,
                    message,
                }],
                completed: Vec::new(),
            });
        }
        MethodResponse::Success(Value::Array(entries)) => entries,
        MethodResponse::Success(_) => {
            return Err(CodecError::UnexpectedElement {
                expected: "array",
                found: "scalar".to_string(),
            }
            .into());
        }
    };
    if entries.len() != expected {
        return Err(CodecError::ResultCountMismatch {
            expected,
            actual: entries.len(),
        }
        .into());
    }
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| -> TorrentResult<CallOutcome> {
            match entry {
                Value::Array(mut wrapped) if !wrapped.is_empty() => Ok(Ok(wrapped.swap_remove(0))),
                fault @ Value::Struct(_) => {
                    let (code, message) = fault_fields(&fault);
                    Ok(Err(CallFault {
                        index: Some(index),
                        method: None,
                        code,
                        message,
                    }))
                }
                _ => Err(CodecError::MalformedEntry { index }.into()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flotilla_torrent_core::TransportFailure;

    fn respond(value: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<methodResponse>\n<params>\n<param><value>{value}</value></param>\n</params>\n</methodResponse>\n"
        )
    }

    #[test]
    fn scalars_decode_to_their_types() -> anyhow::Result<()> {
        let body = respond(
            "<array><data>\
             <value><i4>1</i4></value>\
             <value><int>-2</int></value>\
             <value><i8>5000000000</i8></value>\
             <value><boolean>1</boolean></value>\
             <value><double>2.5</double></value>\
             <value><string>a &amp; b</string></value>\
             <value>untyped</value>\
             <value><base64>aGk=</base64></value>\
             <value><string/></value>\
             </data></array>",
        );
        let MethodResponse::Success(value) = decode_response(body.as_bytes())? else {
            anyhow::bail!("expected success");
        };
        assert_eq!(
            value,
            Value::Array(vec![
                Value::Int(1),
                Value::Int(-2),
                Value::Int(5_000_000_000),
                Value::Bool(true),
                Value::Double(2.5),
                Value::from("a & b"),
                Value::from("untyped"),
                Value::Base64(b"hi".to_vec()),
                Value::from(""),
            ])
        );
        Ok(())
    }

    #[test]
    fn string_whitespace_is_preserved() -> anyhow::Result<()> {
        let body = respond("<string>  padded name </string>");
        assert_eq!(
            decode_response(body.as_bytes())?,
            MethodResponse::Success(Value::from("  padded name "))
        );
        Ok(())
    }

    #[test]
    fn multicall_separates_partial_faults() -> anyhow::Result<()> {
        let body = respond(
            "<array><data>\
             <value><array><data><value><i8>0</i8></value></data></array></value>\
             <value><struct>\
             <member><name>faultCode</name><value><i4>-501</i4></value></member>\
             <member><name>faultString</name><value><string>Could not find info-hash.</string></value></member>\
             </struct></value>\
             <value><array><data><value><string>ok</string></value></data></array></value>\
             </data></array>",
        );
        let outcomes = decode_multicall(body.as_bytes(), 3)?;
        assert_eq!(outcomes[0], Ok(Value::Int(0)));
        assert_eq!(
            outcomes[1],
            Err(CallFault {
                index: Some(1),
                method: None,
                code: -501,
                message: "Could not find info-hash.".into(),
            })
        );
        assert_eq!(outcomes[2], Ok(Value::from("ok")));
        Ok(())
    }

    #[test]
    fn whole_response_fault_is_a_protocol_error() {
        let body = "<?xml version=\"1.0\"?><methodResponse><fault><value><struct>\
                    <member><name>faultCode</name><value><i4>-506</i4></value></member>\
                    <member><name>faultString</name><value><string>Method 'x' not defined</string></value></member>\
                    </struct></value></fault></methodResponse>";
        match decode_multicall(body.as_bytes(), 1) {
            Err(TorrentError::Protocol { faults, completed }) => {
                assert!(completed.is_empty());
                assert_eq!(faults.len(), 1);
                assert_eq!(faults[0].index, None);
                assert_eq!(faults[0].code, -506);
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn misaligned_or_broken_replies_are_decode_failures() {
        let body = respond("<array><data></data></array>");
        let err = decode_multicall(body.as_bytes(), 1).expect_err("count mismatch");
        assert_eq!(err.transport_kind(), Some(TransportFailure::Decode));

        let err = decode_multicall(b"<methodResponse><params>", 1).expect_err("truncated");
        assert_eq!(err.transport_kind(), Some(TransportFailure::Decode));

        let body = respond("<i8>nope</i8>");
        assert!(decode_response(body.as_bytes()).is_err());
    }
}
