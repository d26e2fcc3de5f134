//! XML-RPC request encoding for `system.multicall` batches.

use std::fmt::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use quick_xml::escape::escape;

use super::value::Value;
use crate::transport::MethodCall;

/// Method that wraps a batch of calls into one round-trip.
pub const MULTICALL_METHOD: &str = "system.multicall";

/// Encode a batch as one `system.multicall` request document.
#[must_use]
pub fn encode_multicall(calls: &[MethodCall]) -> String {
    let mut xml = String::with_capacity(256 + calls.len() * 128);
    xml.push_str("<?xml version=\"1.0\"?><methodCall><methodName>");
    xml.push_str(MULTICALL_METHOD);
    xml.push_str("</methodName><params><param><value><array><data>");
    for call in calls {
        xml.push_str("<value><struct><member><name>methodName</name><value><string>");
        xml.push_str(&escape(call.method.as_str()));
        xml.push_str("</string></value></member><member><name>params</name><value><array><data>");
        for param in &call.params {
            write_value(&mut xml, param);
        }
        xml.push_str("</data></array></value></member></struct></value>");
    }
    xml.push_str("</data></array></value></param></params></methodCall>");
    xml
}

fn write_value(xml: &mut String, value: &Value) {
    xml.push_str("<value>");
    match value {
        Value::String(text) => {
            xml.push_str("<string>");
            xml.push_str(&escape(text.as_str()));
            xml.push_str("</string>");
        }
        Value::Int(number) => {
            let _ = write!(xml, "<i8>{number}</i8>");
        }
        Value::Bool(flag) => {
            let _ = write!(xml, "<boolean>{}</boolean>", u8::from(*flag));
        }
        Value::Double(number) => {
            let _ = write!(xml, "<double>{number}</double>");
        }
        Value::Base64(bytes) => {
            xml.push_str("<base64>");
            xml.push_str(&STANDARD.encode(bytes));
            xml.push_str("</base64>");
        }
        Value::Array(items) => {
            xml.push_str("<array><data>");
            for item in items {
                write_value(xml, item);
            }
            xml.push_str("</data></array>");
        }
        Value::Struct(members) => {
            xml.push_str("<struct>");
            for (name, member) in members {
                xml.push_str("<member><name>");
                xml.push_str(&escape(name.as_str()));
                xml.push_str("</name>");
                write_value(xml, member);
                xml.push_str("</member>");
            }
            xml.push_str("</struct>");
        }
    }
    xml.push_str("</value>");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multicall_wraps_each_call_in_a_struct() {
        let calls = vec![
            MethodCall::new("d.stop").arg("ABC"),
            MethodCall::new("d.priority.set").arg("ABC").arg(3_i64),
        ];
        let xml = encode_multicall(&calls);
        assert!(xml.starts_with(
            "<?xml version=\"1.0\"?><methodCall><methodName>system.multicall</methodName>"
        ));
        assert!(xml.contains(
            "<member><name>methodName</name><value><string>d.stop</string></value></member>"
        ));
        assert!(xml.contains("<value><string>ABC</string></value><value><i8>3</i8></value>"));
        assert_eq!(xml.matches("<name>methodName</name>").count(), 2);
        assert!(xml.ends_with("</methodCall>"));
    }

    #[test]
    fn scalars_are_escaped_and_typed() {
        let calls = vec![
            MethodCall::new("execute2")
                .arg("")
                .arg("mkdir")
                .arg("/data/<tv & film>")
                .arg(true)
                .arg(Value::Base64(b"d8:announce".to_vec()))
                .arg(0.5),
        ];
        let xml = encode_multicall(&calls);
        assert!(xml.contains("<string>/data/&lt;tv &amp; film&gt;</string>"));
        assert!(xml.contains("<boolean>1</boolean>"));
        assert!(xml.contains("<base64>ZDg6YW5ub3VuY2U=</base64>"));
        assert!(xml.contains("<double>0.5</double>"));
        assert!(xml.contains("<value><string></string></value>"));
    }
}
