use std::fmt;

use bytes::Bytes;
use serde::de::{DeserializeOwned, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Field, Result, WireError};

/// Message header, as carried in the `header` and `parent_header` frames.
///
/// Unknown keys sent by newer front-ends are ignored and absent keys decode
/// as empty strings, so a bare `{}` parent header is the zero header. Only
/// a JSON object decodes as a header; the array form is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Unique id of this message.
    pub msg_id: String,
    pub username: String,
    /// Identifies the client session; propagated across request/reply chains.
    pub session: String,
    pub msg_type: String,
}

impl Header {
    /// True for the zero header used when a message has no parent.
    pub fn is_empty(&self) -> bool {
        self.msg_id.is_empty()
            && self.username.is_empty()
            && self.session.is_empty()
            && self.msg_type.is_empty()
    }
}

impl<'de> Deserialize<'de> for Header {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(HeaderVisitor)
    }
}

struct HeaderVisitor;

impl<'de> Visitor<'de> for HeaderVisitor {
    type Value = Header;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a header object")
    }

    fn visit_map<A: MapAccess<'de>>(
        self,
        mut map: A,
    ) -> std::result::Result<Header, A::Error> {
        let mut header = Header::default();
        while let Some(key) = map.next_key::<String>()? {
            let slot = match key.as_str() {
                "msg_id" => &mut header.msg_id,
                "username" => &mut header.username,
                "session" => &mut header.session,
                "msg_type" => &mut header.msg_type,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                    continue;
                }
            };
            *slot = map.next_value()?;
        }
        Ok(header)
    }
}

/// A complete application-level message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    pub header: Header,
    /// Header of the message this one answers; zero for unsolicited messages.
    pub parent_header: Header,
    /// Always encoded as a JSON object, `{}` when empty.
    pub metadata: Map<String, Value>,
    /// Message-type specific body, opaque to the codec.
    pub content: Value,
    /// Raw frames trailing the signed JSON frames. Not covered by the signature.
    pub buffers: Vec<Bytes>,
}

impl Message {
    /// Message type from the header.
    pub fn msg_type(&self) -> &str {
        &self.header.msg_type
    }

    /// Replace the content with any serializable value.
    pub fn set_content<T: Serialize + ?Sized>(&mut self, content: &T) -> Result<()> {
        self.content = serde_json::to_value(content).map_err(|source| WireError::Encode {
            field: Field::Content,
            source,
        })?;
        Ok(())
    }

    /// Builder form of [`Message::set_content`].
    pub fn with_content<T: Serialize + ?Sized>(mut self, content: &T) -> Result<Self> {
        self.set_content(content)?;
        Ok(self)
    }

    /// Deserialize the content into a typed structure.
    pub fn content_as<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        T::deserialize(&self.content)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn header_uses_wire_names() {
        let header = Header {
            msg_id: "1".into(),
            username: "u".into(),
            session: "s".into(),
            msg_type: "execute_request".into(),
        };
        assert_eq!(
            serde_json::to_value(&header).unwrap(),
            json!({"msg_id": "1", "username": "u", "session": "s", "msg_type": "execute_request"})
        );
    }

    #[test]
    fn empty_object_is_zero_header() {
        let header: Header = serde_json::from_str("{}").unwrap();
        assert!(header.is_empty());
        assert_eq!(header, Header::default());
    }

    #[test]
    fn extra_header_keys_are_ignored() {
        let header: Header = serde_json::from_value(json!({
            "msg_id": "abc",
            "username": "u",
            "session": "s",
            "msg_type": "kernel_info_request",
            "date": "2024-01-01T00:00:00Z",
            "version": "5.3"
        }))
        .unwrap();
        assert_eq!(header.msg_type, "kernel_info_request");
    }

    #[test]
    fn array_form_is_not_a_header() {
        let result: std::result::Result<Header, _> =
            serde_json::from_str(r#"["1", "u", "s", "execute_request"]"#);
        assert!(result.is_err());
    }

    #[test]
    fn header_roundtrips_through_json() {
        let header = Header {
            msg_id: "1".into(),
            username: "ü".into(),
            session: "s".into(),
            msg_type: "execute_request".into(),
        };
        let text = serde_json::to_string(&header).unwrap();
        assert_eq!(serde_json::from_str::<Header>(&text).unwrap(), header);
    }

    #[test]
    fn header_field_of_wrong_type_fails() {
        let result: std::result::Result<Header, _> = serde_json::from_str(r#"{"msg_id": 7}"#);
        assert!(result.is_err());
    }

    #[test]
    fn typed_content_roundtrip() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct ExecuteRequest {
            code: String,
            silent: bool,
        }

        let msg = Message::default()
            .with_content(&ExecuteRequest {
                code: "1+1".into(),
                silent: false,
            })
            .unwrap();
        assert_eq!(msg.content, json!({"code": "1+1", "silent": false}));

        let back: ExecuteRequest = msg.content_as().unwrap();
        assert_eq!(back.code, "1+1");
    }

    #[test]
    fn unencodable_content_is_reported() {
        let mut bad = std::collections::HashMap::new();
        bad.insert((1u8, 2u8), "tuple keys are not JSON object keys");

        let err = Message::default().with_content(&bad).unwrap_err();
        assert!(matches!(
            err,
            WireError::Encode {
                field: Field::Content,
                ..
            }
        ));
    }
}
