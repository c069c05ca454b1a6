//! Construction of outbound messages.

use uuid::Uuid;

use crate::message::{Header, Message};

/// A fresh message id: a random (v4) UUID in canonical hyphenated form.
pub fn new_msg_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a message of `msg_type` answering `parent`.
///
/// Session and username are copied from the parent header, the parent
/// header is copied whole into `parent_header`, and the id is new.
/// Metadata and content start empty.
pub fn new_message(msg_type: impl Into<String>, parent: &Message) -> Message {
    Message {
        header: Header {
            msg_id: new_msg_id(),
            username: parent.header.username.clone(),
            session: parent.header.session.clone(),
            msg_type: msg_type.into(),
        },
        parent_header: parent.header.clone(),
        ..Message::default()
    }
}

/// Conventional reply type for a request type.
///
/// `execute_request` becomes `execute_reply`; types without the `_request`
/// suffix get `_reply` appended.
pub fn reply_type(request_type: &str) -> String {
    match request_type.strip_suffix("_request") {
        Some(stem) => format!("{stem}_reply"),
        None => format!("{request_type}_reply"),
    }
}

/// Creates messages on behalf of one kernel session.
#[derive(Debug, Clone)]
pub struct MessageFactory {
    session: String,
    username: String,
}

impl MessageFactory {
    /// Factory with a freshly generated session id.
    pub fn new(username: impl Into<String>) -> Self {
        Self::with_session(new_msg_id(), username)
    }

    pub fn with_session(session: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            username: username.into(),
        }
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// A message that answers nothing: this factory's session, zero parent
    /// header. Kernels use it for broadcasts such as `status`; front-ends
    /// use it for requests. Replies go through [`new_message`], which takes
    /// session and username from the parent instead.
    pub fn unsolicited(&self, msg_type: impl Into<String>) -> Message {
        Message {
            header: Header {
                msg_id: new_msg_id(),
                username: self.username.clone(),
                session: self.session.clone(),
                msg_type: msg_type.into(),
            },
            ..Message::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;

    fn parent() -> Message {
        Message {
            header: Header {
                msg_id: "parent-id".into(),
                username: "alice".into(),
                session: "session-1".into(),
                msg_type: "execute_request".into(),
            },
            content: json!({"code": "1+1"}),
            ..Message::default()
        }
    }

    #[test]
    fn reply_is_correlated_to_parent() {
        let parent = parent();
        let reply = new_message("execute_reply", &parent);

        assert_eq!(reply.parent_header, parent.header);
        assert_eq!(reply.header.session, "session-1");
        assert_eq!(reply.header.username, "alice");
        assert_eq!(reply.header.msg_type, "execute_reply");
        assert_ne!(reply.header.msg_id, parent.header.msg_id);
        assert!(reply.metadata.is_empty());
        assert!(reply.content.is_null());
    }

    #[test]
    fn parent_header_is_a_copy() {
        let mut parent = parent();
        let reply = new_message("status", &parent);

        parent.header.session = "mutated".into();
        assert_eq!(reply.parent_header.session, "session-1");
    }

    #[test]
    fn ids_are_canonical_uuids() {
        let id = new_msg_id();
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(parsed.hyphenated().to_string(), id);
    }

    #[test]
    fn no_id_collisions_in_large_sample() {
        let parent = parent();
        let ids: HashSet<String> = (0..100_000)
            .map(|_| new_message("status", &parent).header.msg_id)
            .collect();
        assert_eq!(ids.len(), 100_000);
        assert!(!ids.contains(&parent.header.msg_id));
    }

    #[test]
    fn reply_type_mapping() {
        assert_eq!(reply_type("execute_request"), "execute_reply");
        assert_eq!(reply_type("kernel_info_request"), "kernel_info_reply");
        assert_eq!(reply_type("ping"), "ping_reply");
    }

    #[test]
    fn unsolicited_has_zero_parent() {
        let factory = MessageFactory::with_session("kernel-session", "kernel");
        let status = factory.unsolicited("status");

        assert!(status.parent_header.is_empty());
        assert_eq!(status.header.session, "kernel-session");
        assert_eq!(status.header.username, "kernel");
        assert!(!status.header.msg_id.is_empty());
    }

    #[test]
    fn reply_to_factory_message_keeps_its_session() {
        let factory = MessageFactory::new("frontend");
        let request = factory.unsolicited("kernel_info_request");
        let reply = new_message("kernel_info_reply", &request);
        assert_eq!(reply.header.session, factory.session());
        assert_eq!(reply.header.username, "frontend");
        assert_eq!(reply.parent_header, request.header);
    }
}
