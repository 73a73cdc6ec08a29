//! The NodeInfo document and its nested sections.
//!
//! Every field defaults when absent so that documents from servers that
//! implement older or partial schema versions still decode.

use crate::Protocol;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeInfo {
    /// The schema version.
    pub version: String,
    pub software: Software,
    /// The protocols supported on this server.
    pub protocols: Vec<Protocol>,
    pub services: Services,
    /// Whether the server allows open self-registration.
    pub open_registrations: bool,
    pub usage: Usage,
    /// Free form key value pairs for software specific values. Clients should
    /// not rely on any specific key being present.
    pub metadata: Map<String, Value>,
}

/// Metadata about the server software in use.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Software {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

/// Third party sites that a server may connect to via its application API.
///
/// The schema enumerates values for both lists, but they are kept as plain
/// strings: the set changes often and some names appear on both sides or
/// collide with a [`Protocol`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Services {
    /// Sites the server can retrieve messages from.
    pub inbound: Vec<String>,
    /// Sites the server can publish messages to on behalf of a user.
    pub outbound: Vec<String>,
}

/// Usage statistics for a server.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Usage {
    pub users: UserUsage,
    /// Posts made by users registered on this server.
    pub local_posts: u64,
    /// Comments made by users registered on this server.
    pub local_comments: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserUsage {
    pub total: u64,
    /// Users that signed in at least once in the last 180 days.
    pub active_halfyear: u64,
    /// Users that signed in at least once in the last 30 days.
    pub active_month: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRIENDICA: &str = r#"{
        "version": "2.0",
        "software": {"name": "friendica", "version": "2023.05-1518"},
        "protocols": ["dfrn", "activitypub", "diaspora"],
        "services": {
            "inbound": ["twitter", "atom1.0", "rss2.0", "imap"],
            "outbound": ["smtp", "tumblr", "twitter", "wordpress", "atom1.0"]
        },
        "openRegistrations": true,
        "usage": {
            "users": {"total": 1926, "activeHalfyear": 854, "activeMonth": 352},
            "localPosts": 79804,
            "localComments": 15922
        },
        "metadata": {"explicitContent": false, "nodeName": "social.example.org"}
    }"#;

    #[test]
    fn decodes_full_document() {
        let info: NodeInfo = serde_json::from_str(FRIENDICA).unwrap();

        assert_eq!(info.version, "2.0");
        assert_eq!(info.software.name, "friendica");
        assert_eq!(info.software.repository, None);
        assert_eq!(
            info.protocols,
            vec![Protocol::DFRN, Protocol::ActivityPub, Protocol::Diaspora]
        );
        assert_eq!(info.services.inbound.len(), 4);
        assert_eq!(info.services.outbound.len(), 5);
        assert!(info.open_registrations);
        assert_eq!(info.usage.users.total, 1926);
        assert_eq!(info.usage.users.active_halfyear, 854);
        assert_eq!(info.usage.local_comments, 15922);
        assert_eq!(
            info.metadata.get("nodeName"),
            Some(&Value::from("social.example.org"))
        );
    }

    #[test]
    fn missing_sections_default() {
        let info: NodeInfo =
            serde_json::from_str(r#"{"version": "2.1", "software": {"name": "x"}}"#).unwrap();

        assert_eq!(info.software.name, "x");
        assert!(info.software.version.is_empty());
        assert!(info.protocols.is_empty());
        assert_eq!(info.usage, Usage::default());
    }

    #[test]
    fn encodes_camel_case_keys() {
        let value = serde_json::to_value(NodeInfo::default()).unwrap();

        assert!(value.get("openRegistrations").is_some());
        assert!(value["usage"].get("localPosts").is_some());
        assert!(value["usage"]["users"].get("activeHalfyear").is_some());
        assert!(value["software"].get("repository").is_none());
    }
}
