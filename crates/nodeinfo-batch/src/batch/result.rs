use core::fmt;
use serde::{Serialize, Serializer, ser::SerializeMap};

/// The outcome of running the operation on one identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchResult<P> {
    pub id: String,
    /// The operation's value, or `P::default()` when it failed.
    pub payload: P,
    /// The rendered operation error, if it failed.
    pub err: Option<String>,
}

impl<P: Default> BatchResult<P> {
    pub fn from_outcome<E: fmt::Display>(id: String, outcome: Result<P, E>) -> Self {
        match outcome {
            Ok(payload) => Self {
                id,
                payload,
                err: None,
            },
            Err(e) => Self {
                id,
                payload: P::default(),
                err: Some(e.to_string()),
            },
        }
    }
}

impl<P: Serialize> BatchResult<P> {
    /// Encodes the result as one JSON object keyed by `fields`, plus `err`.
    pub fn to_record(&self, fields: RecordFields) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&Record {
            fields,
            result: self,
        })
    }
}

/// JSON key names for the identifier and payload of a result record. They
/// depend on which action is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordFields {
    pub id: &'static str,
    pub payload: &'static str,
}

impl RecordFields {
    pub const DISCOVERY: Self = Self {
        id: "hostname",
        payload: "links",
    };

    pub const NODEINFO: Self = Self {
        id: "href",
        payload: "nodeinfo",
    };
}

struct Record<'a, P> {
    fields: RecordFields,
    result: &'a BatchResult<P>,
}

impl<P: Serialize> Serialize for Record<'_, P> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry(self.fields.id, &self.result.id)?;
        map.serialize_entry(self.fields.payload, &self.result.payload)?;
        map.serialize_entry("err", &self.result.err)?;
        map.end()
    }
}
