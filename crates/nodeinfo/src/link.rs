use serde::{Deserialize, Serialize};

/// A reference to a NodeInfo document, as advertised by the discovery
/// endpoint. `rel` names the schema version and `href` is where to fetch it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

/// Body of the `/.well-known/nodeinfo` response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Discovery {
    #[serde(default)]
    pub links: Vec<Link>,
}
