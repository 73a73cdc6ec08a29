use core::fmt;
use serde::{Deserialize, Serialize};

/// How a server communicates with other servers.
///
/// Names outside the enumerated set decode to [`Protocol::Unknown`], which
/// encodes back as an empty string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(clippy::upper_case_acronyms)]
pub enum Protocol {
    ActivityPub,
    BuddyCloud,
    DFRN,
    Diaspora,
    Libertree,
    OStatus,
    PumpIO,
    Tent,
    XMPP,
    Zot,
    #[default]
    #[serde(rename = "")]
    #[serde(other)]
    Unknown,
}

impl Protocol {
    /// Every protocol enumerated by the NodeInfo schema.
    pub const ALL: [Self; 10] = [
        Self::ActivityPub,
        Self::BuddyCloud,
        Self::DFRN,
        Self::Diaspora,
        Self::Libertree,
        Self::OStatus,
        Self::PumpIO,
        Self::Tent,
        Self::XMPP,
        Self::Zot,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "",
            Self::ActivityPub => "activitypub",
            Self::BuddyCloud => "buddycloud",
            Self::DFRN => "dfrn",
            Self::Diaspora => "diaspora",
            Self::Libertree => "libertree",
            Self::OStatus => "ostatus",
            Self::PumpIO => "pumpio",
            Self::Tent => "tent",
            Self::XMPP => "xmpp",
            Self::Zot => "zot",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
