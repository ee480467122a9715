use std::fmt;

use crate::database::{OwnerInfo, VisitorInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
enum ContentKind {
    #[serde(rename = "visitor_pass")]
    VisitorPass,
}

/// The self describing payload carried by a pass QR code.
///
/// It is rendered as compact JSON with a fixed field order, so the same grant
/// always encodes to the same string and anyone holding the token can read
/// who it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenContent {
    #[serde(rename = "type")]
    kind: ContentKind,
    pub resident: OwnerInfo,
    pub visitor: VisitorInfo,
    pub duration_minutes: u32,
}

impl TokenContent {
    pub fn new(owner: &OwnerInfo, visitor: &VisitorInfo, duration_minutes: u32) -> Self {
        Self {
            kind: ContentKind::VisitorPass,
            resident: owner.clone(),
            visitor: visitor.clone(),
            duration_minutes,
        }
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Parses a token back into its fields. Anything that is not pass content
    /// yields `None`.
    pub fn decode(content: &str) -> Option<Self> {
        serde_json::from_str(content).ok()
    }
}

impl fmt::Display for TokenContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}
