use serde::Serialize;

/// Why a command was refused. Serialized as its display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DenyReason {
    #[serde(rename = "owner-only command")]
    OwnerOnly,
    #[serde(rename = "restricted to owner in private mode")]
    PrivateMode,
    #[serde(rename = "group-only command")]
    GroupOnly,
    #[serde(rename = "admin-only command")]
    AdminOnly,
}

impl DenyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DenyReason::OwnerOnly => "owner-only command",
            DenyReason::PrivateMode => "restricted to owner in private mode",
            DenyReason::GroupOnly => "group-only command",
            DenyReason::AdminOnly => "admin-only command",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenyReason>,
}

impl Decision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: DenyReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }

    pub fn as_str(self) -> &'static str {
        if self.allowed { "allow" } else { "deny" }
    }

    pub fn label(self) -> &'static str {
        if self.allowed { "ALLOW" } else { "DENY" }
    }
}
