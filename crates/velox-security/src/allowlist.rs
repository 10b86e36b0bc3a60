use tracing::debug;

/// Decides which senders the bot answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Allowlist {
    /// Answer everyone.
    Open,
    /// Answer only the operator with this id.
    Operator(String),
}

impl Allowlist {
    /// Build from the configured operator id. Blank ids leave the bot open.
    pub fn from_operator_id(id: Option<&str>) -> Self {
        match id.map(str::trim) {
            Some(id) if !id.is_empty() => Self::Operator(id.to_string()),
            _ => Self::Open,
        }
    }

    /// Ids are compared as strings, so `"007"` and `"7"` are different users.
    pub fn is_allowed(&self, user_id: &str) -> bool {
        match self {
            Self::Open => true,
            Self::Operator(operator) => {
                let allowed = operator == user_id;
                if !allowed {
                    debug!("dropping message from non-operator user {user_id}");
                }
                allowed
            }
        }
    }
}
