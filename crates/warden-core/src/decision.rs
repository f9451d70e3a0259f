use std::fmt;

use crate::action::Action;
use crate::role::{Role, role_model};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    Granted,
    /// No role assignment on the resource or any resource it inherits from.
    NoAccess,
    InsufficientRole,
    /// The resource is not inside the scope the caller queried through.
    OutOfScope,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecisionReason::Granted => "granted",
            DecisionReason::NoAccess => "no access",
            DecisionReason::InsufficientRole => "insufficient role",
            DecisionReason::OutOfScope => "out of scope",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub role: Option<Role>,
    pub reason: DecisionReason,
}

impl Decision {
    pub fn evaluate(role: Option<Role>, action: Action) -> Self {
        match role {
            None => Self::denied(None, DecisionReason::NoAccess),
            Some(role) if role_model().allows(role, action) => Self {
                allowed: true,
                role: Some(role),
                reason: DecisionReason::Granted,
            },
            Some(role) => Self::denied(Some(role), DecisionReason::InsufficientRole),
        }
    }

    pub fn out_of_scope() -> Self {
        Self::denied(None, DecisionReason::OutOfScope)
    }

    fn denied(role: Option<Role>, reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            role,
            reason,
        }
    }
}
