//! User roles and the configured roster that assigns them.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{UserId, ValidationError, CONSENSUS_ACTOR};

/// Access level of a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    /// May archive reports and override their status.
    Admin,
    /// May submit reports and vote.
    Regular,
    /// May read, but not submit, vote or moderate.
    Flagged,
}

impl UserRole {
    pub fn can_moderate(self) -> bool {
        self == Self::Admin
    }

    pub fn can_contribute(self) -> bool {
        self != Self::Flagged
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Admin => "Admin",
            Self::Regular => "Regular",
            Self::Flagged => "Flagged",
        })
    }
}

/// Which users are admins and which are flagged. Everyone else is
/// [`UserRole::Regular`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Roster {
    pub admins: BTreeSet<UserId>,
    pub flagged: BTreeSet<UserId>,
}

impl Roster {
    /// A flagged admin loses moderation rights along with everything else.
    pub fn role_of(&self, user: &UserId) -> UserRole {
        if self.flagged.contains(user) {
            UserRole::Flagged
        } else if self.admins.contains(user) {
            UserRole::Admin
        } else {
            UserRole::Regular
        }
    }

    /// The consensus actor id is reserved and cannot hold a role.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self
            .admins
            .iter()
            .chain(&self.flagged)
            .any(|u| u.as_str() == CONSENSUS_ACTOR)
        {
            return Err(ValidationError::ReservedUser(CONSENSUS_ACTOR));
        }
        Ok(())
    }
}
