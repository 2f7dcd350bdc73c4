//! Caller identity as resolved from an inbound credential.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{Error, UserId};

/// Account role carried in a caller's credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Validator,
    Farmer,
    Buyer,
}

impl Role {
    /// Wire spelling of the role.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Validator => "validator",
            Self::Farmer => "farmer",
            Self::Buyer => "buyer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "validator" => Ok(Self::Validator),
            "farmer" => Ok(Self::Farmer),
            "buyer" => Ok(Self::Buyer),
            other => Err(Error::invalid_input(format!("unknown role `{other}`"))),
        }
    }
}

/// Authenticated caller handed to the workflow by the inbound layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: UserId,
    pub role: Role,
}

impl Caller {
    /// Pair an identity with its role.
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Return the caller id when its role is one of `allowed`.
    ///
    /// # Examples
    /// ```
    /// use crop_connect::domain::{Caller, Role, UserId};
    ///
    /// let caller = Caller::new(UserId::random(), Role::Farmer);
    /// assert!(caller.require_role(&[Role::Farmer, Role::Admin]).is_ok());
    /// assert!(caller.require_role(&[Role::Validator]).is_err());
    /// ```
    pub fn require_role(&self, allowed: &[Role]) -> Result<UserId, Error> {
        if allowed.contains(&self.role) {
            Ok(self.id)
        } else {
            Err(Error::forbidden("forbidden"))
        }
    }
}
