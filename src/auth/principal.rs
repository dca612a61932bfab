use std::fmt;

/// Role carried in the identity provider's custom `role` claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    User,
    Seller,
    Admin,
    Other(String),
}

impl Role {
    /// Upper-cases the claim; an absent or blank claim means `USER`.
    pub fn from_claim(claim: Option<&str>) -> Self {
        let Some(raw) = claim.map(str::trim).filter(|r| !r.is_empty()) else {
            return Role::User;
        };
        match raw.to_uppercase().as_str() {
            "USER" => Role::User,
            "SELLER" => Role::Seller,
            "ADMIN" => Role::Admin,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "USER",
            Role::Seller => "SELLER",
            Role::Admin => "ADMIN",
            Role::Other(name) => name,
        }
    }

    pub fn authority(&self) -> String {
        format!("ROLE_{}", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verified caller identity, valid for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject_id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(subject_id: impl Into<String>, role: Role) -> Self {
        Self {
            subject_id: subject_id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// SELLER and ADMIN may publish listings.
    pub fn can_publish(&self) -> bool {
        matches!(self.role, Role::Seller | Role::Admin)
    }
}
