// Token claims and the role set they carry

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Set of role names.
///
/// Serialized as a JSON array; duplicates collapse on the way in, and the
/// ordering is stable so two equal sets always encode the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, role: impl Into<String>) -> bool {
        self.0.insert(role.into())
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn intersects(&self, other: &RoleSet) -> bool {
        !self.0.is_disjoint(&other.0)
    }

    /// Whether a holder of these roles passes a gate requiring `required`.
    /// An empty requirement admits any authenticated identity.
    pub fn satisfies(&self, required: &RoleSet) -> bool {
        required.is_empty() || self.intersects(required)
    }

    /// Parse a comma separated list such as `"Admin, User"`
    pub fn parse_list(list: &str) -> Self {
        list.split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// Identity data embedded into a token at issuance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: RoleSet,
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: RoleSet,
    pub iat: i64, // issued at timestamp
    pub exp: i64, // expiration timestamp
    pub jti: Uuid, // unique per issuance
}

impl Claims {
    pub fn subject(&self) -> TokenSubject {
        TokenSubject {
            user_id: self.user_id,
            name: self.name.clone(),
            email: self.email.clone(),
            roles: self.roles.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_duplicates_collapse() {
        let roles: RoleSet = ["Admin", "Admin", "User"].into_iter().collect();
        assert_eq!(roles.len(), 2);
    }

    #[test]
    fn test_serializes_as_sorted_array() {
        let roles: RoleSet = ["User", "Admin"].into_iter().collect();
        assert_eq!(serde_json::to_string(&roles).unwrap(), r#"["Admin","User"]"#);

        let parsed: RoleSet = serde_json::from_str(r#"["Visitor","Visitor"]"#).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_parse_list_trims_and_skips_empty() {
        let roles = RoleSet::parse_list(" Admin, ,User,");
        assert!(roles.contains("Admin"));
        assert!(roles.contains("User"));
        assert_eq!(roles.len(), 2);
        assert!(RoleSet::parse_list("").is_empty());
    }

    #[test]
    fn test_empty_requirement_admits_anyone() {
        assert!(RoleSet::new().satisfies(&RoleSet::new()));
        let visitor: RoleSet = ["Visitor"].into_iter().collect();
        assert!(visitor.satisfies(&RoleSet::new()));
    }

    #[test]
    fn test_claims_use_camel_case_on_the_wire() {
        let claims = Claims {
            user_id: Uuid::nil(),
            name: "Admin".to_string(),
            email: "admin@example.com".to_string(),
            roles: ["Admin"].into_iter().collect(),
            iat: 1,
            exp: 2,
            jti: Uuid::nil(),
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert!(value.get("userId").is_some());
        assert_eq!(value["roles"], serde_json::json!(["Admin"]));
    }

    fn role_name() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("Admin".to_string()),
            Just("User".to_string()),
            Just("Visitor".to_string()),
            "[A-Z][a-z]{2,8}",
        ]
    }

    proptest! {
        // Gate admits iff the sets share a role or nothing is required
        #[test]
        fn prop_satisfies_is_intersection(
            held in proptest::collection::vec(role_name(), 0..4),
            required in proptest::collection::vec(role_name(), 0..4),
        ) {
            let held: RoleSet = held.into_iter().collect();
            let required: RoleSet = required.into_iter().collect();

            let expected = required.is_empty() || required.iter().any(|r| held.contains(r));
            prop_assert_eq!(held.satisfies(&required), expected);
        }

        #[test]
        fn prop_intersects_is_commutative(
            a in proptest::collection::vec(role_name(), 0..4),
            b in proptest::collection::vec(role_name(), 0..4),
        ) {
            let a: RoleSet = a.into_iter().collect();
            let b: RoleSet = b.into_iter().collect();
            prop_assert_eq!(a.intersects(&b), b.intersects(&a));
        }
    }
}
