use serde::{Deserialize, Serialize};

/// A registered workshop participant.
///
/// Serialized with the camelCase keys used by the persisted blob and by
/// backup documents (`registrationDate`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Credential identifier, e.g. `BINDS-01`. Never changes once issued.
    pub id: String,

    /// Full name as entered at registration.
    pub name: String,

    /// Contact email.
    #[serde(default)]
    pub email: String,

    /// Home institute or organisation.
    #[serde(default)]
    pub institute: String,

    /// Local date of registration, already rendered for display.
    #[serde(default)]
    pub registration_date: String,
}

impl Participant {
    /// Case-insensitive substring match against the name or the id.
    ///
    /// `needle` must already be lowercased.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.id.to_lowercase().contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asha() -> Participant {
        Participant {
            id: "BINDS-01".to_string(),
            name: "Asha Rao".to_string(),
            email: "a@x.com".to_string(),
            institute: "XYZ University".to_string(),
            registration_date: "29/1/2026".to_string(),
        }
    }

    #[test]
    fn test_matches_name_and_id() {
        let p = asha();
        assert!(p.matches("asha"));
        assert!(p.matches("rao"));
        assert!(p.matches("binds-01"));
        assert!(p.matches("-0"));
        assert!(!p.matches("xyz"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_string(&asha()).unwrap();
        assert!(json.contains("\"registrationDate\":\"29/1/2026\""));
        assert!(!json.contains("registration_date"));
    }

    #[test]
    fn test_deserialize_tolerates_missing_optional_fields() {
        let p: Participant = serde_json::from_str(r#"{"id":"BINDS-03","name":"Ravi"}"#).unwrap();
        assert_eq!(p.id, "BINDS-03");
        assert!(p.email.is_empty());
        assert!(p.registration_date.is_empty());
    }
}
