//! Reading input: person records, sanitization, and validation

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Gender selection on the intake form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Default when the field is absent or unrecognized
    #[default]
    Male,
    /// Female
    Female,
    /// Other / unspecified
    Other,
}

/// One person's sanitized birth details
///
/// Everything except `birthtime_unknown` and `gender` is a free-form,
/// trimmed string; only `name` and `birthday` are mandatory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonInput {
    /// Display name (required)
    pub name: String,
    /// Birth date (required)
    pub birthday: String,
    /// Birth time, if known
    #[serde(default)]
    pub birthtime: String,
    /// Set when the birth time is unknown
    #[serde(default)]
    pub birthtime_unknown: bool,
    /// Gender selection
    #[serde(default)]
    pub gender: Gender,
    /// Birthplace
    #[serde(default)]
    pub birthplace: String,
}

/// Sanitized two-person reading input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingInput {
    /// First person
    pub person_a: PersonInput,
    /// Second person
    pub person_b: PersonInput,
}

/// Raw, untrusted person fields as they arrive over the wire
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPersonInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub birthtime: Option<String>,
    #[serde(default)]
    pub birthtime_unknown: Option<bool>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub birthplace: Option<String>,
}

/// Raw, untrusted reading input as it arrives over the wire
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReadingInput {
    #[serde(default)]
    pub person_a: Option<RawPersonInput>,
    #[serde(default)]
    pub person_b: Option<RawPersonInput>,
}

fn sanitize_person(raw: Option<RawPersonInput>) -> PersonInput {
    let raw = raw.unwrap_or_default();
    PersonInput {
        name: raw.name.unwrap_or_default().trim().to_string(),
        birthday: raw.birthday.unwrap_or_default().trim().to_string(),
        birthtime: raw.birthtime.unwrap_or_default().trim().to_string(),
        birthtime_unknown: raw.birthtime_unknown.unwrap_or(false),
        gender: match raw.gender.as_deref() {
            Some("female") => Gender::Female,
            Some("other") => Gender::Other,
            _ => Gender::Male,
        },
        birthplace: raw.birthplace.unwrap_or_default().trim().to_string(),
    }
}

/// Sanitize and validate raw reading input
///
/// Each person's `name` and `birthday` are mandatory; everything else
/// defaults to empty / `false` / [`Gender::Male`]. On failure the error
/// lists every missing field so the caller can surface all of them at once.
pub fn validate(raw: RawReadingInput) -> Result<ReadingInput, ValidationError> {
    let person_a = sanitize_person(raw.person_a);
    let person_b = sanitize_person(raw.person_b);

    let mut missing = Vec::new();
    if person_a.name.is_empty() {
        missing.push("person_a.name");
    }
    if person_a.birthday.is_empty() {
        missing.push("person_a.birthday");
    }
    if person_b.name.is_empty() {
        missing.push("person_b.name");
    }
    if person_b.birthday.is_empty() {
        missing.push("person_b.birthday");
    }
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    Ok(ReadingInput { person_a, person_b })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw_person(name: &str, birthday: &str) -> RawPersonInput {
        RawPersonInput {
            name: Some(name.to_string()),
            birthday: Some(birthday.to_string()),
            ..RawPersonInput::default()
        }
    }

    #[test]
    fn test_validate_accepts_minimal_input() {
        let input = validate(RawReadingInput {
            person_a: Some(raw_person("Alice", "1990-01-01")),
            person_b: Some(raw_person("Bob", "1992-02-02")),
        })
        .unwrap();

        assert_eq!(input.person_a.name, "Alice");
        assert_eq!(input.person_b.birthday, "1992-02-02");
        assert_eq!(input.person_a.gender, Gender::Male);
        assert!(!input.person_a.birthtime_unknown);
        assert_eq!(input.person_a.birthplace, "");
    }

    #[test]
    fn test_validate_trims_whitespace() {
        let input = validate(RawReadingInput {
            person_a: Some(raw_person("  Alice  ", " 1990-01-01 ")),
            person_b: Some(raw_person("Bob", "1992-02-02")),
        })
        .unwrap();

        assert_eq!(input.person_a.name, "Alice");
        assert_eq!(input.person_a.birthday, "1990-01-01");
    }

    #[test]
    fn test_validate_lists_all_missing_fields() {
        let err = validate(RawReadingInput {
            person_a: Some(raw_person("", "1990-01-01")),
            person_b: None,
        })
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("person_a.name"));
        assert!(message.contains("person_b.name"));
        assert!(message.contains("person_b.birthday"));
        assert!(!message.contains("person_a.birthday"));
    }

    #[test]
    fn test_whitespace_only_name_is_missing() {
        let err = validate(RawReadingInput {
            person_a: Some(raw_person("   ", "1990-01-01")),
            person_b: Some(raw_person("Bob", "1992-02-02")),
        })
        .unwrap_err();
        assert!(err.to_string().contains("person_a.name"));
    }

    #[test]
    fn test_unrecognized_gender_defaults_to_male() {
        let mut person = raw_person("Alice", "1990-01-01");
        person.gender = Some("unknown-token".to_string());
        let input = validate(RawReadingInput {
            person_a: Some(person),
            person_b: Some(raw_person("Bob", "1992-02-02")),
        })
        .unwrap();
        assert_eq!(input.person_a.gender, Gender::Male);
    }

    #[test]
    fn test_gender_variants_parse() {
        let mut a = raw_person("Alice", "1990-01-01");
        a.gender = Some("female".to_string());
        let mut b = raw_person("Bob", "1992-02-02");
        b.gender = Some("other".to_string());

        let input = validate(RawReadingInput {
            person_a: Some(a),
            person_b: Some(b),
        })
        .unwrap();
        assert_eq!(input.person_a.gender, Gender::Female);
        assert_eq!(input.person_b.gender, Gender::Other);
    }
}
