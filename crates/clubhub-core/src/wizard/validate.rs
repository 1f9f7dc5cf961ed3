//! Input rules for each club field.
//!
//! Lengths are counted in characters after trimming surrounding whitespace.

use clubhub_types::club::NewClub;

pub const MIN_NAME_CHARS: usize = 3;
pub const MAX_NAME_CHARS: usize = 200;
pub const MIN_DESCRIPTION_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 5_000;
pub const MAX_CATEGORY_CHARS: usize = 100;

/// Replies at the city stage meaning "no city".
const CITY_SKIP_WORDS: &[&str] = &[
    "skip", "none", "no city", "online", "-", "пропустить", "без города", "нет",
];

/// A slot value that fails its stage's rule. Recovered by re-prompting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("the name is too short: at least {min} characters are needed")]
    NameTooShort { min: usize },

    #[error("the name is too long: at most {max} characters are allowed")]
    NameTooLong { max: usize },

    #[error("the description is too short ({actual} of {min} characters)")]
    DescriptionTooShort { min: usize, actual: usize },

    #[error("the description is too long: at most {max} characters are allowed")]
    DescriptionTooLong { max: usize },

    #[error("the category cannot be empty")]
    CategoryEmpty,

    #[error("the category is too long: at most {max} characters are allowed")]
    CategoryTooLong { max: usize },
}

pub fn validate_name(input: &str) -> Result<String, ValidationError> {
    let name = input.trim();
    let len = name.chars().count();
    if len < MIN_NAME_CHARS {
        return Err(ValidationError::NameTooShort {
            min: MIN_NAME_CHARS,
        });
    }
    if len > MAX_NAME_CHARS {
        return Err(ValidationError::NameTooLong {
            max: MAX_NAME_CHARS,
        });
    }
    Ok(name.to_string())
}

pub fn validate_description(input: &str) -> Result<String, ValidationError> {
    let description = input.trim();
    let len = description.chars().count();
    if len < MIN_DESCRIPTION_CHARS {
        return Err(ValidationError::DescriptionTooShort {
            min: MIN_DESCRIPTION_CHARS,
            actual: len,
        });
    }
    if len > MAX_DESCRIPTION_CHARS {
        return Err(ValidationError::DescriptionTooLong {
            max: MAX_DESCRIPTION_CHARS,
        });
    }
    Ok(description.to_string())
}

pub fn validate_category(input: &str) -> Result<String, ValidationError> {
    let category = input.trim();
    if category.is_empty() {
        return Err(ValidationError::CategoryEmpty);
    }
    if category.chars().count() > MAX_CATEGORY_CHARS {
        return Err(ValidationError::CategoryTooLong {
            max: MAX_CATEGORY_CHARS,
        });
    }
    Ok(category.to_string())
}

/// `None` when the user skipped the city.
pub fn parse_city(input: &str) -> Option<String> {
    let city = input.trim();
    let lowered = city.to_lowercase();
    if city.is_empty() || CITY_SKIP_WORDS.contains(&lowered.as_str()) {
        None
    } else {
        Some(city.to_string())
    }
}

/// Apply every field rule to a complete club, normalizing whitespace.
pub fn validate_new_club(club: &NewClub) -> Result<NewClub, ValidationError> {
    Ok(NewClub {
        name: validate_name(&club.name)?,
        description: validate_description(&club.description)?,
        category: validate_category(&club.category)?,
        city: club.city.as_deref().and_then(parse_city),
        owner_id: club.owner_id.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_length_gate() {
        assert_eq!(
            validate_name("ab"),
            Err(ValidationError::NameTooShort { min: 3 })
        );
        assert_eq!(
            validate_name("  ab  "),
            Err(ValidationError::NameTooShort { min: 3 })
        );
        assert_eq!(validate_name("abc").unwrap(), "abc");
        assert_eq!(validate_name("  Chess Club ").unwrap(), "Chess Club");
        assert!(validate_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_name_counts_characters_not_bytes() {
        // Three Cyrillic letters are six bytes.
        assert_eq!(validate_name("Шах").unwrap(), "Шах");
    }

    #[test]
    fn test_description_is_a_hard_gate_at_200() {
        assert_eq!(
            validate_description(&"A".repeat(199)),
            Err(ValidationError::DescriptionTooShort {
                min: 200,
                actual: 199
            })
        );
        assert!(validate_description(&"A".repeat(200)).is_ok());
        assert!(validate_description(&"A".repeat(5_001)).is_err());
    }

    #[test]
    fn test_category_must_not_be_empty() {
        assert_eq!(validate_category("   "), Err(ValidationError::CategoryEmpty));
        assert_eq!(validate_category(" Sports ").unwrap(), "Sports");
    }

    #[test]
    fn test_city_skip_words() {
        assert_eq!(parse_city("skip"), None);
        assert_eq!(parse_city("SKIP"), None);
        assert_eq!(parse_city("без города"), None);
        assert_eq!(parse_city(" - "), None);
        assert_eq!(parse_city("Almaty").as_deref(), Some("Almaty"));
    }

    #[test]
    fn test_validate_new_club() {
        let club = NewClub {
            name: " Chess Club ".into(),
            description: "d".repeat(210),
            category: "Sports".into(),
            city: Some("skip".into()),
            owner_id: "u1".into(),
        };
        let normalized = validate_new_club(&club).unwrap();
        assert_eq!(normalized.name, "Chess Club");
        assert_eq!(normalized.city, None);

        let short = NewClub {
            description: "too short".into(),
            ..club
        };
        assert!(matches!(
            validate_new_club(&short),
            Err(ValidationError::DescriptionTooShort { .. })
        ));
    }
}
