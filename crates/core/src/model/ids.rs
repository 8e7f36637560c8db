use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing an ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cannot be blank", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

/// Catalog identifiers are opaque strings (`"algebra-1-1"`, `"math"`), so every
/// id type is a transparent `String` newtype with the same surface.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new id from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ParseIdError {
                        kind: stringify!($name),
                    });
                }
                Ok(Self::new(trimmed))
            }
        }
    };
}

string_id!(
    /// Unique identifier for a Subject (e.g. `math`)
    SubjectId
);
string_id!(
    /// Unique identifier for a Unit within the catalog
    UnitId
);
string_id!(
    /// Unique identifier for a Lesson within the catalog
    LessonId
);
string_id!(
    /// Unique identifier for a Quiz within the catalog
    QuizId
);
string_id!(
    /// Identifier of a question, unique within its quiz
    QuestionId
);

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_lesson_id_display() {
        let id = LessonId::new("algebra-1-1");
        assert_eq!(id.to_string(), "algebra-1-1");
    }

    #[test]
    fn test_lesson_id_from_str_trims() {
        let id: LessonId = "  algebra-1-2 ".parse().unwrap();
        assert_eq!(id, LessonId::new("algebra-1-2"));
    }

    #[test]
    fn test_unit_id_from_str_blank() {
        let err = "   ".parse::<UnitId>().unwrap_err();
        assert_eq!(err.to_string(), "UnitId cannot be blank");
    }

    #[test]
    fn test_quiz_id_debug() {
        let id = QuizId::new("quiz-algebra-1-1");
        assert_eq!(format!("{id:?}"), "QuizId(\"quiz-algebra-1-1\")");
    }

    #[test]
    fn test_set_lookup_by_str() {
        let set: BTreeSet<LessonId> = [LessonId::new("a"), LessonId::new("b")].into();
        assert!(set.contains("a"));
        assert!(!set.contains("c"));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&SubjectId::new("math")).unwrap();
        assert_eq!(json, "\"math\"");
    }
}
