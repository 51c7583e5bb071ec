//! Interned identifiers for Klass names.
//!
//! Every name that appears in a Klass model (packages, classifiers, members,
//! parameters) is stored as an [`Id`]. Two identifiers compare equal exactly
//! when their text is equal, and comparison never touches the string data.

use std::{
    fmt,
    sync::{Mutex, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner shared by every compilation in the process.
///
/// # Thread Safety
///
/// Access goes through a `Mutex`, so independent compilations on different
/// threads can intern names concurrently.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn with_interner<R>(f: impl FnOnce(&mut DefaultStringInterner) -> R) -> R {
    let mut interner = INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("Failed to acquire interner lock");
    f(&mut interner)
}

/// An interned name.
///
/// # Examples
///
/// ```
/// use klass_core::identifier::Id;
///
/// let question = Id::new("Question");
/// assert_eq!(question, "Question");
///
/// let version = question.with_suffix("Version");
/// assert_eq!(version, "QuestionVersion");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Interns `name` and returns its identifier.
    pub fn new(name: &str) -> Self {
        Self(with_interner(|interner| interner.get_or_intern(name)))
    }

    /// Returns a new identifier made of this name followed by `suffix`.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let joined = format!("{self}{suffix}");
        Self::new(&joined)
    }

    /// Returns the package-qualified name, `package.Name`.
    ///
    /// An empty package yields the bare name.
    pub fn qualified(&self, package: Id) -> String {
        let package = package.to_string();
        if package.is_empty() {
            self.to_string()
        } else {
            format!("{package}.{self}")
        }
    }

    /// Returns the name with its first character lower-cased.
    ///
    /// Used to derive member names from type names, e.g. `Question` -> `question`.
    pub fn decapitalized(&self) -> Self {
        let text = self.to_string();
        let mut chars = text.chars();
        match chars.next() {
            Some(first) => {
                let lowered: String = first.to_lowercase().chain(chars).collect();
                Self::new(&lowered)
            }
            None => *self,
        }
    }

    /// Returns `true` if the name matches `[a-z][A-Za-z0-9]*`.
    pub fn is_member_name(&self) -> bool {
        let text = self.to_string();
        let mut chars = text.chars();
        chars.next().is_some_and(|c| c.is_ascii_lowercase())
            && chars.all(|c| c.is_ascii_alphanumeric())
    }

    /// Returns `true` if the name matches `[A-Z][A-Za-z0-9]*`.
    pub fn is_type_name(&self) -> bool {
        let text = self.to_string();
        let mut chars = text.chars();
        chars.next().is_some_and(|c| c.is_ascii_uppercase())
            && chars.all(|c| c.is_ascii_alphanumeric())
    }

    /// Returns `true` if the name matches `[A-Z][A-Z0-9_]*`.
    pub fn is_constant_name(&self) -> bool {
        let text = self.to_string();
        let mut chars = text.chars();
        chars.next().is_some_and(|c| c.is_ascii_uppercase())
            && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        with_interner(|interner| {
            let text = interner
                .resolve(self.0)
                .expect("Symbol should exist in interner");
            f.write_str(text)
        })
    }
}

impl std::str::FromStr for Id {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        with_interner(|interner| interner.resolve(self.0) == Some(other))
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn type_name_strategy() -> impl Strategy<Value = String> {
        "[A-Z][A-Za-z0-9]{0,12}"
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Interning the same text twice yields the same identifier, and the text survives.
    fn check_intern_round_trip(name: &str) -> Result<(), TestCaseError> {
        let first = Id::new(name);
        let second = Id::new(name);

        prop_assert_eq!(first, second);
        prop_assert_eq!(first.to_string(), name);
        Ok(())
    }

    /// A decapitalized type name is a member name with the same tail.
    fn check_decapitalized_is_member_name(name: &str) -> Result<(), TestCaseError> {
        let id = Id::new(name);
        prop_assert!(id.is_type_name());

        let member = id.decapitalized();
        prop_assert!(member.is_member_name(), "`{member}` is not a member name");
        prop_assert_eq!(&member.to_string()[1..], &name[1..]);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn intern_round_trip(name in "\\PC{0,24}") {
            check_intern_round_trip(&name)?;
        }

        #[test]
        fn decapitalized_is_member_name(name in type_name_strategy()) {
            check_decapitalized_is_member_name(&name)?;
        }
    }
}
