//! The outcome of resolving a name.

/// A reference that may have failed to resolve.
///
/// Resolution never fails outright: a missing or ambiguous name becomes a
/// sentinel that later phases skip over and the error report describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolved<T> {
    Found(T),
    NotFound,
    /// More than one candidate matched.
    Ambiguous,
}

impl<T: Copy> Resolved<T> {
    pub fn found(&self) -> Option<T> {
        match self {
            Resolved::Found(value) => Some(*value),
            Resolved::NotFound | Resolved::Ambiguous => None,
        }
    }
}

impl<T> Resolved<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolved::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        match self {
            Resolved::Found(value) => Resolved::Found(f(value)),
            Resolved::NotFound => Resolved::NotFound,
            Resolved::Ambiguous => Resolved::Ambiguous,
        }
    }

    /// Merge candidates found along different inheritance paths.
    pub fn from_candidates(candidates: impl IntoIterator<Item = T>) -> Resolved<T>
    where
        T: PartialEq,
    {
        let mut unique: Vec<T> = Vec::new();
        for candidate in candidates {
            if !unique.contains(&candidate) {
                unique.push(candidate);
            }
        }
        match unique.len() {
            0 => Resolved::NotFound,
            1 => unique.pop().map_or(Resolved::NotFound, Resolved::Found),
            _ => Resolved::Ambiguous,
        }
    }
}

/// Unwraps a resolution that must have succeeded because the compilation
/// reported no errors.
pub(crate) fn expect_found<T: Copy>(resolved: Option<Resolved<T>>, what: &str) -> T {
    match resolved.and_then(|resolved| resolved.found()) {
        Some(value) => value,
        None => panic!("illegal state: {what} is unresolved in an error-free compilation"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_candidates() {
        assert_eq!(Resolved::<u8>::from_candidates(vec![]), Resolved::NotFound);
        assert_eq!(Resolved::from_candidates(vec![3]), Resolved::Found(3));
        assert_eq!(Resolved::from_candidates(vec![3, 3]), Resolved::Found(3));
        assert_eq!(Resolved::from_candidates(vec![3, 4, 3]), Resolved::Ambiguous);
    }

    #[test]
    fn test_map() {
        assert_eq!(Resolved::<u8>::Ambiguous.map(|n| n * 10), Resolved::Ambiguous);
        assert_eq!(Resolved::Found(2).map(|n| n * 10).found(), Some(20));
    }

    #[test]
    #[should_panic(expected = "illegal state")]
    fn test_expect_found_panics_on_sentinel() {
        expect_found::<u8>(Some(Resolved::NotFound), "superclass");
    }
}
