use crate::identifier::Id;

/// A named set of constants.
#[derive(Debug, Clone, PartialEq)]
pub struct Enumeration {
    name: Id,
    package: Id,
    ordinal: usize,
    literals: Vec<EnumerationLiteral>,
}

impl Enumeration {
    pub fn new(name: Id, package: Id, ordinal: usize, literals: Vec<EnumerationLiteral>) -> Self {
        Self {
            name,
            package,
            ordinal,
            literals,
        }
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn package(&self) -> Id {
        self.package
    }

    /// Declaration order among the top-level elements of its compilation unit.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn literals(&self) -> &[EnumerationLiteral] {
        &self.literals
    }

    /// Finds a literal by name.
    pub fn literal(&self, name: Id) -> Option<&EnumerationLiteral> {
        self.literals.iter().find(|literal| literal.name == name)
    }
}

/// One constant of an [`Enumeration`], with an optional display name.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumerationLiteral {
    name: Id,
    pretty_name: Option<String>,
    ordinal: usize,
}

impl EnumerationLiteral {
    pub fn new(name: Id, pretty_name: Option<String>, ordinal: usize) -> Self {
        Self {
            name,
            pretty_name,
            ordinal,
        }
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn pretty_name(&self) -> Option<&str> {
        self.pretty_name.as_deref()
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}
