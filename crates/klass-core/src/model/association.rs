use std::{fmt, str::FromStr};

use crate::{
    identifier::Id,
    model::{
        criteria::{Criteria, OrderBy},
        types::{
            AssociationEndId, AssociationId, ClassifierId, Multiplicity, PropertyRef,
            UnknownKeyword,
        },
    },
};

/// Keywords that follow an association end's multiplicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssociationEndModifier {
    Owned,
    Final,
    Version,
    Versioned,
}

impl AssociationEndModifier {
    pub const ALL: [AssociationEndModifier; 4] = [
        AssociationEndModifier::Owned,
        AssociationEndModifier::Final,
        AssociationEndModifier::Version,
        AssociationEndModifier::Versioned,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            AssociationEndModifier::Owned => "owned",
            AssociationEndModifier::Final => "final",
            AssociationEndModifier::Version => "version",
            AssociationEndModifier::Versioned => "versioned",
        }
    }
}

impl FromStr for AssociationEndModifier {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssociationEndModifier::ALL
            .into_iter()
            .find(|modifier| modifier.keyword() == s)
            .ok_or_else(|| UnknownKeyword::new("association end modifier", s))
    }
}

impl fmt::Display for AssociationEndModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A binary relationship between two classes.
///
/// The source end is declared first and its type is the class that `this`
/// refers to in the relationship criteria.
#[derive(Debug, Clone, PartialEq)]
pub struct Association {
    name: Id,
    package: Id,
    ordinal: usize,
    source_end: AssociationEndId,
    target_end: AssociationEndId,
    relationship: Criteria,
    foreign_keys: Vec<ForeignKey>,
    inferred: bool,
}

impl Association {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: Id,
        package: Id,
        ordinal: usize,
        source_end: AssociationEndId,
        target_end: AssociationEndId,
        relationship: Criteria,
        foreign_keys: Vec<ForeignKey>,
        inferred: bool,
    ) -> Self {
        Self {
            name,
            package,
            ordinal,
            source_end,
            target_end,
            relationship,
            foreign_keys,
            inferred,
        }
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn package(&self) -> Id {
        self.package
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn source_end(&self) -> AssociationEndId {
        self.source_end
    }

    pub fn target_end(&self) -> AssociationEndId {
        self.target_end
    }

    pub fn relationship(&self) -> &Criteria {
        &self.relationship
    }

    /// Property pairs of the relationship that join a foreign key to a key.
    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    pub fn is_inferred(&self) -> bool {
        self.inferred
    }
}

/// A foreign-key property and the key property it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    foreign: PropertyRef,
    key: PropertyRef,
}

impl ForeignKey {
    pub fn new(foreign: PropertyRef, key: PropertyRef) -> Self {
        Self { foreign, key }
    }

    pub fn foreign(&self) -> PropertyRef {
        self.foreign
    }

    pub fn key(&self) -> PropertyRef {
        self.key
    }
}

/// One navigable side of an [`Association`].
///
/// The end is a property on its `owner` whose values are instances of
/// `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationEnd {
    name: Id,
    association: AssociationId,
    owner: ClassifierId,
    target: ClassifierId,
    multiplicity: Multiplicity,
    modifiers: Vec<AssociationEndModifier>,
    opposite: AssociationEndId,
    order_by: Option<OrderBy>,
}

impl AssociationEnd {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: Id,
        association: AssociationId,
        owner: ClassifierId,
        target: ClassifierId,
        multiplicity: Multiplicity,
        modifiers: Vec<AssociationEndModifier>,
        opposite: AssociationEndId,
        order_by: Option<OrderBy>,
    ) -> Self {
        Self {
            name,
            association,
            owner,
            target,
            multiplicity,
            modifiers,
            opposite,
            order_by,
        }
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn association(&self) -> AssociationId {
        self.association
    }

    pub fn owner(&self) -> ClassifierId {
        self.owner
    }

    pub fn target(&self) -> ClassifierId {
        self.target
    }

    pub fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    pub fn modifiers(&self) -> &[AssociationEndModifier] {
        &self.modifiers
    }

    pub fn has_modifier(&self, modifier: AssociationEndModifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    pub fn is_owned(&self) -> bool {
        self.has_modifier(AssociationEndModifier::Owned)
    }

    pub fn opposite(&self) -> AssociationEndId {
        self.opposite
    }

    pub fn order_by(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }
}

/// A reference declared directly on a classifier, usually an interface,
/// without an association of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationEndSignature {
    name: Id,
    ordinal: usize,
    target: ClassifierId,
    multiplicity: Multiplicity,
    modifiers: Vec<AssociationEndModifier>,
    order_by: Option<OrderBy>,
}

impl AssociationEndSignature {
    pub fn new(
        name: Id,
        ordinal: usize,
        target: ClassifierId,
        multiplicity: Multiplicity,
        modifiers: Vec<AssociationEndModifier>,
        order_by: Option<OrderBy>,
    ) -> Self {
        Self {
            name,
            ordinal,
            target,
            multiplicity,
            modifiers,
            order_by,
        }
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn target(&self) -> ClassifierId {
        self.target
    }

    pub fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    pub fn modifiers(&self) -> &[AssociationEndModifier] {
        &self.modifiers
    }

    pub fn order_by(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_modifier_keywords() {
        for modifier in AssociationEndModifier::ALL {
            assert_eq!(
                modifier.keyword().parse::<AssociationEndModifier>(),
                Ok(modifier)
            );
        }
        assert!("key".parse::<AssociationEndModifier>().is_err());
    }
}
