//! Classes and interfaces.

use std::{fmt, str::FromStr};

use crate::{
    identifier::Id,
    model::{
        association::AssociationEndSignature,
        property::{DataTypeProperty, ParameterizedProperty},
        types::{AssociationEndId, ClassifierId, UnknownKeyword},
    },
};

/// Whether a classifier is a class, the user class, or an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassifierKind {
    Class,
    /// The single class that models authenticated users.
    User,
    Interface,
}

impl ClassifierKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            ClassifierKind::Class => "class",
            ClassifierKind::User => "user",
            ClassifierKind::Interface => "interface",
        }
    }

    /// Classes and the user class can be instantiated; interfaces cannot.
    pub fn is_class(&self) -> bool {
        !matches!(self, ClassifierKind::Interface)
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Keywords that follow a classifier's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassModifier {
    SystemTemporal,
    ValidTemporal,
    Bitemporal,
    Versioned,
    Audited,
    Transient,
    Abstract,
}

impl ClassModifier {
    pub const ALL: [ClassModifier; 7] = [
        ClassModifier::SystemTemporal,
        ClassModifier::ValidTemporal,
        ClassModifier::Bitemporal,
        ClassModifier::Versioned,
        ClassModifier::Audited,
        ClassModifier::Transient,
        ClassModifier::Abstract,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            ClassModifier::SystemTemporal => "systemTemporal",
            ClassModifier::ValidTemporal => "validTemporal",
            ClassModifier::Bitemporal => "bitemporal",
            ClassModifier::Versioned => "versioned",
            ClassModifier::Audited => "audited",
            ClassModifier::Transient => "transient",
            ClassModifier::Abstract => "abstract",
        }
    }
}

impl FromStr for ClassModifier {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClassModifier::ALL
            .into_iter()
            .find(|modifier| modifier.keyword() == s)
            .ok_or_else(|| UnknownKeyword::new("class modifier", s))
    }
}

impl fmt::Display for ClassModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A class, user class or interface.
///
/// Properties are those declared directly on the classifier. Inherited
/// members are reached through [`Classifier::superclass`] and
/// [`Classifier::interfaces`].
#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    name: Id,
    package: Id,
    ordinal: usize,
    kind: ClassifierKind,
    modifiers: Vec<ClassModifier>,
    superclass: Option<ClassifierId>,
    interfaces: Vec<ClassifierId>,
    properties: Vec<DataTypeProperty>,
    association_ends: Vec<AssociationEndId>,
    association_end_signatures: Vec<AssociationEndSignature>,
    parameterized_properties: Vec<ParameterizedProperty>,
    version_class: Option<ClassifierId>,
    version_of: Option<ClassifierId>,
    inferred: bool,
}

impl Classifier {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: Id,
        package: Id,
        ordinal: usize,
        kind: ClassifierKind,
        modifiers: Vec<ClassModifier>,
        superclass: Option<ClassifierId>,
        interfaces: Vec<ClassifierId>,
        properties: Vec<DataTypeProperty>,
        association_ends: Vec<AssociationEndId>,
        association_end_signatures: Vec<AssociationEndSignature>,
        parameterized_properties: Vec<ParameterizedProperty>,
        version_class: Option<ClassifierId>,
        version_of: Option<ClassifierId>,
        inferred: bool,
    ) -> Self {
        Self {
            name,
            package,
            ordinal,
            kind,
            modifiers,
            superclass,
            interfaces,
            properties,
            association_ends,
            association_end_signatures,
            parameterized_properties,
            version_class,
            version_of,
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

    pub fn kind(&self) -> ClassifierKind {
        self.kind
    }

    pub fn modifiers(&self) -> &[ClassModifier] {
        &self.modifiers
    }

    pub fn has_modifier(&self, modifier: ClassModifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    pub fn superclass(&self) -> Option<ClassifierId> {
        self.superclass
    }

    pub fn interfaces(&self) -> &[ClassifierId] {
        &self.interfaces
    }

    pub fn properties(&self) -> &[DataTypeProperty] {
        &self.properties
    }

    /// Finds a directly declared data type property by name.
    pub fn property(&self, name: Id) -> Option<&DataTypeProperty> {
        self.properties.iter().find(|property| property.name() == name)
    }

    /// Association ends whose owning classifier is this one.
    pub fn association_ends(&self) -> &[AssociationEndId] {
        &self.association_ends
    }

    pub fn association_end_signatures(&self) -> &[AssociationEndSignature] {
        &self.association_end_signatures
    }

    pub fn parameterized_properties(&self) -> &[ParameterizedProperty] {
        &self.parameterized_properties
    }

    /// The `<Name>Version` companion of a versioned class.
    pub fn version_class(&self) -> Option<ClassifierId> {
        self.version_class
    }

    /// For a version companion, the class it versions.
    pub fn version_of(&self) -> Option<ClassifierId> {
        self.version_of
    }

    pub fn is_inferred(&self) -> bool {
        self.inferred
    }

    pub fn key_properties(&self) -> impl Iterator<Item = &DataTypeProperty> {
        self.properties.iter().filter(|property| property.is_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_modifier_keywords() {
        for modifier in ClassModifier::ALL {
            assert_eq!(modifier.keyword().parse::<ClassModifier>(), Ok(modifier));
        }
        assert!("temporal".parse::<ClassModifier>().is_err());
    }

    #[test]
    fn test_classifier_kind() {
        assert!(ClassifierKind::User.is_class());
        assert!(!ClassifierKind::Interface.is_class());
        assert_eq!(ClassifierKind::Interface.to_string(), "interface");
    }
}
