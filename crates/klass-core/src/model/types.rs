//! Scalar types, multiplicities and typed indices shared by the model.

use std::{fmt, str::FromStr};

use thiserror::Error;

macro_rules! model_index {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(usize);

        impl $name {
            /// Creates an index from its raw position.
            pub fn new(index: usize) -> Self {
                Self(index)
            }

            /// Returns the raw position in the owning [`DomainModel`](super::DomainModel) table.
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

model_index!(
    /// Index of an [`Enumeration`](super::Enumeration).
    EnumerationId
);
model_index!(
    /// Index of a [`Classifier`](super::Classifier) (class or interface).
    ClassifierId
);
model_index!(
    /// Index of an [`Association`](super::Association).
    AssociationId
);
model_index!(
    /// Index of an [`AssociationEnd`](super::AssociationEnd).
    AssociationEndId
);
model_index!(
    /// Index of a [`Projection`](super::Projection).
    ProjectionId
);
model_index!(
    /// Index of a [`ServiceGroup`](super::ServiceGroup).
    ServiceGroupId
);
model_index!(
    /// Index of a [`Parameter`](super::Parameter).
    ParameterId
);

/// Reference to a data type property: the declaring classifier and the
/// property's position in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyRef {
    classifier: ClassifierId,
    index: usize,
}

impl PropertyRef {
    pub fn new(classifier: ClassifierId, index: usize) -> Self {
        Self { classifier, index }
    }

    /// The classifier that declares the property.
    pub fn classifier(&self) -> ClassifierId {
        self.classifier
    }

    /// Position of the property within its classifier.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Error returned when a name does not denote a known keyword.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{name}`")]
pub struct UnknownKeyword {
    kind: &'static str,
    name: String,
}

impl UnknownKeyword {
    pub fn new(kind: &'static str, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Built-in scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Integer,
    Long,
    Double,
    Float,
    Boolean,
    String,
    Instant,
    LocalDate,
    TemporalInstant,
    TemporalRange,
}

impl PrimitiveType {
    /// Every primitive type, in declaration order.
    pub const ALL: [PrimitiveType; 10] = [
        PrimitiveType::Integer,
        PrimitiveType::Long,
        PrimitiveType::Double,
        PrimitiveType::Float,
        PrimitiveType::Boolean,
        PrimitiveType::String,
        PrimitiveType::Instant,
        PrimitiveType::LocalDate,
        PrimitiveType::TemporalInstant,
        PrimitiveType::TemporalRange,
    ];

    /// The keyword used for this type in source text.
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Integer => "Integer",
            PrimitiveType::Long => "Long",
            PrimitiveType::Double => "Double",
            PrimitiveType::Float => "Float",
            PrimitiveType::Boolean => "Boolean",
            PrimitiveType::String => "String",
            PrimitiveType::Instant => "Instant",
            PrimitiveType::LocalDate => "LocalDate",
            PrimitiveType::TemporalInstant => "TemporalInstant",
            PrimitiveType::TemporalRange => "TemporalRange",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PrimitiveType::Integer
                | PrimitiveType::Long
                | PrimitiveType::Double
                | PrimitiveType::Float
        )
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, PrimitiveType::Integer | PrimitiveType::Long)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            PrimitiveType::TemporalInstant | PrimitiveType::TemporalRange
        )
    }
}

impl FromStr for PrimitiveType {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrimitiveType::ALL
            .into_iter()
            .find(|primitive| primitive.name() == s)
            .ok_or_else(|| UnknownKeyword::new("primitive type", s))
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type of a data type property or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Primitive(PrimitiveType),
    Enumeration(EnumerationId),
}

impl DataType {
    /// Returns the primitive type, if this is one.
    pub fn primitive(&self) -> Option<PrimitiveType> {
        match self {
            DataType::Primitive(primitive) => Some(*primitive),
            DataType::Enumeration(_) => None,
        }
    }
}

/// Cardinality of association ends, reference properties and parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    ZeroToOne,
    OneToOne,
    ZeroToMany,
    OneToMany,
}

impl Multiplicity {
    /// Maps `lower..upper` bounds to a multiplicity. `None` as the upper
    /// bound means `*`.
    ///
    /// Returns `None` for bounds the language does not support.
    pub fn from_bounds(lower: u64, upper: Option<u64>) -> Option<Self> {
        match (lower, upper) {
            (0, Some(1)) => Some(Multiplicity::ZeroToOne),
            (1, Some(1)) => Some(Multiplicity::OneToOne),
            (0, None) => Some(Multiplicity::ZeroToMany),
            (1, None) => Some(Multiplicity::OneToMany),
            _ => None,
        }
    }

    pub fn is_to_one(&self) -> bool {
        matches!(self, Multiplicity::ZeroToOne | Multiplicity::OneToOne)
    }

    pub fn is_to_many(&self) -> bool {
        !self.is_to_one()
    }

    pub fn is_required(&self) -> bool {
        matches!(self, Multiplicity::OneToOne | Multiplicity::OneToMany)
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Multiplicity::ZeroToOne => "[0..1]",
            Multiplicity::OneToOne => "[1..1]",
            Multiplicity::ZeroToMany => "[0..*]",
            Multiplicity::OneToMany => "[1..*]",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_type_round_trip_names() {
        for primitive in PrimitiveType::ALL {
            assert_eq!(primitive.name().parse::<PrimitiveType>(), Ok(primitive));
        }
        assert!("Text".parse::<PrimitiveType>().is_err());
    }

    #[test]
    fn test_primitive_type_categories() {
        assert!(PrimitiveType::Long.is_numeric());
        assert!(PrimitiveType::Long.is_integral());
        assert!(!PrimitiveType::Double.is_integral());
        assert!(!PrimitiveType::String.is_numeric());
        assert!(PrimitiveType::TemporalRange.is_temporal());
        assert!(!PrimitiveType::Instant.is_temporal());
    }

    #[test]
    fn test_unknown_keyword_message() {
        let err = "Text".parse::<PrimitiveType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown primitive type `Text`");
    }

    #[test]
    fn test_multiplicity_from_bounds() {
        assert_eq!(
            Multiplicity::from_bounds(0, Some(1)),
            Some(Multiplicity::ZeroToOne)
        );
        assert_eq!(
            Multiplicity::from_bounds(1, None),
            Some(Multiplicity::OneToMany)
        );
        assert_eq!(Multiplicity::from_bounds(2, Some(5)), None);
        assert_eq!(Multiplicity::from_bounds(1, Some(0)), None);
    }

    #[test]
    fn test_multiplicity_predicates() {
        assert!(Multiplicity::ZeroToOne.is_to_one());
        assert!(!Multiplicity::ZeroToOne.is_required());
        assert!(Multiplicity::OneToMany.is_to_many());
        assert!(Multiplicity::OneToMany.is_required());
        assert_eq!(Multiplicity::ZeroToMany.to_string(), "[0..*]");
    }
}
