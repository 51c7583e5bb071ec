//! Data type properties, their modifiers and validations, and parameters.

use std::{fmt, str::FromStr};

use crate::{
    identifier::Id,
    model::{
        criteria::{Criteria, OrderBy},
        types::{ClassifierId, DataType, Multiplicity, ParameterId, UnknownKeyword},
    },
};

/// Keywords that may follow a data type property's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyModifier {
    Key,
    Id,
    Private,
    UserId,
    Version,
    CreatedBy,
    CreatedOn,
    LastUpdatedBy,
    Valid,
    System,
    From,
    To,
    Final,
}

impl PropertyModifier {
    pub const ALL: [PropertyModifier; 13] = [
        PropertyModifier::Key,
        PropertyModifier::Id,
        PropertyModifier::Private,
        PropertyModifier::UserId,
        PropertyModifier::Version,
        PropertyModifier::CreatedBy,
        PropertyModifier::CreatedOn,
        PropertyModifier::LastUpdatedBy,
        PropertyModifier::Valid,
        PropertyModifier::System,
        PropertyModifier::From,
        PropertyModifier::To,
        PropertyModifier::Final,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            PropertyModifier::Key => "key",
            PropertyModifier::Id => "id",
            PropertyModifier::Private => "private",
            PropertyModifier::UserId => "userId",
            PropertyModifier::Version => "version",
            PropertyModifier::CreatedBy => "createdBy",
            PropertyModifier::CreatedOn => "createdOn",
            PropertyModifier::LastUpdatedBy => "lastUpdatedBy",
            PropertyModifier::Valid => "valid",
            PropertyModifier::System => "system",
            PropertyModifier::From => "from",
            PropertyModifier::To => "to",
            PropertyModifier::Final => "final",
        }
    }
}

impl FromStr for PropertyModifier {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyModifier::ALL
            .into_iter()
            .find(|modifier| modifier.keyword() == s)
            .ok_or_else(|| UnknownKeyword::new("property modifier", s))
    }
}

impl fmt::Display for PropertyModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Length and range constraints of a data type property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Validations {
    pub min_length: Option<i64>,
    pub max_length: Option<i64>,
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
}

impl Validations {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A scalar-valued member of a classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTypeProperty {
    name: Id,
    ordinal: usize,
    data_type: DataType,
    optional: bool,
    modifiers: Vec<PropertyModifier>,
    validations: Validations,
    inferred: bool,
}

impl DataTypeProperty {
    pub fn new(
        name: Id,
        ordinal: usize,
        data_type: DataType,
        optional: bool,
        modifiers: Vec<PropertyModifier>,
        validations: Validations,
        inferred: bool,
    ) -> Self {
        Self {
            name,
            ordinal,
            data_type,
            optional,
            modifiers,
            validations,
            inferred,
        }
    }

    pub fn name(&self) -> Id {
        self.name
    }

    /// Declaration order among the members of the owning classifier.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn modifiers(&self) -> &[PropertyModifier] {
        &self.modifiers
    }

    pub fn has_modifier(&self, modifier: PropertyModifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    pub fn is_key(&self) -> bool {
        self.has_modifier(PropertyModifier::Key)
    }

    pub fn is_id(&self) -> bool {
        self.has_modifier(PropertyModifier::Id)
    }

    pub fn is_private(&self) -> bool {
        self.has_modifier(PropertyModifier::Private)
    }

    pub fn validations(&self) -> Validations {
        self.validations
    }

    /// Whether the compiler synthesized this property.
    pub fn is_inferred(&self) -> bool {
        self.inferred
    }
}

/// A typed, named input of a URL or parameterized property.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: Id,
    ordinal: usize,
    data_type: DataType,
    multiplicity: Multiplicity,
}

impl Parameter {
    pub fn new(name: Id, ordinal: usize, data_type: DataType, multiplicity: Multiplicity) -> Self {
        Self {
            name,
            ordinal,
            data_type,
            multiplicity,
        }
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }
}

/// A reference-valued member computed from parameters and a criteria.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterizedProperty {
    name: Id,
    ordinal: usize,
    parameters: Vec<ParameterId>,
    target: ClassifierId,
    multiplicity: Multiplicity,
    criteria: Criteria,
    order_by: Option<OrderBy>,
}

impl ParameterizedProperty {
    pub fn new(
        name: Id,
        ordinal: usize,
        parameters: Vec<ParameterId>,
        target: ClassifierId,
        multiplicity: Multiplicity,
        criteria: Criteria,
        order_by: Option<OrderBy>,
    ) -> Self {
        Self {
            name,
            ordinal,
            parameters,
            target,
            multiplicity,
            criteria,
            order_by,
        }
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn parameters(&self) -> &[ParameterId] {
        &self.parameters
    }

    pub fn target(&self) -> ClassifierId {
        self.target
    }

    pub fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn order_by(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::PrimitiveType;

    #[test]
    fn test_modifier_keywords() {
        for modifier in PropertyModifier::ALL {
            assert_eq!(modifier.keyword().parse::<PropertyModifier>(), Ok(modifier));
        }
        assert!("owned".parse::<PropertyModifier>().is_err());
    }

    #[test]
    fn test_property_predicates() {
        let property = DataTypeProperty::new(
            Id::new("id"),
            1,
            DataType::Primitive(PrimitiveType::Long),
            false,
            vec![PropertyModifier::Key, PropertyModifier::Id],
            Validations::default(),
            false,
        );

        assert!(property.is_key());
        assert!(property.is_id());
        assert!(!property.is_private());
        assert!(property.validations().is_empty());
    }
}
