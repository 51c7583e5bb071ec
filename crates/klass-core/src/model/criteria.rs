//! Boolean criteria, value expressions and order-by clauses.
//!
//! Criteria appear in three places: association relationships,
//! parameterized properties and service endpoints. All three share the
//! same expression language.

use std::{fmt, str::FromStr};

use crate::{
    identifier::Id,
    model::types::{
        AssociationEndId, ClassifierId, ParameterId, PrimitiveType, PropertyRef, UnknownKeyword,
    },
};

/// Comparison operators usable between two expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    In,
    Contains,
    StartsWith,
    EndsWith,
}

impl Operator {
    pub const ALL: [Operator; 10] = [
        Operator::Equal,
        Operator::NotEqual,
        Operator::LessThan,
        Operator::GreaterThan,
        Operator::LessThanOrEqual,
        Operator::GreaterThanOrEqual,
        Operator::In,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessThan => "<",
            Operator::GreaterThan => ">",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThanOrEqual => ">=",
            Operator::In => "in",
            Operator::Contains => "contains",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
        }
    }

    /// Whether the operator only applies to strings.
    pub fn is_string_operator(&self) -> bool {
        matches!(
            self,
            Operator::Contains | Operator::StartsWith | Operator::EndsWith
        )
    }

    /// Whether the operator requires ordered operands.
    pub fn is_inequality(&self) -> bool {
        matches!(
            self,
            Operator::LessThan
                | Operator::GreaterThan
                | Operator::LessThanOrEqual
                | Operator::GreaterThanOrEqual
        )
    }
}

impl FromStr for Operator {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|operator| operator.symbol() == s)
            .ok_or_else(|| UnknownKeyword::new("operator", s))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A boolean condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    /// Matches every instance.
    All,
    And(Box<Criteria>, Box<Criteria>),
    Or(Box<Criteria>, Box<Criteria>),
    Operator {
        operator: Operator,
        source: Expression,
        target: Expression,
    },
    /// `path equalsEdgePoint`: the temporal range at `path` is open ended.
    EdgePoint(MemberPath),
}

impl Criteria {
    /// Joins two criteria with `&&`.
    pub fn and(left: Criteria, right: Criteria) -> Self {
        Criteria::And(Box::new(left), Box::new(right))
    }

    /// Joins two criteria with `||`.
    pub fn or(left: Criteria, right: Criteria) -> Self {
        Criteria::Or(Box::new(left), Box::new(right))
    }

    /// Visits every operator and edge-point leaf, left to right.
    pub fn for_each_leaf<'a>(&'a self, visit: &mut impl FnMut(&'a Criteria)) {
        match self {
            Criteria::All => {}
            Criteria::And(left, right) | Criteria::Or(left, right) => {
                left.for_each_leaf(visit);
                right.for_each_leaf(visit);
            }
            Criteria::Operator { .. } | Criteria::EdgePoint(_) => visit(self),
        }
    }
}

/// A value compared by a criteria operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A `this.` or `Type.` path ending in a data type property.
    Member(MemberPath),
    /// A reference to a URL or parameterized property parameter.
    Variable { name: Id, parameter: ParameterId },
    Literal(Literal),
    LiteralList(Vec<Literal>),
    /// The authenticated user's id property.
    User(PropertyRef),
    Null,
}

/// A literal constant together with the type it was narrowed to.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    value: LiteralValue,
    data_type: PrimitiveType,
}

impl Literal {
    pub fn new(value: LiteralValue, data_type: PrimitiveType) -> Self {
        Self { value, data_type }
    }

    pub fn value(&self) -> &LiteralValue {
        &self.value
    }

    pub fn data_type(&self) -> PrimitiveType {
        self.data_type
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Integer(value) => write!(f, "{value}"),
            LiteralValue::Float(value) => write!(f, "{value}"),
            LiteralValue::String(value) => write!(f, "{value:?}"),
            LiteralValue::Boolean(value) => write!(f, "{value}"),
        }
    }
}

/// A navigation from a classifier through association ends to a data type
/// property, e.g. `this.question.title`.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberPath {
    classifier: ClassifierId,
    this: bool,
    ends: Vec<AssociationEndId>,
    property: PropertyRef,
}

impl MemberPath {
    pub fn new(
        classifier: ClassifierId,
        this: bool,
        ends: Vec<AssociationEndId>,
        property: PropertyRef,
    ) -> Self {
        Self {
            classifier,
            this,
            ends,
            property,
        }
    }

    /// The classifier the path starts from.
    pub fn classifier(&self) -> ClassifierId {
        self.classifier
    }

    /// Whether the path starts with `this` rather than a type name.
    pub fn is_this(&self) -> bool {
        self.this
    }

    pub fn ends(&self) -> &[AssociationEndId] {
        &self.ends
    }

    pub fn property(&self) -> PropertyRef {
        self.property
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => f.write_str("ascending"),
            SortDirection::Descending => f.write_str("descending"),
        }
    }
}

/// An ordered list of sort keys.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    members: Vec<OrderByMember>,
}

impl OrderBy {
    pub fn new(members: Vec<OrderByMember>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[OrderByMember] {
        &self.members
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByMember {
    path: MemberPath,
    direction: SortDirection,
    direction_inferred: bool,
}

impl OrderByMember {
    pub fn new(path: MemberPath, direction: SortDirection, direction_inferred: bool) -> Self {
        Self {
            path,
            direction,
            direction_inferred,
        }
    }

    pub fn path(&self) -> &MemberPath {
        &self.path
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Whether the direction was omitted in source and defaulted.
    pub fn is_direction_inferred(&self) -> bool {
        self.direction_inferred
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_symbols() {
        for operator in Operator::ALL {
            assert_eq!(operator.symbol().parse::<Operator>(), Ok(operator));
        }
        assert!(Operator::StartsWith.is_string_operator());
        assert!(Operator::LessThanOrEqual.is_inequality());
        assert!(!Operator::In.is_inequality());
    }

    #[test]
    fn test_for_each_leaf_visits_in_order() {
        let literal = |value| {
            Expression::Literal(Literal::new(
                LiteralValue::Integer(value),
                PrimitiveType::Integer,
            ))
        };
        let leaf = |value| Criteria::Operator {
            operator: Operator::Equal,
            source: literal(value),
            target: literal(value),
        };
        let criteria = Criteria::or(Criteria::and(leaf(1), leaf(2)), leaf(3));

        let mut seen = Vec::new();
        criteria.for_each_leaf(&mut |leaf| {
            if let Criteria::Operator {
                source: Expression::Literal(literal),
                ..
            } = leaf
            {
                seen.push(literal.value().clone());
            }
        });

        assert_eq!(
            seen,
            vec![
                LiteralValue::Integer(1),
                LiteralValue::Integer(2),
                LiteralValue::Integer(3)
            ]
        );
    }

    #[test]
    fn test_literal_value_display() {
        assert_eq!(LiteralValue::String("a".to_string()).to_string(), "\"a\"");
        assert_eq!(LiteralValue::Boolean(true).to_string(), "true");
    }
}
