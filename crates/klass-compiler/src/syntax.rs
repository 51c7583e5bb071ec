//! Syntax tree produced by the [`parser`](super::parser).
//!
//! The tree mirrors the surface syntax closely and performs no name
//! resolution. Keywords with a fixed vocabulary (modifiers, verbs,
//! operators) are already decoded into their model enums; names are
//! interned [`Id`]s with the span they were read from.
//!
//! # Organization
//!
//! - [`SourceFile`] - A package declaration and its top-level [`Declaration`]s
//! - [`ClassifierDecl`] / [`MemberDecl`] - Classes, users, interfaces and their members
//! - [`AssociationDecl`] - Associations and their two [`AssociationEndDecl`]s
//! - [`CriteriaDecl`] / [`ExpressionDecl`] - The shared criteria language
//! - [`ProjectionDecl`] - Projection trees
//! - [`ServiceGroupDecl`] - Service groups, URLs and endpoints

use klass_core::{
    identifier::Id,
    model::{
        AssociationEndModifier, ClassModifier, ClassifierKind, CriteriaKeyword, Multiplicity,
        Operator, PropertyModifier, ServiceMultiplicity, SortDirection, Verb,
    },
};

use crate::span::{Span, Spanned};

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// Dotted package name, spanning every segment.
    pub package: Spanned<Id>,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Enumeration(EnumerationDecl),
    Classifier(ClassifierDecl),
    Association(AssociationDecl),
    Projection(ProjectionDecl),
    Service(ServiceGroupDecl),
}

impl Declaration {
    /// The declared name. Service groups are named after their class.
    pub fn name(&self) -> &Spanned<Id> {
        match self {
            Declaration::Enumeration(decl) => &decl.name,
            Declaration::Classifier(decl) => &decl.name,
            Declaration::Association(decl) => &decl.name,
            Declaration::Projection(decl) => &decl.name,
            Declaration::Service(decl) => &decl.class_name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Declaration::Enumeration(decl) => decl.span,
            Declaration::Classifier(decl) => decl.span,
            Declaration::Association(decl) => decl.span,
            Declaration::Projection(decl) => decl.span,
            Declaration::Service(decl) => decl.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumerationDecl {
    pub name: Spanned<Id>,
    pub literals: Vec<EnumerationLiteralDecl>,
    pub span: Span,
}

/// `OPEN("Open")`
#[derive(Debug, Clone, PartialEq)]
pub struct EnumerationLiteralDecl {
    pub name: Spanned<Id>,
    pub pretty_name: Option<Spanned<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierDecl {
    pub kind: Spanned<ClassifierKind>,
    pub name: Spanned<Id>,
    pub superclass: Option<Spanned<Id>>,
    pub interfaces: Vec<Spanned<Id>>,
    pub modifiers: Vec<Spanned<ClassModifier>>,
    pub members: Vec<MemberDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberDecl {
    /// `title: String? maxLength(256) private;`
    DataType(DataTypePropertyDecl),
    /// `answers: Answer[0..*] owned;`
    AssociationEndSignature(AssociationEndDecl),
    /// `byStatus(status: Status[1..1]): Answer[0..*] { criteria }`
    Parameterized(ParameterizedPropertyDecl),
}

impl MemberDecl {
    pub fn name(&self) -> &Spanned<Id> {
        match self {
            MemberDecl::DataType(decl) => &decl.name,
            MemberDecl::AssociationEndSignature(decl) => &decl.name,
            MemberDecl::Parameterized(decl) => &decl.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataTypePropertyDecl {
    pub name: Spanned<Id>,
    pub type_name: Spanned<Id>,
    pub optional: bool,
    pub modifiers: Vec<Spanned<PropertyModifier>>,
    pub validations: Vec<Spanned<ValidationDecl>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationKind {
    MinLength,
    MaxLength,
    Minimum,
    Maximum,
}

impl ValidationKind {
    pub const ALL: [ValidationKind; 4] = [
        ValidationKind::MinLength,
        ValidationKind::MaxLength,
        ValidationKind::Minimum,
        ValidationKind::Maximum,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            ValidationKind::MinLength => "minLength",
            ValidationKind::MaxLength => "maxLength",
            ValidationKind::Minimum => "min",
            ValidationKind::Maximum => "max",
        }
    }

    /// Length validations constrain strings; the others constrain numbers.
    pub fn is_length(&self) -> bool {
        matches!(self, ValidationKind::MinLength | ValidationKind::MaxLength)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationDecl {
    pub kind: ValidationKind,
    pub value: Spanned<i64>,
}

/// `[lower..upper]`, where `*` leaves `upper` empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiplicityDecl {
    pub lower: i64,
    pub upper: Option<i64>,
}

impl MultiplicityDecl {
    /// The model multiplicity, if the bounds are one the language supports.
    pub fn to_multiplicity(&self) -> Option<Multiplicity> {
        let lower = u64::try_from(self.lower).ok()?;
        let upper = match self.upper {
            Some(upper) => Some(u64::try_from(upper).ok()?),
            None => None,
        };
        Multiplicity::from_bounds(lower, upper)
    }
}

impl std::fmt::Display for MultiplicityDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.upper {
            Some(upper) => write!(f, "[{}..{}]", self.lower, upper),
            None => write!(f, "[{}..*]", self.lower),
        }
    }
}

/// An association end, or an association end signature on a classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationEndDecl {
    pub name: Spanned<Id>,
    pub type_name: Spanned<Id>,
    pub multiplicity: Spanned<MultiplicityDecl>,
    pub modifiers: Vec<Spanned<AssociationEndModifier>>,
    pub order_by: Option<OrderByDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterizedPropertyDecl {
    pub name: Spanned<Id>,
    pub parameters: Vec<ParameterDecl>,
    pub type_name: Spanned<Id>,
    pub multiplicity: Spanned<MultiplicityDecl>,
    pub order_by: Option<OrderByDecl>,
    pub criteria: CriteriaDecl,
}

/// `status: Status[1..1]`
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDecl {
    pub name: Spanned<Id>,
    pub type_name: Spanned<Id>,
    pub multiplicity: Spanned<MultiplicityDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssociationDecl {
    pub name: Spanned<Id>,
    pub ends: Vec<AssociationEndDecl>,
    /// Span of the `relationship` keyword.
    pub relationship_span: Span,
    pub relationship: CriteriaDecl,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaDecl {
    All(Span),
    And(Box<CriteriaDecl>, Box<CriteriaDecl>),
    Or(Box<CriteriaDecl>, Box<CriteriaDecl>),
    Operator {
        operator: Spanned<Operator>,
        source: ExpressionDecl,
        target: ExpressionDecl,
    },
    /// `this.system equalsEdgePoint`
    EdgePoint { path: MemberPathDecl, span: Span },
}

impl CriteriaDecl {
    pub fn span(&self) -> Span {
        match self {
            CriteriaDecl::All(span) => *span,
            CriteriaDecl::And(left, right) | CriteriaDecl::Or(left, right) => {
                left.span().union(right.span())
            }
            CriteriaDecl::Operator { source, target, .. } => source.span().union(target.span()),
            CriteriaDecl::EdgePoint { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionDecl {
    /// `this.end.property`
    ThisPath(MemberPathDecl),
    /// `Type.end.property`
    TypePath(MemberPathDecl),
    Variable(Spanned<Id>),
    Literal(Spanned<LiteralDecl>),
    LiteralList(Spanned<Vec<Spanned<LiteralDecl>>>),
    Null(Span),
    User(Span),
}

impl ExpressionDecl {
    pub fn span(&self) -> Span {
        match self {
            ExpressionDecl::ThisPath(path) | ExpressionDecl::TypePath(path) => path.span,
            ExpressionDecl::Variable(name) => name.span(),
            ExpressionDecl::Literal(literal) => literal.span(),
            ExpressionDecl::LiteralList(list) => list.span(),
            ExpressionDecl::Null(span) | ExpressionDecl::User(span) => *span,
        }
    }
}

/// A dotted path. Every segment but the last names an association end; the
/// last names a data type property.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberPathDecl {
    /// The leading type name, or `None` for `this`.
    pub class_name: Option<Spanned<Id>>,
    pub segments: Vec<Spanned<Id>>,
    pub span: Span,
}

impl MemberPathDecl {
    pub fn ends(&self) -> &[Spanned<Id>] {
        &self.segments[..self.segments.len().saturating_sub(1)]
    }

    pub fn property(&self) -> Option<&Spanned<Id>> {
        self.segments.last()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralDecl {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByDecl {
    pub members: Vec<OrderByMemberDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByMemberDecl {
    pub path: MemberPathDecl,
    pub direction: Option<Spanned<SortDirection>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionDecl {
    pub name: Spanned<Id>,
    pub class_name: Spanned<Id>,
    pub members: Vec<ProjectionMemberDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionMemberDecl {
    pub name: Spanned<Id>,
    pub body: ProjectionBodyDecl,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionBodyDecl {
    /// `title: "Title"`
    Header(Spanned<String>),
    /// `answers: { ... }`
    Children(Vec<ProjectionMemberDecl>),
    /// `answers: AnswerProjection`
    Projection(Spanned<Id>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceGroupDecl {
    pub class_name: Spanned<Id>,
    pub urls: Vec<UrlDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UrlDecl {
    pub segments: Vec<UrlSegmentDecl>,
    pub query: Vec<ParameterDecl>,
    pub services: Vec<ServiceDecl>,
    /// Span of the URL text, from the first `/` to the last query parameter.
    pub span: Span,
}

impl UrlDecl {
    /// Path and query parameters, in declaration order.
    pub fn parameters(&self) -> impl Iterator<Item = &ParameterDecl> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                UrlSegmentDecl::Parameter(parameter) => Some(parameter),
                UrlSegmentDecl::Constant(_) => None,
            })
            .chain(self.query.iter())
    }

    /// The path with parameter names erased, so `/a/{x}` and `/a/{y}` agree.
    pub fn normalized_path(&self) -> String {
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match segment {
                UrlSegmentDecl::Constant(text) => path.push_str(text.inner()),
                UrlSegmentDecl::Parameter(_) => path.push_str("{}"),
            }
        }
        path
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UrlSegmentDecl {
    Constant(Spanned<String>),
    Parameter(ParameterDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDecl {
    pub verb: Spanned<Verb>,
    pub multiplicity: Option<Spanned<ServiceMultiplicity>>,
    pub criteria: Vec<ServiceCriteriaDecl>,
    pub projection: Option<Spanned<Id>>,
    pub order_by: Option<OrderByDecl>,
    pub span: Span,
}

/// `criteria: this.id == id;`
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCriteriaDecl {
    pub keyword: Spanned<CriteriaKeyword>,
    pub criteria: CriteriaDecl,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spanned<T>(value: T, start: usize, end: usize) -> Spanned<T> {
        Spanned::new(value, Span::new(start..end))
    }

    #[test]
    fn test_member_path_split() {
        let path = MemberPathDecl {
            class_name: None,
            segments: vec![
                spanned(Id::new("version"), 5, 12),
                spanned(Id::new("number"), 13, 19),
            ],
            span: Span::new(0..19),
        };

        assert_eq!(path.ends().len(), 1);
        assert_eq!(path.property().map(|p| *p.inner()), Some(Id::new("number")));
    }

    #[test]
    fn test_normalized_path() {
        let parameter = |name: &str| ParameterDecl {
            name: spanned(Id::new(name), 0, 1),
            type_name: spanned(Id::new("Long"), 0, 1),
            multiplicity: spanned(
                MultiplicityDecl {
                    lower: 1,
                    upper: Some(1),
                },
                0,
                1,
            ),
        };
        let url = |name: &str| UrlDecl {
            segments: vec![
                UrlSegmentDecl::Constant(spanned("question".to_string(), 0, 1)),
                UrlSegmentDecl::Parameter(parameter(name)),
            ],
            query: Vec::new(),
            services: Vec::new(),
            span: Span::default(),
        };

        assert_eq!(url("id").normalized_path(), "/question/{}");
        assert_eq!(url("id").normalized_path(), url("key").normalized_path());
        assert_eq!(url("id").parameters().count(), 1);
    }

    #[test]
    fn test_multiplicity_display() {
        let many = MultiplicityDecl {
            lower: 0,
            upper: None,
        };
        assert_eq!(many.to_string(), "[0..*]");
        assert_eq!(many.to_multiplicity(), Some(Multiplicity::ZeroToMany));
        let negative = MultiplicityDecl {
            lower: -1,
            upper: Some(1),
        };
        assert_eq!(negative.to_multiplicity(), None);
        assert!(ValidationKind::MaxLength.is_length());
        assert!(!ValidationKind::Maximum.is_length());
    }
}
