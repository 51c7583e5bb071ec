use klass_core::{
    identifier::Id,
    model::{Operator, PrimitiveType, SortDirection},
};

use crate::{
    compiler::{
        resolved::Resolved,
        staging::{ClassifierHandle, EndHandle, ParameterHandle, PropertyHandle},
    },
    span::{Span, Spanned},
    syntax::{CriteriaDecl, ExpressionDecl, LiteralDecl, MemberPathDecl, OrderByDecl},
};

/// A criteria tree with resolution results on its leaves.
#[derive(Debug, Clone, Default)]
pub(crate) enum CriteriaStaging {
    #[default]
    All,
    And(Box<CriteriaStaging>, Box<CriteriaStaging>),
    Or(Box<CriteriaStaging>, Box<CriteriaStaging>),
    Operator(OperatorStaging),
    EdgePoint {
        path: MemberPathStaging,
        span: Span,
        check: Option<OperandCheck>,
    },
}

impl CriteriaStaging {
    pub fn new(decl: &CriteriaDecl) -> Self {
        match decl {
            CriteriaDecl::All(_) => CriteriaStaging::All,
            CriteriaDecl::And(left, right) => {
                CriteriaStaging::And(Box::new(Self::new(left)), Box::new(Self::new(right)))
            }
            CriteriaDecl::Or(left, right) => {
                CriteriaStaging::Or(Box::new(Self::new(left)), Box::new(Self::new(right)))
            }
            CriteriaDecl::Operator {
                operator,
                source,
                target,
            } => CriteriaStaging::Operator(OperatorStaging {
                operator: operator.clone(),
                source: ExpressionStaging::new(source),
                target: ExpressionStaging::new(target),
                check: None,
            }),
            CriteriaDecl::EdgePoint { path, span } => CriteriaStaging::EdgePoint {
                path: MemberPathStaging::new(path),
                span: *span,
                check: None,
            },
        }
    }

    /// Visits operator and edge-point leaves, left to right.
    pub fn for_each_leaf<'a>(&'a self, visit: &mut impl FnMut(&'a CriteriaStaging)) {
        match self {
            CriteriaStaging::All => {}
            CriteriaStaging::And(left, right) | CriteriaStaging::Or(left, right) => {
                left.for_each_leaf(visit);
                right.for_each_leaf(visit);
            }
            CriteriaStaging::Operator(_) | CriteriaStaging::EdgePoint { .. } => visit(self),
        }
    }

    pub fn for_each_leaf_mut(&mut self, visit: &mut impl FnMut(&mut CriteriaStaging)) {
        match self {
            CriteriaStaging::All => {}
            CriteriaStaging::And(left, right) | CriteriaStaging::Or(left, right) => {
                left.for_each_leaf_mut(visit);
                right.for_each_leaf_mut(visit);
            }
            CriteriaStaging::Operator(_) | CriteriaStaging::EdgePoint { .. } => visit(self),
        }
    }

    /// Visits every member path, including those inside edge points.
    pub fn for_each_path_mut(&mut self, visit: &mut impl FnMut(&mut MemberPathStaging)) {
        self.for_each_leaf_mut(&mut |leaf| match leaf {
            CriteriaStaging::Operator(operator) => {
                for expression in [&mut operator.source, &mut operator.target] {
                    if let ExpressionStaging::Member(path) = expression {
                        visit(path);
                    }
                }
            }
            CriteriaStaging::EdgePoint { path, .. } => visit(path),
            _ => {}
        });
    }

    pub fn for_each_expression_mut(&mut self, visit: &mut impl FnMut(&mut ExpressionStaging)) {
        self.for_each_leaf_mut(&mut |leaf| {
            if let CriteriaStaging::Operator(operator) = leaf {
                visit(&mut operator.source);
                visit(&mut operator.target);
            }
        });
    }
}

/// The outcome of checking an operator's operands against each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OperandCheck {
    Compatible,
    /// The possible types share nothing; both sets are kept for the report.
    Incompatible { source: String, target: String },
    /// The right side of `in` is not a list.
    NotAList,
    /// The path of an edge point is not a temporal range.
    NotARange { found: String },
}

#[derive(Debug, Clone)]
pub(crate) struct OperatorStaging {
    pub operator: Spanned<Operator>,
    pub source: ExpressionStaging,
    pub target: ExpressionStaging,
    pub check: Option<OperandCheck>,
}

#[derive(Debug, Clone)]
pub(crate) enum ExpressionStaging {
    Member(MemberPathStaging),
    Variable {
        name: Spanned<Id>,
        parameter: Option<Resolved<ParameterHandle>>,
    },
    Literal(LiteralStaging),
    LiteralList {
        literals: Vec<LiteralStaging>,
        span: Span,
    },
    Null(Span),
    User {
        span: Span,
        property: Option<Resolved<PropertyHandle>>,
    },
}

impl ExpressionStaging {
    fn new(decl: &ExpressionDecl) -> Self {
        match decl {
            ExpressionDecl::ThisPath(path) | ExpressionDecl::TypePath(path) => {
                ExpressionStaging::Member(MemberPathStaging::new(path))
            }
            ExpressionDecl::Variable(name) => ExpressionStaging::Variable {
                name: name.clone(),
                parameter: None,
            },
            ExpressionDecl::Literal(literal) => {
                ExpressionStaging::Literal(LiteralStaging::new(literal))
            }
            ExpressionDecl::LiteralList(list) => ExpressionStaging::LiteralList {
                literals: list.iter().map(LiteralStaging::new).collect(),
                span: list.span(),
            },
            ExpressionDecl::Null(span) => ExpressionStaging::Null(*span),
            ExpressionDecl::User(span) => ExpressionStaging::User {
                span: *span,
                property: None,
            },
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ExpressionStaging::Member(path) => path.decl.span,
            ExpressionStaging::Variable { name, .. } => name.span(),
            ExpressionStaging::Literal(literal) => literal.span,
            ExpressionStaging::LiteralList { span, .. } => *span,
            ExpressionStaging::Null(span) => *span,
            ExpressionStaging::User { span, .. } => *span,
        }
    }
}

/// A literal and the type it was narrowed to.
#[derive(Debug, Clone)]
pub(crate) struct LiteralStaging {
    pub value: LiteralDecl,
    pub span: Span,
    pub narrowed: Option<PrimitiveType>,
}

impl LiteralStaging {
    fn new(decl: &Spanned<LiteralDecl>) -> Self {
        Self {
            value: decl.inner().clone(),
            span: decl.span(),
            narrowed: None,
        }
    }

    /// Types the literal could denote, preferred type first.
    pub fn possible_types(&self) -> &'static [PrimitiveType] {
        match self.value {
            LiteralDecl::Integer(_) => &[
                PrimitiveType::Integer,
                PrimitiveType::Long,
                PrimitiveType::Float,
                PrimitiveType::Double,
            ],
            LiteralDecl::Float(_) => &[PrimitiveType::Float, PrimitiveType::Double],
            LiteralDecl::String(_) => &[PrimitiveType::String],
            LiteralDecl::Boolean(_) => &[PrimitiveType::Boolean],
        }
    }
}

/// A member path together with what each of its parts resolved to.
///
/// Resolution stops at the first segment that fails; later parts stay
/// `None` and are never reported.
#[derive(Debug, Clone)]
pub(crate) struct MemberPathStaging {
    pub decl: MemberPathDecl,
    pub classifier: Option<Resolved<ClassifierHandle>>,
    pub ends: Vec<Resolved<EndHandle>>,
    pub property: Option<Resolved<PropertyHandle>>,
}

impl MemberPathStaging {
    pub fn new(decl: &MemberPathDecl) -> Self {
        Self {
            decl: decl.clone(),
            classifier: None,
            ends: Vec::new(),
            property: None,
        }
    }

    pub fn is_this(&self) -> bool {
        self.decl.class_name.is_none()
    }

    /// The resolved property, if every part of the path resolved.
    pub fn resolved_property(&self) -> Option<PropertyHandle> {
        self.property.and_then(|property| property.found())
    }

    /// The classifier the path starts from, if it resolved.
    pub fn resolved_classifier(&self) -> Option<ClassifierHandle> {
        self.classifier.and_then(|classifier| classifier.found())
    }

    /// Whether resolution was attempted and stopped with a sentinel.
    pub fn has_failed(&self) -> bool {
        matches!(self.classifier, Some(Resolved::NotFound | Resolved::Ambiguous))
            || self.ends.iter().any(|end| !end.is_found())
            || matches!(self.property, Some(Resolved::NotFound | Resolved::Ambiguous))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct OrderByStaging {
    pub members: Vec<OrderByMemberStaging>,
    pub span: Span,
}

impl OrderByStaging {
    pub fn new(decl: &OrderByDecl) -> Self {
        Self {
            members: decl
                .members
                .iter()
                .map(|member| OrderByMemberStaging {
                    path: MemberPathStaging::new(&member.path),
                    direction: member.direction.clone(),
                    resolved_direction: None,
                })
                .collect(),
            span: decl.span,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct OrderByMemberStaging {
    pub path: MemberPathStaging,
    pub direction: Option<Spanned<SortDirection>>,
    /// The direction and whether it was inferred.
    pub resolved_direction: Option<(SortDirection, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(value: LiteralDecl) -> LiteralStaging {
        LiteralStaging::new(&Spanned::new(value, Span::new(0..1)))
    }

    #[test]
    fn test_string_and_boolean_literals_have_one_type() {
        assert_eq!(
            literal(LiteralDecl::String("open".to_string())).possible_types(),
            [PrimitiveType::String]
        );
        assert_eq!(
            literal(LiteralDecl::Boolean(true)).possible_types(),
            [PrimitiveType::Boolean]
        );
    }

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn integer_literals_fit_every_numeric_type(value in any::<i64>()) {
                let types = literal(LiteralDecl::Integer(value)).possible_types();
                prop_assert_eq!(types[0], PrimitiveType::Integer);
                prop_assert!(types.iter().all(PrimitiveType::is_numeric));
                prop_assert_eq!(types.len(), 4);
            }

            #[test]
            fn float_literals_never_narrow_to_integral(value in any::<f64>()) {
                let types = literal(LiteralDecl::Float(value)).possible_types();
                prop_assert!(types.iter().all(|primitive| !primitive.is_integral()));
                prop_assert!(types.contains(&PrimitiveType::Double));
            }
        }
    }
}
