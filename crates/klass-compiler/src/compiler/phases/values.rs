//! Member path resolution, variable binding and operand type checking.

use klass_core::model::{Operator, PrimitiveType};
use log::trace;

use crate::compiler::{
    phases::CriteriaOwner,
    resolved::Resolved,
    staging::{
        ClassifierHandle, CriteriaStaging, ExpressionStaging, LiteralStaging, MemberPathStaging,
        OperandCheck, OperatorStaging, OrderByStaging, Staging, StagedType,
    },
    state::CompilerState,
};

/// Resolves a member path from its leading classifier through association
/// ends to a data type property.
///
/// `this` is the classifier `this.` paths start from; when it is unknown
/// the path stays unresolved and is never reported. Resolution stops at the
/// first part that fails.
pub(super) fn resolve_path(
    state: &mut CompilerState,
    path: &mut MemberPathStaging,
    this: Option<ClassifierHandle>,
) {
    let classifier = match &path.decl.class_name {
        None => match this {
            Some(this) => Resolved::Found(this),
            None => return,
        },
        Some(name) => state.symbols.lookup_classifier(**name),
    };
    path.classifier = Some(classifier);
    path.ends.clear();
    path.property = None;

    let Resolved::Found(mut current) = classifier else {
        return;
    };
    for segment in path.decl.ends() {
        let end = state.staging.find_end(current, **segment);
        path.ends.push(end);
        let Some(target) = end
            .found()
            .and_then(|end| state.staging.ends[end].resolved_target())
        else {
            return;
        };
        current = target;
    }

    if let Some(name) = path.decl.property() {
        let property = state.staging.find_property(current, **name);
        if let Resolved::Found(handle) = property {
            state.referenced.insert(handle);
        }
        path.property = Some(property);
    }
}

pub(super) fn resolve_criteria(
    state: &mut CompilerState,
    criteria: &mut CriteriaStaging,
    this: Option<ClassifierHandle>,
) {
    criteria.for_each_path_mut(&mut |path| resolve_path(state, path, this));
}

pub(super) fn resolve_order_by(
    state: &mut CompilerState,
    order_by: &mut OrderByStaging,
    this: Option<ClassifierHandle>,
) {
    for member in &mut order_by.members {
        resolve_path(state, &mut member.path, this);
    }
}

/// Resolves the paths of one criteria tree in place.
pub(super) fn resolve_owned_criteria(state: &mut CompilerState, owner: CriteriaOwner) {
    let this = owner.this(state);
    let mut criteria = owner.take(state);
    resolve_criteria(state, &mut criteria, this);
    owner.put(state, criteria);
}

/// Binds variables to parameters in scope and `user` to the user id
/// property.
pub(super) fn variable_resolution(state: &mut CompilerState, unit: usize) {
    let user = state.staging.user_id_property();
    for owner in CriteriaOwner::all_in(state, unit) {
        let parameters = owner.parameters(state);
        let mut criteria = owner.take(state);
        criteria.for_each_expression_mut(&mut |expression| match expression {
            ExpressionStaging::Variable { name, parameter } => {
                let candidates = parameters
                    .iter()
                    .copied()
                    .filter(|candidate| *state.staging.parameters[*candidate].name == **name);
                let resolved = Resolved::from_candidates(candidates);
                trace!(variable:% = name.inner(), found = resolved.is_found(); "Resolved variable");
                *parameter = Some(resolved);
            }
            ExpressionStaging::User { property, .. } => {
                *property = Some(user.map_or(Resolved::NotFound, Resolved::Found));
            }
            _ => {}
        });
        owner.put(state, criteria);
    }
}

/// Checks operand types and narrows literals against the other operand.
pub(super) fn literal_narrowing(state: &mut CompilerState, unit: usize) {
    for owner in CriteriaOwner::all_in(state, unit) {
        let mut criteria = owner.take(state);
        criteria.for_each_leaf_mut(&mut |leaf| match leaf {
            CriteriaStaging::Operator(operator) => check_operator(&state.staging, operator),
            CriteriaStaging::EdgePoint { path, check, .. } => {
                *check = path
                    .resolved_property()
                    .and_then(|property| state.staging.property_type(property))
                    .map(|data_type| {
                        if data_type == StagedType::Primitive(PrimitiveType::TemporalRange) {
                            OperandCheck::Compatible
                        } else {
                            OperandCheck::NotARange {
                                found: state.staging.type_name(data_type),
                            }
                        }
                    });
            }
            _ => {}
        });
        owner.put(state, criteria);
    }
}

/// The types an operand may have.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PossibleTypes {
    /// `null` fits every type.
    Any,
    /// The operand did not resolve; checking it would only repeat that
    /// error.
    Unknown,
    Set(Vec<StagedType>),
}

fn possible_types(staging: &Staging, expression: &ExpressionStaging) -> PossibleTypes {
    let single = |data_type: Option<StagedType>| match data_type {
        Some(data_type) => PossibleTypes::Set(vec![data_type]),
        None => PossibleTypes::Unknown,
    };
    match expression {
        ExpressionStaging::Member(path) => single(
            path.resolved_property()
                .and_then(|property| staging.property_type(property)),
        ),
        ExpressionStaging::Variable { parameter, .. } => single(
            parameter
                .and_then(|parameter| parameter.found())
                .and_then(|parameter| staging.parameters[parameter].resolved_type()),
        ),
        ExpressionStaging::User { property, .. } => single(
            property
                .and_then(|property| property.found())
                .and_then(|property| staging.property_type(property)),
        ),
        ExpressionStaging::Literal(literal) => PossibleTypes::Set(literal_types(literal)),
        ExpressionStaging::LiteralList { literals, .. } => {
            let mut common: Option<Vec<StagedType>> = None;
            for literal in literals {
                let types = literal_types(literal);
                common = Some(match common {
                    None => types,
                    Some(common) => common.into_iter().filter(|t| types.contains(t)).collect(),
                });
            }
            PossibleTypes::Set(common.unwrap_or_default())
        }
        ExpressionStaging::Null(_) => PossibleTypes::Any,
    }
}

fn literal_types(literal: &LiteralStaging) -> Vec<StagedType> {
    literal
        .possible_types()
        .iter()
        .map(|primitive| StagedType::Primitive(*primitive))
        .collect()
}

/// Enumerations compare against their literal names as strings.
fn compatible(left: StagedType, right: StagedType) -> bool {
    left == right
        || matches!(
            (left, right),
            (StagedType::Enumeration(_), StagedType::Primitive(PrimitiveType::String))
                | (StagedType::Primitive(PrimitiveType::String), StagedType::Enumeration(_))
        )
}

fn describe(staging: &Staging, types: &[StagedType]) -> String {
    let names: Vec<String> = types
        .iter()
        .map(|data_type| staging.type_name(*data_type))
        .collect();
    format!("{{{}}}", names.join(", "))
}

fn check_operator(staging: &Staging, operator: &mut OperatorStaging) {
    if *operator.operator == Operator::In {
        let is_list = match &operator.target {
            ExpressionStaging::LiteralList { .. } => true,
            ExpressionStaging::Variable { parameter, .. } => match parameter {
                Some(Resolved::Found(parameter)) => !staging.parameters[*parameter].is_to_one(),
                // Unresolved variables are reported on their own.
                _ => true,
            },
            _ => false,
        };
        if !is_list {
            operator.check = Some(OperandCheck::NotAList);
            return;
        }
    }

    let source = possible_types(staging, &operator.source);
    let target = possible_types(staging, &operator.target);
    let (source_types, target_types) = match (&source, &target) {
        (PossibleTypes::Unknown, _) | (_, PossibleTypes::Unknown) => return,
        (PossibleTypes::Any, _) | (_, PossibleTypes::Any) => {
            operator.check = Some(OperandCheck::Compatible);
            return;
        }
        (PossibleTypes::Set(source), PossibleTypes::Set(target)) => (source, target),
    };

    let mut common: Vec<StagedType> = source_types
        .iter()
        .copied()
        .filter(|left| target_types.iter().any(|right| compatible(*left, *right)))
        .collect();
    if operator.operator.is_string_operator() {
        common.retain(|data_type| *data_type == StagedType::Primitive(PrimitiveType::String));
    }
    if common.is_empty() {
        operator.check = Some(OperandCheck::Incompatible {
            source: describe(staging, source_types),
            target: describe(staging, target_types),
        });
        return;
    }

    operator.check = Some(OperandCheck::Compatible);
    narrow(&mut operator.source, target_types);
    narrow(&mut operator.target, source_types);
}

/// Narrows literals in `expression` to the first of their possible types
/// that fits `other`.
fn narrow(expression: &mut ExpressionStaging, other: &[StagedType]) {
    let literals: &mut [LiteralStaging] = match expression {
        ExpressionStaging::Literal(literal) => std::slice::from_mut(literal),
        ExpressionStaging::LiteralList { literals, .. } => literals.as_mut_slice(),
        _ => return,
    };
    for literal in literals {
        let preferred = literal.possible_types().iter().copied().find(|primitive| {
            other
                .iter()
                .any(|data_type| compatible(StagedType::Primitive(*primitive), *data_type))
        });
        literal.narrowed = preferred.or_else(|| literal.possible_types().first().copied());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{span::Span, syntax::LiteralDecl};

    fn literal(value: LiteralDecl) -> LiteralStaging {
        LiteralStaging {
            value,
            span: Span::default(),
            narrowed: None,
        }
    }

    #[test]
    fn test_integer_literal_narrows_to_unique_type() {
        let mut expression = ExpressionStaging::Literal(literal(LiteralDecl::Integer(3)));
        narrow(&mut expression, &[StagedType::Primitive(PrimitiveType::Long)]);

        let ExpressionStaging::Literal(literal) = expression else {
            unreachable!();
        };
        assert_eq!(literal.narrowed, Some(PrimitiveType::Long));
    }

    #[test]
    fn test_literal_against_literal_takes_preferred_type() {
        let mut expression = ExpressionStaging::Literal(literal(LiteralDecl::Integer(3)));
        let other = literal_types(&literal(LiteralDecl::Float(1.5)));
        narrow(&mut expression, &other);

        let ExpressionStaging::Literal(literal) = expression else {
            unreachable!();
        };
        assert_eq!(literal.narrowed, Some(PrimitiveType::Float));
    }

    #[test]
    fn test_enumerations_accept_strings() {
        let staging = Staging::default();
        let status = StagedType::Enumeration(crate::compiler::arena::Handle::new(0));
        assert!(compatible(status, StagedType::Primitive(PrimitiveType::String)));
        assert!(!compatible(status, StagedType::Primitive(PrimitiveType::Long)));
        assert_eq!(
            describe(
                &staging,
                &[
                    StagedType::Primitive(PrimitiveType::Integer),
                    StagedType::Primitive(PrimitiveType::Long)
                ]
            ),
            "{Integer, Long}"
        );
    }

    #[test]
    fn test_mixed_literal_list_has_no_common_type() {
        let staging = Staging::default();
        let list = ExpressionStaging::LiteralList {
            literals: vec![
                literal(LiteralDecl::Integer(1)),
                literal(LiteralDecl::String("a".to_string())),
            ],
            span: Span::default(),
        };
        assert_eq!(possible_types(&staging, &list), PossibleTypes::Set(Vec::new()));
    }
}
