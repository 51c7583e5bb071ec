//! Member paths, criteria trees and order-by clauses.

use crate::{
    compiler::{
        report::Report,
        resolved::Resolved,
        staging::{
            ClassifierHandle, CriteriaStaging, ExpressionStaging, MemberPathStaging, OperandCheck,
            OrderByStaging,
        },
    },
    error::{AnnotationCode, Diagnostic},
};

/// Reports the first part of a path that did not resolve. Later parts were
/// never looked up and stay silent.
pub(super) fn path(report: &mut Report<'_>, unit: usize, path: &MemberPathStaging) {
    let staging = report.staging();
    let Some(classifier) = path.classifier else {
        return;
    };
    let mut current: ClassifierHandle = match classifier {
        Resolved::Found(classifier) => classifier,
        Resolved::NotFound | Resolved::Ambiguous => {
            let Some(name) = &path.decl.class_name else {
                return;
            };
            let reason = if classifier == Resolved::Ambiguous {
                "is ambiguous"
            } else {
                "not found"
            };
            report.push(
                unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrTypMem,
                    format!("type `{}` {reason}", name.inner()),
                )
                .with_label(name.span(), "unknown type"),
            );
            return;
        }
    };

    for (segment, end) in path.decl.ends().iter().zip(&path.ends) {
        match end {
            Resolved::Found(end) => match staging.ends[*end].resolved_target() {
                Some(target) => current = target,
                None => return,
            },
            Resolved::NotFound | Resolved::Ambiguous => {
                let reason = if *end == Resolved::Ambiguous {
                    "is ambiguous on"
                } else {
                    "not found on"
                };
                report.push(
                    unit,
                    Diagnostic::annotation(
                        AnnotationCode::ErrPthEnd,
                        format!(
                            "association end `{}` {reason} `{}`",
                            segment.inner(),
                            report.classifier_name(current)
                        ),
                    )
                    .with_label(segment.span(), "unknown association end"),
                );
                return;
            }
        }
    }

    let (Some(name), Some(property)) = (path.decl.property(), path.property) else {
        return;
    };
    if property.is_found() {
        return;
    }
    let message = if property == Resolved::Ambiguous {
        format!(
            "member `{}` is inherited by `{}` from more than one interface",
            name.inner(),
            report.classifier_name(current)
        )
    } else {
        format!(
            "member `{}` not found on `{}`",
            name.inner(),
            report.classifier_name(current)
        )
    };
    report.push(
        unit,
        Diagnostic::annotation(AnnotationCode::ErrMemTyp, message)
            .with_label(name.span(), "unknown member"),
    );
}

pub(super) fn criteria(report: &mut Report<'_>, unit: usize, criteria: &CriteriaStaging) {
    criteria.for_each_leaf(&mut |leaf| match leaf {
        CriteriaStaging::Operator(operator) => {
            expression(report, unit, &operator.source);
            expression(report, unit, &operator.target);
            match &operator.check {
                Some(OperandCheck::Incompatible { source, target }) => report.push(
                    unit,
                    Diagnostic::annotation(
                        AnnotationCode::ErrOprTyp,
                        format!(
                            "operands of `{}` have incompatible types {source} and {target}",
                            operator.operator.symbol()
                        ),
                    )
                    .with_label(operator.source.span(), format!("one of {source}"))
                    .with_secondary_label(operator.target.span(), format!("one of {target}")),
                ),
                Some(OperandCheck::NotAList) => report.push(
                    unit,
                    Diagnostic::annotation(
                        AnnotationCode::ErrOprIn,
                        "the right operand of `in` must be a list",
                    )
                    .with_label(operator.target.span(), "not a list")
                    .with_help("use a literal list like `(1, 2)` or a to-many parameter"),
                ),
                Some(OperandCheck::Compatible | OperandCheck::NotARange { .. }) | None => {}
            }
        }
        CriteriaStaging::EdgePoint {
            path: edge_path,
            span,
            check,
        } => {
            path(report, unit, edge_path);
            if let Some(OperandCheck::NotARange { found }) = check {
                report.push(
                    unit,
                    Diagnostic::annotation(
                        AnnotationCode::ErrEdgPnt,
                        format!("`equalsEdgePoint` needs a TemporalRange property, found {found}"),
                    )
                    .with_label(*span, "not a temporal range"),
                );
            }
        }
        CriteriaStaging::All | CriteriaStaging::And(..) | CriteriaStaging::Or(..) => {}
    });
}

fn expression(report: &mut Report<'_>, unit: usize, expression: &ExpressionStaging) {
    match expression {
        ExpressionStaging::Member(member) => path(report, unit, member),
        ExpressionStaging::Variable {
            name,
            parameter: Some(parameter),
        } if !parameter.is_found() => {
            let message = if *parameter == Resolved::Ambiguous {
                format!("variable `{}` matches more than one parameter", name.inner())
            } else {
                format!("variable `{}` is not a parameter in scope", name.inner())
            };
            report.push(
                unit,
                Diagnostic::annotation(AnnotationCode::ErrVarRef, message)
                    .with_label(name.span(), "unknown variable"),
            );
        }
        ExpressionStaging::User {
            span,
            property: Some(property),
        } if !property.is_found() => report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrUsrLit,
                "`user` needs a user class with a `userId` property",
            )
            .with_label(*span, "no user id to compare against"),
        ),
        _ => {}
    }
}

pub(super) fn order_by(report: &mut Report<'_>, unit: usize, order_by: &OrderByStaging) {
    for member in &order_by.members {
        path(report, unit, &member.path);
    }
}
