//! Associations, their ends and relationships.

use klass_core::model::{AssociationEndModifier, PropertyModifier};

use crate::{
    compiler::{
        report::{
            Report,
            classifiers::{duplicate_modifiers, multiplicity, to_one_order_by, top_level_name},
            criteria, unresolved,
        },
        resolved::Resolved,
        staging::{
            AssociationHandle, CriteriaStaging, EndHandle, ExpressionStaging, ForeignKeyStaging,
        },
    },
    error::{AnnotationCode, Diagnostic},
};

pub(super) fn association(report: &mut Report<'_>, handle: AssociationHandle) {
    let association = &report.staging().associations[handle];
    let unit = association.unit;

    for end in &association.ends {
        self::end(report, *end);
    }
    criteria::criteria(report, unit, &association.relationship);

    top_level_name(report, unit, &association.name, "association");
    if association.ends.len() != 2 {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrAsoEnd,
                format!(
                    "association `{}` has {} ends, expected 2",
                    association.name.inner(),
                    association.ends.len()
                ),
            )
            .with_label(association.name.span(), "needs a source and a target end"),
        );
    }

    if missing_foreign_key(report, handle) {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrRelFky,
                format!(
                    "relationship of `{}` does not join a foreign key to a key",
                    association.name.inner()
                ),
            )
            .with_label(association.relationship_span, "no foreign key")
            .with_help("compare a key of one class with a property of the other, e.g. `this.id == Answer.questionId`"),
        );
    }
    for foreign_key in &association.foreign_keys {
        self::foreign_key(report, handle, foreign_key);
    }
}

fn end(report: &mut Report<'_>, handle: EndHandle) {
    let staging = report.staging();
    let end = &staging.ends[handle];
    let unit = end.unit;

    if !end.name.is_member_name() {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrEndNme,
                format!("invalid association end name `{}`", end.name.inner()),
            )
            .with_label(end.name.span(), "not a member name")
            .with_help("association end names start with a lower case letter"),
        );
    }

    let reason = match end.target {
        Some(Resolved::Found(target)) if !staging.classifiers[target].is_class() => {
            Some("is an interface, not a class")
        }
        target => unresolved(&target),
    };
    if let Some(reason) = reason {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrRefTyp,
                format!("association end type `{}` {reason}", end.type_name.inner()),
            )
            .with_label(end.type_name.span(), "unknown class"),
        );
    }

    multiplicity(report, unit, &end.multiplicity);
    if let Some(order_by) = &end.order_by {
        to_one_order_by(report, unit, &end.multiplicity, order_by.span);
        criteria::order_by(report, unit, order_by);
    }
    duplicate_modifiers(report, unit, &end.modifiers);

    // The end is a member of the class at the other end.
    let Some(owner) = end.owner else {
        return;
    };
    let owner_staging = &staging.classifiers[owner];
    let clash = owner_staging
        .member_names()
        .into_iter()
        .map(|(_, name, unit)| (name, unit))
        .chain(
            owner_staging
                .ends
                .iter()
                .take_while(|other| **other != handle)
                .map(|other| (staging.ends[*other].name.clone(), staging.ends[*other].unit)),
        )
        .find(|(name, _)| *name == end.name);
    if let Some((name, name_unit)) = clash {
        let diagnostic = Diagnostic::annotation(
            AnnotationCode::ErrDupMem,
            format!(
                "association end `{}` clashes with a member of `{}`",
                end.name.inner(),
                owner_staging.name.inner()
            ),
        )
        .with_label(end.name.span(), "declared again here");
        let diagnostic =
            report.with_earlier(diagnostic, unit, name_unit, name.span(), "first declared here");
        report.push(unit, diagnostic);
    }
}

/// A persistent association whose relationship resolved cleanly must join
/// at least one foreign key.
fn missing_foreign_key(report: &Report<'_>, handle: AssociationHandle) -> bool {
    let staging = report.staging();
    let association = &staging.associations[handle];
    if !association.foreign_keys.is_empty() {
        return false;
    }
    let Some((source, target)) = association.end_pair() else {
        return false;
    };
    let persistent = [source, target].into_iter().all(|end| {
        staging.ends[end]
            .resolved_target()
            .is_some_and(|class| !staging.classifiers[class].is_transient())
    });
    if !persistent {
        return false;
    }

    let mut resolved = true;
    association.relationship.for_each_leaf(&mut |leaf| match leaf {
        CriteriaStaging::Operator(operator) => {
            for expression in [&operator.source, &operator.target] {
                if let ExpressionStaging::Member(path) = expression {
                    resolved &= path.resolved_property().is_some() && !path.has_failed();
                }
            }
        }
        CriteriaStaging::EdgePoint { path, .. } => {
            resolved &= !path.has_failed();
        }
        _ => {}
    });
    resolved
}

/// Checks the optionality and finality of a foreign key against the end
/// that navigates from it.
fn foreign_key(
    report: &mut Report<'_>,
    handle: AssociationHandle,
    foreign_key: &ForeignKeyStaging,
) {
    let staging = report.staging();
    let association = &staging.associations[handle];
    let foreign = staging.property(foreign_key.foreign);
    let key = staging.property(foreign_key.key);

    // The end owned by the foreign key's class points at the key's class.
    let end = association.ends.iter().copied().find(|end| {
        let end = &staging.ends[*end];
        match (end.owner, end.resolved_target()) {
            (Some(owner), Some(target)) => {
                staging.conforms_to(owner, foreign_key.foreign.classifier)
                    && staging.conforms_to(target, foreign_key.key.classifier)
            }
            _ => false,
        }
    });
    let Some(end) = end else {
        return;
    };
    let end = &staging.ends[end];
    if !end.is_to_one() {
        return;
    }

    let unit = foreign.unit;
    let end_label = |diagnostic: Diagnostic| {
        if end.unit == unit {
            diagnostic.with_secondary_label(end.multiplicity.span(), "association end multiplicity")
        } else {
            diagnostic
        }
    };
    if foreign.optional && end.is_required() {
        report.push(
            unit,
            end_label(
                Diagnostic::annotation(
                    AnnotationCode::ErrForMul,
                    format!(
                        "foreign key `{}` is optional, but end `{}` is required",
                        foreign.name.inner(),
                        end.name.inner()
                    ),
                )
                .with_label(foreign.type_name.span(), "optional foreign key"),
            )
            .with_help(format!(
                "make the end `{}[0..1]` or the property required",
                end.type_name.inner()
            )),
        );
    } else if !foreign.optional && !end.is_required() {
        report.push(
            unit,
            end_label(
                Diagnostic::annotation(
                    AnnotationCode::WrnForMul,
                    format!(
                        "foreign key `{}` is required, but end `{}` is optional",
                        foreign.name.inner(),
                        end.name.inner()
                    ),
                )
                .with_label(foreign.type_name.span(), "required foreign key"),
            ),
        );
    }

    let audit = foreign.has_modifier(PropertyModifier::CreatedBy)
        || foreign.has_modifier(PropertyModifier::LastUpdatedBy);
    let end_final = end.has_modifier(AssociationEndModifier::Final);
    if !audit && foreign.is_final() != end_final {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrForFin,
                format!(
                    "foreign key `{}` and end `{}` must agree on `final`",
                    foreign.name.inner(),
                    end.name.inner()
                ),
            )
            .with_label(foreign.name.span(), if foreign.is_final() { "final" } else { "not final" })
            .with_help(format!(
                "key `{}` is joined through `{}`",
                key.name.inner(),
                association.name.inner()
            )),
        );
    }
}
