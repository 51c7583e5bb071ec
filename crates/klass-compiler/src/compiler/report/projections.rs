//! Projections and their members.

use crate::{
    compiler::{
        report::{Report, classifiers::top_level_name, unresolved},
        resolved::Resolved,
        staging::{
            ProjectionBodyStaging, ProjectionHandle, ProjectionMemberStaging, ProjectionTarget,
        },
    },
    error::{AnnotationCode, Diagnostic},
};

pub(super) fn projection(report: &mut Report<'_>, handle: ProjectionHandle) {
    let projection = &report.staging().projections[handle];
    let unit = projection.unit;

    members(report, unit, &projection.members);

    top_level_name(report, unit, &projection.name, "projection");
    if let Some(reason) = unresolved(&projection.classifier) {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrPrjTyp,
                format!(
                    "classifier `{}` of projection `{}` {reason}",
                    projection.class_name.inner(),
                    projection.name.inner()
                ),
            )
            .with_label(projection.class_name.span(), "unknown classifier"),
        );
    }
}

fn members(report: &mut Report<'_>, unit: usize, members: &[ProjectionMemberStaging]) {
    for member in members {
        if let ProjectionBodyStaging::Children(children) = &member.body {
            self::members(report, unit, children);
        }
        self::member(report, unit, member);
    }
}

fn member(report: &mut Report<'_>, unit: usize, member: &ProjectionMemberStaging) {
    let staging = report.staging();
    if member.duplicate {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrDupPrj,
                format!("projection member `{}` appears twice", member.name.inner()),
            )
            .with_label(member.name.span(), "repeated here")
            .with_help("the first occurrence is the one used"),
        );
        return;
    }

    let target = match member.target {
        None => return,
        Some(Resolved::Found(target)) => target,
        Some(Resolved::NotFound) => {
            report.push(
                unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrPaeNfd,
                    format!("no property or association end named `{}`", member.name.inner()),
                )
                .with_label(member.name.span(), "not found"),
            );
            return;
        }
        Some(Resolved::Ambiguous) => {
            report.push(
                unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrPaeAmb,
                    format!(
                        "`{}` names more than one property or association end",
                        member.name.inner()
                    ),
                )
                .with_label(member.name.span(), "ambiguous"),
            );
            return;
        }
    };

    if !member.fits(target) {
        let (found, expected) = match target {
            ProjectionTarget::Property(_) => ("a property", "a header string"),
            ProjectionTarget::End(_) => ("an association end", "nested members or a projection"),
        };
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrPrjDtp,
                format!(
                    "`{}` is {found}, so its projection must be {expected}",
                    member.name.inner()
                ),
            )
            .with_label(member.name.span(), found),
        );
        return;
    }

    let ProjectionBodyStaging::Projection { name, projection } = &member.body else {
        return;
    };
    let projection = match projection {
        Some(Resolved::Found(projection)) => *projection,
        other => {
            let reason = unresolved(other).unwrap_or("not found");
            report.push(
                unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrPrjRef,
                    format!("projection `{}` {reason}", name.inner()),
                )
                .with_label(name.span(), "unknown projection"),
            );
            return;
        }
    };
    let (ProjectionTarget::End(end), Some(classifier)) = (
        target,
        staging.projections[projection]
            .classifier
            .and_then(|classifier| classifier.found()),
    ) else {
        return;
    };
    let Some(end_target) = staging.ends[end].resolved_target() else {
        return;
    };
    if !staging.conforms_to(end_target, classifier) {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrPrrKls,
                format!(
                    "projection `{}` is on `{}`, but `{}` refers to `{}`",
                    name.inner(),
                    report.classifier_name(classifier),
                    member.name.inner(),
                    report.classifier_name(end_target)
                ),
            )
            .with_label(name.span(), "projection of another class"),
        );
    }
}
