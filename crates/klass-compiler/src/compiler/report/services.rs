//! Service groups, URLs and services.

use klass_core::model::{CriteriaKeyword, ServiceMultiplicity, Verb};

use crate::{
    compiler::{
        report::{
            Report,
            classifiers::{member_name, multiplicity},
            criteria, repeated_by, unresolved,
        },
        resolved::Resolved,
        staging::{ParameterHandle, ServiceGroupHandle, ServiceHandle, UrlStaging},
    },
    error::{AnnotationCode, Diagnostic},
};

/// Criteria keywords a verb accepts.
fn allowed_criteria(verb: Verb) -> &'static [CriteriaKeyword] {
    match verb {
        Verb::Get => &[
            CriteriaKeyword::Criteria,
            CriteriaKeyword::Authorize,
            CriteriaKeyword::Version,
        ],
        Verb::Post => &[CriteriaKeyword::Authorize, CriteriaKeyword::Validate],
        Verb::Put | Verb::Patch | Verb::Delete => &[
            CriteriaKeyword::Criteria,
            CriteriaKeyword::Authorize,
            CriteriaKeyword::Validate,
            CriteriaKeyword::Conflict,
        ],
    }
}

pub(super) fn service_group(report: &mut Report<'_>, handle: ServiceGroupHandle) {
    let staging = report.staging();
    let group = &staging.service_groups[handle];
    let unit = group.unit;

    for url in &group.urls {
        self::url(report, unit, url);
    }

    let reason = match group.classifier {
        Some(Resolved::Found(classifier)) if !staging.classifiers[classifier].is_class() => {
            Some("is an interface")
        }
        classifier => unresolved(&classifier),
    };
    if let Some(reason) = reason {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrSrgTyp,
                format!("service class `{}` {reason}", group.class_name.inner()),
            )
            .with_label(group.class_name.span(), "services need a class"),
        );
    }
    if let Some(classifier) = group.resolved_classifier() {
        let classifier = &staging.classifiers[classifier];
        if classifier.unit == unit && classifier.ordinal > group.ordinal {
            report.push(
                unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrFwdRef,
                    format!("class `{}` is declared later in this file", group.class_name.inner()),
                )
                .with_label(group.class_name.span(), "forward reference")
                .with_secondary_label(classifier.name.span(), "declared here"),
            );
        }
    }

    if group.urls.is_empty() {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrSerEmp,
                format!("service group `{}` declares no URLs", group.class_name.inner()),
            )
            .with_label(group.span, "empty service group"),
        );
    }
    for (index, first) in repeated_by(&group.urls, |url| &url.normalized_path) {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrDupUrl,
                format!("duplicate URL `{}`", group.urls[index].normalized_path),
            )
            .with_label(group.urls[index].span, "declared again here")
            .with_secondary_label(group.urls[first].span, "first declared here"),
        );
    }
}

fn url(report: &mut Report<'_>, unit: usize, url: &UrlStaging) {
    let staging = report.staging();
    let parameters: Vec<ParameterHandle> = url.parameters().collect();
    for parameter in &parameters {
        let staged = &staging.parameters[*parameter];
        member_name(report, unit, &staged.name);
        if let Some(reason) = unresolved(&staged.data_type) {
            report.push(
                unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrParTyp,
                    format!("parameter type `{}` {reason}", staged.type_name.inner()),
                )
                .with_label(staged.type_name.span(), "unknown type")
                .with_help("use a primitive type or an enumeration"),
            );
        }
        multiplicity(report, unit, &staged.multiplicity);
    }
    let names = |parameter: &ParameterHandle| &staging.parameters[*parameter].name;
    for (index, first) in repeated_by(&parameters, names) {
        let name = &staging.parameters[parameters[index]].name;
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrDupPar,
                format!("duplicate URL parameter `{}`", name.inner()),
            )
            .with_label(name.span(), "declared again here")
            .with_secondary_label(
                staging.parameters[parameters[first]].name.span(),
                "first declared here",
            ),
        );
    }

    for service in &url.services {
        self::service(report, *service);
    }
    for (index, first) in repeated_by(&url.services, |service| &staging.services[*service].verb) {
        let verb = &staging.services[url.services[index]].verb;
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrDupVrb,
                format!("duplicate verb `{}` on `{}`", verb.inner(), url.normalized_path),
            )
            .with_label(verb.span(), "declared again here")
            .with_secondary_label(
                staging.services[url.services[first]].verb.span(),
                "first declared here",
            ),
        );
    }
}

fn service(report: &mut Report<'_>, handle: ServiceHandle) {
    let staging = report.staging();
    let service = &staging.services[handle];
    let unit = service.unit;
    let verb = *service.verb;

    for (index, first) in repeated_by(&service.criteria, |criteria| &criteria.keyword) {
        let keyword = &service.criteria[index].keyword;
        let diagnostic = Diagnostic::annotation(
            AnnotationCode::ErrDupCri,
            format!("duplicate `{}` criteria on {verb}", keyword.inner().keyword()),
        )
        .with_label(keyword.span(), "declared again here");
        let first = &service.criteria[first];
        let diagnostic = report.with_earlier(
            diagnostic,
            service.criteria[index].unit,
            first.unit,
            first.keyword.span(),
            "first declared here",
        );
        report.push(service.criteria[index].unit, diagnostic);
    }

    let allowed = allowed_criteria(verb);
    for criteria in &service.criteria {
        if !allowed.contains(&*criteria.keyword) {
            let names: Vec<&str> = allowed.iter().map(CriteriaKeyword::keyword).collect();
            report.push(
                criteria.unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrVrbCrt,
                    format!(
                        "`{}` criteria is not allowed on {verb} services",
                        criteria.keyword.inner().keyword()
                    ),
                )
                .with_label(criteria.keyword.span(), "not allowed here")
                .with_help(format!("{verb} accepts {}", names.join(", "))),
            );
        }
        criteria::criteria(report, criteria.unit, &criteria.criteria);
    }

    let group = &staging.service_groups[service.group];
    match (&service.projection_name, service.projection) {
        (None, _) => report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrSerPrj,
                format!("{verb} service on `{}` has no projection", group.class_name.inner()),
            )
            .with_label(service.verb.span(), "missing `projection:`"),
        ),
        (Some(name), Some(Resolved::Found(projection))) => {
            let projection_class = staging.projections[projection]
                .classifier
                .and_then(|classifier| classifier.found());
            if let (Some(class), Some(projection_class)) =
                (group.resolved_classifier(), projection_class)
            {
                if !staging.conforms_to(class, projection_class) {
                    report.push(
                        unit,
                        Diagnostic::annotation(
                            AnnotationCode::ErrSerPrj,
                            format!(
                                "projection `{}` is on `{}`, not on `{}`",
                                name.inner(),
                                report.classifier_name(projection_class),
                                report.classifier_name(class)
                            ),
                        )
                        .with_label(name.span(), "projection of another class"),
                    );
                }
            }
        }
        (Some(name), projection) => report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrSerPrj,
                format!(
                    "projection `{}` {}",
                    name.inner(),
                    unresolved(&projection).unwrap_or("not found")
                ),
            )
            .with_label(name.span(), "unknown projection"),
        ),
    }

    if verb.is_update() && service.effective_multiplicity() == Some(ServiceMultiplicity::Many) {
        let span = service
            .multiplicity
            .as_ref()
            .map_or(service.verb.span(), |multiplicity| multiplicity.span());
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrSerMul,
                format!("{verb} services must address exactly one instance"),
            )
            .with_label(span, "many instances")
            .with_help("bind every key property with a to-one URL parameter"),
        );
    }

    if let Some(order_by) = &service.order_by {
        criteria::order_by(report, unit, order_by);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_criteria() {
        assert!(allowed_criteria(Verb::Get).contains(&CriteriaKeyword::Version));
        assert!(!allowed_criteria(Verb::Get).contains(&CriteriaKeyword::Conflict));
        assert!(!allowed_criteria(Verb::Post).contains(&CriteriaKeyword::Criteria));
        for verb in [Verb::Put, Verb::Patch, Verb::Delete] {
            assert!(allowed_criteria(verb).contains(&CriteriaKeyword::Conflict));
            assert!(!allowed_criteria(verb).contains(&CriteriaKeyword::Version));
        }
    }
}
