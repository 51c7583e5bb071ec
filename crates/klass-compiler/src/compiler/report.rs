//! Error reporting after the last phase.
//!
//! Reporting only reads staging elements. Diagnostics are gathered with the
//! unit their spans belong to and emitted afterwards, each against its own
//! unit, so diagnostics about generated code land on the macro origin.
//!
//! The order is fixed:
//! 1. duplicate user classes
//! 2. package names, per unit
//! 3. every top-level element in declaration order, children first
//! 4. audited classes when no user id property exists
//! 5. service groups that repeat a class
//! 6. unreferenced private properties

mod associations;
mod classifiers;
mod criteria;
mod projections;
mod services;

use std::collections::HashMap;

use klass_core::{
    identifier::Id,
    model::{ClassModifier, PrimitiveType, PropertyModifier},
};
use log::debug;

use crate::{
    compiler::{
        resolved::Resolved,
        staging::{ClassifierHandle, PropertyHandle, Staging, StagedType},
        state::CompilerState,
        symbols::TopLevelHandle,
    },
    error::{AnnotationCode, Diagnostic},
    source::UnitTree,
    span::{Span, Spanned},
};

/// Runs every report step and emits the diagnostics.
pub(crate) fn report(state: &mut CompilerState) {
    let pending = {
        let mut report = Report::new(state);
        report.duplicate_user_classes();
        report.package_names();
        for element in &state.top_level {
            match *element {
                TopLevelHandle::Enumeration(handle) => {
                    classifiers::enumeration(&mut report, handle)
                }
                TopLevelHandle::Classifier(handle) => classifiers::classifier(&mut report, handle),
                TopLevelHandle::Association(handle) => {
                    associations::association(&mut report, handle)
                }
                TopLevelHandle::Projection(handle) => projections::projection(&mut report, handle),
                TopLevelHandle::ServiceGroup(handle) => {
                    services::service_group(&mut report, handle)
                }
            }
        }
        report.missing_user_id();
        report.duplicate_service_groups();
        if state.options.report_unreferenced_private_properties {
            report.unreferenced_private_properties();
        }
        report.pending
    };

    debug!(diagnostics = pending.len(); "Reporting element errors");
    for (unit, diagnostic) in pending {
        state.with_compilation_unit(unit, |state| state.emit(diagnostic));
    }
}

/// Diagnostics waiting to be emitted, each with the unit its spans refer to.
pub(super) struct Report<'a> {
    state: &'a CompilerState,
    pending: Vec<(usize, Diagnostic)>,
}

impl<'a> Report<'a> {
    fn new(state: &'a CompilerState) -> Self {
        Self {
            state,
            pending: Vec::new(),
        }
    }

    pub fn staging(&self) -> &'a Staging {
        &self.state.staging
    }

    pub fn push(&mut self, unit: usize, diagnostic: Diagnostic) {
        self.pending.push((unit, diagnostic));
    }

    /// Points `diagnostic` at an earlier declaration: a secondary label
    /// when that declaration is in `unit`, a help note naming its source
    /// otherwise.
    pub fn with_earlier(
        &self,
        diagnostic: Diagnostic,
        unit: usize,
        earlier_unit: usize,
        span: Span,
        message: &str,
    ) -> Diagnostic {
        if unit == earlier_unit {
            diagnostic.with_secondary_label(span, message)
        } else {
            let other = self.state.annotator.unit(earlier_unit);
            diagnostic.with_help(format!("{message} in `{}`", other.source_name()))
        }
    }

    /// Name of a resolved type, for messages.
    pub fn type_name(&self, data_type: StagedType) -> String {
        self.staging().type_name(data_type)
    }

    pub fn classifier_name(&self, classifier: ClassifierHandle) -> Id {
        *self.staging().classifiers[classifier].name
    }

    fn duplicate_user_classes(&mut self) {
        let users: Vec<ClassifierHandle> = self.staging().user_classes().collect();
        let Some((first, rest)) = users.split_first() else {
            return;
        };
        let first = &self.staging().classifiers[*first];
        for user in rest {
            let user = &self.staging().classifiers[*user];
            let diagnostic = Diagnostic::annotation(
                AnnotationCode::ErrDupUsr,
                format!(
                    "only one user class may be declared, found `{}` and `{}`",
                    first.name.inner(),
                    user.name.inner()
                ),
            )
            .with_label(user.kind.span(), "second user class");
            let diagnostic = self.with_earlier(
                diagnostic,
                user.unit,
                first.unit,
                first.kind.span(),
                "first user class declared here",
            );
            self.push(user.unit, diagnostic);
        }
    }

    /// Package segments must match `[a-z][a-z0-9]*`.
    fn package_names(&mut self) {
        for unit in self.state.annotator.units() {
            if unit.macro_origin().is_some() {
                continue;
            }
            let UnitTree::File(file) = unit.tree() else {
                continue;
            };
            let package = file.package.inner().to_string();
            if package.split('.').all(is_package_segment) {
                continue;
            }
            self.push(
                unit.ordinal(),
                Diagnostic::annotation(
                    AnnotationCode::ErrPkgNme,
                    format!("invalid package name `{package}`"),
                )
                .with_label(file.package.span(), "package segments must be lower case")
                .with_help("use segments matching `[a-z][a-z0-9]*`, e.g. `com.example.qa`"),
            );
        }
    }

    fn missing_user_id(&mut self) {
        if self.staging().user_id_property().is_some() {
            return;
        }
        for (_, classifier) in self.staging().classifiers.iter() {
            if classifier.inferred {
                continue;
            }
            let Some(span) = classifier.modifier_span(ClassModifier::Audited) else {
                continue;
            };
            self.push(
                classifier.unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrAudUid,
                    format!(
                        "class `{}` is audited, but no user class declares a `userId` property",
                        classifier.name.inner()
                    ),
                )
                .with_label(span, "audit information needs a user id")
                .with_help("declare a `user` class with a `userId` key property"),
            );
        }
    }

    fn duplicate_service_groups(&mut self) {
        let mut first_group: HashMap<ClassifierHandle, (usize, Span)> = HashMap::new();
        for (_, group) in self.staging().service_groups.iter() {
            let Some(classifier) = group.resolved_classifier() else {
                continue;
            };
            let Some((first_unit, first_span)) = first_group.get(&classifier).copied() else {
                first_group.insert(classifier, (group.unit, group.class_name.span()));
                continue;
            };
            let classifier = &self.staging().classifiers[classifier];
            let package = self.state.package_of(classifier.unit);
            let diagnostic = Diagnostic::annotation(
                AnnotationCode::ErrDupSvc,
                format!(
                    "multiple service groups for class `{}`",
                    classifier.name.qualified(package)
                ),
            )
            .with_label(group.class_name.span(), "served again here");
            let diagnostic = self.with_earlier(
                diagnostic,
                group.unit,
                first_unit,
                first_span,
                "first service group declared here",
            );
            self.push(group.unit, diagnostic);
        }
    }

    fn unreferenced_private_properties(&mut self) {
        let staging = self.staging();
        for (handle, classifier) in staging.classifiers.iter() {
            for (index, property) in classifier.properties.iter().enumerate() {
                let audit = property.has_modifier(PropertyModifier::CreatedBy)
                    || property.has_modifier(PropertyModifier::LastUpdatedBy);
                let range = property.primitive() == Some(PrimitiveType::TemporalRange);
                if !property.is_private() || property.inferred || audit || range {
                    continue;
                }
                let referenced = self.state.referenced.contains(&PropertyHandle {
                    classifier: handle,
                    index,
                });
                if referenced {
                    continue;
                }
                self.push(
                    property.unit,
                    Diagnostic::annotation(
                        AnnotationCode::WrnPrvUnr,
                        format!(
                            "private property `{}.{}` is never referenced",
                            classifier.name.inner(),
                            property.name.inner()
                        ),
                    )
                    .with_label(property.name.span(), "not used by any criteria or projection")
                    .with_help("remove the property, or drop the `private` modifier"),
                );
            }
        }
    }
}

fn is_package_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

/// `(index, first index)` of every item equal to an earlier one.
pub(super) fn repeated<T: PartialEq>(items: &[Spanned<T>]) -> Vec<(usize, usize)> {
    repeated_by(items, |item| item)
}

pub(super) fn repeated_by<'a, T, K: PartialEq + 'a>(
    items: &'a [T],
    key: impl Fn(&'a T) -> &'a K,
) -> Vec<(usize, usize)> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            items[..index]
                .iter()
                .position(|earlier| key(earlier) == key(item))
                .map(|first| (index, first))
        })
        .collect()
}

/// What to say about a reference that did not resolve, if it did not.
pub(super) fn unresolved<T>(resolved: &Option<Resolved<T>>) -> Option<&'static str> {
    match resolved {
        Some(Resolved::NotFound) => Some("not found"),
        Some(Resolved::Ambiguous) => Some("declared in more than one source"),
        Some(Resolved::Found(_)) | None => None,
    }
}
