//! Inference phases.
//!
//! Each one derives declarations the user left implicit, either by
//! synthesizing source text for a macro unit or by recording a default on
//! an existing staging element.

use klass_core::{
    identifier::Id,
    model::{ClassModifier, CriteriaKeyword, PropertyModifier, ServiceMultiplicity, Verb},
};
use log::{debug, trace};

use crate::{
    compiler::{
        macros,
        resolved::Resolved,
        staging::{ClassifierHandle, PropertyHandle, ServiceHandle, Staging},
        state::CompilerState,
        symbols::Category,
    },
    syntax::ValidationKind,
};

/// Classes declared in `unit` that carry any of `modifiers`.
fn classes_with(
    state: &CompilerState,
    unit: usize,
    modifiers: &[ClassModifier],
) -> Vec<ClassifierHandle> {
    state
        .staging
        .classifiers
        .iter()
        .filter(|(_, classifier)| {
            classifier.unit == unit
                && classifier.is_class()
                && modifiers.iter().any(|modifier| classifier.has_modifier(*modifier))
        })
        .map(|(handle, _)| handle)
        .collect()
}

/// Validation suffix copied by value from `property`, e.g.
/// ` minLength(1) maxLength(128)`.
fn validation_text(
    staging: &Staging,
    property: PropertyHandle,
    kinds: &[ValidationKind],
) -> String {
    let property = staging.property(property);
    kinds
        .iter()
        .filter_map(|kind| {
            property
                .validation(*kind)
                .map(|value| format!(" {}({value})", kind.keyword()))
        })
        .collect()
}

pub(super) fn temporal_properties(state: &mut CompilerState, unit: usize) {
    let temporal = [
        ClassModifier::ValidTemporal,
        ClassModifier::SystemTemporal,
        ClassModifier::Bitemporal,
    ];
    for host in classes_with(state, unit, &temporal) {
        let classifier = &state.staging.classifiers[host];
        let bitemporal = classifier.has_modifier(ClassModifier::Bitemporal);
        let dimensions = [
            (
                bitemporal || classifier.has_modifier(ClassModifier::ValidTemporal),
                PropertyModifier::Valid,
            ),
            (
                bitemporal || classifier.has_modifier(ClassModifier::SystemTemporal),
                PropertyModifier::System,
            ),
        ];

        let declares = |dimension: PropertyModifier, bound: Option<PropertyModifier>| {
            classifier.properties.iter().any(|property| {
                property.has_modifier(dimension)
                    && match bound {
                        Some(bound) => property.has_modifier(bound),
                        None => {
                            !property.has_modifier(PropertyModifier::From)
                                && !property.has_modifier(PropertyModifier::To)
                        }
                    }
            })
        };

        let mut text = String::new();
        for (enabled, dimension) in dimensions {
            if !enabled {
                continue;
            }
            let name = dimension.keyword();
            if !declares(dimension, None) {
                text.push_str(&format!("{name}: TemporalRange? {name} private;\n"));
            }
            if !declares(dimension, Some(PropertyModifier::From)) {
                text.push_str(&format!("{name}From: TemporalInstant? {name} from;\n"));
            }
            if !declares(dimension, Some(PropertyModifier::To)) {
                text.push_str(&format!("{name}To: TemporalInstant? {name} to;\n"));
            }
        }
        if text.is_empty() {
            continue;
        }

        let span = temporal
            .iter()
            .find_map(|modifier| classifier.modifier_span(*modifier))
            .unwrap_or(classifier.name.span());
        trace!(classifier:% = classifier.name.inner(); "Inferring temporal properties");
        macros::expand_members(state, host, text, span);
    }
}

/// Links `source` to its version class.
fn link_version_class(
    state: &mut CompilerState,
    source: ClassifierHandle,
    version: ClassifierHandle,
) {
    if source == version || state.staging.classifiers[source].version_class.is_some() {
        return;
    }
    state.staging.classifiers[source].version_class = Some(version);
    state.staging.classifiers[version].version_of = Some(source);
}

/// Whether `host` is the declaration its name resolves to. A redeclared
/// class loses its name and gets no companion elements.
fn owns_name(state: &CompilerState, host: ClassifierHandle) -> bool {
    let name = *state.staging.classifiers[host].name;
    state.symbols.lookup_classifier(name) == Resolved::Found(host)
}

pub(super) fn version_class(state: &mut CompilerState, unit: usize) {
    for host in classes_with(state, unit, &[ClassModifier::Versioned]) {
        if !owns_name(state, host) {
            continue;
        }
        let classifier = &state.staging.classifiers[host];
        let name = classifier.name.with_suffix("Version");
        match state.symbols.lookup_classifier(name) {
            Resolved::Found(existing) => {
                trace!(classifier:% = classifier.name.inner(); "Using declared version class");
                link_version_class(state, host, existing);
            }
            // Reported as a duplicate top-level name.
            Resolved::Ambiguous => {}
            Resolved::NotFound => {
                let keys = state.staging.key_properties(host);
                if keys.iter().any(|key| state.staging.property_type(*key).is_none()) {
                    // The unresolved key type is reported on the key itself.
                    trace!(classifier:% = classifier.name.inner(); "Skipping version class");
                    continue;
                }
                let span = classifier
                    .modifier_span(ClassModifier::Versioned)
                    .unwrap_or(classifier.name.span());
                let text = version_class_text(state, host, name);
                debug!(classifier:% = name; "Inferring version class");
                macros::expand_file(state, text, span);
            }
        }
    }
}

fn version_class_text(state: &CompilerState, host: ClassifierHandle, name: Id) -> String {
    let staging = &state.staging;
    let classifier = &staging.classifiers[host];
    let audited = if classifier.has_modifier(ClassModifier::Audited) {
        " audited"
    } else {
        ""
    };

    let mut text = format!(
        "package {}\n\nclass {name} systemTemporal{audited}\n{{\n",
        state.package_of(classifier.unit)
    );
    for key in staging.key_properties(host) {
        let property = staging.property(key);
        text.push_str(&format!(
            "    {}: {} key{};\n",
            property.name.inner(),
            property.type_name.inner(),
            validation_text(staging, key, &ValidationKind::ALL)
        ));
    }
    text.push_str("    number: Integer version;\n}\n");
    text
}

pub(super) fn audit_properties(state: &mut CompilerState, unit: usize) {
    let user_id = state.staging.user_id_property();
    let lengths = user_id.map_or_else(String::new, |user_id| {
        validation_text(
            &state.staging,
            user_id,
            &[ValidationKind::MinLength, ValidationKind::MaxLength],
        )
    });

    for host in classes_with(state, unit, &[ClassModifier::Audited]) {
        let classifier = &state.staging.classifiers[host];
        let declares = |modifier: PropertyModifier| {
            classifier
                .properties
                .iter()
                .any(|property| property.has_modifier(modifier))
        };

        let mut text = String::new();
        if !declares(PropertyModifier::CreatedBy) {
            text.push_str(&format!(
                "createdById: String private createdBy final{lengths};\n"
            ));
        }
        if !declares(PropertyModifier::CreatedOn) {
            text.push_str("createdOn: Instant createdOn final;\n");
        }
        if !declares(PropertyModifier::LastUpdatedBy) {
            text.push_str(&format!(
                "lastUpdatedById: String private lastUpdatedBy{lengths};\n"
            ));
        }
        if text.is_empty() {
            continue;
        }

        let span = classifier
            .modifier_span(ClassModifier::Audited)
            .unwrap_or(classifier.name.span());
        trace!(classifier:% = classifier.name.inner(); "Inferring audit properties");
        macros::expand_members(state, host, text, span);
    }
}

pub(super) fn version_association(state: &mut CompilerState, unit: usize) {
    for host in classes_with(state, unit, &[ClassModifier::Versioned]) {
        if !owns_name(state, host) {
            continue;
        }
        let name = *state.staging.classifiers[host].name;
        if state.staging.classifiers[host].version_class.is_none() {
            // Version classes synthesized by a root macro are declared by now.
            if let Resolved::Found(version) =
                state.symbols.lookup_classifier(name.with_suffix("Version"))
            {
                link_version_class(state, host, version);
            }
        }

        let classifier = &state.staging.classifiers[host];
        let Some(version) = classifier.version_class else {
            continue;
        };
        let association = name.with_suffix("HasVersion");
        if state.symbols.contains(Category::Association, association) {
            continue;
        }
        let keys = state.staging.key_properties(host);
        if keys.is_empty() {
            continue;
        }

        let version_name = state.staging.classifiers[version].name.inner();
        let relationship = keys
            .iter()
            .map(|key| {
                let key = state.staging.property(*key).name.inner();
                format!("this.{key} == {version_name}.{key}")
            })
            .collect::<Vec<_>>()
            .join(" && ");
        let text = format!(
            "package {package}\n\nassociation {association}\n{{\n    {end}: {name}[1..1] versioned;\n    version: {version_name}[1..1] owned version;\n\n    relationship {relationship}\n}}\n",
            package = state.package_of(classifier.unit),
            end = name.decapitalized(),
        );
        let span = classifier
            .modifier_span(ClassModifier::Versioned)
            .unwrap_or(classifier.name.span());
        debug!(association:% = association; "Inferring version association");
        macros::expand_file(state, text, span);
    }
}

/// Services declared in `unit`.
fn services_in(state: &CompilerState, unit: usize) -> Vec<ServiceHandle> {
    state
        .staging
        .services
        .iter()
        .filter(|(_, service)| service.unit == unit)
        .map(|(handle, _)| handle)
        .collect()
}

pub(super) fn service_criteria(state: &mut CompilerState, unit: usize) {
    for handle in services_in(state, unit) {
        let staging = &state.staging;
        let service = &staging.services[handle];
        let group = &staging.service_groups[service.group];
        let Some(class) = group.resolved_classifier() else {
            continue;
        };
        if staging.classifiers[class].version_class.is_none() {
            continue;
        }
        let has_version_parameter = group.urls[service.url]
            .parameters()
            .any(|parameter| *staging.parameters[parameter].name == "version");
        if !has_version_parameter {
            continue;
        }

        let verb = *service.verb;
        let text = if verb == Verb::Get && !service.has_criteria(CriteriaKeyword::Version) {
            "version: this.system equalsEdgePoint && this.version.number == version;\n"
        } else if verb.is_update() && !service.has_criteria(CriteriaKeyword::Conflict) {
            "conflict: this.version.number == version;\n"
        } else {
            continue;
        };
        let span = service.verb.span();
        trace!(verb:% = verb; "Inferring service criteria");
        macros::expand_service_criteria(state, handle, text.to_string(), span);
    }
}

pub(super) fn service_multiplicity(state: &mut CompilerState, unit: usize) {
    for handle in services_in(state, unit) {
        if state.staging.services[handle].multiplicity.is_some() {
            continue;
        }
        let multiplicity = infer_multiplicity(&state.staging, handle);
        trace!(multiplicity:% = multiplicity; "Inferred service multiplicity");
        state.staging.services[handle].inferred_multiplicity = Some(multiplicity);
    }
}

/// `one` when every key of the class is bound by a to-one URL parameter of
/// the same name.
fn infer_multiplicity(staging: &Staging, handle: ServiceHandle) -> ServiceMultiplicity {
    let service = &staging.services[handle];
    let group = &staging.service_groups[service.group];
    let Some(class) = group.resolved_classifier() else {
        return ServiceMultiplicity::Many;
    };

    let keys = staging.key_properties(class);
    let url = &group.urls[service.url];
    let bound = |key: &PropertyHandle| {
        let name = *staging.property(*key).name;
        url.parameters().any(|parameter| {
            let parameter = &staging.parameters[parameter];
            *parameter.name == name && parameter.is_to_one()
        })
    };
    if !keys.is_empty() && keys.iter().all(bound) {
        ServiceMultiplicity::One
    } else {
        ServiceMultiplicity::Many
    }
}
