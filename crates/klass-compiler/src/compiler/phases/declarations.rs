//! Phases that create staging elements: compilation units, top-level
//! declarations and enumerations.

use log::trace;

use crate::{
    compiler::{
        staging::{
            AssociationEndStaging, AssociationStaging, ClassifierStaging, EnumerationStaging,
            ParameterStaging, ProjectionStaging, ServiceCriteriaStaging, ServiceGroupHandle,
            ServiceGroupStaging, ServiceStaging, UrlSegmentStaging, UrlStaging,
        },
        state::CompilerState,
        symbols::TopLevelHandle,
    },
    source::UnitTree,
    syntax::{Declaration, ParameterDecl, ServiceGroupDecl, UrlSegmentDecl},
};

/// Records the unit's package and splices in-place macro units into their
/// host element.
pub(super) fn compilation_unit(state: &mut CompilerState, unit: usize) {
    if state.packages.len() <= unit {
        state.packages.resize(unit + 1, None);
    }

    let compilation_unit = state.annotator.unit(unit);
    match compilation_unit.tree() {
        UnitTree::File(file) => {
            state.packages[unit] = Some(file.package.clone());
        }
        UnitTree::Members { host, members } => {
            let package = state.packages[state.staging.classifiers[*host].unit].clone();
            state.packages[unit] = package;
            let staging = &mut state.staging;
            staging.classifiers[*host].add_members(unit, members, true, &mut staging.parameters);
            trace!(unit, members = members.len(); "Spliced members");
        }
        UnitTree::ServiceCriteria { host, criteria } => {
            let package = state.packages[state.staging.services[*host].unit].clone();
            state.packages[unit] = package;
            let service = &mut state.staging.services[*host];
            service.criteria.extend(
                criteria
                    .iter()
                    .map(|criteria| ServiceCriteriaStaging::new(unit, criteria, true)),
            );
            trace!(unit, criteria = criteria.len(); "Spliced service criteria");
        }
        UnitTree::Invalid => {}
    }
}

/// Creates a staging element for every top-level declaration of a file
/// unit and enters it in the symbol table.
pub(super) fn top_level_declaration(state: &mut CompilerState, unit: usize) {
    let compilation_unit = state.annotator.unit(unit);
    let UnitTree::File(file) = compilation_unit.tree() else {
        return;
    };
    let inferred = state.annotator.is_macro_unit(unit);

    for (ordinal, declaration) in file.declarations.iter().enumerate() {
        let handle = match declaration {
            Declaration::Enumeration(decl) => TopLevelHandle::Enumeration(
                state
                    .staging
                    .enumerations
                    .alloc(EnumerationStaging::new(unit, ordinal, decl)),
            ),
            Declaration::Classifier(decl) => {
                let mut classifier = ClassifierStaging::new(unit, ordinal, decl, inferred);
                classifier.add_members(
                    unit,
                    &decl.members,
                    inferred,
                    &mut state.staging.parameters,
                );
                TopLevelHandle::Classifier(state.staging.classifiers.alloc(classifier))
            }
            Declaration::Association(decl) => {
                let association = state
                    .staging
                    .associations
                    .alloc(AssociationStaging::new(unit, ordinal, decl, inferred));
                for (index, end) in decl.ends.iter().enumerate() {
                    let end = state
                        .staging
                        .ends
                        .alloc(AssociationEndStaging::new(unit, association, index, end));
                    state.staging.associations[association].ends.push(end);
                }
                TopLevelHandle::Association(association)
            }
            Declaration::Projection(decl) => TopLevelHandle::Projection(
                state
                    .staging
                    .projections
                    .alloc(ProjectionStaging::new(unit, ordinal, decl)),
            ),
            Declaration::Service(decl) => {
                TopLevelHandle::ServiceGroup(stage_service_group(state, unit, ordinal, decl))
            }
        };
        trace!(unit, ordinal, name:% = declaration.name().inner(); "Declared top level element");
        state.declare_top_level_element(declaration.name(), unit, handle);
    }
}

fn stage_service_group(
    state: &mut CompilerState,
    unit: usize,
    ordinal: usize,
    decl: &ServiceGroupDecl,
) -> ServiceGroupHandle {
    let group = state
        .staging
        .service_groups
        .alloc(ServiceGroupStaging::new(unit, ordinal, decl));

    for (url_index, url) in decl.urls.iter().enumerate() {
        let mut parameter_ordinal = 0;
        let mut next_parameter = |state: &mut CompilerState, decl: &ParameterDecl| {
            let parameter = ParameterStaging::new(unit, parameter_ordinal, decl);
            parameter_ordinal += 1;
            state.staging.parameters.alloc(parameter)
        };

        let segments = url
            .segments
            .iter()
            .map(|segment| match segment {
                UrlSegmentDecl::Constant(text) => UrlSegmentStaging::Constant(text.inner().clone()),
                UrlSegmentDecl::Parameter(parameter) => {
                    UrlSegmentStaging::Parameter(next_parameter(state, parameter))
                }
            })
            .collect();
        let query = url
            .query
            .iter()
            .map(|parameter| next_parameter(state, parameter))
            .collect();
        let services = url
            .services
            .iter()
            .map(|service| {
                state
                    .staging
                    .services
                    .alloc(ServiceStaging::new(unit, group, url_index, service))
            })
            .collect();

        state.staging.service_groups[group].urls.push(UrlStaging {
            segments,
            query,
            services,
            span: url.span,
            normalized_path: url.normalized_path(),
        });
    }
    group
}

/// Finds repeated literal names and pretty names.
pub(super) fn enumeration(state: &mut CompilerState, unit: usize) {
    for (_, enumeration) in state.staging.enumerations.iter_mut() {
        if enumeration.unit != unit {
            continue;
        }

        for (index, literal) in enumeration.literals.iter().enumerate() {
            let earlier = &enumeration.literals[..index];
            if let Some(first) = earlier
                .iter()
                .position(|other| *other.name == *literal.name)
            {
                enumeration.duplicate_names.push((index, first));
            }
            let Some(pretty_name) = &literal.pretty_name else {
                continue;
            };
            if let Some(first) = earlier.iter().position(|other| {
                other
                    .pretty_name
                    .as_ref()
                    .is_some_and(|other| **other == **pretty_name)
            }) {
                enumeration.duplicate_pretty_names.push((index, first));
            }
        }
        trace!(
            enumeration:% = enumeration.name.inner(),
            literals = enumeration.literals.len();
            "Checked enumeration literals"
        );
    }
}
