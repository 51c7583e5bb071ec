//! Property type resolution and inheritance.

use std::collections::HashSet;

use log::{debug, trace};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::compiler::{
    phases::resolve_data_type,
    staging::{ClassifierHandle, Staging},
    state::CompilerState,
};

/// Resolves the types of data type properties declared in `unit`,
/// including members spliced into earlier classifiers.
pub(super) fn classifier(state: &mut CompilerState, unit: usize) {
    for handle in state.staging.classifiers.handles() {
        let resolutions: Vec<_> = state.staging.classifiers[handle]
            .properties
            .iter()
            .enumerate()
            .filter(|(_, property)| property.unit == unit)
            .map(|(index, property)| (index, resolve_data_type(state, *property.type_name)))
            .collect();

        let classifier = &mut state.staging.classifiers[handle];
        for (index, resolution) in resolutions {
            trace!(
                classifier:% = classifier.name.inner(),
                property:% = classifier.properties[index].name.inner(),
                found = resolution.is_found();
                "Resolved property type"
            );
            classifier.properties[index].data_type = Some(resolution);
        }
    }
}

/// Resolves superclasses and interfaces of classifiers declared in `unit`
/// and marks every classifier that takes part in an inheritance cycle.
pub(super) fn inheritance(state: &mut CompilerState, unit: usize) {
    let handles: Vec<ClassifierHandle> = state
        .staging
        .classifiers
        .iter()
        .filter(|(_, classifier)| classifier.unit == unit)
        .map(|(handle, _)| handle)
        .collect();

    for handle in &handles {
        let classifier = &state.staging.classifiers[*handle];
        let superclass = classifier
            .superclass_name
            .as_ref()
            .map(|name| state.symbols.lookup_classifier(**name));
        let interfaces = classifier
            .interface_names
            .iter()
            .map(|name| state.symbols.lookup_classifier(**name))
            .collect();

        let classifier = &mut state.staging.classifiers[*handle];
        classifier.superclass_resolution = superclass;
        classifier.interfaces = interfaces;
    }

    let cyclic = cyclic_classifiers(&state.staging);
    if !cyclic.is_empty() {
        debug!(unit, classifiers = cyclic.len(); "Inheritance cycle detected");
    }
    for handle in cyclic {
        state.staging.classifiers[handle].cyclic = true;
    }
}

/// Classifiers that reach themselves through resolved supertypes.
fn cyclic_classifiers(staging: &Staging) -> HashSet<ClassifierHandle> {
    let mut graph = DiGraph::<ClassifierHandle, ()>::new();
    let nodes: Vec<NodeIndex> = staging
        .classifiers
        .handles()
        .map(|handle| graph.add_node(handle))
        .collect();
    for handle in staging.classifiers.handles() {
        for supertype in staging.supertypes(handle) {
            graph.update_edge(nodes[handle.index()], nodes[supertype.index()], ());
        }
    }

    petgraph::algo::tarjan_scc(&graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1 || graph.contains_edge(component[0], component[0])
        })
        .flatten()
        .map(|node| graph[node])
        .collect()
}
