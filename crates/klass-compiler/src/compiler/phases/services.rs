//! Service groups, URL parameters and declared service criteria.

use log::trace;

use crate::compiler::{
    phases::{CriteriaOwner, resolve_data_type, values::resolve_owned_criteria},
    state::CompilerState,
};

/// Resolves the class of each service group and the projection of each
/// service declared in `unit`.
pub(super) fn service(state: &mut CompilerState, unit: usize) {
    for handle in state.staging.service_groups.handles() {
        let group = &state.staging.service_groups[handle];
        if group.unit != unit {
            continue;
        }
        let classifier = state.symbols.lookup_classifier(*group.class_name);
        trace!(
            service:% = group.class_name.inner(),
            found = classifier.is_found();
            "Resolved service group"
        );
        state.staging.service_groups[handle].classifier = Some(classifier);
    }

    for handle in state.staging.services.handles() {
        let service = &state.staging.services[handle];
        if service.unit != unit {
            continue;
        }
        let projection = service
            .projection_name
            .as_ref()
            .map(|name| state.symbols.lookup_projection(**name));
        state.staging.services[handle].projection = projection;
    }
}

pub(super) fn url_parameter(state: &mut CompilerState, unit: usize) {
    let parameters: Vec<_> = state
        .staging
        .service_groups
        .iter()
        .filter(|(_, group)| group.unit == unit)
        .flat_map(|(_, group)| group.urls.iter().flat_map(|url| url.parameters()))
        .collect();

    for parameter in parameters {
        let data_type = resolve_data_type(state, *state.staging.parameters[parameter].type_name);
        state.staging.parameters[parameter].data_type = Some(data_type);
    }
}

/// Resolves the paths of service criteria declared in `unit`, including
/// criteria spliced in by macros.
pub(super) fn service_criteria(state: &mut CompilerState, unit: usize) {
    for owner in CriteriaOwner::all_in(state, unit) {
        if matches!(owner, CriteriaOwner::Service { .. }) {
            resolve_owned_criteria(state, owner);
        }
    }
}
