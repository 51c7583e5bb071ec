//! Service order-by clauses and sort directions.

use klass_core::model::SortDirection;

use crate::compiler::{
    phases::values::resolve_order_by,
    staging::OrderByStaging,
    state::CompilerState,
};

pub(super) fn order_by(state: &mut CompilerState, unit: usize) {
    for handle in state.staging.services.handles() {
        let service = &state.staging.services[handle];
        if service.unit != unit {
            continue;
        }
        let group = service.group;
        let Some(mut order_by) = state.staging.services[handle].order_by.take() else {
            continue;
        };
        let this = state.staging.service_groups[group].resolved_classifier();
        resolve_order_by(state, &mut order_by, this);
        state.staging.services[handle].order_by = Some(order_by);
    }
}

pub(super) fn order_by_direction(state: &mut CompilerState, unit: usize) {
    for_each_order_by(state, unit, |order_by| {
        for member in &mut order_by.members {
            if let Some(direction) = &member.direction {
                member.resolved_direction = Some((**direction, false));
            }
        }
    });
}

pub(super) fn order_by_direction_inference(state: &mut CompilerState, unit: usize) {
    for_each_order_by(state, unit, |order_by| {
        for member in &mut order_by.members {
            if member.resolved_direction.is_none() {
                member.resolved_direction = Some((SortDirection::Ascending, true));
            }
        }
    });
}

/// Visits every order-by clause declared in `unit`, wherever it is
/// attached.
fn for_each_order_by(
    state: &mut CompilerState,
    unit: usize,
    mut visit: impl FnMut(&mut OrderByStaging),
) {
    let staging = &mut state.staging;
    for (_, end) in staging.ends.iter_mut() {
        if end.unit == unit {
            end.order_by.iter_mut().for_each(&mut visit);
        }
    }
    for (_, classifier) in staging.classifiers.iter_mut() {
        for signature in &mut classifier.signatures {
            if signature.unit == unit {
                signature.order_by.iter_mut().for_each(&mut visit);
            }
        }
        for property in &mut classifier.parameterized {
            if property.unit == unit {
                property.order_by.iter_mut().for_each(&mut visit);
            }
        }
    }
    for (_, service) in staging.services.iter_mut() {
        if service.unit == unit {
            service.order_by.iter_mut().for_each(&mut visit);
        }
    }
}
