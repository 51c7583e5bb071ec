//! Associations, reference signatures, parameterized properties and
//! relationships.

use klass_core::model::Operator;
use log::trace;

use crate::compiler::{
    phases::{
        CriteriaOwner, resolve_data_type,
        values::{resolve_order_by, resolve_owned_criteria},
    },
    staging::{
        AssociationHandle, CriteriaStaging, ExpressionStaging, ForeignKeyStaging, Staging,
    },
    state::CompilerState,
};

fn associations_in(state: &CompilerState, unit: usize) -> Vec<AssociationHandle> {
    state
        .staging
        .associations
        .iter()
        .filter(|(_, association)| association.unit == unit)
        .map(|(handle, _)| handle)
        .collect()
}

/// Resolves end types, wires each end to the class that owns it and to its
/// opposite, and resolves end order-by clauses.
pub(super) fn association(state: &mut CompilerState, unit: usize) {
    for association in associations_in(state, unit) {
        let ends = state.staging.associations[association].ends.clone();
        for end in &ends {
            let target = state
                .symbols
                .lookup_classifier(*state.staging.ends[*end].type_name);
            state.staging.ends[*end].target = Some(target);
        }

        if let Some((source, target)) = state.staging.associations[association].end_pair() {
            let staging = &mut state.staging;
            // Each end is a property of the class at the other end.
            for (end, other) in [(source, target), (target, source)] {
                staging.ends[end].opposite = Some(other);
                if let Some(owner) = staging.ends[other].resolved_target() {
                    staging.ends[end].owner = Some(owner);
                    staging.classifiers[owner].ends.push(end);
                }
            }
        }

        for end in ends {
            let Some(mut order_by) = state.staging.ends[end].order_by.take() else {
                continue;
            };
            let this = state.staging.ends[end].resolved_target();
            resolve_order_by(state, &mut order_by, this);
            state.staging.ends[end].order_by = Some(order_by);
        }
        trace!(
            association:% = state.staging.associations[association].name.inner();
            "Resolved association ends"
        );
    }
}

/// Resolves reference signatures declared in `unit`.
pub(super) fn end_signature(state: &mut CompilerState, unit: usize) {
    for classifier in state.staging.classifiers.handles() {
        for index in 0..state.staging.classifiers[classifier].signatures.len() {
            let signature = &state.staging.classifiers[classifier].signatures[index];
            if signature.unit != unit {
                continue;
            }
            let target = state.symbols.lookup_classifier(*signature.type_name);
            let mut order_by = state.staging.classifiers[classifier].signatures[index]
                .order_by
                .take();
            if let Some(order_by) = &mut order_by {
                resolve_order_by(state, order_by, target.found());
            }

            let signature = &mut state.staging.classifiers[classifier].signatures[index];
            signature.target = Some(target);
            signature.order_by = order_by;
        }
    }
}

/// Resolves parameterized properties declared in `unit`: their target,
/// parameter types, criteria paths and order-by.
pub(super) fn parameterized_property(state: &mut CompilerState, unit: usize) {
    for classifier in state.staging.classifiers.handles() {
        for index in 0..state.staging.classifiers[classifier].parameterized.len() {
            let property = &state.staging.classifiers[classifier].parameterized[index];
            if property.unit != unit {
                continue;
            }
            let target = state.symbols.lookup_classifier(*property.type_name);
            for parameter in property.parameters.clone() {
                let data_type =
                    resolve_data_type(state, *state.staging.parameters[parameter].type_name);
                state.staging.parameters[parameter].data_type = Some(data_type);
            }
            state.staging.classifiers[classifier].parameterized[index].target = Some(target);

            resolve_owned_criteria(state, CriteriaOwner::Parameterized { classifier, index });

            let mut order_by = state.staging.classifiers[classifier].parameterized[index]
                .order_by
                .take();
            if let Some(order_by) = &mut order_by {
                resolve_order_by(state, order_by, target.found());
            }
            state.staging.classifiers[classifier].parameterized[index].order_by = order_by;
        }
    }
}

/// Resolves relationship paths and finds the foreign keys they join.
pub(super) fn relationship(state: &mut CompilerState, unit: usize) {
    for association in associations_in(state, unit) {
        resolve_owned_criteria(state, CriteriaOwner::Relationship(association));
        let foreign_keys = foreign_keys(&state.staging, association);
        trace!(
            association:% = state.staging.associations[association].name.inner(),
            foreign_keys = foreign_keys.len();
            "Resolved relationship"
        );
        state.staging.associations[association].foreign_keys = foreign_keys;
    }
}

/// Equalities between two plain properties where exactly one side is a
/// key make the other side a foreign key. When both sides are keys, the
/// side on the target end's class is the foreign one.
fn foreign_keys(staging: &Staging, association: AssociationHandle) -> Vec<ForeignKeyStaging> {
    let association = &staging.associations[association];
    let target_class = association
        .end_pair()
        .and_then(|(_, target)| staging.ends[target].resolved_target());

    let mut foreign_keys = Vec::new();
    association.relationship.for_each_leaf(&mut |leaf| {
        let CriteriaStaging::Operator(operator) = leaf else {
            return;
        };
        if *operator.operator != Operator::Equal {
            return;
        }
        let (ExpressionStaging::Member(source), ExpressionStaging::Member(target)) =
            (&operator.source, &operator.target)
        else {
            return;
        };
        if !source.decl.ends().is_empty() || !target.decl.ends().is_empty() {
            return;
        }
        let (Some(source_property), Some(target_property)) =
            (source.resolved_property(), target.resolved_property())
        else {
            return;
        };

        let pair = match (
            staging.property(source_property).is_key(),
            staging.property(target_property).is_key(),
        ) {
            (true, false) => Some((target_property, source_property)),
            (false, true) => Some((source_property, target_property)),
            (true, true) if source.resolved_classifier() == target_class => {
                Some((source_property, target_property))
            }
            (true, true) if target.resolved_classifier() == target_class => {
                Some((target_property, source_property))
            }
            _ => None,
        };
        if let Some((foreign, key)) = pair {
            foreign_keys.push(ForeignKeyStaging {
                foreign,
                key,
            });
        }
    });
    foreign_keys
}
