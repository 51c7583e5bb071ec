//! Projection member resolution.

use klass_core::identifier::Id;
use log::trace;

use crate::compiler::{
    resolved::Resolved,
    staging::{ClassifierHandle, ProjectionBodyStaging, ProjectionMemberStaging, ProjectionTarget},
    state::CompilerState,
};

pub(super) fn projection(state: &mut CompilerState, unit: usize) {
    for handle in state.staging.projections.handles() {
        let projection = &state.staging.projections[handle];
        if projection.unit != unit {
            continue;
        }

        let classifier = state.symbols.lookup_classifier(*projection.class_name);
        let mut members = std::mem::take(&mut state.staging.projections[handle].members);
        if let Resolved::Found(classifier) = classifier {
            resolve_members(state, &mut members, classifier);
        }

        let projection = &mut state.staging.projections[handle];
        projection.classifier = Some(classifier);
        projection.members = members;
        trace!(projection:% = projection.name.inner(); "Resolved projection");
    }
}

/// Resolves one level of members against `classifier`, then descends into
/// inline children through the association end they name.
fn resolve_members(
    state: &mut CompilerState,
    members: &mut [ProjectionMemberStaging],
    classifier: ClassifierHandle,
) {
    let mut seen: Vec<Id> = Vec::new();
    for member in members {
        let name = *member.name;
        member.duplicate = seen.contains(&name);
        seen.push(name);

        let property = state.staging.find_property(classifier, name);
        let end = state.staging.find_end(classifier, name);
        let target = match (property, end) {
            (Resolved::NotFound, Resolved::NotFound) => Resolved::NotFound,
            (Resolved::Found(property), Resolved::NotFound) => {
                Resolved::Found(ProjectionTarget::Property(property))
            }
            (Resolved::NotFound, Resolved::Found(end)) => {
                Resolved::Found(ProjectionTarget::End(end))
            }
            _ => Resolved::Ambiguous,
        };
        if let Resolved::Found(ProjectionTarget::Property(property)) = target {
            state.referenced.insert(property);
        }
        member.target = Some(target);

        match &mut member.body {
            ProjectionBodyStaging::Header(_) => {}
            ProjectionBodyStaging::Children(children) => {
                let child_classifier = match target {
                    Resolved::Found(ProjectionTarget::End(end)) => {
                        state.staging.ends[end].resolved_target()
                    }
                    _ => None,
                };
                if let Some(child_classifier) = child_classifier {
                    resolve_members(state, children, child_classifier);
                }
            }
            ProjectionBodyStaging::Projection { name, projection } => {
                *projection = Some(state.symbols.lookup_projection(**name));
            }
        }
    }
}
