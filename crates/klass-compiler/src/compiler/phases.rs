//! The phase pipeline.
//!
//! Each phase is a walk over one compilation unit that resolves a little
//! more of the staging elements declared in, or spliced in by, that unit.
//! Phases run in the fixed order of [`PhaseKind::ALL`].

mod associations;
mod classifiers;
mod declarations;
mod inference;
mod order_by;
mod projections;
mod services;
mod values;

use std::fmt;

use klass_core::{identifier::Id, model::PrimitiveType};

use crate::compiler::{
    resolved::Resolved,
    staging::{
        AssociationHandle, ClassifierHandle, CriteriaStaging, ParameterHandle, ServiceHandle,
        StagedType,
    },
    state::CompilerState,
};

/// One pass of the compiler pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PhaseKind {
    CompilationUnit,
    TopLevelDeclaration,
    Enumeration,
    Classifier,
    Inheritance,
    TemporalPropertyInference,
    VersionClassInference,
    AuditPropertyInference,
    VersionAssociationInference,
    Association,
    AssociationEndSignature,
    ParameterizedProperty,
    Relationship,
    Projection,
    Service,
    UrlParameter,
    ServiceCriteria,
    ServiceCriteriaInference,
    ServiceMultiplicityInference,
    VariableResolution,
    LiteralNarrowing,
    OrderBy,
    OrderByDirection,
    OrderByDirectionInference,
}

impl PhaseKind {
    /// Every phase, in execution order.
    pub const ALL: [PhaseKind; 24] = [
        PhaseKind::CompilationUnit,
        PhaseKind::TopLevelDeclaration,
        PhaseKind::Enumeration,
        PhaseKind::Classifier,
        PhaseKind::Inheritance,
        PhaseKind::TemporalPropertyInference,
        PhaseKind::VersionClassInference,
        PhaseKind::AuditPropertyInference,
        PhaseKind::VersionAssociationInference,
        PhaseKind::Association,
        PhaseKind::AssociationEndSignature,
        PhaseKind::ParameterizedProperty,
        PhaseKind::Relationship,
        PhaseKind::Projection,
        PhaseKind::Service,
        PhaseKind::UrlParameter,
        PhaseKind::ServiceCriteria,
        PhaseKind::ServiceCriteriaInference,
        PhaseKind::ServiceMultiplicityInference,
        PhaseKind::VariableResolution,
        PhaseKind::LiteralNarrowing,
        PhaseKind::OrderBy,
        PhaseKind::OrderByDirection,
        PhaseKind::OrderByDirectionInference,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PhaseKind::CompilationUnit => "CompilationUnit",
            PhaseKind::TopLevelDeclaration => "TopLevelDeclaration",
            PhaseKind::Enumeration => "Enumeration",
            PhaseKind::Classifier => "Classifier",
            PhaseKind::Inheritance => "Inheritance",
            PhaseKind::TemporalPropertyInference => "TemporalPropertyInference",
            PhaseKind::VersionClassInference => "VersionClassInference",
            PhaseKind::AuditPropertyInference => "AuditPropertyInference",
            PhaseKind::VersionAssociationInference => "VersionAssociationInference",
            PhaseKind::Association => "Association",
            PhaseKind::AssociationEndSignature => "AssociationEndSignature",
            PhaseKind::ParameterizedProperty => "ParameterizedProperty",
            PhaseKind::Relationship => "Relationship",
            PhaseKind::Projection => "Projection",
            PhaseKind::Service => "Service",
            PhaseKind::UrlParameter => "UrlParameter",
            PhaseKind::ServiceCriteria => "ServiceCriteria",
            PhaseKind::ServiceCriteriaInference => "ServiceCriteriaInference",
            PhaseKind::ServiceMultiplicityInference => "ServiceMultiplicityInference",
            PhaseKind::VariableResolution => "VariableResolution",
            PhaseKind::LiteralNarrowing => "LiteralNarrowing",
            PhaseKind::OrderBy => "OrderBy",
            PhaseKind::OrderByDirection => "OrderByDirection",
            PhaseKind::OrderByDirectionInference => "OrderByDirectionInference",
        }
    }

    /// Position in [`PhaseKind::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub(crate) fn run(self, state: &mut CompilerState, unit: usize) {
        match self {
            PhaseKind::CompilationUnit => declarations::compilation_unit(state, unit),
            PhaseKind::TopLevelDeclaration => declarations::top_level_declaration(state, unit),
            PhaseKind::Enumeration => declarations::enumeration(state, unit),
            PhaseKind::Classifier => classifiers::classifier(state, unit),
            PhaseKind::Inheritance => classifiers::inheritance(state, unit),
            PhaseKind::TemporalPropertyInference => inference::temporal_properties(state, unit),
            PhaseKind::VersionClassInference => inference::version_class(state, unit),
            PhaseKind::AuditPropertyInference => inference::audit_properties(state, unit),
            PhaseKind::VersionAssociationInference => inference::version_association(state, unit),
            PhaseKind::Association => associations::association(state, unit),
            PhaseKind::AssociationEndSignature => associations::end_signature(state, unit),
            PhaseKind::ParameterizedProperty => associations::parameterized_property(state, unit),
            PhaseKind::Relationship => associations::relationship(state, unit),
            PhaseKind::Projection => projections::projection(state, unit),
            PhaseKind::Service => services::service(state, unit),
            PhaseKind::UrlParameter => services::url_parameter(state, unit),
            PhaseKind::ServiceCriteria => services::service_criteria(state, unit),
            PhaseKind::ServiceCriteriaInference => inference::service_criteria(state, unit),
            PhaseKind::ServiceMultiplicityInference => {
                inference::service_multiplicity(state, unit)
            }
            PhaseKind::VariableResolution => values::variable_resolution(state, unit),
            PhaseKind::LiteralNarrowing => values::literal_narrowing(state, unit),
            PhaseKind::OrderBy => order_by::order_by(state, unit),
            PhaseKind::OrderByDirection => order_by::order_by_direction(state, unit),
            PhaseKind::OrderByDirectionInference => {
                order_by::order_by_direction_inference(state, unit)
            }
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolves the type of a property or parameter: a primitive type name,
/// otherwise an enumeration.
fn resolve_data_type(state: &CompilerState, name: Id) -> Resolved<StagedType> {
    match name.to_string().parse::<PrimitiveType>() {
        Ok(primitive) => Resolved::Found(StagedType::Primitive(primitive)),
        Err(_) => state
            .symbols
            .lookup_enumeration(name)
            .map(StagedType::Enumeration),
    }
}

/// Something that owns a criteria tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CriteriaOwner {
    Relationship(AssociationHandle),
    Parameterized {
        classifier: ClassifierHandle,
        index: usize,
    },
    Service {
        service: ServiceHandle,
        index: usize,
    },
}

impl CriteriaOwner {
    /// Every criteria tree that belongs to `unit`.
    pub fn all_in(state: &CompilerState, unit: usize) -> Vec<CriteriaOwner> {
        let staging = &state.staging;
        let relationships = staging
            .associations
            .iter()
            .filter(|(_, association)| association.unit == unit)
            .map(|(handle, _)| CriteriaOwner::Relationship(handle));
        let parameterized = staging.classifiers.iter().flat_map(|(classifier, staging)| {
            staging
                .parameterized
                .iter()
                .enumerate()
                .filter(|(_, property)| property.unit == unit)
                .map(move |(index, _)| CriteriaOwner::Parameterized { classifier, index })
        });
        let services = staging.services.iter().flat_map(|(service, staging)| {
            staging
                .criteria
                .iter()
                .enumerate()
                .filter(|(_, criteria)| criteria.unit == unit)
                .map(move |(index, _)| CriteriaOwner::Service { service, index })
        });
        relationships.chain(parameterized).chain(services).collect()
    }

    fn slot<'a>(&self, state: &'a mut CompilerState) -> &'a mut CriteriaStaging {
        let staging = &mut state.staging;
        match *self {
            CriteriaOwner::Relationship(association) => {
                &mut staging.associations[association].relationship
            }
            CriteriaOwner::Parameterized { classifier, index } => {
                &mut staging.classifiers[classifier].parameterized[index].criteria
            }
            CriteriaOwner::Service { service, index } => {
                &mut staging.services[service].criteria[index].criteria
            }
        }
    }

    /// Moves the criteria out so it can be resolved against the rest of
    /// the state. Pair with [`CriteriaOwner::put`].
    pub fn take(&self, state: &mut CompilerState) -> CriteriaStaging {
        std::mem::take(self.slot(state))
    }

    pub fn put(&self, state: &mut CompilerState, criteria: CriteriaStaging) {
        *self.slot(state) = criteria;
    }

    /// The classifier `this` refers to inside the criteria.
    pub fn this(&self, state: &CompilerState) -> Option<ClassifierHandle> {
        let staging = &state.staging;
        match *self {
            CriteriaOwner::Relationship(association) => staging.associations[association]
                .ends
                .first()
                .and_then(|end| staging.ends[*end].resolved_target()),
            CriteriaOwner::Parameterized { classifier, .. } => Some(classifier),
            CriteriaOwner::Service { service, .. } => {
                let group = staging.services[service].group;
                staging.service_groups[group].resolved_classifier()
            }
        }
    }

    /// Parameters a variable in the criteria may refer to.
    pub fn parameters(&self, state: &CompilerState) -> Vec<ParameterHandle> {
        let staging = &state.staging;
        match *self {
            CriteriaOwner::Relationship(_) => Vec::new(),
            CriteriaOwner::Parameterized { classifier, index } => {
                staging.classifiers[classifier].parameterized[index]
                    .parameters
                    .clone()
            }
            CriteriaOwner::Service { service, .. } => {
                let service = &staging.services[service];
                staging.service_groups[service.group].urls[service.url]
                    .parameters()
                    .collect()
            }
        }
    }
}
