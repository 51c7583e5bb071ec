//! Staging elements: mutable, partially resolved wrappers around syntax
//! nodes.
//!
//! Every semantic construct gets one staging element when its compilation
//! unit is declared. Phases fill in resolution results (always as
//! [`Resolved`] sentinels, never by failing), the report step reads them to
//! describe errors, and the build step turns them into the immutable
//! [`klass_core::model`] once the compilation is error free.
//!
//! Elements live in the typed arenas of [`Staging`] and refer to each other
//! by [`Handle`].

mod association;
mod classifier;
mod criteria;
mod enumeration;
mod projection;
mod service;

use std::fmt;

use klass_core::{
    identifier::Id,
    model::{ClassifierKind, PrimitiveType, PropertyModifier},
};

pub(crate) use association::{AssociationEndStaging, AssociationStaging, ForeignKeyStaging};
pub(crate) use classifier::{
    ClassifierStaging, ParameterStaging, ParameterizedStaging, PropertyStaging, SignatureStaging,
};
pub(crate) use criteria::{
    CriteriaStaging, ExpressionStaging, LiteralStaging, MemberPathStaging, OperandCheck,
    OperatorStaging, OrderByStaging,
};
pub(crate) use enumeration::EnumerationStaging;
pub(crate) use projection::{
    ProjectionBodyStaging, ProjectionMemberStaging, ProjectionStaging, ProjectionTarget,
};
pub(crate) use service::{
    ServiceCriteriaStaging, ServiceGroupStaging, ServiceStaging, UrlSegmentStaging, UrlStaging,
};

use crate::compiler::{
    arena::{Arena, Handle},
    resolved::Resolved,
};

pub(crate) type EnumerationHandle = Handle<EnumerationStaging>;
pub(crate) type ClassifierHandle = Handle<ClassifierStaging>;
pub(crate) type AssociationHandle = Handle<AssociationStaging>;
pub(crate) type EndHandle = Handle<AssociationEndStaging>;
pub(crate) type ParameterHandle = Handle<ParameterStaging>;
pub(crate) type ProjectionHandle = Handle<ProjectionStaging>;
pub(crate) type ServiceGroupHandle = Handle<ServiceGroupStaging>;
pub(crate) type ServiceHandle = Handle<ServiceStaging>;

/// The domain model index of a staging element, allocated exactly once.
#[derive(Debug)]
pub(crate) struct BuildSlot<I> {
    id: Option<I>,
}

impl<I> Default for BuildSlot<I> {
    fn default() -> Self {
        Self { id: None }
    }
}

impl<I: Copy + fmt::Debug> BuildSlot<I> {
    /// # Panics
    ///
    /// Panics if the element was already built.
    pub fn allocate(&mut self, id: I) {
        if let Some(existing) = self.id {
            panic!("illegal state: element already built as {existing:?}");
        }
        self.id = Some(id);
    }

    /// # Panics
    ///
    /// Panics if the element has not been built yet.
    pub fn id(&self) -> I {
        match self.id {
            Some(id) => id,
            None => panic!("illegal state: element referenced before it was built"),
        }
    }
}

/// A data type property, addressed by its classifier and its position in
/// that classifier's property list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct PropertyHandle {
    pub classifier: ClassifierHandle,
    pub index: usize,
}

/// The resolved type of a property or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StagedType {
    Primitive(PrimitiveType),
    Enumeration(EnumerationHandle),
}

impl StagedType {
    pub fn primitive(&self) -> Option<PrimitiveType> {
        match self {
            StagedType::Primitive(primitive) => Some(*primitive),
            StagedType::Enumeration(_) => None,
        }
    }
}

/// Every staging element of a compilation.
#[derive(Debug, Default)]
pub(crate) struct Staging {
    pub enumerations: Arena<EnumerationStaging>,
    pub classifiers: Arena<ClassifierStaging>,
    pub associations: Arena<AssociationStaging>,
    pub ends: Arena<AssociationEndStaging>,
    pub parameters: Arena<ParameterStaging>,
    pub projections: Arena<ProjectionStaging>,
    pub service_groups: Arena<ServiceGroupStaging>,
    pub services: Arena<ServiceStaging>,
}

impl Staging {
    pub fn property(&self, handle: PropertyHandle) -> &PropertyStaging {
        &self.classifiers[handle.classifier].properties[handle.index]
    }

    pub fn property_type(&self, handle: PropertyHandle) -> Option<StagedType> {
        self.property(handle).resolved_type()
    }

    /// Human readable name of a resolved type.
    pub fn type_name(&self, data_type: StagedType) -> String {
        match data_type {
            StagedType::Primitive(primitive) => primitive.name().to_string(),
            StagedType::Enumeration(handle) => self.enumerations[handle].name.to_string(),
        }
    }

    /// Direct supertypes that resolved: the superclass first, then the
    /// interfaces in declaration order.
    pub fn supertypes(&self, classifier: ClassifierHandle) -> Vec<ClassifierHandle> {
        let staging = &self.classifiers[classifier];
        staging
            .superclass()
            .into_iter()
            .chain(staging.interfaces.iter().filter_map(Resolved::found))
            .collect()
    }

    /// Whether `ancestor` is reachable from `classifier` through
    /// superclasses and interfaces. A classifier is not its own ancestor
    /// unless inheritance is circular.
    pub fn inherits_from(&self, classifier: ClassifierHandle, ancestor: ClassifierHandle) -> bool {
        let mut visited = Vec::new();
        let mut pending = self.supertypes(classifier);
        while let Some(next) = pending.pop() {
            if next == ancestor {
                return true;
            }
            if !visited.contains(&next) {
                visited.push(next);
                pending.extend(self.supertypes(next));
            }
        }
        false
    }

    /// Whether an instance of `classifier` can stand where `expected` is
    /// required.
    pub fn conforms_to(&self, classifier: ClassifierHandle, expected: ClassifierHandle) -> bool {
        classifier == expected || self.inherits_from(classifier, expected)
    }

    /// Looks up a data type property: own properties first, then the
    /// superclass chain, then interfaces. A name inherited from more than
    /// one interface is ambiguous.
    pub fn find_property(
        &self,
        classifier: ClassifierHandle,
        name: Id,
    ) -> Resolved<PropertyHandle> {
        self.find_property_in(classifier, name, &mut Vec::new())
    }

    fn find_property_in(
        &self,
        classifier: ClassifierHandle,
        name: Id,
        visited: &mut Vec<ClassifierHandle>,
    ) -> Resolved<PropertyHandle> {
        if visited.contains(&classifier) {
            return Resolved::NotFound;
        }
        visited.push(classifier);

        let staging = &self.classifiers[classifier];
        if let Some(index) = staging
            .properties
            .iter()
            .position(|property| *property.name == name)
        {
            return Resolved::Found(PropertyHandle { classifier, index });
        }

        if let Some(superclass) = staging.superclass() {
            match self.find_property_in(superclass, name, visited) {
                Resolved::NotFound => {}
                found_or_ambiguous => return found_or_ambiguous,
            }
        }

        let mut candidates = Vec::new();
        for interface in staging.interfaces.iter().filter_map(Resolved::found) {
            match self.find_property_in(interface, name, visited) {
                Resolved::Found(handle) => candidates.push(handle),
                Resolved::Ambiguous => return Resolved::Ambiguous,
                Resolved::NotFound => {}
            }
        }
        Resolved::from_candidates(candidates)
    }

    /// Looks up an association end owned by `classifier` or one of its
    /// superclasses.
    pub fn find_end(&self, classifier: ClassifierHandle, name: Id) -> Resolved<EndHandle> {
        let mut visited = Vec::new();
        let mut current = Some(classifier);
        while let Some(handle) = current {
            if visited.contains(&handle) {
                break;
            }
            visited.push(handle);

            let staging = &self.classifiers[handle];
            let candidates: Vec<EndHandle> = staging
                .ends
                .iter()
                .copied()
                .filter(|end| *self.ends[*end].name == name)
                .collect();
            if !candidates.is_empty() {
                return Resolved::from_candidates(candidates);
            }
            current = staging.superclass();
        }
        Resolved::NotFound
    }

    /// Key properties of a classifier, own ones first, then inherited ones
    /// that are not shadowed by name.
    pub fn key_properties(&self, classifier: ClassifierHandle) -> Vec<PropertyHandle> {
        let mut keys: Vec<PropertyHandle> = Vec::new();
        let mut visited = Vec::new();
        let mut pending = vec![classifier];
        while !pending.is_empty() {
            let handle = pending.remove(0);
            if visited.contains(&handle) {
                continue;
            }
            visited.push(handle);
            for (index, property) in self.classifiers[handle].properties.iter().enumerate() {
                let shadowed = keys
                    .iter()
                    .any(|key| *self.property(*key).name == *property.name);
                if property.is_key() && !shadowed {
                    keys.push(PropertyHandle {
                        classifier: handle,
                        index,
                    });
                }
            }
            pending.extend(self.supertypes(handle));
        }
        keys
    }

    /// User classes in declaration order.
    pub fn user_classes(&self) -> impl Iterator<Item = ClassifierHandle> + '_ {
        self.classifiers
            .iter()
            .filter(|(_, classifier)| *classifier.kind == ClassifierKind::User)
            .map(|(handle, _)| handle)
    }

    /// The `userId` property of the first user class, if any.
    pub fn user_id_property(&self) -> Option<PropertyHandle> {
        self.user_classes().find_map(|classifier| {
            self.classifiers[classifier]
                .properties
                .iter()
                .position(|property| property.has_modifier(PropertyModifier::UserId))
                .map(|index| PropertyHandle { classifier, index })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "already built")]
    fn test_build_slot_allocates_once() {
        let mut slot = BuildSlot::default();
        slot.allocate(1usize);
        assert_eq!(slot.id(), 1);
        slot.allocate(2usize);
    }

    #[test]
    #[should_panic(expected = "before it was built")]
    fn test_build_slot_requires_allocation() {
        let slot = BuildSlot::<usize>::default();
        slot.id();
    }

    #[test]
    fn test_staged_type_primitive() {
        assert_eq!(
            StagedType::Primitive(PrimitiveType::Long).primitive(),
            Some(PrimitiveType::Long)
        );
    }
}
