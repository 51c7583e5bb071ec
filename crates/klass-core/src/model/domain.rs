use std::fmt;

use crate::{
    identifier::Id,
    model::{
        association::{Association, AssociationEnd},
        classifier::{Classifier, ClassifierKind},
        enumeration::Enumeration,
        projection::{Projection, ProjectionMember},
        property::{DataTypeProperty, Parameter},
        service::{PathSegment, ServiceGroup},
        types::{
            AssociationEndId, AssociationId, ClassifierId, DataType, EnumerationId, ParameterId,
            ProjectionId, PropertyRef, ServiceGroupId,
        },
    },
};

/// The fully resolved output of a successful compilation.
///
/// Elements live in flat tables and refer to each other by typed index.
/// Tables are ordered by compilation unit, then by declaration order, so two
/// compilations of the same sources produce identical models.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainModel {
    enumerations: Vec<Enumeration>,
    classifiers: Vec<Classifier>,
    associations: Vec<Association>,
    association_ends: Vec<AssociationEnd>,
    projections: Vec<Projection>,
    service_groups: Vec<ServiceGroup>,
    parameters: Vec<Parameter>,
}

impl DomainModel {
    pub fn new(
        enumerations: Vec<Enumeration>,
        classifiers: Vec<Classifier>,
        associations: Vec<Association>,
        association_ends: Vec<AssociationEnd>,
        projections: Vec<Projection>,
        service_groups: Vec<ServiceGroup>,
        parameters: Vec<Parameter>,
    ) -> Self {
        Self {
            enumerations,
            classifiers,
            associations,
            association_ends,
            projections,
            service_groups,
            parameters,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.enumerations.is_empty()
            && self.classifiers.is_empty()
            && self.associations.is_empty()
            && self.projections.is_empty()
            && self.service_groups.is_empty()
    }

    pub fn enumerations(&self) -> &[Enumeration] {
        &self.enumerations
    }

    pub fn classifiers(&self) -> &[Classifier] {
        &self.classifiers
    }

    /// Classes, including the user class.
    pub fn classes(&self) -> impl Iterator<Item = &Classifier> {
        self.classifiers
            .iter()
            .filter(|classifier| classifier.kind().is_class())
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &Classifier> {
        self.classifiers
            .iter()
            .filter(|classifier| classifier.kind() == ClassifierKind::Interface)
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    pub fn association_ends(&self) -> &[AssociationEnd] {
        &self.association_ends
    }

    pub fn projections(&self) -> &[Projection] {
        &self.projections
    }

    pub fn service_groups(&self) -> &[ServiceGroup] {
        &self.service_groups
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn enumeration(&self, id: EnumerationId) -> &Enumeration {
        &self.enumerations[id.index()]
    }

    pub fn classifier(&self, id: ClassifierId) -> &Classifier {
        &self.classifiers[id.index()]
    }

    pub fn association(&self, id: AssociationId) -> &Association {
        &self.associations[id.index()]
    }

    pub fn association_end(&self, id: AssociationEndId) -> &AssociationEnd {
        &self.association_ends[id.index()]
    }

    pub fn projection(&self, id: ProjectionId) -> &Projection {
        &self.projections[id.index()]
    }

    pub fn service_group(&self, id: ServiceGroupId) -> &ServiceGroup {
        &self.service_groups[id.index()]
    }

    pub fn parameter(&self, id: ParameterId) -> &Parameter {
        &self.parameters[id.index()]
    }

    pub fn property(&self, property: PropertyRef) -> &DataTypeProperty {
        &self.classifier(property.classifier()).properties()[property.index()]
    }

    pub fn find_enumeration(&self, name: &str) -> Option<&Enumeration> {
        self.enumerations
            .iter()
            .find(|enumeration| enumeration.name() == name)
    }

    pub fn find_classifier(&self, name: &str) -> Option<&Classifier> {
        self.classifiers
            .iter()
            .find(|classifier| classifier.name() == name)
    }

    pub fn find_classifier_id(&self, name: &str) -> Option<ClassifierId> {
        self.classifiers
            .iter()
            .position(|classifier| classifier.name() == name)
            .map(ClassifierId::new)
    }

    pub fn find_association(&self, name: &str) -> Option<&Association> {
        self.associations
            .iter()
            .find(|association| association.name() == name)
    }

    pub fn find_projection(&self, name: &str) -> Option<&Projection> {
        self.projections
            .iter()
            .find(|projection| projection.name() == name)
    }

    /// Finds an association end owned by `classifier` or one of its
    /// ancestors.
    pub fn find_association_end(
        &self,
        classifier: ClassifierId,
        name: Id,
    ) -> Option<&AssociationEnd> {
        let mut current = Some(classifier);
        while let Some(id) = current {
            let found = self
                .classifier(id)
                .association_ends()
                .iter()
                .map(|end| self.association_end(*end))
                .find(|end| end.name() == name);
            if found.is_some() {
                return found;
            }
            current = self.classifier(id).superclass();
        }
        None
    }

    pub fn data_type_name(&self, data_type: DataType) -> String {
        match data_type {
            DataType::Primitive(primitive) => primitive.to_string(),
            DataType::Enumeration(id) => self.enumeration(id).name().to_string(),
        }
    }

    fn fmt_projection_members(
        &self,
        f: &mut fmt::Formatter<'_>,
        members: &[ProjectionMember],
        depth: usize,
    ) -> fmt::Result {
        let indent = "    ".repeat(depth);
        for member in members {
            match member {
                ProjectionMember::DataTypeProperty { name, header, .. } => {
                    writeln!(f, "{indent}{name}: {header:?}")?;
                }
                ProjectionMember::ReferenceProperty { name, children, .. } => {
                    writeln!(f, "{indent}{name}:")?;
                    self.fmt_projection_members(f, children, depth + 1)?;
                }
                ProjectionMember::ProjectionReference {
                    name, projection, ..
                } => {
                    writeln!(f, "{indent}{name}: {}", self.projection(*projection).name())?;
                }
            }
        }
        Ok(())
    }
}

/// Writes a human readable outline of the model.
impl fmt::Display for DomainModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for enumeration in &self.enumerations {
            let literals: Vec<String> = enumeration
                .literals()
                .iter()
                .map(|literal| literal.name().to_string())
                .collect();
            writeln!(
                f,
                "enumeration {} {{ {} }}",
                enumeration.name().qualified(enumeration.package()),
                literals.join(", ")
            )?;
        }

        for classifier in &self.classifiers {
            write!(
                f,
                "{} {}",
                classifier.kind(),
                classifier.name().qualified(classifier.package())
            )?;
            if let Some(superclass) = classifier.superclass() {
                write!(f, " extends {}", self.classifier(superclass).name())?;
            }
            if !classifier.interfaces().is_empty() {
                let names: Vec<String> = classifier
                    .interfaces()
                    .iter()
                    .map(|id| self.classifier(*id).name().to_string())
                    .collect();
                write!(f, " implements {}", names.join(", "))?;
            }
            for modifier in classifier.modifiers() {
                write!(f, " {modifier}")?;
            }
            writeln!(f)?;

            for property in classifier.properties() {
                let optional = if property.is_optional() { "?" } else { "" };
                write!(
                    f,
                    "    {}: {}{optional}",
                    property.name(),
                    self.data_type_name(property.data_type())
                )?;
                for modifier in property.modifiers() {
                    write!(f, " {modifier}")?;
                }
                writeln!(f)?;
            }
            for end in classifier.association_ends() {
                let end = self.association_end(*end);
                writeln!(
                    f,
                    "    {}: {}{}",
                    end.name(),
                    self.classifier(end.target()).name(),
                    end.multiplicity()
                )?;
            }
            for signature in classifier.association_end_signatures() {
                writeln!(
                    f,
                    "    {}: {}{}",
                    signature.name(),
                    self.classifier(signature.target()).name(),
                    signature.multiplicity()
                )?;
            }
            for property in classifier.parameterized_properties() {
                writeln!(
                    f,
                    "    {}(..): {}{}",
                    property.name(),
                    self.classifier(property.target()).name(),
                    property.multiplicity()
                )?;
            }
        }

        for association in &self.associations {
            let source = self.association_end(association.source_end());
            let target = self.association_end(association.target_end());
            writeln!(
                f,
                "association {}: {}.{} <-> {}.{}",
                association.name().qualified(association.package()),
                self.classifier(source.owner()).name(),
                source.name(),
                self.classifier(target.owner()).name(),
                target.name()
            )?;
        }

        for projection in &self.projections {
            writeln!(
                f,
                "projection {} on {}",
                projection.name().qualified(projection.package()),
                self.classifier(projection.classifier()).name()
            )?;
            self.fmt_projection_members(f, projection.children(), 1)?;
        }

        for group in &self.service_groups {
            writeln!(f, "service {}", group.name().qualified(group.package()))?;
            for url in group.urls() {
                let mut path = String::new();
                for segment in url.path() {
                    path.push('/');
                    match segment {
                        PathSegment::Constant(text) => path.push_str(text),
                        PathSegment::Parameter(id) => {
                            path.push_str(&format!("{{{}}}", self.parameter(*id).name()));
                        }
                    }
                }
                if path.is_empty() {
                    path.push('/');
                }
                for service in url.services() {
                    writeln!(
                        f,
                        "    {} {} {} -> {}",
                        service.verb(),
                        path,
                        service.multiplicity(),
                        self.projection(service.projection()).name()
                    )?;
                }
            }
        }

        Ok(())
    }
}
