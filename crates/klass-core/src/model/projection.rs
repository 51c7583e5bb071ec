use crate::{
    identifier::Id,
    model::types::{AssociationEndId, ClassifierId, ProjectionId, PropertyRef},
};

/// A named, tree-shaped selection of members rooted at a classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    name: Id,
    package: Id,
    ordinal: usize,
    classifier: ClassifierId,
    children: Vec<ProjectionMember>,
}

impl Projection {
    pub fn new(
        name: Id,
        package: Id,
        ordinal: usize,
        classifier: ClassifierId,
        children: Vec<ProjectionMember>,
    ) -> Self {
        Self {
            name,
            package,
            ordinal,
            classifier,
            children,
        }
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn package(&self) -> Id {
        self.package
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// The classifier named after `on`.
    pub fn classifier(&self) -> ClassifierId {
        self.classifier
    }

    pub fn children(&self) -> &[ProjectionMember] {
        &self.children
    }
}

/// One entry of a projection.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionMember {
    /// `name: "Header"`.
    DataTypeProperty {
        name: Id,
        property: PropertyRef,
        header: String,
    },
    /// `name: { ... }`: an association end with an inline sub-projection.
    ReferenceProperty {
        name: Id,
        end: AssociationEndId,
        children: Vec<ProjectionMember>,
    },
    /// `name: OtherProjection`.
    ProjectionReference {
        name: Id,
        end: AssociationEndId,
        projection: ProjectionId,
    },
}

impl ProjectionMember {
    pub fn name(&self) -> Id {
        match self {
            ProjectionMember::DataTypeProperty { name, .. }
            | ProjectionMember::ReferenceProperty { name, .. }
            | ProjectionMember::ProjectionReference { name, .. } => *name,
        }
    }
}
