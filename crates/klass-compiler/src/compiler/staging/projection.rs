use klass_core::{identifier::Id, model::ProjectionId};

use crate::{
    compiler::{
        resolved::Resolved,
        staging::{BuildSlot, ClassifierHandle, EndHandle, ProjectionHandle, PropertyHandle},
    },
    span::Spanned,
    syntax::{ProjectionBodyDecl, ProjectionDecl, ProjectionMemberDecl},
};

#[derive(Debug)]
pub(crate) struct ProjectionStaging {
    pub unit: usize,
    pub ordinal: usize,
    pub name: Spanned<Id>,
    pub class_name: Spanned<Id>,
    pub classifier: Option<Resolved<ClassifierHandle>>,
    pub members: Vec<ProjectionMemberStaging>,
    pub slot: BuildSlot<ProjectionId>,
}

impl ProjectionStaging {
    pub fn new(unit: usize, ordinal: usize, decl: &ProjectionDecl) -> Self {
        Self {
            unit,
            ordinal,
            name: decl.name.clone(),
            class_name: decl.class_name.clone(),
            classifier: None,
            members: decl.members.iter().map(ProjectionMemberStaging::new).collect(),
            slot: BuildSlot::default(),
        }
    }
}

/// What a projection member names on its classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProjectionTarget {
    Property(PropertyHandle),
    End(EndHandle),
}

#[derive(Debug)]
pub(crate) struct ProjectionMemberStaging {
    pub name: Spanned<Id>,
    pub body: ProjectionBodyStaging,
    pub target: Option<Resolved<ProjectionTarget>>,
    /// A member of the same name appears earlier at this level.
    pub duplicate: bool,
}

impl ProjectionMemberStaging {
    fn new(decl: &ProjectionMemberDecl) -> Self {
        let body = match &decl.body {
            ProjectionBodyDecl::Header(header) => ProjectionBodyStaging::Header(header.clone()),
            ProjectionBodyDecl::Children(children) => ProjectionBodyStaging::Children(
                children.iter().map(ProjectionMemberStaging::new).collect(),
            ),
            ProjectionBodyDecl::Projection(name) => ProjectionBodyStaging::Projection {
                name: name.clone(),
                projection: None,
            },
        };
        Self {
            name: decl.name.clone(),
            body,
            target: None,
            duplicate: false,
        }
    }

    /// Whether the body's shape fits what the member names.
    pub fn fits(&self, target: ProjectionTarget) -> bool {
        matches!(
            (&self.body, target),
            (ProjectionBodyStaging::Header(_), ProjectionTarget::Property(_))
                | (
                    ProjectionBodyStaging::Children(_) | ProjectionBodyStaging::Projection { .. },
                    ProjectionTarget::End(_)
                )
        )
    }
}

#[derive(Debug)]
pub(crate) enum ProjectionBodyStaging {
    Header(Spanned<String>),
    Children(Vec<ProjectionMemberStaging>),
    Projection {
        name: Spanned<Id>,
        projection: Option<Resolved<ProjectionHandle>>,
    },
}
