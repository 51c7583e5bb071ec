//! Unit tests for the winnow parser
//!
//! These tests verify that the parser handles every Klass construct and
//! reports syntax errors at the offending token.

use klass_core::model::{
    AssociationEndModifier, ClassModifier, ClassifierKind, CriteriaKeyword, Operator,
    PropertyModifier, ServiceMultiplicity, SortDirection, Verb,
};

use crate::{
    error::{AnnotationCode, Diagnostic},
    lexer, parser,
    syntax::*,
};

fn parse(source: &str) -> Result<SourceFile, Diagnostic> {
    let tokens = lexer::tokenize(source).expect("lexer should succeed");
    parser::build_source_file(&tokens)
}

fn parse_ok(source: &str) -> SourceFile {
    match parse(source) {
        Ok(file) => file,
        Err(err) => panic!("Expected parsing to succeed, but got error: {err}"),
    }
}

fn parse_err(source: &str) -> Diagnostic {
    match parse(source) {
        Ok(file) => panic!("Expected parsing to fail, but got {file:?}"),
        Err(err) => err,
    }
}

fn only_declaration(source: &str) -> Declaration {
    let mut file = parse_ok(source);
    assert_eq!(file.declarations.len(), 1);
    file.declarations.remove(0)
}

fn only_classifier(source: &str) -> ClassifierDecl {
    match only_declaration(source) {
        Declaration::Classifier(classifier) => classifier,
        other => panic!("expected classifier, got {other:?}"),
    }
}

fn only_service(source: &str) -> ServiceDecl {
    let Declaration::Service(group) = only_declaration(source) else {
        panic!("expected service group");
    };
    let mut url = group.urls.into_iter().next().expect("one URL");
    url.services.remove(0)
}

#[test]
fn test_package_only() {
    let file = parse_ok("package com.example.qa");
    assert_eq!(*file.package.inner(), "com.example.qa");
    assert!(file.declarations.is_empty());
}

#[test]
fn test_package_allows_reserved_segments() {
    let file = parse_ok("package cool.klass.projection.service");
    assert_eq!(*file.package.inner(), "cool.klass.projection.service");
}

#[test]
fn test_comments_are_ignored() {
    let file = parse_ok(
        "// leading comment\npackage a /* inline */\n\nenumeration Status { OPEN, // open\n CLOSED }",
    );
    assert_eq!(file.declarations.len(), 1);
}

#[test]
fn test_enumeration() {
    let Declaration::Enumeration(enumeration) =
        only_declaration(r#"package a enumeration Status { OPEN("Open"), CLOSED, }"#)
    else {
        panic!("expected enumeration");
    };

    assert_eq!(*enumeration.name.inner(), "Status");
    assert_eq!(enumeration.literals.len(), 2);
    assert_eq!(
        enumeration.literals[0].pretty_name.as_ref().map(|p| p.inner().as_str()),
        Some("Open")
    );
    assert!(enumeration.literals[1].pretty_name.is_none());
}

#[test]
fn test_classifier_header() {
    let classifier = only_classifier(
        "package a class Question extends Post implements Document, Owned systemTemporal versioned audited { }",
    );

    assert_eq!(*classifier.kind.inner(), ClassifierKind::Class);
    assert_eq!(
        classifier.superclass.as_ref().map(|s| *s.inner()),
        Some("Post".into())
    );
    assert_eq!(classifier.interfaces.len(), 2);
    let modifiers: Vec<ClassModifier> = classifier.modifiers.iter().map(|m| *m.inner()).collect();
    assert_eq!(
        modifiers,
        vec![
            ClassModifier::SystemTemporal,
            ClassModifier::Versioned,
            ClassModifier::Audited
        ]
    );
}

#[test]
fn test_user_and_interface_kinds() {
    let file = parse_ok("package a user User { userId: String key userId; } interface Document { }");
    let kinds: Vec<ClassifierKind> = file
        .declarations
        .iter()
        .filter_map(|declaration| match declaration {
            Declaration::Classifier(classifier) => Some(*classifier.kind.inner()),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![ClassifierKind::User, ClassifierKind::Interface]);
}

#[test]
fn test_data_type_property() {
    let classifier = only_classifier(
        "package a class Question { title: String? maxLength(256) minLength(1) private key; }",
    );

    let MemberDecl::DataType(property) = &classifier.members[0] else {
        panic!("expected data type property");
    };
    assert_eq!(*property.name.inner(), "title");
    assert_eq!(*property.type_name.inner(), "String");
    assert!(property.optional);
    let modifiers: Vec<PropertyModifier> = property.modifiers.iter().map(|m| *m.inner()).collect();
    assert_eq!(modifiers, vec![PropertyModifier::Private, PropertyModifier::Key]);
    assert_eq!(property.validations.len(), 2);
    assert_eq!(property.validations[0].kind, ValidationKind::MaxLength);
    assert_eq!(*property.validations[0].value.inner(), 256);
}

#[test]
fn test_association_end_signature_member() {
    let classifier = only_classifier(
        "package a class Question { answers: Answer[0..*] owned orderBy: this.id descending; }",
    );

    let MemberDecl::AssociationEndSignature(end) = &classifier.members[0] else {
        panic!("expected association end signature");
    };
    assert_eq!(
        *end.multiplicity.inner(),
        MultiplicityDecl {
            lower: 0,
            upper: None
        }
    );
    assert_eq!(
        end.modifiers.iter().map(|m| *m.inner()).collect::<Vec<_>>(),
        vec![AssociationEndModifier::Owned]
    );
    let order_by = end.order_by.as_ref().expect("order by");
    assert_eq!(
        order_by.members[0].direction.as_ref().map(|d| *d.inner()),
        Some(SortDirection::Descending)
    );
}

#[test]
fn test_parameterized_property() {
    let classifier = only_classifier(
        "package a class Question { answersByStatus(status: Status[1..1]): Answer[0..*] { this.id == Answer.questionId && Answer.status == status } }",
    );

    let MemberDecl::Parameterized(property) = &classifier.members[0] else {
        panic!("expected parameterized property");
    };
    assert_eq!(property.parameters.len(), 1);
    assert_eq!(*property.parameters[0].name.inner(), "status");
    let CriteriaDecl::And(left, right) = &property.criteria else {
        panic!("expected conjunction");
    };
    assert!(matches!(
        left.as_ref(),
        CriteriaDecl::Operator {
            source: ExpressionDecl::ThisPath(_),
            target: ExpressionDecl::TypePath(_),
            ..
        }
    ));
    assert!(matches!(
        right.as_ref(),
        CriteriaDecl::Operator {
            target: ExpressionDecl::Variable(_),
            ..
        }
    ));
}

#[test]
fn test_association() {
    let Declaration::Association(association) = only_declaration(
        "package a association QuestionHasAnswers { question: Question[1..1]; answers: Answer[0..*] owned; relationship this.id == Answer.questionId }",
    ) else {
        panic!("expected association");
    };

    assert_eq!(association.ends.len(), 2);
    assert_eq!(*association.ends[1].name.inner(), "answers");
    assert!(matches!(
        association.relationship,
        CriteriaDecl::Operator { .. }
    ));
}

#[test]
fn test_association_accepts_any_end_count() {
    let Declaration::Association(association) = only_declaration(
        "package a association Lonely { only: Question[0..1]; relationship all; }",
    ) else {
        panic!("expected association");
    };
    assert_eq!(association.ends.len(), 1);
    assert!(matches!(association.relationship, CriteriaDecl::All(_)));
}

#[test]
fn test_criteria_precedence() {
    let classifier = only_classifier(
        "package a class A { p(x: Long[1..1]): B[0..*] { this.a == 1 || this.b == 2 && this.c == 3 } }",
    );
    let MemberDecl::Parameterized(property) = &classifier.members[0] else {
        panic!("expected parameterized property");
    };

    let CriteriaDecl::Or(_, right) = &property.criteria else {
        panic!("`||` should bind loosest");
    };
    assert!(matches!(right.as_ref(), CriteriaDecl::And(_, _)));
}

#[test]
fn test_criteria_grouping_and_literal_lists() {
    let classifier = only_classifier(
        r#"package a class A { p(): B[0..*] { (this.a == 1 || this.b == 2) && this.s in ("x", "y") } }"#,
    );
    let MemberDecl::Parameterized(property) = &classifier.members[0] else {
        panic!("expected parameterized property");
    };

    let CriteriaDecl::And(left, right) = &property.criteria else {
        panic!("expected conjunction");
    };
    assert!(matches!(left.as_ref(), CriteriaDecl::Or(_, _)));
    let CriteriaDecl::Operator {
        operator, target, ..
    } = right.as_ref()
    else {
        panic!("expected operator");
    };
    assert_eq!(*operator.inner(), Operator::In);
    let ExpressionDecl::LiteralList(list) = target else {
        panic!("expected literal list");
    };
    assert_eq!(list.inner().len(), 2);
}

#[test]
fn test_edge_point_and_special_values() {
    let service = only_service(
        "package a service Question { /question/{id: Long[1..1]} GET { version: this.system equalsEdgePoint && this.createdById == user; validate: this.title != null; } }",
    );

    assert_eq!(service.criteria.len(), 2);
    let CriteriaDecl::And(left, right) = &service.criteria[0].criteria else {
        panic!("expected conjunction");
    };
    assert!(matches!(left.as_ref(), CriteriaDecl::EdgePoint { .. }));
    assert!(matches!(
        right.as_ref(),
        CriteriaDecl::Operator {
            target: ExpressionDecl::User(_),
            ..
        }
    ));
    assert!(matches!(
        &service.criteria[1].criteria,
        CriteriaDecl::Operator {
            target: ExpressionDecl::Null(_),
            ..
        }
    ));
}

#[test]
fn test_edge_point_requires_path() {
    let err = parse_err(
        "package a class A { p(v: Long[1..1]): B[0..*] { v equalsEdgePoint } }",
    );
    assert_eq!(err.code(), Some(AnnotationCode::ErrSynTok));
    assert!(err.message().contains("member path"));
}

#[test]
fn test_projection() {
    let Declaration::Projection(projection) = only_declaration(
        r#"package a projection QuestionProjection on Question { title: "Title", answers: { body: "Body", }, author: UserProjection, }"#,
    ) else {
        panic!("expected projection");
    };

    assert_eq!(*projection.class_name.inner(), "Question");
    assert_eq!(projection.members.len(), 3);
    assert!(matches!(
        projection.members[0].body,
        ProjectionBodyDecl::Header(_)
    ));
    let ProjectionBodyDecl::Children(children) = &projection.members[1].body else {
        panic!("expected children");
    };
    assert_eq!(children.len(), 1);
    assert!(matches!(
        projection.members[2].body,
        ProjectionBodyDecl::Projection(_)
    ));
}

#[test]
fn test_service_group() {
    let Declaration::Service(group) = only_declaration(
        "package a service Question
        {
            /question/{id: Long[1..1]}
                GET { criteria: this.id == id; projection: QuestionProjection; }
                DELETE { criteria: this.id == id; projection: QuestionProjection; }
            /question?{title: String[0..1]}&{status: Status[0..*]}
                GET { multiplicity: many; criteria: this.title == title; projection: QuestionProjection; orderBy: this.id; }
        }",
    ) else {
        panic!("expected service group");
    };

    assert_eq!(*group.class_name.inner(), "Question");
    assert_eq!(group.urls.len(), 2);
    assert_eq!(group.urls[0].normalized_path(), "/question/{}");
    assert_eq!(group.urls[0].services.len(), 2);
    assert_eq!(*group.urls[0].services[1].verb.inner(), Verb::Delete);
    assert_eq!(group.urls[1].query.len(), 2);

    let search = &group.urls[1].services[0];
    assert_eq!(
        search.multiplicity.as_ref().map(|m| *m.inner()),
        Some(ServiceMultiplicity::Many)
    );
    assert_eq!(
        *search.criteria[0].keyword.inner(),
        CriteriaKeyword::Criteria
    );
    assert!(search.order_by.is_some());
    assert!(search.projection.is_some());
}

#[test]
fn test_url_segments_must_touch_slash() {
    let err = parse_err(
        "package a service Question { / question GET { projection: P; } }",
    );
    assert_eq!(err.code(), Some(AnnotationCode::ErrSynTok));
    assert!(err.message().contains("URL segment"));
}

#[test]
fn test_url_requires_verb() {
    let err = parse_err("package a service Question { /question }");
    assert_eq!(err.code(), Some(AnnotationCode::ErrSynTok));
    assert!(err.message().contains("verb"), "{}", err.message());
}

#[test]
fn test_duplicate_service_entry_is_syntax_error() {
    let err = parse_err(
        "package a service Question { /question GET { projection: P; projection: Q; } }",
    );
    assert_eq!(err.code(), Some(AnnotationCode::ErrSynTok));
}

#[test]
fn test_missing_semicolon_points_at_next_token() {
    let source = "package a class Question { title: String\n  body: String; }";
    let err = parse_err(source);

    assert_eq!(err.code(), Some(AnnotationCode::ErrSynTok));
    let span = err.primary_span().expect("primary span");
    assert_eq!(&source[span.range()], "body");
    assert!(err.message().contains("`;`"), "{}", err.message());
}

#[test]
fn test_unexpected_end_of_input() {
    let err = parse_err("package a class Question { title: String;");
    assert_eq!(err.code(), Some(AnnotationCode::ErrSynEof));
    assert!(err.message().contains("`}`"), "{}", err.message());
}

#[test]
fn test_unknown_declaration() {
    let source = "package a widget Foo { }";
    let err = parse_err(source);
    let span = err.primary_span().expect("primary span");
    assert_eq!(&source[span.range()], "widget");
    assert!(err.message().contains("declaration"));
}

#[test]
fn test_missing_package() {
    let err = parse_err("class Question { }");
    assert_eq!(err.code(), Some(AnnotationCode::ErrSynTok));
    assert!(err.message().contains("`package`"));
}

#[test]
fn test_invalid_multiplicity_bound() {
    let err = parse_err("package a class A { b: B[0..x]; }");
    assert!(err.message().contains("upper bound"));
}

#[test]
fn test_build_members_fragment() {
    let tokens = lexer::tokenize(
        "validFrom: TemporalInstant? valid from;\nvalidTo: TemporalInstant? valid to;",
    )
    .expect("lexer should succeed");
    let members = parser::build_members(&tokens).expect("members should parse");
    assert_eq!(members.len(), 2);
    assert_eq!(*members[1].name().inner(), "validTo");
}

#[test]
fn test_build_service_criteria_fragment() {
    let tokens = lexer::tokenize("conflict: this.version.number == version;")
        .expect("lexer should succeed");
    let criteria = parser::build_service_criteria(&tokens).expect("criteria should parse");
    assert_eq!(criteria.len(), 1);
    assert_eq!(*criteria[0].keyword.inner(), CriteriaKeyword::Conflict);
}

#[test]
fn test_declaration_spans_cover_braces() {
    let source = "package a\nenumeration Status { OPEN }\n";
    let file = parse_ok(source);
    let span = file.declarations[0].span();
    assert_eq!(&source[span.range()], "enumeration Status { OPEN }");
}
