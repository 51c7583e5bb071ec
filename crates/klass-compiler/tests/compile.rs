use klass_compiler::{
    CompileOptions, SourceUnit, compile, compile_with, error::AnnotationCode, parse,
};
use klass_core::{
    identifier::Id,
    model::{
        ClassModifier, ClassifierKind, CriteriaKeyword, ServiceMultiplicity, SortDirection, Verb,
    },
};

const QA: &str = r#"
package com.example.qa

enumeration Status
{
    OPEN("Open"),
    CLOSED("Closed"),
}

user User
{
    userId: String key userId maxLength(128);
}

class Answer
{
    id: Long key id;
    questionId: Long final;
    status: Status;
    body: String maxLength(4000);
}

class Question systemTemporal versioned audited
{
    id: Long key id min(1) max(9999999);
    title: String maxLength(256);
    status: Status;
    answersByStatus(status: Status[1..1]): Answer[0..*] { this.id == Answer.questionId && Answer.status == status }
}

association QuestionHasAnswers
{
    question: Question[1..1] final;
    answers: Answer[0..*] owned orderBy: this.id descending;

    relationship this.id == Answer.questionId
}

projection AnswerProjection on Answer
{
    body: "Body",
}

projection QuestionProjection on Question
{
    title: "Title",
    status: "Status",
    answers: AnswerProjection,
}

service Question
{
    /question/{id: Long[1..1]}
        GET { criteria: this.id == id; projection: QuestionProjection; }
    /question/{id: Long[1..1]}/{version: Integer[1..1]}
        GET { criteria: this.id == id; projection: QuestionProjection; }
        PUT { criteria: this.id == id; projection: QuestionProjection; }
    /question?{title: String[0..1]}
        GET { multiplicity: many; criteria: this.title == title; projection: QuestionProjection; orderBy: this.id; }
}
"#;

fn qa() -> SourceUnit {
    SourceUnit::new("models/qa.klass", QA)
}

fn codes(source: &str) -> Vec<AnnotationCode> {
    compile([SourceUnit::new("test.klass", source)])
        .diagnostics()
        .iter()
        .filter_map(|diagnostic| diagnostic.code())
        .collect()
}

#[test]
fn test_question_and_answer_model() {
    let result = compile([qa()]);
    assert!(result.diagnostics().is_empty(), "{:#?}", result.diagnostics());

    let model = result.into_result().expect("model should build");
    assert!(!model.is_empty());
    assert_eq!(model.enumerations().len(), 1);
    let names: Vec<String> = model
        .classifiers()
        .iter()
        .map(|classifier| classifier.name().to_string())
        .collect();
    assert_eq!(names, ["User", "Answer", "Question", "QuestionVersion"]);
    assert!(model.find_association("QuestionHasAnswers").is_some());
    assert!(model.find_association("QuestionHasVersion").is_some());
    assert_eq!(model.projections().len(), 2);
    assert_eq!(model.service_groups().len(), 1);

    let user = model.find_classifier("User").unwrap();
    assert_eq!(user.kind(), ClassifierKind::User);
    let question = model.find_classifier("Question").unwrap();
    assert_eq!(question.package(), Id::new("com.example.qa"));
    assert_eq!(question.parameterized_properties().len(), 1);
}

#[test]
fn test_version_class_copies_key_validations() {
    let model = compile([qa()]).into_result().unwrap();
    let question = model.find_classifier("Question").unwrap();
    let version_id = question.version_class().expect("version class should be linked");
    let version = model.classifier(version_id);

    assert!(version.is_inferred());
    assert!(version.has_modifier(ClassModifier::SystemTemporal));
    assert!(version.has_modifier(ClassModifier::Audited));
    let key = version.property(Id::new("id")).unwrap();
    assert!(key.is_key());
    assert_eq!(key.validations().minimum, Some(1));
    assert_eq!(key.validations().maximum, Some(9999999));
    assert!(version.property(Id::new("number")).is_some());
}

#[test]
fn test_audit_properties_copy_user_id_length() {
    let model = compile([qa()]).into_result().unwrap();
    let question = model.find_classifier("Question").unwrap();

    for name in ["createdById", "lastUpdatedById"] {
        let property = question.property(Id::new(name)).unwrap();
        assert!(property.is_inferred());
        assert!(property.is_private());
        assert_eq!(property.validations().max_length, Some(128));
    }
    assert!(question.property(Id::new("createdOn")).is_some());
}

#[test]
fn test_temporal_properties_are_inferred() {
    let model = compile([qa()]).into_result().unwrap();
    let question = model.find_classifier("Question").unwrap();
    for name in ["system", "systemFrom", "systemTo"] {
        assert!(question.property(Id::new(name)).is_some(), "missing {name}");
    }
    assert!(question.property(Id::new("valid")).is_none());
}

#[test]
fn test_service_inference() {
    let model = compile([qa()]).into_result().unwrap();
    let group = &model.service_groups()[0];
    let urls = group.urls();
    assert_eq!(urls.len(), 3);

    let by_id = &urls[0].services()[0];
    assert_eq!(by_id.verb(), Verb::Get);
    assert_eq!(by_id.multiplicity(), ServiceMultiplicity::One);
    assert!(by_id.is_multiplicity_inferred());
    assert!(by_id.criteria_for(CriteriaKeyword::Version).is_none());

    let versioned_get = &urls[1].services()[0];
    let version = versioned_get
        .criteria_for(CriteriaKeyword::Version)
        .expect("version criteria should be inferred");
    assert!(version.is_inferred());

    let versioned_put = &urls[1].services()[1];
    assert_eq!(versioned_put.verb(), Verb::Put);
    assert!(versioned_put.criteria_for(CriteriaKeyword::Conflict).is_some());

    let by_title = &urls[2].services()[0];
    assert_eq!(by_title.multiplicity(), ServiceMultiplicity::Many);
    assert!(!by_title.is_multiplicity_inferred());
    let order_by = by_title.order_by().unwrap();
    assert_eq!(order_by.members()[0].direction(), SortDirection::Ascending);
    assert!(order_by.members()[0].is_direction_inferred());
}

#[test]
fn test_association_end_order_by_and_foreign_key() {
    let model = compile([qa()]).into_result().unwrap();
    let association = model.find_association("QuestionHasAnswers").unwrap();
    assert_eq!(association.foreign_keys().len(), 1);

    let answers = model.association_end(association.target_end());
    assert_eq!(answers.name(), Id::new("answers"));
    assert!(answers.is_owned());
    let order_by = answers.order_by().unwrap();
    assert_eq!(order_by.members()[0].direction(), SortDirection::Descending);
    assert!(!order_by.members()[0].is_direction_inferred());

    let foreign = model.property(association.foreign_keys()[0].foreign());
    assert_eq!(foreign.name(), Id::new("questionId"));
}

#[test]
fn test_compilation_is_deterministic() {
    let first = compile([qa()]);
    let second = compile([qa()]);
    assert_eq!(first.diagnostics(), second.diagnostics());
    assert_eq!(first.model(), second.model());

    let broken = "package qa\nclass A { name: Strin; }\nclass A { other: Lng; }";
    let first = compile([SourceUnit::new("a.klass", broken)]);
    let second = compile([SourceUnit::new("a.klass", broken)]);
    assert_eq!(first.diagnostics(), second.diagnostics());
}

#[test]
fn test_unresolved_path_stops_at_first_segment() {
    let source = "package qa\nclass A\n{\n    id: Long key id;\n    \
        byX(x: Long[1..1]): A[0..*] { this.missing.id == x }\n}";
    let result = compile([SourceUnit::new("a.klass", source)]);
    let diagnostics = result.diagnostics();
    assert_eq!(diagnostics.len(), 1, "{diagnostics:#?}");

    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.code(), Some(AnnotationCode::ErrPthEnd));
    let location = diagnostic.location().unwrap();
    assert_eq!((location.line(), location.column()), (5, 40));
    assert!(result.model().is_none());
}

#[test]
fn test_unknown_property_type_is_positioned() {
    let result = compile([SourceUnit::new(
        "dir/a.klass",
        "package qa\nclass A { id: Long key id; title: Strin; }",
    )]);
    let diagnostic = &result.diagnostics()[0];
    assert_eq!(diagnostic.code(), Some(AnnotationCode::ErrPrpTyp));

    let location = diagnostic.location().unwrap();
    assert_eq!(location.source_name(), "dir/a.klass");
    assert_eq!(location.file_name(), "a.klass");
    assert_eq!((location.line(), location.column()), (2, 35));
}

#[test]
fn test_missing_key_and_unknown_type() {
    let result = compile([SourceUnit::new("a.klass", "package qa\nclass A { name: Strin; }")]);
    let mut codes: Vec<AnnotationCode> = result
        .diagnostics()
        .iter()
        .filter_map(|diagnostic| diagnostic.code())
        .collect();
    codes.dedup();

    assert!(codes.contains(&AnnotationCode::ErrClsKey));
    assert!(codes.contains(&AnnotationCode::ErrPrpTyp));
    assert!(result.model().is_none());
}

#[test]
fn test_duplicate_declaration_in_one_unit() {
    let source = "package qa\n\
        enumeration Status { OPEN, }\n\
        enumeration Status { CLOSED, }\n\
        class A { id: Long key id; status: Status; }";
    let codes = codes(source);
    assert_eq!(codes, [AnnotationCode::ErrDupTop]);
}

#[test]
fn test_duplicate_declaration_across_units_is_ambiguous() {
    let result = compile([
        SourceUnit::new("a.klass", "package qa\nenumeration Status { OPEN, }"),
        SourceUnit::new("b.klass", "package qa\nenumeration Status { CLOSED, }"),
        SourceUnit::new("c.klass", "package qa\nclass A { id: Long key id; status: Status; }"),
    ]);
    let diagnostics = result.diagnostics();
    let duplicates = diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.code() == Some(AnnotationCode::ErrDupTop))
        .count();
    assert_eq!(duplicates, 1);

    let ambiguous = diagnostics
        .iter()
        .find(|diagnostic| diagnostic.code() == Some(AnnotationCode::ErrPrpTyp))
        .expect("ambiguous type should be reported");
    assert!(ambiguous.message().contains("more than one source"));
    assert_eq!(ambiguous.location().unwrap().unit(), 2);
}

#[test]
fn test_audited_class_without_user_id() {
    let codes = codes("package qa\nclass A audited { id: Long key id; }");
    assert_eq!(codes, [AnnotationCode::ErrAudUid]);
}

#[test]
fn test_inheritance_errors() {
    let codes = codes(
        "package qa\n\
         class A extends B { id: Long key id; }\n\
         class B extends A { }",
    );
    assert!(codes.contains(&AnnotationCode::ErrCycInh));
    assert!(!codes.contains(&AnnotationCode::ErrClsKey));
}

#[test]
fn test_service_errors() {
    let source = "package qa\n\
        class A { id: Long key id; name: String; }\n\
        projection AP on A { name: \"Name\", }\n\
        service A\n\
        {\n\
            /a?{name: String[0..1]}\n\
                DELETE { criteria: this.name == name; projection: AP; }\n\
                POST { criteria: this.name == name; projection: AP; }\n\
        }";
    let codes = codes(source);
    assert!(codes.contains(&AnnotationCode::ErrSerMul), "{codes:?}");
    assert!(codes.contains(&AnnotationCode::ErrVrbCrt), "{codes:?}");
}

#[test]
fn test_projection_errors() {
    let source = "package qa\n\
        class A { id: Long key id; name: String; }\n\
        projection AP on A { name: \"Name\", name: \"Again\", missing: \"Missing\", id: { }, }\n\
        projection BP on B { }";
    let codes = codes(source);
    assert_eq!(
        codes,
        [
            AnnotationCode::ErrDupPrj,
            AnnotationCode::ErrPaeNfd,
            AnnotationCode::ErrPrjDtp,
            AnnotationCode::ErrPrjTyp,
        ]
    );
}

#[test]
fn test_operator_type_mismatch() {
    let source = "package qa\n\
        class A\n\
        {\n\
            id: Long key id;\n\
            byName(name: String[1..1]): A[0..*] { this.id == name }\n\
        }";
    assert_eq!(codes(source), [AnnotationCode::ErrOprTyp]);
}

#[test]
fn test_warnings_do_not_block_the_model() {
    let source = "package qa\nclass A { id: Long key id; secret: String private; }";
    let result = compile([SourceUnit::new("a.klass", source)]);
    assert_eq!(result.warnings().count(), 1);
    assert!(result.model().is_some());

    let strict = compile_with(
        [SourceUnit::new("a.klass", source)],
        CompileOptions {
            warnings_as_errors: true,
            ..CompileOptions::default()
        },
    );
    assert!(strict.model().is_none());
    assert_eq!(strict.into_result().unwrap_err().error_count(), 1);
}

#[test]
fn test_lexer_errors_block_the_model() {
    let result = compile([
        qa(),
        SourceUnit::new("bad.klass", "package qa\nclass A { name: String @ }"),
    ]);
    assert!(result.has_errors());
    assert!(result.model().is_none());
    assert_eq!(result.diagnostics()[0].location().unwrap().unit(), 1);
}

#[test]
fn test_pre_parsed_unit() {
    let file = parse(QA).expect("fixture should parse");
    let result = compile([SourceUnit::with_syntax("qa.klass", QA, file)]);
    assert!(!result.has_errors());
    assert_eq!(result.model(), compile([qa()]).model());
}

#[test]
fn test_sorted_diagnostics_across_units() {
    let result = compile([
        SourceUnit::new(
            "a.klass",
            "package qa\nclass A { id: Long key id; hidden: String private; }",
        ),
        SourceUnit::new("b.klass", "package qa\nclass B { name: Strin; }"),
    ]);
    let sorted = result.sorted_diagnostics();
    assert!(sorted.first().unwrap().severity().is_error());
    assert!(sorted.last().unwrap().severity().is_warning());
    assert_eq!(sorted.last().unwrap().code(), Some(AnnotationCode::WrnPrvUnr));
}

#[test]
fn test_unresolved_version_key_is_reported_once() {
    let result = compile([SourceUnit::new(
        "a.klass",
        "package qa\nclass A versioned { id: Strin key id; }",
    )]);
    let diagnostics = result.diagnostics();
    assert_eq!(diagnostics.len(), 1, "{diagnostics:#?}");
    assert_eq!(diagnostics[0].code(), Some(AnnotationCode::ErrPrpTyp));
    assert!(diagnostics[0].message().contains("`A.id`"));
}

#[test]
fn test_redeclared_versioned_class_gets_one_version_class() {
    let source = "package qa\n\
        class A versioned { id: Long key id; }\n\
        class A versioned { id: Long key id; }";
    let result = compile([SourceUnit::new("a.klass", source)]);
    let diagnostics = result.diagnostics();
    assert_eq!(diagnostics.len(), 1, "{diagnostics:#?}");
    assert_eq!(diagnostics[0].code(), Some(AnnotationCode::ErrDupTop));
    assert_eq!(diagnostics[0].message(), "duplicate top level classifier name `A`");
    assert_eq!(diagnostics[0].location().unwrap().line(), 3);
}

#[test]
fn test_temporal_property_errors() {
    let source = "package qa\n\
        class A\n\
        {\n\
            id: Long key id;\n\
            range: Instant valid;\n\
            start: TemporalInstant from;\n\
            stop: Instant system to;\n\
            both: TemporalInstant valid from to;\n\
        }";
    assert_eq!(
        codes(source),
        [
            AnnotationCode::ErrTmpRng,
            AnnotationCode::ErrTmpSys,
            AnnotationCode::ErrTmpIns,
            AnnotationCode::ErrTmpFto,
        ]
    );
}

#[test]
fn test_audit_property_errors() {
    let source = "package qa\n\
        user User { userId: String key userId; }\n\
        class A\n\
        {\n\
            id: Long key id;\n\
            author: Long createdBy;\n\
            created: Instant createdOn;\n\
            editor: String private lastUpdatedBy;\n\
        }";
    assert_eq!(
        codes(source),
        [
            AnnotationCode::ErrAudDtp,
            AnnotationCode::ErrAudPri,
            AnnotationCode::WrnCrtNam,
            AnnotationCode::ErrConFin,
            AnnotationCode::WrnLubNam,
        ]
    );
}

#[test]
fn test_user_id_must_be_a_key() {
    let codes = codes("package qa\nuser User { id: Long key id; userId: String userId; }");
    assert!(codes.contains(&AnnotationCode::ErrAudKey), "{codes:?}");
}

/// Question and Answer joined through `Answer.questionId`.
fn question_has_answers(question_id: &str, question_end: &str, answers_end: &str) -> String {
    format!(
        "package qa\n\
         class Question {{ id: Long key id; title: String; }}\n\
         class Answer {{ id: Long key id; {question_id}; body: String; }}\n\
         association QuestionHasAnswers\n\
         {{\n\
             {question_end};\n\
             {answers_end};\n\
             relationship this.id == Answer.questionId\n\
         }}"
    )
}

#[test]
fn test_association_baseline_is_clean() {
    let source = question_has_answers(
        "questionId: Long",
        "question: Question[1..1]",
        "answers: Answer[0..*]",
    );
    assert!(codes(&source).is_empty());
}

#[test]
fn test_foreign_key_multiplicity() {
    let optional_key = question_has_answers(
        "questionId: Long?",
        "question: Question[1..1]",
        "answers: Answer[0..*]",
    );
    assert_eq!(codes(&optional_key), [AnnotationCode::ErrForMul]);

    let optional_end = question_has_answers(
        "questionId: Long",
        "question: Question[0..1]",
        "answers: Answer[0..*]",
    );
    let result = compile([SourceUnit::new("a.klass", optional_end)]);
    let warnings: Vec<_> = result.warnings().filter_map(|warning| warning.code()).collect();
    assert_eq!(warnings, [AnnotationCode::WrnForMul]);
    assert!(result.model().is_some());
}

#[test]
fn test_association_end_errors() {
    let bad_multiplicity = question_has_answers(
        "questionId: Long",
        "question: Question[1..1]",
        "answers: Answer[2..3]",
    );
    let found = codes(&bad_multiplicity);
    assert!(found.contains(&AnnotationCode::ErrAsoMul), "{found:?}");

    let ordered_to_one = question_has_answers(
        "questionId: Long",
        "question: Question[1..1] orderBy: this.id",
        "answers: Answer[0..*]",
    );
    let found = codes(&ordered_to_one);
    assert!(found.contains(&AnnotationCode::ErrRefOrd), "{found:?}");

    let lonely = "package qa\n\
        class A { id: Long key id; }\n\
        association Lonely\n\
        {\n\
            a: A[1..1];\n\
            relationship this.id == A.id\n\
        }";
    assert_eq!(codes(lonely), [AnnotationCode::ErrAsoEnd]);
}

#[test]
fn test_relationship_without_foreign_key() {
    let source = "package qa\n\
        class Question { id: Long key id; title: String; }\n\
        class Answer { id: Long key id; body: String; }\n\
        association QuestionHasAnswers\n\
        {\n\
            question: Question[1..1];\n\
            answers: Answer[0..*];\n\
            relationship this.title == Answer.body\n\
        }";
    assert_eq!(codes(source), [AnnotationCode::ErrRelFky]);
}

/// A class with one finder whose criteria is `criteria`.
fn finder(criteria: &str) -> String {
    format!(
        "package qa\n\
         class A\n\
         {{\n\
             id: Long key id;\n\
             name: String;\n\
             byX(x: Long[1..1]): A[0..*] {{ {criteria} }}\n\
         }}"
    )
}

#[test]
fn test_criteria_errors() {
    assert_eq!(codes(&finder("this.id == y")), [AnnotationCode::ErrVarRef]);
    assert_eq!(codes(&finder("this.id in x")), [AnnotationCode::ErrOprIn]);
    assert_eq!(
        codes(&finder("this.id equalsEdgePoint && this.id == x")),
        [AnnotationCode::ErrEdgPnt]
    );
    assert_eq!(codes(&finder("this.name == user")), [AnnotationCode::ErrUsrLit]);

    assert!(codes(&finder("this.id in (1, 2) && this.id == x")).is_empty());
}

#[test]
fn test_projection_member_inherited_from_two_interfaces() {
    let source = "package qa\n\
        interface Named { name: String; }\n\
        interface Titled { name: String; }\n\
        class A implements Named, Titled { id: Long key id; }\n\
        projection AP on A { name: \"Name\", }";
    let codes = codes(source);
    assert!(codes.contains(&AnnotationCode::ErrPaeAmb), "{codes:?}");
}

#[test]
fn test_repeated_projection_members_keep_the_first() {
    let source = "package qa\n\
        class A { id: Long key id; name: String; }\n\
        projection AP on A\n\
        {\n\
            name: \"Name\",\n\
            name: { },\n\
            name: \"Third\",\n\
        }";
    let result = compile([SourceUnit::new("a.klass", source)]);
    let diagnostics = result.diagnostics();
    let found: Vec<_> = diagnostics.iter().filter_map(|d| d.code()).collect();
    // The nested body on the second member is never checked.
    assert_eq!(found, [AnnotationCode::ErrDupPrj, AnnotationCode::ErrDupPrj]);
    let lines: Vec<usize> = diagnostics
        .iter()
        .map(|diagnostic| diagnostic.location().unwrap().line())
        .collect();
    assert_eq!(lines, [6, 7]);
}

#[test]
fn test_member_and_validation_errors() {
    assert_eq!(
        codes("package qa\nclass A { id: Long key id; name: String; name: Long; }"),
        [AnnotationCode::ErrDupMem]
    );
    assert_eq!(
        codes("package qa\nclass A { id: Long key id; name: String minLength(10) maxLength(5); }"),
        [AnnotationCode::ErrValRng]
    );
}
