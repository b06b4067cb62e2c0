//! End-to-end audits: YAML specification in, ranked result out.

use rust_decimal::Decimal;

use reqsolve_core::{
    CourseInstance, Exception, Grade, MulticountableSet, Rank, RequirementContext, RulePath,
};
use reqsolve_rules::{Rule, SpecLoader};
use reqsolve_solver::{estimate, find_best_solution, SolveOutcome};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn course(clbid: &str, subject: &str, number: &str) -> CourseInstance {
    CourseInstance::new(clbid, format!("c-{}-{}", subject, number), subject, number)
}

fn load(source: &str) -> Rule {
    SpecLoader::new().load_str(source).unwrap()
}

#[test]
fn test_all_of_two_with_full_transcript() {
    init_tracing();
    let rule = load("all: [{course: CSCI 251}, {course: CSCI 252}]");
    let ctx = RequirementContext::new(
        vec![course("1", "CSCI", "251"), course("2", "CSCI", "252")],
        vec![],
    );

    let SolveOutcome::Satisfied(audit) = find_best_solution(&rule, &ctx) else {
        panic!("expected a passing result");
    };
    assert!(audit.result.ok());
    assert_eq!(audit.result.rank(), audit.result.max_rank());
    assert_eq!(audit.result.claims().len(), 2);
}

#[test]
fn test_all_of_two_with_half_transcript() {
    init_tracing();
    let rule = load("all: [{course: CSCI 251}, {course: CSCI 252}]");
    let ctx = RequirementContext::new(vec![course("1", "CSCI", "251")], vec![]);

    let SolveOutcome::BestEffort(audit) = find_best_solution(&rule, &ctx) else {
        panic!("expected a best-effort result");
    };
    assert!(!audit.result.ok());
    assert_eq!(audit.result.rank(), Rank::ONE);
    assert_eq!(audit.result.max_rank(), Rank::of(2));
    assert_eq!(audit.result.claims().len(), 1);
}

#[test]
fn test_query_claims_only_matching_courses() {
    init_tracing();
    let rule = load(
        "{from: courses, where: {subject: {$eq: CSCI}}, \
         assert: {'count(courses)': {$gte: 2}}}",
    );
    let ctx = RequirementContext::new(
        vec![
            course("1", "CSCI", "251"),
            course("2", "CSCI", "252"),
            course("3", "ART", "102"),
        ],
        vec![],
    );

    let SolveOutcome::Satisfied(audit) = find_best_solution(&rule, &ctx) else {
        panic!("expected a passing result");
    };
    let claims = audit.result.claims();
    assert_eq!(claims.len(), 2);
    assert!(claims.iter().all(|c| c.course_code.starts_with("CSCI")));
    // Only viable subset sizes were enumerated: the single pair.
    assert_eq!(audit.iterations, 1);
}

#[test]
fn test_one_course_cannot_satisfy_two_rules() {
    init_tracing();
    let rule = load("both: [{course: CSCI 251}, {course: CSCI 251}]");
    let ctx = RequirementContext::new(vec![course("1", "CSCI", "251")], vec![]);

    let SolveOutcome::BestEffort(audit) = find_best_solution(&rule, &ctx) else {
        panic!("expected a best-effort result");
    };
    assert!(!audit.result.ok());
    // The first claim lands, the second conflicts.
    assert_eq!(audit.result.claims().len(), 1);
}

#[test]
fn test_multicountable_lets_requirements_share_a_course() {
    init_tracing();
    let rule = load(
        "requirements:\n\
         \x20 A:\n\
         \x20   result: {course: CSCI 251}\n\
         \x20 B:\n\
         \x20   result: {course: CSCI 251}\n\
         result:\n\
         \x20 all:\n\
         \x20   - requirement: A\n\
         \x20   - requirement: B\n",
    );
    let mut multicountable = MulticountableSet::new();
    multicountable.register(
        "CSCI 251",
        vec![vec!["A".to_string()], vec!["B".to_string()]],
    );
    let ctx = RequirementContext::new(vec![course("1", "CSCI", "251")], vec![])
        .with_multicountable(multicountable);

    let SolveOutcome::Satisfied(audit) = find_best_solution(&rule, &ctx) else {
        panic!("expected a passing result");
    };
    assert_eq!(audit.result.claims().len(), 2);
}

#[test]
fn test_without_multicountable_sharing_fails() {
    init_tracing();
    let rule = load(
        "requirements:\n\
         \x20 A:\n\
         \x20   result: {course: CSCI 251}\n\
         \x20 B:\n\
         \x20   result: {course: CSCI 251}\n\
         result:\n\
         \x20 all:\n\
         \x20   - requirement: A\n\
         \x20   - requirement: B\n",
    );
    let ctx = RequirementContext::new(vec![course("1", "CSCI", "251")], vec![]);
    assert!(!find_best_solution(&rule, &ctx).is_satisfied());
}

#[test]
fn test_forced_pass_override() {
    init_tracing();
    let rule = load("course: CSCI 999");
    let ctx = RequirementContext::new(vec![], vec![]).with_exceptions(vec![Exception::Override {
        path: RulePath::root(),
    }]);

    let SolveOutcome::Satisfied(audit) = find_best_solution(&rule, &ctx) else {
        panic!("expected a passing result");
    };
    // Nothing was claimed; the node passed by override alone.
    assert!(audit.result.claims().is_empty());
}

#[test]
fn test_gpa_assertion_truncates() {
    init_tracing();
    // Summed points 5.0 over 3 credits: 1.666... truncates to 1.66.
    let transcript = vec![
        course("1", "CSCI", "251").with_grade(Grade::letter("C")),
        course("2", "CSCI", "252").with_grade(Grade::letter("C")),
        course("3", "CSCI", "253").with_grade(Grade::new("D", Decimal::new(10, 1), true)),
    ];
    let rule = load("{from: courses, assert: {'average(grades)': {$eq: 1.66}}}");
    let ctx = RequirementContext::new(transcript, vec![]);

    let SolveOutcome::Satisfied(audit) = find_best_solution(&rule, &ctx) else {
        panic!("expected a passing result");
    };
    assert_eq!(audit.result.claims().len(), 3);
}

#[test]
fn test_limits_cap_claimable_courses() {
    init_tracing();
    let transcript = vec![
        course("1", "CSCI", "211"),
        course("2", "CSCI", "212"),
        course("3", "CSCI", "213"),
    ];
    let spec = "{from: courses, \
                limit: [{at_most: 1, where: {level: {$eq: 200}}}], \
                assert: {'count(courses)': {$gte: %N}}}";

    // At most one level-200 course may count: two can never be claimed.
    let rule = load(&spec.replace("%N", "2"));
    let ctx = RequirementContext::new(transcript.clone(), vec![]);
    assert!(!find_best_solution(&rule, &ctx).is_satisfied());

    let rule = load(&spec.replace("%N", "1"));
    let ctx = RequirementContext::new(transcript, vec![]);
    let SolveOutcome::Satisfied(audit) = find_best_solution(&rule, &ctx) else {
        panic!("expected a passing result");
    };
    assert_eq!(audit.result.claims().len(), 1);
}

#[test]
fn test_empty_pool_completes_no_audits() {
    init_tracing();
    let rule = load(
        "{from: courses, where: {subject: {$eq: CSCI}}, \
         assert: {'count(courses)': {$gte: 2}}}",
    );
    let ctx = RequirementContext::new(vec![], vec![]);
    assert!(matches!(
        find_best_solution(&rule, &ctx),
        SolveOutcome::NoAuditsCompleted
    ));
}

#[test]
fn test_estimate_matches_enumeration() {
    init_tracing();
    let rule = load("any: [{course: A 1}, {course: B 2}, {course: C 3}]");
    let ctx = RequirementContext::new(vec![], vec![]);
    assert_eq!(estimate(&rule, &ctx), rule.solutions(&ctx).count() as u64);

    let rule = load(
        "{from: courses, where: {subject: {$eq: CSCI}}, \
         assert: {'count(courses)': {$gte: 2}}}",
    );
    let ctx = RequirementContext::new(
        vec![
            course("1", "CSCI", "251"),
            course("2", "CSCI", "252"),
            course("3", "CSCI", "253"),
        ],
        vec![],
    );
    assert_eq!(estimate(&rule, &ctx), rule.solutions(&ctx).count() as u64);
}

#[test]
fn test_result_serializes_as_a_tree() {
    init_tracing();
    let rule = load("all: [{course: CSCI 251}, {course: CSCI 252}]");
    let ctx = RequirementContext::new(
        vec![course("1", "CSCI", "251"), course("2", "CSCI", "252")],
        vec![],
    );
    let audit = find_best_solution(&rule, &ctx).into_best().unwrap();

    let json = serde_json::to_value(&audit.result).unwrap();
    assert_eq!(json["type"], "count");
    assert_eq!(json["items"][0]["audited"]["type"], "course");
    assert_eq!(json["items"][0]["audited"]["course"], "CSCI 251");
}
