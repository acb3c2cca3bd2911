use pretty_assertions::assert_eq;
use specwright::runner::{list_tests, run_suites};
use specwright::{
    ConsoleReporter, Error, EventKind, FunSuite, RecordingReporter, RunConfig, Spec, Suite,
};
use std::collections::BTreeSet;

fn suites() -> Vec<Box<dyn Suite>> {
    let math = FunSuite::new("Math");
    math.test("adds", || assert_eq!(2 + 3, 5)).unwrap();
    math.tagged_test("divides slowly", &["slow"], || {}).unwrap();
    math.ignore("overflows", || panic!("must not run")).unwrap();

    let stack = Spec::build("StackSpec", |ctx| {
        ctx.describe("A Stack", |ctx| {
            ctx.it("pop the last pushed value", || {});
            ctx.it("peek without removing", || panic!("expected 2, got 3"));
        });
    })
    .unwrap();

    vec![Box::new(math) as Box<dyn Suite>, Box::new(stack)]
}

fn config(args: &[&str]) -> RunConfig {
    RunConfig::from_args_lenient(
        std::iter::once("specwright")
            .chain(args.iter().copied())
            .map(String::from),
    )
}

#[test]
fn runs_every_suite_and_totals_the_outcomes() {
    let mut reporter = RecordingReporter::new();
    let summary = run_suites(&suites(), &mut reporter, &RunConfig::default()).unwrap();

    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.ignored, 1);
    assert_eq!(
        summary.failures,
        vec!["A Stack should peek without removing: expected 2, got 3"]
    );
    assert_eq!(
        reporter.names(EventKind::SuiteStarting),
        vec!["Math", "StackSpec"]
    );
}

#[test]
fn tag_and_name_filters_come_from_the_command_line() {
    let mut reporter = RecordingReporter::new();
    let summary = run_suites(&suites(), &mut reporter, &config(&["--exclude", "slow", "stack"]))
        .unwrap();

    assert_eq!(
        reporter.names(EventKind::TestStarting),
        vec![
            "A Stack should pop the last pushed value",
            "A Stack should peek without removing",
        ]
    );
    assert_eq!(summary.ignored, 0);
}

#[test]
fn a_single_named_test_runs_only_in_its_suite() {
    let mut reporter = RecordingReporter::new();
    let summary = run_suites(
        &suites(),
        &mut reporter,
        &config(&["-t", "A Stack should pop the last pushed value"]),
    )
    .unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(reporter.names(EventKind::SuiteStarting), vec!["StackSpec"]);

    let err = run_suites(&suites(), &mut reporter, &config(&["-t", "nope"])).unwrap_err();
    assert!(matches!(err, Error::UnknownTestName(ref n) if n == "nope"));
}

#[test]
fn a_named_test_in_a_nested_suite_is_found_and_run() {
    let mut outer = FunSuite::new("Outer");
    outer.test("shallow", || panic!("must not run")).unwrap();
    let mut middle = FunSuite::new("Middle");
    middle.test("beside", || panic!("must not run")).unwrap();
    let inner = FunSuite::new("Inner");
    inner.test("deep", || {}).unwrap();
    middle.nest(Box::new(inner));
    outer.nest(Box::new(middle));
    let suites = vec![Box::new(outer) as Box<dyn Suite>];

    let mut out = Vec::new();
    list_tests(&suites, &config(&["-t", "deep"]), &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "deep\n");

    let mut reporter = RecordingReporter::new();
    let summary = run_suites(&suites, &mut reporter, &config(&["-t", "deep"])).unwrap();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.total_run(), 1);
    assert_eq!(
        reporter.names(EventKind::SuiteStarting),
        vec!["Outer", "Middle", "Inner"]
    );
    assert_eq!(reporter.names(EventKind::TestStarting), vec!["deep"]);
    assert_eq!(
        reporter.names(EventKind::SuiteCompleted),
        vec!["Inner", "Middle", "Outer"]
    );
}

#[test]
fn a_named_example_in_a_spec_nested_under_a_fun_suite_runs() {
    let mut outer = FunSuite::new("Outer");
    outer.test("flat", || {}).unwrap();
    let spec = Spec::build("StackSpec", |ctx| {
        ctx.describe("A Stack", |ctx| {
            ctx.it("pop", || {});
        });
    })
    .unwrap();
    outer.nest(Box::new(spec));
    let suites = vec![Box::new(outer) as Box<dyn Suite>];

    let mut reporter = RecordingReporter::new();
    run_suites(&suites, &mut reporter, &config(&["-t", "A Stack should pop"])).unwrap();
    assert_eq!(
        reporter.names(EventKind::TestSucceeded),
        vec!["A Stack should pop"]
    );
}

#[test]
fn fail_fast_stops_after_the_first_failure() {
    let first = FunSuite::new("First");
    first.test("breaks", || panic!("boom")).unwrap();
    first.test("after the break", || {}).unwrap();
    let second = FunSuite::new("Second");
    second.test("never scheduled", || {}).unwrap();
    let suites = vec![Box::new(first) as Box<dyn Suite>, Box::new(second)];

    let mut reporter = RecordingReporter::new();
    let summary = run_suites(&suites, &mut reporter, &config(&["--fail-fast"])).unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.total_run(), 1);
    assert!(reporter.kinds_for("after the break").is_empty());
    assert!(reporter.kinds_for("never scheduled").is_empty());
}

#[test]
fn parallel_runs_keep_each_suite_in_order() {
    let suites: Vec<Box<dyn Suite>> = (0..6)
        .map(|i| {
            let suite = FunSuite::new(format!("Suite {i}"));
            for j in 0..5 {
                suite.test(&format!("suite {i} test {j}"), || {}).unwrap();
            }
            Box::new(suite) as Box<dyn Suite>
        })
        .collect();

    let mut reporter = RecordingReporter::new();
    let summary = run_suites(&suites, &mut reporter, &config(&["-j", "3"])).unwrap();
    assert_eq!(summary.succeeded, 30);

    for i in 0..6 {
        let prefix = format!("suite {i} ");
        let started: Vec<String> = reporter
            .names(EventKind::TestStarting)
            .into_iter()
            .filter(|name| name.starts_with(&prefix))
            .collect();
        let expected: Vec<String> = (0..5).map(|j| format!("suite {i} test {j}")).collect();
        assert_eq!(started, expected);
    }

    let suite_names: BTreeSet<String> = reporter
        .names(EventKind::SuiteCompleted)
        .into_iter()
        .collect();
    assert_eq!(suite_names.len(), 6);
}

#[test]
fn listing_marks_ignored_tests() {
    let mut out = Vec::new();
    list_tests(&suites(), &config(&["--list"]), &mut out).unwrap();
    let listing = String::from_utf8(out).unwrap();
    assert_eq!(
        listing.lines().collect::<Vec<_>>(),
        vec![
            "adds",
            "divides slowly",
            "overflows (ignored)",
            "A Stack should pop the last pushed value",
            "A Stack should peek without removing",
        ]
    );
}

#[test]
fn console_reporter_summarises_a_run() {
    let mut console = ConsoleReporter::with_writer(Vec::new(), false);
    run_suites(&suites(), &mut console, &RunConfig::default()).unwrap();
    assert_eq!(console.summary().failed, 1);

    console.print_summary(std::time::Duration::from_millis(20));
    let out = String::from_utf8(console.into_inner()).unwrap();
    assert!(out.contains("\nMath\n  ✓ adds\n"));
    assert!(out.contains("  - overflows (ignored)\n"));
    assert!(out.contains("  ✗ A Stack should peek without removing\n    Error: expected 2, got 3\n"));
    assert!(out.contains("FAIL\n3 passed, 1 failed, 1 ignored (0.020s)\n"));
}
