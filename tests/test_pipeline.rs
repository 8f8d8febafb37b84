use fault_sieve::assertion::{Assertion, AssertionContext, EvaluationFault, parse_date_time};
use fault_sieve::filter::{Filter, FilterPipeline, parse_rules};
use fault_sieve::{AssertionCompiler, CapturedError, ExceptionInfo, RequestContext};

fn broken(_: &AssertionContext<'_>) -> Result<bool, EvaluationFault> {
    Err(EvaluationFault::Predicate {
        name: "broken".to_string(),
        message: "database unavailable".to_string(),
    })
}

fn panicking(_: &AssertionContext<'_>) -> Result<bool, EvaluationFault> {
    panic!("rule exploded")
}

fn not_found() -> CapturedError {
    CapturedError::new(ExceptionInfo::new("HttpException", "File does not exist.").with_http_status(404))
        .with_request(RequestContext::new("GET", "/favicon.ico").with_user("ada"))
        .with_host("web-01")
}

fn rule_filters() -> Vec<Filter> {
    parse_rules(
        r#"{
            filter: [
                { name: "404", test: { equal: { binding: "HttpStatusCode", value: 404 } } },
                { channel: ["email"], test: { equal: { binding: "BaseException.Type", value: "HttpException" } } },
                { channel: "chat", test: { regex: { binding: "Context.Request.Path", pattern: "\\.ico$" } } },
                { channel: ["pager"], test: { equal: { binding: "HttpStatusCode", value: 500 } } },
            ],
        }"#,
        &AssertionCompiler::new(),
    )
    .unwrap()
}

#[test]
fn test_verdict_aggregates_or_and_union() {
    let verdict = FilterPipeline::new(rule_filters()).evaluate(&not_found());
    assert!(verdict.suppress_recording);
    assert!(verdict.is_channel_suppressed("EMAIL"));
    assert!(verdict.is_channel_suppressed("chat"));
    assert!(!verdict.is_channel_suppressed("pager"));
}

#[test]
fn test_filter_order_does_not_change_the_verdict() {
    let error = not_found();
    let filters = rule_filters();
    let expected = FilterPipeline::new(filters.clone()).evaluate(&error);

    let n = filters.len();
    for rotation in 0..n {
        let mut rotated = filters.clone();
        rotated.rotate_left(rotation);
        assert_eq!(FilterPipeline::new(rotated.clone()).evaluate(&error), expected);
        rotated.reverse();
        assert_eq!(FilterPipeline::new(rotated).evaluate(&error), expected);
    }
}

#[test]
fn test_failing_filters_contribute_nothing() {
    let pipeline = FilterPipeline::default()
        .with_filter(Filter::new(Assertion::custom("broken", broken)))
        .with_filter(Filter::new(Assertion::custom("panicking", panicking)).with_channels(["log"]))
        .with_filter(Filter::new(Assertion::TRUE).with_channels(["email"]));

    let verdict = pipeline.evaluate(&not_found());
    assert!(!verdict.suppress_recording);
    assert!(verdict.is_channel_suppressed("email"));
    assert!(!verdict.is_channel_suppressed("log"));
}

#[test]
fn test_data_bound_assertions_never_fail() {
    let filters = parse_rules(
        r#"{
            filter: [
                { test: { equal: { binding: "Context.Request.Headers['X-Missing']", value: "x", type: "string" } } },
                { test: { greater: { binding: "Exception.InnerException.HttpStatusCode", value: 1 } } },
            ],
        }"#,
        &AssertionCompiler::new(),
    )
    .unwrap();

    let verdict = FilterPipeline::new(filters).evaluate(&not_found());
    assert!(verdict.is_clear());
}

#[test]
fn test_time_comparison() {
    let filters = parse_rules(
        r#"{ filter: [{ test: { lesser: { binding: "Time", value: "2020-01-01 00:00:00" } } }] }"#,
        &AssertionCompiler::new(),
    )
    .unwrap();
    let old = not_found().at(parse_date_time("2019-06-01").unwrap().and_utc());

    assert!(FilterPipeline::new(filters.clone()).evaluate(&old).suppress_recording);
    assert!(!FilterPipeline::new(filters).evaluate(&not_found()).suppress_recording);
}
