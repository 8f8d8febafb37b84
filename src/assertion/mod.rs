//! Composable predicates over a captured error
//!
//! An [`Assertion`] is a tree built once at configuration time and evaluated
//! once per captured error. Nodes hold no per-evaluation state, so a tree can
//! be shared freely across threads.
//!
//! Data-bound nodes (comparison, type, pattern) read a property through an
//! [`Expression`]. When the property cannot be read or has an incompatible
//! type the node evaluates to `false`; a rule that does not apply never aborts
//! error capture.

pub mod compiler;
pub mod document;
pub mod error;

mod comparison;
mod pattern;
mod type_match;

pub use comparison::{ComparisonAssertion, ComparisonOp, Literal, LiteralType, parse_date_time};
pub use compiler::{AssertionCompiler, AssertionFactory};
pub use document::RuleNode;
pub use error::{ConfigurationError, EvaluationFault};
pub use pattern::PatternAssertion;
pub use type_match::{TypeAssertion, TypeCatalog, TypeKind, TypeRef};

use crate::capture::CapturedError;
use crate::expression::{Expression, Value};
use std::fmt;
use std::sync::Arc;

/// Everything an assertion may look at while testing one captured error
#[derive(Debug, Clone, Copy)]
pub struct AssertionContext<'a> {
    error: &'a CapturedError,
    filter_source: Option<&'a str>,
}

impl<'a> AssertionContext<'a> {
    pub fn new(error: &'a CapturedError) -> Self {
        Self {
            error,
            filter_source: None,
        }
    }

    /// Names the component that asked for the evaluation
    pub fn with_filter_source(mut self, source: &'a str) -> Self {
        self.filter_source = Some(source);
        self
    }

    pub fn error(&self) -> &'a CapturedError {
        self.error
    }

    pub fn filter_source(&self) -> Option<&'a str> {
        self.filter_source
    }
}

/// Host-supplied predicate, for rules that cannot be expressed declaratively
pub trait Predicate: Send + Sync {
    fn test(&self, ctx: &AssertionContext<'_>) -> Result<bool, EvaluationFault>;
}

impl<F> Predicate for F
where
    F: Fn(&AssertionContext<'_>) -> Result<bool, EvaluationFault> + Send + Sync,
{
    fn test(&self, ctx: &AssertionContext<'_>) -> Result<bool, EvaluationFault> {
        self(ctx)
    }
}

/// A named [`Predicate`] embedded in an assertion tree
#[derive(Clone)]
pub struct CustomAssertion {
    name: String,
    predicate: Arc<dyn Predicate>,
}

impl CustomAssertion {
    pub fn new(name: impl Into<String>, predicate: Arc<dyn Predicate>) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CustomAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomAssertion")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A node of an assertion tree
#[derive(Debug, Clone)]
pub enum Assertion {
    /// Always the wrapped value; see [`Assertion::TRUE`] and [`Assertion::FALSE`]
    Static(bool),
    Not(Box<Assertion>),
    /// True when every child is true (short-circuits)
    And(Vec<Assertion>),
    /// True when any child is true (short-circuits)
    Or(Vec<Assertion>),
    Comparison(ComparisonAssertion),
    Type(TypeAssertion),
    Pattern(PatternAssertion),
    Custom(CustomAssertion),
}

impl Assertion {
    pub const TRUE: Assertion = Assertion::Static(true);
    pub const FALSE: Assertion = Assertion::Static(false);

    pub fn not(assertion: Assertion) -> Self {
        Assertion::Not(Box::new(assertion))
    }

    /// Conjunction; no operands is `TRUE`, a single operand is returned as is
    pub fn and(assertions: impl IntoIterator<Item = Assertion>) -> Self {
        let mut assertions: Vec<_> = assertions.into_iter().collect();
        match assertions.len() {
            0 => Assertion::TRUE,
            1 => assertions.remove(0),
            _ => Assertion::And(assertions),
        }
    }

    /// Disjunction; no operands is `FALSE`, a single operand is returned as is
    pub fn or(assertions: impl IntoIterator<Item = Assertion>) -> Self {
        let mut assertions: Vec<_> = assertions.into_iter().collect();
        match assertions.len() {
            0 => Assertion::FALSE,
            1 => assertions.remove(0),
            _ => Assertion::Or(assertions),
        }
    }

    pub fn custom(name: impl Into<String>, predicate: impl Predicate + 'static) -> Self {
        Assertion::Custom(CustomAssertion::new(name, Arc::new(predicate)))
    }

    /// Evaluates the tree. Only custom predicates can fail; data-bound
    /// nodes fold their failures into `false`.
    pub fn test(&self, ctx: &AssertionContext<'_>) -> Result<bool, EvaluationFault> {
        match self {
            Assertion::Static(value) => Ok(*value),
            Assertion::Not(inner) => inner.test(ctx).map(|v| !v),
            Assertion::And(children) => {
                for child in children {
                    if !child.test(ctx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Assertion::Or(children) => {
                for child in children {
                    if child.test(ctx)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Assertion::Comparison(a) => Ok(data_bound(a.expression(), ctx, |v| a.test_result(v))),
            Assertion::Type(a) => Ok(data_bound(a.expression(), ctx, |v| a.test_result(v))),
            Assertion::Pattern(a) => Ok(data_bound(a.expression(), ctx, |v| a.test_result(v))),
            Assertion::Custom(custom) => custom.predicate.test(ctx),
        }
    }
}

fn data_bound<'a>(
    expression: &Expression,
    ctx: &AssertionContext<'a>,
    test: impl FnOnce(&Value<'a>) -> Option<bool>,
) -> bool {
    match expression.evaluate(ctx) {
        Ok(value) => test(&value).unwrap_or_else(|| {
            tracing::trace!(binding = %expression, "value not applicable to assertion");
            false
        }),
        Err(fault) => {
            tracing::debug!(binding = %expression, error = %fault, "binding could not be read");
            false
        }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, children: &[Assertion], op: &str) -> fmt::Result {
            f.write_str("(")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, " {op} ")?;
                }
                write!(f, "{child}")?;
            }
            f.write_str(")")
        }

        match self {
            Assertion::Static(value) => write!(f, "{value}"),
            Assertion::Not(inner) => write!(f, "not {inner}"),
            Assertion::And(children) => join(f, children, "and"),
            Assertion::Or(children) => join(f, children, "or"),
            Assertion::Comparison(a) => write!(f, "{a}"),
            Assertion::Type(a) => write!(f, "{a}"),
            Assertion::Pattern(a) => write!(f, "{a}"),
            Assertion::Custom(c) => write!(f, "custom:{}", c.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{ExceptionInfo, RequestContext};

    fn errors() -> Vec<CapturedError> {
        vec![
            CapturedError::new(ExceptionInfo::new("NotFound", "missing").with_http_status(404)),
            CapturedError::new(ExceptionInfo::new("TimeoutError", "slow"))
                .with_request(RequestContext::new("POST", "/pay")),
            CapturedError::new(ExceptionInfo::new("Error", "")),
        ]
    }

    fn status_is(code: &str) -> Assertion {
        Assertion::Comparison(
            ComparisonAssertion::parse(
                Expression::compile("HttpStatusCode").unwrap(),
                ComparisonOp::Equal,
                "int",
                code,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_static_assertions_ignore_context() {
        for err in errors() {
            let ctx = AssertionContext::new(&err);
            assert!(Assertion::TRUE.test(&ctx).unwrap());
            assert!(!Assertion::FALSE.test(&ctx).unwrap());
        }
    }

    #[test]
    fn test_not_negates() {
        let assertions = [Assertion::TRUE, Assertion::FALSE, status_is("404")];
        for err in errors() {
            let ctx = AssertionContext::new(&err);
            for a in &assertions {
                assert_eq!(
                    Assertion::not(a.clone()).test(&ctx).unwrap(),
                    !a.test(&ctx).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_empty_combinators() {
        assert!(matches!(Assertion::and([]), Assertion::Static(true)));
        assert!(matches!(Assertion::or([]), Assertion::Static(false)));
        assert!(matches!(Assertion::and([status_is("1")]), Assertion::Comparison(_)));
    }

    #[test]
    fn test_and_short_circuits_before_failing_predicate() {
        fn boom(_: &AssertionContext<'_>) -> Result<bool, EvaluationFault> {
            Err(EvaluationFault::Predicate {
                name: "boom".into(),
                message: "always fails".into(),
            })
        }
        let failing = Assertion::custom("boom", boom);
        let errs = errors();
        let ctx = AssertionContext::new(&errs[0]);
        let and = Assertion::and([Assertion::FALSE, failing.clone()]);
        assert!(!and.test(&ctx).unwrap());
        let or = Assertion::or([Assertion::FALSE, failing]);
        assert!(or.test(&ctx).is_err());
    }

    #[test]
    fn test_inapplicable_binding_is_false() {
        let err = CapturedError::new(ExceptionInfo::new("Error", "no request"));
        let ctx = AssertionContext::new(&err);
        let a = Assertion::Pattern(
            PatternAssertion::new(Expression::compile("Context.Request.Path").unwrap(), "^/", true)
                .unwrap(),
        );
        assert!(!a.test(&ctx).unwrap());
        assert!(Assertion::not(a).test(&ctx).unwrap());
    }

    #[test]
    fn test_display() {
        let a = Assertion::and([status_is("404"), Assertion::not(Assertion::TRUE)]);
        assert_eq!(a.to_string(), "(HttpStatusCode = 404 and not true)");
    }

    #[test]
    fn test_assertions_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Assertion>();
    }
}
