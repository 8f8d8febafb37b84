use super::Filter;
use crate::assertion::{AssertionCompiler, ConfigurationError, RuleNode, TypeKind};
use std::fs;
use std::path::Path;

/// Reads and compiles a JSON5 rule document
pub fn load_rules(path: &Path, compiler: &AssertionCompiler) -> Result<Vec<Filter>, ConfigurationError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
        path: path_display.clone(),
        source,
    })?;
    parse_document(&raw, &path_display, compiler)
}

/// Compiles a JSON5 rule document held in memory
pub fn parse_rules(text: &str, compiler: &AssertionCompiler) -> Result<Vec<Filter>, ConfigurationError> {
    parse_document(text, "<inline>", compiler)
}

fn parse_document(
    text: &str,
    origin: &str,
    compiler: &AssertionCompiler,
) -> Result<Vec<Filter>, ConfigurationError> {
    let json: serde_json::Value =
        json5::from_str(text).map_err(|e| ConfigurationError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
    let root = RuleNode::from_json("rules", &json, "")?;
    compile_document(&root, compiler)
}

/// Compiles an already parsed rule tree: `type` entries extend the type
/// catalog, `filter` entries become filters, in document order.
pub fn compile_document(
    root: &RuleNode,
    compiler: &AssertionCompiler,
) -> Result<Vec<Filter>, ConfigurationError> {
    let mut compiler = compiler.clone();

    for entry in root.children() {
        match entry.name() {
            "type" => {
                let name = entry.require("name")?;
                let kind = entry
                    .attribute("kind")
                    .map(str::parse::<TypeKind>)
                    .transpose()
                    .map_err(|e| e.at(entry.location()))?
                    .unwrap_or_default();
                compiler.catalog_mut().declare(name, kind);
            }
            "filter" => {}
            other => {
                return Err(entry.malformed(format!(
                    "unexpected element '{other}', expected 'type' or 'filter'"
                )));
            }
        }
    }

    root.children_named("filter")
        .map(|entry| compile_filter(entry, &compiler))
        .collect()
}

fn compile_filter(entry: &RuleNode, compiler: &AssertionCompiler) -> Result<Filter, ConfigurationError> {
    let mut channels: Vec<&str> = Vec::new();
    let mut test = None;

    for child in entry.children() {
        match child.name() {
            "channel" => channels.push(
                child
                    .attribute("value")
                    .or_else(|| child.attribute("name"))
                    .filter(|name| !name.trim().is_empty())
                    .ok_or_else(|| child.malformed("channel reference needs a name"))?,
            ),
            "test" if test.is_none() => test = Some(child),
            "test" => return Err(entry.malformed("filter has more than one test")),
            other => {
                return Err(child.malformed(format!(
                    "unexpected element '{other}' in filter"
                )));
            }
        }
    }
    if let Some(channel) = entry.attribute("channel") {
        if channel.trim().is_empty() {
            return Err(entry.malformed("channel reference needs a name"));
        }
        channels.push(channel);
    }

    let test = test.ok_or_else(|| entry.malformed("filter has no test"))?;
    let assertion = compiler.compile_test(test)?;

    let mut filter = Filter::new(assertion).with_channels(channels);
    if let Some(name) = entry.attribute("name") {
        filter = filter.with_name(name);
    }
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rules_document() {
        let doc = r#"{
            // bots and health checks are noise
            filter: [
                { name: "not-found", test: { equal: { binding: "HttpStatusCode", value: 404 } } },
                {
                    channel: ["Email", "chat"],
                    test: { regex: { binding: "BaseException.Message", pattern: "timeout", "case-sensitive": false } },
                },
            ],
        }"#;
        let filters = parse_rules(doc, &AssertionCompiler::new()).unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].name(), Some("not-found"));
        assert!(filters[0].dismisses_entirely());
        assert!(filters[1].channels().contains("email"));
        assert!(filters[1].channels().contains("CHAT"));
    }

    #[test]
    fn test_type_declarations_feed_catalog() {
        let doc = r#"{
            type: [{ name: "Retryable", kind: "interface" }],
            filter: [{ test: { "is-type": { binding: "BaseException", type: "Retryable" } } }],
        }"#;
        let filters = parse_rules(doc, &AssertionCompiler::new()).unwrap();
        match filters[0].assertion() {
            crate::assertion::Assertion::Type(t) => assert!(t.by_compatibility()),
            other => panic!("expected type assertion, got {other:?}"),
        }
    }

    #[test]
    fn test_errors_name_the_offending_entry() {
        let doc = r#"{
            filter: [
                { test: { equal: { binding: "HttpStatusCode", value: 404 } } },
                { test: { and: { equal: { binding: "Exception.Nope", value: "x" } } } },
            ],
        }"#;
        let err = parse_rules(doc, &AssertionCompiler::new()).unwrap_err();
        assert_eq!(err.location(), Some("filter[1].test.and.equal"));
    }

    #[test]
    fn test_filter_without_test_is_rejected() {
        let err = parse_rules(r#"{ filter: [{ name: "empty" }] }"#, &AssertionCompiler::new()).unwrap_err();
        assert_eq!(err.location(), Some("filter[0]"));
    }

    #[test]
    fn test_unknown_top_level_element_is_rejected() {
        assert!(parse_rules(r#"{ filters: [{ name: "x" }] }"#, &AssertionCompiler::new()).is_err());
    }

    #[test]
    fn test_blank_channel_names_are_rejected() {
        let listed = r#"{ filter: [{ channel: [""], test: { equal: { binding: "BaseException.Type", value: "TestException" } } }] }"#;
        let err = parse_rules(listed, &AssertionCompiler::new()).unwrap_err();
        assert!(err.to_string().contains("channel reference needs a name"));
        assert!(err.location().is_some_and(|l| l.starts_with("filter[0]")));

        let inline = r#"{ filter: [{ channel: "  ", test: { equal: { binding: "HttpStatusCode", value: 500 } } }] }"#;
        let err = parse_rules(inline, &AssertionCompiler::new()).unwrap_err();
        assert!(err.location().is_some_and(|l| l.starts_with("filter[0]")));
    }

    #[test]
    fn test_invalid_json5_is_a_parse_error() {
        let err = parse_rules("{ filter: [", &AssertionCompiler::new()).unwrap_err();
        assert!(matches!(err, ConfigurationError::Parse { .. }));
    }
}
