use super::error::ConfigurationError;
use serde_json::Value as Json;
use std::collections::BTreeMap;

/// A generic attributed-tree node, the input of the assertion compiler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleNode {
    name: String,
    attributes: BTreeMap<String, String>,
    children: Vec<RuleNode>,
    location: String,
}

impl RuleNode {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            location: name.clone(),
            name,
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, mut child: RuleNode) -> Self {
        child.relocate(&self.location);
        self.children.push(child);
        self
    }

    fn relocate(&mut self, parent: &str) {
        self.location = join_location(parent, &self.name);
        let location = self.location.clone();
        for child in &mut self.children {
            child.relocate(&location);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted path to this node inside its document, used in diagnostics
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn children(&self) -> &[RuleNode] {
        &self.children
    }

    pub fn children_named<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s RuleNode> + 's {
        self.children
            .iter()
            .filter(move |c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Looks an attribute up, ignoring ASCII case and `-`/`_` differences
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| same_name(k, name))
            .map(|(_, v)| v.as_str())
    }

    pub fn require(&self, name: &str) -> Result<&str, ConfigurationError> {
        self.attribute(name)
            .ok_or_else(|| ConfigurationError::MissingAttribute(name.to_string()).at(&self.location))
    }

    /// Reads a boolean attribute, `default` when absent
    pub fn flag(&self, name: &str, default: bool) -> Result<bool, ConfigurationError> {
        match self.attribute(name).map(|v| v.trim().to_ascii_lowercase()) {
            None => Ok(default),
            Some(v) if v == "true" => Ok(true),
            Some(v) if v == "false" => Ok(false),
            Some(v) => Err(ConfigurationError::Malformed(format!(
                "attribute '{name}' must be true or false, got '{v}'"
            ))
            .at(&self.location)),
        }
    }

    pub fn malformed(&self, message: impl Into<String>) -> ConfigurationError {
        ConfigurationError::Malformed(message.into()).at(&self.location)
    }

    /// Maps a JSON object onto a node named `name`.
    ///
    /// Scalar members become attributes, object members become a child
    /// element, arrays of objects become repeated child elements and arrays
    /// of scalars become repeated child elements carrying a `value` attribute.
    pub fn from_json(name: &str, json: &Json, location: &str) -> Result<Self, ConfigurationError> {
        let Json::Object(members) = json else {
            return Err(ConfigurationError::Malformed(format!(
                "element '{name}' must be an object"
            ))
            .at(location));
        };

        let mut node = RuleNode {
            name: name.to_string(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            location: location.to_string(),
        };

        for (key, value) in members {
            let child_location = join_location(location, key);
            match value {
                Json::Null => {}
                Json::Object(_) => node
                    .children
                    .push(RuleNode::from_json(key, value, &child_location)?),
                Json::Array(items) => {
                    for (index, item) in items.iter().enumerate() {
                        let item_location = format!("{child_location}[{index}]");
                        let child = match item {
                            Json::Object(_) => RuleNode::from_json(key, item, &item_location)?,
                            Json::Array(_) | Json::Null => {
                                return Err(ConfigurationError::Malformed(format!(
                                    "unsupported value in '{key}'"
                                ))
                                .at(&item_location));
                            }
                            scalar => RuleNode {
                                name: key.clone(),
                                attributes: BTreeMap::from([(
                                    "value".to_string(),
                                    scalar_text(scalar),
                                )]),
                                children: Vec::new(),
                                location: item_location,
                            },
                        };
                        node.children.push(child);
                    }
                }
                scalar => {
                    node.attributes.insert(key.clone(), scalar_text(scalar));
                }
            }
        }

        Ok(node)
    }
}

fn scalar_text(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn join_location(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn same_name(a: &str, b: &str) -> bool {
    let normalize = |s: &str| {
        s.chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect::<String>()
    };
    normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_maps_scalars_objects_and_arrays() {
        let json = json!({
            "name": "ignore-bots",
            "channel": ["email", "chat"],
            "test": { "regex": { "binding": "Context.Request.Headers['User-Agent']", "pattern": "bot" } }
        });
        let node = RuleNode::from_json("filter", &json, "filter[0]").unwrap();

        assert_eq!(node.attribute("name"), Some("ignore-bots"));
        let channels: Vec<_> = node
            .children_named("channel")
            .map(|c| c.attribute("value").unwrap())
            .collect();
        assert_eq!(channels, vec!["email", "chat"]);

        let test = node.children_named("test").next().unwrap();
        let regex = &test.children()[0];
        assert_eq!(regex.name(), "regex");
        assert_eq!(regex.location(), "filter[0].test.regex");
        assert_eq!(regex.attribute("pattern"), Some("bot"));
    }

    #[test]
    fn test_numbers_and_bools_become_text() {
        let node = RuleNode::from_json("equal", &json!({"value": 404, "flag": true}), "equal").unwrap();
        assert_eq!(node.attribute("value"), Some("404"));
        assert!(node.flag("flag", false).unwrap());
    }

    #[test]
    fn test_attribute_lookup_ignores_case_and_separators() {
        let node = RuleNode::new("regex").with_attribute("caseSensitive", "false");
        assert_eq!(node.attribute("case-sensitive"), Some("false"));
        assert!(!node.flag("case_sensitive", true).unwrap());
    }

    #[test]
    fn test_builder_locations_follow_nesting() {
        let node = RuleNode::new("test").with_child(RuleNode::new("not").with_child(RuleNode::new("equal")));
        assert_eq!(node.children()[0].children()[0].location(), "test.not.equal");
    }

    #[test]
    fn test_missing_attribute_names_location() {
        let node = RuleNode::new("equal");
        let err = node.require("binding").unwrap_err();
        assert_eq!(err.location(), Some("equal"));
        assert!(err.to_string().contains("binding"));
    }

    #[test]
    fn test_non_object_element_is_rejected() {
        assert!(RuleNode::from_json("test", &json!("nope"), "test").is_err());
    }
}
