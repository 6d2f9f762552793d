//! Projection of content into render node trees.
//!
//! A [`RenderContentFactory`] turns resolved content into a container
//! [`RenderNode`] holding one child per [`RenderComponent`] the extraction
//! function yields. The tree is plain data; hosts hand it to whatever
//! renderer they use.

use std::collections::BTreeMap;
use std::sync::Arc;

use cachet_cell::CellView;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::Content;
use crate::error::RenderError;

/// Tag of the node wrapping the rendered components.
pub const CONTAINER_TAG: &str = "div";

/// A component reference inside content: which component, with which props.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderComponent {
    /// Component type tag.
    pub component_name: String,
    /// Property bag handed to the component.
    #[serde(default)]
    pub props: Value,
}

impl RenderComponent {
    /// Creates a component descriptor.
    pub fn new(component_name: impl Into<String>, props: Value) -> Self {
        Self {
            component_name: component_name.into(),
            props,
        }
    }
}

/// A node of the rendered tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    /// Element or component tag.
    pub tag: String,
    /// String attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Component props.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub props: Value,
    /// Child nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderNode>,
}

impl RenderNode {
    /// Creates a bare node with the given tag.
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            props: Value::Null,
            children: Vec::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Sets the props.
    #[must_use]
    pub fn with_props(mut self, props: Value) -> Self {
        self.props = props;
        self
    }

    /// Replaces the children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<RenderNode>) -> Self {
        self.children = children;
        self
    }

    /// Returns the value of an attribute.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

type Extract<C> = dyn Fn(&C) -> Result<Vec<RenderComponent>, RenderError> + Send + Sync;

/// Renders content through an injected extraction function.
///
/// # Example
///
/// ```
/// use cachet_content::{RenderComponent, RenderContentFactory};
/// use serde_json::json;
///
/// let factory = RenderContentFactory::new(|names: &Vec<String>| {
///     Ok(names
///         .iter()
///         .map(|name| RenderComponent::new(name.clone(), json!({})))
///         .collect())
/// });
///
/// let tree = factory.render(&vec!["Hero".to_string()], &[]).unwrap();
/// assert_eq!(tree.tag, "div");
/// assert_eq!(tree.children[0].tag, "Hero");
/// ```
pub struct RenderContentFactory<C> {
    extract: Arc<Extract<C>>,
}

impl<C> Clone for RenderContentFactory<C> {
    fn clone(&self) -> Self {
        Self {
            extract: Arc::clone(&self.extract),
        }
    }
}

impl<C> core::fmt::Debug for RenderContentFactory<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderContentFactory").finish_non_exhaustive()
    }
}

impl<C> RenderContentFactory<C> {
    /// Creates a factory from an extraction function.
    pub fn new<F>(extract: F) -> Self
    where
        F: Fn(&C) -> Result<Vec<RenderComponent>, RenderError> + Send + Sync + 'static,
    {
        Self {
            extract: Arc::new(extract),
        }
    }

    /// Renders `content` into a container node.
    ///
    /// Every extracted component becomes one child with `tag` and the `name`
    /// attribute set to the component name, its props, and a copy of
    /// `default_children`.
    ///
    /// # Errors
    ///
    /// Returns whatever error the extraction function reports.
    pub fn render(
        &self,
        content: &C,
        default_children: &[RenderNode],
    ) -> Result<RenderNode, RenderError> {
        let children = (self.extract)(content)?
            .into_iter()
            .map(|component| {
                RenderNode::element(component.component_name.clone())
                    .with_attr("name", component.component_name)
                    .with_props(component.props)
                    .with_children(default_children.to_vec())
            })
            .collect();

        Ok(RenderNode::element(CONTAINER_TAG).with_children(children))
    }

    /// Renders the current value of a content view.
    ///
    /// # Errors
    ///
    /// Returns whatever error the extraction function reports.
    pub fn render_view(
        &self,
        content: &CellView<C>,
        default_children: &[RenderNode],
    ) -> Result<RenderNode, RenderError>
    where
        C: Content,
    {
        content.with(|value| self.render(value, default_children))
    }
}

impl RenderContentFactory<Value> {
    /// Creates a factory for JSON content that is itself a list of
    /// `{ "componentName", "props" }` objects.
    #[must_use]
    pub fn from_json() -> Self {
        Self::new(|content: &Value| Ok(Vec::<RenderComponent>::deserialize(content)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn banner_renders_as_single_child() {
        let factory = RenderContentFactory::new(|_: &Value| {
            Ok(vec![RenderComponent::new("Banner", json!({ "id": 1 }))])
        });

        let tree = factory.render(&json!({}), &[]).unwrap();

        assert_eq!(tree.tag, "div");
        assert_eq!(tree.children.len(), 1);
        let banner = &tree.children[0];
        assert_eq!(banner.tag, "Banner");
        assert_eq!(banner.props, json!({ "id": 1 }));
        assert_eq!(banner.attr("name"), Some("Banner"));
        assert!(banner.children.is_empty());
    }

    #[test]
    fn default_children_are_copied_into_every_component() {
        let factory = RenderContentFactory::new(|names: &Vec<&'static str>| {
            Ok(names.iter().map(|n| RenderComponent::new(*n, Value::Null)).collect())
        });
        let slot = vec![RenderNode::element("span").with_attr("class", "slot")];

        let tree = factory.render(&vec!["Hero", "Grid"], &slot).unwrap();

        assert_eq!(tree.children.len(), 2);
        for child in &tree.children {
            assert_eq!(child.children, slot);
        }
        assert_eq!(tree.children[1].tag, "Grid");
    }

    #[test]
    fn empty_extraction_yields_empty_container() {
        let factory = RenderContentFactory::new(|_: &Vec<u8>| Ok(Vec::new()));
        let tree = factory.render(&Vec::new(), &[]).unwrap();
        assert_eq!(tree, RenderNode::element("div"));
    }

    #[test]
    fn extraction_error_propagates() {
        let factory = RenderContentFactory::new(|_: &String| {
            Err(RenderError::Extraction("no components".to_string()))
        });
        let err = factory.render(&"page".to_string(), &[]).unwrap_err();
        assert!(matches!(err, RenderError::Extraction(ref m) if m == "no components"));
    }

    #[test]
    fn json_payloads_use_camel_case() {
        let factory = RenderContentFactory::from_json();
        let content = json!([{ "componentName": "Banner", "props": { "id": 1 } }]);

        let tree = factory.render(&content, &[]).unwrap();
        let serialized = serde_json::to_value(&tree).unwrap();

        assert_eq!(
            serialized,
            json!({
                "tag": "div",
                "children": [{
                    "tag": "Banner",
                    "attrs": { "name": "Banner" },
                    "props": { "id": 1 }
                }]
            })
        );
    }

    #[test]
    fn malformed_json_is_a_render_error() {
        let factory = RenderContentFactory::from_json();
        let err = factory.render(&json!({ "not": "a list" }), &[]).unwrap_err();
        assert!(matches!(err, RenderError::Json(_)));
    }
}
