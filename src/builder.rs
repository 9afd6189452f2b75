//! Declarative builder for annotation trees.
//!
//! An [`AnnotationNode`] is a generic labeled tree: element kind, ordered
//! attribute pairs, synthetic children and at most one adopted reference to
//! an existing host render node. The builder knows nothing about Microdata
//! shapes; malformed trees are caught at realization time, not here.

use crate::render::NodeId;

/// Snapshot of one element in an annotation tree.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationNode {
    /// Element kind ("article", "metadata", "meta", "div", "g", ...)
    pub kind: String,
    /// Attribute pairs in emission order
    pub attrs: Vec<(String, String)>,
    /// Synthetic child nodes, ordered
    pub children: Vec<AnnotationNode>,
    /// Existing host node re-parented under this element, appended after all
    /// synthetic children at realization time
    pub adopted: Option<NodeId>,
}

/// Chainable builder producing [`AnnotationNode`] snapshots.
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    node: AnnotationNode,
}

impl ElementBuilder {
    pub fn element(kind: &str, attrs: &[(&str, &str)]) -> Self {
        Self {
            node: AnnotationNode {
                kind: kind.to_string(),
                attrs: attrs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                children: Vec::new(),
                adopted: None,
            },
        }
    }

    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.node.attrs.push((key.to_string(), value.to_string()));
        self
    }

    /// Re-parent an existing host node under this element. A later call
    /// replaces the earlier reference; a node holds at most one.
    pub fn adopting(mut self, target: NodeId) -> Self {
        self.node.adopted = Some(target);
        self
    }

    pub fn child(mut self, child: ElementBuilder) -> Self {
        self.node.children.push(child.build());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = ElementBuilder>) -> Self {
        for child in children {
            self.node.children.push(child.build());
        }
        self
    }

    /// Idempotent structural snapshot; calling twice yields equal trees.
    pub fn build(&self) -> AnnotationNode {
        self.node.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_nested_builders_when_building_then_returns_ordered_tree() {
        let tree = ElementBuilder::element("article", &[("itemscope", "")])
            .child(ElementBuilder::element(
                "meta",
                &[("itemprop", "name"), ("content", "a")],
            ))
            .child(ElementBuilder::element(
                "meta",
                &[("itemprop", "description"), ("content", "b")],
            ))
            .build();

        assert_eq!(tree.kind, "article");
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].attrs[1].1, "a");
        assert_eq!(tree.children[1].attrs[1].1, "b");
    }

    #[test]
    fn given_builder_when_building_twice_then_snapshots_are_equal() {
        let builder = ElementBuilder::element("div", &[("itemprop", "geo")])
            .child(ElementBuilder::element("meta", &[("itemprop", "latitude")]));

        assert_eq!(builder.build(), builder.build());
    }

    #[test]
    fn given_children_iterator_when_building_then_order_is_preserved() {
        let kids = vec![
            ElementBuilder::element("meta", &[("itemprop", "latitude")]),
            ElementBuilder::element("meta", &[("itemprop", "longitude")]),
        ];
        let tree = ElementBuilder::element("div", &[]).children(kids).build();
        assert_eq!(tree.children[0].attrs[0].1, "latitude");
        assert_eq!(tree.children[1].attrs[0].1, "longitude");
    }
}
