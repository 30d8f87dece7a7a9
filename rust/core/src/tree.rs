// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed city-model tree.
//!
//! The reader converts the serialized document into owned [`CityNode`] values.
//! Everything downstream (ring extraction, wall tasks) works on this tree, so
//! the geometry pipeline never sees element names or namespaces.

#[cfg(feature = "serde")]
use serde::Serialize;

/// A linear ring as found in the document: raw coordinate text, not yet parsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RingNode {
    /// Whitespace separated `x y z` triples
    pub pos_list: String,
}

impl RingNode {
    pub fn new(pos_list: impl Into<String>) -> Self {
        Self {
            pos_list: pos_list.into(),
        }
    }
}

/// A planar polygon: one exterior ring and any number of interior rings (holes).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonNode {
    pub exterior: Option<RingNode>,
    pub interiors: Vec<RingNode>,
}

/// Kinds of node the pipeline cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Building,
    BuildingPart,
    WallSurface,
    /// The `opening` property wrapping a door or window
    OpeningProperty,
    Door,
    Window,
    Polygon(PolygonNode),
    /// Any other element, by local name
    Other(String),
}

/// Category of an opening ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OpeningKind {
    Door,
    Window,
    /// Opening content that is neither a door nor a window
    Generic,
    /// Interior ring declared directly on a polygon
    Hole,
}

/// Owned tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct CityNode {
    pub kind: NodeKind,
    pub id: Option<String>,
    pub children: Vec<CityNode>,
}

impl CityNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            id: None,
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_child(mut self, child: CityNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn polygon(polygon: PolygonNode) -> Self {
        Self::new(NodeKind::Polygon(polygon))
    }

    pub fn as_polygon(&self) -> Option<&PolygonNode> {
        match &self.kind {
            NodeKind::Polygon(p) => Some(p),
            _ => None,
        }
    }

    /// Depth-first, pre-order traversal of this node and everything beneath it.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// All polygon nodes reachable from this node, in document order.
    pub fn polygons(&self) -> impl Iterator<Item = &PolygonNode> {
        self.descendants().filter_map(CityNode::as_polygon)
    }

    /// Walk the tree, handing each polygon to `visit` together with the
    /// opening category of its closest `Door`/`Window`/`opening` ancestor.
    ///
    /// `Door` and `Window` take precedence over an enclosing opening property,
    /// and every polygon is visited exactly once.
    pub fn visit_polygons<F>(&self, mut visit: F)
    where
        F: FnMut(&PolygonNode, Option<OpeningKind>),
    {
        let mut stack: Vec<(&CityNode, Option<OpeningKind>)> = vec![(self, None)];
        while let Some((node, inherited)) = stack.pop() {
            let context = match node.kind {
                NodeKind::Door => Some(OpeningKind::Door),
                NodeKind::Window => Some(OpeningKind::Window),
                NodeKind::OpeningProperty => inherited.or(Some(OpeningKind::Generic)),
                _ => inherited,
            };
            if let NodeKind::Polygon(polygon) = &node.kind {
                visit(polygon, context);
            }
            // Reverse so that children pop in document order
            for child in node.children.iter().rev() {
                stack.push((child, context));
            }
        }
    }
}

/// Iterator returned by [`CityNode::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a CityNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a CityNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
