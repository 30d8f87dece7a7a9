// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CityGML reader.
//!
//! Converts a CityGML document into the typed [`CityNode`] tree. Elements are
//! matched by local name and namespace family. CityGML 1.0 and 2.0 keep walls
//! and openings in the building module; 3.0 moves walls and filling surfaces
//! (`DoorSurface`, `WindowSurface`) into the construction module.

use crate::error::{Error, Result};
use crate::tree::{CityNode, NodeKind, PolygonNode, RingNode};
use roxmltree::Node;
use std::path::Path;

const GML_NS_PREFIX: &str = "http://www.opengis.net/gml";
const BLDG_NS_PREFIX: &str = "http://www.opengis.net/citygml/building";
const CON_NS_PREFIX: &str = "http://www.opengis.net/citygml/construction";

/// A wall element detached from its document, ready to be processed on its own.
#[derive(Debug, Clone)]
pub struct WallTask {
    pub wall_id: String,
    /// Id of the enclosing building, if any
    pub building_id: Option<String>,
    pub wall: CityNode,
}

/// Parsed city model document
#[derive(Debug, Clone)]
pub struct CityModel {
    pub root: CityNode,
}

impl CityModel {
    /// Parse a CityGML document from text
    pub fn parse(text: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(text)?;
        let root = doc.root_element();
        if root.tag_name().name() != "CityModel" {
            return Err(Error::NotCityModel(format!(
                "root element is <{}>",
                root.tag_name().name()
            )));
        }

        Ok(Self {
            root: convert_element(root),
        })
    }

    /// Read and parse a CityGML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&text)
    }

    /// All wall surfaces in document order, each cloned into its own task.
    pub fn walls(&self) -> Vec<WallTask> {
        let mut tasks = Vec::new();
        let mut stack: Vec<(&CityNode, Option<&str>)> = vec![(&self.root, None)];

        while let Some((node, building)) = stack.pop() {
            let building = match node.kind {
                NodeKind::Building => node.id.as_deref().or(building),
                _ => building,
            };

            if node.kind == NodeKind::WallSurface {
                let wall_id = node
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("unknown_{}", tasks.len()));
                tasks.push(WallTask {
                    wall_id,
                    building_id: building.map(str::to_string),
                    wall: node.clone(),
                });
                // Walls never nest
                continue;
            }

            for child in node.children.iter().rev() {
                stack.push((child, building));
            }
        }

        tracing::debug!(walls = tasks.len(), "Collected wall surfaces");
        tasks
    }
}

fn in_namespace(node: &Node, prefix: &str) -> bool {
    node.tag_name()
        .namespace()
        .map_or(false, |ns| ns.starts_with(prefix))
}

fn is_gml(node: &Node, local: &str) -> bool {
    node.is_element() && node.tag_name().name() == local && in_namespace(node, GML_NS_PREFIX)
}

fn gml_id(node: &Node) -> Option<String> {
    node.attributes()
        .find(|a| a.name() == "id")
        .map(|a| a.value().to_string())
}

fn classify(node: &Node) -> NodeKind {
    let name = node.tag_name().name();
    if in_namespace(node, BLDG_NS_PREFIX) {
        match name {
            "Building" => return NodeKind::Building,
            "BuildingPart" => return NodeKind::BuildingPart,
            "WallSurface" => return NodeKind::WallSurface,
            "opening" => return NodeKind::OpeningProperty,
            "Door" => return NodeKind::Door,
            "Window" => return NodeKind::Window,
            _ => {}
        }
    } else if in_namespace(node, CON_NS_PREFIX) {
        match name {
            "WallSurface" => return NodeKind::WallSurface,
            "fillingSurface" | "filling" => return NodeKind::OpeningProperty,
            "DoorSurface" | "Door" => return NodeKind::Door,
            "WindowSurface" | "Window" => return NodeKind::Window,
            _ => {}
        }
    }
    NodeKind::Other(name.to_string())
}

fn convert_element(node: Node) -> CityNode {
    if is_gml(&node, "Polygon") {
        let mut city = CityNode::polygon(read_polygon(&node));
        city.id = gml_id(&node);
        return city;
    }

    CityNode {
        kind: classify(&node),
        id: gml_id(&node),
        children: node
            .children()
            .filter(Node::is_element)
            .map(convert_element)
            .collect(),
    }
}

fn read_polygon(node: &Node) -> PolygonNode {
    let mut polygon = PolygonNode::default();
    for child in node.children().filter(Node::is_element) {
        if is_gml(&child, "exterior") || is_gml(&child, "outerBoundaryIs") {
            if polygon.exterior.is_none() {
                polygon.exterior = read_boundary(&child);
            }
        } else if is_gml(&child, "interior") || is_gml(&child, "innerBoundaryIs") {
            if let Some(ring) = read_boundary(&child) {
                polygon.interiors.push(ring);
            }
        }
    }
    polygon
}

/// Read the `LinearRing` inside an exterior/interior boundary element.
fn read_boundary(boundary: &Node) -> Option<RingNode> {
    let ring = boundary
        .children()
        .find(|n| is_gml(n, "LinearRing"))?;

    if let Some(pos_list) = ring.children().find(|n| is_gml(n, "posList")) {
        return Some(RingNode::new(pos_list.text().unwrap_or("").trim()));
    }

    // GML2 style comma separated tuples
    if let Some(coordinates) = ring.children().find(|n| is_gml(n, "coordinates")) {
        let text = coordinates.text().unwrap_or("").replace(',', " ");
        return Some(RingNode::new(text.trim()));
    }

    let positions: Vec<&str> = ring
        .children()
        .filter(|n| is_gml(n, "pos"))
        .filter_map(|n| n.text())
        .map(str::trim)
        .collect();
    if positions.is_empty() {
        return None;
    }
    Some(RingNode::new(positions.join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<core:CityModel xmlns:core="http://www.opengis.net/citygml/2.0"
    xmlns:bldg="http://www.opengis.net/citygml/building/2.0"
    xmlns:gml="http://www.opengis.net/gml">
  <core:cityObjectMember>
    <bldg:Building gml:id="B1">
      <bldg:boundedBy>
        <bldg:WallSurface gml:id="W1">
          <bldg:lod3MultiSurface>
            <gml:MultiSurface>
              <gml:surfaceMember>
                <gml:Polygon gml:id="P1">
                  <gml:exterior>
                    <gml:LinearRing>
                      <gml:posList>0 0 0 10 0 0 10 0 3 0 0 3 0 0 0</gml:posList>
                    </gml:LinearRing>
                  </gml:exterior>
                  <gml:interior>
                    <gml:LinearRing>
                      <gml:pos>1 0 1</gml:pos>
                      <gml:pos>2 0 1</gml:pos>
                      <gml:pos>2 0 2</gml:pos>
                      <gml:pos>1 0 2</gml:pos>
                    </gml:LinearRing>
                  </gml:interior>
                </gml:Polygon>
              </gml:surfaceMember>
            </gml:MultiSurface>
          </bldg:lod3MultiSurface>
          <bldg:opening>
            <bldg:Door gml:id="D1">
              <bldg:lod3MultiSurface>
                <gml:MultiSurface>
                  <gml:surfaceMember>
                    <gml:Polygon>
                      <gml:exterior>
                        <gml:LinearRing>
                          <gml:posList>5 0 0 6 0 0 6 0 2 5 0 2</gml:posList>
                        </gml:LinearRing>
                      </gml:exterior>
                    </gml:Polygon>
                  </gml:surfaceMember>
                </gml:MultiSurface>
              </bldg:lod3MultiSurface>
            </bldg:Door>
          </bldg:opening>
        </bldg:WallSurface>
      </bldg:boundedBy>
      <bldg:boundedBy>
        <bldg:WallSurface/>
      </bldg:boundedBy>
    </bldg:Building>
  </core:cityObjectMember>
</core:CityModel>"#;

    #[test]
    fn test_parse_walls() {
        let model = CityModel::parse(SAMPLE).unwrap();
        let walls = model.walls();

        assert_eq!(walls.len(), 2);
        assert_eq!(walls[0].wall_id, "W1");
        assert_eq!(walls[0].building_id.as_deref(), Some("B1"));
        assert_eq!(walls[1].wall_id, "unknown_1");
    }

    #[test]
    fn test_polygon_rings() {
        let model = CityModel::parse(SAMPLE).unwrap();
        let walls = model.walls();
        let polygons: Vec<_> = walls[0].wall.polygons().collect();

        assert_eq!(polygons.len(), 2);
        let facade = polygons[0];
        assert_eq!(
            facade.exterior.as_ref().unwrap().pos_list,
            "0 0 0 10 0 0 10 0 3 0 0 3 0 0 0"
        );
        assert_eq!(facade.interiors.len(), 1);
        assert_eq!(facade.interiors[0].pos_list, "1 0 1 2 0 1 2 0 2 1 0 2");
    }

    #[test]
    fn test_opening_structure() {
        let model = CityModel::parse(SAMPLE).unwrap();
        let wall = &model.walls()[0].wall;
        let door = wall
            .descendants()
            .find(|n| n.kind == NodeKind::Door)
            .unwrap();
        assert_eq!(door.id.as_deref(), Some("D1"));
        assert!(wall
            .descendants()
            .any(|n| n.kind == NodeKind::OpeningProperty));
    }

    #[test]
    fn test_citygml3_construction_module() {
        let text = r#"<core:CityModel xmlns:core="http://www.opengis.net/citygml/3.0"
    xmlns:bldg="http://www.opengis.net/citygml/building/3.0"
    xmlns:con="http://www.opengis.net/citygml/construction/3.0"
    xmlns:gml="http://www.opengis.net/gml/3.2">
  <core:cityObjectMember>
    <bldg:Building gml:id="B3">
      <core:boundary>
        <con:WallSurface gml:id="W3">
          <core:lod3MultiSurface>
            <gml:MultiSurface>
              <gml:surfaceMember>
                <gml:Polygon>
                  <gml:exterior>
                    <gml:LinearRing>
                      <gml:posList>0 0 0 10 0 0 10 0 3 0 0 3</gml:posList>
                    </gml:LinearRing>
                  </gml:exterior>
                </gml:Polygon>
              </gml:surfaceMember>
            </gml:MultiSurface>
          </core:lod3MultiSurface>
          <con:fillingSurface>
            <con:WindowSurface gml:id="WS1">
              <core:lod3MultiSurface>
                <gml:MultiSurface>
                  <gml:surfaceMember>
                    <gml:Polygon>
                      <gml:exterior>
                        <gml:LinearRing>
                          <gml:posList>2 0 1 3 0 1 3 0 2 2 0 2</gml:posList>
                        </gml:LinearRing>
                      </gml:exterior>
                    </gml:Polygon>
                  </gml:surfaceMember>
                </gml:MultiSurface>
              </core:lod3MultiSurface>
            </con:WindowSurface>
          </con:fillingSurface>
        </con:WallSurface>
      </core:boundary>
    </bldg:Building>
  </core:cityObjectMember>
</core:CityModel>"#;

        let walls = CityModel::parse(text).unwrap().walls();
        assert_eq!(walls.len(), 1);
        assert_eq!(walls[0].wall_id, "W3");
        assert_eq!(walls[0].building_id.as_deref(), Some("B3"));

        let wall = &walls[0].wall;
        assert_eq!(wall.polygons().count(), 2);
        let window = wall
            .descendants()
            .find(|n| n.kind == NodeKind::Window)
            .unwrap();
        assert_eq!(window.id.as_deref(), Some("WS1"));
        assert!(wall
            .descendants()
            .any(|n| n.kind == NodeKind::OpeningProperty));
    }

    #[test]
    fn test_rejects_non_city_model() {
        assert!(matches!(
            CityModel::parse("<foo/>"),
            Err(Error::NotCityModel(_))
        ));
        assert!(matches!(CityModel::parse("<broken"), Err(Error::Xml(_))));
    }
}
