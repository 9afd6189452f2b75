//! Geometry model and the geo-representation encoder.
//!
//! Encodings are bit-exact and order-preserving:
//! - point: two sibling meta nodes (`latitude`, `longitude`)
//! - box: one `box` node, `"<sw.lat>,<sw.lng> <ne.lat>,<ne.lng>"`
//! - shape: one `polygon` node, flattened `lat,lng,lat,lng,...` in declared
//!   vertex order (the order encodes the polygon boundary and must never be
//!   re-sorted)

use itertools::Itertools;
use serde::Deserialize;

use crate::builder::ElementBuilder;
use crate::errors::{AnnotationError, AnnotationResult};

/// WGS84 coordinate pair. Values are emitted with shortest round-trip
/// formatting, so source precision survives the trip through `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Axis-aligned bounding box, south-west then north-east corner.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

/// Spatial data of one renderable entity, tagged once at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(LatLng),
    Box(LatLngBounds),
    Polygon(Vec<LatLng>),
}

/// Declared geometry-kind names as they appear in entity configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoKind {
    Point,
    Box,
    Shape,
}

impl GeoKind {
    /// Boundary conversion of a declared kind name. Unknown names are the
    /// `UnsupportedGeometryKind` condition; the orchestrator logs and skips
    /// the entity rather than aborting the batch.
    pub fn parse(name: &str) -> AnnotationResult<Self> {
        match name {
            "point" => Ok(GeoKind::Point),
            "box" => Ok(GeoKind::Box),
            "shape" | "polygon" => Ok(GeoKind::Shape),
            other => Err(AnnotationError::UnsupportedGeometryKind(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GeoKind::Point => "point",
            GeoKind::Box => "box",
            GeoKind::Shape => "shape",
        }
    }
}

impl Geometry {
    pub fn kind(&self) -> GeoKind {
        match self {
            Geometry::Point(_) => GeoKind::Point,
            Geometry::Box(_) => GeoKind::Box,
            Geometry::Polygon(_) => GeoKind::Shape,
        }
    }
}

/// Result of encoding one geometry: the nested Schema.org type the
/// indicators live under plus the indicator meta nodes themselves.
#[derive(Debug, Clone)]
pub struct GeoEncoding {
    /// `GeoCoordinates` for points, `GeoShape` for boxes and polygons
    pub nested_type: &'static str,
    /// Attribute meta nodes, in emission order
    pub indicators: Vec<ElementBuilder>,
}

/// Encode a geometry into its canonical attribute representation.
///
/// Deterministic and idempotent; an empty polygon degrades to
/// `MissingGeometry` so the entity is skipped instead of emitting an empty
/// boundary.
pub fn encode(geometry: &Geometry) -> AnnotationResult<GeoEncoding> {
    match geometry {
        Geometry::Point(latlng) => Ok(GeoEncoding {
            nested_type: "GeoCoordinates",
            indicators: vec![
                meta_content("latitude", &latlng.lat.to_string()),
                meta_content("longitude", &latlng.lng.to_string()),
            ],
        }),
        Geometry::Box(bounds) => Ok(GeoEncoding {
            nested_type: "GeoShape",
            indicators: vec![meta_content("box", &encode_box(bounds))],
        }),
        Geometry::Polygon(vertices) => {
            if vertices.is_empty() {
                return Err(AnnotationError::MissingGeometry);
            }
            Ok(GeoEncoding {
                nested_type: "GeoShape",
                indicators: vec![meta_content("polygon", &encode_polygon(vertices))],
            })
        }
    }
}

/// `"<sw.lat>,<sw.lng> <ne.lat>,<ne.lng>"` — comma within a corner, space
/// between corners.
fn encode_box(bounds: &LatLngBounds) -> String {
    format!(
        "{},{} {},{}",
        bounds.south_west.lat, bounds.south_west.lng, bounds.north_east.lat, bounds.north_east.lng
    )
}

/// Flattened `lat,lng,lat,lng,...` sequence in declared vertex order.
fn encode_polygon(vertices: &[LatLng]) -> String {
    vertices
        .iter()
        .flat_map(|v| [v.lat, v.lng])
        .map(|c| c.to_string())
        .join(",")
}

fn meta_content(itemprop: &str, content: &str) -> ElementBuilder {
    ElementBuilder::element("meta", &[("itemprop", itemprop), ("content", content)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr<'a>(node: &'a crate::builder::AnnotationNode, key: &str) -> &'a str {
        node.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn given_point_when_encoding_then_latitude_precedes_longitude() {
        let encoding = encode(&Geometry::Point(LatLng::new(51.505, -0.09))).unwrap();
        assert_eq!(encoding.nested_type, "GeoCoordinates");
        assert_eq!(encoding.indicators.len(), 2);

        let lat = encoding.indicators[0].build();
        let lng = encoding.indicators[1].build();
        assert_eq!(attr(&lat, "itemprop"), "latitude");
        assert_eq!(attr(&lat, "content"), "51.505");
        assert_eq!(attr(&lng, "itemprop"), "longitude");
        assert_eq!(attr(&lng, "content"), "-0.09");
    }

    #[test]
    fn given_box_when_encoding_then_corner_format_is_exact() {
        let bounds = LatLngBounds {
            south_west: LatLng::new(54.559, -5.765),
            north_east: LatLng::new(56.122, -3.02),
        };
        let encoding = encode(&Geometry::Box(bounds)).unwrap();
        assert_eq!(encoding.nested_type, "GeoShape");
        let node = encoding.indicators[0].build();
        assert_eq!(attr(&node, "itemprop"), "box");
        assert_eq!(attr(&node, "content"), "54.559,-5.765 56.122,-3.02");
    }

    #[test]
    fn given_box_when_encoding_twice_then_output_is_identical() {
        let bounds = LatLngBounds {
            south_west: LatLng::new(1.5, 2.5),
            north_east: LatLng::new(3.5, 4.5),
        };
        let first = encode(&Geometry::Box(bounds)).unwrap().indicators[0].build();
        let second = encode(&Geometry::Box(bounds)).unwrap().indicators[0].build();
        assert_eq!(first, second);
    }

    #[test]
    fn given_polygon_when_encoding_then_vertex_order_is_preserved() {
        let vertices = vec![
            LatLng::new(51.0, 7.0),
            LatLng::new(51.5, 7.2),
            LatLng::new(51.2, 7.9),
        ];
        let node = encode(&Geometry::Polygon(vertices.clone())).unwrap().indicators[0].build();
        assert_eq!(attr(&node, "content"), "51,7,51.5,7.2,51.2,7.9");

        // 2N tokens, original order
        let tokens: Vec<&str> = attr(&node, "content").split(',').collect();
        assert_eq!(tokens.len(), 2 * vertices.len());

        // Reordering vertices must change the output.
        let mut reversed = vertices;
        reversed.reverse();
        let reordered = encode(&Geometry::Polygon(reversed)).unwrap().indicators[0].build();
        assert_ne!(attr(&node, "content"), attr(&reordered, "content"));
    }

    #[test]
    fn given_empty_polygon_when_encoding_then_missing_geometry() {
        let result = encode(&Geometry::Polygon(vec![]));
        assert!(matches!(result, Err(AnnotationError::MissingGeometry)));
    }

    #[test]
    fn given_kind_names_when_parsing_then_unknown_names_are_rejected() {
        assert_eq!(GeoKind::parse("point").unwrap(), GeoKind::Point);
        assert_eq!(GeoKind::parse("box").unwrap(), GeoKind::Box);
        assert_eq!(GeoKind::parse("shape").unwrap(), GeoKind::Shape);
        assert_eq!(GeoKind::parse("polygon").unwrap(), GeoKind::Shape);
        assert!(matches!(
            GeoKind::parse("blob"),
            Err(AnnotationError::UnsupportedGeometryKind(name)) if name == "blob"
        ));
    }
}
