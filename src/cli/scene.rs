//! Scene files: a declarative TOML description of map entities plus a
//! simulated host render structure to annotate.
//!
//! The scene loader plays the host integration: it builds the render tree a
//! mapping library would have produced (panes, icons, popups, SVG groups)
//! and a [`TargetDiscovery`] that knows where each entity's render target
//! lives. Entities marked `deferred` model targets the host has not
//! produced yet; their discovery stays empty until the matching readiness
//! signal fires.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::entity::{
    Discovery, Entity, EntityId, EntityShape, LifecycleEvent, SubLayer, TargetDiscovery,
};
use crate::errors::{AnnotationError, AnnotationResult};
use crate::geometry::{Geometry, LatLng, LatLngBounds};
use crate::properties::SemanticOptions;
use crate::render::{NodeId, RenderTree};

/// Entity categories a scene can declare, mirroring the render paths of a
/// typical web mapping host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Marker,
    Popup,
    ImageOverlay,
    Circle,
    Vector,
    Group,
}

impl EntityKind {
    pub fn parse(name: &str) -> AnnotationResult<Self> {
        match name {
            "marker" => Ok(EntityKind::Marker),
            "popup" => Ok(EntityKind::Popup),
            "image-overlay" => Ok(EntityKind::ImageOverlay),
            "circle" => Ok(EntityKind::Circle),
            "vector" => Ok(EntityKind::Vector),
            "group" => Ok(EntityKind::Group),
            other => Err(AnnotationError::Scene {
                path: PathBuf::from("<scene>"),
                reason: format!("unknown entity kind {:?}", other),
            }),
        }
    }

    /// The readiness signal this category's host fires once the render
    /// target exists.
    pub fn readiness_event(&self) -> LifecycleEvent {
        match self {
            EntityKind::Popup => LifecycleEvent::Open,
            EntityKind::ImageOverlay => LifecycleEvent::Load,
            _ => LifecycleEvent::Add,
        }
    }
}

/// One entity staged for annotation, with its category and deferral flag.
#[derive(Debug, Clone)]
pub struct StagedEntity {
    pub entity: Entity,
    pub kind: EntityKind,
    pub deferred: bool,
}

/// Target lookup for scene-built render trees.
#[derive(Debug, Default)]
pub struct SceneDiscovery {
    found: HashMap<EntityId, Discovery>,
    withheld: HashSet<EntityId>,
}

impl SceneDiscovery {
    /// Release a deferred entity's target, as a host readiness signal would.
    pub fn mark_ready(&mut self, id: &EntityId) {
        self.withheld.remove(id);
    }
}

impl TargetDiscovery for SceneDiscovery {
    fn discover(&self, _host: &RenderTree, entity: &Entity) -> Discovery {
        if self.withheld.contains(&entity.id) {
            return Discovery::default();
        }
        self.found.get(&entity.id).cloned().unwrap_or_default()
    }
}

/// A parsed scene: the simulated host tree plus staged entities and their
/// discovery glue.
#[derive(Debug)]
pub struct Scene {
    pub host: RenderTree,
    pub root: NodeId,
    pub staged: Vec<StagedEntity>,
    pub discovery: SceneDiscovery,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SceneFile {
    entity: Vec<EntityDecl>,
}

#[derive(Debug, Deserialize)]
struct EntityDecl {
    kind: String,
    itemtype: String,
    id: Option<String>,
    geoprop: Option<String>,
    dom_id: Option<String>,
    #[serde(default)]
    deferred: bool,
    point: Option<String>,
    bounds: Option<String>,
    vertices: Option<String>,
    #[serde(default)]
    options: SemanticOptions,
    #[serde(default)]
    layers: Vec<LayerDecl>,
}

#[derive(Debug, Deserialize)]
struct LayerDecl {
    id: Option<String>,
    point: Option<String>,
    bounds: Option<String>,
    vertices: Option<String>,
}

impl Scene {
    #[instrument(level = "debug")]
    pub fn load(path: &Path) -> AnnotationResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AnnotationError::Scene {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&text).map_err(|e| match e {
            AnnotationError::Scene { reason, .. } => AnnotationError::Scene {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_toml(text: &str) -> AnnotationResult<Self> {
        let file: SceneFile = toml::from_str(text).map_err(|e| AnnotationError::Scene {
            path: PathBuf::from("<scene>"),
            reason: e.to_string(),
        })?;

        let mut builder = HostBuilder::new();
        let mut staged = Vec::new();
        let mut discovery = SceneDiscovery::default();

        for decl in file.entity {
            let kind = EntityKind::parse(&decl.kind)?;
            let id = decl
                .id
                .clone()
                .map(EntityId::from_host)
                .unwrap_or_else(EntityId::generate);
            let (shape, layer_ids) = resolve_shape(kind, &decl)?;

            let entity = Entity {
                id: id.clone(),
                itemtype: decl.itemtype,
                options: decl.options,
                geoprop: decl.geoprop,
                dom_id: decl.dom_id,
                shape,
            };

            let found = builder.stage(kind, layer_ids.len());
            debug!(entity = %id, ?kind, deferred = decl.deferred, "staged scene entity");
            discovery.found.insert(id.clone(), found);
            if decl.deferred {
                discovery.withheld.insert(id);
            }
            staged.push(StagedEntity {
                entity,
                kind,
                deferred: decl.deferred,
            });
        }

        let (host, root) = builder.finish();
        Ok(Scene {
            host,
            root,
            staged,
            discovery,
        })
    }
}

/// Derive the spatial classification from the declared geometry literals.
fn resolve_shape(kind: EntityKind, decl: &EntityDecl) -> AnnotationResult<(EntityShape, Vec<EntityId>)> {
    if kind == EntityKind::Group {
        let mut layers = Vec::new();
        let mut ids = Vec::new();
        for layer in &decl.layers {
            let id = layer
                .id
                .clone()
                .map(EntityId::from_host)
                .unwrap_or_else(EntityId::generate);
            let geometry = layer_geometry(layer)?;
            ids.push(id.clone());
            layers.push(SubLayer { id, geometry });
        }
        return Ok((EntityShape::LayerGroup(layers), ids));
    }

    let shape = if let Some(literal) = &decl.point {
        EntityShape::Point(parse_pair(literal)?)
    } else if let Some(literal) = &decl.bounds {
        EntityShape::BoundingBox(parse_bounds(literal)?)
    } else if let Some(literal) = &decl.vertices {
        EntityShape::Polygon(parse_pairs(literal)?)
    } else {
        // No geometry declared; the engine degrades this to an
        // entity-local skip instead of rejecting the scene.
        EntityShape::Polygon(Vec::new())
    };
    Ok((shape, Vec::new()))
}

fn layer_geometry(layer: &LayerDecl) -> AnnotationResult<Geometry> {
    if let Some(literal) = &layer.point {
        Ok(Geometry::Point(parse_pair(literal)?))
    } else if let Some(literal) = &layer.bounds {
        Ok(Geometry::Box(parse_bounds(literal)?))
    } else if let Some(literal) = &layer.vertices {
        Ok(Geometry::Polygon(parse_pairs(literal)?))
    } else {
        Err(AnnotationError::MissingGeometry)
    }
}

fn pair_regex() -> &'static Regex {
    static PAIR: OnceLock<Regex> = OnceLock::new();
    PAIR.get_or_init(|| {
        Regex::new(r"^(-?[0-9]+(?:\.[0-9]+)?),(-?[0-9]+(?:\.[0-9]+)?)$")
            .expect("coordinate pattern")
    })
}

/// `"lat,lng"`
fn parse_pair(literal: &str) -> AnnotationResult<LatLng> {
    let trimmed = literal.trim();
    let caps = pair_regex()
        .captures(trimmed)
        .ok_or_else(|| AnnotationError::Scene {
            path: PathBuf::from("<scene>"),
            reason: format!("invalid coordinate pair {:?}", literal),
        })?;
    // The pattern guarantees both captures parse as f64.
    Ok(LatLng::new(caps[1].parse().unwrap_or(0.0), caps[2].parse().unwrap_or(0.0)))
}

/// Whitespace separated pairs: `"lat,lng lat,lng ..."`
fn parse_pairs(literal: &str) -> AnnotationResult<Vec<LatLng>> {
    literal.split_whitespace().map(parse_pair).collect()
}

/// Two corner pairs, south-west first: `"lat,lng lat,lng"`
fn parse_bounds(literal: &str) -> AnnotationResult<LatLngBounds> {
    let pairs = parse_pairs(literal)?;
    if pairs.len() != 2 {
        return Err(AnnotationError::Scene {
            path: PathBuf::from("<scene>"),
            reason: format!("bounds need exactly two corners, got {}", pairs.len()),
        });
    }
    Ok(LatLngBounds {
        south_west: pairs[0],
        north_east: pairs[1],
    })
}

/// Builds the render tree a mapping host would have produced. Panes are
/// shared between entities of the same category, as they are in real hosts.
struct HostBuilder {
    host: RenderTree,
    root: NodeId,
    map_pane: NodeId,
    marker_pane: Option<NodeId>,
    overlay_pane: Option<NodeId>,
    svg: Option<NodeId>,
}

impl HostBuilder {
    fn new() -> Self {
        let mut host = RenderTree::new();
        let root = host.create_element("div");
        host.set_attr(root, "class", "map-container");
        let map_pane = host.create_element("div");
        host.set_attr(map_pane, "class", "map-pane");
        // Root attach is infallible for freshly created nodes.
        let _ = host.append_child(root, map_pane);
        Self {
            host,
            root,
            map_pane,
            marker_pane: None,
            overlay_pane: None,
            svg: None,
        }
    }

    fn stage(&mut self, kind: EntityKind, layer_count: usize) -> Discovery {
        match kind {
            EntityKind::Marker => {
                let pane = self.marker_pane("marker-pane");
                let icon = self.child_of(pane, "img", &[("class", "marker-icon")]);
                Discovery {
                    target: Some(icon),
                    sub_groups: Vec::new(),
                }
            }
            EntityKind::ImageOverlay => {
                let pane = self.overlay_pane("overlay-pane");
                let image = self.child_of(pane, "img", &[("class", "image-layer")]);
                Discovery {
                    target: Some(image),
                    sub_groups: Vec::new(),
                }
            }
            EntityKind::Popup => {
                // Popups get a private wrapper; its slot is not a shared
                // pane, so annotation displaces the sibling tip node.
                let wrapper = self.child_of(self.map_pane, "div", &[("class", "popup")]);
                let content = self.child_of(wrapper, "div", &[("class", "popup-content")]);
                let _tip = self.child_of(wrapper, "div", &[("class", "popup-tip")]);
                Discovery {
                    target: Some(content),
                    sub_groups: Vec::new(),
                }
            }
            EntityKind::Circle | EntityKind::Vector => {
                let svg = self.svg_root();
                let group = self.child_of(svg, "g", &[]);
                let _path = self.child_of(group, "path", &[]);
                Discovery {
                    target: Some(group),
                    sub_groups: Vec::new(),
                }
            }
            EntityKind::Group => {
                let svg = self.svg_root();
                let outer = self.child_of(svg, "g", &[]);
                let sub_groups = (0..layer_count)
                    .map(|_| {
                        let inner = self.child_of(outer, "g", &[]);
                        let _path = self.child_of(inner, "path", &[]);
                        inner
                    })
                    .collect();
                Discovery {
                    target: Some(outer),
                    sub_groups,
                }
            }
        }
    }

    fn marker_pane(&mut self, class: &str) -> NodeId {
        if let Some(pane) = self.marker_pane {
            return pane;
        }
        let pane = self.child_of(self.map_pane, "div", &[("class", class)]);
        self.marker_pane = Some(pane);
        pane
    }

    fn overlay_pane(&mut self, class: &str) -> NodeId {
        if let Some(pane) = self.overlay_pane {
            return pane;
        }
        let pane = self.child_of(self.map_pane, "div", &[("class", class)]);
        self.overlay_pane = Some(pane);
        pane
    }

    fn svg_root(&mut self) -> NodeId {
        if let Some(svg) = self.svg {
            return svg;
        }
        let svg = self.child_of(self.map_pane, "svg", &[]);
        self.svg = Some(svg);
        svg
    }

    fn child_of(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let node = self.host.create_element(tag);
        for (key, value) in attrs {
            self.host.set_attr(node, key, value);
        }
        let _ = self.host.append_child(parent, node);
        node
    }

    fn finish(self) -> (RenderTree, NodeId) {
        (self.host, self.root)
    }
}
