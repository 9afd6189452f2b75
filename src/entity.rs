//! Entity model and the lifecycle-adapter contract.
//!
//! The host owns entity lifetime; the engine only observes it. Host-side
//! attribute probing (does the object carry `_latlng`, `_bounds`,
//! `_layers`?) happens exactly once, at the boundary, producing the tagged
//! [`EntityShape`] variants the orchestrator switches on.

use std::fmt;

use uuid::Uuid;

use crate::geometry::{Geometry, LatLng, LatLngBounds};
use crate::properties::SemanticOptions;
use crate::render::{NodeId, RenderTree};

/// Stable identity token of one entity, host-assigned or generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityId(String);

impl EntityId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_host(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One sub-layer of an aggregate entity, rendered as its own graphical
/// group by the host.
#[derive(Debug, Clone)]
pub struct SubLayer {
    pub id: EntityId,
    pub geometry: Geometry,
}

/// Spatial classification of an entity, tagged once at adapter level.
#[derive(Debug, Clone)]
pub enum EntityShape {
    Point(LatLng),
    BoundingBox(LatLngBounds),
    Polygon(Vec<LatLng>),
    /// Aggregate with sub-layers; each sub-layer carries its own geometry
    /// and is annotated inside its own graphical group.
    LayerGroup(Vec<SubLayer>),
}

impl EntityShape {
    /// Geometry of a non-aggregate shape, if present.
    pub fn geometry(&self) -> Option<Geometry> {
        match self {
            EntityShape::Point(latlng) => Some(Geometry::Point(*latlng)),
            EntityShape::BoundingBox(bounds) => Some(Geometry::Box(*bounds)),
            EntityShape::Polygon(vertices) => Some(Geometry::Polygon(vertices.clone())),
            EntityShape::LayerGroup(_) => None,
        }
    }
}

/// A renderable map object as seen by the annotation engine.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    /// Declared Schema.org type name ("Place", "CreativeWork", ...)
    pub itemtype: String,
    pub options: SemanticOptions,
    /// Override for the geo property name; engine default applies if unset
    pub geoprop: Option<String>,
    /// Caller-assigned `id` attribute for the produced container
    pub dom_id: Option<String>,
    pub shape: EntityShape,
}

impl Entity {
    pub fn new(itemtype: impl Into<String>, shape: EntityShape) -> Self {
        Self {
            id: EntityId::generate(),
            itemtype: itemtype.into(),
            options: SemanticOptions::default(),
            geoprop: None,
            dom_id: None,
            shape,
        }
    }
}

/// Render lifecycle signals the engine consumes. Names are host-defined;
/// the engine requires only that each fires at most once per transition and
/// that a detach eventually follows a prior attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Entity attached to the map (markers)
    Add,
    /// Popup-like entity opened
    Open,
    /// Deferred resource became available (image overlays)
    Load,
    /// Popup-like entity closed; its render target is torn down
    Close,
    /// Entity removed from the map
    Remove,
}

impl LifecycleEvent {
    /// Events that signal the render target may now be discoverable.
    pub fn is_readiness_signal(&self) -> bool {
        matches!(self, LifecycleEvent::Add | LifecycleEvent::Open | LifecycleEvent::Load)
    }
}

/// What target discovery found for an entity at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// The entity's current render target, if the host has built it yet
    pub target: Option<NodeId>,
    /// For aggregates: one graphical group container per sub-layer, in
    /// sub-layer order
    pub sub_groups: Vec<NodeId>,
}

/// Per-entity-category glue supplied by the host integration: how to find
/// the entity's current render target, which may not exist yet.
pub trait TargetDiscovery {
    fn discover(&self, host: &RenderTree, entity: &Entity) -> Discovery;
}
