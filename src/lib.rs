//! mapnotate: Schema.org Microdata synthesis for map render structures.
//!
//! The engine takes renderable map entities (markers, popups, overlays,
//! vector shapes, layer groups) carrying declarative semantic options and
//! splices machine-readable annotation containers into a model of the
//! host's render tree. Geographic data is encoded as `GeoCoordinates` /
//! `GeoShape` indicator nodes; bibliographic options map onto legacy
//! Dublin Core namespaces.
//!
//! Entry point is [`annotate::Annotator`]; host integrations supply a
//! [`entity::TargetDiscovery`] implementation and feed lifecycle events
//! through [`annotate::Annotator::handle_event`].

pub mod annotate;
pub mod builder;
pub mod cli;
pub mod config;
pub mod entity;
pub mod errors;
pub mod geometry;
pub mod properties;
pub mod render;
pub mod util;
pub mod vocabulary;

pub use annotate::{AnnotationState, Annotator, RenderSplice};
pub use builder::{AnnotationNode, ElementBuilder};
pub use config::Settings;
pub use entity::{Discovery, Entity, EntityId, EntityShape, LifecycleEvent, SubLayer, TargetDiscovery};
pub use errors::{AnnotationError, AnnotationResult};
pub use geometry::{encode, GeoEncoding, GeoKind, Geometry, LatLng, LatLngBounds};
pub use properties::{map_options, SemanticOptions};
pub use render::{AdoptHandle, NodeId, RenderNode, RenderTree};
