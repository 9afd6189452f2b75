//! The annotation orchestrator.
//!
//! Per entity, one synchronous attempt runs resolve -> build -> splice and
//! ends in a terminal state, `Annotated` or `Skipped`. An entity whose
//! render target is not discoverable yet parks in `Pending`; a later
//! readiness signal triggers exactly one fresh attempt. All failures are
//! entity-local: a skip is logged and recorded, never raised across
//! entities.
//!
//! The build phase is pure: the full annotation tree is assembled and the
//! geo-placement decision validated before the host tree is touched. A
//! realization failure rolls the partially created subtree back, so a
//! cancelled attempt leaves no dangling nodes.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use crate::builder::{AnnotationNode, ElementBuilder};
use crate::config::Settings;
use crate::entity::{Discovery, Entity, EntityId, EntityShape, LifecycleEvent, TargetDiscovery};
use crate::errors::{AnnotationError, AnnotationResult};
use crate::geometry::{encode, Geometry};
use crate::properties::map_options;
use crate::render::{AdoptHandle, NodeId, RenderTree};
use crate::vocabulary;

/// Record of where one annotation container was attached and what it
/// displaced, so detachment can unwind the splice mechanically.
#[derive(Debug)]
pub struct RenderSplice {
    /// The realized annotation container node
    pub container: NodeId,
    /// Parent slot the container was attached into
    pub slot: NodeId,
    /// Reversal handle for the re-parented original render node, if the
    /// inline strategy adopted one
    pub adopted: Option<AdoptHandle>,
    /// Original child order of the slot, recorded when sibling content was
    /// displaced; `None` when nothing was displaced
    pub displaced_order: Option<Vec<NodeId>>,
}

/// Terminal and waiting states of one entity's annotation sequence.
#[derive(Debug)]
pub enum AnnotationState {
    /// Target not yet discoverable; waiting for a readiness signal
    Pending,
    /// Annotation trees spliced into the host structure
    Annotated(Vec<RenderSplice>),
    /// Annotation abandoned for this entity; reason logged
    Skipped(AnnotationError),
}

impl AnnotationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AnnotationState::Pending)
    }
}

/// The annotation engine. Holds read-only settings and per-entity state;
/// never owns entity lifetime.
#[derive(Debug, Default)]
pub struct Annotator {
    settings: Settings,
    states: HashMap<EntityId, AnnotationState>,
}

impl Annotator {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            states: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self, id: &EntityId) -> Option<&AnnotationState> {
        self.states.get(id)
    }

    /// Initial annotation request, fired when the host creates the entity.
    /// If the render target is not discoverable yet the entity parks in
    /// `Pending` and produces no output.
    #[instrument(level = "debug", skip(self, host, entity, discovery), fields(entity = %entity.id))]
    pub fn request(
        &mut self,
        host: &mut RenderTree,
        entity: &Entity,
        discovery: &dyn TargetDiscovery,
    ) -> &AnnotationState {
        if self
            .states
            .get(&entity.id)
            .is_some_and(AnnotationState::is_terminal)
        {
            debug!("entity already reached a terminal state");
            return &self.states[&entity.id];
        }
        let state = self.resolve(host, entity, discovery);
        self.store(entity, state)
    }

    /// Feed one host lifecycle signal through the state machine.
    ///
    /// Readiness signals (`Add`, `Open`, `Load`) re-run target discovery for
    /// a pending entity; at most one attempt follows. `Close` unwinds the
    /// splice and re-parks the entity (a reopened popup gets a fresh render
    /// target). `Remove` unwinds and forgets the entity, so no state remains.
    #[instrument(level = "debug", skip(self, host, entity, discovery), fields(entity = %entity.id, ?event))]
    pub fn handle_event(
        &mut self,
        host: &mut RenderTree,
        entity: &Entity,
        discovery: &dyn TargetDiscovery,
        event: LifecycleEvent,
    ) -> Option<&AnnotationState> {
        match event {
            _ if event.is_readiness_signal() => {
                if matches!(self.states.get(&entity.id), Some(AnnotationState::Pending)) {
                    let state = self.resolve(host, entity, discovery);
                    return Some(self.store(entity, state));
                }
                Some(self.store_if_absent(entity))
            }
            LifecycleEvent::Close => {
                self.unwind(host, &entity.id);
                Some(self.store(entity, AnnotationState::Pending))
            }
            LifecycleEvent::Remove => {
                self.unwind(host, &entity.id);
                None
            }
            // Guard arms do not count towards exhaustiveness.
            _ => Some(self.store_if_absent(entity)),
        }
    }

    /// Detach an entity: restore the original render target reference and
    /// remove every spliced node, then forget the entity.
    #[instrument(level = "debug", skip(self, host))]
    pub fn detach(&mut self, host: &mut RenderTree, id: &EntityId) -> AnnotationResult<()> {
        if !self.states.contains_key(id) {
            return Err(AnnotationError::UnknownEntity(id.to_string()));
        }
        self.unwind(host, id);
        self.states.remove(id);
        Ok(())
    }

    fn store(&mut self, entity: &Entity, state: AnnotationState) -> &AnnotationState {
        match self.states.entry(entity.id.clone()) {
            Entry::Occupied(mut slot) => {
                slot.insert(state);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(state),
        }
    }

    fn store_if_absent(&mut self, entity: &Entity) -> &AnnotationState {
        self.states
            .entry(entity.id.clone())
            .or_insert(AnnotationState::Pending)
    }

    /// One full resolve -> build -> splice pass.
    fn resolve(
        &self,
        host: &mut RenderTree,
        entity: &Entity,
        discovery: &dyn TargetDiscovery,
    ) -> AnnotationState {
        let found = discovery.discover(host, entity);
        let Some(target) = found.target else {
            debug!("render target not yet available, deferring");
            return AnnotationState::Pending;
        };

        match self.attempt(host, entity, target, &found) {
            Ok(splices) => AnnotationState::Annotated(splices),
            Err(reason) => {
                warn!(entity = %entity.id, itemtype = %entity.itemtype, %reason,
                    "skipping semantic annotation of entity");
                AnnotationState::Skipped(reason)
            }
        }
    }

    fn attempt(
        &self,
        host: &mut RenderTree,
        entity: &Entity,
        target: NodeId,
        found: &Discovery,
    ) -> AnnotationResult<Vec<RenderSplice>> {
        let target_tag = host
            .get(target)
            .map(|node| node.tag.clone())
            .ok_or(AnnotationError::StaleRenderNode(target))?;

        debug!(%target_tag, "resolving container strategy");
        if target_tag == "g" {
            self.annotate_graphical(host, entity, target, found)
        } else {
            self.annotate_inline(host, entity, target)
        }
    }

    /// Inline strategy: wrap the original render node in an `article`
    /// container placed in its parent slot.
    fn annotate_inline(
        &self,
        host: &mut RenderTree,
        entity: &Entity,
        target: NodeId,
    ) -> AnnotationResult<Vec<RenderSplice>> {
        let geometry = match &entity.shape {
            EntityShape::Point(latlng) => Geometry::Point(*latlng),
            EntityShape::BoundingBox(bounds) => Geometry::Box(*bounds),
            // Vector shapes render as SVG; an inline target carrying one
            // has no usable point or box representation.
            EntityShape::Polygon(_) | EntityShape::LayerGroup(_) => {
                return Err(AnnotationError::MissingGeometry)
            }
        };

        let slot = host
            .parent(target)
            .ok_or(AnnotationError::StaleRenderNode(target))?;

        // Build phase: pure. Placement validation happens here, before any
        // host mutation.
        let geo = self.build_geo_annotation("div", entity, &geometry)?;
        let tree = self
            .container("article", entity, entity.id.as_str())
            .children(map_options(&entity.options, &self.settings))
            .child(geo)
            .adopting(target)
            .build();

        debug!("splicing inline annotation container");
        let reusable_pane = host
            .get(slot)
            .and_then(|node| node.attr("class"))
            .map(|class| class.contains("overlay-pane") || class.contains("marker-pane"))
            .unwrap_or(false);
        let displaced_order = if reusable_pane {
            None
        } else {
            Some(host.get(slot).map(|n| n.children.clone()).unwrap_or_default())
        };

        let realized = realize(host, &tree)?;
        if displaced_order.is_some() {
            // Target already moved into the container; clear what remains of
            // the slot before attaching.
            host.detach_children(slot);
        }
        host.append_child(slot, realized.node)?;

        Ok(vec![RenderSplice {
            container: realized.node,
            slot,
            adopted: realized.adopted.into_iter().next(),
            displaced_order,
        }])
    }

    /// Graphical strategies: `metadata` sub-trees inside SVG group
    /// containers, one per sub-layer for aggregates.
    fn annotate_graphical(
        &self,
        host: &mut RenderTree,
        entity: &Entity,
        target: NodeId,
        found: &Discovery,
    ) -> AnnotationResult<Vec<RenderSplice>> {
        match &entity.shape {
            EntityShape::LayerGroup(layers) => {
                if layers.is_empty() || found.sub_groups.is_empty() {
                    return Err(AnnotationError::MissingGeometry);
                }

                // Build all sub-trees before splicing any, so one bad layer
                // skips the whole entity without partial output.
                let mut built = Vec::new();
                for (layer, &group) in layers.iter().zip(&found.sub_groups) {
                    let geo = self.build_geo_annotation("g", entity, &layer.geometry)?;
                    let tree = self
                        .container("metadata", entity, layer.id.as_str())
                        .children(map_options(&entity.options, &self.settings))
                        .child(geo)
                        .build();
                    built.push((tree, group));
                }

                debug!(groups = built.len(), "splicing per-sub-layer metadata");
                let mut splices = Vec::new();
                for (tree, group) in built {
                    match splice_metadata(host, &tree, group) {
                        Ok(splice) => splices.push(splice),
                        Err(err) => {
                            // Roll back the groups already spliced; the
                            // entity skips as a whole.
                            for splice in splices.drain(..).rev() {
                                unwind_splice(host, splice);
                            }
                            return Err(err);
                        }
                    }
                }
                Ok(splices)
            }
            shape => {
                let geometry = shape.geometry().ok_or(AnnotationError::MissingGeometry)?;
                let geo = self.build_geo_annotation("g", entity, &geometry)?;
                let tree = self
                    .container("metadata", entity, entity.id.as_str())
                    .children(map_options(&entity.options, &self.settings))
                    .child(geo)
                    .build();

                debug!("splicing single metadata sub-tree");
                Ok(vec![splice_metadata(host, &tree, target)?])
            }
        }
    }

    /// Scope container carrying the type URI and the stable internal
    /// identity attribute linking back to the source entity.
    fn container(&self, kind: &str, entity: &Entity, internal_id: &str) -> ElementBuilder {
        let mut builder = ElementBuilder::element(kind, &[]);
        if let Some(dom_id) = &entity.dom_id {
            builder = builder.attr("id", dom_id);
        }
        builder
            .attr("itemscope", "")
            .attr(
                "itemtype",
                &format!("{}{}", self.settings.vocabulary_base, entity.itemtype),
            )
            .attr("data-internal-id", internal_id)
    }

    /// Geo-property placement rule.
    ///
    /// Types with inherent geo capability attach the indicators directly
    /// under a node whose property role is the caller's geo property name;
    /// otherwise a recognized place-holder property wraps them in an
    /// intermediate `Place`-typed node. Anything else is unresolvable and
    /// skips the entity before the host tree is touched.
    fn build_geo_annotation(
        &self,
        kind: &str,
        entity: &Entity,
        geometry: &Geometry,
    ) -> AnnotationResult<ElementBuilder> {
        let geoprop = entity
            .geoprop
            .as_deref()
            .unwrap_or(&self.settings.default_geoprop);
        let encoding = encode(geometry)?;
        let nested_type_uri = format!("{}{}", self.settings.vocabulary_base, encoding.nested_type);

        if vocabulary::has_geo_property(&entity.itemtype) {
            Ok(ElementBuilder::element(kind, &[("itemprop", geoprop)])
                .attr("itemtype", &nested_type_uri)
                .attr("itemscope", "")
                .children(encoding.indicators))
        } else if vocabulary::is_valid_place_property(geoprop) {
            let geo = ElementBuilder::element(kind, &[("itemprop", "geo")])
                .attr("itemtype", &nested_type_uri)
                .attr("itemscope", "")
                .children(encoding.indicators);
            Ok(ElementBuilder::element(kind, &[("itemscope", "")])
                .attr(
                    "itemtype",
                    &format!("{}Place", self.settings.vocabulary_base),
                )
                .attr("itemprop", geoprop)
                .child(geo))
        } else {
            Err(AnnotationError::UnresolvableGeoProperty {
                itemtype: entity.itemtype.clone(),
                geoprop: geoprop.to_string(),
            })
        }
    }

    fn unwind(&mut self, host: &mut RenderTree, id: &EntityId) {
        if let Some(AnnotationState::Annotated(splices)) = self.states.remove(id) {
            for splice in splices.into_iter().rev() {
                unwind_splice(host, splice);
            }
        }
    }
}

/// Outcome of realizing one annotation tree into concrete render nodes.
struct Realized {
    node: NodeId,
    adopted: Vec<AdoptHandle>,
}

/// Realize an annotation tree into host render nodes. The result is still
/// detached; the caller splices it. On failure every created node is
/// removed and every adoption reversed.
fn realize(host: &mut RenderTree, tree: &AnnotationNode) -> AnnotationResult<Realized> {
    let mut created = Vec::new();
    let mut adopted = Vec::new();
    match realize_node(host, tree, &mut created, &mut adopted) {
        Ok(node) => Ok(Realized { node, adopted }),
        Err(err) => {
            for handle in adopted.into_iter().rev() {
                let _ = host.restore(handle);
            }
            for id in created.into_iter().rev() {
                host.remove_subtree(id);
            }
            Err(err)
        }
    }
}

fn realize_node(
    host: &mut RenderTree,
    node: &AnnotationNode,
    created: &mut Vec<NodeId>,
    adopted: &mut Vec<AdoptHandle>,
) -> AnnotationResult<NodeId> {
    let id = host.create_element(&node.kind);
    created.push(id);
    for (key, value) in &node.attrs {
        host.set_attr(id, key, value);
    }
    for child in &node.children {
        let child_id = realize_node(host, child, created, adopted)?;
        host.append_child(id, child_id)?;
    }
    // Wrapped external content always lands after the synthetic children.
    if let Some(external) = node.adopted {
        adopted.push(host.adopt(external, id)?);
    }
    Ok(id)
}

fn splice_metadata(
    host: &mut RenderTree,
    tree: &AnnotationNode,
    into: NodeId,
) -> AnnotationResult<RenderSplice> {
    let realized = realize(host, tree)?;
    host.append_child(into, realized.node)?;
    Ok(RenderSplice {
        container: realized.node,
        slot: into,
        adopted: realized.adopted.into_iter().next(),
        displaced_order: None,
    })
}

/// Reverse one splice: restore the adopted node, drop the container
/// subtree, then reinstate the slot's original child order.
fn unwind_splice(host: &mut RenderTree, splice: RenderSplice) {
    if let Some(handle) = splice.adopted {
        if let Err(err) = host.restore(handle) {
            warn!(%err, "could not restore re-parented render node");
        }
    }
    host.remove_subtree(splice.container);
    if let Some(order) = splice.displaced_order {
        host.detach_children(splice.slot);
        host.reattach_children(splice.slot, &order);
    }
}
