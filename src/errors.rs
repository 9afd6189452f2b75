use std::path::PathBuf;
use thiserror::Error;

use crate::render::NodeId;

#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error("neither a bounding box nor a coordinate pair could be detected to build a geographic annotation")]
    MissingGeometry,

    #[error("unsupported type of geographic value indication: {0:?}, currently supported are 'point', 'box' and 'shape'")]
    UnsupportedGeometryKind(String),

    #[error("could not build up geo annotations for {itemtype} and geo property {geoprop:?}")]
    UnresolvableGeoProperty { itemtype: String, geoprop: String },

    #[error("render node is no longer present in the host tree: {0:?}")]
    StaleRenderNode(NodeId),

    #[error("entity was never attached: {0}")]
    UnknownEntity(String),

    #[error("invalid scene file {path}: {reason}")]
    Scene { path: PathBuf, reason: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),
}

pub type AnnotationResult<T> = Result<T, AnnotationError>;
