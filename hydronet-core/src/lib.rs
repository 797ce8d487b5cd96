//! Reversible editing of water distribution network models.
//!
//! A [`HydraulicModel`] holds the nodes and links of a network together with
//! its customer points and curves. Structural edits are expressed as
//! [`ops`] which read the model and produce a [`Moment`], a self-describing
//! change set. Applying a moment returns its inverse, and the [`Editor`]
//! records both in a [`MomentLog`](moment::MomentLog) for undo and redo.
//!
//! ```
//! use hydronet_core::builder::NetworkBuilder;
//! use hydronet_core::ops::DeleteAssets;
//! use hydronet_core::{AssetId, Editor, ModelConfig};
//!
//! let (j1, j2, p1) = (AssetId::new(1), AssetId::new(2), AssetId::new(3));
//! let model = NetworkBuilder::new()
//!     .junction(j1, [0.0, 0.0])
//!     .junction(j2, [0.001, 0.0])
//!     .pipe(p1, j1, j2)
//!     .build()
//!     .unwrap();
//!
//! let mut editor = Editor::with_model(model, ModelConfig::default());
//! editor.transact(DeleteAssets::new([p1])).unwrap();
//! assert!(editor.model().link(p1).is_none());
//! editor.undo();
//! assert!(editor.model().link(p1).is_some());
//! ```

pub mod asset;
pub mod asset_index;
pub mod builder;
pub mod config;
pub mod context;
pub mod core;
pub mod curve;
pub mod customer;
pub mod editor;
pub mod geometry;
pub mod labels;
pub mod model;
pub mod moment;
pub mod ops;
pub mod simulation;
pub mod topology;

pub use crate::asset::{Asset, AssetType, LinkAsset, NodeAsset};
pub use crate::config::ModelConfig;
pub use crate::context::EditContext;
pub use crate::core::{AssetId, CustomerPointId, Position};
pub use crate::editor::Editor;
pub use crate::model::HydraulicModel;
pub use crate::moment::Moment;
pub use crate::ops::{ModelOperation, Operation, OperationError};
