//! The transact / undo / redo facade over a model.

use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ModelConfig;
use crate::context::EditContext;
use crate::model::HydraulicModel;
use crate::moment::{MomentLog, StateId};
use crate::ops::{ModelOperation, OperationError};

/// A live model together with its edit context and history.
///
/// Every successful [`Editor::transact`] is recorded with its inverse, so the
/// model can be walked back and forth with [`Editor::undo`] and
/// [`Editor::redo`].
#[derive(Debug, Clone)]
pub struct Editor {
    model: HydraulicModel,
    context: EditContext,
    log: MomentLog,
    config: ModelConfig,
}

impl Editor {
    /// An editor over an empty model.
    #[must_use]
    pub fn new(config: ModelConfig) -> Self {
        Self {
            model: HydraulicModel::new(config.units),
            context: EditContext::new(&config),
            log: MomentLog::new(),
            config,
        }
    }

    /// An editor over an existing model, which becomes the undo floor.
    #[must_use]
    pub fn with_model(model: HydraulicModel, config: ModelConfig) -> Self {
        let mut editor = Self::new(config);
        editor.import(model);
        editor
    }

    /// Replaces the model, discarding the history.
    ///
    /// The imported model is recorded as the log's snapshot under a fresh
    /// state id.
    pub fn import(&mut self, model: HydraulicModel) {
        let state_id = Uuid::new_v4().to_string();
        info!(state_id, assets = model.assets().count(), "importing model");
        self.context = EditContext::for_model(&model, &self.config);
        self.log = MomentLog::new();
        self.log.set_snapshot(model.to_snapshot_moment(), state_id);
        self.model = model;
    }

    /// Computes `operation`, applies it and records it.
    ///
    /// On error the model is left untouched. An operation that changes
    /// nothing is not recorded. Returns the state id reached.
    pub fn transact(&mut self, operation: impl ModelOperation) -> Result<StateId, OperationError> {
        self.context.builder.skip_past(self.model.max_asset_id());
        let moment = operation.compute(&self.model, &mut self.context)?;
        if moment.is_empty() {
            debug!(note = moment.note(), "skipping empty moment");
            return Ok(self.version().to_string());
        }
        let reverse = self.model.apply(&moment, &mut self.context.labels);
        let state_id = Uuid::new_v4().to_string();
        self.log.append(moment, reverse, state_id.clone());
        Ok(state_id)
    }

    /// Undoes the last recorded moment. Returns `false` if there is none.
    pub fn undo(&mut self) -> bool {
        let Some(step) = self.log.next_undo() else {
            return false;
        };
        let moment = step.moment.clone();
        self.model.apply(&moment, &mut self.context.labels);
        self.log.undo();
        true
    }

    /// Redoes the next undone moment. Returns `false` if there is none.
    pub fn redo(&mut self) -> bool {
        let Some(step) = self.log.next_redo() else {
            return false;
        };
        let moment = step.moment.clone();
        self.model.apply(&moment, &mut self.context.labels);
        self.log.redo();
        true
    }

    /// The current state id.
    #[must_use]
    pub fn version(&self) -> &str {
        self.log.current_state_id()
    }

    /// The model.
    #[must_use]
    pub fn model(&self) -> &HydraulicModel {
        &self.model
    }

    /// The history.
    #[must_use]
    pub fn log(&self) -> &MomentLog {
        &self.log
    }

    /// The edit context.
    #[must_use]
    pub fn context(&self) -> &EditContext {
        &self.context
    }

    /// Gives up the model.
    #[must_use]
    pub fn into_model(self) -> HydraulicModel {
        self.model
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::asset::NodeType;
    use crate::core::AssetId;
    use crate::moment::INIT_STATE_ID;
    use crate::ops::test::{J1, J2, P1, line};
    use crate::ops::{AddNode, DeleteAssets, DisconnectCustomers, MergeNodes};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn undo_restores_the_previous_model(line: HydraulicModel) {
        let mut editor = Editor::with_model(line.clone(), ModelConfig::default());
        let imported = editor.version().to_string();
        assert_ne!(imported, INIT_STATE_ID);

        let deleted = editor.transact(DeleteAssets::new([J2])).unwrap();
        assert_eq!(editor.version(), deleted);
        assert_eq!(editor.model().links().count(), 0);

        assert!(editor.undo());
        assert_eq!(editor.model(), &line);
        assert_eq!(editor.version(), imported);
        assert!(!editor.undo());

        assert!(editor.redo());
        assert_eq!(editor.version(), deleted);
        assert!(!editor.redo());
    }

    #[rstest]
    fn labels_follow_the_history(line: HydraulicModel) {
        let mut editor = Editor::with_model(line, ModelConfig::default());
        editor
            .transact(AddNode::new(NodeType::Junction, [0.0, 0.01]))
            .unwrap();
        let added = AssetId::new(6);
        assert_eq!(editor.model().node(added).unwrap().label, "J4");

        editor.undo();
        assert!(editor.model().node(added).is_none());
        editor
            .transact(AddNode::new(NodeType::Junction, [0.0, 0.02]))
            .unwrap();
        // The undone id is not reused, its label is
        let node = editor.model().node(AssetId::new(7)).unwrap();
        assert_eq!(node.label, "J4");
        assert_eq!(editor.log().len(), 1);
    }

    #[rstest]
    fn failures_and_noops_are_not_recorded(line: HydraulicModel) {
        let mut editor = Editor::with_model(line.clone(), ModelConfig::default());
        let version = editor.version().to_string();

        assert_eq!(
            editor.transact(MergeNodes::new(P1, J1)),
            Err(OperationError::InvalidSourceNode(P1))
        );
        assert_eq!(editor.transact(DisconnectCustomers::new([])), Ok(version.clone()));
        assert!(editor.log().is_empty());
        assert_eq!(editor.model(), &line);
        assert_eq!(editor.version(), version);
    }

    #[test]
    fn empty_editor() {
        let mut editor = Editor::new(ModelConfig::default());
        assert_eq!(editor.version(), INIT_STATE_ID);
        editor
            .transact(AddNode::new(NodeType::Reservoir, [0.0, 0.0]))
            .unwrap();
        assert_eq!(editor.model().node(AssetId::new(1)).unwrap().label, "R1");
        editor.undo();
        assert_eq!(editor.version(), INIT_STATE_ID);
        assert_eq!(editor.into_model().assets().count(), 0);
    }
}
