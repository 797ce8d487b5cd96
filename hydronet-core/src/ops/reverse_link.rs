use serde::{Deserialize, Serialize};

use crate::context::EditContext;
use crate::core::AssetId;
use crate::model::HydraulicModel;
use crate::moment::Moment;

use super::{ModelOperation, OperationError};

/// Swaps the ends of a link, reversing its polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseLink {
    /// The link to reverse.
    pub link_id: AssetId,
}

impl ReverseLink {
    /// Creates the operation.
    #[must_use]
    pub fn new(link_id: AssetId) -> Self {
        Self { link_id }
    }
}

impl ModelOperation for ReverseLink {
    fn verify(&self, model: &HydraulicModel) -> Result<(), OperationError> {
        model
            .link(self.link_id)
            .map(|_| ())
            .ok_or(OperationError::InvalidLink(self.link_id))
    }

    fn compute(
        self,
        model: &HydraulicModel,
        _context: &mut EditContext,
    ) -> Result<Moment, OperationError> {
        let link = model
            .link(self.link_id)
            .ok_or(OperationError::InvalidLink(self.link_id))?;
        let mut reversed = link.clone();
        reversed.reverse();
        Ok(Moment {
            note: Some(format!("Reverse {}", link.link_type())),
            put_assets: vec![reversed.into()],
            ..Moment::default()
        })
    }
}
