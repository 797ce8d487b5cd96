use crate::asset::{LinkAsset, NodeAsset};
use crate::context::EditContext;
use crate::core::{AssetId, Position};
use crate::geometry::{NearestPoint, nearest_point_on_polyline};
use crate::labels::LabelGenerator;
use crate::model::HydraulicModel;
use crate::moment::Moment;

use super::reassign::reassign_after_split;
use super::{ModelOperation, OperationError};

/// Splits a pipe at one or more nodes.
///
/// The pipe is replaced by consecutive segments joined at the split nodes,
/// which the caller is responsible for adding to the model. Segments copy
/// the pipe's properties and activity. The first keeps its label and the
/// others derive theirs from it (`P1`, `P1_1`, `P1_2`...).
///
/// A split exactly on an interior vertex cuts the polyline there; any other
/// split is inserted as a new vertex on the nearest segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPipe {
    /// The pipe to split, as currently in the model.
    pub pipe: LinkAsset,
    /// Nodes to split at, in processing order.
    pub splits: Vec<NodeAsset>,
}

/// A segment under construction.
struct Piece {
    coordinates: Vec<Position>,
    start: AssetId,
    end: AssetId,
}

impl Piece {
    /// Cuts the piece at `split`.
    fn cut(self, split: &NodeAsset, segment: usize) -> (Piece, Piece) {
        let at = split.coordinates;
        let last = self.coordinates.len() - 1;
        let (first, second) = match (1..last).find(|&i| self.coordinates[i] == at) {
            Some(vertex) => (
                self.coordinates[..=vertex].to_vec(),
                self.coordinates[vertex..].to_vec(),
            ),
            None => {
                let mut first = self.coordinates[..=segment].to_vec();
                first.push(at);
                let mut second = vec![at];
                second.extend_from_slice(&self.coordinates[segment + 1..]);
                (first, second)
            }
        };
        (
            Piece {
                coordinates: first,
                start: self.start,
                end: split.id,
            },
            Piece {
                coordinates: second,
                start: split.id,
                end: self.end,
            },
        )
    }
}

impl SplitPipe {
    /// Creates the operation.
    #[must_use]
    pub fn new(pipe: LinkAsset, splits: impl IntoIterator<Item = NodeAsset>) -> Self {
        Self {
            pipe,
            splits: splits.into_iter().collect(),
        }
    }

    /// Cuts the polyline at every split, each going to the piece nearest to
    /// it.
    fn pieces(&self) -> Vec<Piece> {
        let mut pieces = vec![Piece {
            coordinates: self.pipe.coordinates().to_vec(),
            start: self.pipe.start(),
            end: self.pipe.end(),
        }];
        for split in &self.splits {
            let nearest = pieces
                .iter()
                .enumerate()
                .filter_map(|(i, piece)| {
                    nearest_point_on_polyline(&piece.coordinates, split.coordinates)
                        .map(|nearest| (i, nearest))
                })
                .fold(None, |best: Option<(usize, NearestPoint)>, (i, nearest)| match best {
                    Some((_, b)) if b.distance <= nearest.distance => best,
                    _ => Some((i, nearest)),
                });
            let (index, segment) = nearest.map_or_else(
                || (0, (pieces[0].coordinates.len() - 1) / 2),
                |(i, n)| (i, n.segment),
            );
            let (first, second) = pieces.remove(index).cut(split, segment);
            pieces.splice(index..index, [first, second]);
        }
        pieces
    }
}

impl ModelOperation for SplitPipe {
    fn verify(&self, _model: &HydraulicModel) -> Result<(), OperationError> {
        if self.splits.is_empty() {
            return Err(OperationError::NoSplits);
        }
        if !self.pipe.is_pipe() {
            return Err(OperationError::InvalidPipe(self.pipe.id));
        }
        Ok(())
    }

    fn compute(
        self,
        model: &HydraulicModel,
        context: &mut EditContext,
    ) -> Result<Moment, OperationError> {
        self.verify(model)?;
        let mut segments: Vec<LinkAsset> = Vec::with_capacity(self.splits.len() + 1);
        for piece in self.pieces() {
            let mut segment = context
                .builder
                .pipe(piece.coordinates)?
                .with_connections(piece.start, piece.end)
                .with_active(self.pipe.is_active);
            segment.kind = self.pipe.kind.clone();
            segment.label = match segments.last() {
                None => self.pipe.label.clone(),
                Some(_) if self.pipe.label.is_empty() => {
                    context.labels.generate_for(segment.link_type().into(), segment.id)
                }
                Some(_) if segments.len() == 1 => context.labels.next_label(&self.pipe.label),
                Some(previous) => context.labels.next_label(&previous.label),
            };
            segments.push(segment);
        }

        let put_customer_points = reassign_after_split(model, &self.pipe, &self.splits, &segments);
        Ok(Moment {
            note: Some("Split pipe".to_string()),
            put_assets: segments.into_iter().map(Into::into).collect(),
            delete_assets: vec![self.pipe.id],
            put_customer_points,
            ..Moment::default()
        })
    }
}
