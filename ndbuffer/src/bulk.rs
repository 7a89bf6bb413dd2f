//! Bulk transfers between dense arrays and flat storage.
//!
//! Trailing plain axes of a dense array, each stepping over exactly the
//! elements of the axes to its right, occupy one contiguous run of its
//! buffer. A bulk transfer enumerates the
//! coordinates of the remaining outer axes in row-major order and
//! moves each run with a single buffer operation, rather than one
//! operation per element.

use crate::config::Config;
use crate::dense::NdArrayError;
use crate::dimension::Dimension;
use crate::dtype::DataType;
use crate::layout::Layout;
use crate::layout::Positions;
use crate::shape::Shape;

/// How values move between an array and flat storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStrategy {
    /// One buffer operation per contiguous run.
    Bulk(BulkTransfer),
    /// One buffer operation per element, in row-major order.
    ElementWise,
}

impl TransferStrategy {
    /// Chooses how to transfer the values of an array of the given
    /// shape and element type.
    ///
    /// Bulk transfer requires at least one dimension, a last dimension
    /// whose consecutive coordinates are adjacent in the buffer, a
    /// fixed-width element type, and
    /// [`Config::bulk_transfer`].
    pub fn select(
        shape: &Shape,
        data_type: DataType,
        config: &Config,
    ) -> Result<Self, NdArrayError> {
        let Some(last) = shape.dimensions().last() else {
            return Ok(TransferStrategy::ElementWise);
        };
        if extend_run(last, 1).is_none() {
            tracing::debug!(%shape, "last dimension is not contiguous, transferring element-wise");
            return Ok(TransferStrategy::ElementWise);
        }
        if !data_type.supports_bulk_transfer() {
            tracing::debug!(%data_type, "variable-width elements, transferring element-wise");
            return Ok(TransferStrategy::ElementWise);
        }
        if !config.bulk_transfer {
            tracing::debug!("bulk transfer disabled, transferring element-wise");
            return Ok(TransferStrategy::ElementWise);
        }
        Ok(TransferStrategy::Bulk(BulkTransfer::plan(shape)?))
    }
}

/// The contiguous runs making up a dense array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkTransfer {
    /// The first axis of the contiguous suffix.
    pub dimension: usize,
    /// Number of elements in each run.
    pub run_size: usize,
}

impl BulkTransfer {
    /// Finds the largest suffix of axes of `shape` that covers one
    /// contiguous range of the buffer: each axis must step over exactly
    /// the elements of the axes to its right.
    ///
    /// Fails with [`NdArrayError::BulkTransferUnavailable`] if the last
    /// axis is not contiguous or the shape is a scalar; callers are
    /// expected to have checked eligibility first.
    pub fn plan(shape: &Shape) -> Result<Self, NdArrayError> {
        let mut plan = None;
        let mut run_size = 1usize;
        for (i, dimension) in shape.dimensions().iter().enumerate().rev() {
            match extend_run(dimension, run_size) {
                Some(extended) => {
                    run_size = extended;
                    plan = Some(Self {
                        dimension: i,
                        run_size,
                    });
                }
                None => break,
            }
        }
        plan.ok_or_else(|| NdArrayError::BulkTransferUnavailable {
            shape: shape.clone(),
        })
    }

    /// Number of runs needed to cover an array of `size` elements.
    pub fn num_runs(&self, size: usize) -> usize {
        if self.run_size == 0 {
            0
        } else {
            size / self.run_size
        }
    }

    /// The buffer offset at which each run starts, in row-major order.
    pub(crate) fn runs<'a>(&self, layout: &'a Layout) -> Positions<'a> {
        layout.positions(self.dimension)
    }
}

/// The size of a run of `run_size` elements extended by `dimension`,
/// or `None` if `dimension` does not continue the run.
fn extend_run(dimension: &Dimension, run_size: usize) -> Option<usize> {
    match dimension {
        Dimension::Axis {
            num_elements,
            stride,
        } if *stride == run_size || *num_elements <= 1 => run_size.checked_mul(*num_elements),
        Dimension::Axis { .. }
        | Dimension::Unknown
        | Dimension::Coordinate { .. }
        | Dimension::Indexed { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::dsl::*;
    use crate::shape;

    #[test]
    fn test_contiguous_shape_is_one_run() {
        let plan = BulkTransfer::plan(&shape!(3, 4)).unwrap();
        assert_eq!(
            plan,
            BulkTransfer {
                dimension: 0,
                run_size: 12
            }
        );
        assert_eq!(plan.num_runs(12), 1);
        let layout = Layout::new(&shape!(3, 4), 5).unwrap();
        assert_eq!(plan.runs(&layout).collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_run_stops_at_segmented_dimension() {
        let s = shape!(4, 2, 3).map_to(&[all(), flip()]).unwrap();
        let plan = BulkTransfer::plan(&s).unwrap();
        assert_eq!(
            plan,
            BulkTransfer {
                dimension: 2,
                run_size: 3
            }
        );
        assert_eq!(plan.num_runs(24), 8);
        let layout = Layout::new(&s, 0).unwrap();
        assert_eq!(
            plan.runs(&layout).collect::<Vec<_>>(),
            vec![3, 0, 9, 6, 15, 12, 21, 18]
        );
    }

    #[test]
    fn test_segmented_last_dimension_has_no_plan() {
        let s = shape!(3, 4).map_to(&[all(), range(1, 3)]).unwrap();
        assert!(matches!(
            BulkTransfer::plan(&s).unwrap_err(),
            NdArrayError::BulkTransferUnavailable { .. }
        ));
        assert!(BulkTransfer::plan(&Shape::scalar()).is_err());
    }

    #[test]
    fn test_run_stops_at_strided_axis() {
        // Column 1 of a (2, 3) array: one axis, three slots apart.
        let column = shape!(2, 3)
            .map_to(&[all(), at(1)])
            .unwrap()
            .fold_collapsed()
            .unwrap()
            .1;
        assert_eq!(column.dimensions(), &[Dimension::axis(2, 3)]);
        assert!(BulkTransfer::plan(&column).is_err());
        assert_eq!(
            TransferStrategy::select(&column, DataType::I32, &Config::default()).unwrap(),
            TransferStrategy::ElementWise
        );

        // A fixed middle axis leaves two runs of 4.
        let (_, s) = shape!(2, 3, 4)
            .map_to(&[all(), at(1)])
            .unwrap()
            .fold_collapsed()
            .unwrap();
        assert_eq!(
            BulkTransfer::plan(&s).unwrap(),
            BulkTransfer {
                dimension: 1,
                run_size: 4
            }
        );

        let custom =
            Shape::from_dimensions(vec![Dimension::axis(2, 5), Dimension::axis(3, 1)]).unwrap();
        assert_eq!(
            BulkTransfer::plan(&custom).unwrap(),
            BulkTransfer {
                dimension: 1,
                run_size: 3
            }
        );
        let layout = Layout::new(&custom, 0).unwrap();
        assert_eq!(
            BulkTransfer::plan(&custom).unwrap().runs(&layout).collect::<Vec<_>>(),
            vec![0, 5]
        );
    }

    #[test]
    fn test_single_element_axis_continues_run() {
        let s = Shape::from_dimensions(vec![
            Dimension::axis(2, 3),
            Dimension::axis(1, 7),
            Dimension::axis(3, 1),
        ])
        .unwrap();
        assert_eq!(
            BulkTransfer::plan(&s).unwrap(),
            BulkTransfer {
                dimension: 0,
                run_size: 6
            }
        );
    }

    #[test]
    fn test_empty_runs() {
        let plan = BulkTransfer::plan(&shape!(2, 0)).unwrap();
        assert_eq!(plan.run_size, 0);
        assert_eq!(plan.num_runs(0), 0);
    }

    #[test]
    fn test_select() {
        let config = Config::default();
        assert_eq!(
            TransferStrategy::select(&shape!(3, 4), DataType::F32, &config).unwrap(),
            TransferStrategy::Bulk(BulkTransfer {
                dimension: 0,
                run_size: 12
            })
        );
        assert_eq!(
            TransferStrategy::select(&Shape::scalar(), DataType::F32, &config).unwrap(),
            TransferStrategy::ElementWise
        );
        let segmented = shape!(3, 4).map_to(&[all(), odd()]).unwrap();
        assert_eq!(
            TransferStrategy::select(&segmented, DataType::F32, &config).unwrap(),
            TransferStrategy::ElementWise
        );
        assert_eq!(
            TransferStrategy::select(&shape!(3, 4), DataType::Utf8, &config).unwrap(),
            TransferStrategy::ElementWise
        );
        let disabled = Config {
            bulk_transfer: false,
        };
        assert_eq!(
            TransferStrategy::select(&shape!(3, 4), DataType::F32, &disabled).unwrap(),
            TransferStrategy::ElementWise
        );
    }
}
