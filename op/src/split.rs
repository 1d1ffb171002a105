use crate::{OpError, Parts, concat};
use itertools::Itertools;
use std::ops::Deref;
use tensor::{BlobDim, BlobShape, HostBlob, Tensor};

/// 沿一个命名维度把 blob 切成若干连续段，并能把各段梯度合并回去。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct AxisSplit {
    axis: BlobDim,
}

/// 一次完成结构检查与形状检查。
pub fn validate(axis: BlobDim, sizes: &[i64], shape: &BlobShape) -> Result<Parts, OpError> {
    let parts = Parts::new(sizes)?;
    AxisSplit::new(axis).check(&parts, shape)?;
    Ok(parts)
}

impl AxisSplit {
    pub const fn new(axis: BlobDim) -> Self {
        Self { axis }
    }

    pub const fn axis(&self) -> BlobDim {
        self.axis
    }

    /// 形状相关的检查：分段之和不能超过切分维度的长度，等于时剩余段长度为 0。
    pub fn check(&self, parts: &Parts, shape: &BlobShape) -> Result<(), OpError> {
        let extent = shape[self.axis.index()];
        let sum = parts.sum();
        if sum > extent {
            Err(OpError::PartsExceedExtent {
                axis: self.axis,
                sum,
                extent,
            })
        } else {
            Ok(())
        }
    }

    /// 推导各输出的形状。
    pub fn infer(&self, parts: &Parts, shape: &BlobShape) -> Result<Vec<BlobShape>, OpError> {
        self.check(parts, shape)?;

        let axis = self.axis.index();
        Ok(parts
            .ranges(shape[axis])
            .map(|range| {
                let mut shape = *shape;
                shape[axis] = range.len();
                shape
            })
            .collect())
    }

    /// 切分 `input`，各输出是与输入共享存储的视图。
    pub fn forward<T: Clone>(
        &self,
        input: &Tensor<T>,
        parts: &Parts,
    ) -> Result<Vec<Tensor<T>>, OpError> {
        let shape = input.blob_shape();
        self.check(parts, &shape)?;

        Ok(parts
            .ranges(shape[self.axis.index()])
            .map(|range| {
                tracing::trace!(axis = %self.axis, ?range, "split part");
                input.clone().slice(self.axis, range.start, range.len())
            })
            .collect())
    }

    /// `forward` 的逆：把各输出的梯度写回它们在输入中对应的区间。
    pub fn backward<T: Deref<Target = [u8]>>(
        &self,
        output_grads: &[Tensor<T>],
        parts: &Parts,
        input_shape: &BlobShape,
    ) -> Result<Tensor<HostBlob>, OpError> {
        let expected = self.infer(parts, input_shape)?;
        if output_grads.len() != expected.len() {
            return Err(OpError::GradientCount {
                expected: expected.len(),
                got: output_grads.len(),
            });
        }
        for (idx, (grad, &shape)) in output_grads.iter().zip_eq(&expected).enumerate() {
            let got = grad.blob_shape();
            if got != shape {
                return Err(OpError::GradientShape {
                    idx,
                    expected: shape,
                    got,
                });
            }
        }
        let dt = Tensor::check_dt_same(&output_grads.iter().collect::<Vec<_>>())
            .ok_or(OpError::DataTypeMismatch)?;

        tracing::trace!(axis = %self.axis, %parts, "merge gradients");
        Ok(concat(self.axis, dt, input_shape, output_grads))
    }
}

#[cfg(test)]
mod test {
    use super::{AxisSplit, validate};
    use crate::{ErrorKind, OpError, Parts};
    use tensor::{BlobDim, Tensor, digit_layout::types};
    use test_blob::{DT, filled, iota, shape_along, values};

    #[test]
    fn test_validate() {
        let shape = shape_along(BlobDim::Width, 4);

        let err = validate(BlobDim::Width, &[5], &shape).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
        assert_eq!(
            err,
            OpError::PartsExceedExtent {
                axis: BlobDim::Width,
                sum: 5,
                extent: 4
            }
        );

        let err = validate(BlobDim::Width, &[-1], &shape).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        let err = validate(BlobDim::Width, &[1, 2, 3, 4], &shape).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);

        assert_eq!(validate(BlobDim::Width, &[1, 3], &shape).unwrap().sum(), 4);
        // 其他维度不受影响
        assert!(validate(BlobDim::Height, &[1, 3], &shape).is_err());
    }

    #[test]
    fn test_oversized_parts() {
        let op = AxisSplit::new(BlobDim::Width);
        let parts = Parts::new(&[i64::MAX, i64::MAX, 3]).unwrap();
        let input = iota(&shape_along(BlobDim::Width, 4));

        let err = op.forward(&input, &parts).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
        assert_eq!(
            err,
            OpError::PartsExceedExtent {
                axis: BlobDim::Width,
                sum: usize::MAX,
                extent: 4
            }
        );
        assert!(op.infer(&parts, &input.blob_shape()).is_err());
    }

    #[test]
    fn test_channels() {
        let op = AxisSplit::new(BlobDim::Channels);
        let parts = Parts::new(&[3, 4]).unwrap();
        let input = iota(&[1, 1, 1, 1, 1, 1, 10]);

        let outputs = op.forward(&input, &parts).unwrap();
        let extents = outputs
            .iter()
            .map(|t| t.extent(BlobDim::Channels))
            .collect::<Vec<_>>();
        assert_eq!(extents, [3, 4, 3]);
        for t in &outputs {
            for dim in BlobDim::ALL {
                if dim != BlobDim::Channels {
                    assert_eq!(t.extent(dim), 1)
                }
            }
        }
        assert_eq!(values(&outputs[0]), [0., 1., 2.]);
        assert_eq!(values(&outputs[1]), [3., 4., 5., 6.]);
        assert_eq!(values(&outputs[2]), [7., 8., 9.]);

        let grad = op
            .backward(&outputs, &parts, &input.blob_shape())
            .unwrap();
        assert_eq!(grad.shape(), [1, 1, 1, 1, 1, 1, 10]);
        assert_eq!(values(&grad), values(&input));
    }

    #[test]
    fn test_identity() {
        let op = AxisSplit::new(BlobDim::Height);
        let input = iota(&shape_along(BlobDim::Height, 8));

        let outputs = op.forward(&input, &Parts::default()).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].shape(), input.shape());
        assert_eq!(values(&outputs[0]), values(&input));
    }

    #[test]
    fn test_degenerate() {
        let op = AxisSplit::new(BlobDim::Depth);
        let parts = Parts::new(&[2, 2]).unwrap();
        let input = iota(&[2, 1, 1, 1, 1, 4, 3]);

        let outputs = op.forward(&input, &parts).unwrap();
        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs[2].shape(), [2, 1, 1, 1, 1, 0, 3]);
        assert_eq!(outputs[2].num_elements(), 0);
        assert!(values(&outputs[2]).is_empty());

        let grad = op
            .backward(&outputs, &parts, &input.blob_shape())
            .unwrap();
        assert_eq!(values(&grad), values(&input));
    }

    /// 每个维度、每种配置下 backward(forward(x)) == x。
    #[test]
    fn test_round_trip() {
        let shape = [2, 3, 1, 4, 5, 1, 6];
        let input = iota(&shape);

        for axis in BlobDim::ALL {
            let op = AxisSplit::new(axis);
            let extent = shape[axis.index()];
            let configs: &[&[i64]] = &[&[], &[1], &[1, 1], &[1, 1, 1], &[2, 1], &[3, 1, 2]];
            for &sizes in configs {
                let parts = Parts::new(sizes).unwrap();
                if parts.sum() > extent {
                    assert!(op.forward(&input, &parts).is_err());
                    continue;
                }

                let outputs = op.forward(&input, &parts).unwrap();
                assert_eq!(outputs.len(), sizes.len() + 1);
                let expected = op.infer(&parts, &shape).unwrap();
                for (t, s) in outputs.iter().zip(&expected) {
                    assert_eq!(t.shape(), s)
                }

                let grad = op.backward(&outputs, &parts, &shape).unwrap();
                assert!(grad.is_contiguous());
                assert_eq!(values(&grad), values(&input), "{axis} {parts}");
            }
        }
    }

    #[test]
    fn test_backward_mismatch() {
        let op = AxisSplit::new(BlobDim::Channels);
        let parts = Parts::new(&[3, 4]).unwrap();
        let shape = shape_along(BlobDim::Channels, 10);

        let grads = [
            filled(&shape_along(BlobDim::Channels, 3), 1.),
            filled(&shape_along(BlobDim::Channels, 4), 1.),
        ];
        assert_eq!(
            op.backward(&grads, &parts, &shape).unwrap_err(),
            OpError::GradientCount {
                expected: 3,
                got: 2
            }
        );

        let grads = [
            filled(&shape_along(BlobDim::Channels, 3), 1.),
            filled(&shape_along(BlobDim::Channels, 3), 1.),
            filled(&shape_along(BlobDim::Channels, 4), 1.),
        ];
        let err = op.backward(&grads, &parts, &shape).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
        assert!(matches!(err, OpError::GradientShape { idx: 1, .. }));

        let grads = [
            filled(&shape_along(BlobDim::Channels, 3), 1.),
            filled(&shape_along(BlobDim::Channels, 4), 1.),
            Tensor::zeros(types::F16, &shape_along(BlobDim::Channels, 3)).share(),
        ];
        assert_eq!(
            op.backward(&grads, &parts, &shape).unwrap_err(),
            OpError::DataTypeMismatch
        );
    }

    #[test]
    fn test_backward_scatter() {
        let op = AxisSplit::new(BlobDim::Height);
        let parts = Parts::new(&[1]).unwrap();
        let shape = [1, 1, 1, 3, 1, 1, 2];

        let grads = [
            filled(&[1, 1, 1, 1, 1, 1, 2], 1.),
            filled(&[1, 1, 1, 2, 1, 1, 2], 2.),
        ];
        let grad = op.backward(&grads, &parts, &shape).unwrap();
        assert_eq!(grad.dt(), DT);
        assert_eq!(values(&grad), [1., 1., 2., 2., 2., 2.]);
    }
}
