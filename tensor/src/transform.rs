use crate::{BlobDim, N_DIMS, Tensor};
use ndarray_layout::ArrayLayout;

impl<T> Tensor<T> {
    /// 沿 `dim` 取 `start..start + len` 的连续子区间，与原张量共享存储。
    ///
    /// `len` 可以为 0，此时得到一个不含元素的视图。
    pub fn slice(self, dim: BlobDim, start: usize, len: usize) -> Self {
        let axis = dim.index();
        let extent = self.layout.shape()[axis];
        assert!(start + len <= extent, "slice {start}+{len} out of {extent}");

        self.map_layout(|layout| {
            let mut shape = layout.shape().to_vec();
            shape[axis] = len;
            let strides = layout.strides();
            let offset = layout.offset() + start as isize * strides[axis];
            ArrayLayout::new(&shape, strides, offset)
        })
    }

    fn map_layout(
        mut self,
        f: impl FnOnce(&ArrayLayout<N_DIMS>) -> ArrayLayout<N_DIMS>,
    ) -> Self {
        self.layout = f(&self.layout);
        self
    }
}
