use crate::Tensor;
use ndarray_layout::ArrayLayout;
use std::{
    iter::zip,
    ops::{Deref, DerefMut},
};

/// 按逻辑顺序（大端，最后一维变化最快）枚举每个元素的字节偏移。
fn offsets<const N: usize>(layout: &ArrayLayout<N>) -> impl Iterator<Item = usize> + '_ {
    let shape = layout.shape();
    let strides = layout.strides();
    let offset = layout.offset();
    (0..layout.num_elements()).map(move |mut i| {
        let mut ans = offset;
        for (&d, &s) in zip(shape, strides).rev() {
            ans += (i % d) as isize * s;
            i /= d
        }
        ans as usize
    })
}

impl<T: Deref<Target = [u8]>> Tensor<T> {
    /// 按逻辑顺序访问每个元素的字节。
    pub fn elements(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let unit = self.dt.nbytes();
        let bytes: &[u8] = &self.item;
        offsets(&self.layout).map(move |offset| &bytes[offset..][..unit])
    }

    /// 将元素按逻辑顺序拷贝到一块新的连续存储。
    pub fn to_contiguous(&self) -> Tensor<Vec<u8>> {
        let mut ans = Tensor::zeros(self.dt, &self.blob_shape());
        ans.copy_from(self);
        ans
    }
}

impl<T: DerefMut<Target = [u8]>> Tensor<T> {
    /// 从形状相同的 `src` 逐元素拷贝，两侧布局可以任意。
    pub fn copy_from<U: Deref<Target = [u8]>>(&mut self, src: &Tensor<U>) {
        assert_eq!(self.dt, src.dt);
        assert_eq!(self.layout.shape(), src.layout.shape());

        let unit = self.dt.nbytes();
        let Self { layout, item, .. } = self;
        let dst: &mut [u8] = item;
        let src_bytes: &[u8] = &src.item;
        for (d, s) in zip(offsets(layout), offsets(&src.layout)) {
            dst[d..][..unit].copy_from_slice(&src_bytes[s..][..unit])
        }
    }
}
