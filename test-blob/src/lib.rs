//! 测试用的 F32 blob 构造与读取。

use std::ops::Deref;
use tensor::{
    BlobDim, BlobShape, HostBlob, N_DIMS, Tensor,
    digit_layout::{DigitLayout, types},
};

pub const DT: DigitLayout = types::F32;

/// 除 `dim` 外各维长度均为 1 的形状。
pub fn shape_along(dim: BlobDim, extent: usize) -> BlobShape {
    let mut shape = [1; N_DIMS];
    shape[dim.index()] = extent;
    shape
}

/// 按逻辑顺序填入 0, 1, 2, …
pub fn iota(shape: &BlobShape) -> Tensor<HostBlob> {
    from_fn(shape, |i| i as _)
}

pub fn filled(shape: &BlobShape, value: f32) -> Tensor<HostBlob> {
    from_fn(shape, |_| value)
}

pub fn from_fn(shape: &BlobShape, f: impl Fn(usize) -> f32) -> Tensor<HostBlob> {
    let n = shape.iter().product::<usize>();
    let bytes = (0..n).flat_map(|i| f(i).to_ne_bytes()).collect::<Vec<_>>();
    Tensor::from_bytes(DT, shape, bytes).unwrap()
}

/// 按逻辑顺序读出全部元素。
pub fn values<T: Deref<Target = [u8]>>(tensor: &Tensor<T>) -> Vec<f32> {
    assert_eq!(tensor.dt(), DT);
    tensor
        .elements()
        .map(|x| f32::from_ne_bytes(x.try_into().unwrap()))
        .collect()
}
