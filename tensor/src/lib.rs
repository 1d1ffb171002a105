mod dim;
mod fmt;
mod host;
mod transform;

use digit_layout::DigitLayout;
use ndarray_layout::{ArrayLayout, Endian::BigEndian};
use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};

pub use dim::{BlobDim, BlobShape, N_DIMS, UnknownDim};

pub extern crate digit_layout;
pub extern crate ndarray_layout;

/// 主机上共享的 blob 存储。
pub type HostBlob = Arc<[u8]>;

#[derive(Clone)]
pub struct Tensor<T> {
    dt: DigitLayout,
    layout: ArrayLayout<N_DIMS>,
    item: T,
}

#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum TensorError {
    #[error("shape {shape:?} needs {expected} bytes, got {got}")]
    SizeMismatch {
        shape: BlobShape,
        expected: usize,
        got: usize,
    },
}

fn contiguous(dt: DigitLayout, shape: &BlobShape) -> ArrayLayout<N_DIMS> {
    // 只支持逐元素寻址的数据类型
    assert_eq!(dt.group_size(), 1);
    ArrayLayout::new_contiguous(shape, BigEndian, dt.nbytes())
}

impl Tensor<Vec<u8>> {
    pub fn zeros(dt: DigitLayout, shape: &BlobShape) -> Self {
        let layout = contiguous(dt, shape);
        let size = layout.num_elements() * dt.nbytes();
        Self {
            dt,
            layout,
            item: vec![0; size],
        }
    }
}

impl Tensor<HostBlob> {
    pub fn from_bytes(
        dt: DigitLayout,
        shape: &BlobShape,
        bytes: impl Into<HostBlob>,
    ) -> Result<Self, TensorError> {
        let layout = contiguous(dt, shape);
        let item = bytes.into();
        let expected = layout.num_elements() * dt.nbytes();
        if item.len() != expected {
            return Err(TensorError::SizeMismatch {
                shape: *shape,
                expected,
                got: item.len(),
            });
        }
        Ok(Self { dt, layout, item })
    }
}

impl<T: Into<HostBlob>> Tensor<T> {
    /// 转换为可共享的主机存储，不改变布局。
    pub fn share(self) -> Tensor<HostBlob> {
        self.map(Into::into)
    }
}

impl<T> Tensor<T> {
    pub const fn dt(&self) -> DigitLayout {
        self.dt
    }

    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    pub fn blob_shape(&self) -> BlobShape {
        let mut ans = [0; N_DIMS];
        ans.copy_from_slice(self.layout.shape());
        ans
    }

    pub fn extent(&self, dim: BlobDim) -> usize {
        self.layout.shape()[dim.index()]
    }

    pub fn num_elements(&self) -> usize {
        self.layout.num_elements()
    }

    pub const fn layout(&self) -> &ArrayLayout<N_DIMS> {
        &self.layout
    }

    pub const fn get(&self) -> &T {
        &self.item
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.item
    }

    pub fn is_contiguous(&self) -> bool {
        match self.layout.merge_be(0, self.layout.ndim()) {
            Some(layout) => {
                let &[s] = layout.strides() else {
                    unreachable!()
                };
                s == self.dt.nbytes() as isize
            }
            None => false,
        }
    }

    pub fn check_dt_same(mut tensors: &[&Self]) -> Option<DigitLayout> {
        let mut ans = None;
        while let [head, tail @ ..] = tensors {
            tensors = tail;
            if let Some(dt) = ans {
                if head.dt != dt {
                    return None;
                }
            } else {
                ans = Some(head.dt)
            }
        }
        ans
    }
}

impl<T> Tensor<T> {
    pub fn as_ref(&self) -> Tensor<&T> {
        Tensor {
            dt: self.dt,
            layout: self.layout.clone(),
            item: &self.item,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Tensor<U> {
        let Self { dt, layout, item } = self;
        Tensor {
            dt,
            layout,
            item: f(item),
        }
    }
}

impl<T: Deref> Tensor<T> {
    pub fn as_deref(&self) -> Tensor<&<T as Deref>::Target> {
        Tensor {
            dt: self.dt,
            layout: self.layout.clone(),
            item: self.item.deref(),
        }
    }
}

impl<T: DerefMut> Tensor<T> {
    pub fn as_deref_mut(&mut self) -> Tensor<&mut <T as Deref>::Target> {
        Tensor {
            dt: self.dt,
            layout: self.layout.clone(),
            item: self.item.deref_mut(),
        }
    }
}
