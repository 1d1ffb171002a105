use std::ops::Deref;
use tensor::{BlobDim, BlobShape, HostBlob, Tensor, digit_layout::DigitLayout};

/// 沿 `axis` 依次拼接 `parts`，写入一块形状为 `shape` 的新连续存储。
///
/// 各段除 `axis` 外的维度必须与 `shape` 一致，且在 `axis` 上的长度之和等于 `shape[axis]`。
pub fn concat<T: Deref<Target = [u8]>>(
    axis: BlobDim,
    dt: DigitLayout,
    shape: &BlobShape,
    parts: &[Tensor<T>],
) -> Tensor<HostBlob> {
    let mut ans = Tensor::zeros(dt, shape);

    let mut start = 0;
    for part in parts {
        let len = part.extent(axis);
        // 用 slice 定位目标区间，逐元素写回
        ans.as_deref_mut()
            .slice(axis, start, len)
            .copy_from(part);
        start += len
    }
    assert_eq!(start, shape[axis.index()]);

    ans.share()
}
