use crate::OpError;
use itertools::Itertools;
use std::{fmt, iter::once, ops::Range};

/// 显式分段数的上限，剩余部分总是作为额外的最后一段输出。
pub const MAX_PARTS: usize = 3;

/// 经过结构检查的分段配置：不超过 [`MAX_PARTS`] 个正整数。
///
/// 结构检查与输入形状无关，构造时即完成；
/// 与形状相关的检查见 [`AxisSplit::check`](crate::AxisSplit::check)。
#[derive(Clone, PartialEq, Eq, Hash, Default, Debug)]
pub struct Parts(Vec<usize>);

impl Parts {
    pub fn new(sizes: &[i64]) -> Result<Self, OpError> {
        if sizes.len() > MAX_PARTS {
            return Err(OpError::TooManyParts {
                max: MAX_PARTS,
                got: sizes.len(),
            });
        }
        sizes
            .iter()
            .enumerate()
            .map(|(idx, &size)| match usize::try_from(size) {
                Ok(part) if part > 0 => Ok(part),
                _ => Err(OpError::NonPositivePart { idx, size }),
            })
            .collect::<Result<_, _>>()
            .map(Self)
    }

    /// 以 0 结尾的定长形式，第一个 0 及其后的值被忽略。
    pub fn from_padded(counts: [i64; MAX_PARTS]) -> Result<Self, OpError> {
        let len = counts
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(MAX_PARTS);
        Self::new(&counts[..len])
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn to_sizes(&self) -> Vec<i64> {
        self.0.iter().map(|&p| p as _).collect()
    }

    /// 显式分段数。
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 输出数，总比显式分段多一个。
    pub fn n_outputs(&self) -> usize {
        self.0.len() + 1
    }

    /// 分段之和，溢出时饱和为 `usize::MAX`，因而总会被长度检查拒绝。
    pub fn sum(&self) -> usize {
        self.0.iter().fold(0, |acc, &p| acc.saturating_add(p))
    }

    /// 各输出在切分维度上的区间，最后一个是剩余部分。
    ///
    /// 调用前需保证 `self.sum() <= extent`。
    pub fn ranges(&self, extent: usize) -> impl Iterator<Item = Range<usize>> + '_ {
        let sum = self.sum();
        assert!(sum <= extent, "parts {self} exceed extent {extent}");
        let rest = extent - sum;
        self.0
            .iter()
            .copied()
            .chain(once(rest))
            .scan(0, |start, len| {
                let range = *start..*start + len;
                *start = range.end;
                Some(range)
            })
    }
}

impl fmt::Display for Parts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.iter().join(", "))
    }
}
