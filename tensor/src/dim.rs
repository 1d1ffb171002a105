use std::{fmt, str::FromStr};

/// blob 的维度数，固定为 7。
pub const N_DIMS: usize = 7;

/// blob 形状，按 [`BlobDim`] 的顺序排列。
pub type BlobShape = [usize; N_DIMS];

/// blob 的命名维度。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum BlobDim {
    BatchLength,
    BatchWidth,
    ListSize,
    Height,
    Width,
    Depth,
    Channels,
}

impl BlobDim {
    pub const ALL: [Self; N_DIMS] = [
        Self::BatchLength,
        Self::BatchWidth,
        Self::ListSize,
        Self::Height,
        Self::Width,
        Self::Depth,
        Self::Channels,
    ];

    /// 维度在 [`BlobShape`] 中的下标。
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::BatchLength => "BatchLength",
            Self::BatchWidth => "BatchWidth",
            Self::ListSize => "ListSize",
            Self::Height => "Height",
            Self::Width => "Width",
            Self::Depth => "Depth",
            Self::Channels => "Channels",
        }
    }
}

impl fmt::Display for BlobDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
#[error("unknown blob dimension `{0}`")]
pub struct UnknownDim(pub String);

impl FromStr for BlobDim {
    type Err = UnknownDim;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|dim| dim.name() == s)
            .ok_or_else(|| UnknownDim(s.into()))
    }
}
