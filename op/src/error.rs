use tensor::{BlobDim, BlobShape};

/// 错误的大类。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ErrorKind {
    /// 分段配置本身不合法，与输入无关。
    InvalidConfiguration,
    /// 分段配置或梯度与实际形状不符。
    ShapeMismatch,
}

#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum OpError {
    #[error("at most {max} explicit parts are allowed, got {got}")]
    TooManyParts { max: usize, got: usize },
    #[error("part #{idx} must be positive, got {size}")]
    NonPositivePart { idx: usize, size: i64 },
    #[error("parts sum to {sum}, exceeding the {axis} extent {extent}")]
    PartsExceedExtent {
        axis: BlobDim,
        sum: usize,
        extent: usize,
    },
    #[error("expected {expected} gradients, got {got}")]
    GradientCount { expected: usize, got: usize },
    #[error("gradient #{idx} has shape {got:?}, expected {expected:?}")]
    GradientShape {
        idx: usize,
        expected: BlobShape,
        got: BlobShape,
    },
    #[error("gradients disagree on data type")]
    DataTypeMismatch,
}

impl OpError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TooManyParts { .. } | Self::NonPositivePart { .. } => {
                ErrorKind::InvalidConfiguration
            }
            Self::PartsExceedExtent { .. }
            | Self::GradientCount { .. }
            | Self::GradientShape { .. }
            | Self::DataTypeMismatch => ErrorKind::ShapeMismatch,
        }
    }
}
