//! 沿 blob 的单个命名维度切分与合并。

mod concat;
mod error;
mod parts;
mod split;

pub use concat::concat;
pub use error::{ErrorKind, OpError};
pub use parts::{MAX_PARTS, Parts};
pub use split::{AxisSplit, validate};
