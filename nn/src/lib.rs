//! 切分层：持有切分维度与可变的分段配置，连接图中的单个输入与多个输出。

mod error;
mod graph;
mod link;
mod split;

pub use error::NnError;
pub use graph::{Activations, Graph, Gradients};
pub use link::Link;
pub use op::{ErrorKind, MAX_PARTS, OpError, Parts};
pub use split::{
    ARG_VERSION, SplitLayer, split_batch_length, split_batch_width, split_channels, split_depth,
    split_height, split_list_size, split_width,
};
pub use tensor::{BlobDim, BlobShape, HostBlob, Tensor};
