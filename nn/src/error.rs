use crate::Link;
use op::{ErrorKind, OpError};
use tensor::UnknownDim;

#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum NnError {
    #[error(transparent)]
    Op(#[from] OpError),
    #[error("layer `{0}` has no evaluated input for its current sizes")]
    NotEvaluated(String),
    #[error("name `{0}` is already taken")]
    DuplicateName(String),
    #[error("no producer named `{0}`")]
    UnknownProducer(String),
    #[error("`{0}` is not an output of its producer")]
    NoSuchOutput(Link),
    #[error("`{0}` already feeds another layer")]
    EdgeInUse(Link),
    #[error("no tensor fed for source `{0}`")]
    MissingInput(String),
    #[error("malformed layer config at `{0}`")]
    MalformedArg(&'static str),
    #[error("unsupported layer config version {0}")]
    UnsupportedVersion(i64),
    #[error(transparent)]
    UnknownDim(#[from] UnknownDim),
}

impl NnError {
    /// 来自切分算子的错误所属的大类。
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Op(e) => Some(e.kind()),
            _ => None,
        }
    }
}
