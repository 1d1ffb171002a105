use std::fmt;

/// 图中的一条边：某个生产者的第 `output` 个输出。
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Link {
    pub layer: String,
    pub output: usize,
}

impl Link {
    pub fn new(layer: impl Into<String>, output: usize) -> Self {
        Self {
            layer: layer.into(),
            output,
        }
    }

    /// 生产者的第一个输出。
    pub fn first(layer: impl Into<String>) -> Self {
        Self::new(layer, 0)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.layer, self.output)
    }
}
