use crate::{Link, NnError, SplitLayer};
use patricia_tree::PatriciaMap;
use std::collections::{HashMap, HashSet};
use tensor::{HostBlob, Tensor};

/// 每条边上的张量。
pub type Activations = HashMap<Link, Tensor<HostBlob>>;

/// 每条边上的梯度。
pub type Gradients = HashMap<Link, Tensor<HostBlob>>;

/// 由源和切分层组成的最小计算图。
///
/// 节点按加入顺序排列，每个切分层的输入必须已在图中，因此加入顺序就是拓扑序。
/// 每条边至多被一个层消费，梯度回传时不需要累加。
#[derive(Default)]
pub struct Graph {
    names: PatriciaMap<usize>,
    nodes: Vec<Node>,
    consumed: HashSet<Link>,
}

enum Node {
    Source(String),
    Split(SplitLayer),
}

impl Node {
    fn n_outputs(&self) -> usize {
        match self {
            Self::Source(_) => 1,
            Self::Split(layer) => layer.n_outputs(),
        }
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&mut self, name: impl Into<String>) -> Result<Link, NnError> {
        let name = name.into();
        self.check_name(&name)?;

        self.names.insert(name.as_str(), self.nodes.len());
        let link = Link::first(name.as_str());
        self.nodes.push(Node::Source(name));
        Ok(link)
    }

    pub fn add_split(&mut self, layer: SplitLayer) -> Result<(), NnError> {
        self.check_name(layer.name())?;

        let input = layer.input();
        self.check_link(input)?;
        if !self.consumed.insert(input.clone()) {
            return Err(NnError::EdgeInUse(input.clone()));
        }

        self.names.insert(layer.name(), self.nodes.len());
        self.nodes.push(Node::Split(layer));
        Ok(())
    }

    pub fn layer(&self, name: &str) -> Option<&SplitLayer> {
        match self.names.get(name).map(|&i| &self.nodes[i]) {
            Some(Node::Split(layer)) => Some(layer),
            _ => None,
        }
    }

    /// 依次求值所有节点。任何一个节点失败都会中止本次求值。
    pub fn forward<S: Into<String>>(
        &self,
        inputs: impl IntoIterator<Item = (S, Tensor<HostBlob>)>,
    ) -> Result<Activations, NnError> {
        let mut inputs = inputs
            .into_iter()
            .map(|(name, tensor)| (name.into(), tensor))
            .collect::<HashMap<String, _>>();

        let mut activations = Activations::new();
        for node in &self.nodes {
            match node {
                Node::Source(name) => {
                    let Some(tensor) = inputs.remove(name) else {
                        return Err(NnError::MissingInput(name.clone()));
                    };
                    activations.insert(Link::first(name.as_str()), tensor);
                }
                Node::Split(layer) => {
                    let Some(x) = activations.get(layer.input()) else {
                        return Err(NnError::NoSuchOutput(layer.input().clone()));
                    };
                    let ys = layer.evaluate(x)?;
                    activations.extend(
                        ys.into_iter()
                            .enumerate()
                            .map(|(i, y)| (Link::new(layer.name(), i), y)),
                    );
                }
            }
        }
        Ok(activations)
    }

    /// 逆序回传梯度。没有收到梯度的输出按全 0 处理。
    ///
    /// `output_grads` 只能给出未被任何层消费的边。
    pub fn backward(
        &self,
        activations: &Activations,
        output_grads: impl IntoIterator<Item = (Link, Tensor<HostBlob>)>,
    ) -> Result<Gradients, NnError> {
        let mut grads = output_grads.into_iter().collect::<Gradients>();
        for link in grads.keys() {
            self.check_link(link)?;
            if self.consumed.contains(link) {
                return Err(NnError::EdgeInUse(link.clone()));
            }
        }

        for node in self.nodes.iter().rev() {
            let Node::Split(layer) = node else { continue };

            let shapes = layer.output_shapes()?;
            let Some(x) = activations.get(layer.input()) else {
                return Err(NnError::NoSuchOutput(layer.input().clone()));
            };
            let dt = x.dt();

            let dys = shapes
                .into_iter()
                .enumerate()
                .map(|(i, shape)| {
                    let link = Link::new(layer.name(), i);
                    grads.remove(&link).unwrap_or_else(|| {
                        tracing::trace!(%link, "zero gradient");
                        Tensor::zeros(dt, &shape).share()
                    })
                })
                .collect::<Vec<_>>();

            let dx = layer.propagate_gradient(&dys)?;
            grads.insert(layer.input().clone(), dx);
        }
        Ok(grads)
    }

    /// `link` 必须指向图中某个生产者的现有输出。
    fn check_link(&self, link: &Link) -> Result<(), NnError> {
        let Some(&producer) = self.names.get(link.layer.as_str()) else {
            return Err(NnError::UnknownProducer(link.layer.clone()));
        };
        if link.output >= self.nodes[producer].n_outputs() {
            return Err(NnError::NoSuchOutput(link.clone()));
        }
        Ok(())
    }

    fn check_name(&self, name: &str) -> Result<(), NnError> {
        if self.names.contains_key(name) {
            Err(NnError::DuplicateName(name.into()))
        } else {
            Ok(())
        }
    }
}
