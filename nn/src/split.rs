use crate::{Link, NnError};
use arg::Arg;
use op::{AxisSplit, Parts};
use std::{
    ops::Deref,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tensor::{BlobDim, BlobShape, HostBlob, Tensor};

/// 图中的切分节点。
///
/// 切分维度在构造时固定；分段配置可随时读取和替换，替换只做结构检查，
/// 与输入形状相关的检查推迟到下一次 [`evaluate`](Self::evaluate)。
/// 持久化格式的版本号，格式变化时递增。
pub const ARG_VERSION: i64 = 1;

pub struct SplitLayer {
    name: String,
    op: AxisSplit,
    input: Link,
    state: RwLock<State>,
}

struct State {
    parts: Parts,
    /// 当前分段配置下最近一次成功求值的输入形状。
    input_shape: Option<BlobShape>,
}

impl SplitLayer {
    pub fn new(
        name: impl Into<String>,
        axis: BlobDim,
        input: Link,
        sizes: &[i64],
    ) -> Result<Self, NnError> {
        let parts = Parts::new(sizes)?;
        Ok(Self::with_parts(name, axis, input, parts))
    }

    pub fn with_parts(name: impl Into<String>, axis: BlobDim, input: Link, parts: Parts) -> Self {
        let name = name.into();
        tracing::debug!(layer = %name, %axis, %input, %parts, "split layer created");
        Self {
            name,
            op: AxisSplit::new(axis),
            input,
            state: RwLock::new(State {
                parts,
                input_shape: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn axis(&self) -> BlobDim {
        self.op.axis()
    }

    pub fn input(&self) -> &Link {
        &self.input
    }

    pub fn n_outputs(&self) -> usize {
        self.read().parts.n_outputs()
    }

    pub fn output(&self, idx: usize) -> Option<Link> {
        (idx < self.n_outputs()).then(|| Link::new(&*self.name, idx))
    }

    pub fn output_sizes(&self) -> Parts {
        self.read().parts.clone()
    }

    /// 替换分段配置。检查失败时保留原配置。
    pub fn set_output_sizes(&self, sizes: &[i64]) -> Result<(), NnError> {
        let parts = Parts::new(sizes)?;

        let mut state = self.write();
        tracing::debug!(
            layer = %self.name,
            from = %state.parts,
            to = %parts,
            "output sizes changed"
        );
        state.parts = parts;
        state.input_shape = None;
        Ok(())
    }

    /// 当前分段配置是否已经在一个具体输入上通过了形状检查。
    pub fn is_evaluated(&self) -> bool {
        self.read().input_shape.is_some()
    }

    /// 最近一次求值得到的各输出形状。
    pub fn output_shapes(&self) -> Result<Vec<BlobShape>, NnError> {
        let state = self.read();
        let Some(shape) = &state.input_shape else {
            return Err(NnError::NotEvaluated(self.name.clone()));
        };
        Ok(self.op.infer(&state.parts, shape)?)
    }

    /// 检查并切分输入，按顺序返回所有输出。
    pub fn evaluate<T: Clone>(&self, input: &Tensor<T>) -> Result<Vec<Tensor<T>>, NnError> {
        // 检查与切分在同一次加锁内完成，不与 set_output_sizes 交错
        let mut state = self.write();
        state.input_shape = None;

        let outputs = self.op.forward(input, &state.parts)?;
        if outputs.last().is_some_and(|rest| rest.num_elements() == 0) {
            tracing::warn!(layer = %self.name, axis = %self.axis(), "remainder output is empty")
        }
        tracing::debug!(
            layer = %self.name,
            parts = %state.parts,
            n = outputs.len(),
            "split evaluated"
        );

        state.input_shape = Some(input.blob_shape());
        Ok(outputs)
    }

    /// 合并各输出的梯度，得到输入的梯度。
    pub fn propagate_gradient<T: Deref<Target = [u8]>>(
        &self,
        output_grads: &[Tensor<T>],
    ) -> Result<Tensor<HostBlob>, NnError> {
        let state = self.read();
        let Some(shape) = &state.input_shape else {
            return Err(NnError::NotEvaluated(self.name.clone()));
        };

        let grad = self.op.backward(output_grads, &state.parts, shape)?;
        tracing::debug!(layer = %self.name, parts = %state.parts, "gradient propagated");
        Ok(grad)
    }

    /// 导出为可持久化的配置。
    pub fn to_arg(&self) -> Arg {
        Arg::dict([
            ("version", Arg::int(ARG_VERSION)),
            ("name", Arg::str(&self.name)),
            ("axis", Arg::str(self.axis().name())),
            (
                "input",
                Arg::dict([
                    ("layer", Arg::str(&self.input.layer)),
                    ("output", Arg::int(self.input.output as _)),
                ]),
            ),
            (
                "parts",
                Arg::arr(self.output_sizes().to_sizes().into_iter().map(Arg::int)),
            ),
        ])
    }

    /// 从 [`to_arg`](Self::to_arg) 的结果恢复，分段配置重新经过结构检查。
    pub fn from_arg(arg: &Arg) -> Result<Self, NnError> {
        let version = field(arg, "version", Arg::as_int)?;
        if version != ARG_VERSION {
            return Err(NnError::UnsupportedVersion(version));
        }
        let name = field(arg, "name", Arg::as_str)?;
        let axis = field(arg, "axis", Arg::as_str)?.parse::<BlobDim>()?;
        let input = field(arg, "input", Some)?;
        let input = Link::new(
            field(input, "layer", Arg::as_str)?,
            field(input, "output", Arg::as_usize)?,
        );
        let sizes = field(arg, "parts", Arg::as_arr)?
            .iter()
            .map(Arg::as_int)
            .collect::<Option<Vec<_>>>()
            .ok_or(NnError::MalformedArg("parts"))?;
        Self::new(name, axis, input, &sizes)
    }

    // State 总是整体写入，持锁线程 panic 后其内容仍然完整
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn field<'a, T>(
    arg: &'a Arg,
    key: &'static str,
    f: impl FnOnce(&'a Arg) -> Option<T>,
) -> Result<T, NnError> {
    arg.get(key).and_then(f).ok_or(NnError::MalformedArg(key))
}

macro_rules! named_split {
    ($( $fn:ident => $dim:ident )+) => {
        $(
            #[doc = concat!("沿 [`BlobDim::", stringify!($dim), "`] 切分。")]
            pub fn $fn(
                name: impl Into<String>,
                input: Link,
                sizes: &[i64],
            ) -> Result<SplitLayer, NnError> {
                SplitLayer::new(name, BlobDim::$dim, input, sizes)
            }
        )+
    };
}

named_split! {
    split_batch_length => BatchLength
    split_batch_width  => BatchWidth
    split_list_size    => ListSize
    split_height       => Height
    split_width        => Width
    split_depth        => Depth
    split_channels     => Channels
}
