use std::collections::HashSet;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use smallvec::SmallVec;
use tessera_dtype::DType;

use crate::op::{Op, OpKind};
use crate::types::TensorType;

static NODE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_node_id() -> u64 {
    NODE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Vertex of the computation graph.
///
/// Nodes are immutable once built and shared through `Arc`: a node lives as
/// long as the graph or any consumer still references it.
#[derive(derive_more::Debug)]
pub struct Node {
    /// Unique stable ID for this node instance.
    pub id: u64,
    pub(crate) op: Op,
    pub(crate) outputs: SmallVec<[TensorType; 2]>,
    #[debug(skip)]
    pub(crate) structure_cache: OnceLock<u64>,
}

impl Node {
    pub(crate) fn new(op: Op, outputs: impl IntoIterator<Item = TensorType>) -> Arc<Self> {
        Arc::new(Self {
            id: next_node_id(),
            op,
            outputs: outputs.into_iter().collect(),
            structure_cache: OnceLock::new(),
        })
    }

    pub fn op(&self) -> &Op {
        &self.op
    }

    pub fn kind(&self) -> OpKind {
        self.op.kind()
    }

    pub fn outputs(&self) -> &[TensorType] {
        &self.outputs
    }

    pub fn inputs(&self) -> SmallVec<[&Output; 4]> {
        self.op.inputs()
    }

    pub fn is_fused(&self) -> bool {
        self.kind().is_fused()
    }

    /// Reference to output `index`.
    ///
    /// # Panics
    ///
    /// Panics if the node has no such output.
    pub fn output(self: &Arc<Self>, index: usize) -> Output {
        assert!(index < self.outputs.len(), "{} has no output {index}", self.kind());
        Output { node: self.clone(), index }
    }

    /// Hash of the subgraph rooted at this node, independent of node IDs.
    ///
    /// Two nodes built the same way from the same parameters hash equally.
    pub fn structural_hash(&self) -> u64 {
        *self.structure_cache.get_or_init(|| {
            let mut hasher = DefaultHasher::new();
            self.op.hash_attributes(&mut hasher);
            self.outputs.hash(&mut hasher);
            for input in self.op.inputs() {
                input.node.structural_hash().hash(&mut hasher);
                input.index.hash(&mut hasher);
            }
            hasher.finish()
        })
    }

    /// Nodes reachable from this one, inputs before consumers.
    pub fn toposort(self: &Arc<Self>) -> Vec<Arc<Self>> {
        toposort([self.clone()], |_| false)
    }
}

/// Topological order of everything reachable from `roots`.
///
/// Nodes for which `boundary` returns true are emitted but not descended
/// into. Roots are visited in order, so earlier roots come first when
/// independent.
pub fn toposort<F>(roots: impl IntoIterator<Item = Arc<Node>>, boundary: F) -> Vec<Arc<Node>>
where
    F: Fn(&Arc<Node>) -> bool,
{
    let mut visited = HashSet::new();
    let mut result = Vec::new();
    let roots: Vec<_> = roots.into_iter().collect();

    for root in roots {
        let mut stack = vec![(root, false)];

        while let Some((node, processed)) = stack.pop() {
            if visited.contains(&node.id) {
                continue;
            }

            if processed {
                visited.insert(node.id);
                result.push(node);
            } else if boundary(&node) {
                visited.insert(node.id);
                result.push(node);
            } else {
                stack.push((node.clone(), true));
                for input in node.op.inputs().into_iter().rev() {
                    if !visited.contains(&input.node.id) {
                        stack.push((input.node.clone(), false));
                    }
                }
            }
        }
    }

    result
}

/// Reference to one output of a node.
///
/// Equality and hashing use the producing node's ID and the output index.
#[derive(Clone)]
pub struct Output {
    pub(crate) node: Arc<Node>,
    pub(crate) index: usize,
}

impl Output {
    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn ty(&self) -> &TensorType {
        &self.node.outputs[self.index]
    }

    pub fn dtype(&self) -> DType {
        self.ty().dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.ty().shape
    }

    pub fn rank(&self) -> usize {
        self.ty().rank()
    }

    pub fn kind(&self) -> OpKind {
        self.node.kind()
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Output(id={}, index={})", self.node.id, self.index)
    }
}

impl PartialEq for Output {
    fn eq(&self, other: &Self) -> bool {
        self.node.id == other.node.id && self.index == other.index
    }
}

impl Eq for Output {}

impl Hash for Output {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.id.hash(state);
        self.index.hash(state);
    }
}
