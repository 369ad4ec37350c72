//! CFG data model: `BasicBlock` and `Cfg`.
//!
//! Blocks reference each other by dense id rather than by pointer — an
//! arena-of-stable-ids layout — so the graph can be built, traversed,
//! and (for tests) compared without the aliasing/ownership trouble a
//! pointer-based CFG would bring in Rust.

use crate::error::AllocationError;

use super::mir::MachineInstruction;

/// Dense identifier for a [`BasicBlock`] within one [`Cfg`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

/// A basic block: a straight-line run of machine instructions plus its
/// successor edges. No back-edge markers are required — the liveness
/// fixed-point (component D) handles loops unconditionally.
#[derive(Debug, Clone)]
pub struct BasicBlock<I> {
    /// Dense id of this block.
    pub id: BlockId,
    /// Instructions in program order.
    pub machine_instructions: Vec<I>,
    /// Successor blocks, by id.
    pub successors: Vec<BlockId>,
}

impl<I> BasicBlock<I> {
    /// Creates an empty block with no instructions or successors yet.
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            machine_instructions: Vec::new(),
            successors: Vec::new(),
        }
    }
}

/// A function's control-flow graph: the unit the allocator processes.
#[derive(Debug, Clone)]
pub struct Cfg<I> {
    /// Name of the function this CFG belongs to, used to build
    /// qualified names (`"function.variable"`) and to identify the
    /// function in error reports.
    pub function_name: String,
    /// All basic blocks. Order is some topological-ish order; reverse
    /// iteration over this vector is the liveness analyzer's
    /// convergence heuristic, not a correctness requirement.
    pub blocks: Vec<BasicBlock<I>>,
    /// Entry block id.
    pub entry: BlockId,
}

impl<I> Cfg<I> {
    /// Creates a CFG with no blocks. Call [`Self::validate`] once
    /// blocks/entry are populated before handing it to the liveness
    /// analyzer.
    pub fn new(function_name: impl Into<String>, entry: BlockId) -> Self {
        Self {
            function_name: function_name.into(),
            blocks: Vec::new(),
            entry,
        }
    }

    /// Looks up a block by id.
    pub fn block(&self, id: BlockId) -> Option<&BasicBlock<I>> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Checks the structural invariants the rest of the core assumes:
    /// the entry block exists, and every successor reference points at
    /// a block that actually exists.
    pub fn validate(&self) -> Result<(), AllocationError> {
        if self.block(self.entry).is_none() {
            return Err(AllocationError::MalformedCfg {
                function_name: self.function_name.clone(),
                reason: format!("entry block {:?} does not exist", self.entry),
            });
        }
        for block in &self.blocks {
            for &succ in &block.successors {
                if self.block(succ).is_none() {
                    return Err(AllocationError::MalformedCfg {
                        function_name: self.function_name.clone(),
                        reason: format!(
                            "block {:?} has dangling successor {:?}",
                            block.id, succ
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Block ids in the order [`Self::blocks`] stores them, reversed —
    /// the order the liveness fixed-point iterates in to converge
    /// faster on typical forward-laid-out CFGs.
    pub fn blocks_reverse(&self) -> impl Iterator<Item = &BasicBlock<I>> {
        self.blocks.iter().rev()
    }
}

impl<I: MachineInstruction> Cfg<I> {
    /// Total instruction count across all blocks, useful for sizing
    /// per-instruction liveness storage up front.
    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.machine_instructions.len()).sum()
    }
}
