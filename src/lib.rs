//! # z80-regalloc
//!
//! A register allocation core for a Z80 compiler backend: composition-aware
//! liveness analysis and graph-coloring allocation over a physical register
//! file where 16-bit pairs (`BC`, `DE`, `HL`) overlap their 8-bit halves
//! (`B`/`C`, `D`/`E`, `H`/`L`).
//!
//! ## Quick start
//!
//! ```rust
//! use std::collections::HashMap;
//! use z80_regalloc::regalloc::{
//!     allocate_function, AllocatorOptions, BasicBlock, BlockId, Cfg, MachineInstruction,
//!     Register, VirtualRegisterAllocator, VirtualRegisterId, ALL_REGISTERS,
//! };
//!
//! // `result = op(operands..)`, the smallest possible MachineInstruction.
//! struct Def(VirtualRegisterId, Vec<VirtualRegisterId>);
//!
//! impl MachineInstruction for Def {
//!     fn operands(&self) -> Vec<Option<VirtualRegisterId>> {
//!         self.1.iter().map(|&id| Some(id)).collect()
//!     }
//!     fn result(&self) -> Option<VirtualRegisterId> {
//!         Some(self.0)
//!     }
//! }
//!
//! let mut vra = VirtualRegisterAllocator::new();
//! let x = vra.allocate_named("add.x".to_string(), vec![Register::Hl]);
//! let y = vra.allocate_named("add.y".to_string(), vec![Register::De]);
//! let result = vra.allocate_named("add.result".to_string(), ALL_REGISTERS.to_vec());
//!
//! let mut cfg: Cfg<Def> = Cfg::new("add", BlockId(0));
//! let mut entry = BasicBlock::new(BlockId(0));
//! entry.machine_instructions.push(Def(result, vec![x, y]));
//! cfg.blocks.push(entry);
//!
//! let mut precoloring = HashMap::new();
//! precoloring.insert("add.x".to_string(), Register::Hl);
//! precoloring.insert("add.y".to_string(), Register::De);
//!
//! let allocation = allocate_function(&cfg, &mut vra, &precoloring, &AllocatorOptions::default())
//!     .expect("allocation succeeds");
//! assert_eq!(allocation.allocation["add.x"], Register::Hl);
//! ```
//!
//! ## Module layout
//!
//! - [`regalloc::register`] — the physical register catalog and composition rules.
//! - [`regalloc::vreg`] — virtual registers and their lifecycle (`Candidate` -> `Allocated`/`Unused`).
//! - [`regalloc::mir`] — the narrow [`regalloc::MachineInstruction`] trait the allocator consumes.
//! - [`regalloc::cfg`] — the control-flow graph the allocator walks.
//! - [`regalloc::liveness`] — backward dataflow liveness analysis.
//! - [`regalloc::interference`] — composition-aware interference graph construction.
//! - [`regalloc::callconv`] — the Z80 calling convention and its pre-coloring.
//! - [`regalloc::allocator`] — graph-coloring assignment with spill handling.
//!
//! This crate does not lower a source language to machine instructions, and
//! it does not emit Z80 opcodes — it only allocates virtual registers to
//! physical ones for machine instructions a caller already produced.

pub mod error;
pub mod regalloc;

pub use error::{AllocResult, AllocationError};
pub use regalloc::allocate_function;
