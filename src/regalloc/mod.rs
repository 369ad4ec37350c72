//! Z80 register allocation core.
//!
//! Ties together the register model, virtual register table, CFG,
//! liveness analyzer, interference graph builder, calling convention,
//! and allocator into one entry point: [`allocate_function`].

pub mod allocator;
pub mod callconv;
pub mod cfg;
pub mod interference;
pub mod liveness;
pub mod mir;
pub mod register;
pub mod vreg;

pub use allocator::{color, AllocationResult, AllocatorOptions, SpillHeuristic};
pub use callconv::{
    bit_size_of_type, build_parameter_precoloring, classify_parameters,
    get_caller_saved_registers, get_parameter_location, get_return_value_register,
    ParameterLocation,
};
pub use cfg::{BasicBlock, BlockId, Cfg};
pub use interference::{build_interference_graph, InterferenceGraph};
pub use liveness::{analyze_liveness, LivenessInfo};
pub use mir::MachineInstruction;
pub use register::{Register, RegisterClass, RegisterSize, ALL_REGISTERS};
pub use vreg::{VirtualRegister, VirtualRegisterAllocator, VirtualRegisterId, VirtualRegisterKind};

use std::collections::HashMap;

use crate::error::AllocResult;

/// Runs the full pipeline for one function: validates the CFG, computes
/// liveness, builds the interference graph, and colors it against
/// `precoloring`.
///
/// `vra` is mutated in place — every `Candidate` virtual register
/// becomes either `Allocated` (with `physical` set) or `Unused`
/// (if it turned out to be dead); `StackHome` and `Immediate`
/// registers are untouched.
///
/// Each call only reads and writes the `Cfg`/`VirtualRegisterAllocator`
/// passed to it and touches no other shared state, so a host compiler
/// allocating many functions may call this concurrently across an
/// arbitrary thread pool or executor — one call per function, with no
/// locking or coordination required between them.
pub fn allocate_function<I: MachineInstruction>(
    cfg: &Cfg<I>,
    vra: &mut VirtualRegisterAllocator,
    precoloring: &HashMap<String, Register>,
    options: &AllocatorOptions,
) -> AllocResult<AllocationResult> {
    cfg.validate()?;
    let liveness = analyze_liveness(cfg, vra);
    let graph = build_interference_graph(cfg, vra, &liveness);
    color(vra, &graph, precoloring, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regalloc::mir::test_support::TestInstr;

    /// End-to-end pipeline over a tiny two-parameter function, mirroring
    /// what a lowering pass would hand the allocator for
    /// `add(x: u16, y: u16) -> u16 { x + y }`.
    #[test]
    fn full_pipeline_allocates_add_function() {
        let mut vra = VirtualRegisterAllocator::new();
        let x = vra.allocate_named("add.x".to_string(), vec![Register::Hl]);
        let y = vra.allocate_named("add.y".to_string(), vec![Register::De]);
        let result = vra.allocate_named("add.result".to_string(), ALL_REGISTERS.to_vec());

        let mut cfg: Cfg<TestInstr> = Cfg::new("add", BlockId(0));
        let mut entry = BasicBlock::new(BlockId(0));
        entry.machine_instructions.push(TestInstr::Def(result, vec![x, y]));
        entry.machine_instructions.push(TestInstr::Use(vec![result]));
        cfg.blocks.push(entry);

        let precoloring =
            build_parameter_precoloring("add", &["x".to_string(), "y".to_string()], &[16, 16]);

        let alloc = allocate_function(&cfg, &mut vra, &precoloring, &AllocatorOptions::default())
            .unwrap();
        assert_eq!(alloc.allocation["add.x"], Register::Hl);
        assert_eq!(alloc.allocation["add.y"], Register::De);
        assert!(alloc.spilled.is_empty());
    }

    #[test]
    fn malformed_cfg_is_rejected_before_liveness_runs() {
        let cfg: Cfg<TestInstr> = Cfg::new("broken", BlockId(0));
        let mut vra = VirtualRegisterAllocator::new();
        let result = allocate_function(
            &cfg,
            &mut vra,
            &HashMap::new(),
            &AllocatorOptions::default(),
        );
        assert!(result.is_err());
    }
}
