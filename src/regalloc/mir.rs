//! Machine Instruction Interface (component C)
//!
//! The allocator is opcode-agnostic: it only ever asks an instruction
//! for the virtual registers it reads and the one it (optionally)
//! writes. Everything else about an instruction — its opcode, its
//! addressing mode, its encoding — is the lowering pass's and the
//! emitter's business, not the allocator's.

use super::vreg::VirtualRegisterId;

/// Narrow capability the allocator requires from a machine instruction.
///
/// A `None` operand is simply ignored — it's a hole left by an
/// immediate or implicit operand. Instructions with no destination
/// (compare, branch, return) return `None` from
/// [`MachineInstruction::result`].
pub trait MachineInstruction {
    /// Ordered list of source virtual registers, in program order.
    /// `None` entries are holes (e.g. an immediate or implicit operand)
    /// and are ignored by every pass that consumes this trait.
    fn operands(&self) -> Vec<Option<VirtualRegisterId>>;

    /// Destination virtual register, if this instruction writes one.
    fn result(&self) -> Option<VirtualRegisterId>;
}
