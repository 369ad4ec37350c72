//! Error types for the Z80 register allocation core

use thiserror::Error;

use crate::regalloc::register::Register;
use crate::regalloc::vreg::VirtualRegisterId;

/// Errors the allocation core can raise for a single function.
///
/// Every variant here is fatal: the current function's allocation is
/// aborted and no partial [`crate::regalloc::AllocationResult`] is
/// returned for it. Spilling is never represented as an error — a
/// non-empty spill set is a normal, successful outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// Two pre-colored virtual registers interfere and demand the same
    /// physical register.
    ///
    /// **Triggered by:** a calling-convention pre-coloring (or any other
    /// externally supplied pre-coloring) that assigns the same register
    /// to two virtual registers whose live ranges overlap.
    #[error(
        "ABI conflict: {vr_a:?} and {vr_b:?} both pre-colored to {register} but interfere"
    )]
    AbiConflict {
        /// First pre-colored virtual register.
        vr_a: VirtualRegisterId,
        /// Second pre-colored virtual register.
        vr_b: VirtualRegisterId,
        /// The register both were pinned to.
        register: Register,
    },

    /// A virtual register's allowed set mixes sizes, or a pre-coloring
    /// targets a register outside the virtual register's allowed set.
    #[error(
        "allowed-set violation: {vr:?} cannot be assigned {register} (not in its allowed set, or size mismatch)"
    )]
    AllowedSetViolation {
        /// The offending virtual register.
        vr: VirtualRegisterId,
        /// The register that does not satisfy the allowed set.
        register: Register,
    },

    /// The CFG itself is structurally unsound: no entry block, a
    /// dangling successor reference, or similar.
    #[error("malformed CFG for function {function_name:?}: {reason}")]
    MalformedCfg {
        /// Name of the function whose CFG is malformed.
        function_name: String,
        /// Human-readable description of the structural defect.
        reason: String,
    },
}

/// Result type for the allocation core.
pub type AllocResult<T> = std::result::Result<T, AllocationError>;
