//! Calling Convention (component F)
//!
//! Maps parameter index x size to a physical register or a stack
//! offset, and supplies the pre-coloring map the allocator (component
//! G) pins before it ever runs graph coloring.

use std::collections::HashMap;

use super::register::{Register, ALL_REGISTERS};

/// Where a single parameter lives: a register, or a byte offset from
/// the stack pointer at function entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterLocation {
    /// Register the parameter is passed in, if any.
    pub register: Option<Register>,
    /// Byte offset from the stack pointer, meaningful only when
    /// `on_stack` is true.
    pub stack_offset: u16,
    /// True iff this parameter is passed on the stack.
    pub on_stack: bool,
}

const REGISTER_PARAMS_16: [Register; 3] = [Register::Hl, Register::De, Register::Bc];
const REGISTER_PARAMS_8: [Register; 3] = [Register::L, Register::E, Register::C];

/// First stacked parameter's offset: 2 bytes, to step over the return
/// address a Z80 `CALL` instruction pushes. Specific to that calling
/// sequence — a different call/trampoline convention would need a
/// different constant here, not a silent adjustment.
const FIRST_STACK_PARAM_OFFSET: u16 = 2;

fn round_up_to_bytes(size_bits: u8) -> u16 {
    (u16::from(size_bits) + 7) / 8
}

/// Single-parameter query over one parameter's index and size. Only
/// the first stacked parameter (`index == 3`) is guaranteed correct
/// from this signature alone, since later stack offsets depend
/// on the sizes of every preceding stacked parameter. Prefer
/// [`classify_parameters`] once more than one parameter is on the
/// stack.
pub fn get_parameter_location(index: usize, size_bits: u8) -> ParameterLocation {
    if index < 3 {
        let register = if size_bits == 16 {
            REGISTER_PARAMS_16[index]
        } else {
            REGISTER_PARAMS_8[index]
        };
        return ParameterLocation {
            register: Some(register),
            stack_offset: 0,
            on_stack: false,
        };
    }
    let stack_offset =
        FIRST_STACK_PARAM_OFFSET + round_up_to_bytes(size_bits) * (index as u16 - 3);
    ParameterLocation {
        register: None,
        stack_offset,
        on_stack: true,
    }
}

/// Classifies a complete parameter list, accumulating stack offsets
/// correctly across a mix of 8-bit and 16-bit stacked parameters.
pub fn classify_parameters(param_sizes_bits: &[u8]) -> Vec<ParameterLocation> {
    let mut result = Vec::with_capacity(param_sizes_bits.len());
    let mut next_stack_offset = FIRST_STACK_PARAM_OFFSET;
    for (index, &size_bits) in param_sizes_bits.iter().enumerate() {
        if index < 3 {
            let register = if size_bits == 16 {
                REGISTER_PARAMS_16[index]
            } else {
                REGISTER_PARAMS_8[index]
            };
            result.push(ParameterLocation {
                register: Some(register),
                stack_offset: 0,
                on_stack: false,
            });
        } else {
            let offset = next_stack_offset;
            next_stack_offset += round_up_to_bytes(size_bits);
            result.push(ParameterLocation {
                register: None,
                stack_offset: offset,
                on_stack: true,
            });
        }
    }
    result
}

/// Bit width of a source-language type name, as exposed to the lowering
/// pass when it has a type name but no virtual register size yet.
/// `bool`/`i8`/`u8` are 8 bits; `i16`/`u16` are 16 bits; anything else
/// defaults to 8 bits. This default is a known limitation (spec §9):
/// wider or non-integer types are not modeled by this calling
/// convention and silently round down to a byte.
pub fn bit_size_of_type(type_name: &str) -> u8 {
    match type_name {
        "i16" | "u16" => 16,
        _ => 8,
    }
}

/// Return-value register: `A` for 8-bit results, `HL` for 16-bit.
pub fn get_return_value_register(size_bits: u8) -> Register {
    if size_bits == 16 {
        Register::Hl
    } else {
        Register::A
    }
}

/// All caller-saved registers. This ABI has no callee-saved registers,
/// so this is simply the entire allocatable pool.
pub fn get_caller_saved_registers() -> &'static [Register] {
    ALL_REGISTERS
}

/// Builds the pre-coloring map the calling convention imposes on a
/// function's register-passed parameters. Stacked parameters are
/// omitted — they have no pre-coloring since they are not in a
/// register at all.
pub fn build_parameter_precoloring(
    function_name: &str,
    param_names: &[String],
    param_sizes_bits: &[u8],
) -> HashMap<String, Register> {
    let locations = classify_parameters(param_sizes_bits);
    let mut precoloring = HashMap::new();
    for (name, location) in param_names.iter().zip(locations) {
        if let Some(register) = location.register {
            precoloring.insert(format!("{function_name}.{name}"), register);
        }
    }
    precoloring
}
