// File: src/disasm.rs
//
// Human-readable bytecode disassembler, mirroring clox's `debug.c`. Not
// part of the opcode set — purely a debugging aid wired behind `--dump`
// on `ruff run` and exercised directly by unit tests.

use crate::chunk::{Chunk, OpCode};
use crate::value::Value;
use std::rc::Rc;

/// Disassembles every instruction in `chunk`, prefixing each line with
/// `name` the first time it's called for a given function.
pub fn disassemble_chunk(chunk: &Chunk, name: &str) -> String {
    let mut out = format!("== {name} ==\n");
    let mut offset = 0;
    while offset < chunk.len() {
        offset = disassemble_instruction(chunk, offset, &mut out);
    }
    out
}

/// Disassembles one instruction starting at `offset`, appends its text to
/// `out`, and returns the offset of the next instruction.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    out.push_str(&format!("{offset:04} "));
    if offset > 0 && chunk.get_line(offset) == chunk.get_line(offset - 1) {
        out.push_str("   | ");
    } else {
        out.push_str(&format!("{:4} ", chunk.get_line(offset)));
    }

    let op = OpCode::from_u8(chunk.code()[offset]);
    match op {
        OpCode::Constant => constant_instruction("OP_CONSTANT", chunk, offset, out),
        OpCode::Nil => simple_instruction("OP_NIL", offset, out),
        OpCode::True => simple_instruction("OP_TRUE", offset, out),
        OpCode::False => simple_instruction("OP_FALSE", offset, out),
        OpCode::Pop => simple_instruction("OP_POP", offset, out),
        OpCode::GetLocal => byte_instruction("OP_GET_LOCAL", chunk, offset, out),
        OpCode::SetLocal => byte_instruction("OP_SET_LOCAL", chunk, offset, out),
        OpCode::GetGlobal => constant_instruction("OP_GET_GLOBAL", chunk, offset, out),
        OpCode::SetGlobal => constant_instruction("OP_SET_GLOBAL", chunk, offset, out),
        OpCode::DefineGlobal => constant_instruction("OP_DEFINE_GLOBAL", chunk, offset, out),
        OpCode::GetUpvalue => byte_instruction("OP_GET_UPVALUE", chunk, offset, out),
        OpCode::SetUpvalue => byte_instruction("OP_SET_UPVALUE", chunk, offset, out),
        OpCode::Equal => simple_instruction("OP_EQUAL", offset, out),
        OpCode::Greater => simple_instruction("OP_GREATER", offset, out),
        OpCode::Less => simple_instruction("OP_LESS", offset, out),
        OpCode::Add => simple_instruction("OP_ADD", offset, out),
        OpCode::Subtract => simple_instruction("OP_SUBTRACT", offset, out),
        OpCode::Multiply => simple_instruction("OP_MULTIPLY", offset, out),
        OpCode::Divide => simple_instruction("OP_DIVIDE", offset, out),
        OpCode::Not => simple_instruction("OP_NOT", offset, out),
        OpCode::Negate => simple_instruction("OP_NEGATE", offset, out),
        OpCode::Print => simple_instruction("OP_PRINT", offset, out),
        OpCode::Jump => jump_instruction("OP_JUMP", 1, chunk, offset, out),
        OpCode::JumpIfFalse => jump_instruction("OP_JUMP_IF_FALSE", 1, chunk, offset, out),
        OpCode::Loop => jump_instruction("OP_LOOP", -1, chunk, offset, out),
        OpCode::Call => byte_instruction("OP_CALL", chunk, offset, out),
        OpCode::Closure => closure_instruction(chunk, offset, out),
        OpCode::Return => simple_instruction("OP_RETURN", offset, out),
    }
}

fn simple_instruction(name: &str, offset: usize, out: &mut String) -> usize {
    out.push_str(name);
    out.push('\n');
    offset + 1
}

fn byte_instruction(name: &str, chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    let slot = chunk.code()[offset + 1];
    out.push_str(&format!("{name:-16} {slot:4}\n"));
    offset + 2
}

fn constant_instruction(name: &str, chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    let index = chunk.code()[offset + 1] as usize;
    out.push_str(&format!("{name:-16} {index:4} '{}'\n", chunk.constants()[index]));
    offset + 2
}

fn jump_instruction(name: &str, sign: i32, chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    let hi = chunk.code()[offset + 1] as u16;
    let lo = chunk.code()[offset + 2] as u16;
    let jump = (hi << 8) | lo;
    let target = offset as i64 + 3 + sign as i64 * jump as i64;
    out.push_str(&format!("{name:-16} {offset:4} -> {target}\n"));
    offset + 3
}

fn closure_instruction(chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    let mut offset = offset + 1;
    let index = chunk.code()[offset] as usize;
    offset += 1;
    out.push_str(&format!("{:-16} {index:4} '{}'\n", "OP_CLOSURE", chunk.constants()[index]));

    let function = match &chunk.constants()[index] {
        Value::Function(f) => Some(Rc::clone(f)),
        _ => None,
    };
    let upvalue_count = function.as_ref().map_or(0, |f| f.upvalue_count);
    for _ in 0..upvalue_count {
        let is_local = chunk.code()[offset];
        let local_index = chunk.code()[offset + 1];
        out.push_str(&format!(
            "{offset:04}      |                     {} {local_index}\n",
            if is_local == 1 { "local" } else { "upvalue" }
        ));
        offset += 2;
    }

    // Recurse into the nested function's own chunk so every opcode in the
    // program — not just the top level's — shows up in a dump (spec §8's
    // disassemble/assemble round-trip property).
    if let Some(function) = function {
        let name = if function.name.is_empty() { "script" } else { &function.name };
        out.push_str(&disassemble_chunk(&function.chunk, name));
    }

    offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Chunk;
    use crate::value::Value;

    #[test]
    fn disassembles_a_constant_and_return() {
        let mut chunk = Chunk::new();
        let index = chunk.write_constant(Value::Number(1.2));
        chunk.write(OpCode::Constant as u8, 1);
        chunk.write(index as u8, 1);
        chunk.write(OpCode::Return as u8, 1);

        let text = disassemble_chunk(&chunk, "test");
        assert!(text.contains("OP_CONSTANT"));
        assert!(text.contains("1.2"));
        assert!(text.contains("OP_RETURN"));
    }

    #[test]
    fn dumping_the_script_chunk_recurses_into_nested_functions() {
        use crate::compiler::compile;
        use crate::interner::Interner;

        let mut interner = Interner::new();
        let script = compile("fun add(a, b) { return a + b; }", &mut interner)
            .expect("source compiles");

        let text = disassemble_chunk(&script.chunk, "script");
        assert!(text.contains("== add =="));
        assert!(text.contains("OP_GET_LOCAL"));
        assert!(text.contains("OP_ADD"));
    }
}
