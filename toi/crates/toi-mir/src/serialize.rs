//! The line-oriented serialized program format (spec §4.H, §6).
//!
//! Every value — a count, a name, an opcode byte — is written on its own
//! line. This keeps the format trivial to hand-inspect and to parse without
//! a real lexer: each section starts with a decimal count, and `read_program`
//! checks every declared count against the number of lines it actually
//! consumes rather than trusting the header.

use std::io::{BufRead, Write};

use indexmap::IndexMap;

use toi_util::symbol::Symbol;

use crate::program::{CompiledFunction, CompiledProgram, CompiledType, Constant};

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("unexpected end of input while reading {0}")]
    UnexpectedEof(&'static str),
    #[error("invalid count line: `{0}`")]
    InvalidCount(String),
    #[error("malformed constant entry: `{0}`")]
    MalformedConstant(String),
    #[error("malformed opcode byte: `{0}`")]
    MalformedOpcode(String),
    #[error("malformed boolean flag: `{0}`")]
    MalformedFlag(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Writes `program` in the format spec §6 defines: a constant pool, then
/// each function (name, has-out-variable flag, parameters, variables,
/// instructions), then the top level's own variables and instructions. The
/// type table is not persisted — spec §6's format has no section for it, so
/// a program that constructs instances can only be replayed through a fresh
/// compile, not a round trip through a serialized file (see `DESIGN.md`).
pub fn write_program(program: &CompiledProgram, out: &mut impl Write) -> Result<(), SerializeError> {
    writeln!(out, "{} constants", program.constants.len())?;
    for c in &program.constants {
        match c {
            Constant::Int(i) => writeln!(out, "int:{i}")?,
            Constant::Str(s) => writeln!(out, "string:{s}")?,
        }
    }

    writeln!(out, "{} functions", program.functions.len())?;
    for (name, f) in &program.functions {
        write_function(out, name, f)?;
    }

    writeln!(out, "{} variables", program.top_level_variables.len())?;
    for v in &program.top_level_variables {
        writeln!(out, "{}", v.as_str())?;
    }
    writeln!(out, "{} instructions", program.top_level_code.len())?;
    for b in &program.top_level_code {
        writeln!(out, "{b}")?;
    }
    Ok(())
}

fn write_function(out: &mut impl Write, name: &Symbol, f: &CompiledFunction) -> Result<(), SerializeError> {
    writeln!(out, "{}", name.as_str())?;
    writeln!(out, "{}", f.out_param.is_some())?;
    writeln!(out, "{} parameters", f.params.len())?;
    for p in &f.params {
        writeln!(out, "{}", p.as_str())?;
    }
    writeln!(out, "{} variables", f.variables.len())?;
    for v in &f.variables {
        writeln!(out, "{}", v.as_str())?;
    }
    writeln!(out, "{} instructions", f.code.len())?;
    for b in &f.code {
        writeln!(out, "{b}")?;
    }
    Ok(())
}

/// Reads a program back from the format `write_program` writes. The type
/// table comes back empty (see `write_program`'s doc comment); a deserialized
/// program that relies on `INSTANTIATE`/`FIELD_ACCESS` needs its type table
/// supplied separately by whoever compiled it.
pub fn read_program(r: &mut impl BufRead) -> Result<CompiledProgram, SerializeError> {
    let n_const = read_count(r, "constants")?;
    let mut constants = Vec::with_capacity(n_const);
    for _ in 0..n_const {
        let line = read_line(r, "constant entry")?;
        constants.push(parse_constant(&line)?);
    }

    let n_funcs = read_count(r, "functions")?;
    let mut functions = IndexMap::with_capacity(n_funcs);
    for _ in 0..n_funcs {
        let (name, func) = read_function(r)?;
        functions.insert(name, func);
    }

    let n_vars = read_count(r, "variables")?;
    let mut top_level_variables = Vec::with_capacity(n_vars);
    for _ in 0..n_vars {
        top_level_variables.push(Symbol::intern(&read_line(r, "top-level variable name")?));
    }
    let n_instr = read_count(r, "instructions")?;
    let mut top_level_code = Vec::with_capacity(n_instr);
    for _ in 0..n_instr {
        top_level_code.push(parse_byte(&read_line(r, "top-level instruction byte")?)?);
    }

    Ok(CompiledProgram {
        constants,
        functions,
        types: IndexMap::new(),
        top_level_variables,
        top_level_code,
    })
}

fn read_function(r: &mut impl BufRead) -> Result<(Symbol, CompiledFunction), SerializeError> {
    let name = Symbol::intern(&read_line(r, "function name")?);
    let has_out = parse_bool(&read_line(r, "has-out-variable flag")?)?;

    let n_params = read_count(r, "parameters")?;
    let mut params = Vec::with_capacity(n_params);
    for _ in 0..n_params {
        params.push(Symbol::intern(&read_line(r, "parameter name")?));
    }

    let n_vars = read_count(r, "variables")?;
    let mut variables = Vec::with_capacity(n_vars);
    for _ in 0..n_vars {
        variables.push(Symbol::intern(&read_line(r, "variable name")?));
    }

    let n_instr = read_count(r, "instructions")?;
    let mut code = Vec::with_capacity(n_instr);
    for _ in 0..n_instr {
        code.push(parse_byte(&read_line(r, "instruction byte")?)?);
    }

    let out_param = if has_out { variables.first().copied() } else { None };

    Ok((
        name,
        CompiledFunction {
            params,
            out_param,
            variables,
            code,
        },
    ))
}

fn read_line(r: &mut impl BufRead, section: &'static str) -> Result<String, SerializeError> {
    let mut line = String::new();
    let n = r.read_line(&mut line)?;
    if n == 0 {
        return Err(SerializeError::UnexpectedEof(section));
    }
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

fn read_count(r: &mut impl BufRead, section: &'static str) -> Result<usize, SerializeError> {
    let line = read_line(r, section)?;
    let digits = line.split_whitespace().next().unwrap_or("");
    digits
        .parse::<usize>()
        .map_err(|_| SerializeError::InvalidCount(line.clone()))
}

fn parse_bool(line: &str) -> Result<bool, SerializeError> {
    match line {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(SerializeError::MalformedFlag(other.to_string())),
    }
}

fn parse_byte(line: &str) -> Result<u8, SerializeError> {
    line.parse::<u8>().map_err(|_| SerializeError::MalformedOpcode(line.to_string()))
}

fn parse_constant(line: &str) -> Result<Constant, SerializeError> {
    if let Some(rest) = line.strip_prefix("int:") {
        let i = rest
            .parse::<i64>()
            .map_err(|_| SerializeError::MalformedConstant(line.to_string()))?;
        Ok(Constant::Int(i))
    } else if let Some(rest) = line.strip_prefix("string:") {
        Ok(Constant::Str(rest.to_string()))
    } else {
        Err(SerializeError::MalformedConstant(line.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;

    fn compile_src(src: &str) -> CompiledProgram {
        let (tokens, errors) = toi_lex::tokenize(src);
        assert!(errors.is_empty());
        let block = toi_par::parse(tokens).unwrap();
        compile(&block).unwrap()
    }

    #[test]
    fn round_trips_a_simple_program() {
        let program = compile_src("x = 1\nprintln(x + 2)\n");
        let mut buf = Vec::new();
        write_program(&program, &mut buf).unwrap();
        let mut cursor = std::io::Cursor::new(buf);
        let back = read_program(&mut cursor).unwrap();
        assert_eq!(back.constants, program.constants);
        assert_eq!(back.top_level_variables, program.top_level_variables);
        assert_eq!(back.top_level_code, program.top_level_code);
    }

    #[test]
    fn round_trips_a_function_with_an_out_variable() {
        let program = compile_src("add | a b | r { r = a + b }\nprintln(add(2, 3))\n");
        let mut buf = Vec::new();
        write_program(&program, &mut buf).unwrap();
        let mut cursor = std::io::Cursor::new(buf);
        let back = read_program(&mut cursor).unwrap();
        let name = Symbol::intern("add");
        let original = program.functions.get(&name).unwrap();
        let restored = back.functions.get(&name).unwrap();
        assert_eq!(restored.params, original.params);
        assert_eq!(restored.out_param, original.out_param);
        assert_eq!(restored.variables, original.variables);
        assert_eq!(restored.code, original.code);
    }

    #[test]
    fn truncated_input_is_an_error_not_a_panic() {
        let program = compile_src("println(1)\n");
        let mut buf = Vec::new();
        write_program(&program, &mut buf).unwrap();
        buf.truncate(buf.len() / 2);
        let mut cursor = std::io::Cursor::new(buf);
        assert!(read_program(&mut cursor).is_err());
    }

    #[test]
    fn malformed_constant_line_is_rejected() {
        let input = "1 constants\nbogus\n0 functions\n0 variables\n0 instructions\n";
        let mut cursor = std::io::Cursor::new(input.as_bytes());
        assert!(matches!(read_program(&mut cursor), Err(SerializeError::MalformedConstant(_))));
    }
}
