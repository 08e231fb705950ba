//! Compiles the spec's worked scenarios and checks the resulting bytecode
//! survives a write/read round trip, complementing the inline unit tests in
//! `src/compiler.rs` and `src/serialize.rs` which check individual opcode
//! shapes.

fn compile_and_round_trip(src: &str) {
    let (tokens, errors) = toi_lex::tokenize(src);
    assert!(errors.is_empty(), "lex errors: {errors:?}");
    let block = toi_par::parse(tokens).unwrap_or_else(|e| panic!("parse error: {e}"));
    let program = toi_mir::compile(&block).unwrap_or_else(|e| panic!("compile error: {e}"));

    let mut buf = Vec::new();
    toi_mir::write_program(&program, &mut buf).unwrap();
    let mut cursor = std::io::Cursor::new(buf);
    let restored = toi_mir::read_program(&mut cursor).unwrap_or_else(|e| panic!("read_program error: {e}"));
    assert_eq!(restored.constants, program.constants);
    assert_eq!(restored.top_level_code, program.top_level_code);
}

#[test]
fn arithmetic_and_precedence() {
    compile_and_round_trip("println(1 + 2 * 3)\n");
}

#[test]
fn short_circuit_or_skips_division_by_zero() {
    compile_and_round_trip("x = 0\nprintln(x == 0 or 1/x > 0)\n");
}

#[test]
fn loop_with_break() {
    compile_and_round_trip("i = 0\nwhile 1 {\nif i == 3 { exit loop }\ni = i + 1\n}\nprintln(i)\n");
}

#[test]
fn map_iteration_is_sorted() {
    compile_and_round_trip("m = map()\nset(m, \"b\", 2)\nset(m, \"a\", 1)\nfor v = [m]k { println(k, v) }\n");
}

#[test]
fn function_with_out_variable() {
    compile_and_round_trip("add | a b | r { r = a + b }\nprintln(add(2, 3))\n");
}

#[test]
fn type_and_field_access() {
    compile_and_round_trip("type Pt { x y }\np = Pt(3, 4)\np.x = 7\nprintln(p.x, p.y)\n");
}
