//! The builtin function name/arity table (component D's signature half).
//!
//! This lives below `toi-par`, `toi-sem`, `toi-mir`, and `toi-runtime` so
//! every one of them can check a call's arity against it without
//! introducing a dependency cycle: the parser needs it to validate call
//! arity while parsing, the interpreter and VM need it to dispatch actual
//! implementations (carried in `toi-sem`), and the compiler needs it to
//! tell fixed-arity builtin calls from variadic ones.
//!
//! `-1` marks a variadic builtin (`println`, `array`).

pub const BUILTINS: &[(&str, i32)] = &[
    ("println", -1),
    ("inputLines", 0),
    ("split", 2),
    ("chars", 1),
    ("int", 1),
    ("string", 1),
    ("array", -1),
    ("map", 0),
    ("get", 2),
    ("push", 2),
    ("pop", 1),
    ("set", 3),
    ("len", 1),
    ("keys", 1),
    ("isSet", 2),
    ("unset", 2),
];

/// Looks up a builtin's declared arity (`-1` for variadic), or `None` if
/// `name` does not name a builtin.
pub fn arity_of(name: &str) -> Option<i32> {
    BUILTINS.iter().find(|(n, _)| *n == name).map(|(_, a)| *a)
}

pub fn is_builtin(name: &str) -> bool {
    arity_of(name).is_some()
}

pub fn is_variadic(name: &str) -> bool {
    arity_of(name) == Some(-1)
}
