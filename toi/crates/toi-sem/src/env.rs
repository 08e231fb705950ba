//! The tree interpreter's lexical environment (spec §3, "Environment").
//!
//! A scope is a flat name→value map. Blocks, `if`, and `while` bodies reuse
//! their enclosing scope rather than introducing their own. A function call
//! creates a fresh scope with nothing linking it to the caller's: the callee
//! sees only its own parameters and locals, matching the compiled VM's flat
//! per-function variable table (see `Interpreter::call_function`).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use toi_util::symbol::Symbol;

use crate::value::Value;

#[derive(Default)]
pub struct Scope {
    vars: HashMap<Symbol, Value>,
}

pub type Env = Rc<RefCell<Scope>>;

pub fn new_root() -> Env {
    Rc::new(RefCell::new(Scope::default()))
}

/// Reads `name` out of `env` (spec §4.E).
pub fn get(env: &Env, name: Symbol) -> Option<Value> {
    env.borrow().vars.get(&name).cloned()
}

/// Writes `name` in `env`, defining it if it isn't already bound.
pub fn set(env: &Env, name: Symbol, value: Value) {
    env.borrow_mut().vars.insert(name, value);
}

/// Binds `name` in `env` directly, shadowing any outer binding. Used for
/// function parameters and out-variables, which must land in the callee's
/// own frame even if an identically-named global exists.
pub fn bind_local(env: &Env, name: Symbol, value: Value) {
    env.borrow_mut().vars.insert(name, value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_bound_value() {
        let root = new_root();
        bind_local(&root, Symbol::intern("g"), Value::Int(1));
        assert_eq!(get(&root, Symbol::intern("g")), Some(Value::Int(1)));
    }

    #[test]
    fn set_overwrites_existing_binding() {
        let root = new_root();
        bind_local(&root, Symbol::intern("g"), Value::Int(1));
        set(&root, Symbol::intern("g"), Value::Int(2));
        assert_eq!(get(&root, Symbol::intern("g")), Some(Value::Int(2)));
    }

    #[test]
    fn set_without_existing_binding_defines_it() {
        let root = new_root();
        assert_eq!(get(&root, Symbol::intern("x")), None);
        set(&root, Symbol::intern("x"), Value::Int(9));
        assert_eq!(get(&root, Symbol::intern("x")), Some(Value::Int(9)));
    }
}
