//! Builtin implementations shared by the tree interpreter and the stack VM
//! (spec §4.D). `toi_util::builtins` carries the name/arity table this
//! module dispatches against; the two stay in lockstep by construction
//! since both are keyed by the same builtin name strings.

use std::collections::BTreeMap;

use crate::value::Value;

/// The host's side of the I/O contract (spec §6, "Host I/O contract to the
/// core"): a borrowed input string and an append-only output sink.
pub trait HostIo {
    fn write_output(&mut self, s: &str);
    fn input(&self) -> &str;
}

/// An in-memory `HostIo` used by the driver: captures output in a `String`
/// so the two engines' runs can be compared byte-for-byte (spec §5).
#[derive(Default)]
pub struct CapturingHost {
    pub input: String,
    pub output: String,
}

impl HostIo for CapturingHost {
    fn write_output(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn input(&self) -> &str {
        &self.input
    }
}

/// Dispatches a call to a builtin by name. `args` have already been
/// evaluated left-to-right. Returns a plain message on failure; callers
/// attach source location (tree line/col, or VM instruction pointer).
pub fn call(name: &str, args: Vec<Value>, host: &mut dyn HostIo) -> Result<Value, String> {
    match name {
        "println" => println_impl(args, host),
        "inputLines" => input_lines_impl(args, host),
        "split" => split_impl(args),
        "chars" => chars_impl(args),
        "int" => int_impl(args),
        "string" => string_impl(args),
        "array" => Ok(Value::array(args)),
        "map" => Ok(Value::map(BTreeMap::new())),
        "get" => get_impl(args),
        "push" => push_impl(args),
        "pop" => pop_impl(args),
        "set" => set_impl(args),
        "len" => len_impl(args),
        "keys" => keys_impl(args),
        "isSet" => is_set_impl(args),
        "unset" => unset_impl(args),
        _ => Err(format!("unknown builtin `{name}`")),
    }
}

fn println_impl(args: Vec<Value>, host: &mut dyn HostIo) -> Result<Value, String> {
    let line = args
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    host.write_output(&line);
    host.write_output("\n");
    Ok(Value::Unit)
}

fn input_lines_impl(args: Vec<Value>, host: &mut dyn HostIo) -> Result<Value, String> {
    expect_arity("inputLines", &args, 0)?;
    let input = host.input().strip_suffix('\n').unwrap_or(host.input());
    if input.is_empty() {
        return Ok(Value::array(Vec::new()));
    }
    let lines = input.split('\n').map(Value::str).collect();
    Ok(Value::array(lines))
}

fn split_impl(args: Vec<Value>) -> Result<Value, String> {
    expect_arity("split", &args, 2)?;
    let s = args[0].as_str()?;
    let sep = args[1].as_str()?;
    let parts = s.split(sep.as_ref()).map(Value::str).collect();
    Ok(Value::array(parts))
}

fn chars_impl(args: Vec<Value>) -> Result<Value, String> {
    expect_arity("chars", &args, 1)?;
    let s = args[0].as_str()?;
    let chars = s.chars().map(|c| Value::str(c.to_string())).collect();
    Ok(Value::array(chars))
}

fn int_impl(args: Vec<Value>) -> Result<Value, String> {
    expect_arity("int", &args, 1)?;
    let s = args[0].as_str()?;
    s.parse::<i64>()
        .map(Value::Int)
        .map_err(|_| format!("`{s}` is not a valid integer"))
}

fn string_impl(args: Vec<Value>) -> Result<Value, String> {
    expect_arity("string", &args, 1)?;
    let i = args[0].as_int()?;
    Ok(Value::str(i.to_string()))
}

fn get_impl(args: Vec<Value>) -> Result<Value, String> {
    expect_arity("get", &args, 2)?;
    match &args[0] {
        Value::Array(items) => {
            let idx = args[1].as_int()?;
            let items = items.borrow();
            let idx = usize::try_from(idx).map_err(|_| format!("index {idx} out of bounds"))?;
            items
                .get(idx)
                .cloned()
                .ok_or_else(|| format!("index {idx} out of bounds (length {})", items.len()))
        }
        Value::Map(entries) => {
            let key = args[1].as_str()?;
            entries
                .borrow()
                .get(key.as_ref())
                .cloned()
                .ok_or_else(|| format!("key `{key}` not set"))
        }
        other => Err(format!("get expects an Array or Map, found {}", other.type_name())),
    }
}

fn push_impl(args: Vec<Value>) -> Result<Value, String> {
    expect_arity("push", &args, 2)?;
    match &args[0] {
        Value::Array(items) => {
            items.borrow_mut().push(args[1].clone());
            Ok(args[1].clone())
        }
        other => Err(format!("push expects an Array, found {}", other.type_name())),
    }
}

fn pop_impl(args: Vec<Value>) -> Result<Value, String> {
    expect_arity("pop", &args, 1)?;
    match &args[0] {
        Value::Array(items) => items
            .borrow_mut()
            .pop()
            .ok_or_else(|| "pop on an empty array".to_string()),
        other => Err(format!("pop expects an Array, found {}", other.type_name())),
    }
}

fn set_impl(args: Vec<Value>) -> Result<Value, String> {
    expect_arity("set", &args, 3)?;
    match &args[0] {
        Value::Array(items) => {
            let idx = args[1].as_int()?;
            let idx = usize::try_from(idx).map_err(|_| format!("index {idx} out of bounds"))?;
            let mut items = items.borrow_mut();
            if idx == items.len() {
                items.push(args[2].clone());
            } else if idx < items.len() {
                items[idx] = args[2].clone();
            } else {
                return Err(format!("index {idx} out of bounds (length {})", items.len()));
            }
            Ok(args[2].clone())
        }
        Value::Map(entries) => {
            let key = args[1].as_str()?;
            entries.borrow_mut().insert(key.to_string(), args[2].clone());
            Ok(args[2].clone())
        }
        other => Err(format!("set expects an Array or Map, found {}", other.type_name())),
    }
}

fn len_impl(args: Vec<Value>) -> Result<Value, String> {
    expect_arity("len", &args, 1)?;
    match &args[0] {
        Value::Array(items) => Ok(Value::Int(items.borrow().len() as i64)),
        Value::Map(entries) => Ok(Value::Int(entries.borrow().len() as i64)),
        other => Err(format!("len expects an Array or Map, found {}", other.type_name())),
    }
}

fn keys_impl(args: Vec<Value>) -> Result<Value, String> {
    expect_arity("keys", &args, 1)?;
    match &args[0] {
        Value::Array(items) => {
            let keys = (0..items.borrow().len() as i64).map(Value::Int).collect();
            Ok(Value::array(keys))
        }
        Value::Map(entries) => {
            let keys = entries.borrow().keys().cloned().map(Value::str).collect();
            Ok(Value::array(keys))
        }
        other => Err(format!("keys expects an Array or Map, found {}", other.type_name())),
    }
}

fn is_set_impl(args: Vec<Value>) -> Result<Value, String> {
    expect_arity("isSet", &args, 2)?;
    match &args[0] {
        Value::Map(entries) => {
            let key = args[1].as_str()?;
            Ok(Value::Int(entries.borrow().contains_key(key.as_ref()) as i64))
        }
        other => Err(format!("isSet expects a Map, found {}", other.type_name())),
    }
}

fn unset_impl(args: Vec<Value>) -> Result<Value, String> {
    expect_arity("unset", &args, 2)?;
    match &args[0] {
        Value::Map(entries) => {
            let key = args[1].as_str()?;
            entries.borrow_mut().remove(key.as_ref());
            Ok(Value::Int(0))
        }
        other => Err(format!("unset expects a Map, found {}", other.type_name())),
    }
}

fn expect_arity(name: &str, args: &[Value], arity: usize) -> Result<(), String> {
    if args.len() != arity {
        return Err(format!(
            "{name} expects {arity} argument(s), got {}",
            args.len()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn println_writes_comma_joined_line() {
        let mut host = CapturingHost::default();
        call("println", vec![Value::Int(1), Value::str("x")], &mut host).unwrap();
        assert_eq!(host.output, "1, x\n");
    }

    #[test]
    fn input_lines_splits_and_trims() {
        let mut host = CapturingHost {
            input: "a\nb\nc\n".to_string(),
            output: String::new(),
        };
        let result = call("inputLines", vec![], &mut host).unwrap();
        assert_eq!(result.to_string(), "[a, b, c]");
    }

    #[test]
    fn set_on_array_append_vs_out_of_bounds() {
        let mut host = CapturingHost::default();
        let arr = Value::array(vec![Value::Int(1)]);
        call("set", vec![arr.clone(), Value::Int(1), Value::Int(2)], &mut host).unwrap();
        assert_eq!(arr.to_string(), "[1, 2]");
        let err = call("set", vec![arr, Value::Int(5), Value::Int(9)], &mut host).unwrap_err();
        assert!(err.contains("out of bounds"));
    }

    #[test]
    fn keys_sorted_for_maps() {
        let mut host = CapturingHost::default();
        let m = call("map", vec![], &mut host).unwrap();
        call("set", vec![m.clone(), Value::str("b"), Value::Int(2)], &mut host).unwrap();
        call("set", vec![m.clone(), Value::str("a"), Value::Int(1)], &mut host).unwrap();
        let keys = call("keys", vec![m], &mut host).unwrap();
        assert_eq!(keys.to_string(), "[a, b]");
    }
}
