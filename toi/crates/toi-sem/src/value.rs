//! Runtime values shared by the tree interpreter and the stack VM (spec §3,
//! "Value"; spec §4.D, output formatting).
//!
//! Arrays, maps, and instances are reference-shared: cloning a `Value`
//! clones the handle, not the contents. Everything else is by-value.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use toi_util::symbol::Symbol;

/// A declared type's shape: its name and the declaration order of its
/// fields. Shared by every instance constructed from it.
#[derive(Debug)]
pub struct TypeDef {
    pub name: Symbol,
    pub fields: Vec<Symbol>,
}

#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Str(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<BTreeMap<String, Value>>>),
    Instance(Rc<TypeDef>, Rc<RefCell<Vec<Value>>>),
    Unit,
}

impl Value {
    pub fn str(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn map(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    /// An Int is true iff non-zero; every other variant is rejected as a
    /// condition (spec §4.E, "Truthiness").
    pub fn truthy(&self) -> Result<bool, String> {
        match self {
            Value::Int(i) => Ok(*i != 0),
            other => Err(format!(
                "condition must be an Int, found {}",
                other.type_name()
            )),
        }
    }

    pub fn as_int(&self) -> Result<i64, String> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(format!("expected Int, found {}", other.type_name())),
        }
    }

    pub fn as_str(&self) -> Result<Rc<str>, String> {
        match self {
            Value::Str(s) => Ok(s.clone()),
            other => Err(format!("expected String, found {}", other.type_name())),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Str(_) => "String",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
            Value::Instance(..) => "Instance",
            Value::Unit => "Unit",
        }
    }
}

/// `==` per spec §4.E: Int/String by value, arrays element-wise, maps and
/// instances by reference identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => *a.borrow() == *b.borrow(),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(ta, fa), Value::Instance(tb, fb)) => {
                Rc::ptr_eq(ta, tb) && Rc::ptr_eq(fa, fb)
            }
            (Value::Unit, Value::Unit) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Instance(ty, fields) => {
                write!(f, "{}{{", ty.name.as_str())?;
                let fields = fields.borrow();
                for (i, name) in ty.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", name.as_str(), fields[i])?;
                }
                write!(f, "}}")
            }
            Value::Unit => write!(f, "unit"),
        }
    }
}
