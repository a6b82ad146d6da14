//! The runtime value model.
//!
//! `null`, `true`, and `false` are conceptually process-wide singletons;
//! `Rc` gives the same sharing semantics for free and without an allocation,
//! since `Value::Null`/`Value::Bool` carry no heap data to share in the
//! first place.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Str(Rc<str>),
    Sequence(Rc<RefCell<Vec<Value>>>),
    Mapping(Rc<RefCell<IndexMap<Rc<str>, Value>>>),
}

impl Value {
    pub fn str(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn sequence(items: Vec<Value>) -> Self {
        Value::Sequence(Rc::new(RefCell::new(items)))
    }

    pub fn mapping(entries: IndexMap<Rc<str>, Value>) -> Self {
        Value::Mapping(Rc::new(RefCell::new(entries)))
    }

    /// `null` and `false` are falsy; everything else, including integer
    /// zero, is truthy.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(_) | Value::Str(_) | Value::Sequence(_) | Value::Mapping(_) => true,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    /// `< > <= >= == !=` apply to any pair: numeric when both sides are
    /// `int`, otherwise falls back to comparing truthiness.
    pub fn compare(op: &str, left: &Value, right: &Value) -> Option<bool> {
        use std::cmp::Ordering::*;
        let ordering = match (left.as_int(), right.as_int()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => left.truthy().cmp(&right.truthy()),
        };
        Some(match op {
            "<" => ordering == Less,
            ">" => ordering == Greater,
            "<=" => ordering != Greater,
            ">=" => ordering != Less,
            "==" => ordering == Equal,
            "!=" => ordering != Equal,
            _ => return None,
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Sequence(items) => {
                write!(f, "[ ")?;
                for item in items.borrow().iter() {
                    write!(f, "{item}, ")?;
                }
                write!(f, "]")
            }
            Value::Mapping(entries) => {
                write!(f, "{{ ")?;
                for (key, value) in entries.borrow().iter() {
                    write!(f, "\"{key}\": {value}, ")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_rules() {
        assert!(!Value::Null.truthy());
        assert!(!Value::Bool(false).truthy());
        assert!(Value::Bool(true).truthy());
        assert!(Value::Int(0).truthy());
        assert!(Value::str("").truthy());
    }

    #[test]
    fn sequence_textual_form_has_trailing_comma() {
        let v = Value::sequence(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(v.to_string(), "[ 1, 2, ]");
    }

    #[test]
    fn empty_sequence_textual_form() {
        let v = Value::sequence(vec![]);
        assert_eq!(v.to_string(), "[ ]");
    }

    #[test]
    fn mapping_textual_form_has_trailing_comma() {
        let mut entries = IndexMap::new();
        entries.insert(Rc::from("k1"), Value::Int(1));
        let v = Value::mapping(entries);
        assert_eq!(v.to_string(), "{ \"k1\": 1, }");
    }

    #[test]
    fn numeric_comparison_for_ints() {
        assert_eq!(Value::compare("<", &Value::Int(1), &Value::Int(2)), Some(true));
        assert_eq!(Value::compare("==", &Value::Int(2), &Value::Int(2)), Some(true));
    }

    #[test]
    fn truthiness_comparison_for_non_ints() {
        // Both truthy, so considered equal under the truthiness quirk.
        assert_eq!(
            Value::compare("==", &Value::str("a"), &Value::Bool(true)),
            Some(true)
        );
        assert_eq!(
            Value::compare("==", &Value::Null, &Value::str("a")),
            Some(false)
        );
    }
}
