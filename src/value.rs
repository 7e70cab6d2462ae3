//! Decoded values (decoder output representation).

/// A single decoded value. Integers of every width are widened to `i64`, floats to `f64`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Float(f64),
    String(String),
    List(Vec<Value>),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }
}

/// Ordered mapping of field name to decoded value, in field declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Record {
            entries: Vec::with_capacity(n),
        }
    }

    /// Insert a value. A repeated name keeps its original position and takes the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_preserves_insertion_order() {
        let mut r = Record::new();
        r.insert("b", Value::Int(1));
        r.insert("a", Value::Int(2));
        r.insert("c", Value::Bool(true));
        assert_eq!(r.names().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn record_duplicate_name_last_write_wins() {
        let mut r = Record::new();
        r.insert("x", Value::Int(1));
        r.insert("y", Value::Int(2));
        r.insert("x", Value::Int(3));
        assert_eq!(r.len(), 2);
        assert_eq!(r.get("x"), Some(&Value::Int(3)));
        assert_eq!(r.names().next(), Some("x"));
    }

    #[test]
    fn accessors_reject_other_variants() {
        assert_eq!(Value::Int(5).as_bool(), None);
        assert_eq!(Value::String("s".into()).as_str(), Some("s"));
        assert!(Value::List(vec![]).as_list().unwrap().is_empty());
        assert_eq!(Value::Float(1.5).as_i64(), None);
    }
}
