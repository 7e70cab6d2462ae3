//! Format decoded records for display (text dump).

use crate::value::{Record, Value};

/// Raw scalar string. Lists are rendered inline.
pub fn format_scalar_raw(v: &Value) -> String {
    match v {
        Value::Int(x) => format!("{}", x),
        Value::Bool(x) => format!("{}", x),
        Value::Float(x) => format!("{}", x),
        Value::String(s) => format!("{:?}", s),
        Value::List(items) => format!(
            "[{}]",
            items.iter().map(format_scalar_raw).collect::<Vec<_>>().join(", ")
        ),
    }
}

/// Multi-line rendering of one value. Lists of scalars stay on one line.
pub fn value_to_dump(v: &Value, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    match v {
        Value::List(items) if items.iter().any(|i| matches!(i, Value::List(_))) => {
            let mut lines: Vec<String> = vec![format!("{}[", pad)];
            for (i, item) in items.iter().enumerate() {
                let sub = value_to_dump(item, indent + 1);
                lines.push(format!("{}  [{}] {}", pad, i, sub.trim_start()));
            }
            lines.push(format!("{}]", pad));
            lines.join("\n")
        }
        _ => format!("{}{}", pad, format_scalar_raw(v)),
    }
}

/// `name: value` per field, in record order.
pub fn record_to_dump(record: &Record) -> String {
    let mut lines = Vec::with_capacity(record.len());
    for (name, v) in record.iter() {
        let sub = value_to_dump(v, 0);
        lines.push(format!("{}: {}", name, sub));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_scalars_and_flat_lists() {
        let rec: Record = [
            ("id", Value::Int(41)),
            ("ok", Value::Bool(true)),
            ("name", Value::String("bus0".into())),
            ("xs", Value::List(vec![Value::Int(1), Value::Int(2)])),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            record_to_dump(&rec),
            "id: 41\nok: true\nname: \"bus0\"\nxs: [1, 2]"
        );
    }

    #[test]
    fn dump_nested_lists() {
        let v = Value::List(vec![
            Value::List(vec![Value::Int(1)]),
            Value::List(vec![]),
        ]);
        assert_eq!(value_to_dump(&v, 0), "[\n  [0] [1]\n  [1] []\n]");
    }
}
