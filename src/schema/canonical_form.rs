//! [Parsing Canonical
//! Form](https://avro.apache.org/docs/current/specification/#parsing-canonical-form-for-schemas)
//! and the 64-bit Rabin fingerprint derived from it.

use std::collections::HashSet;
use std::fmt::Write as _;

use super::{node::*, SchemaKey};

pub(crate) fn compute(nodes: &[SchemaNode], root: SchemaKey) -> String {
	let mut out = String::new();
	let mut emitted = HashSet::new();
	write_node(&mut out, nodes, root, &mut emitted);
	out
}

fn write_node(out: &mut String, nodes: &[SchemaNode], key: SchemaKey, emitted: &mut HashSet<String>) {
	match &nodes[key.idx()].type_ {
		RegularType::Null => out.push_str("\"null\""),
		RegularType::Boolean => out.push_str("\"boolean\""),
		RegularType::Int => out.push_str("\"int\""),
		RegularType::Long => out.push_str("\"long\""),
		RegularType::Float => out.push_str("\"float\""),
		RegularType::Double => out.push_str("\"double\""),
		RegularType::Bytes => out.push_str("\"bytes\""),
		RegularType::String => out.push_str("\"string\""),
		RegularType::Array(a) => {
			out.push_str("{\"type\":\"array\",\"items\":");
			write_node(out, nodes, a.items, emitted);
			out.push('}');
		}
		RegularType::Map(m) => {
			out.push_str("{\"type\":\"map\",\"values\":");
			write_node(out, nodes, m.values, emitted);
			out.push('}');
		}
		RegularType::Union(u) => {
			out.push('[');
			for (i, &v) in u.variants().iter().enumerate() {
				if i > 0 {
					out.push(',');
				}
				write_node(out, nodes, v, emitted);
			}
			out.push(']');
		}
		RegularType::Fixed(f) => {
			let full_name = f.name.fully_qualified_name();
			if !emitted.insert(full_name.to_owned()) {
				write_escaped_str(out, full_name);
				return;
			}
			out.push_str("{\"name\":");
			write_escaped_str(out, full_name);
			out.push_str(",\"type\":\"fixed\",\"size\":");
			let _ = write!(out, "{}", f.size);
			out.push('}');
		}
		RegularType::Enum(e) => {
			let full_name = e.name.fully_qualified_name();
			if !emitted.insert(full_name.to_owned()) {
				write_escaped_str(out, full_name);
				return;
			}
			out.push_str("{\"name\":");
			write_escaped_str(out, full_name);
			out.push_str(",\"type\":\"enum\",\"symbols\":[");
			for (i, s) in e.symbols.iter().enumerate() {
				if i > 0 {
					out.push(',');
				}
				write_escaped_str(out, s);
			}
			out.push_str("]}");
		}
		RegularType::Record(r) => {
			let full_name = r.name.fully_qualified_name();
			if !emitted.insert(full_name.to_owned()) {
				write_escaped_str(out, full_name);
				return;
			}
			out.push_str("{\"name\":");
			write_escaped_str(out, full_name);
			out.push_str(",\"type\":\"record\",\"fields\":[");
			for (i, field) in r.fields.iter().enumerate() {
				if i > 0 {
					out.push(',');
				}
				out.push_str("{\"name\":");
				write_escaped_str(out, &field.name);
				out.push_str(",\"type\":");
				write_node(out, nodes, field.type_, emitted);
				out.push('}');
			}
			out.push_str("]}");
		}
	}
}

fn write_escaped_str(out: &mut String, s: &str) {
	out.push('"');
	for c in s.chars() {
		match c {
			'"' => out.push_str("\\\""),
			'\\' => out.push_str("\\\\"),
			_ => out.push(c),
		}
	}
	out.push('"');
}

/// 64-bit Rabin fingerprint (the "Rabin-64-AVRO" polynomial used by the Avro
/// spec's single-object encoding), computed over the Parsing Canonical Form.
pub(crate) fn rabin_fingerprint(buf: &[u8]) -> [u8; 8] {
	const EMPTY: u64 = 0xc15d213aa4d7a795;
	let table = fingerprint_table();
	let mut fp = EMPTY;
	for &byte in buf {
		fp = (fp >> 8) ^ table[((fp ^ u64::from(byte)) & 0xff) as usize];
	}
	fp.to_le_bytes()
}

fn fingerprint_table() -> [u64; 256] {
	const EMPTY: u64 = 0xc15d213aa4d7a795;
	let mut table = [0u64; 256];
	for (i, slot) in table.iter_mut().enumerate() {
		let mut fp = i as u64;
		for _ in 0..8 {
			fp = (fp >> 1) ^ (EMPTY & (0u64.wrapping_sub(fp & 1)));
		}
		*slot = fp;
	}
	table
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pcf_of_primitive_string_form() {
		let schema: crate::Schema = "\"string\"".parse().unwrap();
		assert_eq!(schema.parsing_canonical_form(), "\"string\"");
	}

	#[test]
	fn fingerprint_is_stable_for_equal_pcf() {
		let a: crate::Schema = "\"long\"".parse().unwrap();
		let b: crate::Schema = "{\"type\":\"long\"}".parse().unwrap();
		assert_eq!(a.parsing_canonical_form(), b.parsing_canonical_form());
		assert_eq!(a.fingerprint(), b.fingerprint());
	}
}
