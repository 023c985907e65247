//! The JSON schema reader (C2).
//!
//! Forward references are rejected: a bare string referring to a name that
//! hasn't been registered yet fails with [`SchemaError::unknown_name`]. This
//! is a deliberate choice, not an oversight (see `DESIGN.md`) - the upstream
//! parser this was modeled after resolves late references via a remap pass,
//! which this implementation does not reproduce.

use std::collections::HashMap;

use serde_json::Value as Json;

use super::{
	canonical_form,
	name::is_valid_name_component,
	node::*,
	Name, Schema, SchemaError, SchemaKey,
};

#[derive(Default)]
struct ParseState {
	nodes: Vec<SchemaNode>,
	names: HashMap<String, SchemaKey>,
}

pub(crate) fn parse(json: &str) -> Result<Schema, SchemaError> {
	let value: Json = serde_json::from_str(json).map_err(SchemaError::serde_json)?;
	let mut state = ParseState::default();
	let root = register_node(&value, None, &mut state)?;
	// The arena is addressed from its root; rotate so the root always sits
	// at index 0, matching `SchemaKey::root()`.
	let nodes = rebase_to_root(state.nodes, root);
	check_for_unconditional_cycles(&nodes)?;
	let parsing_canonical_form = canonical_form::compute(&nodes, SchemaKey::root());
	let fingerprint = canonical_form::rabin_fingerprint(parsing_canonical_form.as_bytes());
	Ok(Schema {
		nodes,
		json: json.to_owned(),
		parsing_canonical_form,
		fingerprint,
	})
}

/// Node indices are assigned in parse order, so the root (the first call
/// into [`register_node`]) already ends up last in a naive append-only
/// arena only if it recurses into children first. Named types place a
/// placeholder at their own index *before* recursing into children (so
/// self-references resolve), so in practice the root key is always `0`; this
/// is a defensive no-op swap kept in case a future case (e.g. a bare union at
/// the top level) breaks that invariant.
fn rebase_to_root(nodes: Vec<SchemaNode>, root: SchemaKey) -> Vec<SchemaNode> {
	if root.idx() == 0 {
		return nodes;
	}
	let mut nodes = nodes;
	nodes.swap(0, root.idx());
	remap_keys(&mut nodes, root.idx(), 0);
	nodes
}

fn remap_keys(nodes: &mut [SchemaNode], from: usize, to: usize) {
	fn remap(key: &mut SchemaKey, from: usize, to: usize) {
		let idx = key.idx();
		if idx == from {
			*key = SchemaKey::from_idx(to);
		} else if idx == to {
			*key = SchemaKey::from_idx(from);
		}
	}
	for node in nodes.iter_mut() {
		match &mut node.type_ {
			RegularType::Array(a) => remap(&mut a.items, from, to),
			RegularType::Map(m) => remap(&mut m.values, from, to),
			RegularType::Union(u) => {
				for v in u.variants_mut() {
					remap(v, from, to);
				}
			}
			RegularType::Record(r) => {
				for f in &mut r.fields {
					remap(&mut f.type_, from, to);
				}
			}
			_ => {}
		}
	}
}

fn register_node(
	value: &Json,
	enclosing_namespace: Option<&str>,
	state: &mut ParseState,
) -> Result<SchemaKey, SchemaError> {
	match value {
		Json::String(s) => register_named_reference(s, state),
		Json::Array(variants) => register_union(variants, enclosing_namespace, state),
		Json::Object(obj) => register_object(obj, enclosing_namespace, state),
		_ => Err(SchemaError::invalid_schema(
			"schema node must be a string, an array or an object",
		)),
	}
}

fn register_named_reference(s: &str, state: &mut ParseState) -> Result<SchemaKey, SchemaError> {
	if let Some(primitive) = primitive_from_str(s) {
		return Ok(push(state, SchemaNode::new(primitive)));
	}
	state
		.names
		.get(s)
		.copied()
		.ok_or_else(|| SchemaError::unknown_name(s))
}

fn primitive_from_str(s: &str) -> Option<RegularType> {
	Some(match s {
		"null" => RegularType::Null,
		"boolean" => RegularType::Boolean,
		"int" => RegularType::Int,
		"long" => RegularType::Long,
		"float" => RegularType::Float,
		"double" => RegularType::Double,
		"bytes" => RegularType::Bytes,
		"string" => RegularType::String,
		_ => return None,
	})
}

fn push(state: &mut ParseState, node: SchemaNode) -> SchemaKey {
	let key = SchemaKey::from_idx(state.nodes.len());
	state.nodes.push(node);
	key
}

fn register_union(
	variants: &[Json],
	enclosing_namespace: Option<&str>,
	state: &mut ParseState,
) -> Result<SchemaKey, SchemaError> {
	let keys = variants
		.iter()
		.map(|v| register_node(v, enclosing_namespace, state))
		.collect::<Result<Vec<_>, _>>()?;
	let union = Union::new(keys, &state.nodes)?;
	Ok(push(state, SchemaNode::new(union)))
}

fn register_object(
	obj: &serde_json::Map<String, Json>,
	enclosing_namespace: Option<&str>,
	state: &mut ParseState,
) -> Result<SchemaKey, SchemaError> {
	let type_str = obj
		.get("type")
		.and_then(Json::as_str)
		.ok_or_else(|| SchemaError::invalid_schema("object schema is missing a \"type\" string"))?;

	let key = match type_str {
		"array" => {
			let items_json = obj
				.get("items")
				.ok_or_else(|| SchemaError::invalid_schema("array schema is missing \"items\""))?;
			let items = register_node(items_json, enclosing_namespace, state)?;
			push(state, SchemaNode::new(Array { items }))
		}
		"map" => {
			let values_json = obj
				.get("values")
				.ok_or_else(|| SchemaError::invalid_schema("map schema is missing \"values\""))?;
			let values = register_node(values_json, enclosing_namespace, state)?;
			push(state, SchemaNode::new(Map { values }))
		}
		"fixed" => {
			let (name, _) = read_name_fields(obj, enclosing_namespace)?;
			let size = obj
				.get("size")
				.and_then(Json::as_u64)
				.ok_or_else(|| SchemaError::invalid_schema("fixed schema is missing \"size\""))?;
			let aliases = read_aliases(obj)?;
			let full_name = name.fully_qualified_name().to_owned();
			state_register_named(
				state,
				full_name,
				SchemaNode::new(Fixed {
					name,
					size: size as usize,
					aliases,
				}),
			)
		}
		"enum" => {
			let (name, _) = read_name_fields(obj, enclosing_namespace)?;
			let symbols_json = obj
				.get("symbols")
				.and_then(Json::as_array)
				.ok_or_else(|| SchemaError::invalid_schema("enum schema is missing \"symbols\""))?;
			let mut symbols = NameSet::new();
			for s in symbols_json {
				let s = s
					.as_str()
					.ok_or_else(|| SchemaError::invalid_schema("enum symbol must be a string"))?;
				if !is_valid_name_component(s) {
					return Err(SchemaError::invalid_symbol(s));
				}
				symbols.insert(s.to_owned())?;
			}
			let default = obj
				.get("default")
				.and_then(Json::as_str)
				.map(|d| {
					symbols
						.position(d)
						.ok_or_else(|| SchemaError::invalid_schema("enum default is not a declared symbol"))
				})
				.transpose()?;
			let documentation = obj.get("doc").and_then(Json::as_str).map(str::to_owned);
			let aliases = read_aliases(obj)?;
			let full_name = name.fully_qualified_name().to_owned();
			state_register_named(
				state,
				full_name,
				SchemaNode::new(Enum {
					name,
					symbols,
					default,
					documentation,
					aliases,
				}),
			)
		}
		"record" | "error" => {
			let (name, namespace) = read_name_fields(obj, enclosing_namespace)?;
			let full_name = name.fully_qualified_name().to_owned();
			// Reserve our own slot and register the name *before* parsing
			// fields, so that a field referencing this record by name (the
			// canonical self-referential-record case) resolves correctly.
			let reserved = push(state, SchemaNode::new(RegularType::Null));
			state.names.insert(full_name, reserved);

			let fields_json = obj
				.get("fields")
				.and_then(Json::as_array)
				.ok_or_else(|| SchemaError::invalid_schema("record schema is missing \"fields\""))?;
			let mut fields = Vec::with_capacity(fields_json.len());
			let mut seen = std::collections::HashSet::new();
			for field_json in fields_json {
				let field_obj = field_json
					.as_object()
					.ok_or_else(|| SchemaError::invalid_schema("record field must be an object"))?;
				let field_name = field_obj
					.get("name")
					.and_then(Json::as_str)
					.ok_or_else(|| SchemaError::invalid_schema("record field is missing \"name\""))?;
				if !is_valid_name_component(field_name) {
					return Err(SchemaError::invalid_name(field_name));
				}
				if !seen.insert(field_name.to_owned()) {
					return Err(SchemaError::invalid_schema(format!(
						"duplicate field name: `{field_name}`"
					)));
				}
				let type_json = field_obj.get("type").ok_or_else(|| {
					SchemaError::invalid_schema("record field is missing \"type\"")
				})?;
				let type_ = register_node(type_json, Some(namespace.as_deref().unwrap_or("")), state)?;
				fields.push(RecordField {
					name: field_name.to_owned(),
					type_,
					default: field_obj.get("default").cloned(),
					documentation: field_obj.get("doc").and_then(Json::as_str).map(str::to_owned),
					aliases: read_aliases(field_obj)?,
				});
			}
			let documentation = obj.get("doc").and_then(Json::as_str).map(str::to_owned);
			let aliases = read_aliases(obj)?;
			state.nodes[reserved.idx()] = SchemaNode::new(Record {
				name,
				fields,
				documentation,
				aliases,
			});
			reserved
		}
		other => {
			let primitive = primitive_from_str(other)
				.ok_or_else(|| SchemaError::invalid_schema(format!("unknown schema type: `{other}`")))?;
			push(state, SchemaNode::new(primitive))
		}
	};

	apply_logical_type(key, obj, state)?;
	Ok(key)
}

fn read_name_fields(
	obj: &serde_json::Map<String, Json>,
	enclosing_namespace: Option<&str>,
) -> Result<(Name, Option<String>), SchemaError> {
	let raw_name = obj
		.get("name")
		.and_then(Json::as_str)
		.ok_or_else(|| SchemaError::invalid_schema("named schema is missing \"name\""))?;
	let namespace = obj.get("namespace").and_then(Json::as_str);
	let name = Name::new(raw_name, namespace, enclosing_namespace)?;
	let resolved_namespace = name.namespace().map(str::to_owned);
	Ok((name, resolved_namespace))
}

fn read_aliases(obj: &serde_json::Map<String, Json>) -> Result<Vec<String>, SchemaError> {
	match obj.get("aliases") {
		None => Ok(Vec::new()),
		Some(Json::Array(arr)) => arr
			.iter()
			.map(|v| {
				v.as_str()
					.map(str::to_owned)
					.ok_or_else(|| SchemaError::invalid_schema("alias must be a string"))
			})
			.collect(),
		Some(_) => Err(SchemaError::invalid_schema("\"aliases\" must be an array")),
	}
}

fn state_register_named(state: &mut ParseState, full_name: String, node: SchemaNode) -> SchemaKey {
	let key = push(state, node);
	state.names.insert(full_name, key);
	key
}

fn apply_logical_type(
	key: SchemaKey,
	obj: &serde_json::Map<String, Json>,
	state: &mut ParseState,
) -> Result<(), SchemaError> {
	let Some(logical_type_name) = obj.get("logicalType").and_then(Json::as_str) else {
		return Ok(());
	};
	let node = &mut state.nodes[key.idx()];
	let logical_type = match (logical_type_name, &node.type_) {
		("decimal", RegularType::Bytes | RegularType::Fixed(_)) => {
			let precision = obj.get("precision").and_then(Json::as_u64);
			let scale = obj.get("scale").and_then(Json::as_u64).unwrap_or(0);
			match precision {
				// missing precision has no sensible fallback: hard error
				None => {
					return Err(SchemaError::invalid_schema(
						"decimal logical type requires \"precision\"",
					))
				}
				Some(precision) => match Decimal::new(precision as usize, scale as usize) {
					Ok(d) => LogicalType::Decimal(d),
					// reader resilience: an out-of-range scale/precision
					// pair doesn't invalidate the underlying schema, it
					// just means we don't attach the decorator.
					Err(_) => return Ok(()),
				},
			}
		}
		("uuid", RegularType::String) => LogicalType::Uuid,
		("date", RegularType::Int) => LogicalType::Date,
		("time-millis", RegularType::Int) => LogicalType::TimeMillis,
		("time-micros", RegularType::Long) => LogicalType::TimeMicros,
		("timestamp-millis", RegularType::Long) => LogicalType::TimestampMillis,
		("timestamp-micros", RegularType::Long) => LogicalType::TimestampMicros,
		("duration", RegularType::Fixed(f)) if f.size == 12 => LogicalType::Duration,
		// structurally mismatched decorator (e.g. `uuid` on an `int`): keep
		// the underlying schema, drop the decorator.
		(_, _) => LogicalType::Unknown(UnknownLogicalType {
			logical_type_name: logical_type_name.to_owned(),
		}),
	};
	node.logical_type = Some(logical_type);
	Ok(())
}

/// Rejects records that unconditionally contain themselves (record A has a
/// field of type A, or a field of type B which has a field of type A, with no
/// array/map/union along the path): such a record can never be fully
/// constructed, and schema-driven encode/decode would recurse on it forever
/// without consuming any input. A record field reached through a union can
/// always terminate by picking a different branch, so only all-record paths
/// are dangerous.
fn check_for_unconditional_cycles(nodes: &[SchemaNode]) -> Result<(), SchemaError> {
	let mut on_stack = vec![false; nodes.len()];
	let mut checked = vec![false; nodes.len()];
	for (idx, node) in nodes.iter().enumerate() {
		if matches!(node.type_, RegularType::Record(_)) && !checked[idx] {
			visit(nodes, idx, &mut on_stack, &mut checked)?;
		}
	}
	return Ok(());

	fn visit(
		nodes: &[SchemaNode],
		idx: usize,
		on_stack: &mut [bool],
		checked: &mut [bool],
	) -> Result<(), SchemaError> {
		on_stack[idx] = true;
		let RegularType::Record(record) = &nodes[idx].type_ else {
			unreachable!("only called on record nodes")
		};
		for field in &record.fields {
			let field_idx = field.type_.idx();
			if matches!(nodes[field_idx].type_, RegularType::Record(_)) {
				if on_stack[field_idx] {
					return Err(SchemaError::unconditional_cycle());
				}
				visit(nodes, field_idx, on_stack, checked)?;
			}
		}
		on_stack[idx] = false;
		checked[idx] = true;
		Ok(())
	}
}
