//! The JSON schema writer: emits the canonical, shortest-legal JSON form.

use std::collections::HashSet;

use serde_json::{Map, Value as Json};

use super::{node::*, Schema, SchemaKey};

impl Schema {
	/// Emits this schema as canonical JSON (shortest legal form: a
	/// previously-emitted named type is referenced by its bare name).
	pub fn to_json(&self) -> String {
		let mut emitted = HashSet::new();
		let value = emit(&self.nodes, SchemaKey::root(), &mut emitted);
		serde_json::to_string_pretty(&value).expect("schema json is always serializable")
	}
}

fn emit(nodes: &[SchemaNode], key: SchemaKey, emitted: &mut HashSet<String>) -> Json {
	let node = &nodes[key.idx()];
	let mut value = match &node.type_ {
		RegularType::Null => return Json::String("null".into()),
		RegularType::Boolean => return Json::String("boolean".into()),
		RegularType::Int => return Json::String("int".into()),
		RegularType::Long => return Json::String("long".into()),
		RegularType::Float => return Json::String("float".into()),
		RegularType::Double => return Json::String("double".into()),
		RegularType::Bytes => return Json::String("bytes".into()),
		RegularType::String => return Json::String("string".into()),
		RegularType::Array(a) => {
			let mut m = Map::new();
			m.insert("type".into(), Json::String("array".into()));
			m.insert("items".into(), emit(nodes, a.items, emitted));
			m
		}
		RegularType::Map(map) => {
			let mut m = Map::new();
			m.insert("type".into(), Json::String("map".into()));
			m.insert("values".into(), emit(nodes, map.values, emitted));
			m
		}
		RegularType::Union(u) => {
			return Json::Array(
				u.variants()
					.iter()
					.map(|&v| emit(nodes, v, emitted))
					.collect(),
			)
		}
		RegularType::Fixed(f) => {
			let full_name = f.name.fully_qualified_name().to_owned();
			if !emitted.insert(full_name.clone()) {
				return Json::String(full_name);
			}
			let mut m = Map::new();
			m.insert("type".into(), Json::String("fixed".into()));
			insert_name(&mut m, &f.name);
			m.insert("size".into(), Json::from(f.size));
			insert_aliases(&mut m, &f.aliases);
			m
		}
		RegularType::Enum(e) => {
			let full_name = e.name.fully_qualified_name().to_owned();
			if !emitted.insert(full_name.clone()) {
				return Json::String(full_name);
			}
			let mut m = Map::new();
			m.insert("type".into(), Json::String("enum".into()));
			insert_name(&mut m, &e.name);
			if let Some(doc) = &e.documentation {
				m.insert("doc".into(), Json::String(doc.clone()));
			}
			m.insert(
				"symbols".into(),
				Json::Array(e.symbols.iter().map(|s| Json::String(s.to_owned())).collect()),
			);
			insert_aliases(&mut m, &e.aliases);
			if let Some(default_idx) = e.default {
				if let Some(default) = e.symbols.iter().nth(default_idx) {
					m.insert("default".into(), Json::String(default.to_owned()));
				}
			}
			m
		}
		RegularType::Record(r) => {
			let full_name = r.name.fully_qualified_name().to_owned();
			if !emitted.insert(full_name.clone()) {
				return Json::String(full_name);
			}
			let mut m = Map::new();
			m.insert("type".into(), Json::String("record".into()));
			insert_name(&mut m, &r.name);
			if let Some(doc) = &r.documentation {
				m.insert("doc".into(), Json::String(doc.clone()));
			}
			let fields = r
				.fields
				.iter()
				.map(|field| {
					let mut fm = Map::new();
					fm.insert("name".into(), Json::String(field.name.clone()));
					fm.insert("type".into(), emit(nodes, field.type_, emitted));
					if let Some(doc) = &field.documentation {
						fm.insert("doc".into(), Json::String(doc.clone()));
					}
					if let Some(default) = &field.default {
						fm.insert("default".into(), default.clone());
					}
					insert_aliases(&mut fm, &field.aliases);
					Json::Object(fm)
				})
				.collect();
			m.insert("fields".into(), Json::Array(fields));
			insert_aliases(&mut m, &r.aliases);
			m
		}
	};
	if let Some(logical_type) = &node.logical_type {
		insert_logical_type(&mut value, logical_type);
	}
	Json::Object(value)
}

fn insert_name(m: &mut Map<String, Json>, name: &super::Name) {
	m.insert("name".into(), Json::String(name.name().to_owned()));
	if let Some(namespace) = name.namespace() {
		m.insert("namespace".into(), Json::String(namespace.to_owned()));
	}
}

fn insert_aliases(m: &mut Map<String, Json>, aliases: &[String]) {
	if !aliases.is_empty() {
		m.insert(
			"aliases".into(),
			Json::Array(aliases.iter().map(|a| Json::String(a.clone())).collect()),
		);
	}
}

fn insert_logical_type(m: &mut Map<String, Json>, logical_type: &LogicalType) {
	m.insert(
		"logicalType".into(),
		Json::String(logical_type.as_str().to_owned()),
	);
	if let LogicalType::Decimal(d) = logical_type {
		m.insert("precision".into(), Json::from(d.precision));
		m.insert("scale".into(), Json::from(d.scale));
	}
}
