//! Named-type (`record`/`enum`/`fixed`) name handling.

use super::SchemaError;

fn is_name_start(c: char) -> bool {
	c.is_ascii_alphabetic() || c == '_'
}

fn is_name_cont(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}

fn validate_name_component(s: &str) -> Result<(), SchemaError> {
	let mut chars = s.chars();
	match chars.next() {
		Some(c) if is_name_start(c) => {}
		_ => return Err(SchemaError::invalid_name(s)),
	}
	if !chars.all(is_name_cont) {
		return Err(SchemaError::invalid_name(s));
	}
	Ok(())
}

/// Used outside this module to validate a non-namespaced identifier (enum
/// symbol, record field name) against the same grammar as a name component.
pub(crate) fn is_valid_name_component(s: &str) -> bool {
	validate_name_component(s).is_ok()
}

fn validate_namespace(s: &str) -> Result<(), SchemaError> {
	if s.is_empty() {
		// an explicit empty namespace means "no namespace"
		return Ok(());
	}
	for component in s.split('.') {
		validate_name_component(component)?;
	}
	Ok(())
}

/// A validated, possibly-namespaced Avro name (for `record`, `enum` and
/// `fixed` schemas).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Name {
	fully_qualified_name: String,
	namespace_delimiter_idx: Option<usize>,
}

impl std::fmt::Debug for Name {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Debug::fmt(&self.fully_qualified_name, f)
	}
}

impl std::fmt::Display for Name {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.fully_qualified_name)
	}
}

impl Name {
	/// Builds a [`Name`] from a `name` attribute and an optional `namespace`
	/// attribute, following the Avro resolution rule: if `name` itself
	/// contains a `.`, it is already a full name and `namespace` is ignored;
	/// otherwise, if `namespace` is absent, `enclosing_namespace` applies.
	pub fn new(
		name: &str,
		namespace: Option<&str>,
		enclosing_namespace: Option<&str>,
	) -> Result<Self, SchemaError> {
		if name.is_empty() {
			return Err(SchemaError::invalid_name(name));
		}
		if let Some(idx) = name.rfind('.') {
			validate_namespace(&name[..idx])?;
			validate_name_component(&name[idx + 1..])?;
			return Ok(Self {
				fully_qualified_name: name.to_owned(),
				namespace_delimiter_idx: Some(idx),
			});
		}
		validate_name_component(name)?;
		let namespace = namespace.or(enclosing_namespace).unwrap_or("");
		if namespace.is_empty() {
			return Ok(Self {
				fully_qualified_name: name.to_owned(),
				namespace_delimiter_idx: None,
			});
		}
		validate_namespace(namespace)?;
		Ok(Self {
			fully_qualified_name: format!("{namespace}.{name}"),
			namespace_delimiter_idx: Some(namespace.len()),
		})
	}

	/// Builds a [`Name`] from an already fully-qualified string (e.g. a JSON
	/// schema reference to a previously-defined name), with no further
	/// namespace resolution.
	pub fn from_fully_qualified(name: &str) -> Result<Self, SchemaError> {
		Self::new(name, None, None)
	}

	pub fn name(&self) -> &str {
		match self.namespace_delimiter_idx {
			None => &self.fully_qualified_name,
			Some(delimiter_idx) => &self.fully_qualified_name[delimiter_idx + 1..],
		}
	}

	pub fn namespace(&self) -> Option<&str> {
		self.namespace_delimiter_idx
			.map(|idx| &self.fully_qualified_name[..idx])
	}

	pub fn fully_qualified_name(&self) -> &str {
		&self.fully_qualified_name
	}
}

#[cfg(test)]
mod tests {
	use super::Name;

	#[test]
	fn rejects_leading_digit() {
		assert!(Name::new("2Org", None, None).is_err());
	}

	#[test]
	fn rejects_empty() {
		assert!(Name::new("", None, None).is_err());
	}

	#[test]
	fn namespace_from_enclosing() {
		let name = Name::new("Foo", None, Some("com.example")).unwrap();
		assert_eq!(name.fully_qualified_name(), "com.example.Foo");
		assert_eq!(name.name(), "Foo");
		assert_eq!(name.namespace(), Some("com.example"));
	}

	#[test]
	fn dotted_name_ignores_namespace_attribute() {
		let name = Name::new("com.example.Foo", Some("ignored"), None).unwrap();
		assert_eq!(name.fully_qualified_name(), "com.example.Foo");
		assert_eq!(name.namespace(), Some("com.example"));
	}

	#[test]
	fn empty_namespace_means_no_namespace() {
		let name = Name::new("Foo", Some(""), Some("com.example")).unwrap();
		assert_eq!(name.fully_qualified_name(), "Foo");
		assert_eq!(name.namespace(), None);
	}
}
