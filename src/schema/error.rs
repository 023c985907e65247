use std::borrow::Cow;

/// Any error that may happen while constructing, parsing or serializing a
/// [`Schema`](super::Schema).
#[derive(thiserror::Error)]
pub struct SchemaError {
	inner: Box<ErrorInner>,
}

#[derive(Debug)]
enum ErrorInner {
	InvalidName(String),
	InvalidSymbol(String),
	InvalidSchema(Cow<'static, str>),
	InvalidDecimal { precision: usize, scale: usize },
	UnknownName(String),
	UnconditionalCycle,
	SerdeJson(serde_json::Error),
	Other(Cow<'static, str>),
}

impl SchemaError {
	pub(crate) fn invalid_name(name: &str) -> Self {
		Self {
			inner: Box::new(ErrorInner::InvalidName(name.to_owned())),
		}
	}

	pub(crate) fn invalid_symbol(symbol: &str) -> Self {
		Self {
			inner: Box::new(ErrorInner::InvalidSymbol(symbol.to_owned())),
		}
	}

	pub(crate) fn invalid_schema(reason: impl Into<Cow<'static, str>>) -> Self {
		Self {
			inner: Box::new(ErrorInner::InvalidSchema(reason.into())),
		}
	}

	pub(crate) fn invalid_decimal(precision: usize, scale: usize) -> Self {
		Self {
			inner: Box::new(ErrorInner::InvalidDecimal { precision, scale }),
		}
	}

	pub(crate) fn unknown_name(name: &str) -> Self {
		Self {
			inner: Box::new(ErrorInner::UnknownName(name.to_owned())),
		}
	}

	pub(crate) fn unconditional_cycle() -> Self {
		Self {
			inner: Box::new(ErrorInner::UnconditionalCycle),
		}
	}

	pub(crate) fn serde_json(e: serde_json::Error) -> Self {
		Self {
			inner: Box::new(ErrorInner::SerdeJson(e)),
		}
	}

	pub(crate) fn msg(s: impl std::fmt::Display) -> Self {
		Self {
			inner: Box::new(ErrorInner::Other(Cow::Owned(s.to_string()))),
		}
	}
}

impl std::fmt::Display for ErrorInner {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ErrorInner::InvalidName(n) => write!(f, "invalid name: `{n}`"),
			ErrorInner::InvalidSymbol(s) => write!(f, "invalid enum symbol: `{s}`"),
			ErrorInner::InvalidSchema(reason) => write!(f, "invalid schema: {reason}"),
			ErrorInner::InvalidDecimal { precision, scale } => write!(
				f,
				"invalid decimal logical type: scale ({scale}) must not exceed precision ({precision})"
			),
			ErrorInner::UnknownName(n) => write!(f, "unknown name reference: `{n}`"),
			ErrorInner::UnconditionalCycle => {
				f.write_str("the schema contains a record that ends up always containing itself")
			}
			ErrorInner::SerdeJson(e) => write!(f, "{e}"),
			ErrorInner::Other(s) => f.write_str(s),
		}
	}
}

impl std::fmt::Debug for SchemaError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Debug::fmt(&self.inner, f)
	}
}

impl std::fmt::Display for SchemaError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Display::fmt(&self.inner, f)
	}
}
