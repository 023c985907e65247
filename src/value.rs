//! The dynamic Avro value representation the binary codec is built around,
//! and the host-type binding traits that convert to/from it.

use indexmap::IndexMap;

/// A dynamic Avro value.
///
/// This is the intermediate representation the binary codec (`codec` module)
/// encodes/decodes directly against a [`crate::schema::SchemaNode`]; host
/// types convert to/from it via [`ToAvroValue`]/[`FromAvroValue`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Null,
	Boolean(bool),
	Int(i32),
	Long(i64),
	Float(f32),
	Double(f64),
	Bytes(Vec<u8>),
	String(String),
	Array(Vec<Value>),
	Map(IndexMap<String, Value>),
	/// Member index within the union's declared order, and the inner value.
	Union(usize, Box<Value>),
	/// Symbol index within the enum's declared order, and the symbol's name -
	/// carried alongside the index so the codec can still render the symbol
	/// under `EnumBehavior::Nominal` (a bare `string` schema node with no
	/// symbol table of its own to look the name up in).
	Enum(usize, String),
	Fixed(Vec<u8>),
	Decimal(rust_decimal::Decimal),
	Uuid(uuid::Uuid),
	Date(i32),
	TimeMillis(i32),
	TimeMicros(i64),
	TimestampMillis(i64),
	TimestampMicros(i64),
	Duration { months: u32, days: u32, millis: u32 },
	Record(Vec<(String, Value)>),
}

impl Value {
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}
}

/// Converts a host type into a [`Value`].
pub trait ToAvroValue {
	fn to_avro_value(&self) -> Value;

	/// Whether this type has some value standing in for "no value at all" -
	/// `Option<T>`'s `None`, or a type that also derives `Default`. Checked
	/// by [`crate::service::CodecService`] at codec-build time under
	/// `TombstoneBehavior::Strict`.
	fn represents_absence() -> bool
	where
		Self: Sized,
	{
		false
	}
}

/// Converts a [`Value`] back into a host type.
pub trait FromAvroValue: Sized {
	fn from_avro_value(value: Value) -> Result<Self, FromAvroValueError>;
}

#[derive(Debug, thiserror::Error)]
#[error("cannot convert avro value into the requested host type: {reason}")]
pub struct FromAvroValueError {
	pub reason: String,
}

impl FromAvroValueError {
	pub fn new(reason: impl Into<String>) -> Self {
		Self { reason: reason.into() }
	}
}

macro_rules! impl_primitive {
	($ty:ty, $variant:ident) => {
		impl ToAvroValue for $ty {
			fn to_avro_value(&self) -> Value {
				Value::$variant(self.clone())
			}
		}
		impl FromAvroValue for $ty {
			fn from_avro_value(value: Value) -> Result<Self, FromAvroValueError> {
				match value {
					Value::$variant(v) => Ok(v),
					other => Err(FromAvroValueError::new(format!(
						"expected {}, got {other:?}",
						stringify!($variant)
					))),
				}
			}
		}
	};
}
impl_primitive!(bool, Boolean);
impl_primitive!(i32, Int);
impl_primitive!(i64, Long);
impl_primitive!(f32, Float);
impl_primitive!(f64, Double);
impl_primitive!(String, String);
impl_primitive!(Vec<u8>, Bytes);

impl ToAvroValue for () {
	fn to_avro_value(&self) -> Value {
		Value::Null
	}
}
impl FromAvroValue for () {
	fn from_avro_value(value: Value) -> Result<Self, FromAvroValueError> {
		match value {
			Value::Null => Ok(()),
			other => Err(FromAvroValueError::new(format!("expected null, got {other:?}"))),
		}
	}
}

impl<T: ToAvroValue> ToAvroValue for Option<T> {
	fn to_avro_value(&self) -> Value {
		match self {
			None => Value::Union(0, Box::new(Value::Null)),
			Some(v) => Value::Union(1, Box::new(v.to_avro_value())),
		}
	}

	fn represents_absence() -> bool {
		true
	}
}
impl<T: FromAvroValue> FromAvroValue for Option<T> {
	fn from_avro_value(value: Value) -> Result<Self, FromAvroValueError> {
		match value {
			Value::Union(_, inner) if inner.is_null() => Ok(None),
			Value::Union(_, inner) => Ok(Some(T::from_avro_value(*inner)?)),
			Value::Null => Ok(None),
			other => T::from_avro_value(other).map(Some),
		}
	}
}

impl<T: ToAvroValue> ToAvroValue for Vec<T> {
	fn to_avro_value(&self) -> Value {
		Value::Array(self.iter().map(ToAvroValue::to_avro_value).collect())
	}
}
impl<T: FromAvroValue> FromAvroValue for Vec<T> {
	fn from_avro_value(value: Value) -> Result<Self, FromAvroValueError> {
		match value {
			Value::Array(items) => items.into_iter().map(T::from_avro_value).collect(),
			other => Err(FromAvroValueError::new(format!("expected array, got {other:?}"))),
		}
	}
}

impl<V: ToAvroValue> ToAvroValue for std::collections::HashMap<String, V> {
	fn to_avro_value(&self) -> Value {
		Value::Map(self.iter().map(|(k, v)| (k.clone(), v.to_avro_value())).collect())
	}
}
impl<V: FromAvroValue> FromAvroValue for std::collections::HashMap<String, V> {
	fn from_avro_value(value: Value) -> Result<Self, FromAvroValueError> {
		match value {
			Value::Map(m) => m
				.into_iter()
				.map(|(k, v)| Ok((k, V::from_avro_value(v)?)))
				.collect(),
			other => Err(FromAvroValueError::new(format!("expected map, got {other:?}"))),
		}
	}
}

impl ToAvroValue for uuid::Uuid {
	fn to_avro_value(&self) -> Value {
		Value::Uuid(*self)
	}
}
impl FromAvroValue for uuid::Uuid {
	fn from_avro_value(value: Value) -> Result<Self, FromAvroValueError> {
		match value {
			Value::Uuid(u) => Ok(u),
			Value::String(s) => s.parse().map_err(|e| FromAvroValueError::new(format!("{e}"))),
			other => Err(FromAvroValueError::new(format!("expected uuid, got {other:?}"))),
		}
	}
}

fn unix_epoch_naive_date() -> chrono::NaiveDate {
	chrono::NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid calendar date")
}

impl ToAvroValue for chrono::NaiveDate {
	fn to_avro_value(&self) -> Value {
		Value::Date((*self - unix_epoch_naive_date()).num_days() as i32)
	}
}
impl FromAvroValue for chrono::NaiveDate {
	fn from_avro_value(value: Value) -> Result<Self, FromAvroValueError> {
		match value {
			Value::Date(days) => Ok(unix_epoch_naive_date() + chrono::Duration::days(days as i64)),
			Value::String(s) => s
				.parse()
				.map_err(|e| FromAvroValueError::new(format!("invalid ISO-8601 date: {e}"))),
			other => Err(FromAvroValueError::new(format!("expected date, got {other:?}"))),
		}
	}
}

impl ToAvroValue for chrono::NaiveTime {
	fn to_avro_value(&self) -> Value {
		use chrono::Timelike;
		let millis = self.num_seconds_from_midnight() as i64 * 1000 + self.nanosecond() as i64 / 1_000_000;
		Value::TimeMillis(millis as i32)
	}
}
impl FromAvroValue for chrono::NaiveTime {
	fn from_avro_value(value: Value) -> Result<Self, FromAvroValueError> {
		match value {
			Value::TimeMillis(millis) => chrono::NaiveTime::from_num_seconds_from_midnight_opt(
				(millis / 1000) as u32,
				(millis % 1000) as u32 * 1_000_000,
			)
			.ok_or_else(|| FromAvroValueError::new("time-millis out of range")),
			Value::TimeMicros(micros) => chrono::NaiveTime::from_num_seconds_from_midnight_opt(
				(micros / 1_000_000) as u32,
				(micros % 1_000_000) as u32 * 1_000,
			)
			.ok_or_else(|| FromAvroValueError::new("time-micros out of range")),
			Value::String(s) => s
				.parse()
				.map_err(|e| FromAvroValueError::new(format!("invalid ISO-8601 time: {e}"))),
			other => Err(FromAvroValueError::new(format!("expected time, got {other:?}"))),
		}
	}
}

impl ToAvroValue for chrono::DateTime<chrono::Utc> {
	fn to_avro_value(&self) -> Value {
		Value::TimestampMillis(self.timestamp_millis())
	}
}
impl FromAvroValue for chrono::DateTime<chrono::Utc> {
	fn from_avro_value(value: Value) -> Result<Self, FromAvroValueError> {
		use chrono::TimeZone;
		match value {
			Value::TimestampMillis(millis) => chrono::Utc
				.timestamp_millis_opt(millis)
				.single()
				.ok_or_else(|| FromAvroValueError::new("timestamp-millis out of range")),
			Value::TimestampMicros(micros) => chrono::Utc
				.timestamp_opt(micros.div_euclid(1_000_000), (micros.rem_euclid(1_000_000) * 1000) as u32)
				.single()
				.ok_or_else(|| FromAvroValueError::new("timestamp-micros out of range")),
			Value::String(s) => chrono::DateTime::parse_from_rfc3339(&s)
				.map(|dt| dt.with_timezone(&chrono::Utc))
				.map_err(|e| FromAvroValueError::new(format!("invalid ISO-8601 timestamp: {e}"))),
			other => Err(FromAvroValueError::new(format!("expected timestamp, got {other:?}"))),
		}
	}
}

impl ToAvroValue for chrono::Duration {
	fn to_avro_value(&self) -> Value {
		let days = self.num_days();
		let millis = (*self - chrono::Duration::days(days)).num_milliseconds();
		Value::Duration {
			months: 0,
			days: days.unsigned_abs() as u32,
			millis: millis.unsigned_abs() as u32,
		}
	}
}
impl FromAvroValue for chrono::Duration {
	fn from_avro_value(value: Value) -> Result<Self, FromAvroValueError> {
		match value {
			Value::Duration { months, days, millis } => Ok(chrono::Duration::days(months as i64 * 30 + days as i64)
				+ chrono::Duration::milliseconds(millis as i64)),
			other => Err(FromAvroValueError::new(format!("expected duration, got {other:?}"))),
		}
	}
}

impl ToAvroValue for rust_decimal::Decimal {
	fn to_avro_value(&self) -> Value {
		Value::Decimal(*self)
	}
}
impl FromAvroValue for rust_decimal::Decimal {
	fn from_avro_value(value: Value) -> Result<Self, FromAvroValueError> {
		match value {
			Value::Decimal(d) => Ok(d),
			other => Err(FromAvroValueError::new(format!("expected decimal, got {other:?}"))),
		}
	}
}
