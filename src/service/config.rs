use crate::schema::{EnumBehavior, MemberVisibility, NullableReferenceTypeBehavior, SchemaBuilderConfig, TemporalBehavior};

/// Whether a serialiser may mint and register a new schema version when the
/// subject is absent or its latest version can't represent the host type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegisterAutomatically {
	#[default]
	Never,
	Always,
}

/// How `null`-shaped values at the key or value position of a message are
/// treated; see the module documentation for the precise per-mode wire
/// behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TombstoneBehavior {
	#[default]
	None,
	Strict,
}

/// Which positional component of a message a codec is being built for; only
/// meaningful to [`TombstoneBehavior::Strict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
	Key,
	Value,
}

pub struct SubjectNameContext<'a> {
	pub topic: &'a str,
	pub component: Component,
}

pub type SubjectNameBuilder = fn(&SubjectNameContext<'_>) -> String;

fn default_subject_name_builder(ctx: &SubjectNameContext<'_>) -> String {
	match ctx.component {
		Component::Key => format!("{}-key", ctx.topic),
		Component::Value => format!("{}-value", ctx.topic),
	}
}

pub struct CodecServiceConfig {
	pub register_automatically: RegisterAutomatically,
	pub tombstone_behavior: TombstoneBehavior,
	pub subject_name_builder: SubjectNameBuilder,
	pub schema_builder_config: SchemaBuilderConfig,
}

impl Default for CodecServiceConfig {
	fn default() -> Self {
		Self {
			register_automatically: RegisterAutomatically::default(),
			tombstone_behavior: TombstoneBehavior::default(),
			subject_name_builder: default_subject_name_builder,
			schema_builder_config: SchemaBuilderConfig::default(),
		}
	}
}

impl CodecServiceConfig {
	pub fn with_enum_behavior(mut self, v: EnumBehavior) -> Self {
		self.schema_builder_config.enum_behavior = v;
		self
	}

	pub fn with_temporal_behavior(mut self, v: TemporalBehavior) -> Self {
		self.schema_builder_config.temporal_behavior = v;
		self
	}

	pub fn with_nullable_behavior(mut self, v: NullableReferenceTypeBehavior) -> Self {
		self.schema_builder_config.nullable_behavior = v;
		self
	}

	pub fn with_member_visibility(mut self, v: MemberVisibility) -> Self {
		self.schema_builder_config.member_visibility = v;
		self
	}
}
