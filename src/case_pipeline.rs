//! A small, Avro-agnostic ordered-cases dispatcher.
//!
//! A [`CasePipeline`] holds an ordered list of [`Case`]s. Given an input, it
//! tries each case in turn and returns the first [`CaseOutcome::Applied`]
//! result; if every case answers [`CaseOutcome::NotApplicable`], all of
//! their reasons are collected into a single "unsupported input" error.
//!
//! This is used concretely by the schema builder ([`crate::schema::builder`])
//! to drive reflection over an open-ended host-type space. The binary codec
//! dispatches over the closed `SchemaNode` enum instead, where an exhaustive
//! `match` already is the zero-cost equivalent of a case pipeline over a
//! fixed, finite case set.

/// The result of trying one [`Case`] against an input.
pub enum CaseOutcome<Out> {
	Applied(Out),
	NotApplicable(String),
}

/// One rule in a [`CasePipeline`].
///
/// `Ctx` carries both the per-build memoization map (identity -> result) and
/// any configuration the case needs; it is entirely up to the caller what
/// `Ctx` looks like.
pub trait Case<In: ?Sized, Ctx, Out> {
	fn try_apply(&self, input: &In, ctx: &mut Ctx) -> Result<CaseOutcome<Out>, UnsupportedInput>;
}

impl<In: ?Sized, Ctx, Out, F> Case<In, Ctx, Out> for F
where
	F: Fn(&In, &mut Ctx) -> Result<CaseOutcome<Out>, UnsupportedInput>,
{
	fn try_apply(&self, input: &In, ctx: &mut Ctx) -> Result<CaseOutcome<Out>, UnsupportedInput> {
		self(input, ctx)
	}
}

/// Raised when every case in a [`CasePipeline`] answered `NotApplicable`.
#[derive(Debug, thiserror::Error)]
#[error("no case could handle the input: {}", .reasons.join("; "))]
pub struct UnsupportedInput {
	pub reasons: Vec<String>,
}

pub struct CasePipeline<In: ?Sized, Ctx, Out> {
	cases: Vec<Box<dyn Case<In, Ctx, Out>>>,
}

impl<In: ?Sized, Ctx, Out> Default for CasePipeline<In, Ctx, Out> {
	fn default() -> Self {
		Self { cases: Vec::new() }
	}
}

impl<In: ?Sized, Ctx, Out> CasePipeline<In, Ctx, Out> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(mut self, case: impl Case<In, Ctx, Out> + 'static) -> Self {
		self.cases.push(Box::new(case));
		self
	}

	/// Runs the cases in declaration order, returning the first `Applied`
	/// result, or aggregating every `NotApplicable` reason otherwise.
	pub fn run(&self, input: &In, ctx: &mut Ctx) -> Result<Out, UnsupportedInput> {
		let mut reasons = Vec::new();
		for case in &self.cases {
			match case.try_apply(input, ctx)? {
				CaseOutcome::Applied(out) => return Ok(out),
				CaseOutcome::NotApplicable(reason) => reasons.push(reason),
			}
		}
		Err(UnsupportedInput { reasons })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn first_applicable_case_wins() {
		let pipeline: CasePipeline<i32, (), &'static str> = CasePipeline::new()
			.push(|n: &i32, _: &mut ()| {
				Ok(if *n < 0 {
					CaseOutcome::Applied("negative")
				} else {
					CaseOutcome::NotApplicable("not negative".into())
				})
			})
			.push(|_: &i32, _: &mut ()| Ok(CaseOutcome::Applied("fallback")));

		assert_eq!(pipeline.run(&-1, &mut ()).unwrap(), "negative");
		assert_eq!(pipeline.run(&1, &mut ()).unwrap(), "fallback");
	}

	#[test]
	fn aggregates_reasons_when_nothing_applies() {
		let pipeline: CasePipeline<i32, (), ()> = CasePipeline::new()
			.push(|_: &i32, _: &mut ()| Ok(CaseOutcome::NotApplicable("a".into())))
			.push(|_: &i32, _: &mut ()| Ok(CaseOutcome::NotApplicable("b".into())));
		let err = pipeline.run(&0, &mut ()).unwrap_err();
		assert_eq!(err.reasons, vec!["a".to_string(), "b".to_string()]);
	}
}
