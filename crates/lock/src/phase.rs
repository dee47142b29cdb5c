use std::fmt;

use serde::{Deserialize, Serialize};

/// Resolution stage a node passes through, in strictly increasing order.
///
/// Nodes are created at [`Phase::FIRST`] and only ever move forward; the
/// derived `Ord` is the single source of truth for every lock decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
	/// Freshly built from source, nothing resolved yet.
	Raw,
	/// Import directives bound to their targets.
	Imports,
	/// Annotations the front end needs before anything else.
	Annotations,
	/// Supertype references resolved.
	SuperTypes,
	/// Explicitly written types resolved.
	Types,
	/// Modifiers, visibility and inherited status computed.
	Status,
	/// Declared contracts attached.
	Contracts,
	/// Types inferred from bodies; may recursively resolve other declarations.
	ImplicitTypes,
	/// Constant initializers evaluated.
	ConstantEvaluation,
	/// Annotation arguments resolved.
	AnnotationArguments,
	/// Bodies fully resolved.
	BodyResolve,
}

impl Phase {
	/// Phase every node starts in.
	pub const FIRST: Self = Self::Raw;

	/// Last phase of the ladder.
	pub const LAST: Self = Self::BodyResolve;

	/// The one phase serialized through a dedicated lock.
	pub const HAZARDOUS: Self = Self::ImplicitTypes;

	/// All phases in resolution order.
	pub const ALL: [Self; 11] = [
		Self::Raw,
		Self::Imports,
		Self::Annotations,
		Self::SuperTypes,
		Self::Types,
		Self::Status,
		Self::Contracts,
		Self::ImplicitTypes,
		Self::ConstantEvaluation,
		Self::AnnotationArguments,
		Self::BodyResolve,
	];

	/// Position of this phase in [`Self::ALL`].
	pub const fn ordinal(self) -> u8 {
		self as u8
	}

	/// Inverse of [`Self::ordinal`].
	pub fn from_ordinal(ordinal: u8) -> Option<Self> {
		Self::ALL.get(usize::from(ordinal)).copied()
	}

	/// Immediate successor, or `None` for [`Self::LAST`].
	pub fn next(self) -> Option<Self> {
		Self::from_ordinal(self.ordinal() + 1)
	}

	/// Immediate predecessor, or `None` for [`Self::FIRST`].
	pub fn previous(self) -> Option<Self> {
		self.ordinal().checked_sub(1).and_then(Self::from_ordinal)
	}

	/// Returns true for the phase guarded by the phase lock.
	pub const fn is_hazardous(self) -> bool {
		matches!(self, Self::HAZARDOUS)
	}

	/// Stable snake_case name, as used in config and log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Raw => "raw",
			Self::Imports => "imports",
			Self::Annotations => "annotations",
			Self::SuperTypes => "super_types",
			Self::Types => "types",
			Self::Status => "status",
			Self::Contracts => "contracts",
			Self::ImplicitTypes => "implicit_types",
			Self::ConstantEvaluation => "constant_evaluation",
			Self::AnnotationArguments => "annotation_arguments",
			Self::BodyResolve => "body_resolve",
		}
	}
}

impl fmt::Display for Phase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
