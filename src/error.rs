//! Error taxonomy shared by every fallible kernel operation.

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ManifoldError>;

///Where a failed check was detected, and what it was checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
	pub file: &'static str,
	pub line: u32,
	pub condition: &'static str,
	pub message: String,
}

impl fmt::Display for ErrorContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Error in file: {} ({}): '{}' is false: {}",
			self.file, self.line, self.condition, self.message
		)
	}
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	///Malformed or unsupported input from outside the kernel.
	User,
	///A halfedge pairing or face cycle invariant was broken by a mutation.
	Topology,
	///A geometric precondition such as finiteness or non-degeneracy failed.
	Geometry,
	///Internal bookkeeping, e.g. provenance, is out of range.
	Logic,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifoldError {
	#[error("user error: {0}")]
	User(ErrorContext),
	#[error("topology error: {0}")]
	Topology(ErrorContext),
	#[error("geometry error: {0}")]
	Geometry(ErrorContext),
	#[error("logic error: {0}")]
	Logic(ErrorContext),
}

impl ManifoldError {
	pub fn new(
		kind: ErrorKind,
		file: &'static str,
		line: u32,
		condition: &'static str,
		message: impl Into<String>,
	) -> Self {
		let context = ErrorContext {
			file,
			line,
			condition,
			message: message.into(),
		};
		match kind {
			ErrorKind::User => Self::User(context),
			ErrorKind::Topology => Self::Topology(context),
			ErrorKind::Geometry => Self::Geometry(context),
			ErrorKind::Logic => Self::Logic(context),
		}
	}

	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::User(_) => ErrorKind::User,
			Self::Topology(_) => ErrorKind::Topology,
			Self::Geometry(_) => ErrorKind::Geometry,
			Self::Logic(_) => ErrorKind::Logic,
		}
	}

	pub fn context(&self) -> &ErrorContext {
		match self {
			Self::User(c) | Self::Topology(c) | Self::Geometry(c) | Self::Logic(c) => c,
		}
	}

	///Only geometry errors may be tolerated by the caller; the others reflect
	///bad input or broken bookkeeping.
	pub fn is_recoverable(&self) -> bool {
		self.kind() == ErrorKind::Geometry
	}
}

///Returns early with a [`ManifoldError`] of the given kind when `condition`
///does not hold. The error records the source location and the condition text.
#[macro_export]
macro_rules! ensure {
	($condition:expr, $kind:ident, $($msg:tt)+) => {
		if !($condition) {
			return Err($crate::error::ManifoldError::new(
				$crate::error::ErrorKind::$kind,
				file!(),
				line!(),
				stringify!($condition),
				format!($($msg)+),
			));
		}
	};
}

///Builds a [`ManifoldError`] without returning, for paths that need to decide
///what to do with it (e.g. hand it to `ExecutionParams::tolerate`).
#[macro_export]
macro_rules! fail {
	($kind:ident, $condition:expr, $($msg:tt)+) => {
		$crate::error::ManifoldError::new(
			$crate::error::ErrorKind::$kind,
			file!(),
			line!(),
			$condition,
			format!($($msg)+),
		)
	};
}
