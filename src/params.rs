use crate::error::{ManifoldError, Result};
use std::sync::OnceLock;
use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

static GLOBAL_PARAMS: OnceLock<ExecutionParams> = OnceLock::new();

///Process-wide switches consulted by the algorithms built on this kernel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExecutionParams {
	///Walk every halfedge and barycentric reference after each structural edit.
	pub intermediate_checks: bool,
	///Emit diagnostic output through `tracing`.
	pub verbose: bool,
	///Tolerate recoverable (geometry) errors instead of returning them.
	pub suppress_errors: bool,
}

impl ExecutionParams {
	///Installs these parameters for the whole process. Parameters can only be
	///installed once; they are read-only afterwards.
	pub fn install(self) -> Result<()> {
		let installed = GLOBAL_PARAMS.set(self).is_ok();
		ensure!(
			installed,
			User,
			"execution parameters were already installed for this process"
		);
		Ok(())
	}

	///The installed parameters, or the defaults if none were installed.
	pub fn global() -> ExecutionParams {
		GLOBAL_PARAMS.get().copied().unwrap_or_default()
	}

	///Decides the fate of an error raised by an algorithm. Geometry errors are
	///swallowed (and logged) when `suppress_errors` is set, everything else is
	///passed back to the caller.
	pub fn tolerate(&self, err: ManifoldError) -> Result<()> {
		if self.suppress_errors && err.is_recoverable() {
			warn!("suppressed {}", err);
			return Ok(());
		}
		Err(err)
	}
}
