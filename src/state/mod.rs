// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reconciliation of commanded and reported peripheral state.
//!
//! One [`StateReconciler`] exists per peripheral. It turns acknowledged
//! commands and raw poll observations into a [`ReconciledState`], the only
//! on/off value consumers see.

mod reconciled;
mod reconciler;

pub use reconciled::{CommandIntent, Confidence, ReconciledState};
pub use reconciler::{ReconcileOutcome, ReconcilerPhase, StateReconciler};
