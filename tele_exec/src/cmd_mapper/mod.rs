//! Command mapper module
//!
//! Turns the normalised 4-axis target signal from frame analysis into a
//! movement command in vehicle units, applying the configured scaling
//! coefficients and clamping to the vehicle's accepted range.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors during command mapper processing.
///
/// There are none by construction - all inputs are clamped, never rejected.
/// The enum is uninhabited so that the type system records this.
#[derive(Debug, thiserror::Error)]
pub enum CmdMapperError {}
