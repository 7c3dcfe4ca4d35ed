//! Shared foundation for the ambler quadruped locomotion stack.
//!
//! This crate holds everything the locomotion components agree on:
//!
//! - **Types** — per-leg runtime state, the four-leg group, torso state
//! - **Configuration** — TOML-loaded, validated gait libraries
//! - **Errors** — configuration and gait-switching error enums
//! - **Math utilities** — first-order filters, piecewise-linear curves
//! - **Terrain** — the height-query seam toward perception
//!
//! The control components themselves live in `ambler-gait`; nothing in this
//! crate depends on them.

pub mod config;
pub mod curve;
pub mod error;
pub mod filter;
pub mod terrain;
pub mod types;

pub use config::{
    AnchorMode, GaitConfig, GaitLibraryConfig, PlacementConfig, StabilizerConfig, TimingConfig,
    TransitionConfig,
};
pub use curve::{PiecewiseLinear, map_to_unit_range};
pub use error::{AmblerError, ConfigError, SwitchError};
pub use filter::FirstOrderFilter;
pub use terrain::{FlatTerrain, TerrainModel};
pub use types::{LEG_COUNT, Leg, LegGroup, LegMode, TorsoState};
