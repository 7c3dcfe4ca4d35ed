//! Static-gait coordination for quadruped robots.
//!
//! The pipeline runs at the control rate and is advanced once per tick:
//!
//! 1. [`LimbModeCoordinator`] turns the global stride phase into per-leg
//!    stance/swing modes, with touchdown hysteresis against measured
//!    contact.
//! 2. [`SupportPolygonStabilizer`] keeps the desired center of mass inside
//!    a margin-shrunk support triangle while one leg swings.
//! 3. [`SwingFootPlacementPlanner`] places each swing foot with an
//!    inverted-pendulum step offset and a parameterized swing profile.
//!
//! [`GaitController`] bundles the three for one named gait;
//! [`GaitTransitionSwitcher`] owns a library of controllers and blends
//! between them on phase-synchronized transitions.

pub mod controller;
pub mod coordinator;
pub mod placement;
pub mod scheduler;
pub mod stabilizer;
pub mod switcher;

#[cfg(feature = "bevy")]
pub mod plugin;

pub use controller::GaitController;
pub use coordinator::LimbModeCoordinator;
pub use placement::SwingFootPlacementPlanner;
pub use scheduler::GaitPhaseScheduler;
pub use stabilizer::SupportPolygonStabilizer;
pub use switcher::{GaitTransitionSwitcher, TransitionState};
