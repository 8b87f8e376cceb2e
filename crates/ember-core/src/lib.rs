//! Ember Core - Shared types for the Ember runtime
//!
//! This crate provides the pieces every client of the ECS needs but that do
//! not belong to the ECS itself:
//! - Frame timing (scaled, clamped delta time and a fixed-step accumulator)
//! - Math primitives (re-exported from glam)

pub mod time;

pub use glam::{Quat, Vec2, Vec3, Vec4};
pub use time::{GameTime, TimeConfig};
