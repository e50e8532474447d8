//! GPU state abstraction and test utilities for Strata.
//!
//! The terrain renderer never talks to a graphics API directly. It drives a
//! per-context [`RenderState`], which real backends implement over their
//! API and which `MockRenderState` (behind the `mock` feature) implements by
//! recording every call.
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use std::sync::Arc;
//! use strata_test_utils::{ContextId, MockProgram, MockRenderState, RenderState};
//!
//! let program = Arc::new(MockProgram::new(1, &["strata_layer_opacity"]));
//! let mut state = MockRenderState::new(ContextId(0)).with_program(program.clone());
//!
//! let location = state
//!     .active_program()
//!     .and_then(|p| p.uniform_location("strata_layer_opacity"))
//!     .unwrap();
//! state.uniform_f32(location, 0.5);
//!
//! assert_eq!(state.uniform_f32_writes(location), vec![0.5]);
//! # }
//! ```
//!
//! # Design
//!
//! - Handles (`GpuTexture`, `GpuBuffer`) are owned and cheap to clone; no
//!   lifetimes leak into the renderer.
//! - [`RenderState`] is object-safe so drawables take `&mut dyn RenderState`.
//! - State mutation takes `&mut self`: a render state belongs to exactly one
//!   rendering thread.

pub mod gpu_types;
#[cfg(feature = "mock")]
pub mod mock_render;
pub mod render_state;

pub use gpu_types::*;
#[cfg(feature = "mock")]
pub use mock_render::*;
pub use render_state::*;
