//! # Engine Module
//!
//! The stateful layer between the pure algorithms in [`crate::core`] and the
//! end-to-end procedures in [`crate::workflows`].
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Validated network, solver and search settings with builders
//! - **Model State** ([`anm`]) - The [`anm::Anm`] facade holding a Hessian and its modes
//! - **Search State** ([`state`]) - The best-fit accumulator and search results
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Cancellation** ([`cancel`]) - A shareable token checked between frames
//! - **Error Handling** ([`error`]) - Engine errors wrapping the core error types
//! - **Tasks** ([`tasks`]) - The frame grid and the conformational search loop
//!
//! Frame evaluation runs on the rayon thread pool when the `parallel` feature is enabled.

pub mod anm;
pub mod cancel;
pub mod config;
pub mod context;
pub mod error;
pub mod progress;
pub mod state;
pub mod tasks;
