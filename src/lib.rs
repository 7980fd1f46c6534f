// THEORY:
// This file is the entry point of the `watchpost` library crate. It exposes the
// adaptive background-subtraction engine behind a small, high-level API:
//
// - `pipeline::WatchPipeline` turns frames into `FrameReport`s (regions found,
//   safe/unsafe status, alarm events).
// - `session::Session` drives the capture -> detect -> render -> write ->
//   display loop against any camera, writer and display that implement the
//   collaborator traits.
// - `config::Config` carries every tunable, loadable from TOML.
//
// The individual stages (`core_modules`) stay public for callers that want to
// assemble their own loop, but most consumers only need the pipeline.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;
pub mod session;
