//! lambdastack-lib: declaration toolkit for the Go Lambda stack.
//!
//! This crate provides:
//! - `construct`: the app/stack scope tree and logical ids
//! - `resource`: typed resource declarations and handles
//! - `manifest`: the ordered declaration graph of a stack
//! - `compose`: the stack composer
//! - `dag`: dependency graph and deployment waves
//! - `synth`: template rendering and the assembly directory
//! - `diff`: changes between two synthesized manifests

pub mod compose;
pub mod config;
pub mod consts;
pub mod construct;
pub mod dag;
pub mod diff;
pub mod init;
pub mod manifest;
pub mod resource;
pub mod synth;
pub mod target;
pub mod util;
