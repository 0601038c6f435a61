//! Synthesis: turning declaration graphs into deployable templates.

mod assembly;
mod template;

pub use assembly::{Assembly, AssemblyError, AssemblyManifest, AssemblyStack, SynthesizedStack};
pub use template::{SynthError, Template, TemplateOutput, TemplateResource, synthesize};
