//! The assembly directory: synthesized templates plus the manifests they came
//! from.
//!
//! ```text
//! stack.out/
//! ├── manifest.json                 # AssemblyManifest
//! └── GoLambdaStack.template.json   # one template per stack
//! ```
//!
//! The external orchestration engine consumes the templates. The stored
//! manifests let the next run compute a diff.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{ASSEMBLY_MANIFEST_FILE, ASSEMBLY_VERSION};
use crate::manifest::{ManifestError, StackManifest};
use crate::util::hash::{HashError, Hashable, ObjectHash};

use super::template::{SynthError, Template, synthesize};

#[derive(Debug, Error)]
pub enum AssemblyError {
  #[error(transparent)]
  Synth(#[from] SynthError),

  #[error("failed to serialize: {0}")]
  Serialize(#[from] HashError),

  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to write {}: {source}", path.display())]
  Write { path: PathBuf, source: std::io::Error },

  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to parse {}: {source}", path.display())]
  Parse { path: PathBuf, source: serde_json::Error },

  #[error("unsupported assembly version {found} (expected {expected})")]
  Version { found: String, expected: String },

  #[error("invalid manifest for stack {stack}: {source}")]
  Manifest { stack: String, source: ManifestError },
}

/// One stack recorded in the assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyStack {
  /// Template file name, relative to the assembly directory.
  pub template_file: String,
  pub hash: ObjectHash,
  pub manifest: StackManifest,
}

/// Contents of `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyManifest {
  pub version: String,
  pub stacks: BTreeMap<String, AssemblyStack>,
}

/// A synthesized stack ready to be written.
#[derive(Debug, Clone)]
pub struct SynthesizedStack {
  pub manifest: StackManifest,
  pub template: Template,
  pub hash: ObjectHash,
}

pub struct Assembly {
  dir: PathBuf,
}

impl Assembly {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  pub fn manifest_path(&self) -> PathBuf {
    self.dir.join(ASSEMBLY_MANIFEST_FILE)
  }

  pub fn template_path(&self, stack_id: &str) -> PathBuf {
    self.dir.join(template_file_name(stack_id))
  }

  /// Synthesize every stack, then write templates and `manifest.json`.
  ///
  /// Synthesis of all stacks and reading the existing `manifest.json`
  /// complete before anything is written, so a failure leaves the directory
  /// untouched. Stacks already recorded in the assembly are kept unless one
  /// of `stacks` replaces them.
  pub fn write(&self, stacks: &[StackManifest]) -> Result<Vec<SynthesizedStack>, AssemblyError> {
    let synthesized = stacks
      .iter()
      .map(|manifest| -> Result<SynthesizedStack, AssemblyError> {
        Ok(SynthesizedStack {
          template: synthesize(manifest)?,
          hash: manifest.compute_hash()?,
          manifest: manifest.clone(),
        })
      })
      .collect::<Result<Vec<_>, _>>()?;

    let mut entries = match self.read()? {
      Some(existing) => existing.stacks,
      None => BTreeMap::new(),
    };

    fs::create_dir_all(&self.dir).map_err(|source| AssemblyError::CreateDir {
      path: self.dir.clone(),
      source,
    })?;

    for stack in &synthesized {
      let stack_id = &stack.manifest.stack_id;
      let path = self.template_path(stack_id);
      write_json(&path, &stack.template)?;
      info!(
        stack = %stack_id,
        path = %path.display(),
        resources = stack.template.resources.len(),
        "wrote template"
      );

      entries.insert(
        stack_id.clone(),
        AssemblyStack {
          template_file: template_file_name(stack_id),
          hash: stack.hash.clone(),
          manifest: stack.manifest.clone(),
        },
      );
    }

    let manifest = AssemblyManifest {
      version: ASSEMBLY_VERSION.to_string(),
      stacks: entries,
    };
    write_json(&self.manifest_path(), &manifest)?;
    debug!(
      path = %self.manifest_path().display(),
      stacks = manifest.stacks.len(),
      "wrote assembly manifest"
    );

    Ok(synthesized)
  }

  /// Read `manifest.json`. Returns `None` if nothing was synthesized yet.
  ///
  /// Recorded manifests bypassed [`StackManifest::declare`], so their logical
  /// ids are checked for uniqueness here.
  pub fn read(&self) -> Result<Option<AssemblyManifest>, AssemblyError> {
    let path = self.manifest_path();
    if !path.exists() {
      return Ok(None);
    }

    let content = fs::read_to_string(&path).map_err(|source| AssemblyError::Read {
      path: path.clone(),
      source,
    })?;
    let manifest: AssemblyManifest =
      serde_json::from_str(&content).map_err(|source| AssemblyError::Parse { path, source })?;

    if manifest.version != ASSEMBLY_VERSION {
      return Err(AssemblyError::Version {
        found: manifest.version,
        expected: ASSEMBLY_VERSION.to_string(),
      });
    }
    for (stack, recorded) in &manifest.stacks {
      recorded
        .manifest
        .check_unique_ids()
        .map_err(|source| AssemblyError::Manifest {
          stack: stack.clone(),
          source,
        })?;
    }
    Ok(Some(manifest))
  }

  /// The previously synthesized manifest of one stack, if any.
  pub fn read_stack(&self, stack_id: &str) -> Result<Option<StackManifest>, AssemblyError> {
    Ok(
      self
        .read()?
        .and_then(|mut assembly| assembly.stacks.remove(stack_id))
        .map(|stack| stack.manifest),
    )
  }
}

fn template_file_name(stack_id: &str) -> String {
  format!("{}.template.json", stack_id)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AssemblyError> {
  let json = serde_json::to_string_pretty(value)?;
  fs::write(path, json).map_err(|source| AssemblyError::Write {
    path: path.to_path_buf(),
    source,
  })
}
