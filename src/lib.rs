#![forbid(unsafe_code)]

pub mod assets;
pub mod bitmap;
pub mod build;
pub mod diag;
pub mod error;
pub mod field;
pub mod font;
pub mod guard;
pub mod linker;
pub mod model;
pub mod naming;
pub mod regions;
pub mod transparency;
pub mod widgets;

pub use build::{Artifact, Section, build};
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use error::{BuildError, BuildResult};
pub use model::{BuildConfiguration, Project};
