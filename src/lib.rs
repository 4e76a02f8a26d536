//! Extracts runnable examples from prose documents, executes each against a
//! live interpreter over a pseudo-terminal, and checks the captured output
//! against a compiled expected-output pattern.
//!
//! The crate is organized around the three subsystems that carry the real
//! complexity: [`harvest`] (finding examples in a document), [`expected`]
//! (compiling an expected-output string with ellipsis wildcards and capture
//! tags into a regex), and [`runner`] (driving an interactive interpreter
//! over a pty). [`parser`] and [`executor`] wire the three together;
//! [`options`] and [`error`] are shared infrastructure.

pub mod error;
pub mod executor;
pub mod expected;
pub mod harvest;
pub mod location;
pub mod modules;
pub mod options;
pub mod parser;
pub mod registry;
pub mod runner;
pub mod util;

pub use error::CoreError;
pub use executor::Executor;
pub use harvest::{Example, ExampleCandidate, Harvester};
pub use location::Where;
pub use options::{OptionStack, OptionValue};
pub use runner::Runner;
