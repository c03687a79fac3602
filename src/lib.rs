// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) uses these modules to implement the interactive menu.
//
// Module responsibilities:
// - `api`: talks to the remote image-processing service (face + hair
//   shape + hair color in, composited image out).
// - `pinata`: talks to the Pinata pinning gateway and resolves credentials.
// - `metadata`: descriptive fields and the metadata document built from them.
// - `publish`: the artwork publication pipeline (image pin, metadata
//   document, metadata pin).
// - `config`: settings read from the environment / `.env`.
// - `error`: typed errors for the publication flow.
// - `ui`: terminal flows that delegate to the modules above.
pub mod api;
pub mod config;
pub mod error;
pub mod metadata;
pub mod pinata;
pub mod publish;
pub mod ui;

pub use error::{ErrorKind, PublishError};
pub use publish::{PublicationResult, Publisher};
