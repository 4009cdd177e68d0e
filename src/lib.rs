// Library root
// -----------
// Uploads one local file to Dropbox under the same path. The binary
// (`main.rs`) is a thin wrapper that turns the result into a diagnostic
// and an exit status.
//
// Module responsibilities:
// - `api`: HTTP interactions with Dropbox (account check, file upload) and
//   the `StorageService` trait they implement.
// - `upload`: the upload flow itself, generic over `StorageService`.
// - `error`: failure taxonomy and the user-facing diagnostics.
// - `config`: endpoint configuration from the environment.
// - `cli`: argument parsing and token prompt.
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod upload;

pub use upload::{upload, upload_with};
