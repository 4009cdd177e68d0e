// The upload flow: check the account, read the file, store it under the
// same path with overwrite semantics. Nothing is retried; the first failure
// ends the flow.

use crate::api::{CommitInfo, DropboxClient, FileMetadata, StorageService};
use crate::config::Config;
use crate::error::{ServiceError, UploadError};
use log::{debug, info, warn};
use std::fs;

/// Upload the file at `path` to Dropbox at the same path, replacing any
/// existing content.
///
/// The session lives only for the duration of this call and is dropped on
/// every return path.
pub fn upload(path: &str, token: &str, config: &Config) -> Result<FileMetadata, UploadError> {
    let session = DropboxClient::new(token, config)?;
    upload_with(&session, path)
}

/// Run the upload flow against any `StorageService`.
///
/// An authorization rejection from the account check is reported the same
/// way as one from the upload itself.
pub fn upload_with<S>(service: &S, path: &str) -> Result<FileMetadata, UploadError>
where
    S: StorageService + ?Sized,
{
    let account = service.current_account().map_err(report)?;
    info!(
        "token valid for account {} ({})",
        account.account_id, account.name.display_name
    );

    let contents = fs::read(path).map_err(|source| UploadError::LocalIo {
        path: path.to_string(),
        source,
    })?;
    debug!("read {} bytes from {}", contents.len(), path);

    let metadata = service
        .upload(contents, &CommitInfo::overwrite(path))
        .map_err(report)?;
    info!("uploaded {} bytes to {} (rev {})", metadata.size, path, metadata.rev);
    Ok(metadata)
}

fn report(err: ServiceError) -> UploadError {
    if let ServiceError::Api { summary, .. } = &err {
        if !err.is_insufficient_space() {
            warn!("api error is not a quota error: {}", summary);
        }
    }
    UploadError::from(err)
}
