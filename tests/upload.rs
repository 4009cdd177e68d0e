use dropbox_upload::api::{Account, CommitInfo, FileMetadata, Name, StorageService, WriteMode};
use dropbox_upload::error::{ServiceError, UploadError, INVALID_TOKEN_MESSAGE, OUT_OF_SPACE_MESSAGE};
use dropbox_upload::upload_with;
use reqwest::StatusCode;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use tempfile::NamedTempFile;

#[derive(Clone, Copy)]
enum Fail {
    Auth,
    Api,
    Server,
}

impl Fail {
    fn error(self) -> ServiceError {
        match self {
            Fail::Auth => ServiceError::Auth {
                summary: "invalid_access_token/".into(),
            },
            Fail::Api => ServiceError::Api {
                summary: "path/insufficient_space/..".into(),
                user_message: None,
            },
            Fail::Server => ServiceError::Internal {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: String::new(),
            },
        }
    }
}

/// In-memory storage that records every call made against it.
#[derive(Default)]
struct FakeDropbox {
    fail_account: Option<Fail>,
    fail_upload: Option<Fail>,
    account_checks: RefCell<usize>,
    uploads: RefCell<Vec<CommitInfo>>,
    files: RefCell<HashMap<String, Vec<u8>>>,
}

impl StorageService for FakeDropbox {
    fn current_account(&self) -> Result<Account, ServiceError> {
        *self.account_checks.borrow_mut() += 1;
        if let Some(fail) = self.fail_account {
            return Err(fail.error());
        }
        Ok(Account {
            account_id: "dbid:test".into(),
            email: "test@example.com".into(),
            name: Name {
                display_name: "Test".into(),
            },
        })
    }

    fn upload(&self, contents: Vec<u8>, commit: &CommitInfo) -> Result<FileMetadata, ServiceError> {
        self.uploads.borrow_mut().push(commit.clone());
        if let Some(fail) = self.fail_upload {
            return Err(fail.error());
        }
        let size = contents.len() as u64;
        let mut files = self.files.borrow_mut();
        files.insert(commit.path.clone(), contents);
        Ok(FileMetadata {
            name: commit.path.rsplit('/').next().unwrap_or_default().to_string(),
            id: format!("id:{}", files.len()),
            path_display: Some(commit.path.clone()),
            rev: "015f".into(),
            size,
            content_hash: None,
        })
    }
}

fn temp_file(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file
}

fn path_of(file: &NamedTempFile) -> String {
    file.path().to_str().unwrap().to_string()
}

#[test]
fn uploads_file_once_after_one_account_check() {
    let file = temp_file(b"<xml>backup</xml>");
    let path = path_of(&file);
    let dropbox = FakeDropbox::default();

    let metadata = upload_with(&dropbox, &path).unwrap();

    assert_eq!(metadata.size, 17);
    assert_eq!(*dropbox.account_checks.borrow(), 1);
    assert_eq!(dropbox.uploads.borrow().len(), 1);
    assert_eq!(dropbox.files.borrow()[&path], b"<xml>backup</xml>");
}

#[test]
fn destination_is_the_local_path_with_overwrite() {
    let file = temp_file(b"data");
    let path = path_of(&file);
    let dropbox = FakeDropbox::default();

    upload_with(&dropbox, &path).unwrap();

    let uploads = dropbox.uploads.borrow();
    assert_eq!(uploads[0], CommitInfo::overwrite(&path));
    assert_eq!(uploads[0].path, path);
    assert_eq!(uploads[0].mode, WriteMode::Overwrite);
    assert!(!uploads[0].autorename);
}

#[test]
fn repeated_upload_overwrites_in_place() {
    let file = temp_file(b"first");
    let path = path_of(&file);
    let dropbox = FakeDropbox::default();

    upload_with(&dropbox, &path).unwrap();
    std::fs::write(&path, b"second").unwrap();
    upload_with(&dropbox, &path).unwrap();

    let files = dropbox.files.borrow();
    assert_eq!(files.len(), 1);
    assert_eq!(files[&path], b"second");
    let uploads = dropbox.uploads.borrow();
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0].path, uploads[1].path);
}

#[test]
fn token_rejected_on_upload() {
    let file = temp_file(b"data");
    let dropbox = FakeDropbox {
        fail_upload: Some(Fail::Auth),
        ..Default::default()
    };

    let err = upload_with(&dropbox, &path_of(&file)).unwrap_err();

    assert!(matches!(err, UploadError::AuthorizationFailure(_)));
    assert_eq!(err.diagnostic(), Some(INVALID_TOKEN_MESSAGE));
    assert!(dropbox.files.borrow().is_empty());
}

#[test]
fn token_rejected_on_account_check_stops_before_reading() {
    // The account check's rejection gets the same diagnostic as the upload's, and
    // the file is never opened: a missing path does not change the outcome.
    let dropbox = FakeDropbox {
        fail_account: Some(Fail::Auth),
        ..Default::default()
    };

    let err = upload_with(&dropbox, "/no/such/file").unwrap_err();

    assert_eq!(err.diagnostic(), Some(INVALID_TOKEN_MESSAGE));
    assert_eq!(*dropbox.account_checks.borrow(), 1);
    assert!(dropbox.uploads.borrow().is_empty());
}

#[test]
fn api_error_on_upload_reports_out_of_space() {
    let file = temp_file(b"data");
    let dropbox = FakeDropbox {
        fail_upload: Some(Fail::Api),
        ..Default::default()
    };

    let err = upload_with(&dropbox, &path_of(&file)).unwrap_err();

    assert!(matches!(err, UploadError::ServiceFailure(_)));
    assert_eq!(err.diagnostic(), Some(OUT_OF_SPACE_MESSAGE));
}

#[test]
fn api_error_on_account_check_reports_out_of_space() {
    let dropbox = FakeDropbox {
        fail_account: Some(Fail::Api),
        ..Default::default()
    };

    let err = upload_with(&dropbox, "/no/such/file").unwrap_err();

    assert_eq!(err.diagnostic(), Some(OUT_OF_SPACE_MESSAGE));
    assert!(dropbox.uploads.borrow().is_empty());
}

#[test]
fn missing_file_surfaces_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.xml");
    let path = path.to_str().unwrap();
    let dropbox = FakeDropbox::default();

    let err = upload_with(&dropbox, path).unwrap_err();

    assert_eq!(err.diagnostic(), None);
    match err {
        UploadError::LocalIo { path: failed, source } => {
            assert_eq!(failed, path);
            assert_eq!(source.kind(), ErrorKind::NotFound);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(*dropbox.account_checks.borrow(), 1);
    assert!(dropbox.uploads.borrow().is_empty());
}

#[test]
fn other_service_errors_pass_through() {
    let file = temp_file(b"data");
    let dropbox = FakeDropbox {
        fail_upload: Some(Fail::Server),
        ..Default::default()
    };

    let err = upload_with(&dropbox, &path_of(&file)).unwrap_err();

    assert!(matches!(
        err,
        UploadError::Unhandled(ServiceError::Internal { .. })
    ));
    assert_eq!(err.diagnostic(), None);
}
