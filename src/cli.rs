// Command-line surface: two positionals, the file and the token. The token
// may be left out, in which case it is asked for without echoing it.

use anyhow::Result;
use clap::Parser;
use dialoguer::Password;

/// Upload a file to Dropbox at the same path, overwriting what is there.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Local file to upload. Also used, unchanged, as the Dropbox path.
    pub path: String,
    /// Dropbox access token. Prompted for when omitted.
    pub token: Option<String>,
}

impl Args {
    /// Return the token given on the command line, or prompt for one.
    pub fn resolve_token(&self) -> Result<String> {
        match &self.token {
            Some(token) => Ok(token.clone()),
            None => Ok(Password::new().with_prompt("Dropbox access token").interact()?),
        }
    }
}
