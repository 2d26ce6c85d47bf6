// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Keys created for the service account under test.

use crate::credentials::ServiceAccountKeyFile;
use crate::{Error, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::io::Write as _;
use std::path::Path;
use tempfile::TempPath;

/// Returns the key file contained in a key's private key data.
///
/// The service returns the key file base64-encoded. The client libraries
/// decode `bytes` fields while deserializing the response, in which case
/// `data` already holds the JSON document and is returned unchanged.
pub fn decode_private_key_data(data: &[u8]) -> Result<Vec<u8>> {
    let trimmed = data.trim_ascii();
    if trimmed.starts_with(b"{") {
        return Ok(trimmed.to_vec());
    }
    STANDARD.decode(trimmed).map_err(Error::DecodeKey)
}

/// A key file saved to a temporary location.
///
/// The file is removed when this value is dropped.
#[derive(Debug)]
pub struct KeyFile {
    path: TempPath,
    key: ServiceAccountKeyFile,
}

impl KeyFile {
    /// Saves `contents` to a new temporary file and loads the key from it.
    ///
    /// The file is only readable by the current user.
    pub fn persist(contents: &[u8]) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("topic-iam-probe-")
            .suffix(".json")
            .tempfile()
            .map_err(Error::WriteKeyFile)?;
        file.write_all(contents).map_err(Error::WriteKeyFile)?;
        file.flush().map_err(Error::WriteKeyFile)?;
        let path = file.into_temp_path();
        let key = ServiceAccountKeyFile::from_file(&path)?;
        tracing::info!("saved key {} to {}", key.private_key_id, path.display());
        Ok(Self { path, key })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> &ServiceAccountKeyFile {
        &self.key
    }

    /// Removes the file now, reporting any error.
    pub fn close(self) -> Result<()> {
        let path = self.path.display().to_string();
        self.path.close().map_err(Error::WriteKeyFile)?;
        tracing::info!("removed key file {path}");
        Ok(())
    }
}
