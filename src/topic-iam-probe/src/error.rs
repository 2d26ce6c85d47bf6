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

use google_cloud_gax::error::rpc::Code;
use std::path::PathBuf;

/// The error type for the probe.
///
/// Only [Error::MissingCredentialsPath] and the errors loading the initial
/// credentials file stop the program. Every other error is recorded against
/// the step that produced it.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The credentials file path is not configured.
    #[error("the {0} environment variable must be set to a full-access service account key file")]
    MissingCredentialsPath(&'static str),

    /// The credentials file could not be read.
    #[error("cannot read credentials file {path:?}: {source}")]
    ReadCredentials {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The credentials file is not a valid service account key.
    #[error("cannot parse service account key: {0}")]
    ParseCredentials(#[source] serde_json::Error),

    /// The authentication library rejected the service account key.
    #[error("cannot build credentials: {0}")]
    BuildCredentials(#[source] google_cloud_auth::build_errors::Error),

    /// The private key data in a newly created key is not valid base64.
    #[error("cannot decode service account key data: {0}")]
    DecodeKey(#[source] base64::DecodeError),

    /// The newly created key could not be saved.
    #[error("cannot write service account key file: {0}")]
    WriteKeyFile(#[source] std::io::Error),

    /// A client for a Google Cloud service could not be initialized.
    #[error(transparent)]
    Build(#[from] google_cloud_gax::client_builder::Error),

    /// A request to a Google Cloud service failed.
    #[error(transparent)]
    Service(#[from] google_cloud_gax::error::Error),
}

impl Error {
    /// The RPC status code, if the service returned one.
    pub fn code(&self) -> Option<Code> {
        match self {
            Self::Service(e) => e.status().map(|s| s.code),
            _ => None,
        }
    }
}
