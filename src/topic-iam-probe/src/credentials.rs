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

//! Service account key files.
//!
//! A key file is the JSON document described in [aip/4112]. The probe reads
//! one to find the project and to authenticate the administrator, and
//! receives a second one when it creates a key for the service account
//! under test.
//!
//! [aip/4112]: https://google.aip.dev/auth/4112

use crate::{Error, Result};
use google_cloud_auth::credentials::Credentials;
use google_cloud_auth::credentials::service_account::{AccessSpecifier, Builder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The contents of a service account key file.
///
/// Only the fields needed to sign requests are required. The rest default to
/// empty strings and are omitted when empty.
#[derive(Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ServiceAccountKeyFile {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub key_type: String,
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub auth_uri: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_uri: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub auth_provider_x509_cert_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_x509_cert_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universe_domain: Option<String>,
}

impl ServiceAccountKeyFile {
    /// Loads a key file from `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read(path).map_err(|source| Error::ReadCredentials {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(&contents)
    }

    /// Parses a key file already in memory.
    pub fn from_slice(contents: &[u8]) -> Result<Self> {
        serde_json::from_slice(contents).map_err(Error::ParseCredentials)
    }

    /// The key file as a JSON document.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(Error::ParseCredentials)
    }

    /// The IAM member string for this service account.
    pub fn principal(&self) -> String {
        crate::names::service_account_member(&self.client_email)
    }

    /// Creates credentials for this service account, limited to `scopes`.
    pub fn credentials(&self, scopes: &[&str]) -> Result<Credentials> {
        let json = self.to_json()?;
        Builder::new(json)
            .with_access_specifier(AccessSpecifier::from_scopes(scopes.iter().copied()))
            .build()
            .map_err(Error::BuildCredentials)
    }
}

impl std::fmt::Debug for ServiceAccountKeyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKeyFile")
            .field("key_type", &self.key_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"[censored]")
            .field("client_email", &self.client_email)
            .field("client_id", &self.client_id)
            .field("universe_domain", &self.universe_domain)
            .finish()
    }
}
