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

use crate::credentials::ServiceAccountKeyFile;
use crate::names;
use crate::{Error, Result};
use anyhow::bail;
use clap::Parser;
use humantime::parse_duration;
use std::path::PathBuf;
use std::time::Duration;

/// The environment variable naming the administrator's key file.
pub const CREDENTIALS_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";

pub const DESCRIPTION: &str = concat!(
    "Shows that a service account granted roles/pubsub.subscriber on a",
    " topic cannot create a subscription to that topic, while the same",
    " service account can after it is granted the role on the project.",
    "\n\n",
    "The program uses the service account key in",
    " GOOGLE_APPLICATION_CREDENTIALS to create a service account, a topic,",
    " a key for the new service account, the IAM bindings, and two",
    " subscriptions. It logs the outcome of each step, and deletes the",
    " resources before exiting.",
    "\n\n",
    "The key must belong to a service account that can manage service",
    " accounts, topics, subscriptions and the project IAM policy."
);

/// Configuration options for the probe.
#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = DESCRIPTION)]
pub struct Args {
    /// The administrator's service account key file.
    #[arg(long, env = CREDENTIALS_VAR)]
    pub credentials: Option<PathBuf>,

    /// The account id for the service account created by the probe.
    #[arg(long, default_value = "test-sa")]
    pub service_account_id: String,

    /// The id for the topic created by the probe.
    #[arg(long, default_value = "test-topic")]
    pub topic_id: String,

    /// The id for the first subscription.
    ///
    /// The second subscription uses the same id with a `2` suffix.
    #[arg(long, default_value = "test-sub")]
    pub subscription_id: String,

    /// Leave the service account, topic and subscriptions in place.
    #[arg(long, default_value_t = false)]
    pub keep_resources: bool,

    /// How long to wait after each IAM policy change.
    #[arg(long, value_parser = parse_duration, default_value = "0s")]
    pub iam_propagation_delay: Duration,
}

impl Args {
    /// Validates the arguments after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.service_account_id.is_empty() {
            bail!("invalid service-account-id, must be non-empty")
        }
        if self.topic_id.is_empty() {
            bail!("invalid topic-id, must be non-empty")
        }
        if self.subscription_id.is_empty() {
            bail!("invalid subscription-id, must be non-empty")
        }
        Ok(())
    }

    /// The path to the administrator's key file.
    pub fn credentials_path(&self) -> Result<PathBuf> {
        match &self.credentials {
            Some(path) if !path.as_os_str().is_empty() => Ok(path.clone()),
            _ => Err(Error::MissingCredentialsPath(CREDENTIALS_VAR)),
        }
    }
}

/// The resolved configuration for a probe run.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub project_id: String,
    pub service_account_id: String,
    pub topic_id: String,
    pub subscription_id: String,
    pub keep_resources: bool,
    pub propagation_delay: Duration,
}

impl Settings {
    /// Combines the arguments with the project from the administrator's key.
    pub fn new(args: &Args, key: &ServiceAccountKeyFile) -> Self {
        Self {
            project_id: key.project_id.clone(),
            service_account_id: args.service_account_id.clone(),
            topic_id: args.topic_id.clone(),
            subscription_id: args.subscription_id.clone(),
            keep_resources: args.keep_resources,
            propagation_delay: args.iam_propagation_delay,
        }
    }

    pub fn project_name(&self) -> String {
        names::project_name(&self.project_id)
    }

    pub fn topic_name(&self) -> String {
        names::topic_name(&self.project_id, &self.topic_id)
    }

    /// The subscription created with only the topic role.
    pub fn subscription_name(&self) -> String {
        names::subscription_name(&self.project_id, &self.subscription_id)
    }

    /// The subscription created with the project role.
    pub fn second_subscription_name(&self) -> String {
        names::subscription_name(&self.project_id, &format!("{}2", self.subscription_id))
    }
}
