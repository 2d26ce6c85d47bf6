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

//! The outcome of each step in a probe run.

use crate::Error;
use crate::clients::Services;
use crate::key_file::KeyFile;
use google_cloud_gax::error::rpc::Code;
use google_cloud_iam_admin_v1::model::ServiceAccount;
use google_cloud_iam_v1::model::Policy;
use google_cloud_pubsub::model::{Subscription, Topic};
use std::collections::BTreeMap;

/// The steps in a probe run, in the order they run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    ConnectAdmin,
    CreateServiceAccount,
    CreateTopic,
    GrantTopicRole,
    CreateKey,
    ConnectWithTopicRole,
    TestTopicPermissions,
    CreateSubscriptionWithTopicRole,
    ConnectWithProjectScope,
    GrantProjectRole,
    TestProjectPermissions,
    CreateSubscriptionWithProjectRole,
}

/// What a step is expected to do when the probe demonstrates the limitation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expectation {
    Succeed,
    Fail,
}

impl Step {
    pub const ALL: [Step; 12] = [
        Step::ConnectAdmin,
        Step::CreateServiceAccount,
        Step::CreateTopic,
        Step::GrantTopicRole,
        Step::CreateKey,
        Step::ConnectWithTopicRole,
        Step::TestTopicPermissions,
        Step::CreateSubscriptionWithTopicRole,
        Step::ConnectWithProjectScope,
        Step::GrantProjectRole,
        Step::TestProjectPermissions,
        Step::CreateSubscriptionWithProjectRole,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Step::ConnectAdmin => "connect as administrator",
            Step::CreateServiceAccount => "create service account",
            Step::CreateTopic => "create topic",
            Step::GrantTopicRole => "grant topic role",
            Step::CreateKey => "create service account key",
            Step::ConnectWithTopicRole => "connect as service account",
            Step::TestTopicPermissions => "test topic permissions",
            Step::CreateSubscriptionWithTopicRole => "create subscription with topic role",
            Step::ConnectWithProjectScope => "connect as service account with project scope",
            Step::GrantProjectRole => "grant project role",
            Step::TestProjectPermissions => "test project permissions",
            Step::CreateSubscriptionWithProjectRole => "create subscription with project role",
        }
    }

    /// The expected result when the limitation is present.
    ///
    /// The topic permission check is rejected by the service with a bad
    /// request, so it is expected to fail too.
    pub fn expectation(&self) -> Expectation {
        match self {
            Step::TestTopicPermissions | Step::CreateSubscriptionWithTopicRole => {
                Expectation::Fail
            }
            _ => Expectation::Succeed,
        }
    }

    /// Returns true if later steps depend on this step succeeding.
    pub fn is_prerequisite(&self) -> bool {
        matches!(
            self,
            Step::ConnectAdmin
                | Step::CreateServiceAccount
                | Step::CreateTopic
                | Step::CreateKey
                | Step::ConnectWithTopicRole
                | Step::ConnectWithProjectScope
        )
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The result of a step, or of releasing a resource.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Succeeded(String),
    Failed {
        code: Option<Code>,
        message: String,
    },
    Skipped,
}

impl Outcome {
    fn from_error(error: &Error) -> Self {
        Outcome::Failed {
            code: error.code(),
            message: error.to_string(),
        }
    }

    /// Returns true if the outcome agrees with `expectation`.
    ///
    /// A skipped step agrees with neither.
    pub fn meets(&self, expectation: Expectation) -> bool {
        matches!(
            (self, expectation),
            (Outcome::Succeeded(_), Expectation::Succeed)
                | (Outcome::Failed { .. }, Expectation::Fail)
        )
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Succeeded(detail) if detail.is_empty() => write!(f, "succeeded"),
            Outcome::Succeeded(detail) => write!(f, "succeeded: {detail}"),
            Outcome::Failed {
                code: Some(code),
                message,
            } => write!(f, "failed with {code}: {message}"),
            Outcome::Failed {
                code: None,
                message,
            } => write!(f, "failed: {message}"),
            Outcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// A short description of a successful step's result.
pub trait Describe {
    fn describe(&self) -> String;
}

impl Describe for () {
    fn describe(&self) -> String {
        String::new()
    }
}

impl Describe for Services {
    fn describe(&self) -> String {
        String::new()
    }
}

impl Describe for ServiceAccount {
    fn describe(&self) -> String {
        self.email.clone()
    }
}

impl Describe for KeyFile {
    fn describe(&self) -> String {
        format!("{} saved to {}", self.key().private_key_id, self.path().display())
    }
}

impl Describe for Topic {
    fn describe(&self) -> String {
        self.name.clone()
    }
}

impl Describe for Subscription {
    fn describe(&self) -> String {
        self.name.clone()
    }
}

impl Describe for Policy {
    fn describe(&self) -> String {
        format!("policy has {} bindings", self.bindings.len())
    }
}

impl Describe for Vec<String> {
    fn describe(&self) -> String {
        format!("allowed [{}]", self.join(", "))
    }
}

/// The outcome of every step and every release in a probe run.
#[derive(Clone, Debug, Default)]
pub struct Report {
    steps: BTreeMap<Step, Outcome>,
    cleanup: Vec<(String, Outcome)>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs and stores the outcome of `step`.
    ///
    /// Returns the value produced by the step, if it succeeded.
    pub fn record<T, E>(&mut self, step: Step, result: std::result::Result<T, E>) -> Option<T>
    where
        T: Describe,
        E: Into<Error>,
    {
        let expectation = step.expectation();
        match result {
            Ok(value) => {
                let outcome = Outcome::Succeeded(value.describe());
                match expectation {
                    Expectation::Succeed => tracing::info!("success with {step}: {outcome}"),
                    Expectation::Fail => {
                        tracing::warn!("{step} was expected to fail but {outcome}")
                    }
                }
                self.steps.insert(step, outcome);
                Some(value)
            }
            Err(e) => {
                let outcome = Outcome::from_error(&e.into());
                match expectation {
                    Expectation::Succeed => tracing::error!("{step} {outcome}"),
                    Expectation::Fail => tracing::info!("{step} {outcome}, as expected"),
                }
                self.steps.insert(step, outcome);
                None
            }
        }
    }

    /// Logs and stores the outcome of releasing `resource`.
    pub fn record_cleanup<E>(&mut self, resource: &str, result: std::result::Result<(), E>)
    where
        E: Into<Error>,
    {
        let outcome = match result {
            Ok(()) => {
                tracing::info!("deleted {resource}");
                Outcome::Succeeded(String::new())
            }
            Err(e) => {
                let outcome = Outcome::from_error(&e.into());
                tracing::error!("cannot delete {resource}: {outcome}");
                outcome
            }
        };
        self.cleanup.push((resource.to_string(), outcome));
    }

    /// Records a resource left in place.
    pub fn record_kept(&mut self, resource: &str) {
        tracing::info!("keeping {resource}");
        self.cleanup.push((resource.to_string(), Outcome::Skipped));
    }

    /// Marks every step without an outcome as skipped.
    pub fn finish(&mut self) {
        for step in Step::ALL {
            self.steps.entry(step).or_insert(Outcome::Skipped);
        }
    }

    pub fn outcome(&self, step: Step) -> Option<&Outcome> {
        self.steps.get(&step)
    }

    /// The recorded steps, in the order they run.
    pub fn steps(&self) -> impl Iterator<Item = (Step, &Outcome)> {
        self.steps.iter().map(|(s, o)| (*s, o))
    }

    pub fn cleanup(&self) -> &[(String, Outcome)] {
        &self.cleanup
    }

    /// Returns true if the run showed the limitation.
    ///
    /// That is, the subscription could not be created with the topic role,
    /// and could be created with the project role.
    pub fn demonstrated(&self) -> bool {
        let denied = matches!(
            self.outcome(Step::CreateSubscriptionWithTopicRole),
            Some(Outcome::Failed {
                code: Some(Code::PermissionDenied),
                ..
            })
        );
        let created = matches!(
            self.outcome(Step::CreateSubscriptionWithProjectRole),
            Some(Outcome::Succeeded(_))
        );
        denied && created
    }

    /// Returns true if every resource was released.
    pub fn clean(&self) -> bool {
        self.cleanup
            .iter()
            .all(|(_, o)| matches!(o, Outcome::Succeeded(_)))
    }

    pub fn log_summary(&self) {
        for (step, outcome) in self.steps() {
            let expected = match step.expectation() {
                Expectation::Succeed => "expected to succeed",
                Expectation::Fail => "expected to fail",
            };
            if outcome.meets(step.expectation()) {
                tracing::info!("{step} ({expected}): {outcome}");
            } else {
                tracing::warn!("{step} ({expected}): {outcome}");
            }
        }
        for (resource, outcome) in &self.cleanup {
            tracing::info!("cleanup {resource}: {outcome}");
        }
        if self.demonstrated() {
            tracing::info!(
                "the topic role did not allow creating a subscription, the project role did"
            );
        } else {
            tracing::warn!("the run did not show the topic role limitation");
        }
    }
}
