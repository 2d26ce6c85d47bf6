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

//! Releases the resources created during a probe run.

use crate::clients::Services;
use crate::key_file::KeyFile;
use crate::report::Report;

/// A cloud resource created by the probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resource {
    Subscription(String),
    Topic(String),
    ServiceAccount(String),
}

impl Resource {
    pub fn name(&self) -> &str {
        match self {
            Resource::Subscription(n) | Resource::Topic(n) | Resource::ServiceAccount(n) => n,
        }
    }
}

/// Tracks the resources created so far.
///
/// Resources are released in the reverse order they were registered. Only
/// register a resource after it is successfully created.
#[derive(Debug, Default)]
pub struct Teardown {
    resources: Vec<Resource>,
    key_file: Option<KeyFile>,
    keep_resources: bool,
}

impl Teardown {
    /// Creates an empty registry.
    ///
    /// With `keep_resources` the cloud resources are left in place when the
    /// registry runs. The key file is always removed.
    pub fn new(keep_resources: bool) -> Self {
        Self {
            keep_resources,
            ..Default::default()
        }
    }

    pub fn register(&mut self, resource: Resource) {
        tracing::debug!("registered {resource:?}");
        self.resources.push(resource);
    }

    pub fn hold_key_file(&mut self, file: KeyFile) {
        self.key_file = Some(file);
    }

    /// Releases everything, recording each release in `report`.
    ///
    /// Errors do not stop the remaining releases.
    pub async fn run(self, services: &Services, report: &mut Report) {
        let Teardown {
            resources,
            key_file,
            keep_resources,
        } = self;
        for resource in resources.into_iter().rev() {
            if keep_resources {
                report.record_kept(resource.name());
                continue;
            }
            let result = match &resource {
                Resource::Subscription(name) => {
                    services.subscriptions.delete_subscription(name).await
                }
                Resource::Topic(name) => services.topics.delete_topic(name).await,
                Resource::ServiceAccount(name) => {
                    services.service_accounts.delete_service_account(name).await
                }
            };
            report.record_cleanup(resource.name(), result);
        }
        if let Some(file) = key_file {
            let path = file.path().display().to_string();
            report.record_cleanup(&path, file.close());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MockServiceAccounts, MockSubscriptions, MockTopics};
    use crate::policy::MockIamPolicyOperations;
    use crate::report::Outcome;
    use google_cloud_gax::error::Error;
    use google_cloud_gax::error::rpc::{Code, Status};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    const SA: &str = "projects/p1/serviceAccounts/test-sa@p1.iam.gserviceaccount.com";
    const TOPIC: &str = "projects/p1/topics/test-topic";
    const SUB1: &str = "projects/p1/subscriptions/test-sub";
    const SUB2: &str = "projects/p1/subscriptions/test-sub2";

    fn services(
        service_accounts: MockServiceAccounts,
        topics: MockTopics,
        subscriptions: MockSubscriptions,
    ) -> Services {
        Services {
            service_accounts: Arc::new(service_accounts),
            topics: Arc::new(topics),
            topic_policies: Arc::new(MockIamPolicyOperations::new()),
            subscriptions: Arc::new(subscriptions),
            project_policies: Arc::new(MockIamPolicyOperations::new()),
        }
    }

    fn registered(keep_resources: bool) -> Teardown {
        let mut teardown = Teardown::new(keep_resources);
        teardown.register(Resource::ServiceAccount(SA.to_string()));
        teardown.register(Resource::Topic(TOPIC.to_string()));
        teardown.register(Resource::Subscription(SUB1.to_string()));
        teardown.register(Resource::Subscription(SUB2.to_string()));
        teardown
    }

    #[tokio::test]
    async fn reverse_order() {
        let mut seq = mockall::Sequence::new();
        let mut subscriptions = MockSubscriptions::new();
        let mut topics = MockTopics::new();
        let mut service_accounts = MockServiceAccounts::new();
        subscriptions
            .expect_delete_subscription()
            .withf(|n| n == SUB2)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        subscriptions
            .expect_delete_subscription()
            .withf(|n| n == SUB1)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        topics
            .expect_delete_topic()
            .withf(|n| n == TOPIC)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        service_accounts
            .expect_delete_service_account()
            .withf(|n| n == SA)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let services = services(service_accounts, topics, subscriptions);
        let mut report = Report::new();
        registered(false).run(&services, &mut report).await;

        let released = report
            .cleanup()
            .iter()
            .map(|(r, _)| r.as_str())
            .collect::<Vec<_>>();
        assert_eq!(released, vec![SUB2, SUB1, TOPIC, SA]);
        assert!(report.clean(), "{report:?}");
    }

    #[tokio::test]
    async fn errors_do_not_stop_release() {
        let mut subscriptions = MockSubscriptions::new();
        let mut topics = MockTopics::new();
        let mut service_accounts = MockServiceAccounts::new();
        subscriptions
            .expect_delete_subscription()
            .times(2)
            .returning(|_| Ok(()));
        topics.expect_delete_topic().times(1).returning(|_| {
            Err(Error::service(
                Status::default()
                    .set_code(Code::PermissionDenied)
                    .set_message("test-only"),
            ))
        });
        service_accounts
            .expect_delete_service_account()
            .times(1)
            .returning(|_| Ok(()));

        let services = services(service_accounts, topics, subscriptions);
        let mut report = Report::new();
        registered(false).run(&services, &mut report).await;

        assert_eq!(report.cleanup().len(), 4);
        assert!(!report.clean());
        let topic = report.cleanup().iter().find(|(r, _)| r == TOPIC);
        assert!(
            matches!(
                topic,
                Some((
                    _,
                    Outcome::Failed {
                        code: Some(Code::PermissionDenied),
                        ..
                    }
                ))
            ),
            "{topic:?}"
        );
    }

    #[tokio::test]
    async fn keep_resources() {
        let mut subscriptions = MockSubscriptions::new();
        let mut topics = MockTopics::new();
        let mut service_accounts = MockServiceAccounts::new();
        subscriptions.expect_delete_subscription().never();
        topics.expect_delete_topic().never();
        service_accounts.expect_delete_service_account().never();

        let services = services(service_accounts, topics, subscriptions);
        let mut report = Report::new();
        registered(true).run(&services, &mut report).await;

        assert_eq!(report.cleanup().len(), 4);
        assert!(
            report.cleanup().iter().all(|(_, o)| *o == Outcome::Skipped),
            "{report:?}"
        );
    }

    #[tokio::test]
    async fn removes_key_file() -> anyhow::Result<()> {
        let json = serde_json::to_vec(&crate::credentials::tests::sample_json())?;
        let file = KeyFile::persist(&json)?;
        let path = file.path().to_path_buf();

        let services = services(
            MockServiceAccounts::new(),
            MockTopics::new(),
            MockSubscriptions::new(),
        );
        let mut teardown = Teardown::new(true);
        teardown.hold_key_file(file);
        let mut report = Report::new();
        teardown.run(&services, &mut report).await;

        assert!(!path.exists(), "{path:?} should be removed");
        assert!(report.clean(), "{report:?}");
        Ok(())
    }

    #[test]
    fn resource_names() {
        let resources = [
            Resource::ServiceAccount(SA.to_string()),
            Resource::Topic(TOPIC.to_string()),
            Resource::Subscription(SUB1.to_string()),
        ];
        let names = resources.iter().map(Resource::name).collect::<Vec<_>>();
        assert_eq!(names, vec![SA, TOPIC, SUB1]);
    }
}
