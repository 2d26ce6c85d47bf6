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

//! The probe sequence.
//!
//! The administrator creates a service account, a topic and a key, and
//! grants the service account `roles/pubsub.subscriber` on the topic. The
//! service account then tries to create a subscription, which fails. After
//! the administrator grants the same role on the project, the service
//! account creates a second subscription, which succeeds.
//!
//! Steps that create something later steps need stop the sequence when they
//! fail. All other failures are recorded and the sequence continues. The
//! resources created so far are always released.

use crate::Error;
use crate::args::Settings;
use crate::clients::{Connector, Services};
use crate::credentials::ServiceAccountKeyFile;
use crate::key_file::{KeyFile, decode_private_key_data};
use crate::names::{
    CLOUD_PLATFORM_SCOPE, PROJECT_PERMISSIONS, PROJECT_ROLES, PUBSUB_SCOPE, TOPIC_PERMISSIONS,
    TOPIC_ROLES, pubsub_role, role_name, service_account_member,
};
use crate::policy::{grant_roles, test_permissions};
use crate::report::{Describe, Report, Step};
use crate::teardown::{Resource, Teardown};
use std::future::Future;
use tracing::Instrument;

/// The scopes requested for the administrator.
pub const ADMIN_SCOPES: [&str; 2] = [PUBSUB_SCOPE, CLOUD_PLATFORM_SCOPE];

/// The scopes requested for the service account while it only holds the
/// topic role.
pub const TOPIC_SCOPES: [&str; 1] = [PUBSUB_SCOPE];

/// The scopes requested for the service account after the project grant.
pub const PROJECT_SCOPES: [&str; 2] = [PUBSUB_SCOPE, CLOUD_PLATFORM_SCOPE];

/// Runs the probe with the administrator's `admin_key`.
///
/// Returns the outcome of every step. Every step has an outcome, steps that
/// did not run are marked as skipped.
pub async fn run<C>(connector: &C, admin_key: &ServiceAccountKeyFile, settings: &Settings) -> Report
where
    C: Connector + ?Sized,
{
    let mut report = Report::new();
    let admin = step(
        &mut report,
        Step::ConnectAdmin,
        connector.connect(admin_key, &ADMIN_SCOPES),
    )
    .await;
    if let Some(admin) = admin {
        let mut teardown = Teardown::new(settings.keep_resources);
        provision(connector, &admin, settings, &mut teardown, &mut report).await;
        teardown
            .run(&admin, &mut report)
            .instrument(tracing::info_span!("teardown"))
            .await;
    }
    report.finish();
    report
}

async fn provision<C>(
    connector: &C,
    admin: &Services,
    settings: &Settings,
    teardown: &mut Teardown,
    report: &mut Report,
) where
    C: Connector + ?Sized,
{
    let project_name = settings.project_name();
    let topic_name = settings.topic_name();

    let Some(account) = step(
        report,
        Step::CreateServiceAccount,
        admin
            .service_accounts
            .create_service_account(&project_name, &settings.service_account_id),
    )
    .await
    else {
        return;
    };
    teardown.register(Resource::ServiceAccount(account.name.clone()));
    let member = service_account_member(&account.email);

    let Some(topic) = step(
        report,
        Step::CreateTopic,
        admin.topics.create_topic(&topic_name),
    )
    .await
    else {
        return;
    };
    teardown.register(Resource::Topic(topic.name.clone()));

    let granted = step(
        report,
        Step::GrantTopicRole,
        grant_roles(
            admin.topic_policies.as_ref(),
            &topic.name,
            TOPIC_ROLES.map(pubsub_role),
            &member,
        ),
    )
    .await;
    if granted.is_some() {
        wait_for_propagation(settings).await;
    }

    let Some(key_file) = step(
        report,
        Step::CreateKey,
        create_key_file(admin, &account.name),
    )
    .await
    else {
        return;
    };
    let key = key_file.key().clone();
    teardown.hold_key_file(key_file);

    let Some(with_topic_role) = step(
        report,
        Step::ConnectWithTopicRole,
        connector.connect(&key, &TOPIC_SCOPES),
    )
    .await
    else {
        return;
    };

    step(
        report,
        Step::TestTopicPermissions,
        test_permissions(
            with_topic_role.topic_policies.as_ref(),
            &topic.name,
            TOPIC_PERMISSIONS,
        ),
    )
    .await;

    let subscription = step(
        report,
        Step::CreateSubscriptionWithTopicRole,
        with_topic_role
            .subscriptions
            .create_subscription(&settings.subscription_name(), &topic.name),
    )
    .await;
    if let Some(s) = subscription {
        teardown.register(Resource::Subscription(s.name));
    }

    let Some(with_project_role) = step(
        report,
        Step::ConnectWithProjectScope,
        connector.connect(&key, &PROJECT_SCOPES),
    )
    .await
    else {
        return;
    };

    let granted = step(
        report,
        Step::GrantProjectRole,
        grant_roles(
            admin.project_policies.as_ref(),
            &project_name,
            PROJECT_ROLES.map(role_name),
            &member,
        ),
    )
    .await;
    if granted.is_some() {
        wait_for_propagation(settings).await;
    }

    step(
        report,
        Step::TestProjectPermissions,
        test_permissions(
            with_project_role.project_policies.as_ref(),
            &project_name,
            PROJECT_PERMISSIONS,
        ),
    )
    .await;

    let subscription = step(
        report,
        Step::CreateSubscriptionWithProjectRole,
        with_project_role
            .subscriptions
            .create_subscription(&settings.second_subscription_name(), &topic.name),
    )
    .await;
    if let Some(s) = subscription {
        teardown.register(Resource::Subscription(s.name));
    }
}

/// Runs `action` in a span for `step` and records its outcome.
async fn step<F, T, E>(report: &mut Report, step: Step, action: F) -> Option<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    T: Describe,
    E: Into<Error>,
{
    let span = tracing::info_span!("step", step = step.name());
    let result = action.instrument(span.clone()).await;
    span.in_scope(|| {
        let value = report.record(step, result);
        if value.is_none() && step.is_prerequisite() {
            tracing::warn!("cannot continue without {step}, skipping the remaining steps");
        }
        value
    })
}

/// Creates a key for `account` and saves it to a temporary file.
async fn create_key_file(admin: &Services, account: &str) -> crate::Result<KeyFile> {
    let key = admin
        .service_accounts
        .create_service_account_key(account)
        .await?;
    tracing::info!("created key {}", key.name);
    let contents = decode_private_key_data(&key.private_key_data)?;
    KeyFile::persist(&contents)
}

async fn wait_for_propagation(settings: &Settings) {
    if settings.propagation_delay.is_zero() {
        return;
    }
    tracing::info!(
        "waiting {} for the IAM change to propagate",
        humantime::format_duration(settings.propagation_delay)
    );
    tokio::time::sleep(settings.propagation_delay).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MockServiceAccounts, MockSubscriptions, MockTopics};
    use crate::credentials::tests::sample_json;
    use crate::policy::MockIamPolicyOperations;
    use crate::report::Outcome;
    use google_cloud_gax::error::rpc::{Code, Status};
    use google_cloud_iam_admin_v1::model::ServiceAccount;
    use std::sync::Arc;
    use std::time::Duration;

    fn settings() -> Settings {
        Settings {
            project_id: "p1".to_string(),
            service_account_id: "test-sa".to_string(),
            topic_id: "test-topic".to_string(),
            subscription_id: "test-sub".to_string(),
            keep_resources: false,
            propagation_delay: Duration::ZERO,
        }
    }

    fn admin_key() -> anyhow::Result<ServiceAccountKeyFile> {
        Ok(serde_json::from_value(sample_json())?)
    }

    fn service_error(code: Code) -> google_cloud_gax::error::Error {
        google_cloud_gax::error::Error::service(
            Status::default().set_code(code).set_message("test-only"),
        )
    }

    struct FailingConnector;

    #[async_trait::async_trait]
    impl Connector for FailingConnector {
        async fn connect(
            &self,
            _key: &ServiceAccountKeyFile,
            _scopes: &[&str],
        ) -> crate::Result<Services> {
            Err(Error::from(service_error(Code::Unauthenticated)))
        }
    }

    struct SingleConnector(Services);

    #[async_trait::async_trait]
    impl Connector for SingleConnector {
        async fn connect(
            &self,
            key: &ServiceAccountKeyFile,
            scopes: &[&str],
        ) -> crate::Result<Services> {
            assert_eq!(key.client_email, "admin@p1.iam.gserviceaccount.com");
            assert_eq!(scopes, ADMIN_SCOPES);
            Ok(self.0.clone())
        }
    }

    #[test]
    fn scopes() {
        assert_eq!(TOPIC_SCOPES, [PUBSUB_SCOPE]);
        assert!(PROJECT_SCOPES.contains(&CLOUD_PLATFORM_SCOPE));
    }

    #[tokio::test]
    async fn admin_connect_fails() -> anyhow::Result<()> {
        let report = run(&FailingConnector, &admin_key()?, &settings()).await;
        assert!(
            matches!(
                report.outcome(Step::ConnectAdmin),
                Some(Outcome::Failed {
                    code: Some(Code::Unauthenticated),
                    ..
                })
            ),
            "{report:?}"
        );
        assert!(
            Step::ALL[1..]
                .iter()
                .all(|s| report.outcome(*s) == Some(&Outcome::Skipped)),
            "{report:?}"
        );
        assert!(report.cleanup().is_empty(), "{report:?}");
        Ok(())
    }

    #[tokio::test]
    async fn topic_create_fails() -> anyhow::Result<()> {
        const SA: &str = "projects/p1/serviceAccounts/test-sa@p1.iam.gserviceaccount.com";
        let mut service_accounts = MockServiceAccounts::new();
        service_accounts
            .expect_create_service_account()
            .withf(|p, id| p == "projects/p1" && id == "test-sa")
            .times(1)
            .returning(|_, _| {
                Ok(ServiceAccount::new()
                    .set_name(SA)
                    .set_email("test-sa@p1.iam.gserviceaccount.com"))
            });
        service_accounts
            .expect_delete_service_account()
            .withf(|n| n == SA)
            .times(1)
            .returning(|_| Ok(()));
        service_accounts.expect_create_service_account_key().never();
        let mut topics = MockTopics::new();
        topics
            .expect_create_topic()
            .times(1)
            .returning(|_| Err(service_error(Code::AlreadyExists)));
        topics.expect_delete_topic().never();
        let services = Services {
            service_accounts: Arc::new(service_accounts),
            topics: Arc::new(topics),
            topic_policies: Arc::new(MockIamPolicyOperations::new()),
            subscriptions: Arc::new(MockSubscriptions::new()),
            project_policies: Arc::new(MockIamPolicyOperations::new()),
        };

        let report = run(&SingleConnector(services), &admin_key()?, &settings()).await;
        assert!(
            matches!(
                report.outcome(Step::CreateServiceAccount),
                Some(Outcome::Succeeded(_))
            ),
            "{report:?}"
        );
        assert!(
            matches!(
                report.outcome(Step::CreateTopic),
                Some(Outcome::Failed {
                    code: Some(Code::AlreadyExists),
                    ..
                })
            ),
            "{report:?}"
        );
        assert!(
            Step::ALL[3..]
                .iter()
                .all(|s| report.outcome(*s) == Some(&Outcome::Skipped)),
            "{report:?}"
        );
        let released = report
            .cleanup()
            .iter()
            .map(|(r, _)| r.as_str())
            .collect::<Vec<_>>();
        assert_eq!(released, vec![SA]);
        assert!(!report.demonstrated());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn propagation_delay() {
        let mut settings = settings();
        settings.propagation_delay = Duration::from_secs(60);
        let start = tokio::time::Instant::now();
        wait_for_propagation(&settings).await;
        assert!(start.elapsed() >= Duration::from_secs(60));
    }
}
