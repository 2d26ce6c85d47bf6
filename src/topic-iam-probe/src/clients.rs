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

//! The cloud services used by the probe.
//!
//! Each trait covers the few RPCs the probe needs from one service. The
//! traits are implemented for the Google Cloud client libraries, and a
//! [Connector] produces a [Services] bundle for one set of credentials.
//! Tests implement the same traits with in-memory fakes.

use crate::credentials::ServiceAccountKeyFile;
use crate::policy::IamPolicyOperations;
use google_cloud_gax::Result;
use google_cloud_iam_admin_v1::model::{ServiceAccount, ServiceAccountKey};
use google_cloud_iam_v1::model::Policy;
use google_cloud_pubsub::model::{Subscription, Topic};
use std::sync::Arc;

/// Service accounts and their keys.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ServiceAccounts: Send + Sync {
    /// Creates a service account `account_id` in `project` (`projects/{id}`).
    async fn create_service_account(
        &self,
        project: &str,
        account_id: &str,
    ) -> Result<ServiceAccount>;

    /// Deletes the service account `name`.
    async fn delete_service_account(&self, name: &str) -> Result<()>;

    /// Creates a key for the service account `name`.
    ///
    /// The key's private key data is a service account key file.
    async fn create_service_account_key(&self, name: &str) -> Result<ServiceAccountKey>;
}

/// Pub/Sub topics.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Topics: Send + Sync {
    async fn create_topic(&self, name: &str) -> Result<Topic>;
    async fn delete_topic(&self, name: &str) -> Result<()>;
}

/// Pub/Sub subscriptions.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Subscriptions: Send + Sync {
    /// Creates the subscription `name`, attached to `topic`.
    async fn create_subscription(&self, name: &str, topic: &str) -> Result<Subscription>;
    async fn delete_subscription(&self, name: &str) -> Result<()>;
}

/// The services available to one principal.
#[derive(Clone)]
pub struct Services {
    pub service_accounts: Arc<dyn ServiceAccounts>,
    pub topics: Arc<dyn Topics>,
    pub topic_policies: Arc<dyn IamPolicyOperations>,
    pub subscriptions: Arc<dyn Subscriptions>,
    pub project_policies: Arc<dyn IamPolicyOperations>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

/// Creates [Services] authenticated as a service account.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// Authenticates with `key`, requesting only `scopes`.
    async fn connect(&self, key: &ServiceAccountKeyFile, scopes: &[&str])
    -> crate::Result<Services>;
}

/// Connects to the Google Cloud services.
#[derive(Clone, Debug, Default)]
pub struct GoogleCloud;

#[async_trait::async_trait]
impl Connector for GoogleCloud {
    async fn connect(
        &self,
        key: &ServiceAccountKeyFile,
        scopes: &[&str],
    ) -> crate::Result<Services> {
        use google_cloud_iam_admin_v1::client::Iam;
        use google_cloud_pubsub::client::{SchemaService, SubscriptionAdmin, TopicAdmin};
        use google_cloud_resourcemanager_v3::client::Projects;

        let credentials = key.credentials(scopes)?;
        tracing::info!("connecting as {} with scopes {scopes:?}", key.principal());
        let iam = Iam::builder()
            .with_credentials(credentials.clone())
            .with_tracing()
            .build()
            .await?;
        let topics = TopicAdmin::builder()
            .with_credentials(credentials.clone())
            .with_tracing()
            .build()
            .await?;
        let topic_policies = SchemaService::builder()
            .with_credentials(credentials.clone())
            .with_tracing()
            .build()
            .await?;
        let subscriptions = SubscriptionAdmin::builder()
            .with_credentials(credentials.clone())
            .with_tracing()
            .build()
            .await?;
        let projects = Projects::builder()
            .with_credentials(credentials)
            .with_tracing()
            .build()
            .await?;
        Ok(Services {
            service_accounts: Arc::new(iam),
            topics: Arc::new(topics),
            topic_policies: Arc::new(topic_policies),
            subscriptions: Arc::new(subscriptions),
            project_policies: Arc::new(projects),
        })
    }
}

#[async_trait::async_trait]
impl ServiceAccounts for google_cloud_iam_admin_v1::client::Iam {
    async fn create_service_account(
        &self,
        project: &str,
        account_id: &str,
    ) -> Result<ServiceAccount> {
        self.create_service_account()
            .set_name(project)
            .set_account_id(account_id)
            .set_service_account(ServiceAccount::new().set_display_name(account_id))
            .send()
            .await
    }

    async fn delete_service_account(&self, name: &str) -> Result<()> {
        self.delete_service_account().set_name(name).send().await
    }

    async fn create_service_account_key(&self, name: &str) -> Result<ServiceAccountKey> {
        self.create_service_account_key()
            .set_name(name)
            .send()
            .await
    }
}

#[async_trait::async_trait]
impl Topics for google_cloud_pubsub::client::TopicAdmin {
    async fn create_topic(&self, name: &str) -> Result<Topic> {
        self.create_topic().set_name(name).send().await
    }

    async fn delete_topic(&self, name: &str) -> Result<()> {
        self.delete_topic().set_topic(name).send().await
    }
}

// The Pub/Sub IAM methods are only exposed on the schema service client.
// They accept any Pub/Sub resource name, topics included.
#[async_trait::async_trait]
impl IamPolicyOperations for google_cloud_pubsub::client::SchemaService {
    async fn get_iam_policy(&self, resource: &str) -> Result<Policy> {
        self.get_iam_policy().set_resource(resource).send().await
    }

    async fn set_iam_policy(&self, resource: &str, policy: Policy) -> Result<Policy> {
        self.set_iam_policy()
            .set_resource(resource)
            .set_policy(policy)
            .send()
            .await
    }

    async fn test_iam_permissions(
        &self,
        resource: &str,
        permissions: Vec<String>,
    ) -> Result<Vec<String>> {
        self.test_iam_permissions()
            .set_resource(resource)
            .set_permissions(permissions)
            .send()
            .await
            .map(|r| r.permissions)
    }
}

#[async_trait::async_trait]
impl Subscriptions for google_cloud_pubsub::client::SubscriptionAdmin {
    async fn create_subscription(&self, name: &str, topic: &str) -> Result<Subscription> {
        self.create_subscription()
            .set_name(name)
            .set_topic(topic)
            .send()
            .await
    }

    async fn delete_subscription(&self, name: &str) -> Result<()> {
        self.delete_subscription()
            .set_subscription(name)
            .send()
            .await
    }
}

#[async_trait::async_trait]
impl IamPolicyOperations for google_cloud_resourcemanager_v3::client::Projects {
    async fn get_iam_policy(&self, resource: &str) -> Result<Policy> {
        self.get_iam_policy().set_resource(resource).send().await
    }

    async fn set_iam_policy(&self, resource: &str, policy: Policy) -> Result<Policy> {
        self.set_iam_policy()
            .set_resource(resource)
            .set_policy(policy)
            .send()
            .await
    }

    async fn test_iam_permissions(
        &self,
        resource: &str,
        permissions: Vec<String>,
    ) -> Result<Vec<String>> {
        self.test_iam_permissions()
            .set_resource(resource)
            .set_permissions(permissions)
            .send()
            .await
            .map(|r| r.permissions)
    }
}
