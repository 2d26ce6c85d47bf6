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

//! Read-modify-write updates for IAM policies.
//!
//! Topics and projects expose the same three IAM methods, and both return a
//! [`Policy`] from `google-cloud-iam-v1`. The helpers in this module work for
//! either resource through the [`IamPolicyOperations`] trait.
//!
//! # Algorithm
//!
//! 1. Get the current policy (`get_iam_policy`)
//! 2. Add the member to the binding for the role, creating the binding if needed
//! 3. Set the updated policy (`set_iam_policy`), sending back the etag from step 1
//!
//! There is no retry loop. The probe is the only writer for the resources it
//! creates, and a concurrent change to the project policy surfaces as an
//! `ABORTED` error from step 3.

use google_cloud_gax::Result;
use google_cloud_iam_v1::model::{Binding, Policy};

/// IAM policy methods shared by topics and projects.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait IamPolicyOperations: Send + Sync {
    /// Gets the current IAM policy for `resource`.
    async fn get_iam_policy(&self, resource: &str) -> Result<Policy>;

    /// Replaces the IAM policy for `resource`.
    async fn set_iam_policy(&self, resource: &str, policy: Policy) -> Result<Policy>;

    /// Returns the subset of `permissions` the caller holds on `resource`.
    async fn test_iam_permissions(
        &self,
        resource: &str,
        permissions: Vec<String>,
    ) -> Result<Vec<String>>;
}

/// Adds `member` to the binding for `role`.
///
/// Only bindings without a condition are considered. If no such binding
/// exists a new one is appended with `member` as its only member. Returns
/// `false` if `member` already had the role.
pub fn add_member(policy: &mut Policy, role: &str, member: &str) -> bool {
    let existing = policy
        .bindings
        .iter_mut()
        .find(|b| b.role == role && b.condition.is_none());
    match existing {
        Some(binding) if binding.members.iter().any(|m| m == member) => false,
        Some(binding) => {
            binding.members.push(member.to_string());
            true
        }
        None => {
            policy
                .bindings
                .push(Binding::new().set_role(role).set_members([member]));
            true
        }
    }
}

/// Grants `role` to `member` on `resource`.
pub async fn grant_role<C>(client: &C, resource: &str, role: &str, member: &str) -> Result<Policy>
where
    C: IamPolicyOperations + ?Sized,
{
    let mut policy = client.get_iam_policy(resource).await?;
    if !add_member(&mut policy, role, member) {
        tracing::info!("{member} already holds {role} on {resource}");
        return Ok(policy);
    }
    let policy = client.set_iam_policy(resource, policy).await?;
    tracing::info!("granted {role} to {member} on {resource}");
    Ok(policy)
}

/// Grants each role in `roles` to `member` on `resource`.
///
/// Stops at the first error.
pub async fn grant_roles<C, I, S>(
    client: &C,
    resource: &str,
    roles: I,
    member: &str,
) -> Result<Policy>
where
    C: IamPolicyOperations + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut policy = None;
    for role in roles {
        policy = Some(grant_role(client, resource, role.as_ref(), member).await?);
    }
    match policy {
        Some(p) => Ok(p),
        None => client.get_iam_policy(resource).await,
    }
}

/// Returns the permissions in `permissions` that the caller holds on `resource`.
pub async fn test_permissions<C, I, S>(
    client: &C,
    resource: &str,
    permissions: I,
) -> Result<Vec<String>>
where
    C: IamPolicyOperations + ?Sized,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let permissions = permissions.into_iter().map(Into::into).collect();
    let allowed = client.test_iam_permissions(resource, permissions).await?;
    for permission in &allowed {
        tracing::info!("Allowed: {permission}");
    }
    Ok(allowed)
}
