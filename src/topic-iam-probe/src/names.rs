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

//! Resource names, roles, scopes and permissions used by the probe.

/// OAuth scope for the Pub/Sub API.
pub const PUBSUB_SCOPE: &str = "https://www.googleapis.com/auth/pubsub";

/// OAuth scope for all Google Cloud APIs.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const ROLE_PREFIX: &str = "roles/";
const PUBSUB_ROLE_PREFIX: &str = "pubsub.";
const SERVICE_ACCOUNT_MEMBER_PREFIX: &str = "serviceAccount:";

/// Roles granted to the service account on the topic, relative to `roles/pubsub.`.
pub const TOPIC_ROLES: [&str; 1] = ["subscriber"];

/// Roles granted to the service account on the project, relative to `roles/`.
pub const PROJECT_ROLES: [&str; 1] = ["pubsub.subscriber"];

/// Permissions checked on the topic.
pub const TOPIC_PERMISSIONS: [&str; 8] = [
    "pubsub.topics.get",
    "pubsub.topics.subscribe",
    "pubsub.topics.publish",
    "pubsub.topics.update",
    "pubsub.topics.attachSubscription",
    "pubsub.topics.delete",
    "pubsub.topics.getIamPolicy",
    "pubsub.topics.setIamPolicy",
];

/// Permissions checked on the project.
pub const PROJECT_PERMISSIONS: [&str; 3] = [
    "pubsub.subscriptions.create",
    "pubsub.subscriptions.list",
    "pubsub.topics.list",
];

pub fn project_name(project_id: &str) -> String {
    format!("projects/{project_id}")
}

pub fn topic_name(project_id: &str, topic_id: &str) -> String {
    format!("projects/{project_id}/topics/{topic_id}")
}

pub fn subscription_name(project_id: &str, subscription_id: &str) -> String {
    format!("projects/{project_id}/subscriptions/{subscription_id}")
}

/// The IAM member string for a service account email.
pub fn service_account_member(email: &str) -> String {
    format!("{SERVICE_ACCOUNT_MEMBER_PREFIX}{email}")
}

/// Qualifies `role` with `roles/`, unless it already is.
pub fn role_name(role: &str) -> String {
    if role.starts_with(ROLE_PREFIX) {
        return role.to_string();
    }
    format!("{ROLE_PREFIX}{role}")
}

/// Qualifies a Pub/Sub role, e.g. `subscriber` becomes `roles/pubsub.subscriber`.
pub fn pubsub_role(role: &str) -> String {
    role_name(&format!("{PUBSUB_ROLE_PREFIX}{role}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn project() {
        assert_eq!(project_name("p1"), "projects/p1");
    }

    #[test]
    fn topic() {
        assert_eq!(topic_name("p1", "t1"), "projects/p1/topics/t1");
    }

    #[test]
    fn subscription() {
        assert_eq!(
            subscription_name("p1", "s1"),
            "projects/p1/subscriptions/s1"
        );
    }

    #[test]
    fn member() {
        assert_eq!(
            service_account_member("test-sa@p1.iam.gserviceaccount.com"),
            "serviceAccount:test-sa@p1.iam.gserviceaccount.com"
        );
    }

    #[test_case("pubsub.subscriber", "roles/pubsub.subscriber")]
    #[test_case("roles/pubsub.subscriber", "roles/pubsub.subscriber")]
    #[test_case("editor", "roles/editor")]
    fn roles(input: &str, want: &str) {
        assert_eq!(role_name(input), want);
    }

    #[test]
    fn pubsub_roles() {
        assert_eq!(pubsub_role("subscriber"), "roles/pubsub.subscriber");
        let topic = TOPIC_ROLES.map(pubsub_role);
        let project = PROJECT_ROLES.map(role_name);
        assert_eq!(topic, project, "the probe compares the same role at two scopes");
    }

    #[test]
    fn permissions() {
        assert!(
            TOPIC_PERMISSIONS
                .iter()
                .all(|p| p.starts_with("pubsub.topics.")),
            "{TOPIC_PERMISSIONS:?}"
        );
        assert!(
            PROJECT_PERMISSIONS.contains(&"pubsub.subscriptions.create"),
            "{PROJECT_PERMISSIONS:?}"
        );
    }
}
