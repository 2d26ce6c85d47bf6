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

//! Demonstrates a Pub/Sub IAM limitation.
//!
//! A service account holding `roles/pubsub.subscriber` on a single topic
//! cannot create a subscription attached to that topic. The same service
//! account can create the subscription once it holds the role on the
//! project.
//!
//! The [probe::run] function provisions a service account, a topic, a key and
//! the IAM bindings needed to show this, records the outcome of each step in
//! a [report::Report], and releases everything it created before returning.
//!
//! All the calls go through the traits in [clients], so the same sequence can
//! run against the Google Cloud services or against an in-memory fake.

pub mod args;
pub mod clients;
pub mod credentials;
mod error;
pub mod key_file;
pub mod names;
pub mod policy;
pub mod probe;
pub mod report;
pub mod teardown;

pub use error::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
