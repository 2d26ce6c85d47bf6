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

use clap::Parser;
use topic_iam_probe::args::{Args, Settings};
use topic_iam_probe::clients::GoogleCloud;
use topic_iam_probe::credentials::ServiceAccountKeyFile;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    args.validate()?;
    let _guard = enable_tracing();
    tracing::info!("Configuration: {args:?}");

    let path = args.credentials_path()?;
    let admin_key = ServiceAccountKeyFile::from_file(&path)?;
    tracing::info!(
        "using {} from {} in project {}",
        admin_key.client_email,
        path.display(),
        admin_key.project_id
    );
    let settings = Settings::new(&args, &admin_key);

    let report = topic_iam_probe::probe::run(&GoogleCloud, &admin_key, &settings).await;
    report.log_summary();
    Ok(())
}

fn enable_tracing() -> tracing::dispatcher::DefaultGuard {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::fmt::format::FmtSpan;

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let subscriber = tracing_subscriber::fmt()
        .with_level(true)
        .with_thread_ids(true)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .finish();

    tracing::subscriber::set_default(subscriber)
}
