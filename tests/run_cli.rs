// tests/run_cli.rs

use std::error::Error;

use clap::Parser;

use sitepipe::cli::CliArgs;
use sitepipe::errors::PipelineError;
use sitepipe::lock::{OutputLock, LOCK_FILE};
use sitepipe_test_utils::fixture::{SiteFixture, FAKE_SITE_GENERATOR};
use sitepipe_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn project() -> SiteFixture {
    let site = SiteFixture::standard();
    site.write(
        "Sitepipe.toml",
        &format!(
            "[tools]\nsite_generator = '{FAKE_SITE_GENERATOR}'\npublish = 'touch published.marker'\n"
        ),
    );
    site
}

fn args(site: &SiteFixture, extra: &[&str]) -> CliArgs {
    let config = site.path("Sitepipe.toml");
    let mut argv = vec!["sitepipe", "--config", config.to_str().unwrap()];
    argv.extend_from_slice(extra);
    CliArgs::try_parse_from(argv).unwrap()
}

#[tokio::test]
async fn list_and_dry_run_touch_nothing() -> TestResult {
    init_tracing();
    let site = project();

    sitepipe::run(args(&site, &["--list"])).await?;
    sitepipe::run(args(&site, &["deploy", "--dry-run"])).await?;

    assert!(!site.exists("_site"));
    assert!(!site.exists("published.marker"));
    assert!(!site.exists(LOCK_FILE));
    Ok(())
}

#[tokio::test]
async fn named_task_runs_in_the_config_directory() -> TestResult {
    init_tracing();
    let site = project();

    with_timeout(sitepipe::run(args(&site, &["css"]))).await?;

    assert_eq!(site.read("_site/css/main.css"), "body{margin:0;color:#333}");
    // Released on exit.
    assert_eq!(site.read(LOCK_FILE), "");
    Ok(())
}

#[tokio::test]
async fn unknown_task_is_an_error() {
    init_tracing();
    let site = project();

    let err = sitepipe::run(args(&site, &["bogus"])).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::UnknownTask { name, .. }) if name == "bogus"
    ));
}

#[tokio::test]
async fn concurrent_session_is_refused() {
    init_tracing();
    let site = project();
    let _held = OutputLock::acquire(site.root()).unwrap();

    let err = sitepipe::run(args(&site, &["css"])).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::LockError { .. })
    ));
    assert!(!site.exists("_site/css/main.css"));
}

#[tokio::test]
async fn zero_port_override_is_rejected() {
    init_tracing();
    let site = project();

    let err = sitepipe::run(args(&site, &["serve", "--port", "0"])).await.unwrap_err();
    assert!(err.to_string().contains("--port"));
}

#[tokio::test]
async fn failing_task_reports_which_task_failed() {
    init_tracing();
    let site = project();
    site.write(
        "Sitepipe.toml",
        "[tools]\nsite_generator = 'exit 2'\n",
    );

    let err = with_timeout(sitepipe::run(args(&site, &["build"]))).await.unwrap_err();

    assert_eq!(err.to_string(), "task 'build' failed");
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::SubprocessError { code: 2, .. })
    ));
}
