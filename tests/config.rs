// tests/config.rs

use std::error::Error;
use std::path::PathBuf;
use std::str::FromStr;

use sitepipe::config::{default_watch_rules, load_and_validate, load_optional};
use sitepipe::errors::PipelineError;
use sitepipe::types::RebuildPolicy;
use sitepipe_test_utils::builders::ConfigFileBuilder;
use sitepipe_test_utils::fixture::SiteFixture;

type TestResult = Result<(), Box<dyn Error>>;

fn config_error(builder: ConfigFileBuilder) -> String {
    match builder.try_build() {
        Err(PipelineError::ConfigError(msg)) => msg,
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn full_config_file_is_parsed() -> TestResult {
    let site = SiteFixture::empty();
    site.write(
        "Sitepipe.toml",
        r#"
[site]
output = "public"

[tools]
site_generator = "hugo"
js_minifier = "terser --compress"

[css]
browsers = ["last 2 versions"]

[html]
remove_optional_tags = false

[manifest]
cache_id = "blog"
deploy_exclude = ["/404.html", "/drafts.html"]

[serve]
port = 4000
debounce_ms = 0
rebuild_policy = "latest"

[[watch]]
patterns = ["src/**/*.js"]
tasks = ["scripts"]

[task.lint]
cmd = "eslint _scripts"
after = ["scripts"]
description = "Lint scripts"
"#,
    );

    let cfg = load_and_validate(site.path("Sitepipe.toml"))?;

    assert_eq!(cfg.site.output, PathBuf::from("public"));
    assert_eq!(cfg.tools.site_generator, "hugo");
    assert_eq!(cfg.tools.js_minifier.as_deref(), Some("terser --compress"));
    assert_eq!(cfg.tools.publish, "firebase deploy");
    assert_eq!(cfg.css.browsers, vec!["last 2 versions"]);
    assert!(!cfg.html.options.remove_optional_tags);
    assert!(cfg.html.options.remove_comments);
    assert_eq!(cfg.manifest.cache_id, "blog");
    assert_eq!(cfg.manifest.file, "sw.js");
    assert_eq!(cfg.manifest.deploy_exclude.len(), 2);
    assert_eq!(cfg.serve.port, 4000);
    assert_eq!(cfg.serve.debounce_ms, 0);
    assert_eq!(cfg.serve.rebuild_policy, RebuildPolicy::Latest);
    assert_eq!(cfg.watch.len(), 1);
    assert_eq!(cfg.watch[0].tasks, vec!["scripts"]);

    let lint = &cfg.task["lint"];
    assert_eq!(lint.cmd, "eslint _scripts");
    assert_eq!(lint.after, vec!["scripts"]);
    assert_eq!(lint.description.as_deref(), Some("Lint scripts"));
    Ok(())
}

#[test]
fn empty_file_means_stock_pipeline() -> TestResult {
    let site = SiteFixture::empty();
    site.write("Sitepipe.toml", "");

    let cfg = load_and_validate(site.path("Sitepipe.toml"))?;

    assert_eq!(cfg.site.output, PathBuf::from("_site"));
    assert_eq!(cfg.serve.port, 3000);
    assert_eq!(cfg.serve.rebuild_policy, RebuildPolicy::Queue);
    assert_eq!(cfg.scripts.bundle, "main.min.js");
    assert_eq!(cfg.scripts.dest, PathBuf::from("scripts"));
    assert_eq!(cfg.css.dest, PathBuf::from("css"));
    assert_eq!(cfg.html.sources, vec!["**/*.html"]);
    assert_eq!(cfg.watch, default_watch_rules());
    assert!(cfg.task.is_empty());
    Ok(())
}

#[test]
fn missing_optional_file_falls_back_to_defaults() -> TestResult {
    let site = SiteFixture::empty();
    let cfg = load_optional(site.path("Sitepipe.toml"))?;
    assert_eq!(cfg.tools.site_generator, "jekyll build");
    Ok(())
}

#[test]
fn explicit_missing_file_is_an_io_error() {
    let site = SiteFixture::empty();
    let err = load_and_validate(site.path("nope.toml")).unwrap_err();
    assert!(matches!(err, PipelineError::IoError(_)));
}

#[test]
fn unknown_rebuild_policy_is_a_parse_error() {
    let site = SiteFixture::empty();
    site.write("Sitepipe.toml", "[serve]\nrebuild_policy = \"sometimes\"\n");
    let err = load_and_validate(site.path("Sitepipe.toml")).unwrap_err();
    assert!(matches!(err, PipelineError::TomlError(_)));
}

#[test]
fn output_directory_must_be_a_project_subdirectory() {
    for bad in ["", "/var/www", "../public", "public/../..", "."] {
        let msg = config_error(ConfigFileBuilder::new().with_output(bad));
        assert!(msg.contains("[site].output"), "{bad:?}: {msg}");
    }
    assert!(ConfigFileBuilder::new().with_output("build/site").try_build().is_ok());
}

#[test]
fn step_destinations_must_stay_inside_the_output_directory() {
    for bad in ["/srv/css", "../css", "css/../../up"] {
        let mut raw = ConfigFileBuilder::new().raw();
        raw.css.dest = PathBuf::from(bad);
        let err = sitepipe::config::ConfigFile::try_from(raw).unwrap_err();
        assert!(
            matches!(&err, PipelineError::ConfigError(msg) if msg.contains("[css].dest")),
            "{bad:?}: {err:?}"
        );
    }

    let mut raw = ConfigFileBuilder::new().raw();
    raw.images.dest = PathBuf::from("/tmp/images");
    let err = sitepipe::config::ConfigFile::try_from(raw).unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(msg) if msg.contains("[images].dest")));

    let mut raw = ConfigFileBuilder::new().raw();
    raw.html.sources = vec!["**/*.html".to_string(), "!../drafts/*.html".to_string()];
    let err = sitepipe::config::ConfigFile::try_from(raw).unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(msg) if msg.contains("[html].sources")));

    let mut raw = ConfigFileBuilder::new().raw();
    raw.scripts.dest = PathBuf::from("assets/js");
    assert!(sitepipe::config::ConfigFile::try_from(raw).is_ok());
}

#[test]
fn port_zero_is_rejected() {
    let msg = config_error(ConfigFileBuilder::new().with_port(0));
    assert!(msg.contains("port"));
}

#[test]
fn invalid_globs_are_rejected() {
    let mut raw = ConfigFileBuilder::new().raw();
    raw.css.sources = vec!["css/[".to_string()];
    let err = sitepipe::config::ConfigFile::try_from(raw).unwrap_err();
    assert!(matches!(err, PipelineError::MatchError { pattern, .. } if pattern == "css/["));
}

#[test]
fn watch_rules_need_patterns_and_tasks() {
    let msg = config_error(ConfigFileBuilder::new().with_watch_rule(&["*.md"], &[]));
    assert!(msg.contains("no tasks"));

    let msg = config_error(ConfigFileBuilder::new().with_watch_rule(&[], &["scripts"]));
    assert!(msg.contains("no patterns"));
}

#[test]
fn custom_tasks_need_a_command_and_no_self_dependency() {
    let msg = config_error(ConfigFileBuilder::new().with_task("lint", "  ", &[]));
    assert!(msg.contains("empty `cmd`"));

    let msg = config_error(ConfigFileBuilder::new().with_task("lint", "eslint", &["lint"]));
    assert!(msg.contains("itself"));
}

#[test]
fn blank_bundle_name_is_rejected() {
    let mut raw = ConfigFileBuilder::new().raw();
    raw.scripts.bundle = " ".to_string();
    let err = sitepipe::config::ConfigFile::try_from(raw).unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(msg) if msg.contains("bundle")));
}

#[test]
fn rebuild_policy_parses_from_strings() {
    assert_eq!(RebuildPolicy::from_str("Queue"), Ok(RebuildPolicy::Queue));
    assert_eq!(RebuildPolicy::from_str(" latest "), Ok(RebuildPolicy::Latest));
    assert!(RebuildPolicy::from_str("newest").is_err());
}
