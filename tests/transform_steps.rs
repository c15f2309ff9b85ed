// tests/transform_steps.rs

use std::error::Error;
use std::fs;

use sitepipe::errors::PipelineError;
use sitepipe::transform::{
    CssProcessor, ExternalTool, ImageOptimizer, ScriptBundler, StepKind, TransformSpec,
};
use sitepipe_test_utils::fixture::SiteFixture;
use sitepipe_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn spec(step: StepKind, sources: &[&str], base: &str, dest: &str) -> TransformSpec {
    TransformSpec {
        step,
        sources: sources.iter().map(|s| s.to_string()).collect(),
        base: base.into(),
        dest: dest.into(),
    }
}

fn tool(cmd: &str) -> Option<ExternalTool> {
    Some(ExternalTool::new(cmd))
}

#[test]
fn scripts_are_bundled_in_source_order() -> TestResult {
    init_tracing();
    let site = SiteFixture::empty();
    site.write("_scripts/a.js", "var a = 1;\n");
    site.write("_scripts/b.js", "var b = 2;\n");

    let step = StepKind::Scripts(ScriptBundler::new("bundle.js"));
    let result = spec(step, &["_scripts/b.js", "_scripts/*.js"], "out", "out").run(site.root())?;
    let written = result.into_result("scripts")?;

    assert_eq!(written.len(), 1);
    assert_eq!(site.read("out/bundle.js"), "var b=2;var a=1;");
    Ok(())
}

#[test]
fn configured_minifier_replaces_builtin_compaction() -> TestResult {
    init_tracing();
    let site = SiteFixture::empty();
    site.write("_scripts/main.js", "var a = 1;\n");

    let bundler = ScriptBundler::new("main.min.js").with_tools(None, tool("tr a-z A-Z"));
    spec(StepKind::Scripts(bundler), &["_scripts/main.js"], "out", "out")
        .run(site.root())?
        .into_result("scripts")?;

    assert_eq!(site.read("out/main.min.js"), "VAR A = 1;\n");
    Ok(())
}

#[test]
fn compiler_runs_before_minification() -> TestResult {
    init_tracing();
    let site = SiteFixture::empty();
    site.write("_scripts/main.js", "let   a = 1;\n");

    let bundler = ScriptBundler::new("main.min.js").with_tools(tool("sed s/let/var/"), None);
    spec(StepKind::Scripts(bundler), &["_scripts/main.js"], "out", "out")
        .run(site.root())?
        .into_result("scripts")?;

    assert_eq!(site.read("out/main.min.js"), "var a=1;");
    Ok(())
}

#[test]
fn failing_compiler_fails_every_contributing_file() -> TestResult {
    init_tracing();
    let site = SiteFixture::empty();
    site.write("_scripts/a.js", "a();\n");
    site.write("_scripts/b.js", "b();\n");

    let bundler = ScriptBundler::new("main.min.js")
        .with_tools(tool("cat >/dev/null; echo broken >&2; exit 3"), None);
    let result = spec(StepKind::Scripts(bundler), &["_scripts/*.js"], "out", "out")
        .run(site.root())?;

    assert_eq!(result.errors.len(), 2);
    assert!(result.errors[0].message.contains("exited with code 3"));
    assert!(result.errors[0].message.contains("broken"));
    assert!(!site.exists("out/main.min.js"));

    match result.into_result("scripts") {
        Err(PipelineError::TransformError { step, failures }) => {
            assert_eq!(step, "scripts");
            assert_eq!(failures.len(), 2);
        }
        other => panic!("expected TransformError, got {other:?}"),
    }
    Ok(())
}

#[test]
fn no_script_sources_means_no_bundle() -> TestResult {
    init_tracing();
    let site = SiteFixture::empty();

    let result = spec(
        StepKind::Scripts(ScriptBundler::new("main.min.js")),
        &["_scripts/*.js"],
        "out",
        "out",
    )
    .run(site.root())?;

    assert!(result.is_success());
    assert!(result.written.is_empty());
    assert!(!site.exists("out/main.min.js"));
    Ok(())
}

#[test]
fn stylesheets_mirror_their_directory_layout() -> TestResult {
    init_tracing();
    let site = SiteFixture::empty();
    site.write("css/main.css", "body {\n  margin: 0;\n}\n");
    site.write("css/pages/about.css", "h1 { color: red; }\n");

    let written = spec(
        StepKind::Css(CssProcessor::default()),
        &["css/**/*.css"],
        "css",
        "_site/css",
    )
    .run(site.root())?
    .into_result("css")?;

    assert_eq!(written.len(), 2);
    assert_eq!(site.read("_site/css/main.css"), "body{margin:0}");
    assert_eq!(site.read("_site/css/pages/about.css"), "h1{color:red}");
    Ok(())
}

#[test]
fn prefixer_sees_the_browser_list() -> TestResult {
    init_tracing();
    let site = SiteFixture::empty();
    site.write("css/main.css", ".a { x: y }\n");

    let css = CssProcessor::new(vec!["last 2 versions".to_string(), "ie >= 11".to_string()])
        .with_tools(tool("cat; printf '.b{content:\"%s\"}' \"$BROWSERSLIST\""), None);
    spec(StepKind::Css(css), &["css/main.css"], "css", "_site/css")
        .run(site.root())?
        .into_result("css")?;

    assert_eq!(
        site.read("_site/css/main.css"),
        ".a{x:y}.b{content:\"last 2 versions, ie >= 11\"}"
    );
    Ok(())
}

#[test]
fn one_broken_stylesheet_does_not_stop_the_others() -> TestResult {
    init_tracing();
    let site = SiteFixture::empty();
    site.write("css/a.css", "BROKEN\n");
    site.write("css/b.css", ".b { c: d }\n");

    let minifier = "input=$(cat); case \"$input\" in *BROKEN*) exit 1;; esac; printf '%s' \"$input\"";
    let css = CssProcessor::default().with_tools(None, tool(minifier));
    let result = spec(StepKind::Css(css), &["css/*.css"], "css", "_site/css").run(site.root())?;

    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].path.ends_with("css/a.css"));
    assert_eq!(result.written.len(), 1);
    // `$(cat)` drops the trailing newline.
    assert_eq!(site.read("_site/css/b.css"), ".b { c: d }");
    assert!(!site.exists("_site/css/a.css"));
    Ok(())
}

#[test]
fn images_are_copied_without_an_optimizer() -> TestResult {
    init_tracing();
    let site = SiteFixture::empty();
    site.write("images/logo.png", "PNGDATA");
    site.write("images/icons/star.gif", "GIFDATA");

    let written = spec(
        StepKind::Images(ImageOptimizer::default()),
        &["images/**/*"],
        "images",
        "_site/images",
    )
    .run(site.root())?
    .into_result("minify-images")?;

    assert_eq!(written.len(), 2);
    assert_eq!(site.read("_site/images/logo.png"), "PNGDATA");
    assert_eq!(site.read("_site/images/icons/star.gif"), "GIFDATA");
    Ok(())
}

#[test]
fn smaller_optimizer_output_wins() -> TestResult {
    init_tracing();
    let site = SiteFixture::empty();
    site.write("images/logo.png", "0123456789");

    let images = ImageOptimizer::new(true, false).with_tool(tool(
        "cat >/dev/null; printf '%s%s' \"$SITEPIPE_PROGRESSIVE\" \"$SITEPIPE_INTERLACED\"",
    ));
    spec(StepKind::Images(images), &["images/*"], "images", "_site/images")
        .run(site.root())?
        .into_result("minify-images")?;

    assert_eq!(site.read("_site/images/logo.png"), "10");
    Ok(())
}

#[test]
fn larger_optimizer_output_keeps_the_original() -> TestResult {
    init_tracing();
    let site = SiteFixture::empty();
    site.write("images/logo.png", "tiny");

    let images = ImageOptimizer::default().with_tool(tool("cat; printf padding"));
    spec(StepKind::Images(images), &["images/*"], "images", "_site/images")
        .run(site.root())?
        .into_result("minify-images")?;

    assert_eq!(fs::read(site.path("_site/images/logo.png"))?, b"tiny");
    Ok(())
}

#[test]
fn missing_image_directory_is_not_an_error() -> TestResult {
    init_tracing();
    let site = SiteFixture::empty();

    let result = spec(
        StepKind::Images(ImageOptimizer::default()),
        &["images/**/*"],
        "images",
        "_site/images",
    )
    .run(site.root())?;

    assert!(result.is_success());
    assert!(result.written.is_empty());
    Ok(())
}

#[test]
fn invalid_source_glob_is_reported_before_any_work() {
    let site = SiteFixture::empty();
    let err = spec(
        StepKind::Css(CssProcessor::default()),
        &["css/[oops"],
        "css",
        "_site/css",
    )
    .run(site.root())
    .unwrap_err();

    assert!(matches!(err, PipelineError::MatchError { .. }));
    assert!(!site.exists("_site/css"));
}
