#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use sitepipe::config::{ConfigFile, RawConfigFile};
use sitepipe::dag::build_task_graph;
use sitepipe::engine::Runner;
use sitepipe::exec::{PipelineContext, RealExecutor};
use sitepipe::watch::compile_rules;

/// Stand-in for `jekyll build`: copies the pages into `_site`.
pub const FAKE_SITE_GENERATOR: &str =
    "mkdir -p _site && for f in *.html; do cp \"$f\" \"_site/$f\"; done";

/// A throw-away project directory.
pub struct SiteFixture {
    dir: TempDir,
}

impl SiteFixture {
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// The layout of a small Jekyll site: pages, one stylesheet, two
    /// scripts, one image.
    pub fn standard() -> Self {
        let site = Self::empty();
        site.write(
            "index.html",
            "<!DOCTYPE html>\n<html>\n  <head>\n    <title>Home</title>\n  </head>\n  <body>\n    <!-- hero -->\n    <p class=\"\">  Hello   world  </p>\n  </body>\n</html>\n",
        );
        site.write(
            "404.html",
            "<html><body><p>Not found</p></body></html>\n",
        );
        site.write(
            "css/main.css",
            "/* theme */\nbody {\n  margin: 0;\n  color: #333;\n}\n",
        );
        site.write(
            "_scripts/main.js",
            "// entry point\nfunction greet(name) {\n  return 'Hello, ' + name;\n}\n",
        );
        site.write("images/logo.png", "\u{89}PNG fake image bytes");
        site
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(path, contents).expect("write fixture file");
    }

    pub fn mkdir(&self, rel: &str) {
        fs::create_dir_all(self.path(rel)).expect("create dir");
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).expect("read fixture file")
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// Default config with the site generator and publish step replaced by
    /// local shell commands.
    pub fn raw_config(&self) -> RawConfigFile {
        let mut raw = RawConfigFile::default();
        raw.tools.site_generator = FAKE_SITE_GENERATOR.to_string();
        raw.tools.publish = "touch published.marker".to_string();
        raw
    }

    pub fn config(&self) -> ConfigFile {
        ConfigFile::try_from(self.raw_config()).expect("valid fixture config")
    }

    /// A runner with the real executor rooted at this fixture.
    pub fn runner(&self, cfg: &ConfigFile) -> Runner<RealExecutor> {
        let graph = Arc::new(build_task_graph(cfg).expect("valid task graph"));
        let rules = compile_rules(&cfg.watch, &graph).expect("valid watch rules");
        let root = self.root().canonicalize().expect("canonical root");
        let ctx = Arc::new(PipelineContext::from_config(root, cfg, rules));
        Runner::new(Arc::clone(&graph), RealExecutor::new(ctx, graph))
    }
}
