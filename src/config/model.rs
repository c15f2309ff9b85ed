// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::transform::css::DEFAULT_BROWSERS;
use crate::transform::HtmlMinifyOptions;
use crate::types::RebuildPolicy;

/// Top-level configuration as read from `Sitepipe.toml`.
///
/// Every section is optional; an empty file (or no file at all) reproduces
/// the stock Jekyll pipeline:
///
/// ```toml
/// [site]
/// output = "_site"
///
/// [tools]
/// site_generator = "jekyll build"
/// publish = "firebase deploy"
/// js_minifier = "terser --compress --mangle"
///
/// [serve]
/// port = 3000
/// rebuild_policy = "queue"
///
/// [[watch]]
/// patterns = ["_scripts/**/*.js"]
/// tasks = ["scripts"]
///
/// [task.lint]
/// cmd = "eslint _scripts"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub site: SiteSection,
    #[serde(default)]
    pub tools: ToolsSection,
    #[serde(default)]
    pub scripts: ScriptsSection,
    #[serde(default)]
    pub css: CssSection,
    #[serde(default)]
    pub html: HtmlSection,
    #[serde(default)]
    pub images: ImagesSection,
    #[serde(default)]
    pub manifest: ManifestSection,
    #[serde(default)]
    pub serve: ServeSection,
    /// `[[watch]]` rules. Declaring any replaces the defaults entirely.
    #[serde(default = "default_watch_rules")]
    pub watch: Vec<WatchRuleConfig>,
    /// User tasks from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`
/// (or `Default`, which is valid by construction).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub site: SiteSection,
    pub tools: ToolsSection,
    pub scripts: ScriptsSection,
    pub css: CssSection,
    pub html: HtmlSection,
    pub images: ImagesSection,
    pub manifest: ManifestSection,
    pub serve: ServeSection,
    pub watch: Vec<WatchRuleConfig>,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            site: raw.site,
            tools: raw.tools,
            scripts: raw.scripts,
            css: raw.css,
            html: raw.html,
            images: raw.images,
            manifest: raw.manifest,
            serve: raw.serve,
            watch: raw.watch,
            task: raw.task,
        }
    }
}

impl Default for RawConfigFile {
    fn default() -> Self {
        Self {
            site: SiteSection::default(),
            tools: ToolsSection::default(),
            scripts: ScriptsSection::default(),
            css: CssSection::default(),
            html: HtmlSection::default(),
            images: ImagesSection::default(),
            manifest: ManifestSection::default(),
            serve: ServeSection::default(),
            watch: default_watch_rules(),
            task: BTreeMap::new(),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}

/// `[site]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteSection {
    /// Output directory, relative to the project root.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_output() -> PathBuf {
    PathBuf::from("_site")
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

/// `[tools]` section: external commands.
///
/// Filters (`js_*`, `css_*`, `html_minifier`, `image_optimizer`) read the file
/// on stdin and write the result to stdout. Unset filters fall back to the
/// built-in behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsSection {
    #[serde(default = "default_site_generator")]
    pub site_generator: String,
    #[serde(default = "default_publish")]
    pub publish: String,
    #[serde(default)]
    pub js_compiler: Option<String>,
    #[serde(default)]
    pub js_minifier: Option<String>,
    #[serde(default)]
    pub css_prefixer: Option<String>,
    #[serde(default)]
    pub css_minifier: Option<String>,
    #[serde(default)]
    pub html_minifier: Option<String>,
    #[serde(default)]
    pub image_optimizer: Option<String>,
}

fn default_site_generator() -> String {
    "jekyll build".to_string()
}

fn default_publish() -> String {
    "firebase deploy".to_string()
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            site_generator: default_site_generator(),
            publish: default_publish(),
            js_compiler: None,
            js_minifier: None,
            css_prefixer: None,
            css_minifier: None,
            html_minifier: None,
            image_optimizer: None,
        }
    }
}

/// `[scripts]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptsSection {
    /// Concatenated in this order.
    #[serde(default = "default_script_sources")]
    pub sources: Vec<String>,
    #[serde(default = "default_bundle")]
    pub bundle: String,
    /// Relative to the output directory.
    #[serde(default = "default_script_dest")]
    pub dest: PathBuf,
}

fn default_script_sources() -> Vec<String> {
    vec!["_scripts/main.js".to_string()]
}

fn default_bundle() -> String {
    "main.min.js".to_string()
}

fn default_script_dest() -> PathBuf {
    PathBuf::from("scripts")
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            sources: default_script_sources(),
            bundle: default_bundle(),
            dest: default_script_dest(),
        }
    }
}

/// `[css]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CssSection {
    #[serde(default = "default_css_sources")]
    pub sources: Vec<String>,
    #[serde(default = "default_css_base")]
    pub base: PathBuf,
    /// Relative to the output directory.
    #[serde(default = "default_css_dest")]
    pub dest: PathBuf,
    /// Prefixer targets, exported as `BROWSERSLIST`.
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,
}

fn default_css_sources() -> Vec<String> {
    vec!["css/main.css".to_string()]
}

fn default_css_base() -> PathBuf {
    PathBuf::from("css")
}

fn default_css_dest() -> PathBuf {
    PathBuf::from("css")
}

fn default_browsers() -> Vec<String> {
    DEFAULT_BROWSERS.iter().map(|b| b.to_string()).collect()
}

impl Default for CssSection {
    fn default() -> Self {
        Self {
            sources: default_css_sources(),
            base: default_css_base(),
            dest: default_css_dest(),
            browsers: default_browsers(),
        }
    }
}

/// `[html]` section. Pages are minified in place inside the output
/// directory. The minifier flags sit directly in the section:
///
/// ```toml
/// [html]
/// remove_optional_tags = false
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct HtmlSection {
    /// Globs relative to the output directory.
    #[serde(default = "default_html_sources")]
    pub sources: Vec<String>,
    #[serde(flatten)]
    pub options: HtmlMinifyOptions,
}

fn default_html_sources() -> Vec<String> {
    vec!["**/*.html".to_string()]
}

impl Default for HtmlSection {
    fn default() -> Self {
        Self {
            sources: default_html_sources(),
            options: HtmlMinifyOptions::default(),
        }
    }
}

/// `[images]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesSection {
    #[serde(default = "default_image_sources")]
    pub sources: Vec<String>,
    #[serde(default = "default_image_base")]
    pub base: PathBuf,
    /// Relative to the output directory.
    #[serde(default = "default_image_dest")]
    pub dest: PathBuf,
    #[serde(default = "default_true")]
    pub progressive: bool,
    #[serde(default = "default_true")]
    pub interlaced: bool,
}

fn default_image_sources() -> Vec<String> {
    vec!["images/**/*".to_string()]
}

fn default_image_base() -> PathBuf {
    PathBuf::from("images")
}

fn default_image_dest() -> PathBuf {
    PathBuf::from("images")
}

fn default_true() -> bool {
    true
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            sources: default_image_sources(),
            base: default_image_base(),
            dest: default_image_dest(),
            progressive: true,
            interlaced: true,
        }
    }
}

/// `[manifest]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestSection {
    /// Manifest file name inside the output directory.
    #[serde(default = "default_manifest_file")]
    pub file: String,
    /// Globs relative to the output directory.
    #[serde(default = "default_manifest_include")]
    pub include: Vec<String>,
    /// URL suffixes removed from the manifest by `cleanup-sw-deploy`.
    #[serde(default = "default_deploy_exclude")]
    pub deploy_exclude: Vec<String>,
    /// Prefix of the cache name used by the service worker.
    #[serde(default = "default_cache_id")]
    pub cache_id: String,
}

fn default_manifest_file() -> String {
    "sw.js".to_string()
}

fn default_manifest_include() -> Vec<String> {
    vec!["**/*.{js,html,css,png,jpg,gif,json}".to_string()]
}

fn default_deploy_exclude() -> Vec<String> {
    vec!["/404.html".to_string()]
}

fn default_cache_id() -> String {
    "sitepipe".to_string()
}

impl Default for ManifestSection {
    fn default() -> Self {
        Self {
            file: default_manifest_file(),
            include: default_manifest_include(),
            deploy_exclude: default_deploy_exclude(),
            cache_id: default_cache_id(),
        }
    }
}

/// `[serve]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServeSection {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Quiet period used to coalesce bursts of file events.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default)]
    pub rebuild_policy: RebuildPolicy,
}

fn default_port() -> u16 {
    3000
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            debounce_ms: default_debounce_ms(),
            rebuild_policy: RebuildPolicy::default(),
        }
    }
}

/// One `[[watch]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WatchRuleConfig {
    /// Globs relative to the project root.
    pub patterns: Vec<String>,
    /// Tasks to rerun, in order.
    pub tasks: Vec<String>,
}

pub fn default_watch_rules() -> Vec<WatchRuleConfig> {
    vec![
        WatchRuleConfig {
            patterns: vec![
                "css/**/*.css".to_string(),
                "_includes/**/*.html".to_string(),
                "_layouts/**/*.html".to_string(),
                "_posts/**/*.md".to_string(),
                "index.html".to_string(),
            ],
            tasks: vec!["jekyll-build".to_string(), "css".to_string()],
        },
        WatchRuleConfig {
            patterns: vec!["_scripts/**/*.js".to_string()],
            tasks: vec!["scripts".to_string()],
        },
    ]
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Shell command run in the project root.
    pub cmd: String,
    /// Tasks that must run first.
    #[serde(default)]
    pub after: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}
