// src/config/validate.rs

use std::path::{Component, Path};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PipelineError, Result};
use crate::matcher::validate_patterns;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_output_dir(&cfg.site.output)?;
    validate_destinations(cfg)?;
    validate_serve(cfg)?;
    validate_globs(cfg)?;
    validate_watch_rules(cfg)?;
    validate_custom_tasks(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> PipelineError {
    PipelineError::ConfigError(msg.into())
}

/// The output directory is deleted by `cleanup-build`, so it has to be a
/// proper subdirectory of the project.
fn validate_output_dir(output: &Path) -> Result<()> {
    if output.as_os_str().is_empty() {
        return Err(config_error("[site].output must not be empty"));
    }
    if output.is_absolute() {
        return Err(config_error(format!(
            "[site].output must be relative to the project root (got {})",
            output.display()
        )));
    }

    let mut depth: i32 = 0;
    for component in output.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(config_error(format!(
                    "[site].output must stay inside the project (got {})",
                    output.display()
                )));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(config_error(format!(
                    "[site].output must be relative to the project root (got {})",
                    output.display()
                )));
            }
        }
    }
    if depth == 0 {
        return Err(config_error(
            "[site].output must not be the project root itself",
        ));
    }
    Ok(())
}

/// Step destinations are joined onto the output directory and must not
/// leave it, so `cleanup-build` clears everything a build writes.
fn validate_destinations(cfg: &RawConfigFile) -> Result<()> {
    let dests = [
        ("[scripts].dest", &cfg.scripts.dest),
        ("[css].dest", &cfg.css.dest),
        ("[images].dest", &cfg.images.dest),
    ];
    for (field, dest) in dests {
        if !stays_inside(dest) {
            return Err(config_error(format!(
                "{field} must be a path inside [site].output (got {})",
                dest.display()
            )));
        }
    }

    for pattern in &cfg.html.sources {
        let glob = pattern.strip_prefix('!').unwrap_or(pattern);
        if !stays_inside(Path::new(glob)) {
            return Err(config_error(format!(
                "[html].sources must be globs inside [site].output (got {pattern})"
            )));
        }
    }
    Ok(())
}

fn stays_inside(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn validate_serve(cfg: &RawConfigFile) -> Result<()> {
    if cfg.serve.port == 0 {
        return Err(config_error("[serve].port must be >= 1 (got 0)"));
    }
    Ok(())
}

fn validate_globs(cfg: &RawConfigFile) -> Result<()> {
    validate_patterns(&cfg.scripts.sources)?;
    validate_patterns(&cfg.css.sources)?;
    validate_patterns(&cfg.html.sources)?;
    validate_patterns(&cfg.images.sources)?;
    validate_patterns(&cfg.manifest.include)?;
    for rule in &cfg.watch {
        validate_patterns(&rule.patterns)?;
    }

    if cfg.scripts.bundle.trim().is_empty() {
        return Err(config_error("[scripts].bundle must not be empty"));
    }
    if cfg.manifest.file.trim().is_empty() {
        return Err(config_error("[manifest].file must not be empty"));
    }
    Ok(())
}

fn validate_watch_rules(cfg: &RawConfigFile) -> Result<()> {
    for (idx, rule) in cfg.watch.iter().enumerate() {
        if rule.patterns.is_empty() {
            return Err(config_error(format!(
                "[[watch]] rule #{} has no patterns",
                idx + 1
            )));
        }
        if rule.tasks.is_empty() {
            return Err(config_error(format!(
                "[[watch]] rule #{} has no tasks",
                idx + 1
            )));
        }
    }
    Ok(())
}

fn validate_custom_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if name.trim().is_empty() {
            return Err(config_error("task names must not be empty"));
        }
        if task.cmd.trim().is_empty() {
            return Err(config_error(format!(
                "task '{name}' has an empty `cmd`"
            )));
        }
        if task.after.iter().any(|dep| dep == name) {
            return Err(config_error(format!(
                "task '{name}' cannot depend on itself in `after`"
            )));
        }
    }
    Ok(())
}
