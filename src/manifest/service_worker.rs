// src/manifest/service_worker.rs

//! `sw.js` rendering and parsing.
//!
//! The generated worker precaches every manifest entry on install, deletes
//! caches from older versions on activate, and answers fetches cache-first
//! (falling back to `index.html` for directory URLs).

use std::collections::BTreeMap;

use serde::Serialize;

use super::Manifest;
use crate::errors::{PipelineError, Result};

const PRECACHE_PREFIX: &str = "var precacheConfig = ";

const TEMPLATE: &str = r#"'use strict';

// Generated by sitepipe. Do not edit.

var precacheConfig = __PRECACHE_CONFIG__;
var cacheName = __CACHE_NAME__;

var urlsToCache = precacheConfig.map(function(entry) {
  return new URL(entry[0], self.location).toString();
});

self.addEventListener('install', function(event) {
  event.waitUntil(
    caches.open(cacheName).then(function(cache) {
      return cache.addAll(urlsToCache);
    }).then(function() {
      return self.skipWaiting();
    })
  );
});

self.addEventListener('activate', function(event) {
  event.waitUntil(
    caches.keys().then(function(names) {
      return Promise.all(names.filter(function(name) {
        return name.indexOf(__CACHE_ID__) === 0 && name !== cacheName;
      }).map(function(name) {
        return caches.delete(name);
      }));
    }).then(function() {
      return self.clients.claim();
    })
  );
});

self.addEventListener('fetch', function(event) {
  if (event.request.method !== 'GET') {
    return;
  }
  var url = new URL(event.request.url);
  if (url.origin !== self.location.origin) {
    return;
  }
  var candidate = url.pathname;
  if (candidate.endsWith('/')) {
    candidate += 'index.html';
  }
  var cached = new URL(candidate, self.location).toString();
  if (urlsToCache.indexOf(cached) === -1) {
    return;
  }
  event.respondWith(
    caches.open(cacheName).then(function(cache) {
      return cache.match(cached).then(function(response) {
        return response || fetch(event.request);
      });
    })
  );
});
"#;

/// Render the service worker script for `manifest`.
pub fn render_service_worker(manifest: &Manifest, cache_id: &str) -> Result<String> {
    let pairs: Vec<[&str; 2]> = manifest
        .entries
        .iter()
        .map(|(url, hash)| [url.as_str(), hash.as_str()])
        .collect();

    let cache_prefix = format!("{cache_id}-");
    let cache_name = format!("{cache_prefix}{}", manifest.cache_version());

    Ok(TEMPLATE
        .replace("__PRECACHE_CONFIG__", &json(&pairs)?)
        .replace("__CACHE_NAME__", &json(&cache_name)?)
        .replace("__CACHE_ID__", &json(&cache_prefix)?))
}

/// Recover the manifest entries from a rendered script.
pub(super) fn parse(script: &str) -> std::result::Result<BTreeMap<String, String>, String> {
    for line in script.lines() {
        if let Some(value) = assignment(line, PRECACHE_PREFIX) {
            let pairs: Vec<(String, String)> =
                serde_json::from_str(value).map_err(|e| format!("precacheConfig: {e}"))?;
            return Ok(pairs.into_iter().collect());
        }
    }
    Err("no precacheConfig found".to_string())
}

fn assignment<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.trim()
        .strip_prefix(prefix)
        .map(|rest| rest.trim_end().trim_end_matches(';'))
}

fn json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| PipelineError::Other(e.into()))
}
