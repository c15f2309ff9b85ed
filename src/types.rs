use std::str::FromStr;
use serde::Deserialize;

/// What happens to file changes that arrive while a rebuild is running.
///
/// - `Queue`: every task triggered in the meantime is remembered and the
///   union runs once the current rebuild finishes (default).
/// - `Latest`: only the tasks of the most recent change are kept; earlier
///   pending triggers are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RebuildPolicy {
    #[default]
    Queue,
    Latest,
}

impl FromStr for RebuildPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(RebuildPolicy::Queue),
            "latest" => Ok(RebuildPolicy::Latest),
            other => Err(format!(
                "invalid rebuild_policy: {other} (expected \"queue\" or \"latest\")"
            )),
        }
    }
}
