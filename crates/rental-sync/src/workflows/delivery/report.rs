use chrono::{DateTime, Local};
use std::time::Duration;

/// Backend environments the sync writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Live,
    Sandbox,
}

impl TargetKind {
    pub const fn ordered() -> [Self; 2] {
        [Self::Live, Self::Sandbox]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Live => "Live",
            Self::Sandbox => "Sandbox",
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Sandbox => "sandbox",
        }
    }
}

/// A backend environment and the base URL its HTTP functions live under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    pub kind: TargetKind,
    base_url: String,
}

impl SyncTarget {
    pub fn new(kind: TargetKind, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into().trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { kind, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn batch_update_url(&self) -> String {
        format!("{}batchUpdate", self.base_url)
    }

    pub fn room_update_url(&self) -> String {
        format!("{}updateRoom", self.base_url)
    }
}

/// Which keys reached one target and which did not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    pub target: TargetKind,
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl TargetReport {
    pub fn new(target: TargetKind) -> Self {
        Self {
            target,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn record(&mut self, key: impl Into<String>, delivered: bool) {
        if delivered {
            self.succeeded.push(key.into());
        } else {
            self.failed.push(key.into());
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Everything the console summary prints for one invocation.
#[derive(Debug, Clone)]
pub struct SyncRunReport {
    pub started_at: DateTime<Local>,
    pub targets: Vec<TargetReport>,
    pub elapsed: Duration,
}

impl SyncRunReport {
    pub fn failed_total(&self) -> usize {
        self.targets.iter().map(|report| report.failed.len()).sum()
    }

    pub fn started_label(&self) -> String {
        self.started_at.format("%Y-%m-%d %H:%M").to_string()
    }

    pub fn runtime_label(&self) -> String {
        runtime_label(self.elapsed)
    }
}

pub fn runtime_label(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    format!("{} min, {} sec", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_urls_join_function_names() {
        let target = SyncTarget::new(TargetKind::Live, "https://splitspot.com/_functions");
        assert_eq!(target.base_url(), "https://splitspot.com/_functions/");
        assert_eq!(
            target.batch_update_url(),
            "https://splitspot.com/_functions/batchUpdate"
        );
        assert_eq!(
            target.room_update_url(),
            "https://splitspot.com/_functions/updateRoom"
        );
    }

    #[test]
    fn report_splits_outcomes() {
        let mut report = TargetReport::new(TargetKind::Sandbox);
        report.record("wix-1", true);
        report.record("wix-2", false);

        assert_eq!(report.succeeded, vec!["wix-1".to_string()]);
        assert_eq!(report.failed, vec!["wix-2".to_string()]);
        assert!(!report.is_clean());
    }

    #[test]
    fn runtime_label_uses_whole_minutes() {
        assert_eq!(runtime_label(Duration::from_secs(0)), "0 min, 0 sec");
        assert_eq!(runtime_label(Duration::from_millis(125_900)), "2 min, 5 sec");
    }
}
