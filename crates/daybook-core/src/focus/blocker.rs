use std::collections::BTreeSet;

/// Strict-mode app blocklist.
///
/// Identifiers are compared case-insensitively. [`AppBlocker::observe`] is
/// fed the foreground app once per poll and reports a blocked app only when
/// it newly comes to the foreground.
#[derive(Debug, Clone, Default)]
pub struct AppBlocker {
    blocklist: BTreeSet<String>,
    foreground: Option<String>,
}

fn normalize(app: &str) -> String {
    app.trim().to_lowercase()
}

impl AppBlocker {
    pub fn new<I, S>(apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            blocklist: apps
                .into_iter()
                .map(|a| normalize(a.as_ref()))
                .filter(|a| !a.is_empty())
                .collect(),
            foreground: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocklist.is_empty()
    }

    pub fn is_blocked(&self, app: &str) -> bool {
        self.blocklist.contains(&normalize(app))
    }

    /// Record the current foreground app. Returns it if it is blocked and
    /// was not already in the foreground at the previous poll.
    pub fn observe(&mut self, app: Option<&str>) -> Option<String> {
        let current = app.map(normalize).filter(|a| !a.is_empty());
        if current == self.foreground {
            return None;
        }
        self.foreground.clone_from(&current);
        current.filter(|a| self.blocklist.contains(a))
    }

    /// Forget the last foreground app, e.g. when strict focus ends.
    pub fn clear(&mut self) {
        self.foreground = None;
    }
}
