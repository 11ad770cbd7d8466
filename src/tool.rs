//! Tool identifiers and the navigation side-channel.
//!
//! The active tool is switched immediately, while the persisted navigation
//! value (`tool=<id>`) is written at most once per throttle window. The
//! latest selection made inside a window is written once it elapses.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Name of the navigation query parameter.
pub const QUERY_KEY: &str = "tool";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolId {
    #[default]
    Draw,
    Edit,
    Split,
    Merge,
    Arrange,
    ToImage,
}

impl ToolId {
    pub const ALL: [ToolId; 6] = [
        ToolId::Draw,
        ToolId::Edit,
        ToolId::Split,
        ToolId::Merge,
        ToolId::Arrange,
        ToolId::ToImage,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ToolId::Draw => "draw",
            ToolId::Edit => "edit",
            ToolId::Split => "split",
            ToolId::Merge => "merge",
            ToolId::Arrange => "arrange",
            ToolId::ToImage => "to-image",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ToolId::Draw => "Draw",
            ToolId::Edit => "Edit",
            ToolId::Split => "Split",
            ToolId::Merge => "Merge",
            ToolId::Arrange => "Arrange",
            ToolId::ToImage => "To Image",
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ToolId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolId::ALL
            .into_iter()
            .find(|t| t.id() == s)
            .ok_or_else(|| format!("unknown tool '{s}'"))
    }
}

/// Active tool plus the throttled navigation value that mirrors it.
#[derive(Debug, Clone)]
pub struct Navigator {
    active: ToolId,
    committed: ToolId,
    pending: Option<ToolId>,
    last_write: Option<Instant>,
    throttle: Duration,
}

impl Navigator {
    pub fn new(initial: ToolId, throttle: Duration) -> Self {
        Self {
            active: initial,
            committed: initial,
            pending: None,
            last_write: None,
            throttle,
        }
    }

    /// Restore from a query string such as `tool=merge&x=1`. Missing or
    /// unknown values fall back to `default`.
    pub fn from_query(query: &str, default: ToolId, throttle: Duration) -> Self {
        let tool = query
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == QUERY_KEY)
            .and_then(|(_, value)| value.parse().ok())
            .unwrap_or(default);
        Self::new(tool, throttle)
    }

    pub fn active(&self) -> ToolId {
        self.active
    }

    /// The value currently written to the navigation channel.
    pub fn committed(&self) -> ToolId {
        self.committed
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Switch to `tool`. Returns `true` when the navigation value was
    /// written now, `false` when the write was deferred or unnecessary.
    pub fn select(&mut self, tool: ToolId, now: Instant) -> bool {
        self.active = tool;
        if tool == self.committed {
            self.pending = None;
            return false;
        }
        if self.window_open(now) {
            self.write(tool, now);
            true
        } else {
            self.pending = Some(tool);
            false
        }
    }

    /// Write a deferred selection once the throttle window has elapsed.
    pub fn flush(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(tool) if self.window_open(now) => {
                self.write(tool, now);
                true
            }
            _ => false,
        }
    }

    /// `tool=<id>` for the committed value.
    pub fn query_string(&self) -> String {
        format!("{}={}", QUERY_KEY, self.committed)
    }

    fn window_open(&self, now: Instant) -> bool {
        self.last_write
            .is_none_or(|last| now.saturating_duration_since(last) >= self.throttle)
    }

    fn write(&mut self, tool: ToolId, now: Instant) {
        self.committed = tool;
        self.pending = None;
        self.last_write = Some(now);
        log::debug!("navigation value set to {}", self.query_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(1000);

    #[test]
    fn test_ids_round_trip() {
        for tool in ToolId::ALL {
            assert_eq!(tool.id().parse::<ToolId>().unwrap(), tool);
        }
        assert_eq!(ToolId::default(), ToolId::Draw);
        assert!("paint".parse::<ToolId>().is_err());
        assert_eq!(
            serde_json::to_string(&ToolId::ToImage).unwrap(),
            "\"to-image\""
        );
    }

    #[test]
    fn test_from_query_falls_back() {
        let nav = Navigator::from_query("?x=1&tool=merge", ToolId::Draw, WINDOW);
        assert_eq!(nav.active(), ToolId::Merge);
        let nav = Navigator::from_query("tool=paint", ToolId::Draw, WINDOW);
        assert_eq!(nav.active(), ToolId::Draw);
        let nav = Navigator::from_query("", ToolId::Split, WINDOW);
        assert_eq!(nav.query_string(), "tool=split");
    }

    #[test]
    fn test_rapid_changes_are_throttled() {
        let t0 = Instant::now();
        let mut nav = Navigator::new(ToolId::Draw, WINDOW);

        assert!(nav.select(ToolId::Edit, t0));
        assert_eq!(nav.query_string(), "tool=edit");

        assert!(!nav.select(ToolId::Split, t0 + Duration::from_millis(100)));
        assert!(!nav.select(ToolId::Merge, t0 + Duration::from_millis(200)));
        assert_eq!(nav.active(), ToolId::Merge);
        assert_eq!(nav.committed(), ToolId::Edit);

        assert!(!nav.flush(t0 + Duration::from_millis(900)));
        assert!(nav.flush(t0 + Duration::from_millis(1000)));
        assert_eq!(nav.query_string(), "tool=merge");
        assert!(!nav.has_pending());
    }

    #[test]
    fn test_returning_to_committed_cancels_pending() {
        let t0 = Instant::now();
        let mut nav = Navigator::new(ToolId::Draw, WINDOW);
        nav.select(ToolId::Edit, t0);
        nav.select(ToolId::Split, t0 + Duration::from_millis(10));
        assert!(!nav.select(ToolId::Edit, t0 + Duration::from_millis(20)));
        assert!(!nav.has_pending());
        assert!(!nav.flush(t0 + WINDOW * 2));
        assert_eq!(nav.committed(), ToolId::Edit);
    }
}
