//! Robots.txt parser implementation
//!
//! Allow/Disallow matching is delegated to the robotstxt crate; Crawl-delay,
//! which that crate does not expose, is parsed here.

use robotstxt::DefaultMatcher;
use std::time::Duration;

/// How a policy answers, independent of its content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Answer from the parsed rules
    Rules,
    /// No policy published
    AllowAll,
    /// Access to robots.txt itself was refused or the server failed
    DisallowAll,
}

/// Parsed robots.txt data
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    mode: Mode,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            mode: Mode::Rules,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// Used when the site publishes no robots.txt.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            mode: Mode::AllowAll,
        }
    }

    /// Creates a policy that disallows everything
    ///
    /// Used when robots.txt answers 401, 403 or a server error.
    pub fn disallow_all() -> Self {
        Self {
            content: String::new(),
            mode: Mode::DisallowAll,
        }
    }

    /// Returns true if this policy imposes no rules at all
    pub fn is_permissive(&self) -> bool {
        match self.mode {
            Mode::AllowAll => true,
            Mode::DisallowAll => false,
            Mode::Rules => self.content.trim().is_empty(),
        }
    }

    /// Returns true if every URL is disallowed regardless of content
    pub fn is_disallow_all(&self) -> bool {
        self.mode == Mode::DisallowAll
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `user_agent` - The user agent product token (e.g. "Kensa")
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.is_disallow_all() {
            return false;
        }
        if self.is_permissive() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Gets the crawl delay that applies to a user agent
    ///
    /// A group naming the agent wins over the `*` group. Agent names match
    /// case-insensitively on the product token.
    ///
    /// # Returns
    ///
    /// * `Some(Duration)` - The crawl delay
    /// * `None` - If no applicable Crawl-delay is specified
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        if self.is_permissive() || self.is_disallow_all() {
            return None;
        }

        let agent = product_token(user_agent).to_lowercase();

        let mut group: Vec<String> = Vec::new();
        // A User-agent line following any rule line starts a new group
        let mut in_rules = false;
        let mut delay_for_agent: Option<Duration> = None;
        let mut delay_for_wildcard: Option<Duration> = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if in_rules {
                        group.clear();
                        in_rules = false;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_rules = true;
                    // Negative, non-finite and out-of-range values are skipped
                    let Some(delay) = value
                        .parse::<f64>()
                        .ok()
                        .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
                    else {
                        continue;
                    };
                    if group.iter().any(|ua| *ua == agent) {
                        delay_for_agent.get_or_insert(delay);
                    } else if group.iter().any(|ua| ua == "*") {
                        delay_for_wildcard.get_or_insert(delay);
                    }
                }
                _ => in_rules = true,
            }
        }

        delay_for_agent.or(delay_for_wildcard)
    }
}

/// Returns the product token of a User-Agent string (`Kensa/1.0 (...)` → `Kensa`)
fn product_token(user_agent: &str) -> &str {
    user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or(user_agent)
}
