//! Extraction of the lines the interpreter skipped.

/// A contract line the interpreter did not recognize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredLine {
    pub text: String,
    /// 1-based line number within the contract.
    pub line: usize,
}

/// Turns an interpreter log into the lines it ignored, in log order.
pub trait IgnoredStatements: Send + Sync {
    fn extract(&self, logs: &str) -> Vec<IgnoredLine>;
}

/// Recognizes log lines of the form `<marker> <n>: <statement text>`.
///
/// Anything before the marker (timestamps, level prefixes) is skipped; log
/// lines without the marker, or whose line number does not parse or is 0,
/// are ignored.
#[derive(Debug, Clone)]
pub struct MarkerScraper {
    marker: String,
}

impl MarkerScraper {
    pub fn new(marker: impl Into<String>) -> Self {
        MarkerScraper {
            marker: marker.into(),
        }
    }

    fn parse(&self, log_line: &str) -> Option<IgnoredLine> {
        let at = log_line.find(&self.marker)?;
        let rest = log_line[at + self.marker.len()..].trim_start();
        let (number, text) = rest.split_once(':')?;
        let line = number.trim().parse::<usize>().ok().filter(|&n| n > 0)?;
        Some(IgnoredLine {
            text: text.trim().to_string(),
            line,
        })
    }
}

impl IgnoredStatements for MarkerScraper {
    fn extract(&self, logs: &str) -> Vec<IgnoredLine> {
        logs.lines().filter_map(|l| self.parse(l)).collect()
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_marked_lines_in_order() {
        let scraper = MarkerScraper::new("[W] Statement ignored at line");
        let logs = "\
[I] starting
[W] Statement ignored at line 3: Given I love Asche
noise
[W] Statement ignored at line 7:   Then I send x 'y' and go
[W] Statement ignored at line x: broken";
        assert_eq!(
            scraper.extract(logs),
            vec![
                IgnoredLine {
                    text: "Given I love Asche".to_string(),
                    line: 3
                },
                IgnoredLine {
                    text: "Then I send x 'y' and go".to_string(),
                    line: 7
                },
            ]
        );
    }

    #[test]
    fn colon_inside_statement_is_kept() {
        let scraper = MarkerScraper::new("IGNORED");
        let out = scraper.extract("IGNORED 2: Given I fetch 'http://x'");
        assert_eq!(out[0].text, "Given I fetch 'http://x'");
    }

    #[test]
    fn line_zero_is_dropped() {
        let scraper = MarkerScraper::new("IGNORED");
        let out = scraper.extract("IGNORED 0: Given I go\nIGNORED 1: Then I go");
        assert_eq!(
            out,
            vec![IgnoredLine {
                text: "Then I go".to_string(),
                line: 1
            }]
        );
    }

    #[test]
    fn no_marker_no_lines() {
        assert!(MarkerScraper::new("IGNORED").extract("all good").is_empty());
    }
}
