//! Input classification.
//!
//! Splits raw newline-delimited text into instance-id and hostname buckets.
//! Pure: no I/O, no logging side effects beyond a debug event.

use regex::Regex;
use tracing::debug;

use crate::domain::{ClassifiedBatch, Refusal, Result};

/// `i-` followed by at least one word character.
const INSTANCE_ID_PATTERN: &str = r"^i-\w";

/// Drop everything from the first `.` onward.
pub fn strip_domain(name: &str) -> &str {
    match name.find('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    max_lines: usize,
    instance_id: Regex,
}

impl Classifier {
    pub fn new(max_lines: usize) -> Result<Self> {
        Ok(Self {
            max_lines,
            instance_id: Regex::new(INSTANCE_ID_PATTERN)?,
        })
    }

    pub fn is_instance_id(&self, name: &str) -> bool {
        self.instance_id.is_match(name)
    }

    /// Classify `raw` into buckets, or refuse when it has too many lines.
    ///
    /// Every non-empty (after trimming) line lands in exactly one bucket.
    /// The refusal is all-or-nothing: an oversized batch is never truncated.
    pub fn classify(&self, raw: &str) -> std::result::Result<ClassifiedBatch, Refusal> {
        let lines: Vec<&str> = raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        if lines.len() > self.max_lines {
            return Err(Refusal::BatchTooLarge {
                lines: lines.len(),
                limit: self.max_lines,
            });
        }

        let mut batch = ClassifiedBatch::default();
        for line in lines {
            let name = strip_domain(line);
            if self.is_instance_id(name) {
                batch.instance_ids.push(name.to_string());
            } else {
                batch.hostnames.push(name.to_string());
            }
        }

        debug!(
            instance_ids = batch.instance_ids.len(),
            hostnames = batch.hostnames.len(),
            "input classified"
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(5000).unwrap()
    }

    #[test]
    fn test_domain_suffix_is_stripped_before_classifying() {
        let batch = classifier()
            .classify("host1.example.com\ni-0abc123.region\n")
            .unwrap();
        assert_eq!(batch.hostnames, vec!["host1"]);
        assert_eq!(batch.instance_ids, vec!["i-0abc123"]);
    }

    #[test]
    fn test_blank_lines_and_whitespace_are_dropped() {
        let batch = classifier()
            .classify("  web01  \n\n\t\r\n   \ndb02\r\n")
            .unwrap();
        assert_eq!(batch.hostnames, vec!["web01", "db02"]);
        assert!(batch.instance_ids.is_empty());
    }

    #[test]
    fn test_every_line_lands_in_one_bucket() {
        let input = "a\ni-1\nb.corp\ni-2.x\nc\n";
        let batch = classifier().classify(input).unwrap();
        assert_eq!(batch.len(), 5);
        assert_eq!(batch.instance_ids.len(), 2);
        assert_eq!(batch.hostnames.len(), 3);
    }

    #[test]
    fn test_instance_prefix_needs_a_word_character() {
        let c = classifier();
        assert!(c.is_instance_id("i-0d87ddf87d"));
        assert!(!c.is_instance_id("i-"));
        assert!(!c.is_instance_id("i--x"));
        assert!(!c.is_instance_id("xi-0abc"));
        assert!(!c.is_instance_id("ip-10-0-0-1"));
    }

    #[test]
    fn test_duplicates_are_kept() {
        let batch = classifier().classify("web01.corp.com\nweb01\n").unwrap();
        assert_eq!(batch.hostnames, vec!["web01", "web01"]);
    }

    #[test]
    fn test_exactly_at_ceiling_is_accepted() {
        let input: String = (0..5000).map(|i| format!("host{i}\n")).collect();
        let batch = classifier().classify(&input).unwrap();
        assert_eq!(batch.len(), 5000);
    }

    #[test]
    fn test_over_ceiling_is_refused() {
        let input: String = (0..5001).map(|i| format!("host{i}\n")).collect();
        let refusal = classifier().classify(&input).unwrap_err();
        assert_eq!(
            refusal,
            Refusal::BatchTooLarge {
                lines: 5001,
                limit: 5000
            }
        );
    }

    #[test]
    fn test_blank_lines_do_not_count_toward_ceiling() {
        let mut input: String = (0..5000).map(|i| format!("host{i}\n")).collect();
        input.push_str("\n\n   \n");
        assert!(classifier().classify(&input).is_ok());
    }
}
