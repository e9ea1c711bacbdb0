//! Classified input tokens.

use device_inventory::DeviceQuery;
use serde::{Deserialize, Serialize};

/// Which field a token will be searched against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    InstanceIdCandidate,
    HostnameCandidate,
}

/// One user-supplied name after domain stripping and classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Token {
    pub value: String,
    pub kind: TokenKind,
}

impl Token {
    pub fn instance_id(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: TokenKind::InstanceIdCandidate,
        }
    }

    pub fn hostname(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: TokenKind::HostnameCandidate,
        }
    }

    /// The partial-match query that resolves this token.
    pub fn query(&self, limit: usize) -> DeviceQuery {
        match self.kind {
            TokenKind::InstanceIdCandidate => DeviceQuery::instance_id(&self.value, limit),
            TokenKind::HostnameCandidate => DeviceQuery::hostname(&self.value, limit),
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Input split into the two lookup buckets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassifiedBatch {
    pub instance_ids: Vec<String>,
    pub hostnames: Vec<String>,
}

impl ClassifiedBatch {
    /// Total number of tokens across both buckets.
    pub fn len(&self) -> usize {
        self.instance_ids.len() + self.hostnames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten both buckets into typed tokens, instance ids first.
    pub fn tokens(&self) -> Vec<Token> {
        self.instance_ids
            .iter()
            .map(Token::instance_id)
            .chain(self.hostnames.iter().map(Token::hostname))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use device_inventory::FilterField;

    #[test]
    fn test_token_query_uses_matching_field() {
        let q = Token::instance_id("i-0abc").query(50);
        assert_eq!(q.field, FilterField::InstanceId);

        let q = Token::hostname("web01").query(25);
        assert_eq!(q.field, FilterField::Hostname);
        assert_eq!(q.limit, 25);
    }

    #[test]
    fn test_batch_tokens_cover_both_buckets() {
        let batch = ClassifiedBatch {
            instance_ids: vec!["i-1".to_string()],
            hostnames: vec!["a".to_string(), "b".to_string()],
        };
        let tokens = batch.tokens();
        assert_eq!(batch.len(), 3);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].kind, TokenKind::InstanceIdCandidate);
        assert!(tokens[1..]
            .iter()
            .all(|t| t.kind == TokenKind::HostnameCandidate));
    }
}
