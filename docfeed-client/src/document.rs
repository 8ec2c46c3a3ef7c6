//! Documents and document ids.

use std::fmt;
use std::str::FromStr;

use http::Method;

use crate::{FeedError, Result};

/// Identifier of a single document.
///
/// The serialized form is `id:<namespace>:<type>:<selector>:<user-specific>`
/// where the selector is empty, `n=<number>` or `g=<group>`. The user-specific
/// part is everything after the fourth colon and may itself contain colons.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId {
    /// Document namespace.
    pub namespace: String,
    /// Document type.
    pub doc_type: String,
    /// Numeric location selector, exclusive with `group`.
    pub number: Option<u64>,
    /// Group location selector, exclusive with `number`.
    pub group: Option<String>,
    /// User-specified part of the id.
    pub user_specific: String,
}

impl DocumentId {
    /// Create an id without a location selector.
    pub fn new(
        namespace: impl Into<String>,
        doc_type: impl Into<String>,
        user_specific: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            doc_type: doc_type.into(),
            number: None,
            group: None,
            user_specific: user_specific.into(),
        }
    }

    /// Place the document by number. Clears any group.
    pub fn with_number(mut self, number: u64) -> Self {
        self.number = Some(number);
        self.group = None;
        self
    }

    /// Place the document in a group. Clears any number.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self.number = None;
        self
    }

    /// Parse a serialized document id.
    pub fn parse(serialized: &str) -> Result<Self> {
        let invalid = || FeedError::InvalidId(serialized.to_string());

        let mut parts = serialized.splitn(4, ':');
        if parts.next() != Some("id") {
            return Err(invalid());
        }
        let namespace = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let doc_type = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let (selector, user_specific) = parts
            .next()
            .and_then(|rest| rest.split_once(':'))
            .ok_or_else(invalid)?;
        if user_specific.is_empty() {
            return Err(invalid());
        }

        let mut id = Self::new(namespace, doc_type, user_specific);
        if let Some(number) = selector.strip_prefix("n=") {
            id.number = Some(number.parse().map_err(|_| invalid())?);
        } else if let Some(group) = selector.strip_prefix("g=") {
            if group.is_empty() {
                return Err(invalid());
            }
            id.group = Some(group.to_string());
        } else if !selector.is_empty() {
            return Err(invalid());
        }
        Ok(id)
    }
}

impl FromStr for DocumentId {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id:{}:{}:", self.namespace, self.doc_type)?;
        if let Some(number) = self.number {
            write!(f, "n={}", number)?;
        } else if let Some(group) = &self.group {
            write!(f, "g={}", group)?;
        }
        write!(f, ":{}", self.user_specific)
    }
}

/// Kind of write carried by a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operation {
    /// Full document put.
    #[default]
    Put,
    /// Partial update.
    Update,
    /// Removal.
    Remove,
}

impl Operation {
    /// HTTP method used for this operation.
    pub fn method(&self) -> Method {
        match self {
            Self::Put => Method::POST,
            Self::Update => Method::PUT,
            Self::Remove => Method::DELETE,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Put => write!(f, "put"),
            Self::Update => write!(f, "update"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// One feed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Document id.
    pub id: DocumentId,
    /// Operation to perform.
    pub operation: Operation,
    /// Raw JSON body, empty for removes.
    pub body: Vec<u8>,
    /// Test-and-set condition evaluated by the server.
    pub condition: Option<String>,
    /// Create the document if an update targets a missing one.
    pub create: bool,
}

impl Document {
    /// Create a document with the given operation and body.
    pub fn new(id: DocumentId, operation: Operation, body: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            operation,
            body: body.into(),
            condition: None,
            create: false,
        }
    }

    /// Create a put.
    pub fn put(id: DocumentId, body: impl Into<Vec<u8>>) -> Self {
        Self::new(id, Operation::Put, body)
    }

    /// Create an update.
    pub fn update(id: DocumentId, body: impl Into<Vec<u8>>) -> Self {
        Self::new(id, Operation::Update, body)
    }

    /// Create a remove.
    pub fn remove(id: DocumentId) -> Self {
        Self::new(id, Operation::Remove, Vec::new())
    }

    /// Attach a test-and-set condition.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Set the create-if-missing flag.
    pub fn with_create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operation, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_id() {
        let id = DocumentId::parse("id:ns:type::user").unwrap();
        assert_eq!(id.namespace, "ns");
        assert_eq!(id.doc_type, "type");
        assert_eq!(id.number, None);
        assert_eq!(id.group, None);
        assert_eq!(id.user_specific, "user");
    }

    #[test]
    fn test_parse_selectors() {
        let id: DocumentId = "id:ns:type:n=123:user".parse().unwrap();
        assert_eq!(id.number, Some(123));
        assert_eq!(id.group, None);

        let id: DocumentId = "id:ns:type:g=foo:user".parse().unwrap();
        assert_eq!(id.group.as_deref(), Some("foo"));
        assert_eq!(id.number, None);
    }

    #[test]
    fn test_parse_user_specific_with_colons() {
        let id = DocumentId::parse("id:ns:type::user::specific").unwrap();
        assert_eq!(id.user_specific, "user::specific");

        let id = DocumentId::parse("id:ns:type:::").unwrap();
        assert_eq!(id.user_specific, ":");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "",
            "id",
            "doc:ns:type::user",
            "id::type::user",
            "id:ns:::user",
            "id:ns:type:user",
            "id:ns:type::",
            "id:ns:type:n=abc:user",
            "id:ns:type:n=-1:user",
            "id:ns:type:g=:user",
            "id:ns:type:x=1:user",
        ] {
            assert!(
                matches!(DocumentId::parse(bad), Err(FeedError::InvalidId(_))),
                "expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_display_round_trips() {
        for s in [
            "id:ns:type::user",
            "id:ns:type:n=123:user",
            "id:ns:type:g=foo:a:b",
        ] {
            assert_eq!(DocumentId::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_selectors_are_exclusive() {
        let id = DocumentId::new("ns", "type", "user")
            .with_group("g")
            .with_number(7);
        assert_eq!(id.number, Some(7));
        assert_eq!(id.group, None);
    }

    #[test]
    fn test_operation_method() {
        assert_eq!(Operation::Put.method(), Method::POST);
        assert_eq!(Operation::Update.method(), Method::PUT);
        assert_eq!(Operation::Remove.method(), Method::DELETE);
    }

    #[test]
    fn test_document_builders() {
        let id = DocumentId::new("ns", "type", "user");
        let doc = Document::update(id.clone(), r#"{"fields":{}}"#)
            .with_condition("music.year > 2000")
            .with_create(true);
        assert_eq!(doc.operation, Operation::Update);
        assert_eq!(doc.condition.as_deref(), Some("music.year > 2000"));
        assert!(doc.create);
        assert_eq!(doc.to_string(), "update id:ns:type::user");

        let remove = Document::remove(id);
        assert!(remove.body.is_empty());
    }
}
