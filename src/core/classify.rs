use super::rates::RetentionType;
use std::collections::HashMap;

/// Retention type applied to subcategories missing from the classification table
pub const DEFAULT_RETENTION_TYPE: RetentionType = RetentionType::Services;

/// Maps expense subcategory identifiers to their retention type.
///
/// Classification is total: unknown identifiers fall back to
/// [`DEFAULT_RETENTION_TYPE`]. Use [`RetentionClassifier::lookup`] to tell
/// whether an identifier is actually mapped.
#[derive(Debug, Clone, Default)]
pub struct RetentionClassifier {
    table: HashMap<String, RetentionType>,
}

impl RetentionClassifier {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, RetentionType)>,
        S: Into<String>,
    {
        RetentionClassifier {
            table: entries
                .into_iter()
                .map(|(subcategory, retention_type)| (subcategory.into(), retention_type))
                .collect(),
        }
    }

    pub fn classify(&self, subcategory_id: &str) -> RetentionType {
        match self.lookup(subcategory_id) {
            Some(retention_type) => retention_type,
            None => {
                log::debug!(
                    "Subcategory {:?} not classified, using {:?}",
                    subcategory_id,
                    DEFAULT_RETENTION_TYPE
                );
                DEFAULT_RETENTION_TYPE
            }
        }
    }

    pub fn lookup(&self, subcategory_id: &str) -> Option<RetentionType> {
        self.table.get(subcategory_id).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
