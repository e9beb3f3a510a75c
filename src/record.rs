use serde::{Deserialize, Serialize};

/// One email row as supplied by a row source. Every field defaults to `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailRecord {
    pub id: String,
    pub sender: String,
    pub subject: String,
    pub body: String,
    pub links: String,
    pub attachments: String,
}

impl EmailRecord {
    /// Build a record from `(field, value)` pairs, e.g. a CSV row zipped with its
    /// header. Field names are matched case-insensitively; unknown names are ignored.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut record = Self::default();
        for (key, value) in fields {
            let value = value.as_ref().to_string();
            match key.as_ref().trim().to_lowercase().as_str() {
                "id" => record.id = value,
                "sender" => record.sender = value,
                "subject" => record.subject = value,
                "body" => record.body = value,
                "links" => record.links = value,
                "attachments" => record.attachments = value,
                _ => {}
            }
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_fields_ignores_unknown_keys() {
        let mut row = HashMap::new();
        row.insert("id", "7");
        row.insert("Sender", "alerts@bank.example");
        row.insert("x-priority", "1");

        let record = EmailRecord::from_fields(row);
        assert_eq!(record.id, "7");
        assert_eq!(record.sender, "alerts@bank.example");
        assert_eq!(record.subject, "");
        assert_eq!(record.attachments, "");
    }
}
