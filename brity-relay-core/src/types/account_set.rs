//! The persisted account set and the mutations applied to it

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::account::AccountRecord;
use crate::error::{CoreError, CoreResult};

/// A single change to the account set
///
/// Every write path goes through [`AccountSet::apply`], so the uniqueness and
/// single-selection invariants are enforced in one place regardless of the
/// storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountMutation {
    /// Append a new record
    Create(AccountRecord),
    /// Replace the record currently stored under `original_id`, in place
    Update {
        original_id: String,
        record: AccountRecord,
    },
    /// Remove a record
    Delete(String),
    /// Make a record the only selected one
    Select(String),
    /// Clear a record's selected flag
    Deselect(String),
}

impl AccountMutation {
    /// The account ID the mutation addresses before it runs
    pub fn target_id(&self) -> &str {
        match self {
            Self::Create(record) => &record.account_id,
            Self::Update { original_id, .. } => original_id,
            Self::Delete(id) | Self::Select(id) | Self::Deselect(id) => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update { .. } => "update",
            Self::Delete(_) => "delete",
            Self::Select(_) => "select",
            Self::Deselect(_) => "deselect",
        }
    }
}

/// Ordered collection of account records; the unit of persistence
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AccountSet {
    records: Vec<AccountRecord>,
}

impl AccountSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the durable JSON representation.
    ///
    /// Strict: any malformed record or repeated `account_id` makes the whole
    /// document `Corrupt`. Mutations load through here so they never rewrite a
    /// file they could not fully understand.
    pub fn from_json(content: &str) -> CoreResult<Self> {
        let records: Vec<AccountRecord> =
            serde_json::from_str(content).map_err(|e| CoreError::Corrupt(e.to_string()))?;
        let mut seen = std::collections::HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.account_id.as_str()) {
                return Err(CoreError::Corrupt(format!(
                    "duplicate account_id '{}'",
                    record.account_id
                )));
            }
        }
        Ok(Self { records })
    }

    /// Parse the durable JSON representation for reading.
    ///
    /// Records that cannot be decoded are skipped with a warning. A repeated
    /// `account_id` keeps the first position and the last occurrence's content.
    /// Only a document that is not a JSON array is `Corrupt`.
    pub fn from_json_lenient(content: &str) -> CoreResult<Self> {
        let entries: Vec<Value> =
            serde_json::from_str(content).map_err(|e| CoreError::Corrupt(e.to_string()))?;
        let mut records: Vec<AccountRecord> = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let record = match serde_json::from_value::<AccountRecord>(entry) {
                Ok(record) => record,
                Err(e) => {
                    log::warn!("Skipping unreadable account record at index {index}: {e}");
                    continue;
                }
            };
            match records.iter_mut().find(|r| r.account_id == record.account_id) {
                Some(existing) => {
                    log::warn!(
                        "Account '{}' appears more than once; keeping the last entry",
                        record.account_id
                    );
                    *existing = record;
                }
                None => records.push(record),
            }
        }
        Ok(Self { records })
    }

    /// Render the durable JSON representation (pretty-printed, human-editable).
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Persistence(format!("Failed to serialize accounts: {e}")))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AccountRecord> {
        self.records.iter()
    }

    pub fn into_vec(self) -> Vec<AccountRecord> {
        self.records
    }

    pub fn get(&self, account_id: &str) -> Option<&AccountRecord> {
        self.records.iter().find(|r| r.account_id == account_id)
    }

    pub fn selected(&self) -> Option<&AccountRecord> {
        self.records.iter().find(|r| r.is_selected())
    }

    fn position(&self, account_id: &str) -> CoreResult<usize> {
        self.records
            .iter()
            .position(|r| r.account_id == account_id)
            .ok_or_else(|| CoreError::NotFound(account_id.to_string()))
    }

    /// Clear the selected flag on every record except `keep`.
    fn clear_selection_except(&mut self, keep: usize) {
        for (idx, record) in self.records.iter_mut().enumerate() {
            if idx != keep && record.is_selected() {
                record.selected = None;
            }
        }
    }

    /// Apply a mutation in memory.
    ///
    /// Returns the record as it stands after the mutation (the removed record
    /// for `Delete`). On error the set is left unchanged.
    pub fn apply(&mut self, mutation: AccountMutation) -> CoreResult<AccountRecord> {
        match mutation {
            AccountMutation::Create(record) => {
                if self.get(&record.account_id).is_some() {
                    return Err(CoreError::DuplicateId(record.account_id));
                }
                self.records.push(record.clone());
                if record.is_selected() {
                    self.clear_selection_except(self.records.len() - 1);
                }
                Ok(record)
            }
            AccountMutation::Update {
                original_id,
                mut record,
            } => {
                let pos = self.position(&original_id)?;
                let collides = self
                    .records
                    .iter()
                    .enumerate()
                    .any(|(idx, r)| idx != pos && r.account_id == record.account_id);
                if collides {
                    return Err(CoreError::DuplicateId(record.account_id));
                }
                if record.selected.is_none() {
                    record.selected = self.records[pos].selected;
                }
                self.records[pos] = record.clone();
                if record.is_selected() {
                    self.clear_selection_except(pos);
                }
                Ok(record)
            }
            AccountMutation::Delete(account_id) => {
                let pos = self.position(&account_id)?;
                Ok(self.records.remove(pos))
            }
            AccountMutation::Select(account_id) => {
                let pos = self.position(&account_id)?;
                self.records[pos].selected = Some(true);
                self.clear_selection_except(pos);
                Ok(self.records[pos].clone())
            }
            AccountMutation::Deselect(account_id) => {
                let pos = self.position(&account_id)?;
                if self.records[pos].selected.is_some() {
                    self.records[pos].selected = Some(false);
                }
                Ok(self.records[pos].clone())
            }
        }
    }
}

impl From<Vec<AccountRecord>> for AccountSet {
    fn from(records: Vec<AccountRecord>) -> Self {
        Self { records }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> AccountRecord {
        AccountRecord::new(id, format!("{id}@example.com"))
    }

    fn ids(set: &AccountSet) -> Vec<&str> {
        set.iter().map(|r| r.account_id.as_str()).collect()
    }

    fn seeded() -> AccountSet {
        AccountSet::from(vec![record("a"), record("b"), record("c")])
    }

    #[test]
    fn create_appends_and_rejects_duplicates() {
        let mut set = seeded();
        set.apply(AccountMutation::Create(record("d"))).unwrap();
        assert_eq!(ids(&set), ["a", "b", "c", "d"]);

        let before = set.clone();
        let err = set.apply(AccountMutation::Create(record("b"))).unwrap_err();
        assert_eq!(err, CoreError::DuplicateId("b".to_string()));
        assert_eq!(set, before);
    }

    #[test]
    fn create_is_case_sensitive() {
        let mut set = seeded();
        set.apply(AccountMutation::Create(record("A"))).unwrap();
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn update_replaces_in_place() {
        let mut set = seeded();
        let updated = AccountRecord::new("b", "new@example.com");
        set.apply(AccountMutation::Update {
            original_id: "b".to_string(),
            record: updated,
        })
        .unwrap();

        assert_eq!(ids(&set), ["a", "b", "c"]);
        assert_eq!(set.get("b").unwrap().email, "new@example.com");
    }

    #[test]
    fn update_allows_rename_to_free_id() {
        let mut set = seeded();
        set.apply(AccountMutation::Update {
            original_id: "b".to_string(),
            record: record("z"),
        })
        .unwrap();
        assert_eq!(ids(&set), ["a", "z", "c"]);
    }

    #[test]
    fn update_rejects_rename_onto_other_record() {
        let mut set = seeded();
        let before = set.clone();
        let err = set
            .apply(AccountMutation::Update {
                original_id: "b".to_string(),
                record: record("c"),
            })
            .unwrap_err();
        assert_eq!(err, CoreError::DuplicateId("c".to_string()));
        assert_eq!(set, before);
    }

    #[test]
    fn update_missing_is_not_found() {
        let mut set = seeded();
        let err = set
            .apply(AccountMutation::Update {
                original_id: "nope".to_string(),
                record: record("nope"),
            })
            .unwrap_err();
        assert_eq!(err, CoreError::NotFound("nope".to_string()));
    }

    #[test]
    fn update_keeps_selection_when_unspecified() {
        let mut set = seeded();
        set.apply(AccountMutation::Select("b".to_string())).unwrap();
        set.apply(AccountMutation::Update {
            original_id: "b".to_string(),
            record: record("b2"),
        })
        .unwrap();
        assert_eq!(set.selected().unwrap().account_id, "b2");
    }

    #[test]
    fn delete_removes_and_preserves_order() {
        let mut set = seeded();
        let removed = set.apply(AccountMutation::Delete("b".to_string())).unwrap();
        assert_eq!(removed.account_id, "b");
        assert_eq!(ids(&set), ["a", "c"]);

        let err = set
            .apply(AccountMutation::Delete("b".to_string()))
            .unwrap_err();
        assert_eq!(err, CoreError::NotFound("b".to_string()));
    }

    #[test]
    fn select_keeps_at_most_one() {
        let mut set = seeded();
        set.apply(AccountMutation::Select("a".to_string())).unwrap();
        set.apply(AccountMutation::Select("c".to_string())).unwrap();

        let selected: Vec<_> = set.iter().filter(|r| r.is_selected()).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].account_id, "c");
    }

    #[test]
    fn selected_create_takes_over_selection() {
        let mut set = seeded();
        set.apply(AccountMutation::Select("a".to_string())).unwrap();

        let mut fresh = record("d");
        fresh.selected = Some(true);
        set.apply(AccountMutation::Create(fresh)).unwrap();

        assert_eq!(set.iter().filter(|r| r.is_selected()).count(), 1);
        assert_eq!(set.selected().unwrap().account_id, "d");
    }

    #[test]
    fn deselect_clears_flag() {
        let mut set = seeded();
        set.apply(AccountMutation::Select("a".to_string())).unwrap();
        let record = set
            .apply(AccountMutation::Deselect("a".to_string()))
            .unwrap();
        assert!(!record.is_selected());
        assert!(set.selected().is_none());

        // Untouched flag stays absent
        let record = set
            .apply(AccountMutation::Deselect("b".to_string()))
            .unwrap();
        assert_eq!(record.selected, None);
    }

    #[test]
    fn json_roundtrip_keeps_order() {
        let set = seeded();
        let parsed = AccountSet::from_json(&set.to_json().unwrap()).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn corrupt_json_is_reported() {
        assert!(matches!(
            AccountSet::from_json("{\"not\": \"a list\"}"),
            Err(CoreError::Corrupt(_))
        ));
        assert!(matches!(
            AccountSet::from_json("[{\"account_id\": "),
            Err(CoreError::Corrupt(_))
        ));
    }

    const DUPLICATED: &str = r#"[
        {"account_id": "a1", "email": "x@y.com"},
        {"account_id": "b1", "email": "b@y.com"},
        {"account_id": "a1", "email": "z@y.com"}
    ]"#;

    #[test]
    fn repeated_id_is_corrupt_when_strict() {
        match AccountSet::from_json(DUPLICATED) {
            Err(CoreError::Corrupt(msg)) => assert!(msg.contains("a1"), "{msg}"),
            other => panic!("expected Corrupt, got {other:?}"),
        }
    }

    #[test]
    fn repeated_id_keeps_last_entry_when_lenient() {
        let set = AccountSet::from_json_lenient(DUPLICATED).unwrap();
        assert_eq!(ids(&set), ["a1", "b1"]);
        assert_eq!(set.get("a1").unwrap().email, "z@y.com");
    }

    #[test]
    fn lenient_parse_skips_undecodable_records() {
        let content = r#"[
            {"account_id": "a1", "email": "x@y.com"},
            {"email": "orphan@y.com"},
            {"account_id": "c1"},
            "not an object",
            {"account_id": "d1", "email": "d@y.com", "headers": "nope"}
        ]"#;
        let set = AccountSet::from_json_lenient(content).unwrap();
        assert_eq!(ids(&set), ["a1"]);

        assert!(matches!(
            AccountSet::from_json(content),
            Err(CoreError::Corrupt(_))
        ));
    }

    #[test]
    fn lenient_parse_still_requires_an_array() {
        assert!(matches!(
            AccountSet::from_json_lenient("{\"not\": \"a list\"}"),
            Err(CoreError::Corrupt(_))
        ));
    }
}
