use serde::{Deserialize, Deserializer, Serialize};
use chrono::Local;
use std::fmt;
use std::str::FromStr;

// Define task priority enum, ordered high to low
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ORDERED: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ORDERED
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown priority '{}'", s))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: u64,
    pub text: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub date: Option<String>,
    pub priority: Priority,
    #[serde(default)]
    pub additional_info: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub last_modified_by: String,
    #[serde(default)]
    pub last_modified_date: String,
}

impl TaskRecord {
    /// Records `username` as the last mutator, stamped with the current local time.
    pub fn touch(&mut self, username: &str) {
        self.last_modified_by = username.to_string();
        self.last_modified_date = timestamp_now();
    }
}

/// Local wall-clock time in the board's `dd/mm/YYYY, HH:MM:SS` form.
pub fn timestamp_now() -> String {
    Local::now().format("%d/%m/%Y, %H:%M:%S").to_string()
}

// Stored documents use "" for "no due date"
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_stored_document_with_camel_case_keys() {
        let json = r#"{
            "id": 7,
            "text": "Order toner",
            "date": "",
            "priority": "medium",
            "additionalInfo": "two boxes",
            "isCompleted": true,
            "lastModifiedBy": "TAKEDA",
            "lastModifiedDate": "01/02/2025, 10:00:00"
        }"#;

        let task: TaskRecord = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, 7);
        assert_eq!(task.date, None);
        assert_eq!(task.priority, Priority::Medium);
        assert!(task.is_completed);

        let written = serde_json::to_value(&task).unwrap();
        assert_eq!(written["additionalInfo"], "two boxes");
        assert_eq!(written["priority"], "medium");
    }

    #[test]
    fn rejects_unknown_priority() {
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!("low".parse::<Priority>().unwrap(), Priority::Low);
    }

    #[test]
    fn touch_refreshes_attribution() {
        let mut task = TaskRecord {
            id: 1,
            text: "a".into(),
            date: None,
            priority: Priority::Low,
            additional_info: String::new(),
            is_completed: false,
            last_modified_by: "alice".into(),
            last_modified_date: String::new(),
        };
        task.touch("bob");
        assert_eq!(task.last_modified_by, "bob");
        assert!(!task.last_modified_date.is_empty());
    }
}
