use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::categories::Category;

/// Todo priority
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "todo_priority")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    #[sea_orm(string_value = "low")]
    Low,
    #[default]
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
}

/// Checklist item of a todo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    pub id: i32,
    pub title: String,
    pub is_completed: bool,
    pub todo_id: i32,
    pub created_at: DateTime<Utc>,
}

/// Todo as returned by the API, with its category and subtasks attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub priority: Priority,
    /// Calendar date, `YYYY-MM-DD`
    pub due_date: Option<NaiveDate>,
    pub has_reminder: bool,
    /// Share of completed subtasks in percent, 0 without subtasks
    pub progress: i32,
    pub user_id: i32,
    pub category_id: Option<i32>,
    pub parent_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category: Option<Category>,
    /// Ordered by creation, oldest first
    pub subtasks: Vec<SubTask>,
}

/// `round(100 * part / whole)` with halves rounded away from zero, 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> i32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 * 100.0 / whole as f64).round() as i32
}

/// Distinguishes an absent field from an explicit `null`.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Query values where an empty string means "not given".
fn empty_as_none<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: FromStr,
    T::Err: fmt::Display,
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate, ToSchema)]
pub struct CreateSubTask {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
}

/// DTO for creating a todo, optionally with its subtasks
#[derive(Debug, Clone, PartialEq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub category_id: Option<i32>,
    pub parent_id: Option<i32>,
    #[serde(default)]
    pub has_reminder: bool,
    #[serde(default)]
    #[validate(nested)]
    pub subtasks: Vec<CreateSubTask>,
}

/// Partial todo update. `null` clears the nullable fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodo {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub is_completed: Option<bool>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<NaiveDate>)]
    pub due_date: Option<Option<NaiveDate>>,
    pub has_reminder: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i32>)]
    pub category_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i32>)]
    pub parent_id: Option<Option<i32>>,
}

impl UpdateTodo {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Filters for listing todos, combined with AND
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TodoFilter {
    /// Case-insensitive substring of the title or description
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(max = 255))]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category_id: Option<i32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub is_completed: Option<bool>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub due_date: Option<NaiveDate>,
}

impl TodoFilter {
    pub fn matches(&self, todo: &Todo) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_title = todo.title.to_lowercase().contains(&needle);
            let in_description = todo
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_title && !in_description {
                return false;
            }
        }
        self.priority.is_none_or(|p| todo.priority == p)
            && self.category_id.is_none_or(|c| todo.category_id == Some(c))
            && self.is_completed.is_none_or(|c| todo.is_completed == c)
            && self.due_date.is_none_or(|d| todo.due_date == Some(d))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubTask {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub is_completed: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BatchDelete {
    #[validate(length(min = 1))]
    pub ids: Vec<i32>,
}

/// Ids plus the fields to set on each of them
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BatchUpdate {
    #[validate(length(min = 1))]
    pub ids: Vec<i32>,
    #[serde(flatten)]
    #[validate(nested)]
    pub changes: UpdateTodo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BatchResult {
    pub affected: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriorityStats {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Aggregates over all todos of a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Percent of completed todos
    pub completion_rate: i32,
    pub priority_stats: PriorityStats,
    /// Open todos whose due date (midnight UTC) has passed
    pub overdue_count: usize,
}

impl Statistics {
    /// A due date counts from midnight UTC, so an open todo is overdue on its due day.
    pub fn from_todos(todos: &[Todo], now: DateTime<Utc>) -> Self {
        let mut stats = Self {
            total: todos.len(),
            ..Self::default()
        };

        for todo in todos {
            if todo.is_completed {
                stats.completed += 1;
            } else if todo
                .due_date
                .is_some_and(|due| due.and_time(NaiveTime::MIN).and_utc() < now)
            {
                stats.overdue_count += 1;
            }
            match todo.priority {
                Priority::High => stats.priority_stats.high += 1,
                Priority::Medium => stats.priority_stats.medium += 1,
                Priority::Low => stats.priority_stats.low += 1,
            }
        }

        stats.pending = stats.total - stats.completed;
        stats.completion_rate = percentage(stats.completed, stats.total);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(id: i32, priority: Priority, completed: bool, due: Option<NaiveDate>) -> Todo {
        Todo {
            id,
            title: format!("Todo {}", id),
            description: None,
            is_completed: completed,
            priority,
            due_date: due,
            has_reminder: false,
            progress: 0,
            user_id: 1,
            category_id: None,
            parent_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            category: None,
            subtasks: vec![],
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(0, 3), 0);
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(3, 3), 100);
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_statistics() {
        let now = at("2026-10-16T09:30:00Z");
        let todos = vec![
            todo(1, Priority::High, true, Some(date("2026-10-01"))),
            todo(2, Priority::High, false, Some(date("2026-10-15"))),
            todo(3, Priority::Medium, false, Some(date("2026-10-16"))),
            todo(4, Priority::Low, false, None),
        ];

        let stats = Statistics::from_todos(&todos, now);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.completion_rate, 25);
        assert_eq!(
            stats.priority_stats,
            PriorityStats {
                high: 2,
                medium: 1,
                low: 1
            }
        );
        // due yesterday and due today; the completed one does not count
        assert_eq!(stats.overdue_count, 2);
    }

    #[test]
    fn test_due_date_is_overdue_from_midnight_utc() {
        let due_today = [todo(1, Priority::Medium, false, Some(date("2026-10-16")))];

        let at_midnight = Statistics::from_todos(&due_today, at("2026-10-16T00:00:00Z"));
        assert_eq!(at_midnight.overdue_count, 0);

        let just_after = Statistics::from_todos(&due_today, at("2026-10-16T00:00:01Z"));
        assert_eq!(just_after.overdue_count, 1);

        let day_before = Statistics::from_todos(&due_today, at("2026-10-15T23:59:59Z"));
        assert_eq!(day_before.overdue_count, 0);
    }

    #[test]
    fn test_statistics_empty() {
        let stats = Statistics::from_todos(&[], at("2026-10-16T12:00:00Z"));
        assert_eq!(stats, Statistics::default());
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let update: UpdateTodo =
            serde_json::from_str(r#"{"description": null, "priority": "high"}"#).unwrap();
        assert_eq!(update.description, Some(None));
        assert_eq!(update.due_date, None);
        assert_eq!(update.priority, Some(Priority::High));
        assert!(!update.is_empty());

        let update: UpdateTodo = serde_json::from_str("{}").unwrap();
        assert!(update.is_empty());
    }

    #[test]
    fn test_batch_update_flattens_changes() {
        let batch: BatchUpdate =
            serde_json::from_str(r#"{"ids": [1, 2], "isCompleted": true, "categoryId": null}"#)
                .unwrap();
        assert_eq!(batch.ids, vec![1, 2]);
        assert_eq!(batch.changes.is_completed, Some(true));
        assert_eq!(batch.changes.category_id, Some(None));
    }

    #[test]
    fn test_create_defaults() {
        let input: CreateTodo = serde_json::from_str(r#"{"title": "Report"}"#).unwrap();
        assert_eq!(input.priority, Priority::Medium);
        assert!(!input.has_reminder);
        assert!(input.subtasks.is_empty());
    }

    #[test]
    fn test_filter_matches() {
        let mut report = todo(1, Priority::High, false, Some(date("2026-10-20")));
        report.title = "Quarterly REPORT".into();
        report.description = Some("numbers".into());

        let by_search = TodoFilter {
            search: Some("report".into()),
            ..TodoFilter::default()
        };
        assert!(by_search.matches(&report));

        let by_description = TodoFilter {
            search: Some("NUMB".into()),
            ..TodoFilter::default()
        };
        assert!(by_description.matches(&report));

        let conjunction = TodoFilter {
            search: Some("report".into()),
            priority: Some(Priority::Low),
            ..TodoFilter::default()
        };
        assert!(!conjunction.matches(&report));

        assert!(TodoFilter::default().matches(&report));
    }

    #[test]
    fn test_priority_parses_lowercase() {
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(Priority::Low.to_string(), "low");
        assert!("urgent".parse::<Priority>().is_err());
    }
}
