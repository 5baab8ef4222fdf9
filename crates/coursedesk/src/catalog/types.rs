/// Types for course catalog data returned by the course and section services
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier used by the catalog services.
///
/// The services are not consistent about this: some return numeric ids,
/// others GUID strings. Both are kept as-is and rendered back verbatim
/// when building request paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{}", n),
            EntityId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        match value.parse::<i64>() {
            Ok(n) => EntityId::Number(n),
            Err(_) => EntityId::Text(value.to_string()),
        }
    }
}

/// A course as returned by `GET /Courses/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: EntityId,

    #[serde(rename = "courseTitle", default)]
    pub course_title: Option<String>,

    /// Total allotted duration in hours. Null, missing or zero means the
    /// course has no duration limit.
    #[serde(rename = "durationHours", default)]
    pub duration_hours: Option<f64>,
}

impl Course {
    /// Total allotted duration in whole minutes, 0 when the course is unlimited.
    pub fn duration_minutes(&self) -> i64 {
        match self.duration_hours {
            Some(hours) if hours.is_finite() && hours > 0.0 => (hours * 60.0).round() as i64,
            _ => 0,
        }
    }
}

/// A section as returned by `GET /Sections/course/{courseId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: EntityId,

    #[serde(rename = "courseId", default)]
    pub course_id: Option<EntityId>,

    #[serde(rename = "sectionTitle", default)]
    pub section_title: Option<String>,

    #[serde(rename = "sectionDescription", default)]
    pub section_description: Option<String>,

    #[serde(rename = "estimatedDurationMinutes", default)]
    pub estimated_duration_minutes: Option<i64>,
}

impl Section {
    /// Committed duration in minutes; missing or negative values count as 0.
    pub fn duration_minutes(&self) -> i64 {
        self.estimated_duration_minutes.unwrap_or(0).max(0)
    }
}

/// Body for `POST /Sections/course/{courseId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSectionRequest {
    #[serde(rename = "sectionTitle")]
    pub section_title: String,

    #[serde(rename = "sectionDescription")]
    pub section_description: String,

    #[serde(rename = "estimatedDurationMinutes")]
    pub estimated_duration_minutes: i64,
}

/// Single-object response. The services either wrap the payload in
/// `{ "data": ... }` or return it bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ItemEnvelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> ItemEnvelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            ItemEnvelope::Wrapped { data } => data,
            ItemEnvelope::Bare(item) => item,
        }
    }
}

/// List response. Seen in the wild as a bare array, `{ "items": [...] }`,
/// `{ "data": [...] }` and `{ "data": { "items": [...] } }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Bare(Vec<T>),
    Items { items: Vec<T> },
    Wrapped { data: Box<ListEnvelope<T>> },
}

impl<T> ListEnvelope<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListEnvelope::Bare(items) | ListEnvelope::Items { items } => items,
            ListEnvelope::Wrapped { data } => data.into_vec(),
        }
    }
}

/// Error body shape used by the services. Any of the fields may carry the
/// human readable message.
#[derive(Debug, Default, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl ServiceErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .or(self.title)
            .filter(|m| !m.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_duration_minutes() {
        let course: Course =
            serde_json::from_str(r#"{ "id": 7, "durationHours": 1.5 }"#).unwrap();
        assert_eq!(course.duration_minutes(), 90);
        assert_eq!(course.id, EntityId::Number(7));
    }

    #[test]
    fn test_course_without_limit() {
        for body in [
            r#"{ "id": 1 }"#,
            r#"{ "id": 1, "durationHours": null }"#,
            r#"{ "id": 1, "durationHours": 0 }"#,
            r#"{ "id": 1, "durationHours": -3 }"#,
        ] {
            let course: Course = serde_json::from_str(body).unwrap();
            assert_eq!(course.duration_minutes(), 0, "body: {}", body);
        }
    }

    #[test]
    fn test_section_missing_duration_counts_as_zero() {
        let section: Section = serde_json::from_str(r#"{ "id": "a1" }"#).unwrap();
        assert_eq!(section.duration_minutes(), 0);
        assert_eq!(section.id, EntityId::Text("a1".to_string()));
    }

    #[test]
    fn test_item_envelope_shapes() {
        let wrapped: ItemEnvelope<Course> =
            serde_json::from_str(r#"{ "data": { "id": 3, "durationHours": 2 } }"#).unwrap();
        assert_eq!(wrapped.into_inner().duration_minutes(), 120);

        let bare: ItemEnvelope<Course> =
            serde_json::from_str(r#"{ "id": 3, "durationHours": 2 }"#).unwrap();
        assert_eq!(bare.into_inner().duration_minutes(), 120);
    }

    #[test]
    fn test_list_envelope_shapes() {
        let bodies = [
            r#"[{ "id": 1, "estimatedDurationMinutes": 30 }]"#,
            r#"{ "items": [{ "id": 1, "estimatedDurationMinutes": 30 }] }"#,
            r#"{ "data": [{ "id": 1, "estimatedDurationMinutes": 30 }] }"#,
            r#"{ "data": { "items": [{ "id": 1, "estimatedDurationMinutes": 30 }] } }"#,
        ];

        for body in bodies {
            let sections = serde_json::from_str::<ListEnvelope<Section>>(body)
                .unwrap()
                .into_vec();
            assert_eq!(sections.len(), 1, "body: {}", body);
            assert_eq!(sections[0].duration_minutes(), 30);
        }
    }

    #[test]
    fn test_create_request_is_camel_case() {
        let request = CreateSectionRequest {
            section_title: "Intro".to_string(),
            section_description: String::new(),
            estimated_duration_minutes: 45,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["sectionTitle"], "Intro");
        assert_eq!(value["estimatedDurationMinutes"], 45);
    }

    #[test]
    fn test_entity_id_from_path_segment() {
        assert_eq!(EntityId::from("42"), EntityId::Number(42));
        assert_eq!(
            EntityId::from("c0ffee-01"),
            EntityId::Text("c0ffee-01".to_string())
        );
        assert_eq!(EntityId::from("42").to_string(), "42");
    }
}
