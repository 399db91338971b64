//! Result normalization: heterogeneous SPARQL rows → a flat answer list.

use crate::service::Row;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// A single answer. Serialized untagged: text answers are bare strings,
/// measurements are `{"population": ..., "point": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Measurement {
        #[serde(rename = "population")]
        value: String,
        #[serde(rename = "point")]
        point_in_time: Option<String>,
    },
    Text(String),
}

impl Answer {
    /// Human-readable rendering (`68373433 (as of 2024-01-01)`).
    pub fn display(&self) -> String {
        match self {
            Answer::Text(text) => text.clone(),
            Answer::Measurement {
                value,
                point_in_time: None,
            } => value.clone(),
            Answer::Measurement {
                value,
                point_in_time: Some(point),
            } => match parse_point_in_time(point) {
                Some(date) => format!("{value} (as of {})", date.format("%Y-%m-%d")),
                None => format!("{value} (as of {point})"),
            },
        }
    }
}

fn parse_point_in_time(point: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(point) {
        return Some(dt.date_naive());
    }
    // WDQS emits xsd:dateTime without an offset for some precisions.
    NaiveDate::parse_from_str(point.get(..10)?, "%Y-%m-%d").ok()
}

/// Project each row by the first field shape it carries; rows with none of
/// the known shapes are dropped. Row order is answer order.
pub fn normalize(rows: &[Row]) -> Vec<Answer> {
    rows.iter().filter_map(normalize_row).collect()
}

fn normalize_row(row: &Row) -> Option<Answer> {
    if let Some(label) = row.get("answerLabel") {
        return Some(Answer::Text(label.value.clone()));
    }
    if let Some(answer) = row.get("answer") {
        return Some(Answer::Text(answer.value.clone()));
    }
    if let Some(population) = row.get("population") {
        return Some(Answer::Measurement {
            value: population.value.clone(),
            point_in_time: row.get("point").map(|b| b.value.clone()),
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::Binding;

    fn row(fields: &[(&str, &str)]) -> Row {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), Binding::literal(*v)))
            .collect()
    }

    #[test]
    fn empty_rows_give_no_answers() {
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn label_shape_wins_over_bare_value() {
        let rows = vec![
            Row::from([
                ("answer".to_string(), Binding::uri("http://www.wikidata.org/entity/Q90")),
                ("answerLabel".to_string(), Binding::literal("Paris")),
            ]),
            Row::from([(
                "answer".to_string(),
                Binding::uri("http://www.wikidata.org/entity/Q1490"),
            )]),
        ];
        assert_eq!(
            normalize(&rows),
            vec![
                Answer::Text("Paris".into()),
                Answer::Text("http://www.wikidata.org/entity/Q1490".into()),
            ]
        );
        assert_eq!(rows[1]["answer"].kind, "uri");
    }

    #[test]
    fn unrecognized_rows_are_dropped_in_place() {
        let rows = vec![
            row(&[("answerLabel", "Lyon")]),
            row(&[("mystery", "42")]),
            row(&[("answer", "http://www.wikidata.org/entity/Q1")]),
            row(&[("population", "68373433"), ("point", "2023-01-01T00:00:00Z")]),
            row(&[("population", "1000")]),
        ];
        assert_eq!(
            normalize(&rows),
            vec![
                Answer::Text("Lyon".into()),
                Answer::Text("http://www.wikidata.org/entity/Q1".into()),
                Answer::Measurement {
                    value: "68373433".into(),
                    point_in_time: Some("2023-01-01T00:00:00Z".into()),
                },
                Answer::Measurement {
                    value: "1000".into(),
                    point_in_time: None,
                },
            ]
        );
    }

    #[test]
    fn answers_serialize_in_the_flat_shape() {
        let answers = vec![
            Answer::Text("Paris".into()),
            Answer::Measurement {
                value: "5".into(),
                point_in_time: None,
            },
        ];
        assert_eq!(
            serde_json::to_value(&answers).expect("serialize"),
            serde_json::json!(["Paris", {"population": "5", "point": null}])
        );
    }

    #[test]
    fn display_renders_point_in_time_as_date() {
        let a = Answer::Measurement {
            value: "1428627663".into(),
            point_in_time: Some("2023-07-01T00:00:00Z".into()),
        };
        assert_eq!(a.display(), "1428627663 (as of 2023-07-01)");
        let b = Answer::Measurement {
            value: "7".into(),
            point_in_time: Some("sometime".into()),
        };
        assert_eq!(b.display(), "7 (as of sometime)");
        assert_eq!(Answer::Text("Paris".into()).display(), "Paris");
    }
}
