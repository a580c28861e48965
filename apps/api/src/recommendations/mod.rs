//! Recommendation Joiner: resolves the model's picks back to full catalog records.
//!
//! Exact id match by linear scan, first match wins. Unknown ids are dropped with a
//! warning and never reach the caller. Input order is preserved; nothing is re-ranked.

use serde::Serialize;
use tracing::warn;

use crate::analysis::RecommendationMode;
use crate::models::analysis::{AnalysisResult, RecommendationPick};
use crate::models::furniture::FurnitureRecord;

/// A catalog record surfaced to the page, with the model's reason in ranked mode.
/// Serializes as the record's own fields plus an optional `reason`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFurniture {
    #[serde(flatten)]
    pub item: FurnitureRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub fn find_by_id<'a>(catalog: &'a [FurnitureRecord], id: &str) -> Option<&'a FurnitureRecord> {
    catalog.iter().find(|record| record.id == id)
}

/// Simple mode: each id becomes its bare record.
pub fn resolve_ids(ids: &[String], catalog: &[FurnitureRecord]) -> Vec<ResolvedFurniture> {
    ids.iter()
        .filter_map(|id| {
            let Some(record) = find_by_id(catalog, id) else {
                warn!("Furniture item not found for id: {id}");
                return None;
            };
            Some(ResolvedFurniture {
                item: record.clone(),
                reason: None,
            })
        })
        .collect()
}

/// Ranked mode: each pick becomes its record paired with the justification.
/// A blank reason is dropped rather than surfaced as an empty string.
pub fn resolve_ranked(
    picks: &[RecommendationPick],
    catalog: &[FurnitureRecord],
) -> Vec<ResolvedFurniture> {
    picks
        .iter()
        .filter_map(|pick| {
            let Some(record) = find_by_id(catalog, &pick.furniture_id) else {
                warn!("Furniture item not found for id: {}", pick.furniture_id);
                return None;
            };
            Some(ResolvedFurniture {
                item: record.clone(),
                reason: (!pick.reason.trim().is_empty()).then(|| pick.reason.clone()),
            })
        })
        .collect()
}

/// Resolves whichever furniture key the analysis carries for `mode`.
///
/// If the model answered with the other mode's key instead, that list is used.
pub fn resolve_analysis(
    analysis: &AnalysisResult,
    mode: RecommendationMode,
    catalog: &[FurnitureRecord],
) -> Vec<ResolvedFurniture> {
    let use_ranked = match mode {
        RecommendationMode::Ranked => {
            !analysis.recommendations.is_empty() || analysis.furniture_ids.is_empty()
        }
        RecommendationMode::Simple => {
            analysis.furniture_ids.is_empty() && !analysis.recommendations.is_empty()
        }
    };

    if use_ranked {
        resolve_ranked(&analysis.recommendations, catalog)
    } else {
        resolve_ids(&analysis.furniture_ids, catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Shared sink for formatted log lines emitted during a test.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        (result, buffer.contents())
    }

    fn record(id: &str) -> FurnitureRecord {
        serde_json::from_value(json!({"id": id, "name": format!("Item {id}")})).unwrap()
    }

    fn abc_catalog() -> Vec<FurnitureRecord> {
        vec![record("a"), record("b"), record("c")]
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unknown_id_is_dropped() {
        let resolved = resolve_ids(&ids(&["b", "z"]), &abc_catalog());
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].item, record("b"));
        assert!(resolved[0].reason.is_none());
    }

    #[test]
    fn test_unknown_id_logs_a_warning() {
        let (resolved, logs) =
            with_captured_logs(|| resolve_ids(&ids(&["b", "z"]), &abc_catalog()));
        assert_eq!(resolved.len(), 1);

        let warnings: Vec<_> = logs.lines().filter(|l| l.contains("WARN")).collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Furniture item not found for id: z"));
    }

    #[test]
    fn test_unknown_ranked_pick_logs_a_warning() {
        let picks = vec![RecommendationPick {
            furniture_id: "ghost".to_string(),
            reason: "n/a".to_string(),
        }];
        let (resolved, logs) = with_captured_logs(|| resolve_ranked(&picks, &abc_catalog()));
        assert!(resolved.is_empty());
        assert!(logs.contains("WARN"));
        assert!(logs.contains("Furniture item not found for id: ghost"));
    }

    #[test]
    fn test_output_shrinks_by_number_of_misses() {
        let input = ids(&["x", "a", "y", "c", "z"]);
        let resolved = resolve_ids(&input, &abc_catalog());
        assert_eq!(resolved.len(), input.len() - 3);
    }

    #[test]
    fn test_input_order_preserved() {
        let resolved = resolve_ids(&ids(&["c", "a", "b"]), &abc_catalog());
        let order: Vec<_> = resolved.iter().map(|r| r.item.id.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_repeated_id_resolves_each_time() {
        let resolved = resolve_ids(&ids(&["a", "a"]), &abc_catalog());
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_lookup_is_exact() {
        let resolved = resolve_ids(&ids(&["A", " a", "a "]), &abc_catalog());
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_duplicate_catalog_ids_first_wins() {
        let mut first = record("dup");
        first.name = "First".to_string();
        let mut second = record("dup");
        second.name = "Second".to_string();

        let resolved = resolve_ids(&ids(&["dup"]), &[first, second]);
        assert_eq!(resolved[0].item.name, "First");
    }

    #[test]
    fn test_ranked_pairs_record_with_reason() {
        let picks = vec![
            RecommendationPick {
                furniture_id: "c".to_string(),
                reason: "Warm tones".to_string(),
            },
            RecommendationPick {
                furniture_id: "missing".to_string(),
                reason: "n/a".to_string(),
            },
            RecommendationPick {
                furniture_id: "a".to_string(),
                reason: "Compact".to_string(),
            },
        ];
        let resolved = resolve_ranked(&picks, &abc_catalog());
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].item.id, "c");
        assert_eq!(resolved[0].reason.as_deref(), Some("Warm tones"));
        assert_eq!(resolved[1].item.id, "a");
    }

    #[test]
    fn test_blank_reason_is_omitted() {
        let picks = vec![
            RecommendationPick {
                furniture_id: "a".to_string(),
                reason: String::new(),
            },
            RecommendationPick {
                furniture_id: "b".to_string(),
                reason: "  ".to_string(),
            },
        ];
        let resolved = resolve_ranked(&picks, &abc_catalog());
        assert_eq!(resolved.len(), 2);
        assert!(resolved.iter().all(|r| r.reason.is_none()));

        let value = serde_json::to_value(&resolved[0]).unwrap();
        assert!(value.get("reason").is_none());
    }

    #[test]
    fn test_resolve_analysis_uses_mode_key() {
        let analysis = AnalysisResult {
            furniture_ids: ids(&["a"]),
            recommendations: vec![RecommendationPick {
                furniture_id: "b".to_string(),
                reason: "r".to_string(),
            }],
            ..Default::default()
        };
        let simple = resolve_analysis(&analysis, RecommendationMode::Simple, &abc_catalog());
        assert_eq!(simple[0].item.id, "a");
        let ranked = resolve_analysis(&analysis, RecommendationMode::Ranked, &abc_catalog());
        assert_eq!(ranked[0].item.id, "b");
    }

    #[test]
    fn test_resolve_analysis_falls_back_to_other_key() {
        let analysis = AnalysisResult {
            furniture_ids: ids(&["b", "z"]),
            ..Default::default()
        };
        let resolved = resolve_analysis(&analysis, RecommendationMode::Ranked, &abc_catalog());
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].item.id, "b");
    }

    #[test]
    fn test_empty_analysis_resolves_to_nothing() {
        let analysis = AnalysisResult::default();
        assert!(resolve_analysis(&analysis, RecommendationMode::Ranked, &abc_catalog()).is_empty());
        assert!(resolve_analysis(&analysis, RecommendationMode::Simple, &abc_catalog()).is_empty());
    }

    #[test]
    fn test_serializes_flat_with_optional_reason() {
        let plain = serde_json::to_value(ResolvedFurniture {
            item: record("a"),
            reason: None,
        })
        .unwrap();
        assert_eq!(plain["id"], "a");
        assert_eq!(plain["name"], "Item a");
        assert!(plain.get("reason").is_none());

        let ranked = serde_json::to_value(ResolvedFurniture {
            item: record("a"),
            reason: Some("fits".to_string()),
        })
        .unwrap();
        assert_eq!(ranked["reason"], "fits");
    }
}
