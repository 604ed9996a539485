//! Grouping of indexers that share a category configuration.

use serde::Serialize;

use crate::config::IndexerConfig;

use super::ContentType;

/// Indexers queried together with one shared category list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexerGroup {
    /// Sorted, deduplicated category IDs.
    pub categories: Vec<u32>,
    /// Member indexer IDs in configuration order.
    pub indexer_ids: Vec<u32>,
}

impl IndexerGroup {
    /// Short label for logs.
    pub fn label(&self) -> String {
        let cats: Vec<String> = self.categories.iter().map(|c| c.to_string()).collect();
        format!("[{}]", cats.join(","))
    }
}

/// An enabled indexer left out because it has no categories for the content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedIndexer {
    pub id: u32,
    pub name: String,
}

/// Result of grouping indexers for one content type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexerGrouping {
    pub groups: Vec<IndexerGroup>,
    pub skipped_indexers: Vec<SkippedIndexer>,
}

impl IndexerGrouping {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Category IDs an indexer should be queried with for a content type.
pub fn effective_categories(indexer: &IndexerConfig, content_type: ContentType) -> Vec<u32> {
    let mut categories = match content_type {
        ContentType::Audio => indexer.audio_categories.clone(),
        ContentType::Text => indexer.text_categories.clone(),
    };
    categories.sort_unstable();
    categories.dedup();
    categories
}

/// Partition enabled indexers by identical category configuration.
///
/// Two indexers share a group when their effective category sets are equal,
/// regardless of configured order. Groups come out in the order their
/// category set was first seen. Disabled indexers are ignored; enabled
/// indexers without categories land in `skipped_indexers`.
pub fn group_indexers_by_categories(
    indexers: &[IndexerConfig],
    content_type: ContentType,
) -> IndexerGrouping {
    let mut grouping = IndexerGrouping::default();

    for indexer in indexers.iter().filter(|i| i.enabled) {
        let categories = effective_categories(indexer, content_type);
        if categories.is_empty() {
            grouping.skipped_indexers.push(SkippedIndexer {
                id: indexer.id,
                name: indexer.name.clone(),
            });
            continue;
        }

        match grouping
            .groups
            .iter_mut()
            .find(|g| g.categories == categories)
        {
            Some(group) => group.indexer_ids.push(indexer.id),
            None => grouping.groups.push(IndexerGroup {
                categories,
                indexer_ids: vec![indexer.id],
            }),
        }
    }

    grouping
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexer(id: u32, enabled: bool, audio: &[u32], text: &[u32]) -> IndexerConfig {
        IndexerConfig {
            id,
            name: format!("indexer-{}", id),
            enabled,
            priority: 10,
            audio_categories: audio.to_vec(),
            text_categories: text.to_vec(),
        }
    }

    #[test]
    fn test_identical_categories_share_group() {
        let indexers = vec![
            indexer(1, true, &[3030], &[]),
            indexer(2, true, &[3030], &[]),
            indexer(3, true, &[3030, 3040], &[]),
        ];
        let grouping = group_indexers_by_categories(&indexers, ContentType::Audio);

        assert_eq!(grouping.groups.len(), 2);
        assert_eq!(grouping.groups[0].categories, vec![3030]);
        assert_eq!(grouping.groups[0].indexer_ids, vec![1, 2]);
        assert_eq!(grouping.groups[1].categories, vec![3030, 3040]);
        assert_eq!(grouping.groups[1].indexer_ids, vec![3]);
        assert!(grouping.skipped_indexers.is_empty());
    }

    #[test]
    fn test_category_order_is_irrelevant() {
        let indexers = vec![
            indexer(1, true, &[3040, 3030], &[]),
            indexer(2, true, &[3030, 3040, 3030], &[]),
        ];
        let grouping = group_indexers_by_categories(&indexers, ContentType::Audio);

        assert_eq!(grouping.groups.len(), 1);
        assert_eq!(grouping.groups[0].categories, vec![3030, 3040]);
        assert_eq!(grouping.groups[0].indexer_ids, vec![1, 2]);
    }

    #[test]
    fn test_empty_categories_are_skipped() {
        let indexers = vec![
            indexer(1, true, &[3030], &[]),
            indexer(2, true, &[], &[7020]),
        ];
        let audio = group_indexers_by_categories(&indexers, ContentType::Audio);
        assert_eq!(audio.groups.len(), 1);
        assert_eq!(audio.skipped_indexers.len(), 1);
        assert_eq!(audio.skipped_indexers[0].id, 2);

        let text = group_indexers_by_categories(&indexers, ContentType::Text);
        assert_eq!(text.groups.len(), 1);
        assert_eq!(text.groups[0].indexer_ids, vec![2]);
        assert_eq!(text.skipped_indexers[0].id, 1);
    }

    #[test]
    fn test_disabled_indexers_ignored() {
        let indexers = vec![indexer(1, false, &[3030], &[]), indexer(2, false, &[], &[])];
        let grouping = group_indexers_by_categories(&indexers, ContentType::Audio);
        assert!(grouping.is_empty());
        assert!(grouping.skipped_indexers.is_empty());
    }

    #[test]
    fn test_every_enabled_indexer_appears_exactly_once() {
        let indexers = vec![
            indexer(1, true, &[3030], &[]),
            indexer(2, true, &[3040], &[]),
            indexer(3, true, &[], &[]),
            indexer(4, true, &[3030], &[]),
            indexer(5, false, &[3030], &[]),
            indexer(6, true, &[3040], &[]),
        ];
        let grouping = group_indexers_by_categories(&indexers, ContentType::Audio);

        let mut grouped: Vec<u32> = grouping
            .groups
            .iter()
            .flat_map(|g| g.indexer_ids.clone())
            .collect();
        grouped.sort();
        assert_eq!(grouped, vec![1, 2, 4, 6]);
        assert_eq!(
            grouping.skipped_indexers,
            vec![SkippedIndexer {
                id: 3,
                name: "indexer-3".to_string()
            }]
        );
    }

    #[test]
    fn test_grouping_is_deterministic() {
        let indexers = vec![
            indexer(9, true, &[3040], &[]),
            indexer(2, true, &[3030], &[]),
            indexer(5, true, &[3040], &[]),
        ];
        let first = group_indexers_by_categories(&indexers, ContentType::Audio);
        let second = group_indexers_by_categories(&indexers, ContentType::Audio);
        assert_eq!(first, second);
        assert_eq!(first.groups[0].categories, vec![3040]);
        assert_eq!(first.groups[0].indexer_ids, vec![9, 5]);
    }

    #[test]
    fn test_group_label() {
        let group = IndexerGroup {
            categories: vec![3030, 3040],
            indexer_ids: vec![1],
        };
        assert_eq!(group.label(), "[3030,3040]");
    }
}
