//! Async locate surface
//!
//! Index build and matching are CPU bound, so [`PageLocator`] runs them on
//! the blocking pool and bounds the whole call by the configured timeout.

use crate::config::LocatorConfig;
use crate::errors::LocatorError;
use crate::finder::ControlFinder;
use crate::identifier::ControlCategory;
use crate::node::PageTree;
use crate::page_index::PageTextIndex;
use crate::pattern::grow_pattern_cache_capacity;
use crate::weighted::{Entry, WeightedControlList};
use crate::wpath::WPath;
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Best control plus everything that competed with it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocateOutcome {
    pub best: Option<Entry>,

    /// Sorted, one entry per control
    pub ranked: Vec<Entry>,

    /// Every raw entry in ranking order, for diagnostics
    pub evidence: Vec<Entry>,
}

impl LocateOutcome {
    pub fn from_list(list: &WeightedControlList) -> Self {
        let ranked = list.entries_sorted();
        Self {
            best: ranked.first().cloned(),
            ranked,
            evidence: list.entries_ranked(),
        }
    }

    /// Number of controls found by the same dimension as the best one
    pub fn contenders(&self) -> usize {
        match &self.best {
            Some(best) => self
                .ranked
                .iter()
                .filter(|entry| entry.found_type == best.found_type)
                .count(),
            None => 0,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        self.contenders() > 1
    }
}

/// Locator trait
#[async_trait]
pub trait ControlLocator: Send + Sync {
    /// Best control of `category` for the raw locator
    async fn locate(
        &self,
        category: ControlCategory,
        raw: &str,
    ) -> Result<LocateOutcome, LocatorError>;

    /// All weighted candidates of `category`
    async fn candidates(
        &self,
        category: ControlCategory,
        raw: &str,
    ) -> Result<WeightedControlList, LocatorError>;
}

#[derive(Debug, Clone, Copy)]
enum Search {
    Category(ControlCategory),
    Text,
}

/// Locator over one page snapshot
///
/// The text index is built on first use and shared by later calls.
pub struct PageLocator<T: PageTree + Send + Sync + 'static> {
    tree: Arc<T>,
    index: Arc<OnceCell<PageTextIndex>>,
    config: LocatorConfig,
}

impl<T: PageTree + Send + Sync + 'static> PageLocator<T> {
    pub fn new(tree: Arc<T>) -> Result<Self, LocatorError> {
        Self::with_config(tree, LocatorConfig::default())
    }

    /// The compiled-pattern cache is process wide; a larger
    /// `pattern_cache_capacity` grows it, a smaller one leaves it alone
    pub fn with_config(tree: Arc<T>, config: LocatorConfig) -> Result<Self, LocatorError> {
        config.validate()?;
        grow_pattern_cache_capacity(config.pattern_cache_capacity)?;
        Ok(Self {
            tree,
            index: Arc::new(OnceCell::new()),
            config,
        })
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Elements that are no known control, located by id or text
    pub async fn text_candidates(&self, raw: &str) -> Result<WeightedControlList, LocatorError> {
        self.search(Search::Text, raw).await
    }

    async fn search(&self, search: Search, raw: &str) -> Result<WeightedControlList, LocatorError> {
        let wpath = WPath::parse_with(raw, &self.config)?;
        debug!("Searching {:?} for '{}'", search, wpath);

        let tree = Arc::clone(&self.tree);
        let index = Arc::clone(&self.index);
        let config = self.config.clone();
        let task = tokio::task::spawn_blocking(move || {
            let index = index.get_or_init(|| PageTextIndex::build(tree.as_ref()));
            let finder = ControlFinder::with_config(tree.as_ref(), index, config);
            match search {
                Search::Category(category) => finder.find(category, &wpath),
                Search::Text => finder.all_controls_for_text(&wpath),
            }
        });

        let joined = match self.config.locate_timeout() {
            Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| {
                LocatorError::Timeout(format!("'{}' not located within {:?}", raw, limit))
            })?,
            None => task.await,
        };
        joined.map_err(|e| LocatorError::Internal(format!("Locate task failed: {}", e)))
    }
}

#[async_trait]
impl<T: PageTree + Send + Sync + 'static> ControlLocator for PageLocator<T> {
    async fn locate(
        &self,
        category: ControlCategory,
        raw: &str,
    ) -> Result<LocateOutcome, LocatorError> {
        let list = self.search(Search::Category(category), raw).await?;
        let outcome = LocateOutcome::from_list(&list);

        match &outcome.best {
            Some(best) => info!("Located {} control for '{}': {}", category, raw, best),
            None => info!("No {} control matches '{}'", category, raw),
        }
        if self.config.warn_on_ambiguous && outcome.is_ambiguous() {
            warn!(
                "Ambiguous locator '{}': {} controls found by {}",
                raw,
                outcome.contenders(),
                outcome.best.as_ref().map_or("-", |best| best.found_type.name())
            );
        }
        Ok(outcome)
    }

    async fn candidates(
        &self,
        category: ControlCategory,
        raw: &str,
    ) -> Result<WeightedControlList, LocatorError> {
        self.search(Search::Category(category), raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{Control, ControlKind};
    use crate::dom::StaticPage;
    use crate::node::NodeId;
    use crate::types::FoundType;

    fn locator(markup: &str) -> PageLocator<StaticPage> {
        PageLocator::new(Arc::new(StaticPage::from_html(markup))).unwrap()
    }

    fn entry(node: u32, found_type: FoundType, deviation: i32) -> Entry {
        Entry {
            control: Control::new(NodeId(node), ControlKind::Anchor, format!("[a{}]", node)),
            found_type,
            deviation,
            distance: 0,
            start: 0,
            hierarchy: String::new(),
            index: node as usize,
        }
    }

    #[test]
    fn test_outcome_contenders() {
        let list = WeightedControlList::new();
        list.add_entry(entry(1, FoundType::ByLabel, 2));
        list.add_entry(entry(2, FoundType::ByLabel, 0));
        list.add_entry(entry(2, FoundType::ByName, 0));
        list.add_entry(entry(3, FoundType::ByText, 0));

        let outcome = LocateOutcome::from_list(&list);
        assert_eq!(outcome.best.as_ref().unwrap().control.node(), NodeId(2));
        assert_eq!(outcome.ranked.len(), 3);
        assert_eq!(outcome.evidence.len(), 4);
        assert_eq!(outcome.contenders(), 1);
        assert!(!outcome.is_ambiguous());
    }

    #[test]
    fn test_empty_outcome() {
        let outcome = LocateOutcome::from_list(&WeightedControlList::new());
        assert!(outcome.best.is_none());
        assert_eq!(outcome.contenders(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = LocatorConfig {
            pattern_cache_capacity: 0,
            ..LocatorConfig::default()
        };
        let result = PageLocator::with_config(Arc::new(StaticPage::from_html("")), config);
        assert!(matches!(result, Err(LocatorError::Config(_))));
    }

    #[test]
    fn test_small_cache_config_does_not_shrink_cache() {
        let config = LocatorConfig {
            pattern_cache_capacity: 1,
            ..LocatorConfig::default()
        };
        PageLocator::with_config(Arc::new(StaticPage::from_html("")), config).unwrap();
        assert!(crate::pattern::pattern_cache_capacity() >= 256);
    }

    #[tokio::test]
    async fn test_locate_button() {
        let locator = locator(
            "<p>Login</p><input id='user' type='text'>\
             <input id='submit' type='submit' value='Sign in'>",
        );
        let outcome = locator
            .locate(ControlCategory::Clickable, "Sign in")
            .await
            .unwrap();
        let best = outcome.best.unwrap();
        assert_eq!(best.found_type, FoundType::ByLabel);
        assert_eq!(best.control.kind(), ControlKind::InputButton);
    }

    #[tokio::test]
    async fn test_invalid_path_is_reported() {
        let locator = locator("<input id='a' type='text'>");
        let result = locator
            .locate(ControlCategory::Settable, "[x] > a > [y] > b")
            .await;
        assert!(matches!(result, Err(LocatorError::InvalidPath { .. })));
    }

    #[tokio::test]
    async fn test_ambiguous_returns_best() {
        let locator = locator(
            "<a id='first' href='#'>Details</a><p>..</p><a id='second' href='#'>Details</a>",
        );
        let outcome = locator
            .locate(ControlCategory::Clickable, "Details")
            .await
            .unwrap();
        assert!(outcome.is_ambiguous());
        assert_eq!(outcome.contenders(), 2);
        assert_eq!(outcome.best.unwrap().start, 0);
    }

    #[tokio::test]
    async fn test_index_is_shared_between_calls() {
        let locator = locator("<input id='a' name='alpha' type='text'>");
        assert!(!locator
            .candidates(ControlCategory::Settable, "alpha")
            .await
            .unwrap()
            .is_empty());
        assert!(locator.index.get().is_some());
        assert!(locator
            .candidates(ControlCategory::Clickable, "alpha")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_text_candidates() {
        let locator = locator("<div id='d'><span id='s'>Total: 42</span></div>");
        let list = locator.text_candidates("Total").await.unwrap();
        assert_eq!(list.entries_sorted().len(), 1);
        assert_eq!(list.best().unwrap().found_type, FoundType::ByText);
    }

    #[tokio::test]
    async fn test_generous_timeout() {
        let config = LocatorConfig::default().with_locate_timeout(std::time::Duration::from_secs(30));
        let locator =
            PageLocator::with_config(Arc::new(StaticPage::from_html("<a id='x' href='#'>Go</a>")), config)
                .unwrap();
        let outcome = locator.locate(ControlCategory::Clickable, "Go").await.unwrap();
        assert!(outcome.best.is_some());
    }
}
