// Alumni directory search

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

use crate::infrastructure::repository::EntityRepository;
use crate::models::Alumni;

/// Filter value that disables the industry/year predicates
pub const ALL: &str = "all";

/// Directory search request. Unset or `"all"` filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlumniQuery {
    pub text: Option<String>,
    pub industry: Option<String>,
    pub graduation_year: Option<String>,
}

impl AlumniQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    pub fn graduation_year(mut self, year: impl Into<String>) -> Self {
        self.graduation_year = Some(year.into());
        self
    }

    /// Whether `alumni` passes every active filter
    pub fn matches(&self, alumni: &Alumni) -> bool {
        self.matches_text(alumni) && self.matches_industry(alumni) && self.matches_year(alumni)
    }

    fn matches_text(&self, alumni: &Alumni) -> bool {
        let needle = match self.text.as_deref() {
            Some(t) if !t.is_empty() => t.to_lowercase(),
            _ => return true,
        };
        [
            Some(alumni.first_name.as_str()),
            Some(alumni.last_name.as_str()),
            alumni.company.as_deref(),
            alumni.position.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    fn matches_industry(&self, alumni: &Alumni) -> bool {
        match active_filter(self.industry.as_deref()) {
            Some(industry) => alumni.industry_name() == Some(industry),
            None => true,
        }
    }

    fn matches_year(&self, alumni: &Alumni) -> bool {
        match active_filter(self.graduation_year.as_deref()) {
            Some(year) => alumni.graduation_year.to_string() == year,
            None => true,
        }
    }
}

fn active_filter(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty() && *v != ALL)
}

/// Stable filter over a snapshot; relative order is preserved
pub fn filter_alumni(alumni: &[Alumni], query: &AlumniQuery) -> Vec<Alumni> {
    alumni.iter().filter(|a| query.matches(a)).cloned().collect()
}

#[derive(Debug, Clone)]
pub struct QueryEngine {
    repository: EntityRepository,
}

impl QueryEngine {
    pub fn new(repository: EntityRepository) -> Self {
        Self { repository }
    }

    #[instrument(skip(self))]
    pub async fn search_alumni(&self, query: &AlumniQuery) -> Vec<Alumni> {
        let snapshot = self.repository.get_all_alumni().await;
        let results = filter_alumni(&snapshot, query);
        debug!("Alumni search matched {} of {}", results.len(), snapshot.len());
        results
    }

    /// Distinct graduation years in the directory, newest first
    pub async fn year_options(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self
            .repository
            .get_all_alumni()
            .await
            .iter()
            .map(|a| a.graduation_year)
            .collect();
        years.into_iter().rev().collect()
    }

    /// Distinct industry names held by at least one alumni, alphabetical
    pub async fn industry_options(&self) -> Vec<String> {
        let names: BTreeSet<String> = self
            .repository
            .get_all_alumni()
            .await
            .iter()
            .filter_map(|a| a.industry_name().map(str::to_string))
            .collect();
        names.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SystemClock;
    use crate::data_seeder::SeedDataset;
    use std::sync::Arc;

    fn engine() -> QueryEngine {
        let repo = EntityRepository::new(SeedDataset::builtin().unwrap(), Arc::new(SystemClock));
        QueryEngine::new(repo)
    }

    fn ids(results: &[Alumni]) -> Vec<&str> {
        results.iter().map(|a| a.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_empty_query_returns_everything_in_order() {
        let engine = engine();
        let all = engine.search_alumni(&AlumniQuery::new()).await;
        assert_eq!(ids(&all), vec!["1", "2", "3", "4"]);

        let explicit = AlumniQuery::new().text("").industry(ALL).graduation_year(ALL);
        assert_eq!(engine.search_alumni(&explicit).await, all);
    }

    #[tokio::test]
    async fn test_text_is_case_insensitive_substring() {
        let engine = engine();
        for text in ["infosys", "INFOSYS", "InFo"] {
            let hits = engine.search_alumni(&AlumniQuery::new().text(text)).await;
            assert_eq!(ids(&hits), vec!["1"], "query {}", text);
        }

        // position and last name both count
        let hits = engine.search_alumni(&AlumniQuery::new().text("manager")).await;
        assert_eq!(ids(&hits), vec!["2"]);
        let hits = engine.search_alumni(&AlumniQuery::new().text("iyer")).await;
        assert_eq!(ids(&hits), vec!["4"]);
    }

    #[tokio::test]
    async fn test_text_does_not_search_other_fields() {
        let engine = engine();
        // location and degree are not searched
        let hits = engine.search_alumni(&AlumniQuery::new().text("Karnataka")).await;
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_filters_combine_with_and() {
        let engine = engine();
        let finance = engine
            .search_alumni(&AlumniQuery::new().industry("Finance"))
            .await;
        assert_eq!(ids(&finance), vec!["3"]);

        let none = engine
            .search_alumni(&AlumniQuery::new().industry("Finance").graduation_year("2018"))
            .await;
        assert!(none.is_empty());

        let year = engine
            .search_alumni(&AlumniQuery::new().text("a").graduation_year("2020"))
            .await;
        assert_eq!(ids(&year), vec!["4"]);
    }

    #[tokio::test]
    async fn test_industry_match_is_exact() {
        let engine = engine();
        let hits = engine
            .search_alumni(&AlumniQuery::new().industry("technology"))
            .await;
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_filter_options() {
        let engine = engine();
        assert_eq!(engine.year_options().await, vec![2020, 2019, 2018, 2017]);
        assert_eq!(
            engine.industry_options().await,
            vec!["Design", "Finance", "Marketing", "Technology"]
        );
    }
}
