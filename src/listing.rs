//! Search, faceted filtering and pagination over one tenant's job listings.
//!
//! [`run_query`] is a pure function of the listings and a [`ListingQuery`].
//! It never fails: missing fields read as empty strings, and out-of-range
//! pages are clamped. Tenant scoping happens before listings get here.
//!
//! A stored page number is only meaningful for the criteria it was chosen
//! under, so every [`ListingQuery`] reducer that changes the search term,
//! a filter, or the page size returns a query on page 1. Callers should
//! derive new queries through those reducers instead of building them by hand.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::models::JobListing;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PageSize {
    #[default]
    Ten,
    TwentyFive,
    Fifty,
}

impl PageSize {
    pub const ALL: [PageSize; 3] = [PageSize::Ten, PageSize::TwentyFive, PageSize::Fifty];

    pub fn get(self) -> usize {
        match self {
            PageSize::Ten => 10,
            PageSize::TwentyFive => 25,
            PageSize::Fifty => 50,
        }
    }

    /// 10 -> 25 -> 50 -> 10
    pub fn cycle(self) -> Self {
        match self {
            PageSize::Ten => PageSize::TwentyFive,
            PageSize::TwentyFive => PageSize::Fifty,
            PageSize::Fifty => PageSize::Ten,
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        PageSize::ALL
            .into_iter()
            .find(|size| size.get().to_string() == value)
            .ok_or_else(|| format!("page size must be 10, 25 or 50 (got '{}')", value))
    }
}

/// Fields that can be narrowed with their own substring filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Location,
    Department,
    EmploymentType,
    ExperienceLevel,
}

impl FilterField {
    pub const ALL: [FilterField; 4] = [
        FilterField::Location,
        FilterField::Department,
        FilterField::EmploymentType,
        FilterField::ExperienceLevel,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FilterField::Location => "Location",
            FilterField::Department => "Department",
            FilterField::EmploymentType => "Job Type",
            FilterField::ExperienceLevel => "Experience",
        }
    }

    fn value_of(self, listing: &JobListing) -> &str {
        let value = match self {
            FilterField::Location => &listing.location,
            FilterField::Department => &listing.department,
            FilterField::EmploymentType => &listing.employment_type,
            FilterField::ExperienceLevel => &listing.experience_level,
        };
        value.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Filters {
    pub location: String,
    pub department: String,
    pub employment_type: String,
    pub experience_level: String,
}

impl Filters {
    pub fn get(&self, field: FilterField) -> &str {
        match field {
            FilterField::Location => &self.location,
            FilterField::Department => &self.department,
            FilterField::EmploymentType => &self.employment_type,
            FilterField::ExperienceLevel => &self.experience_level,
        }
    }

    fn slot(&mut self, field: FilterField) -> &mut String {
        match field {
            FilterField::Location => &mut self.location,
            FilterField::Department => &mut self.department,
            FilterField::EmploymentType => &mut self.employment_type,
            FilterField::ExperienceLevel => &mut self.experience_level,
        }
    }

    pub fn is_active(&self) -> bool {
        FilterField::ALL.iter().any(|f| !self.get(*f).is_empty())
    }
}

/// Board state for one interaction. Pages are 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingQuery {
    pub search_term: String,
    pub filters: Filters,
    pub page_size: PageSize,
    pub page: usize,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            filters: Filters::default(),
            page_size: PageSize::default(),
            page: 1,
        }
    }
}

impl ListingQuery {
    pub fn with_search(self, term: impl Into<String>) -> Self {
        Self {
            search_term: term.into(),
            page: 1,
            ..self
        }
    }

    pub fn with_filter(mut self, field: FilterField, pattern: impl Into<String>) -> Self {
        *self.filters.slot(field) = pattern.into();
        self.page = 1;
        self
    }

    pub fn clear_filter(self, field: FilterField) -> Self {
        self.with_filter(field, String::new())
    }

    pub fn clear_filters(self) -> Self {
        Self {
            filters: Filters::default(),
            page: 1,
            ..self
        }
    }

    pub fn with_page_size(self, page_size: PageSize) -> Self {
        Self {
            page_size,
            page: 1,
            ..self
        }
    }

    pub fn with_page(self, page: usize) -> Self {
        Self {
            page: page.max(1),
            ..self
        }
    }

    pub fn next_page(self) -> Self {
        let page = self.page.saturating_add(1);
        self.with_page(page)
    }

    pub fn prev_page(self) -> Self {
        let page = self.page.saturating_sub(1);
        self.with_page(page)
    }

    /// True when the search term or any facet narrows the result.
    pub fn has_active_filters(&self) -> bool {
        !self.search_term.is_empty() || self.filters.is_active()
    }
}

/// One rendered page of the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingPage<'a> {
    pub items: Vec<&'a JobListing>,
    pub total_matching: usize,
    pub total_pages: usize,
    pub effective_page: usize,
    pub page_size: usize,
    pub has_active_filters: bool,
}

impl ListingPage<'_> {
    /// 1-based `(first, last)` positions of this page within all matches,
    /// `None` when nothing matched.
    pub fn item_range(&self) -> Option<(usize, usize)> {
        if self.total_matching == 0 {
            return None;
        }
        let first = (self.effective_page - 1) * self.page_size + 1;
        let last = (self.effective_page * self.page_size).min(self.total_matching);
        Some((first, last))
    }
}

/// Lowercased criteria, computed once per query.
struct Matcher {
    search: String,
    facets: Vec<(FilterField, String)>,
}

impl Matcher {
    fn new(query: &ListingQuery) -> Self {
        Self {
            search: query.search_term.to_lowercase(),
            facets: FilterField::ALL
                .iter()
                .filter(|f| !query.filters.get(**f).is_empty())
                .map(|f| (*f, query.filters.get(*f).to_lowercase()))
                .collect(),
        }
    }

    /// Free-text clause AND every non-empty facet.
    fn matches(&self, listing: &JobListing) -> bool {
        if !self.search.is_empty() && !search_text(listing).contains(&self.search) {
            return false;
        }
        self.facets
            .iter()
            .all(|(field, pattern)| field.value_of(listing).to_lowercase().contains(pattern))
    }
}

fn search_text(listing: &JobListing) -> String {
    [
        &listing.title,
        &listing.location,
        &listing.department,
        &listing.employment_type,
        &listing.experience_level,
    ]
    .iter()
    .map(|v| v.as_deref().unwrap_or_default())
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

pub fn run_query<'a>(listings: &'a [JobListing], query: &ListingQuery) -> ListingPage<'a> {
    let matcher = Matcher::new(query);
    let matching: Vec<&JobListing> = listings.iter().filter(|l| matcher.matches(l)).collect();

    let page_size = query.page_size.get();
    let total_matching = matching.len();
    let total_pages = total_matching.div_ceil(page_size).max(1);
    let effective_page = query.page.clamp(1, total_pages);

    let items = matching
        .into_iter()
        .skip((effective_page - 1) * page_size)
        .take(page_size)
        .collect();

    ListingPage {
        items,
        total_matching,
        total_pages,
        effective_page,
        page_size,
        has_active_filters: query.has_active_filters(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: i64, title: &str, location: &str, department: &str) -> JobListing {
        JobListing {
            id,
            title: Some(title.to_string()),
            location: Some(location.to_string()),
            department: Some(department.to_string()),
            ..Default::default()
        }
    }

    fn numbered(count: i64) -> Vec<JobListing> {
        (0..count)
            .map(|i| listing(i, &format!("Role {}", i), "Berlin", "Eng"))
            .collect()
    }

    fn matches(listing: &JobListing, query: &ListingQuery) -> bool {
        Matcher::new(query).matches(listing)
    }

    fn ids(page: &ListingPage) -> Vec<i64> {
        page.items.iter().map(|l| l.id).collect()
    }

    #[test]
    fn test_empty_input_clamps_to_first_page() {
        let query = ListingQuery::default().with_page(5);
        let page = run_query(&[], &query);
        assert!(page.items.is_empty());
        assert_eq!(page.total_matching, 0);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.effective_page, 1);
        assert_eq!(page.item_range(), None);
    }

    #[test]
    fn test_pagination_boundaries() {
        let jobs = numbered(23);

        let first = run_query(&jobs, &ListingQuery::default());
        assert_eq!(first.total_pages, 3);
        assert_eq!(ids(&first), (0..10).collect::<Vec<_>>());
        assert_eq!(first.item_range(), Some((1, 10)));

        let last = run_query(&jobs, &ListingQuery::default().with_page(3));
        assert_eq!(ids(&last), vec![20, 21, 22]);
        assert_eq!(last.item_range(), Some((21, 23)));

        let beyond = run_query(&jobs, &ListingQuery::default().with_page(9));
        assert_eq!(beyond.effective_page, 3);
        assert_eq!(ids(&beyond), vec![20, 21, 22]);
    }

    #[test]
    fn test_page_zero_is_clamped_to_one() {
        let jobs = numbered(3);
        let query = ListingQuery {
            page: 0,
            ..Default::default()
        };
        let page = run_query(&jobs, &query);
        assert_eq!(page.effective_page, 1);
        assert_eq!(page.items.len(), 3);
    }

    #[test]
    fn test_larger_page_sizes() {
        let jobs = numbered(60);
        let query = ListingQuery::default().with_page_size(PageSize::TwentyFive).with_page(3);
        let page = run_query(&jobs, &query);
        assert_eq!(page.total_pages, 3);
        assert_eq!(ids(&page), (50..60).collect::<Vec<_>>());

        let page = run_query(&jobs, &ListingQuery::default().with_page_size(PageSize::Fifty));
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 50);
    }

    #[test]
    fn test_filter_composition() {
        let jobs = vec![listing(1, "Engineer", "Berlin", "Eng")];
        let query = ListingQuery::default()
            .with_search("eng")
            .with_filter(FilterField::Location, "paris");
        assert!(!matches(&jobs[0], &query));
        assert_eq!(run_query(&jobs, &query).total_matching, 0);

        let query = query.with_filter(FilterField::Location, "BER");
        assert!(matches(&jobs[0], &query));
    }

    #[test]
    fn test_search_spans_joined_fields_case_insensitively() {
        let jobs = vec![
            JobListing {
                id: 1,
                title: Some("Data Scientist".to_string()),
                employment_type: Some("Full-time".to_string()),
                experience_level: Some("Senior".to_string()),
                ..Default::default()
            },
            listing(2, "Designer", "Paris", "Design"),
        ];

        let page = run_query(&jobs, &ListingQuery::default().with_search("SENIOR"));
        assert_eq!(ids(&page), vec![1]);

        // Description and salary are not searched.
        let mut with_description = jobs.clone();
        with_description[1].description = Some("senior role".to_string());
        with_description[1].salary_range = Some("senior pay".to_string());
        let page = run_query(&with_description, &ListingQuery::default().with_search("senior"));
        assert_eq!(ids(&page), vec![1]);
    }

    #[test]
    fn test_missing_fields_read_as_empty() {
        let bare = JobListing {
            id: 9,
            ..Default::default()
        };
        assert!(matches(&bare, &ListingQuery::default()));
        assert!(!matches(&bare, &ListingQuery::default().with_search("x")));
        assert!(!matches(
            &bare,
            &ListingQuery::default().with_filter(FilterField::Department, "eng")
        ));
    }

    #[test]
    fn test_facets_each_use_their_own_field() {
        let job = JobListing {
            id: 1,
            location: Some("Remote".to_string()),
            department: Some("Sales".to_string()),
            employment_type: Some("Contract".to_string()),
            experience_level: Some("Mid".to_string()),
            ..Default::default()
        };
        let base = ListingQuery::default();
        assert!(matches(&job, &base.clone().with_filter(FilterField::EmploymentType, "contr")));
        assert!(matches(&job, &base.clone().with_filter(FilterField::ExperienceLevel, "mid")));
        assert!(!matches(&job, &base.clone().with_filter(FilterField::Department, "remote")));
    }

    #[test]
    fn test_order_is_preserved() {
        let jobs = vec![
            listing(3, "C Engineer", "X", "Eng"),
            listing(1, "A Designer", "X", "Design"),
            listing(2, "B Engineer", "X", "Eng"),
        ];
        let page = run_query(&jobs, &ListingQuery::default().with_filter(FilterField::Department, "eng"));
        assert_eq!(ids(&page), vec![3, 2]);
    }

    #[test]
    fn test_query_is_deterministic() {
        let jobs = numbered(37);
        let query = ListingQuery::default()
            .with_search("role 1")
            .with_page_size(PageSize::Ten);
        let a = run_query(&jobs, &query);
        let b = run_query(&jobs, &query);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_active_filters_flag() {
        let query = ListingQuery::default();
        assert!(!query.has_active_filters());
        assert!(!run_query(&[], &query).has_active_filters);

        assert!(query.clone().with_search("a").has_active_filters());
        assert!(query
            .clone()
            .with_filter(FilterField::ExperienceLevel, "senior")
            .has_active_filters());
        assert!(!query
            .with_filter(FilterField::Location, "x")
            .clear_filter(FilterField::Location)
            .has_active_filters());
    }

    #[test]
    fn test_criteria_changes_reset_page() {
        let query = ListingQuery::default().with_page(4);
        assert_eq!(query.clone().with_search("x").page, 1);
        assert_eq!(query.clone().with_filter(FilterField::Department, "x").page, 1);
        assert_eq!(query.clone().clear_filters().page, 1);
        assert_eq!(query.clone().with_page_size(PageSize::Fifty).page, 1);
        assert_eq!(query.clone().next_page().page, 5);
        assert_eq!(query.prev_page().page, 3);
        assert_eq!(ListingQuery::default().prev_page().page, 1);
    }

    #[test]
    fn test_clear_filters_keeps_search() {
        let query = ListingQuery::default()
            .with_search("rust")
            .with_filter(FilterField::Location, "berlin")
            .clear_filters();
        assert_eq!(query.search_term, "rust");
        assert!(!query.filters.is_active());
    }

    #[test]
    fn test_page_size_parsing() {
        assert_eq!("25".parse::<PageSize>().unwrap(), PageSize::TwentyFive);
        assert!("20".parse::<PageSize>().is_err());
        assert_eq!(PageSize::Fifty.cycle(), PageSize::Ten);
        assert_eq!(PageSize::default().get(), 10);
    }
}
