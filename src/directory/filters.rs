//! Client-side directory filtering and pagination.
//!
//! Profiles are fetched in full and narrowed in memory. Every filter value is
//! trimmed and lower-cased before use, and an empty value matches everything.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Profile, Role};

pub const DEFAULT_LIMIT: u32 = 12;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("page must be at least 1")]
    InvalidPage,

    #[error("limit must be between 1 and {MAX_LIMIT}, got {0}")]
    InvalidLimit(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Search,
    Category,
    Location,
    EventType,
    AudienceSize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryFilterParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub event_type: Option<String>,
    pub audience_size: Option<String>,
    page: u32,
    limit: u32,
}

impl Default for DirectoryFilterParams {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            location: None,
            event_type: None,
            audience_size: None,
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl DirectoryFilterParams {
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Changes one filter and sends the view back to the first page.
    pub fn set(&mut self, field: FilterField, value: Option<String>) {
        use FilterField::*;
        let slot = match field {
            Search => &mut self.search,
            Category => &mut self.category,
            Location => &mut self.location,
            EventType => &mut self.event_type,
            AudienceSize => &mut self.audience_size,
        };
        *slot = value;
        self.page = 1;
    }

    pub fn set_page(&mut self, page: u32) -> Result<(), FilterError> {
        if page == 0 {
            return Err(FilterError::InvalidPage);
        }
        self.page = page;
        Ok(())
    }

    pub fn set_limit(&mut self, limit: u32) -> Result<(), FilterError> {
        if limit == 0 || limit > MAX_LIMIT {
            return Err(FilterError::InvalidLimit(limit));
        }
        self.limit = limit;
        self.page = 1;
        Ok(())
    }
}

/// Raw query string as sent by the directory pages.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DirectoryQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    #[serde(alias = "event_type")]
    pub event_type: Option<String>,
    #[serde(alias = "audience_size")]
    pub audience_size: Option<String>,
    #[serde(rename = "type")]
    pub role: Option<Role>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TryFrom<DirectoryQuery> for DirectoryFilterParams {
    type Error = FilterError;

    fn try_from(query: DirectoryQuery) -> Result<Self, Self::Error> {
        let mut params = DirectoryFilterParams {
            search: query.search,
            category: query.category,
            location: query.location,
            event_type: query.event_type,
            audience_size: query.audience_size,
            ..Default::default()
        };
        if let Some(limit) = query.limit {
            params.set_limit(limit)?;
        }
        if let Some(page) = query.page {
            params.set_page(page)?;
        }
        Ok(params)
    }
}

type Check = fn(&Profile, &str) -> bool;

fn active(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

fn text_includes(text: Option<&str>, needle: &str) -> bool {
    text.is_some_and(|t| t.to_lowercase().contains(needle))
}

fn any_includes(items: &[String], needle: &str) -> bool {
    items.iter().any(|item| item.to_lowercase().contains(needle))
}

fn matches_search(profile: &Profile, needle: &str) -> bool {
    let seek = &profile.what_they_seek;
    text_includes(Some(&profile.name), needle)
        || text_includes(Some(&profile.description), needle)
        || text_includes(seek.notes.as_deref(), needle)
        || any_includes(&seek.audience_tags, needle)
        || any_includes(&seek.event_types, needle)
}

fn matches_category(profile: &Profile, needle: &str) -> bool {
    text_includes(profile.category.as_deref(), needle)
        || any_includes(&profile.what_they_seek.sponsorship_types, needle)
}

fn matches_location(profile: &Profile, needle: &str) -> bool {
    text_includes(profile.location.as_deref(), needle)
}

fn matches_event_type(profile: &Profile, needle: &str) -> bool {
    any_includes(&profile.what_they_seek.event_types, needle)
}

fn matches_audience_size(profile: &Profile, needle: &str) -> bool {
    text_includes(profile.audience_size.as_deref(), needle)
        || any_includes(&profile.what_they_seek.audience_tags, needle)
}

/// Keeps the profiles of `role` that satisfy every active filter, in input order.
pub fn filter_by_role<'a>(
    records: &'a [Profile],
    filters: &DirectoryFilterParams,
    role: Role,
) -> Vec<&'a Profile> {
    filter_members(records, filters, Some(role))
}

/// Like [`filter_by_role`], but `None` lets every role through.
pub fn filter_members<'a>(
    records: &'a [Profile],
    filters: &DirectoryFilterParams,
    role: Option<Role>,
) -> Vec<&'a Profile> {
    let candidates: [(Option<String>, Check); 5] = [
        (active(&filters.search), matches_search),
        (active(&filters.category), matches_category),
        (active(&filters.location), matches_location),
        (active(&filters.event_type), matches_event_type),
        (active(&filters.audience_size), matches_audience_size),
    ];
    let checks: Vec<(String, Check)> = candidates
        .into_iter()
        .filter_map(|(needle, check)| needle.map(|n| (n, check)))
        .collect();

    records
        .iter()
        .filter(|profile| role.is_none_or(|role| profile.role == role))
        .filter(|profile| checks.iter().all(|(needle, check)| check(profile, needle)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub total_pages: u32,
}

/// Slices one page out of `items`. Pages past the end come back empty.
///
/// Pages are 1-based. `page == 0` is served as the first page but echoed back
/// unchanged; [`DirectoryFilterParams`] never produces it.
pub fn paginate<T: Clone>(items: &[T], page: u32, limit: u32) -> Page<T> {
    let limit = limit.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(limit as usize).max(1) as u32;

    let start = (page.saturating_sub(1) as usize).saturating_mul(limit as usize);
    let end = start.saturating_add(limit as usize).min(total);
    let slice = if start < total { &items[start..end] } else { &[] };

    Page {
        items: slice.to_vec(),
        page,
        limit,
        total,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::model::WhatTheySeek;

    fn profile(id: &str, role: Role, name: &str) -> Profile {
        Profile {
            id: id.to_owned(),
            role,
            name: name.to_owned(),
            email: None,
            description: String::new(),
            short_description: None,
            category: None,
            location: None,
            audience_size: None,
            what_they_seek: WhatTheySeek::default(),
            featured: false,
            created_at: String::new(),
        }
    }

    fn sample() -> Vec<Profile> {
        let mut eco = profile("b1", Role::Brand, "EcoRefresh");
        eco.featured = true;
        eco.category = Some("Beverages".to_owned());
        eco.location = Some("Austin, TX".to_owned());
        eco.what_they_seek.audience_tags = vec!["Gen Z".to_owned(), "Runners".to_owned()];
        eco.what_they_seek.event_types = vec!["Marathon".to_owned()];

        let mut glow = profile("b2", Role::Brand, "GlowSkin");
        glow.description = "Clean skincare for festival season".to_owned();
        glow.what_they_seek.sponsorship_types = vec!["Product sampling".to_owned()];
        glow.what_they_seek.notes = Some("Looking for wellness retreats".to_owned());
        glow.audience_size = Some("5k-10k".to_owned());

        let mut expo = profile("o1", Role::Organizer, "TechExpo");
        expo.location = Some("Austin, TX".to_owned());
        expo.what_they_seek.event_types = vec!["Conference".to_owned()];

        vec![eco, glow, expo]
    }

    fn names(found: &[&Profile]) -> Vec<String> {
        found.iter().map(|p| p.name.clone()).collect()
    }

    #[test]
    fn empty_filters_only_restrict_by_role() {
        let records = sample();
        let found = filter_by_role(&records, &DirectoryFilterParams::default(), Role::Brand);
        assert_eq!(names(&found), vec!["EcoRefresh", "GlowSkin"]);
    }

    #[test]
    fn no_role_keeps_everyone() {
        let records = sample();
        let mut filters = DirectoryFilterParams::default();
        filters.set(FilterField::Location, Some("austin".to_owned()));

        let found = filter_members(&records, &filters, None);
        assert_eq!(names(&found), vec!["EcoRefresh", "TechExpo"]);
    }

    #[test]
    fn blank_values_are_ignored() {
        let records = sample();
        let mut filters = DirectoryFilterParams::default();
        filters.set(FilterField::Search, Some("   ".to_owned()));
        filters.set(FilterField::Location, Some(String::new()));

        let found = filter_by_role(&records, &filters, Role::Brand);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn brand_type_yields_only_brands() {
        let mut eco = profile("m1", Role::Brand, "EcoRefresh");
        eco.featured = true;
        let members = vec![eco, profile("m2", Role::Organizer, "TechExpo")];

        let found = filter_by_role(&members, &DirectoryFilterParams::default(), Role::Brand);
        assert_eq!(names(&found), vec!["EcoRefresh"]);
    }

    #[rstest]
    #[case(FilterField::Search, "runners", vec!["EcoRefresh"])]
    #[case(FilterField::Search, "WELLNESS", vec!["GlowSkin"])]
    #[case(FilterField::Search, "festival", vec!["GlowSkin"])]
    #[case(FilterField::Search, "marathon", vec!["EcoRefresh"])]
    #[case(FilterField::Category, "sampling", vec!["GlowSkin"])]
    #[case(FilterField::Category, "bever", vec!["EcoRefresh"])]
    #[case(FilterField::Location, " austin ", vec!["EcoRefresh"])]
    #[case(FilterField::EventType, "marathon", vec!["EcoRefresh"])]
    #[case(FilterField::AudienceSize, "5k", vec!["GlowSkin"])]
    #[case(FilterField::AudienceSize, "gen z", vec!["EcoRefresh"])]
    #[case(FilterField::Location, "berlin", vec![])]
    fn single_filter_on_brands(
        #[case] field: FilterField,
        #[case] value: &str,
        #[case] expected: Vec<&str>,
    ) {
        let records = sample();
        let mut filters = DirectoryFilterParams::default();
        filters.set(field, Some(value.to_owned()));

        let found = filter_by_role(&records, &filters, Role::Brand);
        assert_eq!(names(&found), expected);
    }

    #[test]
    fn missing_fields_never_match_active_filter() {
        let records = vec![profile("b9", Role::Brand, "Bare")];
        let mut filters = DirectoryFilterParams::default();
        filters.set(FilterField::Location, Some("austin".to_owned()));

        assert!(filter_by_role(&records, &filters, Role::Brand).is_empty());
    }

    #[test]
    fn adding_filters_only_narrows() {
        let records = sample();
        let mut filters = DirectoryFilterParams::default();
        filters.set(FilterField::Search, Some("e".to_owned()));
        let broad = filter_by_role(&records, &filters, Role::Brand);

        filters.set(FilterField::Location, Some("austin".to_owned()));
        let narrow = filter_by_role(&records, &filters, Role::Brand);

        assert!(narrow.len() <= broad.len());
        assert!(narrow.iter().all(|p| broad.iter().any(|b| b.id == p.id)));
        assert_eq!(names(&narrow), vec!["EcoRefresh"]);
    }

    #[test]
    fn changing_a_filter_resets_page() {
        let mut filters = DirectoryFilterParams::default();
        filters.set_page(4).unwrap();
        assert_eq!(filters.page(), 4);

        filters.set(FilterField::Category, Some("music".to_owned()));
        assert_eq!(filters.page(), 1);
    }

    #[test]
    fn query_role_ignores_case() {
        let query: DirectoryQuery = serde_json::from_str(r#"{"type":"Organizer"}"#).unwrap();
        assert_eq!(query.role, Some(Role::Organizer));
    }

    #[test]
    fn query_validation() {
        let ok = DirectoryFilterParams::try_from(DirectoryQuery {
            page: Some(2),
            limit: Some(24),
            ..Default::default()
        })
        .unwrap();
        assert_eq!((ok.page(), ok.limit()), (2, 24));

        let zero_page = DirectoryQuery {
            page: Some(0),
            ..Default::default()
        };
        assert_eq!(
            DirectoryFilterParams::try_from(zero_page),
            Err(FilterError::InvalidPage)
        );

        let huge = DirectoryQuery {
            limit: Some(500),
            ..Default::default()
        };
        assert_eq!(
            DirectoryFilterParams::try_from(huge),
            Err(FilterError::InvalidLimit(500))
        );
    }

    #[test]
    fn first_page_of_thirty() {
        let items: Vec<u32> = (0..30).collect();
        let page = paginate(&items, 1, 12);

        assert_eq!(page.items.len(), 12);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total, 30);
    }

    #[test]
    fn last_page_is_partial_and_past_end_is_empty() {
        let items: Vec<u32> = (0..30).collect();

        assert_eq!(paginate(&items, 3, 12).items, (24..30).collect::<Vec<_>>());

        let beyond = paginate(&items, 7, 12);
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.page, 7);
        assert_eq!(beyond.total_pages, 3);
    }

    #[test]
    fn page_zero_reads_as_first_page() {
        let items: Vec<u32> = (0..5).collect();
        let page = paginate(&items, 0, 2);
        assert_eq!(page.items, vec![0, 1]);
        assert_eq!(page.page, 0);
    }

    #[test]
    fn empty_input_still_has_one_page() {
        let page = paginate::<u32>(&[], 1, 12);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }
}
