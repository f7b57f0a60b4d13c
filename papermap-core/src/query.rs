//! Initial filter state from a page URL (`?filter=...&search=...&session=...`).

use url::Url;

use crate::error::FilterError;
use crate::filter::{FilterDimension, FilterSet};

/// Query parameters the catalog page understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub filter: Option<String>,
    pub search: Option<String>,
    pub session: Option<String>,
}

impl PageQuery {
    /// Parse a full URL or a bare query string (with or without the leading `?`).
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        let input = input.trim();
        let parsed = if input.contains("://") {
            Url::parse(input)
        } else {
            let query = input.trim_start_matches('?');
            Url::parse(&format!("http://localhost/?{query}"))
        };
        let url = parsed.map_err(|e| FilterError::InvalidQuery {
            message: e.to_string(),
        })?;

        let mut query = Self::default();
        for (key, value) in url.query_pairs() {
            let value = value.into_owned();
            match key.as_ref() {
                "filter" => query.filter = Some(value),
                "search" => query.search = Some(value),
                "session" => query.session = Some(value),
                _ => {}
            }
        }
        Ok(query)
    }

    /// The dimension the search box is bound to, falling back to `default`.
    pub fn dimension(&self, default: FilterDimension) -> Result<FilterDimension, FilterError> {
        match self.filter.as_deref() {
            None | Some("") => Ok(default),
            Some(name) => name.parse(),
        }
    }

    /// Seed the active filters: the search value on the chosen dimension, plus
    /// the session restriction when present.
    pub fn seed_filters(
        &self,
        default: FilterDimension,
    ) -> Result<(FilterDimension, FilterSet), FilterError> {
        let dimension = self.dimension(default)?;
        let mut filters = FilterSet::new();
        if let Some(search) = self.search.as_deref() {
            filters.set(dimension, search);
        }
        if let Some(session) = self.session.as_deref() {
            filters.set(FilterDimension::Session, session);
        }
        Ok((dimension, filters))
    }
}
