// src/search.rs
//! Catalog search parameters and the SQL they compose into.
//!
//! Every filter is optional; an absent filter contributes no clause at all.

use serde::Serialize;
use sqlx::{Postgres, QueryBuilder};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum YearFilter {
    Exact { year: i32 },
    Range { start: i32, end: i32 },
}

impl YearFilter {
    /// `"2021"` or an inclusive `"2020-2022"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.split_once('-') {
            Some((start, end)) => {
                let start = start.trim().parse().ok()?;
                let end = end.trim().parse().ok()?;
                Some(YearFilter::Range { start, end })
            }
            None => raw.parse().ok().map(|year| YearFilter::Exact { year }),
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        match *self {
            YearFilter::Exact { year: y } => year == y,
            YearFilter::Range { start, end } => (start..=end).contains(&year),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Latest,
    Trending,
    RatingHigh,
    RatingLow,
    NameAsc,
    NameDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::Latest,
        SortKey::Trending,
        SortKey::RatingHigh,
        SortKey::RatingLow,
        SortKey::NameAsc,
        SortKey::NameDesc,
    ];

    /// Unknown keys sort newest first.
    pub fn parse(raw: &str) -> Self {
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == raw.trim())
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Latest => "latest",
            SortKey::Trending => "trending",
            SortKey::RatingHigh => "rating-high",
            SortKey::RatingLow => "rating-low",
            SortKey::NameAsc => "name-asc",
            SortKey::NameDesc => "name-desc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Latest => "Latest",
            SortKey::Trending => "Trending",
            SortKey::RatingHigh => "Rating (High to Low)",
            SortKey::RatingLow => "Rating (Low to High)",
            SortKey::NameAsc => "Name (A-Z)",
            SortKey::NameDesc => "Name (Z-A)",
        }
    }

    fn order_by(&self) -> &'static str {
        match self {
            SortKey::Latest => "m.release_date DESC NULLS LAST, m.created_at DESC",
            SortKey::Trending => "m.is_trending DESC, m.release_date DESC NULLS LAST",
            SortKey::RatingHigh => "m.rating DESC NULLS LAST, m.release_date DESC NULLS LAST",
            SortKey::RatingLow => "m.rating ASC NULLS LAST, m.release_date DESC NULLS LAST",
            SortKey::NameAsc => "m.title ASC",
            SortKey::NameDesc => "m.title DESC",
        }
    }
}

impl Serialize for SortKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub query: String,
    pub categories: Vec<String>,
    pub languages: Vec<String>,
    /// Echoed back as submitted.
    pub year: String,
    #[serde(skip)]
    pub year_filter: Option<YearFilter>,
    pub qualities: Vec<String>,
    pub sort: SortKey,
}

impl SearchQuery {
    /// Builds from decoded query-string pairs; list parameters repeat.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut search = SearchQuery::default();

        for (key, value) in pairs {
            let value = value.trim();
            match key.as_str() {
                "q" => search.query = value.to_string(),
                "categories" if !value.is_empty() => search.categories.push(value.to_string()),
                "languages" if !value.is_empty() => search.languages.push(value.to_string()),
                "qualities" if !value.is_empty() => {
                    search.qualities.push(value.to_ascii_uppercase())
                }
                "year" => {
                    search.year = value.to_string();
                    search.year_filter = YearFilter::parse(value);
                }
                "sort" => search.sort = SortKey::parse(value),
                _ => {}
            }
        }

        search
    }

    pub fn is_unfiltered(&self) -> bool {
        self.query.is_empty()
            && self.categories.is_empty()
            && self.languages.is_empty()
            && self.year_filter.is_none()
            && self.qualities.is_empty()
    }

    /// Full `SELECT` over movies with the present filters and the ordering.
    pub fn to_sql(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT m.* FROM movies m");
        self.push_filters(&mut qb);
        qb.push(" ORDER BY ");
        qb.push(self.sort.order_by());
        qb
    }

    fn push_filters(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        let mut first = true;

        if !self.query.is_empty() {
            let pattern = format!("%{}%", escape_like(&self.query));
            push_clause(qb, &mut first);
            qb.push("(m.title ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR m.description ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR m.tagline ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        if !self.categories.is_empty() {
            push_clause(qb, &mut first);
            qb.push(
                "EXISTS (SELECT 1 FROM movie_categories mc \
                 JOIN categories c ON c.id = mc.category_id \
                 WHERE mc.movie_id = m.id AND c.slug = ANY(",
            );
            qb.push_bind(self.categories.clone());
            qb.push("))");
        }

        if !self.languages.is_empty() {
            push_clause(qb, &mut first);
            qb.push(
                "EXISTS (SELECT 1 FROM movie_languages ml \
                 JOIN languages l ON l.id = ml.language_id \
                 WHERE ml.movie_id = m.id AND l.slug = ANY(",
            );
            qb.push_bind(self.languages.clone());
            qb.push("))");
        }

        match self.year_filter {
            Some(YearFilter::Exact { year }) => {
                push_clause(qb, &mut first);
                qb.push("m.release_year = ");
                qb.push_bind(year);
            }
            Some(YearFilter::Range { start, end }) => {
                push_clause(qb, &mut first);
                qb.push("m.release_year BETWEEN ");
                qb.push_bind(start);
                qb.push(" AND ");
                qb.push_bind(end);
            }
            None => {}
        }

        if !self.qualities.is_empty() {
            push_clause(qb, &mut first);
            qb.push("m.quality::text = ANY(");
            qb.push_bind(self.qualities.clone());
            qb.push(")");
        }
    }
}

fn push_clause(qb: &mut QueryBuilder<'static, Postgres>, first: &mut bool) {
    qb.push(if *first { " WHERE " } else { " AND " });
    *first = false;
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn no_parameters_means_no_where_clause_and_newest_first() {
        let search = SearchQuery::from_pairs(&[]);
        assert!(search.is_unfiltered());

        let qb = search.to_sql();
        assert_eq!(
            qb.sql(),
            "SELECT m.* FROM movies m ORDER BY m.release_date DESC NULLS LAST, m.created_at DESC"
        );
    }

    #[test]
    fn blank_parameters_are_the_same_as_absent_ones() {
        let blank = SearchQuery::from_pairs(&pairs(&[
            ("q", "  "),
            ("categories", ""),
            ("year", ""),
            ("qualities", " "),
        ]));
        assert!(blank.is_unfiltered());
        assert_eq!(blank.to_sql().sql(), SearchQuery::default().to_sql().sql());
    }

    #[test]
    fn year_range_is_inclusive() {
        let filter = YearFilter::parse("2020-2022").unwrap();
        assert_eq!(filter, YearFilter::Range { start: 2020, end: 2022 });
        assert!(filter.contains(2020));
        assert!(filter.contains(2022));
        assert!(!filter.contains(2019));
        assert!(!filter.contains(2023));

        let search = SearchQuery::from_pairs(&pairs(&[("year", "2020-2022")]));
        assert!(
            search
                .to_sql()
                .sql()
                .contains("WHERE m.release_year BETWEEN $1 AND $2")
        );
    }

    #[test]
    fn single_year_matches_exactly() {
        let search = SearchQuery::from_pairs(&pairs(&[("year", "2019")]));
        assert_eq!(search.year_filter, Some(YearFilter::Exact { year: 2019 }));
        assert!(search.to_sql().sql().contains("WHERE m.release_year = $1"));
    }

    #[test]
    fn unparsable_year_is_ignored_but_echoed() {
        let search = SearchQuery::from_pairs(&pairs(&[("year", "twenty-twenty")]));
        assert_eq!(search.year_filter, None);
        assert_eq!(search.year, "twenty-twenty");
        assert!(!search.to_sql().sql().contains("release_year"));
    }

    #[test]
    fn filters_compose_with_and_in_order() {
        let search = SearchQuery::from_pairs(&pairs(&[
            ("q", "knight"),
            ("categories", "action"),
            ("categories", "drama"),
            ("languages", "english"),
            ("year", "2008"),
            ("qualities", "fhd"),
            ("sort", "name-asc"),
        ]));
        let qb = search.to_sql();
        let sql = qb.sql();

        assert!(sql.contains(
            "WHERE (m.title ILIKE $1 OR m.description ILIKE $2 OR m.tagline ILIKE $3)"
        ));
        assert!(sql.contains("AND EXISTS (SELECT 1 FROM movie_categories mc"));
        assert!(sql.contains("c.slug = ANY($4)"));
        assert!(sql.contains("l.slug = ANY($5)"));
        assert!(sql.contains("AND m.release_year = $6"));
        assert!(sql.contains("AND m.quality::text = ANY($7)"));
        assert!(sql.ends_with("ORDER BY m.title ASC"));
        assert_eq!(search.categories, vec!["action", "drama"]);
        assert_eq!(search.qualities, vec!["FHD"]);
    }

    #[test]
    fn sort_keys_round_trip_and_default() {
        for key in SortKey::ALL {
            assert_eq!(SortKey::parse(key.as_str()), key);
        }
        assert_eq!(SortKey::parse("random"), SortKey::Latest);
        assert_eq!(SortKey::parse(""), SortKey::Latest);
    }

    #[test]
    fn rating_sorts_push_unrated_last() {
        let search = SearchQuery::from_pairs(&pairs(&[("sort", "rating-low")]));
        assert!(
            search
                .to_sql()
                .sql()
                .ends_with("ORDER BY m.rating ASC NULLS LAST, m.release_date DESC NULLS LAST")
        );
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
    }
}
