use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Movie {
    #[serde(rename = "imdbID", default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(rename = "Title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "Year", default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(rename = "Poster", default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
}

impl Movie {
    pub fn to_route_param(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_route_param(param: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(param)
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Rating {
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct MovieDetail {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub writer: Option<String>,
    #[serde(default)]
    pub actors: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub runtime: Option<String>,
    #[serde(default)]
    pub rated: Option<String>,
    #[serde(default)]
    pub awards: Option<String>,
    #[serde(default)]
    pub box_office: Option<String>,
    #[serde(default)]
    pub production: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub plot: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ratings: Vec<Rating>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchType {
    Movie,
    Series,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Movie => "movie",
            SearchType::Series => "series",
        }
    }

    pub fn param(search_type: Option<SearchType>) -> &'static str {
        search_type.map(|t| t.as_str()).unwrap_or("")
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SearchCriteria {
    pub query: String,
    pub search_type: Option<SearchType>,
    pub start_year: Option<String>,
    pub end_year: Option<String>,
}

impl SearchCriteria {
    pub fn new(query: impl Into<String>, search_type: Option<SearchType>) -> Self {
        Self {
            query: query.into(),
            search_type,
            start_year: None,
            end_year: None,
        }
    }

    pub fn with_years(mut self, start: Option<String>, end: Option<String>) -> Self {
        self.start_year = start;
        self.end_year = end;
        self
    }

    pub fn is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }

    // Drops a lone year bound, which is never sent, so equal requests compare equal.
    pub fn normalized(self) -> Self {
        let bounds = self
            .year_bounds()
            .map(|(start, end)| (start.to_string(), end.to_string()));
        let (start_year, end_year) = bounds.unzip();
        Self {
            start_year,
            end_year,
            ..self
        }
    }

    pub fn year_bounds(&self) -> Option<(&str, &str)> {
        let start = self.start_year.as_deref().filter(|s| !s.trim().is_empty())?;
        let end = self.end_year.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_param_round_trips_every_field() {
        let movie = Movie {
            imdb_id: Some("tt0111161".to_string()),
            title: Some("The Shawshank Redemption".to_string()),
            year: Some("1994".to_string()),
            poster: Some("https://example.com/p.jpg".to_string()),
        };
        let param = movie.to_route_param().unwrap();
        assert_eq!(Movie::from_route_param(&param).unwrap(), movie);
    }

    #[test]
    fn route_param_round_trips_without_identifier() {
        let movie = Movie {
            imdb_id: None,
            title: Some("Unknown".to_string()),
            year: None,
            poster: None,
        };
        let param = movie.to_route_param().unwrap();
        assert!(!param.contains("imdbID"));
        assert_eq!(Movie::from_route_param(&param).unwrap(), movie);
    }

    #[test]
    fn detail_parses_catalog_json() {
        let raw = r#"{
            "Title": "Heat", "Year": "1995", "imdbID": "tt0113277",
            "Director": "Michael Mann", "BoxOffice": "$67,436,818",
            "Ratings": [{"Source": "Internet Movie Database", "Value": "8.3/10"}],
            "Response": "True"
        }"#;
        let detail: MovieDetail = serde_json::from_str(raw).unwrap();
        assert_eq!(detail.movie.imdb_id.as_deref(), Some("tt0113277"));
        assert_eq!(detail.director.as_deref(), Some("Michael Mann"));
        assert_eq!(detail.box_office.as_deref(), Some("$67,436,818"));
        assert_eq!(detail.ratings.len(), 1);
        assert!(detail.plot.is_none());
    }

    #[test]
    fn detail_tolerates_null_or_missing_ratings() {
        let null: MovieDetail = serde_json::from_str(
            r#"{"Title":"Heat","imdbID":"tt1","Ratings":null,"Plot":null}"#,
        )
        .unwrap();
        assert!(null.ratings.is_empty());
        assert!(null.plot.is_none());
        assert_eq!(null.movie.display_title(), "Heat");

        let missing: MovieDetail = serde_json::from_str(r#"{"Title":"Heat"}"#).unwrap();
        assert!(missing.ratings.is_empty());
    }

    #[test]
    fn normalized_drops_a_lone_year_bound() {
        let only_start =
            SearchCriteria::new("heat", None).with_years(Some("1990".to_string()), None);
        assert_eq!(only_start.normalized(), SearchCriteria::new("heat", None));

        let both = SearchCriteria::new("heat", None)
            .with_years(Some("1990".to_string()), Some("2000".to_string()));
        assert_eq!(both.clone().normalized(), both);
    }

    #[test]
    fn year_bounds_require_both_ends() {
        let only_start =
            SearchCriteria::new("heat", None).with_years(Some("1990".to_string()), None);
        assert!(only_start.year_bounds().is_none());

        let both = SearchCriteria::new("heat", Some(SearchType::Movie))
            .with_years(Some("1990".to_string()), Some("2000".to_string()));
        assert_eq!(both.year_bounds(), Some(("1990", "2000")));
    }

    #[test]
    fn blank_queries_are_detected() {
        assert!(SearchCriteria::new("   ", None).is_blank());
        assert!(!SearchCriteria::new(" x ", None).is_blank());
    }
}
