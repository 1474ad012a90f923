use url::form_urlencoded;

use super::{error::Error, pagination::PageQuery, schema::Uuid};

/// Query of `GET /recipes/`. `tags` may repeat, so this is parsed from the raw
/// query string instead of through `warp::query`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: Option<Uuid>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl RecipeFilter {
    pub fn from_query(raw: &str) -> Result<Self, Error> {
        let mut filter = Self::default();

        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "author" => filter.author = Some(parse_number(&key, &value)?),
                "tags" => {
                    let slug = value.trim();
                    if !slug.is_empty() && !filter.tags.iter().any(|t| t == slug) {
                        filter.tags.push(slug.to_string());
                    }
                }
                "is_favorited" => filter.is_favorited = parse_flag(&key, &value)?,
                "is_in_shopping_cart" => filter.is_in_shopping_cart = parse_flag(&key, &value)?,
                "page" => filter.page = Some(parse_number(&key, &value)?),
                "limit" => filter.limit = Some(parse_number(&key, &value)?),
                _ => {}
            }
        }

        Ok(filter)
    }

    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, Error> {
    value
        .trim()
        .parse()
        .map_err(|_e| Error::Validation(format!("'{key}' must be a number")))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" | "" => Ok(false),
        _ => Err(Error::Validation(format!("'{key}' must be a boolean"))),
    }
}

/// Query of `GET /ingredients/`.
#[derive(serde::Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct IngredientFilter {
    /// Case-insensitive prefix of the name.
    pub name: Option<String>,
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
}

impl IngredientFilter {
    pub fn name_pattern(&self) -> Option<String> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| format!("{}%", escape_like(name)))
    }

    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|search| !search.is_empty())
            .map(|search| format!("%{}%", escape_like(search)))
    }
}

/// Escapes `LIKE` wildcards so user input matches literally (`ESCAPE '\'`).
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn collects_repeated_tags() {
        let filter = RecipeFilter::from_query("tags=breakfast&tags=lunch&tags=breakfast").unwrap();
        assert_eq!(filter.tags, vec!["breakfast", "lunch"]);
    }

    #[test]
    fn parses_every_key() {
        let filter = RecipeFilter::from_query(
            "author=4&is_favorited=1&is_in_shopping_cart=true&page=2&limit=3&unknown=x",
        )
        .unwrap();

        assert_eq!(
            filter,
            RecipeFilter {
                author: Some(4),
                tags: vec![],
                is_favorited: true,
                is_in_shopping_cart: true,
                page: Some(2),
                limit: Some(3),
            }
        );
    }

    #[test]
    fn empty_query_is_default() {
        assert_eq!(RecipeFilter::from_query("").unwrap(), RecipeFilter::default());
    }

    #[rstest]
    #[case("author=me")]
    #[case("is_favorited=maybe")]
    #[case("page=two")]
    fn rejects_malformed_values(#[case] query: &str) {
        assert!(matches!(
            RecipeFilter::from_query(query),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn decodes_percent_encoding() {
        let filter = RecipeFilter::from_query("tags=%D0%B7%D0%B0%D0%B2%D1%82%D1%80%D0%B0%D0%BA").unwrap();
        assert_eq!(filter.tags, vec!["завтрак"]);
    }

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn builds_name_patterns() {
        let filter = IngredientFilter {
            name: Some(String::from(" sug ")),
            search: Some(String::from("ar%")),
        };
        assert_eq!(filter.name_pattern().as_deref(), Some("sug%"));
        assert_eq!(filter.search_pattern().as_deref(), Some("%ar\\%%"));

        let blank = IngredientFilter {
            name: Some(String::from("  ")),
            search: None,
        };
        assert_eq!(blank.name_pattern(), None);
        assert_eq!(blank.search_pattern(), None);
    }
}
