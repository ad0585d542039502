//! GraphQL request and response shapes for the characters query

use crate::storage::NewCharacter;
use crate::{FetchError, FetchResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query template sent for every page; `id` is aliased to `api_id`
pub const GET_CHARACTERS_QUERY: &str = r#"
query ($page: Int!) {
    characters(page: $page) {
        info {
            pages
        }
        results {
            api_id: id
            name
            status
            species
            gender
            image
        }
    }
}
"#;

/// JSON body of a GraphQL POST
#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: PageVariables,
}

#[derive(Debug, Serialize)]
pub struct PageVariables {
    pub page: u32,
}

impl GraphQlRequest<'static> {
    /// Builds the characters query for one page
    pub fn characters(page: u32) -> Self {
        Self {
            query: GET_CHARACTERS_QUERY,
            variables: PageVariables { page },
        }
    }
}

#[derive(Debug, Deserialize)]
struct CharactersData {
    characters: CharactersPage,
}

/// One page of the characters connection
#[derive(Debug, Deserialize)]
pub struct CharactersPage {
    pub info: PageInfo,
    pub results: Vec<NewCharacter>,
}

#[derive(Debug, Deserialize)]
pub struct PageInfo {
    /// Total number of pages the source currently has
    pub pages: u32,
}

/// Parses a response body into a characters page
///
/// A body carrying an `errors` key is rejected even when `data` is present.
pub fn parse_page_response(page: u32, body: &str) -> FetchResult<CharactersPage> {
    let mut value: Value = serde_json::from_str(body).map_err(|e| FetchError::Malformed {
        page,
        message: e.to_string(),
    })?;

    if let Some(errors) = value.get_mut("errors") {
        return Err(FetchError::GraphQl {
            page,
            errors: errors.take(),
        });
    }

    let data = match value.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => data,
        _ => return Err(FetchError::MissingData { page }),
    };

    let parsed: CharactersData =
        serde_json::from_value(data).map_err(|e| FetchError::Malformed {
            page,
            message: e.to_string(),
        })?;

    Ok(parsed.characters)
}
