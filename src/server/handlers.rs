//! Handlers for the read-only character endpoints.

use crate::server::error::{AppError, AppResult};
use crate::server::state::AppState;
use crate::server::CHARACTERS_PATH;
use crate::storage::{CharacterRecord, CharacterStorage};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Query parameters for the character list.
#[derive(Debug, Default, Deserialize)]
pub struct CharacterListParams {
    /// Case-insensitive substring filter on the name
    pub name: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u32>,
}

/// Page envelope returned by list endpoints.
#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// GET /random/
///
/// Returns one stored character chosen uniformly at random.
pub async fn random_character(State(state): State<AppState>) -> AppResult<Json<CharacterRecord>> {
    let character = state
        .with_storage(|storage| Ok(storage.random_character()?))
        .await?
        .ok_or_else(|| AppError::NotFound("No characters have been synced yet".to_string()))?;
    Ok(Json(character))
}

/// GET /characters/
///
/// Lists stored characters ordered by id, optionally filtered by name.
pub async fn list_characters(
    State(state): State<AppState>,
    params: Result<Query<CharacterListParams>, QueryRejection>,
) -> AppResult<Json<Paginated<CharacterRecord>>> {
    let Query(params) = params?;
    let page_size = params
        .page_size
        .filter(|size| *size > 0)
        .map(|size| size.min(state.config.max_page_size))
        .unwrap_or(state.config.page_size);
    let page = params.page.unwrap_or(1);
    let name = params.name.clone();

    let (count, last_page, results) = state
        .with_storage(move |storage| {
            let name = name.as_deref();
            let count = storage.count_characters(name)?;
            let last_page = count.div_ceil(u64::from(page_size)).max(1);

            if page == 0 || page > last_page {
                return Err(AppError::NotFound("Invalid page.".to_string()));
            }

            let offset = (page - 1) * u64::from(page_size);
            let results = storage.list_characters(name, page_size, offset)?;
            Ok((count, last_page, results))
        })
        .await?;

    Ok(Json(Paginated {
        count,
        next: (page < last_page).then(|| page_link(&params, page + 1)),
        previous: (page > 1).then(|| page_link(&params, page - 1)),
        results,
    }))
}

/// Builds a relative link to another page, keeping the caller's filters.
fn page_link(params: &CharacterListParams, page: u64) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(name) = &params.name {
        query.append_pair("name", name);
    }
    query.append_pair("page", &page.to_string());
    if let Some(page_size) = params.page_size {
        query.append_pair("page_size", &page_size.to_string());
    }
    format!("{}?{}", CHARACTERS_PATH, query.finish())
}
