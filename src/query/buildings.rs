// src/query/buildings.rs

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::geo::{GeoPoint, LocationResolver};
use crate::protocol::action::BuildingQuery;
use crate::query::{BUILDING_SEARCH_PATH, QueryClient, QueryError, Response, push_opt};

const PLACEHOLDER_CITY: &str = "北京";
const PLACEHOLDER_MIN_HEIGHT: f64 = 100.0;
const PLACEHOLDER_COUNT: usize = 3;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildingSearch {
    #[serde(default, alias = "count")]
    pub total: Option<u64>,
    #[serde(default)]
    pub data: Vec<Value>,
}

impl BuildingSearch {
    pub fn match_count(&self) -> u64 {
        self.total.unwrap_or(self.data.len() as u64)
    }
}

/// Result of a building search, possibly synthesized.
#[derive(Debug, Clone)]
pub struct BuildingSearchOutcome {
    pub count: u64,
    pub payload: Value,
    pub synthesized: bool,
}

fn search_query(query: &BuildingQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    push_opt(&mut params, "city", query.city.as_ref());
    push_opt(&mut params, "min_height", query.min_height);
    push_opt(&mut params, "max_height", query.max_height);
    push_opt(&mut params, "category", query.category.as_ref());
    push_opt(&mut params, "risk_level", query.risk_level);
    push_opt(&mut params, "district", query.district.as_ref());
    push_opt(&mut params, "keyword", query.keyword.as_ref());
    params
}

impl QueryClient {
    pub async fn search_buildings(
        &self,
        query: &BuildingQuery,
    ) -> Result<Response<BuildingSearch>, QueryError> {
        self.get(BUILDING_SEARCH_PATH, &search_query(query)).await
    }

    /// Searches the backend and substitutes deterministic placeholder data
    /// when the request fails for any reason.
    pub async fn search_buildings_or_placeholder(
        &self,
        query: &BuildingQuery,
        resolver: &LocationResolver,
    ) -> BuildingSearchOutcome {
        match self.search_buildings(query).await {
            Ok(response) => {
                info!("🏢 building search matched {}", response.summary.match_count());
                BuildingSearchOutcome {
                    count: response.summary.match_count(),
                    payload: response.raw,
                    synthesized: false,
                }
            }
            Err(err) => {
                if err.is_unavailable() {
                    warn!("⚠️ building search unavailable, using placeholder data: {}", err);
                } else {
                    warn!("⚠️ building search returned garbage, using placeholder data: {}", err);
                }
                BuildingSearchOutcome {
                    count: PLACEHOLDER_COUNT as u64,
                    payload: placeholder_buildings(query, resolver),
                    synthesized: true,
                }
            }
        }
    }
}

/// Three buildings derived from the query filters. The same query always
/// yields the same set.
pub fn placeholder_buildings(query: &BuildingQuery, resolver: &LocationResolver) -> Value {
    let city = query.city.as_deref().unwrap_or(PLACEHOLDER_CITY);
    let origin = resolver
        .resolve(city)
        .map(|place| place.point)
        .unwrap_or(GeoPoint::new(116.4074, 39.9042));
    let min_height = query.min_height.unwrap_or(PLACEHOLDER_MIN_HEIGHT);
    let category = query.category.as_deref().unwrap_or("商业");

    let data: Vec<Value> = (1..=PLACEHOLDER_COUNT)
        .map(|i| {
            let height = match query.max_height {
                Some(max) => min_height + (max - min_height) * i as f64 / (PLACEHOLDER_COUNT + 1) as f64,
                None => min_height + 50.0 * i as f64,
            };
            json!({
                "id": format!("placeholder-{i}"),
                "name": format!("{city}示例建筑{i}"),
                "category": category,
                "height": height,
                "longitude": origin.longitude + 0.01 * i as f64,
                "latitude": origin.latitude + 0.005 * i as f64,
                "city": city,
                "district": query.district,
                "risk_level": query.risk_level.unwrap_or(1),
            })
        })
        .collect();

    json!({
        "total": PLACEHOLDER_COUNT,
        "data": data,
        "placeholder": true,
    })
}
