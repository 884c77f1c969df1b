// Geocodificação de endereços via API compatível com Nominatim.
// Resultados ficam em cache em memória: edições repetidas do mesmo
// endereço no console admin não re-consultam a API.

use crate::models::GeoPoint;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::sync::RwLock;
use std::time::{Duration, Instant};

const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct CachedPoint {
    point: GeoPoint,
    timestamp: Instant,
}

lazy_static::lazy_static! {
    static ref GEOCODE_CACHE: RwLock<HashMap<String, CachedPoint>> = RwLock::new(HashMap::new());
}

#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
}

fn get_geocoder_base_url() -> String {
    env::var("GEOCODER_BASE_URL")
        .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string())
}

/// Converte a resposta do geocoder (lat/lon como strings) em GeoPoint.
fn parse_results(results: &[NominatimResult]) -> Option<GeoPoint> {
    let first = results.first()?;
    let lat = first.lat.parse::<f64>().ok()?;
    let lng = first.lon.parse::<f64>().ok()?;
    Some(GeoPoint { lat, lng })
}

fn cache_get(address: &str) -> Option<GeoPoint> {
    let cache = GEOCODE_CACHE.read().ok()?;
    let entry = cache.get(address)?;
    if entry.timestamp.elapsed() < CACHE_TTL {
        Some(entry.point.clone())
    } else {
        None
    }
}

fn cache_put(address: &str, point: &GeoPoint) {
    if let Ok(mut cache) = GEOCODE_CACHE.write() {
        cache.insert(
            address.to_string(),
            CachedPoint {
                point: point.clone(),
                timestamp: Instant::now(),
            },
        );
    }
}

pub async fn geocode_address(address: &str) -> Result<GeoPoint, String> {
    let address = address.trim();
    if address.is_empty() {
        return Err("Address is empty".to_string());
    }

    if let Some(point) = cache_get(address) {
        log::debug!("💾 Geocode cache hit for '{}'", address);
        return Ok(point);
    }

    let url = format!(
        "{}/search?q={}&format=json&limit=1",
        get_geocoder_base_url(),
        urlencoding::encode(address)
    );

    let client = reqwest::Client::new();
    let response = client
        .get(&url)
        // Nominatim exige um User-Agent identificável
        .header("User-Agent", "medifind-service/0.1")
        .send()
        .await
        .map_err(|e| format!("Geocoder request failed: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("Geocoder returned status {}", response.status()));
    }

    let results: Vec<NominatimResult> = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse geocoder response: {}", e))?;

    let point = parse_results(&results)
        .ok_or_else(|| format!("No geocoding result for '{}'", address))?;

    cache_put(address, &point);
    log::debug!("📍 Geocoded '{}' -> ({}, {})", address, point.lat, point.lng);

    Ok(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_results_takes_first_hit() {
        let results: Vec<NominatimResult> = serde_json::from_str(
            r#"[{"lat": "-23.5505", "lon": "-46.6333"}, {"lat": "0", "lon": "0"}]"#,
        )
        .unwrap();

        let point = parse_results(&results).unwrap();
        assert!((point.lat - (-23.5505)).abs() < 1e-9);
        assert!((point.lng - (-46.6333)).abs() < 1e-9);
    }

    #[test]
    fn test_parse_results_empty() {
        assert!(parse_results(&[]).is_none());
    }

    #[test]
    fn test_parse_results_bad_coordinates() {
        let results: Vec<NominatimResult> =
            serde_json::from_str(r#"[{"lat": "abc", "lon": "-46.6"}]"#).unwrap();
        assert!(parse_results(&results).is_none());
    }

    #[test]
    fn test_cache_roundtrip() {
        let point = GeoPoint { lat: 1.0, lng: 2.0 };
        cache_put("Av. Paulista 1000", &point);

        let cached = cache_get("Av. Paulista 1000").unwrap();
        assert_eq!(cached.lat, 1.0);
        assert_eq!(cached.lng, 2.0);
        assert!(cache_get("unknown address").is_none());
    }
}
