//! Single-adapter commands: `inspect`, `places`, `geocode`, `find-address`.

use prospecto_core::{AppConfig, Coordinates, PlaceSource};
use prospecto_geo::{AddressQuery, GeoClient};

fn client(config: &AppConfig) -> anyhow::Result<GeoClient> {
    GeoClient::from_config(config).map_err(|e| anyhow::anyhow!("failed to build geo client: {e}"))
}

/// Prints both reverse-geocoding answers. A failing source is reported, not fatal.
pub(crate) async fn run_inspect(
    config: &AppConfig,
    point: Coordinates,
    json: bool,
) -> anyhow::Result<()> {
    let inquiry = client(config)?.inspect(point).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&inquiry)?);
        return Ok(());
    }

    println!("location: {}", inquiry.confirm_label());
    match (&inquiry.osm_result.data, &inquiry.osm_result.error) {
        (Some(place), _) => println!("nominatim: {}", place.display_name),
        (None, Some(err)) => println!("nominatim: unavailable ({err})"),
        (None, None) => println!("nominatim: no answer"),
    }
    match (&inquiry.stats_result.data, &inquiry.stats_result.error) {
        (Some(address), _) => {
            let fields: Vec<String> = address
                .0
                .keys()
                .filter_map(|k| address.get(k).map(|v| format!("{k}={v}")))
                .collect();
            println!("ibge: {}", fields.join(", "));
        }
        (None, Some(err)) => println!("ibge: unavailable ({err})"),
        (None, None) => println!("ibge: no answer"),
    }
    Ok(())
}

/// Lists nearby establishments.
///
/// # Errors
///
/// Fails on configuration errors (missing Places key). Provider outages
/// fall back to Overpass and at worst print an empty list.
pub(crate) async fn run_places(
    config: &AppConfig,
    point: Coordinates,
    json: bool,
) -> anyhow::Result<()> {
    let places = client(config)?.search_nearby(point).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&places)?);
        return Ok(());
    }
    if places.is_empty() {
        println!("no establishments found");
        return Ok(());
    }

    println!("{:<30}{:<11}{:<32}VICINITY", "ID", "SOURCE", "NAME");
    for place in &places {
        let source = match place.source {
            PlaceSource::Commercial => "google",
            PlaceSource::Community => "osm",
        };
        println!(
            "{:<30}{:<11}{:<32}{}",
            truncate(&place.id, 28),
            source,
            truncate(&place.name, 30),
            place.vicinity
        );
    }
    Ok(())
}

pub(crate) async fn run_geocode(
    config: &AppConfig,
    query: &AddressQuery,
    json: bool,
) -> anyhow::Result<()> {
    let found = client(config)?.geocode_address(query).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }
    match found {
        Some(point) => println!("{:.6}, {:.6}", point.lat, point.lng),
        None => println!("no match for {}", query.full()),
    }
    Ok(())
}

pub(crate) async fn run_find_address(
    config: &AppConfig,
    query: &str,
    json: bool,
) -> anyhow::Result<()> {
    let found = client(config)?.search_address(query).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }
    match found {
        Some(hit) => println!(
            "{} ({:.6}, {:.6})",
            hit.display_name, hit.coordinates.lat, hit.coordinates.lng
        ),
        None => println!("address not found"),
    }
    Ok(())
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}
