use std::convert::Infallible;
use std::process;
use std::sync::Arc;

use geo::MultiLineString;
use serde::{Deserialize, Serialize};
use warp::http::StatusCode;
use warp::Filter;

use bikeshare_traffic::config::Config;
use bikeshare_traffic::draw::overlay::StationOverlay;
use bikeshare_traffic::load;
use bikeshare_traffic::traffic_core::{
    FilterController, FilterRangeError, TimeFilter, TrafficData, TrafficSnapshot, WindowWidth,
};

mod web_util;
use web_util::session::{with_session, Session};
use web_util::with_data;

type OverlayController = FilterController<StationOverlay>;

struct TrafficState {
    data: Arc<TrafficData>,
    window: WindowWidth,
}

#[derive(Debug)]
struct InvalidFilter(FilterRangeError);

impl warp::reject::Reject for InvalidFilter {}

/// `lon` and `lat` only move the map together
#[derive(Debug)]
struct InvalidViewport(&'static str);

impl warp::reject::Reject for InvalidViewport {}

#[derive(Debug)]
struct RenderFailed;

impl warp::reject::Reject for RenderFailed {}

#[derive(Debug, Deserialize)]
struct TrafficQuery {
    /// -1 or absent for all trips
    minute: Option<i64>,
}

#[derive(Serialize)]
struct TrafficReport<'s> {
    #[serde(flatten)]
    snapshot: &'s TrafficSnapshot,
    time_label: Option<String>,
}

async fn traffic_handler(
    query: TrafficQuery,
    state: Arc<TrafficState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let filter = TimeFilter::from_slider(query.minute.unwrap_or(-1))
        .map_err(|err| warp::reject::custom(InvalidFilter(err)))?;
    let snapshot = TrafficSnapshot::compute(&state.data, filter, state.window);
    log::debug!(
        "Traffic {} counted {} trip ends",
        filter,
        snapshot.total_traffic()
    );
    Ok(warp::reply::json(&TrafficReport {
        snapshot: &snapshot,
        time_label: filter.label(),
    }))
}

fn traffic_route(
    state: Arc<TrafficState>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let cors = warp::cors().allow_any_origin();
    warp::path!("traffic")
        .and(warp::get())
        .and(warp::query::<TrafficQuery>())
        .and(with_data(state))
        .and_then(traffic_handler)
        .with(cors)
}

/// Changes to the session's map and filter, fields which are absent are left as they were.
/// `lon` and `lat` are given together or not at all.
#[derive(Debug, Deserialize)]
struct OverlayQuery {
    minute: Option<i64>,
    lon: Option<f64>,
    lat: Option<f64>,
    zoom: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
}

async fn overlay_handler(
    query: OverlayQuery,
    session: Session<OverlayController>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let filter = query
        .minute
        .map(TimeFilter::from_slider)
        .transpose()
        .map_err(|err| warp::reject::custom(InvalidFilter(err)))?;
    let center = match (query.lon, query.lat) {
        (Some(lon), Some(lat)) => Some(geo::Point::new(lon, lat)),
        (None, None) => None,
        (Some(_), None) => return Err(warp::reject::custom(InvalidViewport("lon without lat"))),
        (None, Some(_)) => return Err(warp::reject::custom(InvalidViewport("lat without lon"))),
    };

    let svg = {
        let mut controller = session.lock();

        let mut viewport = *controller.renderer().viewport();
        if let Some(center) = center {
            viewport.pan_to(center);
        }
        if let Some(zoom) = query.zoom {
            viewport.zoom_to(zoom);
        }
        if query.width.is_some() || query.height.is_some() {
            viewport.resize(
                query.width.unwrap_or(*viewport.width()),
                query.height.unwrap_or(*viewport.height()),
            );
        }
        if viewport != *controller.renderer().viewport() {
            controller.renderer_mut().set_viewport(viewport);
        }

        if let Some(filter) = filter {
            controller.set_filter(filter);
        }

        let mut svg = Vec::new();
        controller
            .renderer()
            .write_svg_to(&mut svg)
            .map_err(|err| {
                log::error!("Failed to draw overlay for session {}: {}", session.id, err);
                warp::reject::custom(RenderFailed)
            })?;
        svg
    };
    Ok(warp::reply::with_header(
        warp::reply::with_header(svg, "content-type", "image/svg+xml"),
        "x-session-id",
        session.id.to_string(),
    ))
}

fn overlay_route(
    data: Arc<TrafficData>,
    bike_lanes: Arc<MultiLineString<f64>>,
    config: &Config,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let (window, viewport) = (config.window, config.viewport);
    let new_session = move || {
        let overlay = StationOverlay::new(viewport).with_bike_lanes(bike_lanes.clone());
        FilterController::new(data.clone(), window, overlay)
    };
    warp::path!("overlay.svg")
        .and(warp::get())
        .and(warp::query::<OverlayQuery>())
        .and(with_session(new_session))
        .and_then(overlay_handler)
}

async fn handle_rejection(err: warp::Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_owned())
    } else if let Some(InvalidFilter(range)) = err.find() {
        (StatusCode::BAD_REQUEST, range.to_string())
    } else if let Some(InvalidViewport(reason)) = err.find() {
        (StatusCode::BAD_REQUEST, (*reason).to_owned())
    } else if let Some(invalid) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, invalid.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_owned())
    } else {
        if err.find::<RenderFailed>().is_none() {
            log::warn!("Unhandled rejection {:?}", err);
        }
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error".to_owned(),
        )
    };
    Ok(warp::reply::with_status(message, status))
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("{}", err);
            process::exit(2);
        }
    };

    let data = match load::load_data(
        &config.stations_source,
        &config.trips_source,
        config.timezone,
    )
    .await
    {
        Ok(data) => Arc::new(data),
        Err(err) => {
            log::error!("Failed to load traffic data: {}", err);
            process::exit(1);
        }
    };

    // the lanes only decorate the map, the server can run without them
    let bike_lanes = match load::load_bike_lanes(&config.bike_lane_sources).await {
        Ok(lanes) => lanes,
        Err(err) => {
            log::warn!("Drawing no bike lanes, failed to load them: {}", err);
            MultiLineString::new(vec![])
        }
    };

    let traffic_state = Arc::new(TrafficState {
        data: data.clone(),
        window: config.window,
    });

    log::info!(
        "Starting web server on port {} with a window of {} minutes either side",
        config.port,
        config.window.minutes()
    );
    warp::serve(
        warp::fs::dir(config.static_dir.clone())
            .or(traffic_route(traffic_state))
            .or(overlay_route(data, Arc::new(bike_lanes), &config))
            .recover(handle_rejection)
            .with(warp::log("bikeshare_traffic::webserver")),
    )
    .run(([127, 0, 0, 1], config.port))
    .await;
}
