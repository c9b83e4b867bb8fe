// Alumni Portal demo - loads the dataset and walks through a short session

use alumni_portal::{
    app_state::AppState,
    config::Config,
    core::EventId,
    models::NewEvent,
    services::{AlumniQuery, EventFilter},
    telemetry,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    telemetry::init_tracing(&config.log_filter);

    // Initialize application state
    let state = AppState::new(config).await?;
    let portal = &state.portal;

    let alumni = portal.list_alumni().await?;
    info!("Directory holds {} alumni", alumni.len());

    let surface = portal.search_surface();
    surface.submit(AlumniQuery::new().text("an"))?;
    surface.submit(AlumniQuery::new().text("infosys"))?;
    let search = surface.settled().await;
    info!(
        "Search #{} matched: {:?}",
        search.sequence,
        search.results.iter().map(|a| a.full_name()).collect::<Vec<_>>()
    );

    let event = portal
        .create_event(
            NewEvent::new("Demo Meetup", "2030-01-15", "18:00", "Online", "Professional", "1")
                .with_capacity(50),
        )
        .await?;
    portal.publish_event(&event.id).await?;
    let registration = portal.register_current_viewer(&event.id).await?;
    info!(
        "Registered {} for {} ({:?})",
        registration.alumni_id, registration.event_id, registration.status
    );

    if let Err(e) = portal.register_current_viewer(&EventId::from("missing")).await {
        warn!("Expected failure: {}", e);
    }

    let upcoming = portal.list_events_by(EventFilter::Upcoming).await?;
    info!("{} upcoming events", upcoming.len());

    let analytics = portal.get_analytics().await?;
    info!("{}", serde_json::to_string_pretty(&analytics)?);
    info!("Simulator stats: {:?}", portal.simulator_stats());

    portal.shutdown();
    Ok(())
}
