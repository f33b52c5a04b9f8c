//! `analyze`: drives one analysis session from the terminal.

use std::sync::Arc;

use prospecto_analysis::{
    AnalysisSession, Analyzer, GeminiClient, PanelView, SessionAction, SessionSnapshot,
    SessionState,
};
use prospecto_core::{AppConfig, Coordinates, FieldMap, FieldName};
use prospecto_geo::GeoClient;
use tokio::sync::Mutex;

use crate::lookup::truncate;

#[derive(Debug)]
pub(crate) struct AnalyzeOptions {
    pub point: Coordinates,
    pub place_id: Option<String>,
    pub alternative: bool,
    pub tax_id: Option<String>,
    pub json: bool,
}

/// Runs inspect, confirm, pick (or alternative), and enrichment, then prints
/// every resulting record.
///
/// # Errors
///
/// Fails when a step leaves an error on the session (missing credentials,
/// provider failure, unusable answer) or when `--place-id` is not nearby.
pub(crate) async fn run_analyze(config: &AppConfig, options: AnalyzeOptions) -> anyhow::Result<()> {
    let geo = Arc::new(
        GeoClient::from_config(config)
            .map_err(|e| anyhow::anyhow!("failed to build geo client: {e}"))?,
    );
    let model = Arc::new(
        GeminiClient::from_config(config)
            .map_err(|e| anyhow::anyhow!("failed to build Gemini client: {e}"))?,
    );
    let analyzer = Analyzer::new(geo.clone(), geo, model);
    let session = Mutex::new(AnalysisSession::new());

    let snap = step(
        &analyzer,
        &session,
        SessionAction::Inspect {
            lat: options.point.lat,
            lng: options.point.lng,
        },
    )
    .await?;
    let label = snap
        .inquiry
        .as_ref()
        .map_or_else(|| "Selected location".to_string(), |i| i.confirm_label.clone());
    eprintln!("location: {label}");

    let pick = if options.alternative {
        SessionAction::AnalyzeAlternative { tags: None }
    } else {
        let snap = step(&analyzer, &session, SessionAction::Confirm).await?;
        choose_place(&snap, options.place_id.as_deref())?
    };
    step(&analyzer, &session, pick).await?;

    let mut edits = FieldMap::new();
    if let Some(tax_id) = options.tax_id.filter(|t| !t.trim().is_empty()) {
        edits.insert(FieldName::TaxId, tax_id);
    }
    let snap = step(&analyzer, &session, SessionAction::SearchDetails { edits }).await?;

    let record_count = snap
        .panel
        .as_ref()
        .and_then(|p| p.switcher.as_ref())
        .map_or(1, |s| s.buttons.len());

    let mut views = vec![snap];
    for index in 1..record_count {
        views.push(step(&analyzer, &session, SessionAction::SwitchRecord { index }).await?);
    }

    if options.json {
        let panels: Vec<_> = views.iter().filter_map(|s| s.panel.as_ref()).collect();
        println!("{}", serde_json::to_string_pretty(&panels)?);
        return Ok(());
    }
    for (i, view) in views.iter().enumerate() {
        if let Some(panel) = &view.panel {
            if i > 0 {
                println!();
            }
            print_panel(panel);
        }
    }
    Ok(())
}

/// Dispatches `action` and turns an error left on the session into a failure.
async fn step(
    analyzer: &Analyzer,
    session: &Mutex<AnalysisSession>,
    action: SessionAction,
) -> anyhow::Result<SessionSnapshot> {
    let name = action.name();
    let snap = analyzer.dispatch(session, action).await?;
    if let Some(err) = &snap.last_error {
        anyhow::bail!("{name} failed: {}", err.message);
    }
    Ok(snap)
}

pub(crate) fn choose_place(
    snap: &SessionSnapshot,
    wanted: Option<&str>,
) -> anyhow::Result<SessionAction> {
    debug_assert_eq!(snap.state, SessionState::AwaitingPlacePick);
    if let Some(id) = wanted {
        if !snap.candidates.iter().any(|c| c.id == id) {
            anyhow::bail!("place {id} is not among the nearby results");
        }
        return Ok(SessionAction::PickPlace {
            place_id: id.to_string(),
        });
    }
    match snap.candidates.first() {
        Some(first) => {
            eprintln!("analyzing nearest listed place: {}", first.name);
            Ok(SessionAction::PickPlace {
                place_id: first.id.clone(),
            })
        }
        None => {
            eprintln!("no establishments found; analyzing the location itself");
            Ok(SessionAction::AnalyzeAlternative { tags: None })
        }
    }
}

fn print_panel(panel: &PanelView) {
    if let Some(active) = panel
        .switcher
        .as_ref()
        .and_then(|s| s.buttons.iter().find(|b| b.active))
    {
        match active.warning {
            Some(warning) => println!("== {} ({warning}) ==", active.label),
            None => println!("== {} ==", active.label),
        }
    }
    for row in panel.visible_rows() {
        let marker = if row.highlighted { " (!)" } else { "" };
        println!("{:<22}{}{marker}", row.label, truncate(&row.value, 200));
    }
    for source in &panel.sources {
        println!("[{}] {} <{}>", source.number, source.title, source.uri);
    }
}
