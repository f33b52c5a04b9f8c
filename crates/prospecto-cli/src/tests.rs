use fixtures::snapshot;

use super::*;

mod fixtures {
    use prospecto_analysis::{AnalysisSession, Begun, Outcome, SessionAction, SessionSnapshot};
    use prospecto_core::{CandidatePlace, Coordinates, GeoResult, PlaceSource};
    use prospecto_geo::LocationInquiry;

    /// A session parked in `AwaitingPlacePick` with the given candidate ids.
    pub(super) fn snapshot(ids: &[&str]) -> SessionSnapshot {
        let mut session = AnalysisSession::new();
        let Begun::Pending(t) = session
            .begin(SessionAction::Inspect { lat: 1.0, lng: 1.0 })
            .unwrap()
        else {
            panic!("inspect needs I/O");
        };
        session.complete(
            &t,
            Outcome::Inspected(LocationInquiry {
                coordinates: Coordinates::new(1.0, 1.0),
                osm_result: GeoResult::failed("down"),
                stats_result: GeoResult::failed("down"),
            }),
        );
        let Begun::Pending(t) = session.begin(SessionAction::Confirm).unwrap() else {
            panic!("confirm needs I/O");
        };
        let candidates = ids
            .iter()
            .map(|id| CandidatePlace {
                id: (*id).to_string(),
                name: format!("Place {id}"),
                vicinity: String::new(),
                source: PlaceSource::Commercial,
                raw_tags: None,
            })
            .collect();
        session.complete(&t, Outcome::Candidates(candidates));
        session.snapshot()
    }
}

#[test]
fn parses_inspect_with_negative_coordinates() {
    let cli = Cli::try_parse_from(["prospecto-cli", "inspect", "--lat", "-23.55", "--lng", "-46.63"])
        .expect("expected valid cli args");
    let Commands::Inspect { point } = cli.command else {
        panic!("expected inspect");
    };
    assert!((point.lat + 23.55).abs() < f64::EPSILON);
    assert!(!cli.json);
}

#[test]
fn parses_global_json_flag() {
    let cli = Cli::try_parse_from(["prospecto-cli", "find-address", "Avenida Paulista", "--json"])
        .expect("expected valid cli args");
    assert!(cli.json);
    assert!(matches!(cli.command, Commands::FindAddress { ref query } if query == "Avenida Paulista"));
}

#[test]
fn geocode_number_and_state_are_optional() {
    let cli = Cli::try_parse_from([
        "prospecto-cli",
        "geocode",
        "--street",
        "Rua Augusta",
        "--city",
        "São Paulo",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Geocode { ref number, ref state, .. } if number.is_empty() && state.is_empty()
    ));
}

#[test]
fn analyze_rejects_place_id_with_alternative() {
    let result = Cli::try_parse_from([
        "prospecto-cli",
        "analyze",
        "--lat",
        "1",
        "--lng",
        "1",
        "--place-id",
        "abc",
        "--alternative",
    ]);
    assert!(result.is_err());
}

#[test]
fn choose_place_defaults_to_first_candidate() {
    let action = analyze::choose_place(&snapshot(&["a", "b"]), None).unwrap();
    assert_eq!(
        action,
        prospecto_analysis::SessionAction::PickPlace {
            place_id: "a".to_string()
        }
    );
}

#[test]
fn choose_place_without_candidates_analyzes_location() {
    let action = analyze::choose_place(&snapshot(&[]), None).unwrap();
    assert_eq!(
        action,
        prospecto_analysis::SessionAction::AnalyzeAlternative { tags: None }
    );
}

#[test]
fn choose_place_rejects_unknown_id() {
    assert!(analyze::choose_place(&snapshot(&["a"]), Some("zzz")).is_err());
}
