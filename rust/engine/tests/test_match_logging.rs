use std::fs;
use std::path::PathBuf;

use netchess_engine::board::STANDARD_LAYOUT;
use netchess_engine::game::{MatchController, MatchResult};
use netchess_engine::logger::{MatchLogger, MatchRecord};
use netchess_engine::pieces::Side;
use netchess_engine::rules::MoveRequest;

fn tmp_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from("target");
    p.push(format!("{}_{}.jsonl", name, std::process::id()));
    p
}

fn finished_match() -> MatchController {
    let mut game = MatchController::new();
    game.start_match(STANDARD_LAYOUT, Side::White).unwrap();
    let sq = |s: &str| s.parse().unwrap();
    game.play(&MoveRequest::new(sq("f2"), sq("f3"))).unwrap();
    game.play(&MoveRequest::new(sq("e7"), sq("e5"))).unwrap();
    game.resign(Side::White).unwrap();
    game
}

#[test]
fn appends_one_lf_terminated_line_per_match() {
    let path = tmp_path("matchlog");
    let _ = fs::remove_file(&path);
    let mut logger = MatchLogger::create(&path).expect("create logger");
    let game = finished_match();
    for _ in 0..2 {
        let id = logger.next_id();
        let record = game.to_record(id, ["Ann".into(), "Bo".into()]);
        logger.write(&record).expect("write");
    }
    let text = fs::read_to_string(&path).expect("read file");
    assert!(text.ends_with('\n'));
    assert!(!text.contains('\r'));
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);

    let parsed: MatchRecord = serde_json::from_str(lines[1]).unwrap();
    assert!(parsed.match_id.ends_with("-000002"));
    assert_eq!(parsed.moves.len(), 2);
    assert_eq!(parsed.result, Some(MatchResult::BlackWins));
    assert!(parsed.ts.is_some());
    let _ = fs::remove_file(&path);
}
