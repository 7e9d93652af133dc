use std::{
    env,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    process,
};

use title_gesture::{
    gesture::{GestureAction, ResetReason},
    AttemptId, GestureTrigger,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ReplayStep {
    Tap { ms: u64 },
    Expiry { ms: u64 },
    Auth { attempt: u32, granted: bool },
    Unmount,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let mut trace_path: Option<PathBuf> = None;
    let mut expect_path: Option<PathBuf> = None;

    let mut idx = 1usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--expect" => {
                idx += 1;
                let Some(path) = args.get(idx) else {
                    return Err("missing path after --expect".into());
                };
                expect_path = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                println!("{}", usage());
                return Ok(());
            }
            value if value.starts_with('-') => {
                return Err(format!("unknown argument: {value}"));
            }
            value => {
                if trace_path.is_some() {
                    return Err("multiple trace paths provided".into());
                }
                trace_path = Some(PathBuf::from(value));
            }
        }
        idx += 1;
    }

    let trace_path = trace_path.ok_or_else(usage)?;
    let steps = read_trace(&trace_path)?;
    let actions = replay(&steps);

    println!("action,step,kind,detail");
    for (step, action) in &actions {
        println!("action,{},{},{}", step, kind_label(action), detail(action));
    }

    if let Some(expect_path) = expect_path {
        let expected = read_expected_kinds(&expect_path)?;
        let actual: Vec<&'static str> = actions.iter().map(|(_, a)| kind_label(a)).collect();
        if actual != expected {
            eprintln!("expected kinds: {}", expected.join(","));
            eprintln!("actual kinds:   {}", actual.join(","));
            return Err("action sequence mismatch".into());
        }
    }

    Ok(())
}

fn usage() -> String {
    "usage: tap_replay <trace.csv> [--expect expected_kinds.txt]".to_string()
}

fn replay(steps: &[ReplayStep]) -> Vec<(usize, GestureAction)> {
    let mut trigger = GestureTrigger::new();
    let mut out = Vec::new();
    for (idx, step) in steps.iter().enumerate() {
        let output = match *step {
            ReplayStep::Tap { ms } => trigger.tap(ms),
            ReplayStep::Expiry { ms } => trigger.expiry_check(ms),
            ReplayStep::Auth { attempt, granted } => {
                trigger.auth_resolved(AttemptId(attempt), granted)
            }
            ReplayStep::Unmount => trigger.unmount(),
        };
        out.extend(output.actions.iter().map(|action| (idx + 1, *action)));
    }
    out
}

fn read_trace(path: &Path) -> Result<Vec<ReplayStep>, String> {
    let file = File::open(path).map_err(|e| format!("failed to open {}: {e}", path.display()))?;
    parse_trace(BufReader::new(file), &path.display().to_string())
}

fn parse_trace(reader: impl BufRead, source: &str) -> Result<Vec<ReplayStep>, String> {
    let mut out = Vec::new();
    for (line_no, line_result) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line_result.map_err(|e| format!("failed to read {source}:{line_no}: {e}"))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        let step = match parts.as_slice() {
            ["tap", ms] => ReplayStep::Tap {
                ms: parse_u64(ms, source, line_no, "ms")?,
            },
            ["expiry", ms] => ReplayStep::Expiry {
                ms: parse_u64(ms, source, line_no, "ms")?,
            },
            ["auth", attempt, verdict] => ReplayStep::Auth {
                attempt: parse_u32(attempt, source, line_no, "attempt")?,
                granted: match *verdict {
                    "granted" | "1" | "true" => true,
                    "denied" | "0" | "false" => false,
                    other => {
                        return Err(format!("{source}:{line_no} invalid verdict '{other}'"));
                    }
                },
            },
            ["unmount"] => ReplayStep::Unmount,
            _ => {
                return Err(format!("{source}:{line_no} invalid trace line: {trimmed}"));
            }
        };
        out.push(step);
    }

    Ok(out)
}

fn read_expected_kinds(path: &Path) -> Result<Vec<&'static str>, String> {
    let file = File::open(path).map_err(|e| format!("failed to open {}: {e}", path.display()))?;
    let reader = BufReader::new(file);

    let mut kinds = Vec::new();
    for (line_no, line_result) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line_result
            .map_err(|e| format!("failed to read {}:{}: {e}", path.display(), line_no))?;
        let token = line.trim();
        if token.is_empty() || token.starts_with('#') {
            continue;
        }

        let normalized = normalize_kind(token).ok_or_else(|| {
            format!(
                "{}:{} invalid expected action kind: {}",
                path.display(),
                line_no,
                token
            )
        })?;
        kinds.push(normalized);
    }

    Ok(kinds)
}

fn normalize_kind(kind: &str) -> Option<&'static str> {
    match kind.trim().to_ascii_lowercase().as_str() {
        "authenticate" => Some("authenticate"),
        "navigate" => Some("navigate"),
        "schedule_expiry" => Some("schedule_expiry"),
        "counter" => Some("counter"),
        "log_cleared" => Some("log_cleared"),
        _ => None,
    }
}

fn kind_label(action: &GestureAction) -> &'static str {
    match action {
        GestureAction::Authenticate { .. } => "authenticate",
        GestureAction::Navigate { .. } => "navigate",
        GestureAction::ScheduleExpiry { .. } => "schedule_expiry",
        GestureAction::CounterChanged(_) => "counter",
        GestureAction::LogCleared { .. } => "log_cleared",
    }
}

fn detail(action: &GestureAction) -> String {
    match action {
        GestureAction::Authenticate { attempt } => format!("attempt={}", attempt.0),
        GestureAction::Navigate { target } => format!("target={target}"),
        GestureAction::ScheduleExpiry { due_ms } => format!("due_ms={due_ms}"),
        GestureAction::CounterChanged(value) => format!("value={value}"),
        GestureAction::LogCleared { reason } => match reason {
            ResetReason::Qualified => "reason=qualified".into(),
            ResetReason::Expired => "reason=expired".into(),
            ResetReason::Unmounted => "reason=unmounted".into(),
        },
    }
}

fn parse_u64(raw: &str, source: &str, line_no: usize, field: &str) -> Result<u64, String> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| format!("{source}:{line_no} invalid {field} '{}': {e}", raw.trim()))
}

fn parse_u32(raw: &str, source: &str, line_no: usize, field: &str) -> Result<u32, String> {
    raw.trim()
        .parse::<u32>()
        .map_err(|e| format!("{source}:{line_no} invalid {field} '{}': {e}", raw.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(trace: &str) -> Vec<&'static str> {
        let steps = parse_trace(trace.as_bytes(), "inline").unwrap();
        replay(&steps).iter().map(|(_, a)| kind_label(a)).collect()
    }

    #[test]
    fn parses_all_step_kinds() {
        let steps = parse_trace(
            "# header\ntap,0\nexpiry, 3001\nauth,1,granted\nunmount\n".as_bytes(),
            "inline",
        )
        .unwrap();
        assert_eq!(
            steps,
            vec![
                ReplayStep::Tap { ms: 0 },
                ReplayStep::Expiry { ms: 3_001 },
                ReplayStep::Auth {
                    attempt: 1,
                    granted: true
                },
                ReplayStep::Unmount,
            ]
        );
    }

    #[test]
    fn rejects_unknown_lines() {
        let err = parse_trace("swipe,10\n".as_bytes(), "inline").unwrap_err();
        assert!(err.contains("inline:1"));
    }

    #[test]
    fn rejects_attempt_ids_beyond_u32() {
        let err = parse_trace("tap,0\nauth,4294967296,granted\n".as_bytes(), "inline")
            .unwrap_err();
        assert!(err.contains("inline:2 invalid attempt '4294967296'"));

        let steps = parse_trace("auth,4294967295,denied\n".as_bytes(), "inline").unwrap();
        assert_eq!(
            steps,
            vec![ReplayStep::Auth {
                attempt: u32::MAX,
                granted: false
            }]
        );
    }

    #[test]
    fn granted_trace_ends_with_navigation() {
        let trace = "tap,0\ntap,500\ntap,1000\ntap,1500\ntap,2000\nauth,1,granted\n";
        let kinds = kinds(trace);
        assert_eq!(kinds.iter().filter(|k| **k == "authenticate").count(), 1);
        assert_eq!(kinds.last(), Some(&"navigate"));
    }

    #[test]
    fn denied_trace_has_no_navigation() {
        let trace = "tap,0\ntap,500\ntap,1000\ntap,1500\ntap,2000\nauth,1,denied\n";
        assert!(!kinds(trace).contains(&"navigate"));
    }
}
