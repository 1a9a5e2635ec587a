//! Session command for summarizing one record/log pair.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use pt_core::summarize_session;

use crate::Config;
use crate::commands::util::{summary_json, write_summary};

/// Summarizes `record` and `log`, printing the JSON or writing it to `output`.
pub fn run<W: Write>(
    writer: &mut W,
    record: &Path,
    log: &Path,
    output: Option<&Path>,
    config: &Config,
) -> Result<()> {
    let reconciliation = summarize_session(record, log, &config.session_options())
        .with_context(|| format!("failed to summarize {}", record.display()))?;

    match output {
        Some(path) => {
            write_summary(path, &reconciliation.result)?;
            writeln!(writer, "Wrote {}", path.display())?;
        }
        None => writeln!(writer, "{}", summary_json(&reconciliation.result)?)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use insta::assert_snapshot;

    const RECORD: &str = r#"{
        "loginTime": 133485408000000000,
        "logoutTime": 133485444000000000,
        "potionsPrepared": "2",
        "frameData": [
            {"frameDataId": 10, "labels": "p;s;l;+01:00;1000;3600;3599.5"},
            {"frameDataId": 11, "labels": "p;s;l;+01:00;1500;3900;3899.5"},
            {"frameDataId": 9, "labels": "p;s;l;+01:00;900;600;599.5"}
        ]
    }"#;

    const LOG: &str = "\
INFO (2024-01-01 00:00:05), Scene loaded
INFO (2024-01-01 00:01:00), Recipe (Id:1) started
INFO (2024-01-01 00:02:00), Recipe (Id:1) Success
INFO (2024-01-01 00:03:00), Recipe (Id:2) started
INFO (2024-01-01 00:04:00), Recipe (Id:2) Unknown
INFO (2024-01-01 00:59:59), Session closed
";

    #[test]
    fn test_session_command_prints_summary() {
        let temp = tempfile::tempdir().unwrap();
        let record = temp.path().join("s.json");
        let log = temp.path().join("s.log");
        fs::write(&record, RECORD).unwrap();
        fs::write(&log, LOG).unwrap();

        let mut output = Vec::new();
        run(&mut output, &record, &log, None, &Config::default()).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap().trim_end(), @r#"
        {
          "loginTicks": 133485408000000000,
          "logoutTicks": 133485444000000000,
          "potionsDeclared": 2,
          "loginReadable": "2024-01-01 00:00:00",
          "logoutReadable": "2024-01-01 01:00:00",
          "playedSeconds_system": 3300.0,
          "playedSeconds_kinect": 600.0,
          "playedSeconds_unity": 3300.0,
          "logoutComputedFromDuration": "2024-01-01 00:55:00",
          "firstTimestamp": "2024-01-01 00:00:05",
          "lastTimestamp": "2024-01-01 00:59:59",
          "started": 2,
          "succeeded": 1,
          "failed": 0,
          "errored": 0,
          "potionsMismatch": true,
          "noPotionsSucceeded": false
        }
        "#);
    }

    #[test]
    fn test_session_command_writes_output_file() {
        let temp = tempfile::tempdir().unwrap();
        let record = temp.path().join("s.json");
        let out = temp.path().join("summary.json");
        fs::write(&record, RECORD).unwrap();

        let mut output = Vec::new();
        run(
            &mut output,
            &record,
            &temp.path().join("missing.log"),
            Some(&out),
            &Config::default(),
        )
        .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["started"], "logfile not available");
        assert_eq!(written["playedSeconds_system"], 3300.0);
        assert!(String::from_utf8(output).unwrap().starts_with("Wrote "));
    }

    #[test]
    fn test_session_command_reports_missing_record() {
        let temp = tempfile::tempdir().unwrap();
        let err = run(
            &mut Vec::new(),
            &temp.path().join("missing.json"),
            &temp.path().join("missing.log"),
            None,
            &Config::default(),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("missing input"));
    }
}
