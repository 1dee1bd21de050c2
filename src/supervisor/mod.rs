//! Pipeline supervisor.
//!
//! Runs plan then render as child processes of this same binary, consumes
//! each child's stdout line by line, parses the structured stage events, and
//! forwards the interesting ones to the operator channel so nobody has to
//! watch a terminal. One invocation, one reported outcome per stage; no
//! automatic retry.

use crate::channel::OperatorChannel;
use crate::events::StageEvent;
use crate::ui;
use anyhow::{Context, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub stage: String,
    pub exit_code: i32,
}

#[derive(Debug, Default)]
pub struct PipelineReport {
    pub stages: Vec<StageOutcome>,
}

impl PipelineReport {
    pub fn success(&self) -> bool {
        self.stages.iter().all(|s| s.exit_code == 0)
    }
}

/// Translate a stage event into the operator-facing message for it, or `None`
/// for events the operator does not need pushed (the render stage already
/// sends the approval prompt itself).
pub fn describe_event(event: &StageEvent) -> Option<String> {
    match event {
        StageEvent::ItemPlanned { id, idea } => {
            Some(format!("New item planned: \"{idea}\" ({id})"))
        }
        StageEvent::RenderStarted { id } => Some(format!("Rendering started: {id}")),
        StageEvent::ItemUploaded { id, url } => Some(format!("Published {id}: {url}")),
        StageEvent::StageError { message } => Some(format!("Pipeline error: {message}")),
        StageEvent::PlanSkipped { .. }
        | StageEvent::ItemRendered { .. }
        | StageEvent::StageDone { .. } => None,
    }
}

/// Run the full plan -> render sequence, reporting per-stage outcomes to the
/// operator channel. Render does not run if plan exits non-zero.
pub async fn run_pipeline(channel: &OperatorChannel, root_dir: &Path) -> Result<PipelineReport> {
    let mut report = PipelineReport::default();

    for stage in ["plan", "render"] {
        let outcome = run_stage(channel, root_dir, stage).await?;
        let exit_code = outcome.exit_code;
        report.stages.push(outcome);

        let summary = if exit_code == 0 {
            format!("Stage {stage} finished.")
        } else {
            format!("Stage {stage} failed with exit code {exit_code}.")
        };
        if let Err(e) = channel.send_message(&summary).await {
            ui::warn(&format!("Could not report stage outcome: {e}"));
        }

        if exit_code != 0 {
            break;
        }
    }

    Ok(report)
}

async fn run_stage(
    channel: &OperatorChannel,
    root_dir: &Path,
    stage: &str,
) -> Result<StageOutcome> {
    let exe = std::env::current_exe().context("Failed to locate own executable")?;
    ui::step(&format!("Supervisor: launching {stage}"));

    let mut child = Command::new(exe)
        .arg("--root")
        .arg(root_dir)
        .arg(stage)
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("Failed to spawn {stage} stage"))?;

    let stdout = child
        .stdout
        .take()
        .context("Failed to capture stage stdout")?;
    let mut lines = BufReader::new(stdout).lines();

    while let Some(line) = lines.next_line().await? {
        match StageEvent::parse_line(&line) {
            Some(event) => {
                if let Some(message) = describe_event(&event)
                    && let Err(e) = channel.send_message(&message).await
                {
                    ui::warn(&format!("Could not forward event: {e}"));
                }
            }
            // Human log line from the child; pass it through untouched.
            None => println!("{line}"),
        }
    }

    let status = child.wait().await?;
    let exit_code = status.code().unwrap_or(-1);
    ui::dim(&format!("Supervisor: {stage} exited with {exit_code}"));

    Ok(StageOutcome {
        stage: stage.to_string(),
        exit_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_event_forwards_the_interesting_ones() {
        let planned = StageEvent::ItemPlanned {
            id: "idea_1_aa".into(),
            idea: "cats".into(),
        };
        let msg = describe_event(&planned).unwrap();
        assert!(msg.contains("cats"));
        assert!(msg.contains("idea_1_aa"));

        let started = StageEvent::RenderStarted {
            id: "idea_1_aa".into(),
        };
        assert!(describe_event(&started).unwrap().contains("Rendering"));

        let uploaded = StageEvent::ItemUploaded {
            id: "idea_1_aa".into(),
            url: "https://youtube.com/shorts/x".into(),
        };
        assert!(describe_event(&uploaded).unwrap().contains("shorts/x"));

        let error = StageEvent::StageError {
            message: "render failed".into(),
        };
        assert!(describe_event(&error).unwrap().contains("render failed"));
    }

    #[test]
    fn test_describe_event_stays_quiet_for_the_rest() {
        assert!(describe_event(&StageEvent::PlanSkipped { idea: "x".into() }).is_none());
        assert!(
            describe_event(&StageEvent::ItemRendered {
                id: "a".into(),
                path: "out/a.mp4".into()
            })
            .is_none()
        );
        assert!(
            describe_event(&StageEvent::StageDone {
                stage: "plan".into(),
                ok: 1,
                failed: 0
            })
            .is_none()
        );
    }

    #[test]
    fn test_pipeline_report_success() {
        let mut report = PipelineReport::default();
        report.stages.push(StageOutcome {
            stage: "plan".into(),
            exit_code: 0,
        });
        assert!(report.success());
        report.stages.push(StageOutcome {
            stage: "render".into(),
            exit_code: 1,
        });
        assert!(!report.success());
    }
}
