//! Rendering collaborator.
//!
//! The composition engine is external. The contract is narrow: the renderer
//! is a program that reads the item props as JSON on stdin, writes a video to
//! the path given as its final argument, and exits zero. Non-zero exit or a
//! missing output file is a per-item failure.

use crate::errors::CollabError;
use crate::model::ItemProps;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[async_trait]
pub trait RenderEngine: Send + Sync {
    async fn render(&self, props: &ItemProps, out: &Path) -> Result<(), CollabError>;
}

/// Runs a configured render command as a child process.
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    /// `cmd` is split on whitespace into program + leading args; the output
    /// path is appended per invocation.
    pub fn new(cmd: &str) -> Self {
        let mut parts = cmd.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| "clipforge-render".into());
        Self {
            program,
            args: parts.collect(),
        }
    }
}

#[async_trait]
impl RenderEngine for CommandRenderer {
    async fn render(&self, props: &ItemProps, out: &Path) -> Result<(), CollabError> {
        let props_json = serde_json::to_string(props)
            .map_err(|e| CollabError::MalformedPayload(format!("unserializable props: {e}")))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(out)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(props_json.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let status = child.wait().await?;
        if !status.success() {
            return Err(CollabError::RenderFailed {
                exit_code: status.code().unwrap_or(-1),
            });
        }
        if !out.exists() {
            return Err(CollabError::RenderMissingOutput {
                path: out.to_path_buf(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn props() -> ItemProps {
        ItemProps {
            title: "T".into(),
            subtitle: "S".into(),
            media_paths: vec!["assets/bg.mp4".into()],
            audio_path: "assets/tts.mp3".into(),
            bgm_path: None,
            theme_color: "#000000".into(),
            transcript: None,
        }
    }

    #[test]
    fn test_command_splitting() {
        let renderer = CommandRenderer::new("npx remotion-cli render --quiet");
        assert_eq!(renderer.program, "npx");
        assert_eq!(renderer.args, vec!["remotion-cli", "render", "--quiet"]);

        let bare = CommandRenderer::new("renderer");
        assert_eq!(bare.program, "renderer");
        assert!(bare.args.is_empty());
    }

    #[tokio::test]
    async fn test_render_success_with_shell_stub() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("clip.mp4");
        // A stand-in renderer: consume stdin, touch the output path. Built
        // directly because the shell script needs spaces `new` would split.
        let renderer = CommandRenderer {
            program: "sh".into(),
            args: vec!["-c".into(), "cat > /dev/null; touch \"$0\"".into()],
        };
        renderer.render(&props(), &out).await.unwrap();
        assert!(out.exists());
    }

    #[tokio::test]
    async fn test_render_nonzero_exit_is_failure() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("clip.mp4");
        let renderer = CommandRenderer {
            program: "sh".into(),
            args: vec!["-c".into(), "cat > /dev/null; exit 3".into()],
        };
        let err = renderer.render(&props(), &out).await.unwrap_err();
        assert!(matches!(err, CollabError::RenderFailed { exit_code: 3 }));
    }

    #[tokio::test]
    async fn test_render_missing_output_is_failure() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("clip.mp4");
        let renderer = CommandRenderer {
            program: "sh".into(),
            args: vec!["-c".into(), "cat > /dev/null".into()],
        };
        let err = renderer.render(&props(), &out).await.unwrap_err();
        assert!(matches!(err, CollabError::RenderMissingOutput { .. }));
    }
}
