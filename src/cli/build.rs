//! `plantlink build`: encode diagrams and emit links or renders.
//!
//! Files are encoded (and fetched, for styles that need the render service)
//! in parallel; results are emitted in argument order and the first failure
//! in that order aborts the command.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rayon::prelude::*;

use crate::cli::BuildArgs;
use crate::config::{Config, RenderConfig};
use crate::encode::encode;
use crate::render::{RenderClient, Style, render_link};
use crate::utils::path::{unique_absolute_paths, with_format_extension};
use crate::{debug, log};

/// What one diagram compiled into.
#[derive(Debug, PartialEq, Eq)]
enum Artifact {
    Link(String),
    Render(Vec<u8>),
}

/// Entry point: files from `args`, or stdin when none are given.
pub fn build(config: &Config, args: &BuildArgs) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.files.is_empty() {
        let mut raw = Vec::new();
        io::stdin()
            .read_to_end(&mut raw)
            .context("Failed to read diagram from stdin")?;
        build_stdin(&config.render, &raw, &mut out)?;
    } else {
        let files = unique_absolute_paths(&args.files);
        build_files(&config.render, &files, &mut out)?;
    }

    out.flush().context("Failed to flush stdout")
}

fn build_stdin(render: &RenderConfig, raw: &[u8], out: &mut impl Write) -> Result<()> {
    if render.style == Style::File {
        bail!("--style file needs input files; use --style link or --style out with stdin");
    }

    let client = render_client(render)?;
    let artifact = compile(raw, render, client.as_ref())?;
    emit(artifact, out)
}

fn build_files(render: &RenderConfig, files: &[PathBuf], out: &mut impl Write) -> Result<()> {
    let client = render_client(render)?;

    let results: Vec<Result<Artifact>> = files
        .par_iter()
        .map(|path| compile_file(path, render, client.as_ref()))
        .collect();

    for (path, result) in files.iter().zip(results) {
        let artifact = result?;
        match render.style {
            Style::File => write_render_file(path, render, artifact)?,
            Style::Link | Style::Out => emit(artifact, out)?,
        }
    }
    Ok(())
}

fn render_client(render: &RenderConfig) -> Result<Option<RenderClient>> {
    if !render.style.fetches() {
        return Ok(None);
    }
    Ok(Some(RenderClient::new(render.timeout())?))
}

fn compile_file(path: &Path, render: &RenderConfig, client: Option<&RenderClient>) -> Result<Artifact> {
    let raw = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    debug!("build"; "compiling {}", path.display());
    compile(&raw, render, client).with_context(|| format!("Failed to build {}", path.display()))
}

/// Encode `raw` and, when a client is given, fetch the render.
fn compile(raw: &[u8], render: &RenderConfig, client: Option<&RenderClient>) -> Result<Artifact> {
    let token = encode(raw)?;
    let link = render_link(&render.server, render.format, &token);

    match client {
        Some(client) => Ok(Artifact::Render(client.fetch(&link)?)),
        None => Ok(Artifact::Link(link)),
    }
}

fn emit(artifact: Artifact, out: &mut impl Write) -> Result<()> {
    let written = match artifact {
        Artifact::Link(link) => writeln!(out, "{link}"),
        Artifact::Render(bytes) => out.write_all(&bytes),
    };
    written.context("Failed to write to stdout")
}

/// Write `<stem>.<format>` next to the source, replacing any previous render.
fn write_render_file(source: &Path, render: &RenderConfig, artifact: Artifact) -> Result<()> {
    let Artifact::Render(bytes) = artifact else {
        bail!("no render fetched for {}", source.display());
    };

    let target = with_format_extension(source, render.format.as_str());
    fs::write(&target, bytes).with_context(|| format!("Failed to write {}", target.display()))?;
    log!("build"; "{}", target.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode;
    use crate::render::Format;
    use crate::render::stub::StubRenderServer;
    use crate::utils::path::normalize_path;

    const DIAGRAM: &str = "@startuml\nBob -> Alice : hello\n@enduml";

    fn render(server: &str, format: Format, style: Style) -> RenderConfig {
        RenderConfig {
            server: server.to_string(),
            format,
            style,
            timeout: 10,
        }
    }

    fn token(raw: &str) -> String {
        encode::encode(raw.as_bytes()).unwrap()
    }

    #[test]
    fn test_stdin_link() {
        let mut out = Vec::new();
        let config = render("https://render.test/plantuml", Format::Png, Style::Link);
        build_stdin(&config, DIAGRAM.as_bytes(), &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("https://render.test/plantuml/png/{}\n", token(DIAGRAM))
        );
    }

    #[test]
    fn test_stdin_rejects_file_style() {
        let mut out = Vec::new();
        let config = render("https://render.test/plantuml", Format::Svg, Style::File);
        let err = build_stdin(&config, DIAGRAM.as_bytes(), &mut out).unwrap_err();

        assert!(err.to_string().contains("--style file"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_stdin_out_writes_render() {
        let stub = StubRenderServer::start();
        let mut out = Vec::new();
        let config = render(&stub.ok_url(), Format::Txt, Style::Out);
        build_stdin(&config, DIAGRAM.as_bytes(), &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("rendered:/ok/txt/{}", token(DIAGRAM))
        );
    }

    #[test]
    fn test_files_link_in_argument_order_without_duplicates() {
        let temp = tempfile::tempdir().unwrap();
        let dir = normalize_path(temp.path());
        let b = dir.join("b.puml");
        let a = dir.join("a.puml");
        fs::write(&b, "@startuml\nB -> C\n@enduml").unwrap();
        fs::write(&a, "@startuml\nA -> B\n@enduml").unwrap();

        let files = unique_absolute_paths(&[b.clone(), a.clone(), b.clone()]);
        let mut out = Vec::new();
        let config = render("http://r", Format::Svg, Style::Link);
        build_files(&config, &files, &mut out).unwrap();

        let expected = format!(
            "http://r/svg/{}\nhttp://r/svg/{}\n",
            token("@startuml\nB -> C\n@enduml"),
            token("@startuml\nA -> B\n@enduml"),
        );
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_files_file_style_writes_next_to_source() {
        let stub = StubRenderServer::start();
        let temp = tempfile::tempdir().unwrap();
        let source = normalize_path(temp.path()).join("example.puml");
        let target = normalize_path(temp.path()).join("example.png");
        fs::write(&source, DIAGRAM).unwrap();
        // Longer stale render must be fully replaced.
        fs::write(&target, "x".repeat(4096)).unwrap();

        let mut out = Vec::new();
        let config = render(&stub.ok_url(), Format::Png, Style::File);
        build_files(&config, &[source], &mut out).unwrap();

        assert!(out.is_empty());
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            format!("rendered:/ok/png/{}", token(DIAGRAM))
        );
    }

    #[test]
    fn test_files_out_concatenates_renders() {
        let stub = StubRenderServer::start();
        let temp = tempfile::tempdir().unwrap();
        let a = normalize_path(temp.path()).join("a.puml");
        let b = normalize_path(temp.path()).join("b.puml");
        fs::write(&a, "@startuml\nA -> B\n@enduml").unwrap();
        fs::write(&b, "@startuml\nB -> C\n@enduml").unwrap();

        let mut out = Vec::new();
        let config = render(&stub.ok_url(), Format::Svg, Style::Out);
        build_files(&config, &[a, b], &mut out).unwrap();

        let expected = format!(
            "rendered:/ok/svg/{}rendered:/ok/svg/{}",
            token("@startuml\nA -> B\n@enduml"),
            token("@startuml\nB -> C\n@enduml"),
        );
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_render_failure_names_status_and_link() {
        let stub = StubRenderServer::start();
        let temp = tempfile::tempdir().unwrap();
        let source = normalize_path(temp.path()).join("broken.puml");
        fs::write(&source, DIAGRAM).unwrap();

        let mut out = Vec::new();
        let config = render(&stub.failing_url(), Format::Png, Style::Out);
        let err = build_files(&config, &[source], &mut out).unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("wrong status code 500"));
        assert!(message.contains(&format!("{}/png/{}", stub.failing_url(), token(DIAGRAM))));
        assert!(out.is_empty());
    }

    #[test]
    fn test_missing_file_fails() {
        let temp = tempfile::tempdir().unwrap();
        let missing = normalize_path(temp.path()).join("missing.puml");

        let mut out = Vec::new();
        let config = render("http://r", Format::Svg, Style::Link);
        let err = build_files(&config, &[missing], &mut out).unwrap_err();
        assert!(err.to_string().contains("missing.puml"));
    }

    #[test]
    fn test_first_failure_in_argument_order_stops_output() {
        let temp = tempfile::tempdir().unwrap();
        let dir = normalize_path(temp.path());
        let good = dir.join("good.puml");
        fs::write(&good, DIAGRAM).unwrap();

        let mut out = Vec::new();
        let config = render("http://r", Format::Svg, Style::Link);
        let result = build_files(&config, &[dir.join("missing.puml"), good], &mut out);

        assert!(result.is_err());
        assert!(out.is_empty());
    }
}
