//! Render command: JSON lines to readable stream output

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::io::{SeekFrom, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncSeekExt, BufReader};
use trafficlog::{Formatter, PhaseRecord, StreamFormatter};

/// How long to wait for a followed file to grow.
const FOLLOW_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// JSON lines log to read (default: stdin)
    pub file: Option<PathBuf>,

    /// Colorize output
    #[arg(short, long)]
    pub color: bool,

    /// Re-indent JSON bodies
    #[arg(short, long)]
    pub pretty: bool,

    /// Keep reading as the file grows
    #[arg(short, long, requires = "file")]
    pub follow: bool,
}

/// Lines seen while rendering.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    pub rendered: usize,
    pub skipped: usize,
}

pub async fn render(args: RenderArgs) -> Result<()> {
    let formatter = StreamFormatter::new()
        .color(args.color)
        .pretty_print(args.pretty);
    let stdout = std::io::stdout();

    let stats = match &args.file {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            if args.follow {
                follow(file, &formatter, &mut stdout.lock()).await?
            } else {
                render_lines(BufReader::new(file), &formatter, &mut stdout.lock()).await?
            }
        }
        None => {
            render_lines(BufReader::new(tokio::io::stdin()), &formatter, &mut stdout.lock())
                .await?
        }
    };

    tracing::debug!(rendered = stats.rendered, skipped = stats.skipped, "render finished");
    Ok(())
}

/// Render every line of `reader` until end of input.
pub async fn render_lines<R, W>(
    mut reader: R,
    formatter: &StreamFormatter,
    out: &mut W,
) -> Result<RenderStats>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut stats = RenderStats::default();
    let mut line = String::new();
    let mut number = 0usize;

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }
        number += 1;
        render_line(&line, number, formatter, out, &mut stats)?;
    }

    Ok(stats)
}

/// Render `file` and keep polling it for appended lines.
///
/// A file that shrinks is assumed to have been truncated and is read again
/// from the start.
async fn follow<W: Write>(
    file: tokio::fs::File,
    formatter: &StreamFormatter,
    out: &mut W,
) -> Result<RenderStats> {
    let mut reader = BufReader::new(file);
    let mut stats = RenderStats::default();
    let mut pending = String::new();
    let mut number = 0usize;

    loop {
        let read = reader.read_line(&mut pending).await?;
        if read > 0 && pending.ends_with('\n') {
            number += 1;
            render_line(&pending, number, formatter, out, &mut stats)?;
            pending.clear();
            continue;
        }

        // At end of input, possibly holding a partial line.
        let position = reader.stream_position().await?;
        let len = reader.get_ref().metadata().await?.len();
        if len < position {
            tracing::info!("log file truncated, reading from the start");
            reader.seek(SeekFrom::Start(0)).await?;
            pending.clear();
        }
        tokio::time::sleep(FOLLOW_INTERVAL).await;
    }
}

fn render_line<W: Write>(
    line: &str,
    number: usize,
    formatter: &StreamFormatter,
    out: &mut W,
    stats: &mut RenderStats,
) -> Result<()> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(());
    }

    match serde_json::from_str::<PhaseRecord>(line) {
        Ok(record) => {
            out.write_all(&formatter.format(&record))?;
            out.flush()?;
            stats.rendered += 1;
        }
        Err(err) => {
            eprintln!(
                "{} line {}: {}",
                style("skipping").yellow(),
                number,
                err
            );
            stats.skipped += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &str = r#"{"timestamp":"2026-10-16T09:41:07.512Z","request_log_id":"3f9a0c1d22e4","event":"request","method":"GET","https":false,"path":"/","http_version":"HTTP/1.1"}"#;
    const RESPONSE: &str = r#"{"timestamp":"2026-10-16T09:41:07.530Z","request_log_id":"3f9a0c1d22e4","event":"response","http_version":"HTTP/1.1","status_code":200,"status_name":"OK","body":"{\"a\":1}"}"#;

    async fn run(input: &str, formatter: &StreamFormatter) -> (String, RenderStats) {
        let mut out = Vec::new();
        let stats = render_lines(input.as_bytes(), formatter, &mut out)
            .await
            .unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    #[tokio::test]
    async fn test_renders_each_record() {
        let input = format!("{}\n{}\n", REQUEST, RESPONSE);
        let (out, stats) = run(&input, &StreamFormatter::new()).await;

        assert_eq!(stats, RenderStats { rendered: 2, skipped: 0 });
        assert_eq!(
            out,
            "@ Fri 16 Oct '26 09:41:07.512 #3f9a0c1d22e4\n\
             GET / HTTP/1.1\n\
             \n\
             @ Fri 16 Oct '26 09:41:07.530 #3f9a0c1d22e4\n\
             HTTP/1.1 200 OK\n\
             \n\
             {\"a\":1}\n\
             \n"
        );
    }

    #[tokio::test]
    async fn test_skips_malformed_and_blank_lines() {
        let input = format!("not json\n\n{}\n{{\"event\":\"request\"}}\n", REQUEST);
        let (out, stats) = run(&input, &StreamFormatter::new()).await;

        assert_eq!(stats, RenderStats { rendered: 1, skipped: 2 });
        assert!(out.contains("GET / HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_last_line_without_newline() {
        let (_, stats) = run(RESPONSE, &StreamFormatter::new()).await;
        assert_eq!(stats.rendered, 1);
    }

    #[tokio::test]
    async fn test_pretty_bodies() {
        let (out, _) = run(RESPONSE, &StreamFormatter::new().pretty_print(true)).await;
        assert!(out.contains("{\n  \"a\": 1\n}"));
    }
}
