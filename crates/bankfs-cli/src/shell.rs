//! Line-oriented command shell over a [`BankFs`].
//!
//! Each input line is one command, parsed with clap in multicall mode so the
//! first word picks the subcommand. Engine errors are reported on the output
//! and the shell keeps going; only output failures end the session.

use std::io::Write;

use anyhow::Result;
use bankfs_kernel::{BankFs, FileType, VfsError, VfsOps};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

#[derive(Parser, Debug)]
#[command(multicall = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

/// Shell commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List a directory, newest entries first
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Show attributes of a file or directory
    Stat {
        /// Print attributes as JSON
        #[arg(long)]
        json: bool,
        path: String,
    },
    /// Create a directory
    Mkdir { path: String },
    /// Create an empty file
    Touch { path: String },
    /// Write text at a byte offset (`\n` and `\t` are unescaped)
    Write {
        path: String,
        offset: u64,
        #[arg(default_value = "", allow_hyphen_values = true)]
        text: String,
    },
    /// Append text at the end of a file
    Append {
        path: String,
        #[arg(default_value = "", allow_hyphen_values = true)]
        text: String,
    },
    /// Print file contents
    Cat {
        path: String,
        offset: Option<u64>,
        length: Option<usize>,
    },
    /// Remove a file or a directory with everything in it
    Rm { path: String },
    /// Move or rename
    Mv { from: String, to: String },
    /// Set a file's size, zero-filling when it grows
    Truncate { path: String, size: u64 },
    /// Show pool usage
    Df,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

/// Whether the shell should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Parse one input line. `Ok(None)` for blank lines and comments.
///
/// `write` and `append` take their text verbatim from the rest of the line,
/// so repeated spaces and tabs in it are kept.
pub fn parse(line: &str) -> Result<Option<Command>, clap::Error> {
    let line = line.trim_start();
    if line.trim_end().is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let args = match line.split_whitespace().next() {
        Some("write") => with_payload(line, 3),
        Some("append") => with_payload(line, 2),
        _ => line.split_whitespace().collect(),
    };
    Line::try_parse_from(args).map(|l| Some(l.command))
}

/// The first `count` whitespace-separated fields, then the raw remainder as
/// one more argument if there is any.
fn with_payload(line: &str, count: usize) -> Vec<&str> {
    let mut fields = Vec::with_capacity(count + 1);
    let mut rest = line;
    while fields.len() < count {
        let field = rest.trim_start();
        if field.is_empty() {
            return fields;
        }
        let end = field.find(char::is_whitespace).unwrap_or(field.len());
        fields.push(&field[..end]);
        rest = &field[end..];
    }
    // A single separator belongs to the syntax, the rest is payload.
    let mut chars = rest.chars();
    if chars.next().is_some_and(char::is_whitespace) && !chars.as_str().is_empty() {
        fields.push(chars.as_str());
    }
    fields
}

/// Read commands from `input` until it ends or a `quit`.
pub async fn run<R, W>(fs: &BankFs, input: R, out: &mut W, prompt: bool) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        if prompt {
            write!(out, "bankfs> ")?;
            out.flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse(&line) {
            Ok(Some(command)) => {
                if execute(fs, command, out).await? == Flow::Quit {
                    break;
                }
            }
            Ok(None) => {}
            // clap renders usage and help through its error type.
            Err(e) => write!(out, "{}", e.render())?,
        }
        out.flush()?;
    }
    Ok(())
}

/// Run one command, writing its output (or its engine error) to `out`.
pub async fn execute<W: Write>(fs: &BankFs, command: Command, out: &mut W) -> Result<Flow> {
    tracing::debug!(?command, "executing");
    if let Command::Quit = command {
        return Ok(Flow::Quit);
    }
    if let Err(e) = dispatch(fs, command, out).await? {
        writeln!(out, "error: {e}")?;
    }
    Ok(Flow::Continue)
}

/// Outer result is output failure, inner is the engine's answer.
async fn dispatch<W: Write>(
    fs: &BankFs,
    command: Command,
    out: &mut W,
) -> Result<Result<(), VfsError>> {
    let outcome = match command {
        Command::Ls { path } => match fs.list_directory(&path).await {
            Ok(entries) => {
                for entry in entries {
                    let child = join(&path, &entry.name);
                    let size = fs.get_attributes(&child).await.map_or(0, |a| a.size);
                    writeln!(out, "{:<4} {:>12} {}", entry.kind, size, entry.name)?;
                }
                Ok(())
            }
            Err(e) => Err(e),
        },
        Command::Stat { json, path } => match fs.get_attributes(&path).await {
            Ok(attr) if json => {
                writeln!(out, "{}", serde_json::to_string_pretty(&attr)?)?;
                Ok(())
            }
            Ok(attr) => {
                let mtime = attr
                    .mtime
                    .duration_since(std::time::UNIX_EPOCH)
                    .map_or(0, |d| d.as_secs());
                writeln!(
                    out,
                    "{path}: {} size={} chunks={} mtime={mtime}",
                    attr.kind, attr.size, attr.chunks
                )?;
                Ok(())
            }
            Err(e) => Err(e),
        },
        Command::Mkdir { path } => fs.create_entry(&path, FileType::Directory).await.map(drop),
        Command::Touch { path } => fs.create_entry(&path, FileType::File).await.map(drop),
        Command::Write { path, offset, text } => {
            let data = unescape(&text);
            report_write(out, fs.write_bytes(&path, offset, data.as_bytes()).await, data.len())?
        }
        Command::Append { path, text } => {
            let data = unescape(&text);
            let written = match fs.get_attributes(&path).await {
                Ok(attr) => fs.write_bytes(&path, attr.size, data.as_bytes()).await,
                Err(e) => Err(e),
            };
            report_write(out, written, data.len())?
        }
        Command::Cat {
            path,
            offset,
            length,
        } => {
            let offset = offset.unwrap_or(0);
            let data = match length {
                Some(len) => fs.read_bytes(&path, offset, len).await,
                None => match fs.get_attributes(&path).await {
                    Ok(attr) => {
                        let len = attr.size.saturating_sub(offset) as usize;
                        fs.read_bytes(&path, offset, len).await
                    }
                    Err(e) => Err(e),
                },
            };
            match data {
                Ok(bytes) => {
                    out.write_all(&bytes)?;
                    if !bytes.ends_with(b"\n") && !bytes.is_empty() {
                        writeln!(out)?;
                    }
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
        Command::Rm { path } => fs.remove_entry(&path).await,
        Command::Mv { from, to } => fs.rename_entry(&from, &to).await,
        Command::Truncate { path, size } => fs.truncate(&path, size).await,
        Command::Df => match fs.statfs().await {
            Ok(stat) => {
                let used = stat.blocks - stat.bfree;
                writeln!(
                    out,
                    "chunks: {used} used / {} total ({} free), chunk size {} B, bank size {} B, nodes {}",
                    stat.blocks, stat.bfree, stat.bsize, stat.bank_size, stat.files
                )?;
                Ok(())
            }
            Err(e) => Err(e),
        },
        Command::Quit => Ok(()),
    };
    Ok(outcome)
}

fn report_write<W: Write>(
    out: &mut W,
    result: Result<usize, VfsError>,
    requested: usize,
) -> Result<Result<(), VfsError>> {
    match result {
        Ok(n) if n < requested => {
            writeln!(out, "wrote {n} of {requested} bytes (out of space)")?;
            Ok(Ok(()))
        }
        Ok(n) => {
            writeln!(out, "wrote {n} bytes")?;
            Ok(Ok(()))
        }
        Err(e) => Ok(Err(e)),
    }
}

fn join(dir: &str, name: &str) -> String {
    format!("{}/{name}", dir.trim_end_matches('/'))
}

/// Expand `\n`, `\t` and `\\`; other backslashes stay literal.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankfs_kernel::StorageLayout;

    fn bankfs() -> BankFs {
        BankFs::new(StorageLayout::new(16 * 1024, 4 * 1024, 1024).unwrap())
    }

    async fn exec(fs: &BankFs, line: &str) -> String {
        let mut out = Vec::new();
        let command = parse(line).unwrap().unwrap();
        execute(fs, command, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse("ls").unwrap(),
            Some(Command::Ls { path: "/".into() })
        );
        assert_eq!(
            parse("  stat --json /a ").unwrap(),
            Some(Command::Stat {
                json: true,
                path: "/a".into()
            })
        );
        assert_eq!(
            parse("write /f 10 hello  world").unwrap(),
            Some(Command::Write {
                path: "/f".into(),
                offset: 10,
                text: "hello  world".into(),
            })
        );
        assert_eq!(
            parse("cat /f 2").unwrap(),
            Some(Command::Cat {
                path: "/f".into(),
                offset: Some(2),
                length: None
            })
        );
        assert_eq!(parse("exit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_parse_blank_and_comment() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("   ").unwrap(), None);
        assert_eq!(parse("# note").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("frobnicate /x").is_err());
        assert!(parse("write /f notanumber text").is_err());
        assert!(parse("mv /only-one").is_err());
    }

    #[test]
    fn test_parse_keeps_payload_whitespace() {
        assert_eq!(
            parse("write /f 0 a  b\tc ").unwrap(),
            Some(Command::Write {
                path: "/f".into(),
                offset: 0,
                text: "a  b\tc ".into(),
            })
        );
        assert_eq!(
            parse("append   /f  -x").unwrap(),
            Some(Command::Append {
                path: "/f".into(),
                text: " -x".into(),
            })
        );
        assert_eq!(
            parse("write /f 3").unwrap(),
            Some(Command::Write {
                path: "/f".into(),
                offset: 3,
                text: String::new(),
            })
        );
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"Hello World!\n"), "Hello World!\n");
        assert_eq!(unescape(r"a\tb\\c\q"), "a\tb\\c\\q");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }

    #[tokio::test]
    async fn test_write_and_cat() {
        let fs = bankfs();
        exec(&fs, "touch /f").await;
        assert_eq!(exec(&fs, r"write /f 0 hello\n").await, "wrote 6 bytes\n");
        assert_eq!(exec(&fs, "append /f more").await, "wrote 4 bytes\n");
        assert_eq!(exec(&fs, "cat /f").await, "hello\nmore\n");
        assert_eq!(exec(&fs, "cat /f 1 3").await, "ell\n");
    }

    #[tokio::test]
    async fn test_write_stores_spaces_and_tabs_verbatim() {
        let fs = bankfs();
        exec(&fs, "touch /f").await;
        assert_eq!(exec(&fs, "write /f 0 a  b\tc").await, "wrote 6 bytes\n");
        assert_eq!(fs.read_all("/f").await.unwrap(), b"a  b\tc");

        exec(&fs, "append /f   d").await;
        assert_eq!(fs.read_all("/f").await.unwrap(), b"a  b\tc  d");
    }

    #[tokio::test]
    async fn test_errors_are_reported_not_fatal() {
        let fs = bankfs();
        assert_eq!(exec(&fs, "cat /missing").await, "error: not found: /missing\n");
        exec(&fs, "touch /f").await;
        let out = exec(&fs, "write /f 5 x").await;
        assert!(out.starts_with("error: invalid offset"), "{out}");
    }

    #[tokio::test]
    async fn test_ls_mv_rm() {
        let fs = bankfs();
        exec(&fs, "mkdir /a").await;
        exec(&fs, "touch /a/one").await;
        exec(&fs, "write /a/one 0 abc").await;
        exec(&fs, "mkdir /b").await;

        let listing = exec(&fs, "ls /a").await;
        assert!(listing.contains("one"));
        assert!(listing.contains(" 3 "));

        exec(&fs, "mv /a/one /b/two").await;
        assert_eq!(exec(&fs, "ls /a").await, "");
        assert_eq!(exec(&fs, "cat /b/two").await, "abc\n");

        exec(&fs, "rm /b").await;
        assert!(exec(&fs, "ls /b").await.starts_with("error: not found"));
    }

    #[tokio::test]
    async fn test_partial_write_reported() {
        let fs = bankfs();
        exec(&fs, "touch /big").await;
        let text = "x".repeat(17 * 1024);
        let out = exec(&fs, &format!("write /big 0 {text}")).await;
        assert_eq!(out, "wrote 16384 of 17408 bytes (out of space)\n");
        assert!(exec(&fs, "df").await.starts_with("chunks: 16 used / 16 total (0 free)"));
    }

    #[tokio::test]
    async fn test_stat_json() {
        let fs = bankfs();
        exec(&fs, "touch /f").await;
        exec(&fs, "truncate /f 1500").await;
        let out = exec(&fs, "stat --json /f").await;
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["kind"], "file");
        assert_eq!(value["size"], 1500);
        assert_eq!(value["chunks"], 2);
    }

    #[tokio::test]
    async fn test_run_script_stops_at_quit() {
        let fs = bankfs();
        let script = b"mkdir /d\n# comment\n\ntouch /d/f\nquit\ntouch /after\n";
        let mut out = Vec::new();
        run(&fs, &script[..], &mut out, false).await.unwrap();

        assert!(fs.exists("/d/f").await);
        assert!(!fs.exists("/after").await);
    }
}
