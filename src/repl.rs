use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use vigil_core::QueryGateway;
use vigil_llm::ProviderClient;
use vigil_tools::CommandExecutor;

const PROMPT: &str = "vigil> ";

const HELP: &str = "\
commands:
  /status          privilege session status
  /stats           cache, history and session counters (JSON)
  /end-session     end the privilege session early
  /clear-cache     drop all cached answers
  /clear-history   forget the conversation
  /route <text>    explain which provider <text> would go to
  /help            this message
  exit | quit      leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Exit,
    Help,
    Status,
    Stats,
    EndSession,
    ClearCache,
    ClearHistory,
    Route(String),
    Unknown(String),
    Input(String),
    Empty,
}

#[must_use]
pub fn parse_command(line: &str) -> ReplCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ReplCommand::Empty;
    }
    if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
        return ReplCommand::Exit;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return ReplCommand::Input(trimmed.to_owned());
    };
    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(n, a)| (n, a.trim()));
    match name {
        "status" => ReplCommand::Status,
        "stats" => ReplCommand::Stats,
        "end-session" => ReplCommand::EndSession,
        "clear-cache" => ReplCommand::ClearCache,
        "clear-history" => ReplCommand::ClearHistory,
        "help" => ReplCommand::Help,
        "route" if !arg.is_empty() => ReplCommand::Route(arg.to_owned()),
        _ => ReplCommand::Unknown(trimmed.to_owned()),
    }
}

/// Read lines from `input` until EOF or `exit`, answering each on `out`.
///
/// # Errors
///
/// Returns an error only when reading input or writing output fails.
pub async fn run<P, E, R, W>(
    gateway: &QueryGateway<P, E>,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    P: ProviderClient,
    E: CommandExecutor,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    loop {
        out.write_all(PROMPT.as_bytes()).await?;
        out.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let reply = match parse_command(&line) {
            ReplCommand::Exit => break,
            ReplCommand::Empty => continue,
            ReplCommand::Help => HELP.to_owned(),
            ReplCommand::Status => gateway.session_status().to_string(),
            ReplCommand::Stats => serde_json::to_string_pretty(&gateway.stats())?,
            ReplCommand::EndSession => {
                gateway.end_session();
                "privilege session ended".to_owned()
            }
            ReplCommand::ClearCache => {
                gateway.clear_cache();
                "cache cleared".to_owned()
            }
            ReplCommand::ClearHistory => {
                gateway.clear_history();
                "history cleared".to_owned()
            }
            ReplCommand::Route(text) => gateway.decide(&text).to_string(),
            ReplCommand::Unknown(cmd) => format!("unknown command: {cmd} (try /help)"),
            ReplCommand::Input(text) => match gateway.handle(&text).await {
                Ok(reply) => reply.to_string(),
                Err(e) => format!("error: {e}"),
            },
        };
        out.write_all(reply.as_bytes()).await?;
        out.write_all(b"\n").await?;
    }
    out.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use vigil_core::Config;
    use vigil_tools::DryRunExecutor;

    use super::*;
    use crate::echo::EchoProvider;

    #[test]
    fn parse_exit_variants() {
        assert_eq!(parse_command("exit"), ReplCommand::Exit);
        assert_eq!(parse_command("  QUIT "), ReplCommand::Exit);
    }

    #[test]
    fn parse_slash_commands() {
        assert_eq!(parse_command("/status"), ReplCommand::Status);
        assert_eq!(parse_command("/stats"), ReplCommand::Stats);
        assert_eq!(parse_command("/end-session"), ReplCommand::EndSession);
        assert_eq!(parse_command("/clear-cache"), ReplCommand::ClearCache);
        assert_eq!(parse_command("/clear-history"), ReplCommand::ClearHistory);
        assert_eq!(
            parse_command("/route  write a python function "),
            ReplCommand::Route("write a python function".into())
        );
        assert_eq!(parse_command("/route"), ReplCommand::Unknown("/route".into()));
        assert_eq!(parse_command("/nope"), ReplCommand::Unknown("/nope".into()));
    }

    #[test]
    fn parse_plain_input_and_empty() {
        assert_eq!(parse_command("   "), ReplCommand::Empty);
        assert_eq!(
            parse_command(" hello there "),
            ReplCommand::Input("hello there".into())
        );
    }

    #[tokio::test]
    async fn run_session_transcript() {
        let gateway = QueryGateway::new(&Config::default(), EchoProvider, DryRunExecutor).unwrap();
        let input: &[u8] = b"hello\n/route write a python function\nrun rm -rf /tmp/x\nsudo code 60\nrun rm -rf /tmp/x\n/status\nexit\nnever read\n";
        let mut out = Vec::new();
        run(&gateway, tokio::io::BufReader::new(input), &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[gemini] hello"));
        assert!(text.contains("code task (score 2) -> openai"));
        assert!(text.contains("error: command blocked"));
        assert!(text.contains("Privilege mode activated for 1 minutes"));
        assert!(text.contains("[dry-run] shell rm -rf /tmp/x"));
        assert!(text.contains("privilege mode: ACTIVE"));
        assert!(!text.contains("never read"));
    }

    #[tokio::test]
    async fn run_stops_at_eof() {
        let gateway = QueryGateway::new(&Config::default(), EchoProvider, DryRunExecutor).unwrap();
        let input: &[u8] = b"/clear-cache\n";
        let mut out = Vec::new();
        run(&gateway, tokio::io::BufReader::new(input), &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("cache cleared"));
        assert!(text.ends_with(PROMPT));
    }
}
