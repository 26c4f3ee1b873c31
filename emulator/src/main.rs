mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::process;

use geiger_core::config::GeigerConfig;
use geiger_core::tube::TubeType;

use session::{Board, Session};

const USAGE: &str = "Usage: geiger-emulator [--dead-time <us>] [--tube <sbm20|sbm19|si22g>]";

fn main() -> io::Result<()> {
    let config = parse_config(env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });

    let board = Board::new();
    let mut session = Session::new(&board, config).unwrap_or_else(|err| {
        eprintln!("invalid configuration: {err}");
        process::exit(2);
    });

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut line = String::new();

    writeln!(
        writer,
        "MultiGeiger emulator ready ({}, dead time {}us). Type `help` for commands or `exit` to quit.",
        config.tube, config.dead_time_us
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(writer, "Session closed.")?;
            break;
        }

        writeln!(writer, "{}", session.handle_line(trimmed))?;
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn parse_config(args: impl IntoIterator<Item = String>) -> Result<GeigerConfig, String> {
    let mut config = GeigerConfig::DEFAULT;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg, None),
        };
        let mut value = || {
            inline
                .clone()
                .or_else(|| args.next())
                .ok_or_else(|| format!("Expected value after {flag}"))
        };

        match flag.as_str() {
            "--dead-time" => {
                let raw = value()?;
                config.dead_time_us = raw
                    .parse()
                    .map_err(|_| format!("Invalid dead time `{raw}`"))?;
            }
            "--tube" => {
                let raw = value()?;
                config.tube =
                    TubeType::from_keyword(&raw).ok_or_else(|| format!("Unknown tube `{raw}`"))?;
            }
            other => return Err(format!("Unknown argument `{other}`")),
        }
    }

    Ok(config)
}
