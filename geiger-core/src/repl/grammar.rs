//! Console line parser.
//!
//! Tokens (words, integers, durations, keywords) are recognised with `winnow`
//! parsers over `&str`. The command shape is driven by the [`catalog`] entry
//! for the leading keyword. Errors report the byte offset where parsing
//! stopped and a label for what was expected there.

use core::fmt;
use core::time::Duration;

use winnow::ascii::{Caseless, dec_uint, space0, space1};
use winnow::combinator::{alt, eof, preceded};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take_while;

use super::catalog::{self, CommandTag};

/// Parsed console command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Status,
    Drain,
    Hv,
    Play(Melody),
    Tick(Pitch),
    Ticks(bool),
    Led(bool),
    Pulse {
        count: u32,
        spacing: Option<Duration>,
    },
    Run(Duration),
    Cap(CapBehaviour),
    Help(Option<&'a str>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Melody {
    Start,
    Alarm,
}

impl Melody {
    pub const fn name(self) -> &'static str {
        match self {
            Melody::Start => "start",
            Melody::Alarm => "alarm",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pitch {
    High,
    Low,
}

impl Pitch {
    pub const fn is_high(self) -> bool {
        matches!(self, Pitch::High)
    }
}

/// Simulated capacitor behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapBehaviour {
    /// Reports full on the given pulse of every burst.
    FullAfter(u32),
    /// Never reports full; every burst fails.
    Never,
}

/// Parse failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrammarError {
    /// Byte offset into the line.
    pub offset: usize,
    pub label: &'static str,
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {} at column {}", self.label, self.offset + 1)
    }
}

/// Parses one console line. Trailing `\r`/`\n` is ignored.
pub fn parse(line: &str) -> Result<Command<'_>, GrammarError> {
    let mut cursor = Cursor::new(line.trim_end_matches(['\r', '\n']));
    cursor.skip_space();

    let start = cursor.offset();
    let name = cursor.expect(word, "command")?;
    let Some(spec) = catalog::find(name) else {
        return Err(GrammarError {
            offset: start,
            label: "command",
        });
    };

    let command = match spec.tag {
        CommandTag::Status => Command::Status,
        CommandTag::Drain => Command::Drain,
        CommandTag::Hv => Command::Hv,
        CommandTag::Play => Command::Play(cursor.argument(melody, "start|alarm")?),
        CommandTag::Tick => Command::Tick(cursor.optional_argument(pitch).unwrap_or(Pitch::High)),
        CommandTag::Ticks => Command::Ticks(cursor.argument(on_off, "on|off")?),
        CommandTag::Led => Command::Led(cursor.argument(on_off, "on|off")?),
        CommandTag::Pulse => {
            let count = cursor.argument(dec_uint::<_, u32, _>, "pulse count")?;
            let spacing = cursor.optional_argument(duration);
            Command::Pulse { count, spacing }
        }
        CommandTag::Run => Command::Run(cursor.argument(duration, "duration")?),
        CommandTag::Cap => Command::Cap(cursor.argument(cap_behaviour, "pulse count or never")?),
        CommandTag::Help => Command::Help(cursor.optional_argument(word)),
    };

    cursor.finish()?;
    Ok(command)
}

struct Cursor<'a> {
    line: &'a str,
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(line: &'a str) -> Self {
        Self { line, rest: line }
    }

    fn offset(&self) -> usize {
        self.line.len() - self.rest.len()
    }

    fn skip_space(&mut self) {
        let _: ModalResult<&str> = space0.parse_next(&mut self.rest);
    }

    fn expect<O, P>(&mut self, mut parser: P, label: &'static str) -> Result<O, GrammarError>
    where
        P: Parser<&'a str, O, ErrMode<ContextError>>,
    {
        let checkpoint = self.rest;
        parser.parse_next(&mut self.rest).map_err(|_| {
            self.rest = checkpoint;
            GrammarError {
                offset: self.offset(),
                label,
            }
        })
    }

    /// Whitespace followed by `parser`.
    fn argument<O, P>(&mut self, parser: P, label: &'static str) -> Result<O, GrammarError>
    where
        P: Parser<&'a str, O, ErrMode<ContextError>>,
    {
        self.expect(space1, label)?;
        self.expect(parser, label)
    }

    fn optional_argument<O, P>(&mut self, parser: P) -> Option<O>
    where
        P: Parser<&'a str, O, ErrMode<ContextError>>,
    {
        let checkpoint = self.rest;
        let parsed = self.expect(preceded(space1, parser), "argument").ok();
        if parsed.is_none() {
            self.rest = checkpoint;
        }
        parsed
    }

    fn finish(mut self) -> Result<(), GrammarError> {
        self.skip_space();
        self.expect(eof, "end of line").map(|_| ())
    }
}

fn word<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        .parse_next(input)
}

fn on_off(input: &mut &str) -> ModalResult<bool> {
    alt((Caseless("on").value(true), Caseless("off").value(false))).parse_next(input)
}

fn melody(input: &mut &str) -> ModalResult<Melody> {
    alt((
        Caseless("start").value(Melody::Start),
        Caseless("alarm").value(Melody::Alarm),
    ))
    .parse_next(input)
}

fn pitch(input: &mut &str) -> ModalResult<Pitch> {
    alt((
        Caseless("high").value(Pitch::High),
        Caseless("low").value(Pitch::Low),
    ))
    .parse_next(input)
}

fn cap_behaviour(input: &mut &str) -> ModalResult<CapBehaviour> {
    alt((
        Caseless("never").value(CapBehaviour::Never),
        dec_uint::<_, u32, _>
            .verify(|pulses: &u32| *pulses > 0)
            .map(CapBehaviour::FullAfter),
    ))
    .parse_next(input)
}

#[derive(Clone, Copy)]
enum Unit {
    Micros,
    Millis,
    Secs,
}

/// `<int>us`, `<int>ms` or `<int>s`.
fn duration(input: &mut &str) -> ModalResult<Duration> {
    let value = dec_uint::<_, u64, _>.parse_next(input)?;
    let unit = alt((
        Caseless("us").value(Unit::Micros),
        Caseless("ms").value(Unit::Millis),
        Caseless("s").value(Unit::Secs),
    ))
    .parse_next(input)?;

    Ok(match unit {
        Unit::Micros => Duration::from_micros(value),
        Unit::Millis => Duration::from_millis(value),
        Unit::Secs => Duration::from_secs(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_commands_case_insensitively() {
        assert_eq!(parse("status"), Ok(Command::Status));
        assert_eq!(parse("  DRAIN \r\n"), Ok(Command::Drain));
        assert_eq!(parse("Hv"), Ok(Command::Hv));
    }

    #[test]
    fn tick_defaults_to_high_pitch() {
        assert_eq!(parse("tick"), Ok(Command::Tick(Pitch::High)));
        assert_eq!(parse("tick low"), Ok(Command::Tick(Pitch::Low)));
        assert_eq!(parse("tick "), Ok(Command::Tick(Pitch::High)));
    }

    #[test]
    fn ticks_is_not_confused_with_tick() {
        assert_eq!(parse("ticks off"), Ok(Command::Ticks(false)));
        assert_eq!(parse("led ON"), Ok(Command::Led(true)));
    }

    #[test]
    fn parses_durations_in_all_units() {
        assert_eq!(
            parse("run 250us"),
            Ok(Command::Run(Duration::from_micros(250)))
        );
        assert_eq!(parse("run 15ms"), Ok(Command::Run(Duration::from_millis(15))));
        assert_eq!(parse("run 2s"), Ok(Command::Run(Duration::from_secs(2))));
    }

    #[test]
    fn pulse_spacing_is_optional() {
        assert_eq!(
            parse("pulse 60"),
            Ok(Command::Pulse {
                count: 60,
                spacing: None
            })
        );
        assert_eq!(
            parse("pulse 3 300us"),
            Ok(Command::Pulse {
                count: 3,
                spacing: Some(Duration::from_micros(300))
            })
        );
    }

    #[test]
    fn cap_accepts_count_or_never() {
        assert_eq!(parse("cap 2"), Ok(Command::Cap(CapBehaviour::FullAfter(2))));
        assert_eq!(parse("cap never"), Ok(Command::Cap(CapBehaviour::Never)));
        assert_eq!(
            parse("cap 0"),
            Err(GrammarError {
                offset: 4,
                label: "pulse count or never"
            })
        );
    }

    #[test]
    fn help_topic_is_optional() {
        assert_eq!(parse("help"), Ok(Command::Help(None)));
        assert_eq!(parse("help pulse"), Ok(Command::Help(Some("pulse"))));
    }

    #[test]
    fn unknown_command_reports_its_offset() {
        assert_eq!(
            parse("  reboot now"),
            Err(GrammarError {
                offset: 2,
                label: "command"
            })
        );
        assert_eq!(
            parse(""),
            Err(GrammarError {
                offset: 0,
                label: "command"
            })
        );
    }

    #[test]
    fn bad_argument_reports_expected_label() {
        assert_eq!(
            parse("play loud"),
            Err(GrammarError {
                offset: 5,
                label: "start|alarm"
            })
        );
        assert_eq!(
            parse("play"),
            Err(GrammarError {
                offset: 4,
                label: "start|alarm"
            })
        );
        assert_eq!(
            parse("run 10"),
            Err(GrammarError {
                offset: 4,
                label: "duration"
            })
        );
    }

    #[test]
    fn trailing_input_is_rejected() {
        assert_eq!(
            parse("status now"),
            Err(GrammarError {
                offset: 7,
                label: "end of line"
            })
        );
    }
}
