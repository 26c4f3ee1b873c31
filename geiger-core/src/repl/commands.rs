//! Console command dispatcher.
//!
//! [`CommandExecutor`] parses a line and runs it against a [`ConsoleTarget`].
//! The pulse counter, HV status and sound requests are reached through the
//! target's accessors; simulation-only commands are forwarded to target
//! hooks that default to [`CommandError::Unsupported`].

use core::fmt;
use core::time::Duration;

use crate::config::TickOptions;
use crate::hv::{HvReading, HvShared};
use crate::pulse::{PulseCounter, PulseDrain};
use crate::sound::{Sequence, SoundRequests, melodies};

use super::catalog::{self, CommandSpec};
use super::grammar::{self, CapBehaviour, Command, GrammarError, Melody, Pitch};
use super::status::{StatusFormatter, StatusSnapshot, on_off, write_duration};

/// Spacing used by `pulse` when none is given.
pub const DEFAULT_PULSE_SPACING: Duration = Duration::from_millis(1);

/// Result of a simulation command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationReport {
    /// Simulated time after the command.
    pub now: Duration,
    /// Edges delivered to the pulse counter.
    pub edges: u32,
    /// Edges the counter accepted.
    pub accepted: u32,
    /// Charge pulses emitted by the HV controller meanwhile.
    pub charge_pulses: u32,
}

/// Hardware or simulation the console drives.
pub trait ConsoleTarget {
    fn pulses(&self) -> &PulseCounter;
    fn hv(&self) -> &HvShared;
    fn sound(&self) -> &SoundRequests;

    /// Drains the pulse counter for `drain`. Targets that also report rates
    /// override this so the drained pulses still reach their rate window.
    fn drain(&mut self) -> PulseDrain {
        self.pulses().drain()
    }

    /// Live state for `status`. Must not drain the pulse counter.
    fn status(&mut self) -> StatusSnapshot;

    /// Injects `count` edges `spacing` apart.
    fn inject_pulses(
        &mut self,
        _count: u32,
        _spacing: Duration,
    ) -> Result<SimulationReport, CommandError> {
        Err(CommandError::Unsupported("pulse"))
    }

    /// Advances simulated time.
    fn advance(&mut self, _duration: Duration) -> Result<SimulationReport, CommandError> {
        Err(CommandError::Unsupported("run"))
    }

    fn set_capacitor(&mut self, _behaviour: CapBehaviour) -> Result<(), CommandError> {
        Err(CommandError::Unsupported("cap"))
    }
}

/// Command execution successes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CommandOutcome {
    Status(StatusSnapshot),
    Drained(PulseDrain),
    Hv(HvReading),
    Playing(Melody),
    Ticked { pitch: Pitch, queued: bool },
    TickOptions(TickOptions),
    Simulated(SimulationReport),
    Capacitor(CapBehaviour),
    HelpIndex,
    Help(&'static CommandSpec),
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Status(snapshot) => {
                fmt::Display::fmt(&StatusFormatter::new(snapshot), f)
            }
            CommandOutcome::Drained(drain) => write!(
                f,
                "drain count={} last={}ms interval={}us",
                drain.count, drain.last_timestamp_ms, drain.last_interval_us
            ),
            CommandOutcome::Hv(reading) => write!(
                f,
                "hv pulses={} error={}",
                reading.cumulative_pulses,
                if reading.error { "yes" } else { "no" }
            ),
            CommandOutcome::Playing(melody) => write!(f, "playing {}", melody.name()),
            CommandOutcome::Ticked { pitch, queued } => {
                let pitch = if pitch.is_high() { "high" } else { "low" };
                if *queued {
                    write!(f, "tick {pitch} queued")
                } else {
                    write!(f, "tick {pitch} dropped (ticks off)")
                }
            }
            CommandOutcome::TickOptions(options) => write!(
                f,
                "ticks speaker={} led={}",
                on_off(options.speaker),
                on_off(options.led)
            ),
            CommandOutcome::Simulated(report) => {
                f.write_str("t=")?;
                write_duration(f, report.now)?;
                write!(
                    f,
                    " edges={} accepted={} charge-pulses={}",
                    report.edges, report.accepted, report.charge_pulses
                )
            }
            CommandOutcome::Capacitor(CapBehaviour::FullAfter(pulses)) => {
                write!(f, "capacitor full after {pulses} pulses")
            }
            CommandOutcome::Capacitor(CapBehaviour::Never) => {
                f.write_str("capacitor never full")
            }
            CommandOutcome::HelpIndex => {
                for (index, spec) in catalog::COMMANDS.iter().enumerate() {
                    if index > 0 {
                        f.write_str("\n")?;
                    }
                    write!(f, "{:<26}{}", spec.usage, spec.summary)?;
                }
                Ok(())
            }
            CommandOutcome::Help(spec) => {
                write!(f, "{}\n  {}", spec.usage, spec.summary)?;
                if spec.simulation {
                    f.write_str(" (emulator only)")?;
                }
                Ok(())
            }
        }
    }
}

/// Errors surfaced while executing a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandError {
    Syntax(GrammarError),
    /// The target cannot run the named command.
    Unsupported(&'static str),
    UnknownTopic,
}

impl From<GrammarError> for CommandError {
    fn from(error: GrammarError) -> Self {
        Self::Syntax(error)
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Syntax(error) => write!(f, "error: {error}"),
            CommandError::Unsupported(command) => {
                write!(f, "error: `{command}` is not supported here")
            }
            CommandError::UnknownTopic => f.write_str("error: no such command, try `help`"),
        }
    }
}

/// Parses console lines and runs them against a target.
pub struct CommandExecutor<T> {
    target: T,
}

impl<T> CommandExecutor<T> {
    pub const fn new(target: T) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &T {
        &self.target
    }
}

impl<T: ConsoleTarget> CommandExecutor<T> {
    /// Parses and executes one console line.
    pub fn execute(&mut self, line: &str) -> Result<CommandOutcome, CommandError> {
        let command = grammar::parse(line)?;
        self.dispatch(command)
    }

    fn dispatch(&mut self, command: Command<'_>) -> Result<CommandOutcome, CommandError> {
        let target = &mut self.target;
        match command {
            Command::Status => Ok(CommandOutcome::Status(target.status())),
            Command::Drain => Ok(CommandOutcome::Drained(target.drain())),
            Command::Hv => Ok(CommandOutcome::Hv(target.hv().read())),
            Command::Play(melody) => {
                target.sound().play(melody_sequence(melody));
                Ok(CommandOutcome::Playing(melody))
            }
            Command::Tick(pitch) => {
                let queued = target.sound().tick(pitch.is_high());
                Ok(CommandOutcome::Ticked { pitch, queued })
            }
            Command::Ticks(speaker) => Ok(CommandOutcome::TickOptions(
                update_tick_options(target.sound(), |options| options.speaker = speaker),
            )),
            Command::Led(led) => Ok(CommandOutcome::TickOptions(update_tick_options(
                target.sound(),
                |options| options.led = led,
            ))),
            Command::Pulse { count, spacing } => target
                .inject_pulses(count, spacing.unwrap_or(DEFAULT_PULSE_SPACING))
                .map(CommandOutcome::Simulated),
            Command::Run(duration) => target.advance(duration).map(CommandOutcome::Simulated),
            Command::Cap(behaviour) => target
                .set_capacitor(behaviour)
                .map(|()| CommandOutcome::Capacitor(behaviour)),
            Command::Help(None) => Ok(CommandOutcome::HelpIndex),
            Command::Help(Some(topic)) => catalog::find(topic)
                .map(CommandOutcome::Help)
                .ok_or(CommandError::UnknownTopic),
        }
    }
}

/// Sequence played by `play <melody>`.
pub fn melody_sequence(melody: Melody) -> Sequence {
    match melody {
        Melody::Start => &melodies::START,
        Melody::Alarm => &melodies::ALARM,
    }
}

fn update_tick_options(
    sound: &SoundRequests,
    update: impl FnOnce(&mut TickOptions),
) -> TickOptions {
    let mut options = sound.tick_options();
    update(&mut options);
    sound.set_tick_options(options);
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::periodic::TickPeriod;
    use crate::pulse::EdgeTimestamp;
    use crate::tube::TubeType;

    struct Board {
        pulses: PulseCounter,
        hv: HvShared,
        sound: SoundRequests,
        forwarded: u32,
    }

    impl Board {
        fn new() -> Self {
            Self {
                pulses: PulseCounter::new(),
                hv: HvShared::new(),
                sound: SoundRequests::new(),
                forwarded: 0,
            }
        }
    }

    impl ConsoleTarget for Board {
        fn pulses(&self) -> &PulseCounter {
            &self.pulses
        }

        fn hv(&self) -> &HvShared {
            &self.hv
        }

        fn sound(&self) -> &SoundRequests {
            &self.sound
        }

        fn drain(&mut self) -> PulseDrain {
            let drained = self.pulses.drain();
            self.forwarded += drained.count;
            drained
        }

        fn status(&mut self) -> StatusSnapshot {
            StatusSnapshot {
                uptime: Duration::ZERO,
                dead_time_us: self.pulses.dead_time_us(),
                rejected_edges: self.pulses.rejected_edges(),
                tube: TubeType::Sbm20,
                rate: None,
                total_counts: 0,
                total_ms: 0,
                hv: self.hv.snapshot(),
                hv_period: TickPeriod::from_micros(100),
                ticks: self.sound.tick_options(),
            }
        }
    }

    #[test]
    fn drain_reports_and_resets_count() {
        let mut executor = CommandExecutor::new(Board::new());
        executor.target().pulses.on_edge(EdgeTimestamp::new(0, 0));
        executor.target().pulses.on_edge(EdgeTimestamp::new(500, 0));

        let outcome = executor.execute("drain").unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Drained(PulseDrain {
                count: 2,
                last_timestamp_ms: 0,
                last_interval_us: 500
            })
        );

        let outcome = executor.execute("drain").unwrap();
        assert!(matches!(outcome, CommandOutcome::Drained(drain) if drain.count == 0));
    }

    #[test]
    fn drain_goes_through_the_target_hook() {
        let mut executor = CommandExecutor::new(Board::new());
        for k in 0..60 {
            executor.target().pulses.on_edge(EdgeTimestamp::new(k * 1_000, 0));
        }

        executor.execute("drain").unwrap();
        executor.execute("drain").unwrap();
        assert_eq!(executor.target().forwarded, 60);
        assert_eq!(executor.target().pulses.drain().count, 0);
    }

    #[test]
    fn ticks_and_led_update_options_independently() {
        let mut executor = CommandExecutor::new(Board::new());
        executor.execute("ticks off").unwrap();
        let outcome = executor.execute("led off").unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::TickOptions(TickOptions {
                speaker: false,
                led: false
            })
        );

        let outcome = executor.execute("tick").unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Ticked {
                pitch: Pitch::High,
                queued: false
            }
        );
    }

    #[test]
    fn simulation_commands_are_unsupported_by_default() {
        let mut executor = CommandExecutor::new(Board::new());
        assert_eq!(
            executor.execute("pulse 10"),
            Err(CommandError::Unsupported("pulse"))
        );
        assert_eq!(
            executor.execute("run 1s"),
            Err(CommandError::Unsupported("run"))
        );
        assert_eq!(
            executor.execute("cap never"),
            Err(CommandError::Unsupported("cap"))
        );
    }

    #[test]
    fn syntax_errors_carry_position() {
        let mut executor = CommandExecutor::new(Board::new());
        let error = executor.execute("play softly").unwrap_err();
        assert_eq!(
            error,
            CommandError::Syntax(GrammarError {
                offset: 5,
                label: "start|alarm"
            })
        );

        let mut text = heapless::String::<64>::new();
        core::fmt::Write::write_fmt(&mut text, format_args!("{error}")).unwrap();
        assert_eq!(text.as_str(), "error: expected start|alarm at column 6");
    }

    #[test]
    fn help_renders_usage() {
        let mut executor = CommandExecutor::new(Board::new());
        let outcome = executor.execute("help run").unwrap();

        let mut text = heapless::String::<128>::new();
        core::fmt::Write::write_fmt(&mut text, format_args!("{outcome}")).unwrap();
        assert_eq!(
            text.as_str(),
            "run <duration>\n  advance simulated time (emulator only)"
        );
        assert_eq!(
            executor.execute("help reboot"),
            Err(CommandError::UnknownTopic)
        );
    }
}
