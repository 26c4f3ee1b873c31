//! Console command table.
//!
//! The parser dispatches on [`CommandTag`] and `help` renders the usage and
//! summary columns, so both stay in sync.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandTag {
    Status,
    Drain,
    Hv,
    Play,
    Tick,
    Ticks,
    Led,
    Pulse,
    Run,
    Cap,
    Help,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub tag: CommandTag,
    pub usage: &'static str,
    pub summary: &'static str,
    /// Only meaningful on a simulated target.
    pub simulation: bool,
}

const fn spec(
    name: &'static str,
    tag: CommandTag,
    usage: &'static str,
    summary: &'static str,
) -> CommandSpec {
    CommandSpec {
        name,
        tag,
        usage,
        summary,
        simulation: false,
    }
}

const fn simulated(
    name: &'static str,
    tag: CommandTag,
    usage: &'static str,
    summary: &'static str,
) -> CommandSpec {
    CommandSpec {
        simulation: true,
        ..spec(name, tag, usage, summary)
    }
}

pub const COMMANDS: &[CommandSpec] = &[
    spec(
        "status",
        CommandTag::Status,
        "status",
        "counter, rate, HV and sound state",
    ),
    spec(
        "drain",
        CommandTag::Drain,
        "drain",
        "read and reset the pulse count",
    ),
    spec(
        "hv",
        CommandTag::Hv,
        "hv",
        "cumulative charge pulses and error flag",
    ),
    spec(
        "play",
        CommandTag::Play,
        "play <start|alarm>",
        "play a melody",
    ),
    spec(
        "tick",
        CommandTag::Tick,
        "tick [high|low]",
        "queue one pulse tick",
    ),
    spec(
        "ticks",
        CommandTag::Ticks,
        "ticks <on|off>",
        "speaker ticks on or off",
    ),
    spec(
        "led",
        CommandTag::Led,
        "led <on|off>",
        "LED ticks on or off",
    ),
    simulated(
        "pulse",
        CommandTag::Pulse,
        "pulse <count> [<spacing>]",
        "inject tube pulses, 1ms apart by default",
    ),
    simulated(
        "run",
        CommandTag::Run,
        "run <duration>",
        "advance simulated time",
    ),
    simulated(
        "cap",
        CommandTag::Cap,
        "cap <pulses>|never",
        "charge pulses the capacitor needs to report full",
    ),
    spec(
        "help",
        CommandTag::Help,
        "help [command]",
        "list commands or show one",
    ),
];

/// Case-insensitive lookup by command name.
pub fn find(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|spec| spec.name.eq_ignore_ascii_case(name))
}
