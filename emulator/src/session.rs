//! Simulated MultiGeiger board driven through the console grammar.
//!
//! Time is a microsecond counter that only moves when `pulse` or `run`
//! asks for it. Each advance walks the recharge timer period by period,
//! stepping the audio sequencer on its own period and delivering queued tube
//! edges at their exact timestamps.

use std::time::Duration;

use geiger_core::config::{ConfigError, GeigerConfig};
use geiger_core::hv::{HvShared, RechargeController, RechargeState};
use geiger_core::periodic::{PeriodicStepper, TickPeriod};
use geiger_core::pins::OutputLine;
use geiger_core::pulse::{EdgeTimestamp, PulseCounter, PulseDrain};
use geiger_core::rates::RateWindow;
use geiger_core::repl::commands::{CommandError, CommandExecutor, ConsoleTarget, SimulationReport};
use geiger_core::repl::grammar::CapBehaviour;
use geiger_core::repl::status::StatusSnapshot;
use geiger_core::sound::{SoundRequests, Tone, ToneOutput, ToneSequencer, melodies};

/// Capacitor behaviour until `cap` changes it.
pub const DEFAULT_CAPACITOR: CapBehaviour = CapBehaviour::FullAfter(2);

/// Interrupt-shared state. Lives outside [`Session`] because the recharge
/// controller and the sequencer borrow it.
pub struct Board {
    pulses: PulseCounter,
    hv: HvShared,
    sound: SoundRequests,
}

impl Board {
    pub const fn new() -> Self {
        Self {
            pulses: PulseCounter::new(),
            hv: HvShared::new(),
            sound: SoundRequests::new(),
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Charge pump pin that counts completed pulses.
#[derive(Debug, Default)]
pub struct PumpRecorder {
    high: bool,
    pulses: u32,
}

impl OutputLine for PumpRecorder {
    fn set_high(&mut self) {
        self.high = true;
    }

    fn set_low(&mut self) {
        if self.high {
            self.pulses = self.pulses.wrapping_add(1);
        }
        self.high = false;
    }
}

/// Piezo and LED stand-in.
#[derive(Debug, Default)]
pub struct SpeakerRecorder {
    audible_tones: u32,
    led_flashes: u32,
}

impl SpeakerRecorder {
    pub fn audible_tones(&self) -> u32 {
        self.audible_tones
    }

    pub fn led_flashes(&self) -> u32 {
        self.led_flashes
    }
}

impl ToneOutput for SpeakerRecorder {
    fn apply(&mut self, tone: &Tone) {
        if tone.is_audible() {
            self.audible_tones += 1;
        }
        if tone.led {
            self.led_flashes += 1;
        }
    }

    fn silence(&mut self) {}
}

/// Simulated hardware behind the console.
pub struct Simulation<'a> {
    board: &'a Board,
    config: GeigerConfig,
    hv_period: TickPeriod,
    audio_period_us: u64,
    now_us: u64,
    next_audio_us: u64,
    recharge: PeriodicStepper<RechargeController<'a, PumpRecorder>>,
    audio: PeriodicStepper<ToneSequencer<'a, SpeakerRecorder>>,
    capacitor: CapBehaviour,
    capacitor_raises: u32,
    window: RateWindow,
    high_pitch: bool,
}

impl<'a> Simulation<'a> {
    /// Validates `config` and boots the board at t=0.
    pub fn new(board: &'a Board, config: GeigerConfig) -> Result<Self, ConfigError> {
        let timing = config.validate()?;
        board.pulses.init(config.dead_time_us, EdgeTimestamp::from_micros(0));

        let controller = RechargeController::new(&board.hv, PumpRecorder::default(), &config.hv)?;
        let sequencer =
            ToneSequencer::from_config(&board.sound, SpeakerRecorder::default(), &config.sound);
        if config.sound.start_sound {
            board.sound.play(&melodies::START);
        }

        let audio_period_us = u64::try_from(config.sound.tick_period.as_micros())
            .unwrap_or(u64::MAX)
            .max(1);

        Ok(Self {
            board,
            config,
            hv_period: timing.period,
            audio_period_us,
            now_us: 0,
            next_audio_us: 0,
            recharge: PeriodicStepper::new(controller),
            audio: PeriodicStepper::new(sequencer),
            capacitor: DEFAULT_CAPACITOR,
            capacitor_raises: 0,
            window: RateWindow::new(config.measurement_window, 0),
            high_pitch: false,
        })
    }

    pub fn now(&self) -> Duration {
        Duration::from_micros(self.now_us)
    }

    pub fn charge_pulses(&self) -> u32 {
        self.recharge.machine().pump().pulses
    }

    pub fn speaker(&self) -> &SpeakerRecorder {
        self.audio.machine().output()
    }

    /// Times the simulated comparator has fired.
    pub fn capacitor_raises(&self) -> u32 {
        self.capacitor_raises
    }

    fn record_drain(&mut self, drain: &PulseDrain) {
        #[allow(clippy::cast_possible_truncation)]
        let now_ms = (self.now_us / 1_000) as u32;
        self.window.record(drain, now_ms, self.config.tube);
    }

    fn run_until<I>(&mut self, end_us: u64, edges: I) -> SimulationReport
    where
        I: IntoIterator<Item = u64>,
    {
        let period_us = u64::from(self.hv_period.as_micros());
        let pulses_before = self.charge_pulses();
        let mut edges = edges.into_iter().peekable();
        let mut delivered = 0;
        let mut accepted = 0;

        loop {
            while let Some(edge_us) = edges.next_if(|edge_us| *edge_us <= self.now_us) {
                delivered += 1;
                if self.deliver_edge(edge_us) {
                    accepted += 1;
                }
            }
            if self.now_us >= end_us {
                break;
            }

            self.recharge_tick();
            if self.now_us >= self.next_audio_us {
                self.audio.tick();
                self.next_audio_us += self.audio_period_us;
            }
            self.now_us += period_us;
        }

        SimulationReport {
            now: self.now(),
            edges: delivered,
            accepted,
            charge_pulses: self.charge_pulses().wrapping_sub(pulses_before),
        }
    }

    fn deliver_edge(&mut self, edge_us: u64) -> bool {
        let verdict = self.board.pulses.on_edge(EdgeTimestamp::from_micros(edge_us));
        if verdict.is_accepted() {
            self.high_pitch = !self.high_pitch;
            self.board.sound.tick(self.high_pitch);
        }
        verdict.is_accepted()
    }

    fn recharge_tick(&mut self) {
        let before = self.recharge.machine().state();
        self.recharge.tick();

        // The comparator fires once, as the pulse that completes the
        // threshold ends. That pulse is burst pulse `burst_pulses + 1`.
        let controller = self.recharge.machine();
        if let CapBehaviour::FullAfter(threshold) = self.capacitor
            && before != RechargeState::CheckFull
            && controller.state() == RechargeState::CheckFull
            && controller.burst_pulses() + 1 >= threshold
        {
            self.board.hv.on_capacitor_full();
            self.capacitor_raises += 1;
        }
    }
}

impl ConsoleTarget for Simulation<'_> {
    fn pulses(&self) -> &PulseCounter {
        &self.board.pulses
    }

    fn hv(&self) -> &HvShared {
        &self.board.hv
    }

    fn sound(&self) -> &SoundRequests {
        &self.board.sound
    }

    fn drain(&mut self) -> PulseDrain {
        let drained = self.board.pulses.drain();
        self.record_drain(&drained);
        drained
    }

    fn status(&mut self) -> StatusSnapshot {
        StatusSnapshot {
            uptime: self.now(),
            dead_time_us: self.board.pulses.dead_time_us(),
            rejected_edges: self.board.pulses.rejected_edges(),
            tube: self.config.tube,
            rate: self.window.last(),
            total_counts: self.window.total_counts(),
            total_ms: self.window.total_ms(),
            hv: self.board.hv.snapshot(),
            hv_period: self.hv_period,
            ticks: self.board.sound.tick_options(),
        }
    }

    fn inject_pulses(
        &mut self,
        count: u32,
        spacing: Duration,
    ) -> Result<SimulationReport, CommandError> {
        let spacing_us = u64::try_from(spacing.as_micros()).unwrap_or(u64::MAX);
        let start_us = self.now_us;
        let end_us = start_us.saturating_add(spacing_us.saturating_mul(u64::from(count)));
        let edges = (0..u64::from(count)).map(|k| start_us + k * spacing_us);
        Ok(self.run_until(end_us, edges))
    }

    fn advance(&mut self, duration: Duration) -> Result<SimulationReport, CommandError> {
        let duration_us = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        let end_us = self.now_us.saturating_add(duration_us);
        Ok(self.run_until(end_us, []))
    }

    fn set_capacitor(&mut self, behaviour: CapBehaviour) -> Result<(), CommandError> {
        self.capacitor = behaviour;
        Ok(())
    }
}

/// Console front-end for one simulated board.
pub struct Session<'a> {
    executor: CommandExecutor<Simulation<'a>>,
}

impl<'a> Session<'a> {
    pub fn new(board: &'a Board, config: GeigerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            executor: CommandExecutor::new(Simulation::new(board, config)?),
        })
    }

    pub fn simulation(&self) -> &Simulation<'a> {
        self.executor.target()
    }

    /// Executes one console line and returns the text to print.
    pub fn handle_line(&mut self, line: &str) -> String {
        match self.executor.execute(line) {
            Ok(outcome) => outcome.to_string(),
            Err(error) => error.to_string(),
        }
    }
}
