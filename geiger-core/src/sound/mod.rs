//! Timer-driven tick and melody playback.
//!
//! Producers ([`SoundRequests::play`] and [`SoundRequests::tick`]) only
//! record which sequence should start next. The audio timer callback runs
//! [`ToneSequencer`] through a [`PeriodicStepper`](crate::periodic::PeriodicStepper),
//! which picks up pending requests at step boundaries and applies one
//! [`Tone`] per step to the PWM/LED outputs.
//!
//! Melodies and alarms are foreground sequences and preempt per-pulse ticks.
//! A tick requested while a melody plays is dropped.

pub mod melodies;

use crate::config::{SoundConfig, TickOptions};
use crate::periodic::StepMachine;
use crate::sync::Shared;

/// One step of a sequence. A zero `duration` terminates the sequence.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Tone {
    pub frequency_hz: u32,
    /// [`Tone::SILENT`], [`Tone::LOW`] or [`Tone::HIGH`].
    pub volume: u8,
    pub led: bool,
    /// Audio timer ticks this step lasts.
    pub duration: u32,
}

impl Tone {
    pub const SILENT: u8 = 0;
    pub const LOW: u8 = 1;
    pub const HIGH: u8 = 2;

    /// Sequence terminator.
    pub const END: Tone = Tone::new(0, Tone::SILENT, false, 0);

    pub const fn new(frequency_hz: u32, volume: u8, led: bool, duration: u32) -> Self {
        Self {
            frequency_hz,
            volume,
            led,
            duration,
        }
    }

    /// Silence with the LED off for `duration` ticks.
    pub const fn rest(duration: u32) -> Self {
        Self::new(0, Tone::SILENT, false, duration)
    }

    pub const fn is_end(&self) -> bool {
        self.duration == 0
    }

    pub const fn is_audible(&self) -> bool {
        self.volume != Tone::SILENT && self.frequency_hz != 0
    }

    const fn masked(self, options: TickOptions) -> Self {
        Self {
            frequency_hz: self.frequency_hz,
            volume: if options.speaker {
                self.volume
            } else {
                Tone::SILENT
            },
            led: self.led && options.led,
            duration: self.duration,
        }
    }
}

/// Statically allocated tone list, normally ending in [`Tone::END`].
///
/// Running off the end of the slice also terminates playback.
pub type Sequence = &'static [Tone];

/// Speaker and LED drivers used by the sequencer.
pub trait ToneOutput {
    /// Starts `tone` (frequency, volume and LED level) and leaves it running.
    fn apply(&mut self, tone: &Tone);

    /// Speaker off, LED off.
    fn silence(&mut self);
}

/// Which producer a playing sequence came from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Priority {
    Background,
    Foreground,
}

#[derive(Copy, Clone, Debug)]
struct Request {
    sequence: Sequence,
    options: TickOptions,
}

#[derive(Copy, Clone, Debug)]
struct Pending {
    foreground: Option<Sequence>,
    background: Option<Request>,
    options: TickOptions,
}

/// Producer side: pending sequence slots written from the main program.
pub struct SoundRequests {
    pending: Shared<Pending>,
}

impl SoundRequests {
    pub const fn new() -> Self {
        Self {
            pending: Shared::new(Pending {
                foreground: None,
                background: None,
                options: TickOptions::ALL,
            }),
        }
    }

    /// Queues a melody or alarm. Replaces any melody not yet started.
    pub fn play(&self, sequence: Sequence) {
        self.pending.with(|pending| pending.foreground = Some(sequence));
    }

    /// Queues a per-pulse tick. Returns `false` when ticks are disabled.
    pub fn tick(&self, high_pitch: bool) -> bool {
        let sequence: Sequence = if high_pitch {
            &melodies::TICK_HIGH
        } else {
            &melodies::TICK_LOW
        };
        self.tick_with(sequence)
    }

    /// Queues an arbitrary background sequence under the tick options.
    pub fn tick_with(&self, sequence: Sequence) -> bool {
        self.pending.with(|pending| {
            if !pending.options.any() {
                return false;
            }
            pending.background = Some(Request {
                sequence,
                options: pending.options,
            });
            true
        })
    }

    pub fn set_tick_options(&self, options: TickOptions) {
        self.pending.with(|pending| pending.options = options);
    }

    pub fn tick_options(&self) -> TickOptions {
        self.pending.with(|pending| pending.options)
    }

    fn take(&self) -> (Option<Sequence>, Option<Request>) {
        self.pending
            .with(|pending| (pending.foreground.take(), pending.background.take()))
    }
}

impl Default for SoundRequests {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Copy, Clone, Debug)]
struct Active {
    sequence: Sequence,
    next: usize,
    priority: Priority,
    options: TickOptions,
}

/// Consumer side: plays one sequence at a time on a [`ToneOutput`].
pub struct ToneSequencer<'a, O> {
    requests: &'a SoundRequests,
    output: O,
    active: Option<Active>,
    idle_ticks: u32,
}

impl<'a, O: ToneOutput> ToneSequencer<'a, O> {
    /// Silences `output` and starts idle, polling every `idle_ticks`.
    pub fn new(requests: &'a SoundRequests, mut output: O, idle_ticks: u32) -> Self {
        output.silence();
        Self {
            requests,
            output,
            active: None,
            idle_ticks: idle_ticks.max(1),
        }
    }

    /// Builds a sequencer and applies the configured tick options.
    pub fn from_config(requests: &'a SoundRequests, output: O, config: &SoundConfig) -> Self {
        requests.set_tick_options(config.ticks);
        Self::new(requests, output, config.idle_ticks)
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    pub fn active_priority(&self) -> Option<Priority> {
        self.active.map(|active| active.priority)
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    fn accept_requests(&mut self) {
        let (foreground, background) = self.requests.take();

        if let Some(sequence) = foreground {
            self.active = Some(Active {
                sequence,
                next: 0,
                priority: Priority::Foreground,
                options: TickOptions::ALL,
            });
        }

        if let Some(request) = background
            && self.active_priority() != Some(Priority::Foreground)
        {
            self.active = Some(Active {
                sequence: request.sequence,
                next: 0,
                priority: Priority::Background,
                options: request.options,
            });
        }
    }
}

impl<O: ToneOutput> StepMachine for ToneSequencer<'_, O> {
    fn step(&mut self) -> u32 {
        self.accept_requests();

        let Some(active) = self.active.as_mut() else {
            return self.idle_ticks;
        };

        match active.sequence.get(active.next).filter(|tone| !tone.is_end()) {
            Some(tone) => {
                let tone = tone.masked(active.options);
                active.next += 1;
                self.output.apply(&tone);
                tone.duration
            }
            None => {
                self.active = None;
                self.output.silence();
                self.idle_ticks
            }
        }
    }
}
