//! Output line abstraction used by the pulse counter and HV controller.
//!
//! The firmware implements [`OutputLine`] for Embassy GPIO outputs, the
//! emulator and tests implement it for recording mocks.

/// Digital output driven by a callback.
pub trait OutputLine {
    fn set_high(&mut self);

    fn set_low(&mut self);

    fn set_level(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }
}

/// Output line that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopLine;

impl NoopLine {
    /// Creates a new no-op line.
    pub const fn new() -> Self {
        Self
    }
}

impl OutputLine for NoopLine {
    fn set_high(&mut self) {}

    fn set_low(&mut self) {}
}

impl<T: OutputLine + ?Sized> OutputLine for &mut T {
    fn set_high(&mut self) {
        (**self).set_high();
    }

    fn set_low(&mut self) {
        (**self).set_low();
    }
}

/// A missing line (e.g. a disabled debug probe) silently ignores writes.
impl<T: OutputLine> OutputLine for Option<T> {
    fn set_high(&mut self) {
        if let Some(line) = self {
            line.set_high();
        }
    }

    fn set_low(&mut self) {
        if let Some(line) = self {
            line.set_low();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Level(bool);

    impl OutputLine for Level {
        fn set_high(&mut self) {
            self.0 = true;
        }

        fn set_low(&mut self) {
            self.0 = false;
        }
    }

    #[test]
    fn set_level_dispatches_to_high_and_low() {
        let mut line = Level::default();
        line.set_level(true);
        assert!(line.0);
        line.set_level(false);
        assert!(!line.0);
    }

    #[test]
    fn optional_line_forwards_only_when_present() {
        let mut present = Some(Level::default());
        present.set_high();
        assert!(present.as_ref().is_some_and(|line| line.0));

        let mut absent: Option<Level> = None;
        absent.set_high();
        assert!(absent.is_none());
    }
}
