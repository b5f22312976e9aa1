//! Progress rules for an in-flight analysis.
//!
//! The value starts at 0, advances by a fixed step on every tick, stops at a
//! cap below 100, and jumps to 100 exactly once when the result arrives. The
//! timer that calls [`Progress::tick`] lives with the caller.

/// Percentage added per tick.
pub const DEFAULT_STEP: u8 = 10;

/// Auto-advance stops here until the real result arrives.
pub const DEFAULT_CAP: u8 = 90;

pub const COMPLETE: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
  value:    u8,
  step:     u8,
  cap:      u8,
  complete: bool,
}

impl Default for Progress {
  fn default() -> Self { Self::new(DEFAULT_STEP, DEFAULT_CAP) }
}

impl Progress {
  /// `cap` is clamped to 99 and `step` to at least 1.
  pub fn new(step: u8, cap: u8) -> Self {
    Self {
      value:    0,
      step:     step.max(1),
      cap:      cap.min(COMPLETE - 1),
      complete: false,
    }
  }

  pub fn value(&self) -> u8 { self.value }

  pub fn is_complete(&self) -> bool { self.complete }

  /// Advance one step. Returns the new value, or `None` once the cap is
  /// reached or the operation has completed.
  pub fn tick(&mut self) -> Option<u8> {
    if self.complete || self.value >= self.cap {
      return None;
    }
    self.value = self.value.saturating_add(self.step).min(self.cap);
    Some(self.value)
  }

  /// Jump to 100. Returns `Some(100)` the first time only.
  pub fn complete(&mut self) -> Option<u8> {
    if self.complete {
      return None;
    }
    self.complete = true;
    self.value = COMPLETE;
    Some(COMPLETE)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_ticks_to_ninety_then_stops() {
    let mut p = Progress::default();
    assert_eq!(p.value(), 0);
    let seen: Vec<u8> = std::iter::from_fn(|| p.tick()).collect();
    assert_eq!(seen, vec![10, 20, 30, 40, 50, 60, 70, 80, 90]);
    assert_eq!(p.tick(), None);
    assert_eq!(p.value(), 90);
  }

  #[test]
  fn uneven_step_lands_on_cap() {
    let mut p = Progress::new(40, 85);
    assert_eq!(p.tick(), Some(40));
    assert_eq!(p.tick(), Some(80));
    assert_eq!(p.tick(), Some(85));
    assert_eq!(p.tick(), None);
  }

  #[test]
  fn completes_exactly_once() {
    let mut p = Progress::default();
    p.tick();
    assert_eq!(p.complete(), Some(100));
    assert_eq!(p.complete(), None);
    assert_eq!(p.tick(), None);
    assert_eq!(p.value(), 100);
  }

  #[test]
  fn cap_never_reaches_complete() {
    let mut p = Progress::new(250, 255);
    assert_eq!(p.tick(), Some(99));
    assert!(!p.is_complete());
  }
}
