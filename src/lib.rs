//! Hidden title-tap gesture: five quick taps on a header title start a
//! privileged-access authentication and, when granted, navigate to the
//! protected area.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod gesture;
pub mod runtime;

pub use gesture::{
    AttemptId, AuthGate, Clock, EmbassyClock, GestureAction, GestureOutput, GestureTrigger,
    HeaderModel, Navigator,
};
pub use runtime::{GestureIo, GestureRuntime, Tap, TapChannel, TraceChannel};
