//! egui front end: launcher shell, roll-call/timer widget, and the
//! annotation overlay viewports.

mod app;
mod constants;
mod roll_call;

pub use app::run_app;
