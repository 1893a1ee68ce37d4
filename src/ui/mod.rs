pub mod icons;
pub mod spinner;
pub mod transcript;

pub use spinner::StageSpinner;
pub use transcript::{phase_banner, render_message, wrap_width};
