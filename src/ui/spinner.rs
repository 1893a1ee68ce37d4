use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::controller::InterviewView;

/// Spinner that shows the controller's processing stage while a reply is in flight.
///
/// Create one per exchange with [`StageSpinner::start`] and call [`StageSpinner::stop`]
/// once the reply call returns.
pub struct StageSpinner {
    bar: ProgressBar,
    task: JoinHandle<()>,
}

impl StageSpinner {
    pub fn start(views: watch::Receiver<InterviewView>) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} {elapsed:.dim}")
        {
            bar.set_style(style);
        }
        Self::with_bar(bar, views)
    }

    /// Drive an existing bar; used with a hidden bar in tests.
    ///
    /// The bar only animates while the stage is busy.
    pub fn with_bar(bar: ProgressBar, mut views: watch::Receiver<InterviewView>) -> Self {
        let follower = bar.clone();
        let task = tokio::spawn(async move {
            loop {
                let stage = views.borrow_and_update().processing_stage;
                if stage.is_busy() {
                    follower.enable_steady_tick(Duration::from_millis(100));
                } else {
                    follower.disable_steady_tick();
                }
                follower.set_message(stage.label());
                if views.changed().await.is_err() {
                    break;
                }
            }
        });
        Self { bar, task }
    }

    pub fn message(&self) -> String {
        self.bar.message()
    }

    pub fn stop(self) {
        self.task.abort();
        self.bar.finish_and_clear();
    }
}
