use indicatif::{ProgressBar, ProgressStyle};
use std::borrow::Cow;
use std::time::Duration;

/// How often should progress bars be redrawn?
pub const PROGRESS_UPDATE_INTERVAL: Duration = Duration::from_millis(250);

// NOTE: no ETA is shown. A single rate-limit wait can stall a run for the better part of an hour,
//       which makes indicatif's estimates meaningless.

/// A progress bar over the repositories of a run, or a spinner over a listing.
///
/// Each step of a run takes at least one network round trip, so updates go straight to the
/// underlying `indicatif::ProgressBar` without batching.
pub struct Progress {
    inner: ProgressBar,
    finish_style: Option<ProgressStyle>,
}

impl Progress {
    /// A spinner for work of unknown size, e.g., draining a paginated listing.
    pub fn new_spinner<T: Into<Cow<'static, str>>>(message: T, enabled: bool) -> Self {
        let inner = if enabled {
            let style = ProgressStyle::with_template("{spinner} {msg} [{elapsed_precise}]")
                .expect("progress bar style template should compile");

            let inner = ProgressBar::new_spinner()
                .with_style(style)
                .with_message(message);
            inner.enable_steady_tick(PROGRESS_UPDATE_INTERVAL);

            inner
        } else {
            ProgressBar::hidden()
        };

        let finish_style = ProgressStyle::with_template("{msg} [{elapsed_precise}]")
            .expect("progress bar style template should compile");

        Progress {
            inner,
            finish_style: Some(finish_style),
        }
    }

    /// A bar counting repositories processed out of `total`.
    pub fn new_bar<T: Into<Cow<'static, str>>>(total: u64, message: T, enabled: bool) -> Self {
        let inner = if enabled {
            let style = ProgressStyle::with_template(
                "{msg}  {bar} {pos}/{len} repositories  [{elapsed_precise}]  {prefix}",
            )
            .expect("progress bar style template should compile");

            let inner = ProgressBar::new(total)
                .with_style(style)
                .with_message(message);
            inner.enable_steady_tick(PROGRESS_UPDATE_INTERVAL);

            inner
        } else {
            ProgressBar::hidden()
        };

        Progress {
            inner,
            finish_style: None,
        }
    }

    #[inline]
    pub fn set_message<T: Into<Cow<'static, str>>>(&self, message: T) {
        self.inner.set_message(message);
    }

    /// Show what is currently being worked on, e.g., the repository name.
    #[inline]
    pub fn set_current<T: Into<Cow<'static, str>>>(&self, current: T) {
        self.inner.set_prefix(current);
    }

    /// Run `f` with the bar hidden, so that whatever it prints is not garbled.
    #[inline]
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.inner.suspend(f)
    }

    #[inline]
    pub fn inc(&self, amount: u64) {
        self.inner.inc(amount);
    }

    pub fn finish_with_message<T: Into<Cow<'static, str>>>(&self, message: T) {
        if let Some(style) = &self.finish_style {
            self.inner.set_style(style.clone());
        }
        self.inner.set_prefix("");
        self.inner.finish_with_message(message);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hidden_spinner_accepts_updates() {
        let progress = Progress::new_spinner("Listing repositories of Acme", false);
        progress.set_message("Reading details of Acme/demo");
        progress.finish_with_message("Listed 1 repositories of Acme");
        assert!(progress.inner.is_finished());
        assert_eq!(progress.inner.message(), "Listed 1 repositories of Acme");
    }

    #[test]
    fn bar_counts_repositories() {
        let progress = Progress::new_bar(3, "Archiving", false);
        progress.set_current("Acme/demo");
        progress.inc(2);
        assert_eq!(progress.inner.position(), 2);
    }
}
