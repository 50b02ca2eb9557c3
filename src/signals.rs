use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};
use tokio::sync::watch;

/// What should we do when the user stops this program?
///
/// The first SIGINT or SIGTERM tells systemd we are stopping and flips the
/// returned channel to `true`; the server and background sync drain on that.
/// A second signal exits immediately.
pub fn handle_shutdown() -> std::io::Result<watch::Receiver<bool>> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let (tx, rx) = watch::channel(false);

    std::thread::spawn(move || {
        for signal in signals.forever() {
            if on_signal(&tx, signal) == SignalVerdict::Exit {
                std::process::exit(1);
            }
        }
    });

    Ok(rx)
}

#[derive(Debug, PartialEq, Eq)]
enum SignalVerdict {
    Drain,
    Exit,
}

fn on_signal(tx: &watch::Sender<bool>, signal: i32) -> SignalVerdict {
    if *tx.borrow() {
        log::warn!("Received signal {} while shutting down, exiting now", signal);
        return SignalVerdict::Exit;
    }
    log::info!("Received signal {}, shutting down", signal);
    let _ = sd_notify::notify(true, &[sd_notify::NotifyState::Stopping]);
    tx.send_replace(true);
    SignalVerdict::Drain
}

/// Resolves once shutdown has been requested.
pub async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    // An error means the sender is gone, which only happens after shutdown.
    let _ = rx.wait_for(|stop| *stop).await;
}

pub fn notify_ready() {
    let _ = sd_notify::notify(true, &[sd_notify::NotifyState::Ready]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_for_shutdown_resolves_on_send() {
        let (tx, rx) = watch::channel(false);
        let waiter = tokio::spawn(wait_for_shutdown(rx));
        tx.send(true).unwrap();
        waiter.await.unwrap();
    }

    #[test]
    fn test_second_signal_forces_exit() {
        let (tx, rx) = watch::channel(false);

        assert_eq!(on_signal(&tx, SIGTERM), SignalVerdict::Drain);
        assert!(*rx.borrow());
        assert_eq!(on_signal(&tx, SIGINT), SignalVerdict::Exit);
    }

    #[tokio::test]
    async fn test_wait_for_shutdown_resolves_when_sender_dropped() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        wait_for_shutdown(rx).await;
    }
}
