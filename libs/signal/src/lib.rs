//! Stop signals that request a graceful shutdown of the server.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    Terminate,
    Interrupt,
    Hangup,
    CtrlC,
    CtrlBreak,
    CtrlClose,
    CtrlShutdown,
}

impl fmt::Display for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StopSignal::Terminate => "SIGTERM",
            StopSignal::Interrupt => "SIGINT",
            StopSignal::Hangup => "SIGHUP",
            StopSignal::CtrlC => "CTRL_C",
            StopSignal::CtrlBreak => "CTRL_BREAK",
            StopSignal::CtrlClose => "CTRL_CLOSE",
            StopSignal::CtrlShutdown => "CTRL_SHUTDOWN",
        };
        f.write_str(name)
    }
}

#[cfg(unix)]
async fn wait_for_signal_impl() -> StopSignal {
    use tokio::signal::unix::{signal, SignalKind};

    // https://www.gnu.org/software/libc/manual/html_node/Termination-Signals.html
    let mut signal_terminate = signal(SignalKind::terminate()).unwrap();
    let mut signal_interrupt = signal(SignalKind::interrupt()).unwrap();
    let mut signal_hangup = signal(SignalKind::hangup()).unwrap();

    tokio::select! {
        _ = signal_terminate.recv() => StopSignal::Terminate,
        _ = signal_interrupt.recv() => StopSignal::Interrupt,
        _ = signal_hangup.recv() => StopSignal::Hangup,
    }
}

#[cfg(windows)]
async fn wait_for_signal_impl() -> StopSignal {
    use tokio::signal::windows;

    // https://learn.microsoft.com/en-us/windows/console/handlerroutine
    let mut signal_c = windows::ctrl_c().unwrap();
    let mut signal_break = windows::ctrl_break().unwrap();
    let mut signal_close = windows::ctrl_close().unwrap();
    let mut signal_shutdown = windows::ctrl_shutdown().unwrap();

    tokio::select! {
        _ = signal_c.recv() => StopSignal::CtrlC,
        _ = signal_break.recv() => StopSignal::CtrlBreak,
        _ = signal_close.recv() => StopSignal::CtrlClose,
        _ = signal_shutdown.recv() => StopSignal::CtrlShutdown,
    }
}

/// Registers signal handlers and waits for the first stop request.
///
/// Running encoders are children of this process, so the server must get a
/// chance to stop them before exiting.
pub async fn wait_for_stop_signal() -> StopSignal {
    wait_for_signal_impl().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_names() {
        assert_eq!("SIGTERM", StopSignal::Terminate.to_string());
        assert_eq!("SIGINT", StopSignal::Interrupt.to_string());
        assert_eq!("CTRL_SHUTDOWN", StopSignal::CtrlShutdown.to_string());
    }
}
