use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(unix)]
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Process-wide interrupt flag raised by SIGINT/SIGTERM.
#[derive(Debug, Clone, Copy)]
pub struct InterruptFlag {
    flag: &'static AtomicBool,
}

impl InterruptFlag {
    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn raise(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

/// Flag that is never touched by a signal handler, for driving loops in tests.
pub fn detached_flag() -> InterruptFlag {
    InterruptFlag {
        flag: Box::leak(Box::new(AtomicBool::new(false))),
    }
}

/// Installed SIGINT/SIGTERM handlers. The previous actions come back on
/// `restore` or drop.
#[derive(Debug)]
pub struct InterruptHandler {
    flag: InterruptFlag,
    #[cfg(unix)]
    previous: Vec<(Signal, SigAction)>,
}

impl InterruptHandler {
    pub fn flag(&self) -> InterruptFlag {
        self.flag
    }

    pub fn restore(mut self) -> Result<(), std::io::Error> {
        self.restore_previous()
    }

    #[cfg(unix)]
    fn restore_previous(&mut self) -> Result<(), std::io::Error> {
        let mut first_error = None;
        while let Some((signal, action)) = self.previous.pop() {
            // SAFETY: reinstates the action that was in place before ours.
            if let Err(error) = unsafe { sigaction(signal, &action) } {
                first_error.get_or_insert(std::io::Error::from(error));
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    #[cfg(not(unix))]
    fn restore_previous(&mut self) -> Result<(), std::io::Error> {
        Ok(())
    }
}

impl Drop for InterruptHandler {
    fn drop(&mut self) {
        let _ = self.restore_previous();
    }
}

#[cfg(unix)]
extern "C" fn raise_interrupt(_signal: nix::libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

#[cfg(unix)]
pub fn install_interrupt_handler() -> Result<InterruptHandler, std::io::Error> {
    let action = SigAction::new(
        SigHandler::Handler(raise_interrupt),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    let mut handler = InterruptHandler {
        flag: InterruptFlag {
            flag: &INTERRUPTED,
        },
        previous: Vec::with_capacity(2),
    };
    for signal in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: the handler only stores to a static atomic, which is async-signal-safe.
        // On failure `handler` drops and puts back whatever was already replaced.
        let previous = unsafe { sigaction(signal, &action) }.map_err(std::io::Error::from)?;
        handler.previous.push((signal, previous));
    }
    Ok(handler)
}

#[cfg(not(unix))]
pub fn install_interrupt_handler() -> Result<InterruptHandler, std::io::Error> {
    Ok(InterruptHandler {
        flag: InterruptFlag {
            flag: &INTERRUPTED,
        },
    })
}
