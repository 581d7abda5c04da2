//! # QEMU Debug Console Logging
//!
//! Diagnostic output for the kernel core. Allocator seeding, address space
//! setup, task creation and context switches all report through the `log`
//! facade; this crate provides the sink.
//!
//! ## Output path
//!
//! ```text
//! log::info!(..)  ──►  QemuLogger  ──►  qemu_trace!  ──►  QemuSink  ──►  port 0x402
//! ```
//!
//! QEMU captures writes to port `0x402` when started with `-debugcon`:
//!
//! ```bash
//! qemu-system-x86_64 ... -debugcon stdio
//! ```
//!
//! ## Features
//!
//! * `enabled` (default): writes go to the debug port.
//! * without `enabled`: [`qemu_trace!`] compiles to nothing and the logger
//!   silently drops records.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kernel_qemu::QemuLogger;
//! use log::{LevelFilter, info};
//!
//! // Logging is best-effort; a second install attempt is simply ignored.
//! let _ = QemuLogger::new(LevelFilter::Debug).init();
//! info!("frame allocator seeded");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod logger;

pub use logger::{QemuLogger, write_record};

#[cfg(feature = "enabled")]
#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt::{self, Write};

    /// QEMU's `-debugcon` I/O port.
    const QEMU_DEBUG_PORT: u16 = 0x402;

    #[allow(clippy::inline_always)]
    #[inline(always)]
    fn dbg_putc(c: u8) {
        #[cfg(target_arch = "x86_64")]
        unsafe {
            core::arch::asm!(
                "out dx, al",
                in("dx") QEMU_DEBUG_PORT,
                in("al") c,
                options(nomem, nostack, preserves_flags)
            );
        }
        #[cfg(not(target_arch = "x86_64"))]
        let _ = (QEMU_DEBUG_PORT, c);
    }

    /// Byte-at-a-time writer onto the debug port; never fails.
    pub struct QemuSink;

    impl Write for QemuSink {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            s.bytes().for_each(dbg_putc);
            Ok(())
        }
    }

    #[doc(hidden)]
    #[inline]
    pub fn qemu_write(args: fmt::Arguments) {
        let _ = fmt::write(&mut QemuSink, args);
    }
}

#[cfg(not(feature = "enabled"))]
#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt;

    #[doc(hidden)]
    #[inline(always)]
    #[allow(clippy::inline_always)]
    pub fn qemu_write(_: fmt::Arguments) {}
}

/// `print!`-style output straight to the debug port, bypassing `log`.
#[macro_export]
macro_rules! qemu_trace {
    ($($arg:tt)*) => {{
        $crate::qemu_fmt::qemu_write(core::format_args!($($arg)*));
    }};
}
