//! Demo workload for [`Kernel::start_multitasking`](crate::Kernel::start_multitasking).

use core::sync::atomic::{AtomicU64, Ordering};
use log::info;

/// Rounds completed by [`worker_task`].
pub static WORKER_ROUNDS: AtomicU64 = AtomicU64::new(0);

const ROUND: u64 = 1 << 20;

/// Busy worker: counts forever and reports every 2^20 iterations. Only the
/// timer ever takes the CPU away from it.
pub extern "C" fn worker_task() -> ! {
    let mut n: u64 = 0;
    loop {
        n = n.wrapping_add(1);
        if n.is_multiple_of(ROUND) {
            let rounds = WORKER_ROUNDS.fetch_add(1, Ordering::Relaxed) + 1;
            info!("worker: round {rounds}");
        }
        core::hint::spin_loop();
    }
}
