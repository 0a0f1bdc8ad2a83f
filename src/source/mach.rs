//! per-core tick counters from the mach kernel.
//!
//! see `host_processor_info(3)` and `<mach/processor_info.h>`.

use {
    super::TickSource,
    crate::{
        error::{HostQueryError, SampleError},
        stat::{CoreCount, TickSnapshot, Ticks},
    },
    std::{mem, ptr, slice},
};

type KernReturn = i32;
type MachPort = u32;

const KERN_SUCCESS: KernReturn = 0;
const PROCESSOR_CPU_LOAD_INFO: i32 = 2;

const CPU_STATE_USER: usize = 0;
const CPU_STATE_SYSTEM: usize = 1;
const CPU_STATE_IDLE: usize = 2;
const CPU_STATE_NICE: usize = 3;
const CPU_STATE_MAX: usize = 4;

unsafe extern "C" {
    fn mach_host_self() -> MachPort;
    fn mach_task_self() -> MachPort;
    fn host_processor_info(
        host: MachPort,
        flavor: i32,
        out_processor_count: *mut u32,
        out_processor_info: *mut *mut i32,
        out_processor_info_count: *mut u32,
    ) -> KernReturn;
    fn vm_deallocate(target: MachPort, address: usize, size: usize) -> KernReturn;
}

/// ticks backed by `host_processor_info`.
#[derive(Default)]
pub struct MachHost;

/// the load info array handed out by the kernel. released when dropped.
struct LoadInfo {
    info: *mut i32,
    len: usize,
    processors: usize,
}

// === impl MachHost ===

impl TickSource for MachHost {
    fn sample(&self, cores: CoreCount) -> Result<TickSnapshot, SampleError> {
        let info = LoadInfo::read()?;
        SampleError::check_cores(cores, info.processors)?;
        Ok(info.snapshot())
    }
}

// === impl LoadInfo ===

impl LoadInfo {
    fn read() -> Result<Self, HostQueryError> {
        let mut processors: u32 = 0;
        let mut info: *mut i32 = ptr::null_mut();
        let mut len: u32 = 0;

        // SAFETY: every out-pointer refers to a live local.
        let code = unsafe {
            host_processor_info(
                mach_host_self(),
                PROCESSOR_CPU_LOAD_INFO,
                &mut processors,
                &mut info,
                &mut len,
            )
        };

        if code != KERN_SUCCESS || info.is_null() {
            return Err(HostQueryError::Kernel {
                call: "host_processor_info",
                code,
            });
        }

        Ok(Self {
            info,
            len: len as usize,
            processors: processors as usize,
        })
    }

    fn snapshot(&self) -> TickSnapshot {
        let (info, len) = (self.info, self.len);

        // SAFETY: the kernel returned `len` integers at `info`, which stay mapped until drop.
        let ticks = unsafe { slice::from_raw_parts(info, len) };

        // the kernel's counters are unsigned 32-bit integers.
        let tick = |cpu: &[i32], state: usize| u64::from(cpu[state] as u32);

        ticks
            .chunks_exact(CPU_STATE_MAX)
            .take(self.processors)
            .map(|cpu| Ticks {
                user: tick(cpu, CPU_STATE_USER),
                system: tick(cpu, CPU_STATE_SYSTEM),
                idle: tick(cpu, CPU_STATE_IDLE),
                nice: tick(cpu, CPU_STATE_NICE),
            })
            .collect()
    }
}

impl Drop for LoadInfo {
    fn drop(&mut self) {
        let size = self.len * mem::size_of::<i32>();
        // SAFETY: `info` was allocated by the kernel in this task and is released exactly once.
        unsafe {
            vm_deallocate(mach_task_self(), self.info as usize, size);
        }
    }
}
